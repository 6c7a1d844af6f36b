use tracing::info;

use crate::config::ParsingConfig;
use crate::rules::RuleEngine;
use crate::tabular::TabularNormalizer;
use crate::types::{RawDocument, TestRecord};

/// Decoded document → ordered records.
///
/// Free text goes through the line rules; tables go through the column
/// normalizer and never touch the line rules. Parsing has no failure mode:
/// input it cannot make sense of yields fewer records, down to none.
pub struct ReportParser {
    engine: RuleEngine,
    normalizer: TabularNormalizer,
}

impl ReportParser {
    pub fn new(engine: RuleEngine, normalizer: TabularNormalizer) -> Self {
        Self { engine, normalizer }
    }

    pub fn from_config(config: &ParsingConfig) -> Self {
        Self::new(
            RuleEngine::from_config(config),
            TabularNormalizer::from_config(config),
        )
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn parse(&self, document: &RawDocument) -> Vec<TestRecord> {
        let records = match document {
            RawDocument::Text { text, .. } => self.engine.parse_text(text),
            RawDocument::Table { table, .. } => self.normalizer.normalize(table),
        };
        info!(
            "Parsed {} records from {} input",
            records.len(),
            document.format()
        );
        records
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}
