use tracing::{debug, warn};

use super::line_rules::{
    IsPredicateRule, NumberedTokenRule, ThreePartArrowRule, TrailingKeywordRule,
    TwoPartArrowRule,
};
use crate::classifier::StandardClassifier;
use crate::config::ParsingConfig;
use crate::types::{RecordOrigin, TestRecord, Verdict};

/// Fields a line rule pulls out of a matching line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMatch {
    pub name: String,
    pub result: Verdict,
    /// Observed value, when the line shape carries one
    pub actual: Option<String>,
}

/// One entry of the ordered rule list: recognizes a line shape and extracts it.
pub trait LineRule: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when the line does not have this rule's shape.
    fn extract(&self, line: &str) -> Option<LineMatch>;
}

/// Every rule the engine knows, in default priority order.
pub const RULE_NAMES: [&str; 5] = [
    "ThreePartArrow",
    "TwoPartArrow",
    "NumberedToken",
    "IsPredicate",
    "TrailingKeyword",
];

fn rule_by_name(name: &str) -> Option<Box<dyn LineRule>> {
    match name {
        "ThreePartArrow" => Some(Box::new(ThreePartArrowRule)),
        "TwoPartArrow" => Some(Box::new(TwoPartArrowRule)),
        "NumberedToken" => Some(Box::new(NumberedTokenRule)),
        "IsPredicate" => Some(Box::new(IsPredicateRule)),
        "TrailingKeyword" => Some(Box::new(TrailingKeywordRule)),
        _ => None,
    }
}

// Everything str::splitlines treats as a line boundary besides \n and \r
fn is_extra_line_break(c: char) -> bool {
    matches!(
        c,
        '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Splits on every line boundary, treating `\r\n` as one break.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if c == '\n' || c == '\r' || is_extra_line_break(c) {
            lines.push(&text[start..index]);
            let mut end = index + c.len_utf8();
            if c == '\r' {
                if let Some(&(next_index, '\n')) = chars.peek() {
                    chars.next();
                    end = next_index + 1;
                }
            }
            start = end;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Ordered first-match-wins line classifier.
pub struct RuleEngine {
    rules: Vec<Box<dyn LineRule>>,
    classifier: StandardClassifier,
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn LineRule>>, classifier: StandardClassifier) -> Self {
        Self { rules, classifier }
    }

    /// Builds the rule list in the order the pipeline config names it.
    /// Disabled entries are left out; unknown names are skipped with a warning.
    pub fn from_config(config: &ParsingConfig) -> Self {
        let mut rules: Vec<Box<dyn LineRule>> = Vec::new();
        for rule_config in &config.pipeline.rules {
            if !rule_config.enabled {
                debug!("Rule {} disabled, skipping", rule_config.name);
                continue;
            }
            match rule_by_name(&rule_config.name) {
                Some(rule) => rules.push(rule),
                None => warn!(
                    "Unknown rule '{}' in pipeline config, skipping (known: {})",
                    rule_config.name,
                    RULE_NAMES.join(", ")
                ),
            }
        }
        Self::new(rules, StandardClassifier::from_config(config))
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Runs the rules against one trimmed line; the first match wins.
    pub fn classify_line(&self, line: &str) -> Option<(&str, LineMatch)> {
        self.rules
            .iter()
            .find_map(|rule| rule.extract(line).map(|found| (rule.name(), found)))
    }

    /// Turns free text into records, one per line some rule recognizes.
    /// Unrecognized and blank lines are dropped.
    pub fn parse_text(&self, text: &str) -> Vec<TestRecord> {
        let mut records = Vec::new();
        for (index, raw_line) in split_lines(text).into_iter().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((rule, found)) = self.classify_line(line) else {
                continue;
            };
            debug!(line = index + 1, rule, name = %found.name, result = %found.result, "line matched");

            let mut record = TestRecord::new(
                found.name,
                found.result,
                RecordOrigin::Line {
                    number: index + 1,
                    rule: rule.to_string(),
                },
            );
            if let Some(actual) = found.actual {
                record.actual = actual;
            }
            self.classifier.apply(&mut record);
            records.push(record);
        }
        records
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}
