use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use tracing::{debug, info};

use crate::session::SessionContext;

const BUILTIN_KNOWLEDGE_BASE: &str = include_str!("../data/knowledge_base.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// A canned test procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestProcedureTemplate {
    /// Lower-case lookup phrase
    pub key: String,
    pub name: String,
    pub standard: String,
    pub description: String,
    #[serde(default)]
    pub procedure: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

impl TestProcedureTemplate {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "#### Generated Procedure for: **{}**", self.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "**Standard:** {}", self.standard);
        let _ = writeln!(out, "**Description:** {}", self.description);
        let _ = writeln!(out);
        let _ = writeln!(out, "**Test Procedure:**");
        for (index, step) in self.procedure.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", index + 1, step);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "**Key Parameters:**");
        for parameter in &self.parameters {
            let _ = writeln!(out, "- **{}:** {}", parameter.name, parameter.value);
        }
        let _ = writeln!(out);
        let equipment = if self.equipment.is_empty() {
            "N/A".to_string()
        } else {
            self.equipment.join(", ")
        };
        let _ = writeln!(out, "**Required Equipment:** {equipment}");
        out
    }
}

#[derive(Debug, Deserialize)]
struct KnowledgeBaseFile {
    templates: Vec<TestProcedureTemplate>,
}

/// Ordered collection of procedure templates.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    templates: Vec<TestProcedureTemplate>,
}

impl KnowledgeBase {
    pub fn new(templates: Vec<TestProcedureTemplate>) -> Self {
        Self { templates }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: KnowledgeBaseFile =
            serde_yaml::from_str(yaml).context("Failed to parse knowledge base")?;
        Ok(Self::new(file.templates))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_KNOWLEDGE_BASE)
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base file: {path}"))?;
        let knowledge_base = Self::from_yaml(&content)
            .with_context(|| format!("Invalid knowledge base file: {path}"))?;
        info!("Loaded {} templates from {}", knowledge_base.len(), path);
        Ok(knowledge_base)
    }

    /// First template whose key contains the trimmed, lower-cased query.
    pub fn find(&self, query: &str) -> Option<&TestProcedureTemplate> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.templates.iter().find(|template| template.key.contains(&query))
    }

    /// `find`, counting every non-empty request against the session.
    pub fn generate(&self, query: &str, session: &mut SessionContext) -> Option<&TestProcedureTemplate> {
        if query.trim().is_empty() {
            return None;
        }
        session.record_requirement_generated();
        let found = self.find(query);
        debug!("Requirement query '{}' → {:?}", query.trim(), found.map(|t| &t.key));
        found
    }

    pub fn keys(&self) -> Vec<&str> {
        self.templates.iter().map(|template| template.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
