use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user working state, passed explicitly to every action that counts.
///
/// Nothing here is shared between sessions; two users verifying reports at
/// the same time each hold their own context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub reports_verified: u64,
    pub requirements_generated: u64,
    /// Distinct part numbers found in the catalog, in first-lookup order
    pub lookup_history: Vec<String>,
}

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub reports_verified: u64,
    pub requirements_generated: u64,
    pub components_looked_up: usize,
    pub components_in_catalog: usize,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            reports_verified: 0,
            requirements_generated: 0,
            lookup_history: Vec::new(),
        }
    }

    pub fn record_report_verified(&mut self) {
        self.reports_verified += 1;
    }

    pub fn record_requirement_generated(&mut self) {
        self.requirements_generated += 1;
    }

    /// Repeat lookups of the same part are counted once.
    pub fn record_lookup(&mut self, part_number: &str) {
        if !self.lookup_history.iter().any(|seen| seen == part_number) {
            self.lookup_history.push(part_number.to_string());
        }
    }

    pub fn dashboard(&self, components_in_catalog: usize) -> Dashboard {
        Dashboard {
            reports_verified: self.reports_verified,
            requirements_generated: self.requirements_generated,
            components_looked_up: self.lookup_history.len(),
            components_in_catalog,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
