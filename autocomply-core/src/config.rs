use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_max_input_bytes() -> u64 {
    25 * 1024 * 1024
}

fn default_max_archive_entry_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_decode_timeout_secs() -> u64 {
    30
}

fn default_max_sheet_cells() -> u64 {
    1_000_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Line rules to try, in priority order
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Keyword → standard table, searched top to bottom
    #[serde(default = "default_standards")]
    pub standards: Vec<StandardMapping>,
    /// Column header synonyms for tabular reports
    #[serde(default = "default_header_synonyms")]
    pub header_synonyms: Vec<HeaderSynonym>,
    /// Bounds on what a single upload may cost to decode
    #[serde(default)]
    pub limits: DecodeLimits,
    /// How XLSX workbooks reach the parser
    #[serde(default)]
    pub spreadsheet_mode: SpreadsheetMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// List of rules to run in order; the first one that matches a line wins
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    fn enabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                RuleConfig::enabled("ThreePartArrow"),
                RuleConfig::enabled("TwoPartArrow"),
                RuleConfig::enabled("NumberedToken"),
                RuleConfig::enabled("IsPredicate"),
                RuleConfig::enabled("TrailingKeyword"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardMapping {
    /// Lower-case substring searched for in the test name
    pub keyword: String,
    /// Standard assigned when the keyword hits
    pub standard: String,
}

fn standard(keyword: &str, standard: &str) -> StandardMapping {
    StandardMapping {
        keyword: keyword.to_string(),
        standard: standard.to_string(),
    }
}

fn default_standards() -> Vec<StandardMapping> {
    vec![
        standard("gps", "NMEA 0183"),
        standard("gnss", "3GPP"),
        standard("bluetooth", "Bluetooth Core Specification"),
        standard("wifi", "IEEE 802.11"),
        standard("lte", "3GPP LTE"),
        standard("can", "ISO 11898"),
        standard("sensor", "AEC-Q104"),
        standard("ip rating", "IEC 60529"),
        standard("short circuit", "AIS-156 / IEC 62133"),
        standard("overcharge", "AIS-156"),
        standard("vibration", "IEC 60068-2-6"),
    ]
}

/// Canonical record fields a tabular column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    Standard,
    Expected,
    Actual,
    Result,
    Description,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSynonym {
    /// Header text, compared after trimming and lower-casing
    pub header: String,
    pub field: CanonicalField,
}

fn synonym(header: &str, field: CanonicalField) -> HeaderSynonym {
    HeaderSynonym {
        header: header.to_string(),
        field,
    }
}

fn default_header_synonyms() -> Vec<HeaderSynonym> {
    vec![
        synonym("test", CanonicalField::Name),
        synonym("standard", CanonicalField::Standard),
        synonym("expected", CanonicalField::Expected),
        synonym("actual", CanonicalField::Actual),
        synonym("result", CanonicalField::Result),
        synonym("description", CanonicalField::Description),
        synonym("part", CanonicalField::Name),
        synonym("manufacturer pn", CanonicalField::Actual),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeLimits {
    /// Uploads above this size are rejected before decoding
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
    /// Largest decompressed part read out of a DOCX/XLSX container
    #[serde(default = "default_max_archive_entry_bytes")]
    pub max_archive_entry_bytes: u64,
    /// Wall-clock budget for the decode step; 0 disables the watchdog
    #[serde(default = "default_decode_timeout_secs")]
    pub decode_timeout_secs: u64,
    /// Largest padded grid (populated rows × widest column) built per worksheet
    #[serde(default = "default_max_sheet_cells")]
    pub max_sheet_cells: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            max_archive_entry_bytes: default_max_archive_entry_bytes(),
            decode_timeout_secs: default_decode_timeout_secs(),
            max_sheet_cells: default_max_sheet_cells(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadsheetMode {
    /// First worksheet, first row as header, rows normalized as records
    #[default]
    Table,
    /// Every worksheet flattened to text and run through the line rules
    Text,
}

impl ParsingConfig {
    /// Load config from YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: ParsingConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load config with fallback to defaults
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!("Failed to load config from {p}: {e:#}. Using defaults.");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            standards: default_standards(),
            header_synonyms: default_header_synonyms(),
            limits: DecodeLimits::default(),
            spreadsheet_mode: SpreadsheetMode::default(),
        }
    }
}
