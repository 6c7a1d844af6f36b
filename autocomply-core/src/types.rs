use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Placeholder for a field the parser could not fill in.
pub const NOT_FOUND: &str = "Not found";

/// Placeholder result for tabular rows without a result column.
pub const NO_RESULT: &str = "N/A";

// ===== SOURCE FORMATS =====

/// Upload formats the decoders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Docx,
    Xlsx,
    Csv,
    Txt,
    Log,
}

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            "log" => Some(Self::Log),
            _ => None,
        }
    }

    /// Browsers and upload forms hand over a MIME type instead of a name.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Xlsx)
            }
            "text/csv" | "application/csv" => Some(Self::Csv),
            "text/plain" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Log => "log",
        }
    }

    /// Formats whose decoders can hand back header + rows.
    pub fn is_tabular(&self) -> bool {
        matches!(self, Self::Csv | Self::Xlsx)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ===== DECODER OUTPUT =====

/// Header row plus data rows, as read from a CSV file or a worksheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Splits a grid whose first row is the header. Blank header cells get
    /// positional names so every column stays addressable.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let rows = grid.split_off(1);
        let headers = grid
            .remove(0)
            .into_iter()
            .enumerate()
            .map(|(index, header)| {
                if header.trim().is_empty() {
                    format!("column_{}", index + 1)
                } else {
                    header
                }
            })
            .collect();
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What a decoder hands to the report parser.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDocument {
    Text { format: SourceFormat, text: String },
    Table { format: SourceFormat, table: Table },
}

impl RawDocument {
    pub fn format(&self) -> SourceFormat {
        match self {
            Self::Text { format, .. } | Self::Table { format, .. } => *format,
        }
    }
}

// ===== TEST RECORDS =====

/// Outcome carried by a record.
///
/// Line rules only ever produce `Pass`, `Fail` and `Info`, plus whatever
/// upper-cased status token a numbered line spells out. Tabular rows keep
/// their result cell verbatim, and rows without one are `Unspecified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Verdict {
    Pass,
    Fail,
    Info,
    Unspecified,
    Verbatim(String),
}

impl Verdict {
    /// Maps the canonical spellings onto variants and keeps anything else as-is.
    pub fn from_token(token: &str) -> Self {
        let trimmed = token.trim();
        match trimmed {
            "PASS" => Self::Pass,
            "FAIL" => Self::Fail,
            "INFO" => Self::Info,
            "" | NO_RESULT => Self::Unspecified,
            other => Self::Verbatim(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Info => "INFO",
            Self::Unspecified => NO_RESULT,
            Self::Verbatim(raw) => raw,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verdict> for String {
    fn from(verdict: Verdict) -> Self {
        verdict.as_str().to_string()
    }
}

impl From<String> for Verdict {
    fn from(raw: String) -> Self {
        Verdict::from_token(&raw)
    }
}

/// Where a record came from, for tracing a verdict back to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordOrigin {
    /// 1-based line number and the rule that claimed it
    Line { number: usize, rule: String },
    /// 0-based data row index (header excluded)
    Row { index: usize },
}

/// One normalized test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    pub result: Verdict,
    pub actual: String,
    pub standard: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Unrecognized columns of a tabular row, lower-cased header → cell
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    pub origin: RecordOrigin,
}

impl TestRecord {
    pub fn new(name: impl Into<String>, result: Verdict, origin: RecordOrigin) -> Self {
        Self {
            name: name.into(),
            result,
            actual: NOT_FOUND.to_string(),
            standard: NOT_FOUND.to_string(),
            description: None,
            expected: None,
            extra: BTreeMap::new(),
            origin,
        }
    }
}
