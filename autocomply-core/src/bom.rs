use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::catalog::{normalize_part_number, ComponentCatalog};
use crate::config::{DecodeLimits, SpreadsheetMode};
use crate::error::DecodeError;
use crate::preprocessors::{CsvPreprocessor, Preprocessor, XlsxPreprocessor};
use crate::types::{RawDocument, SourceFormat, Table, NO_RESULT};

/// Header fragments that mark the part number column of a bill of materials.
const PART_NUMBER_HEADERS: [&str; 3] = ["part number", "mpn", "p/n"];

#[derive(Debug, Error)]
pub enum BomError {
    #[error("Could not find a 'Part Number' or 'MPN' column (headers: {0:?})")]
    MissingPartNumberColumn(Vec<String>),
    #[error("Unsupported BOM format: {0} (use .xlsx or .csv)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomStatus {
    Found,
    NotFound,
}

impl BomStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BomStatus::Found => "Found",
            BomStatus::NotFound => "Not Found",
        }
    }
}

/// Verification result for one BOM line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub part_number: String,
    pub status: BomStatus,
    pub manufacturer: String,
    pub category: String,
    pub aec_q: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomSummary {
    pub total: usize,
    pub found: usize,
    pub aec_q_qualified: usize,
}

/// Part numbers of the first column whose header names one, trimmed and
/// lower-cased, blanks dropped.
pub fn parse_bom(table: &Table) -> Result<Vec<String>, BomError> {
    let column = table
        .headers
        .iter()
        .position(|header| {
            let header = header.to_lowercase();
            PART_NUMBER_HEADERS
                .iter()
                .any(|fragment| header.contains(fragment))
        })
        .ok_or_else(|| BomError::MissingPartNumberColumn(table.headers.clone()))?;

    Ok(table
        .rows
        .iter()
        .filter_map(|row| row.get(column))
        .map(|cell| normalize_part_number(cell))
        .filter(|part| !part.is_empty())
        .collect())
}

/// Decodes a BOM spreadsheet (first sheet of an XLSX, or a CSV) into its table.
/// Uploads above `max_input_bytes` are refused like reports are.
pub fn read_bom_table(
    file_name: &str,
    bytes: &[u8],
    limits: &DecodeLimits,
) -> Result<Table, BomError> {
    let size = bytes.len() as u64;
    if size > limits.max_input_bytes {
        return Err(DecodeError::TooLarge {
            size,
            limit: limits.max_input_bytes,
        }
        .into());
    }
    let format = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(SourceFormat::from_extension);
    let decoded = match format {
        Some(SourceFormat::Csv) => CsvPreprocessor.decode(bytes)?,
        Some(SourceFormat::Xlsx) => {
            XlsxPreprocessor::new(
                SpreadsheetMode::Table,
                limits.max_archive_entry_bytes,
                limits.max_sheet_cells,
            )
            .decode(bytes)?
        }
        _ => return Err(BomError::UnsupportedFormat(file_name.to_string())),
    };
    match decoded {
        RawDocument::Table { table, .. } => Ok(table),
        RawDocument::Text { format, .. } => Err(BomError::UnsupportedFormat(format.to_string())),
    }
}

pub fn verify_components(catalog: &ComponentCatalog, part_numbers: &[String]) -> Vec<BomLine> {
    part_numbers
        .iter()
        .map(|part_number| match catalog.get(part_number) {
            Some(entry) => BomLine {
                part_number: part_number.clone(),
                status: BomStatus::Found,
                manufacturer: entry.property("Manufacturer").unwrap_or(NO_RESULT).to_string(),
                category: entry
                    .property("Product Category")
                    .unwrap_or(NO_RESULT)
                    .to_string(),
                aec_q: entry.property("Qualification").unwrap_or("No").to_string(),
            },
            None => BomLine {
                part_number: part_number.clone(),
                status: BomStatus::NotFound,
                manufacturer: NO_RESULT.to_string(),
                category: NO_RESULT.to_string(),
                aec_q: "Unknown".to_string(),
            },
        })
        .collect()
}

pub fn summarize(lines: &[BomLine]) -> BomSummary {
    let summary = BomSummary {
        total: lines.len(),
        found: lines
            .iter()
            .filter(|line| line.status == BomStatus::Found)
            .count(),
        aec_q_qualified: lines.iter().filter(|line| line.aec_q.contains("AEC")).count(),
    };
    info!(
        "BOM verified: {} parts, {} found, {} AEC-Q qualified",
        summary.total, summary.found, summary.aec_q_qualified
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bom(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn finds_first_part_number_column() {
        let table = bom(
            &["Ref", "Mfr P/N", "Internal Part Number"],
            &[&["U1", " TJA1051T ", "x"], &["U2", "", "y"], &["U3", "BQ76952", "z"]],
        );
        assert_eq!(parse_bom(&table).unwrap(), vec!["tja1051t", "bq76952"]);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse_bom(&bom(&["Ref", "Qty"], &[&["U1", "1"]])).unwrap_err();
        assert!(matches!(err, BomError::MissingPartNumberColumn(_)));
    }

    #[test]
    fn verification_marks_found_and_missing_parts() {
        let catalog = ComponentCatalog::builtin().unwrap();
        let lines = verify_components(
            &catalog,
            &["tja1051t".to_string(), "not-a-part".to_string()],
        );
        assert_eq!(lines[0].status, BomStatus::Found);
        assert_eq!(lines[0].manufacturer, "NXP");
        assert_eq!(lines[0].category, "CAN Transceiver");
        assert_eq!(lines[0].aec_q, "AEC-Q100");
        assert_eq!(lines[1].status, BomStatus::NotFound);
        assert_eq!(lines[1].aec_q, "Unknown");
        assert_eq!(
            summarize(&lines),
            BomSummary { total: 2, found: 1, aec_q_qualified: 1 }
        );
    }

    #[test]
    fn csv_bom_round_trip_through_decoder() {
        let table = read_bom_table(
            "bom.CSV",
            b"Ref,MPN\nU1,tja1051t\n",
            &DecodeLimits::default(),
        )
        .unwrap();
        assert_eq!(parse_bom(&table).unwrap(), vec!["tja1051t"]);
        assert!(matches!(
            read_bom_table("bom.pdf", b"", &DecodeLimits::default()),
            Err(BomError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn oversized_bom_is_refused_before_decoding() {
        let limits = DecodeLimits {
            max_input_bytes: 8,
            ..DecodeLimits::default()
        };
        let err = read_bom_table("bom.csv", b"Ref,MPN\nU1,tja1051t\n", &limits).unwrap_err();
        assert!(matches!(
            err,
            BomError::Decode(DecodeError::TooLarge { size: 20, limit: 8 })
        ));
    }
}
