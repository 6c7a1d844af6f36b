use csv::{ByteRecord, ReaderBuilder, Trim};

use super::Preprocessor;
use crate::error::DecodeError;
use crate::types::{RawDocument, SourceFormat, Table};

/// Comma-separated reports: header row plus records.
pub struct CsvPreprocessor;

fn cells(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).trim().to_string())
        .collect()
}

pub fn read_table(bytes: &[u8]) -> Result<Table, DecodeError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = cells(reader.byte_headers()?);
    let mut rows = Vec::new();
    // Empty lines never reach here; a line of bare separators is a row
    for record in reader.byte_records() {
        rows.push(cells(&record?));
    }
    Ok(Table::new(headers, rows))
}

impl Preprocessor for CsvPreprocessor {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, DecodeError> {
        Ok(RawDocument::Table {
            format: SourceFormat::Csv,
            table: read_table(bytes)?,
        })
    }

    fn name(&self) -> &str {
        "csv"
    }

    fn supports_format(&self, format: SourceFormat) -> bool {
        format == SourceFormat::Csv
    }
}
