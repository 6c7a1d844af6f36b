use std::collections::HashMap;
use tracing::debug;

use crate::config::{CanonicalField, HeaderSynonym, ParsingConfig};
use crate::types::{RecordOrigin, Table, TestRecord, Verdict, NOT_FOUND};

/// Maps spreadsheet-style rows onto records without touching the line rules.
#[derive(Debug, Clone)]
pub struct TabularNormalizer {
    synonyms: HashMap<String, CanonicalField>,
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

impl TabularNormalizer {
    pub fn new(synonyms: &[HeaderSynonym]) -> Self {
        let synonyms = synonyms
            .iter()
            .map(|synonym| (normalize_header(&synonym.header), synonym.field))
            .collect();
        Self { synonyms }
    }

    pub fn from_config(config: &ParsingConfig) -> Self {
        Self::new(&config.header_synonyms)
    }

    pub fn field_for(&self, header: &str) -> Option<CanonicalField> {
        self.synonyms.get(&normalize_header(header)).copied()
    }

    /// One record per data row, in row order.
    ///
    /// Cell values are used as given (trimmed); the result column is never
    /// re-derived. Blank cells count as absent, so fields keep their sentinel
    /// and a row without a result is `Unspecified`. When two columns feed the
    /// same field, the right-most non-blank one wins. Columns with no synonym
    /// are kept in `extra` under their normalized header. A row of blank
    /// cells still yields a record, left entirely at its sentinels.
    pub fn normalize(&self, table: &Table) -> Vec<TestRecord> {
        let headers: Vec<(String, Option<CanonicalField>)> = table
            .headers
            .iter()
            .map(|header| {
                let normalized = normalize_header(header);
                let field = self.synonyms.get(&normalized).copied();
                (normalized, field)
            })
            .collect();
        debug!(
            "Tabular headers: {:?}",
            headers
                .iter()
                .map(|(header, field)| format!("{header}→{field:?}"))
                .collect::<Vec<_>>()
        );

        let mut records = Vec::new();
        for (index, row) in table.rows.iter().enumerate() {
            let mut record = TestRecord::new(NOT_FOUND, Verdict::Unspecified, RecordOrigin::Row { index });
            for (column, (header, field)) in headers.iter().enumerate() {
                let Some(cell) = row.get(column).map(|cell| cell.trim()) else {
                    continue;
                };
                if cell.is_empty() {
                    continue;
                }
                match field {
                    Some(CanonicalField::Name) => record.name = cell.to_string(),
                    Some(CanonicalField::Standard) => record.standard = cell.to_string(),
                    Some(CanonicalField::Actual) => record.actual = cell.to_string(),
                    Some(CanonicalField::Result) => record.result = Verdict::from_token(cell),
                    Some(CanonicalField::Expected) => record.expected = Some(cell.to_string()),
                    Some(CanonicalField::Description) => {
                        record.description = Some(cell.to_string())
                    }
                    None => {
                        record.extra.insert(header.clone(), cell.to_string());
                    }
                }
            }
            records.push(record);
        }
        records
    }
}

impl Default for TabularNormalizer {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn part_column_becomes_the_name() {
        let records = TabularNormalizer::default()
            .normalize(&table(&["Part", " Result"], &[&["tja1051t", " PASS"]]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "tja1051t");
        assert_eq!(records[0].result, Verdict::Pass);
        assert_eq!(records[0].origin, RecordOrigin::Row { index: 0 });
    }

    #[test]
    fn result_is_taken_verbatim() {
        let records = TabularNormalizer::default().normalize(&table(
            &["TEST", "Result", "Expected", "Description"],
            &[&["Cold crank", "Skipped", "6 V", "ISO 16750-2 pulse"]],
        ));
        assert_eq!(records[0].result, Verdict::Verbatim("Skipped".to_string()));
        assert_eq!(records[0].expected.as_deref(), Some("6 V"));
        assert_eq!(records[0].description.as_deref(), Some("ISO 16750-2 pulse"));
        // No keyword inference for tabular rows
        assert_eq!(records[0].standard, NOT_FOUND);
    }

    #[test]
    fn missing_result_column_and_unknown_columns() {
        let records = TabularNormalizer::default().normalize(&table(
            &["Part", "Manufacturer PN", "Qty"],
            &[&["u1", "TJA1051T/3", "2"], &["", "", ""], &["u2", "", "1"]],
        ));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].result, Verdict::Unspecified);
        assert_eq!(records[0].actual, "TJA1051T/3");
        assert_eq!(records[0].extra.get("qty").map(String::as_str), Some("2"));
        // Blank row keeps its place as an all-sentinel record
        assert_eq!(records[1].name, NOT_FOUND);
        assert_eq!(records[1].result, Verdict::Unspecified);
        assert!(records[1].extra.is_empty());
        assert_eq!(records[2].actual, NOT_FOUND);
        assert_eq!(records[2].origin, RecordOrigin::Row { index: 2 });
    }

    #[test]
    fn later_column_wins_for_shared_field() {
        let records = TabularNormalizer::default().normalize(&table(
            &["Test", "Part", "Result"],
            &[&["Bus load", "tja1051t", "FAIL"], &["Bus off", "", "PASS"]],
        ));
        assert_eq!(records[0].name, "tja1051t");
        assert_eq!(records[1].name, "Bus off");
    }

    #[test]
    fn short_rows_are_padded_with_absent_cells() {
        let records = TabularNormalizer::default()
            .normalize(&table(&["Test", "Result", "Actual"], &[&["Ripple"]]));
        assert_eq!(records[0].name, "Ripple");
        assert_eq!(records[0].result, Verdict::Unspecified);
        assert_eq!(records[0].actual, NOT_FOUND);
    }
}
