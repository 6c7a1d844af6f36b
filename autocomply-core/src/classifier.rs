use crate::config::{ParsingConfig, StandardMapping};
use crate::types::TestRecord;

/// Assigns a regulatory standard to a test by keyword.
///
/// Keywords are matched as substrings of the lower-cased test name and the
/// table is walked in its configured order, so the first listed keyword
/// decides when a name contains several.
#[derive(Debug, Clone)]
pub struct StandardClassifier {
    table: Vec<StandardMapping>,
}

impl StandardClassifier {
    pub fn new(table: Vec<StandardMapping>) -> Self {
        let table = table
            .into_iter()
            .filter(|entry| !entry.keyword.trim().is_empty())
            .map(|entry| StandardMapping {
                keyword: entry.keyword.trim().to_lowercase(),
                standard: entry.standard,
            })
            .collect();
        Self { table }
    }

    pub fn from_config(config: &ParsingConfig) -> Self {
        Self::new(config.standards.clone())
    }

    pub fn classify(&self, name: &str) -> Option<&str> {
        let lowered = name.to_lowercase();
        self.table
            .iter()
            .find(|entry| lowered.contains(&entry.keyword))
            .map(|entry| entry.standard.as_str())
    }

    /// Fills `record.standard` when a keyword hits; leaves the sentinel otherwise.
    pub fn apply(&self, record: &mut TestRecord) {
        if let Some(standard) = self.classify(&record.name) {
            record.standard = standard.to_string();
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for StandardClassifier {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordOrigin, Verdict, NOT_FOUND};

    #[test]
    fn first_table_entry_wins() {
        let classifier = StandardClassifier::default();
        // "can" precedes "short circuit" in the default table
        assert_eq!(
            classifier.classify("CAN transceiver short circuit"),
            Some("ISO 11898")
        );
        // "gps" precedes "sensor"
        assert_eq!(classifier.classify("GPS sensor cold start"), Some("NMEA 0183"));
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let classifier = StandardClassifier::default();
        assert_eq!(classifier.classify("IP Rating IP67"), Some("IEC 60529"));
        // "scan" contains "can"; keywords are plain substrings
        assert_eq!(classifier.classify("Barcode scan"), Some("ISO 11898"));
        assert_eq!(classifier.classify("Thermal cycling"), None);
    }

    #[test]
    fn apply_keeps_sentinel_without_hit() {
        let classifier = StandardClassifier::default();
        let mut record = TestRecord::new(
            "Thermal cycling",
            Verdict::Pass,
            RecordOrigin::Line { number: 1, rule: "TrailingKeyword".to_string() },
        );
        classifier.apply(&mut record);
        assert_eq!(record.standard, NOT_FOUND);

        record.name = "Overcharge protection".to_string();
        classifier.apply(&mut record);
        assert_eq!(record.standard, "AIS-156");
    }

    #[test]
    fn custom_table_is_normalised() {
        let classifier = StandardClassifier::new(vec![
            StandardMapping { keyword: "  EMC ".to_string(), standard: "CISPR 25".to_string() },
            StandardMapping { keyword: "".to_string(), standard: "ignored".to_string() },
        ]);
        assert_eq!(classifier.len(), 1);
        assert_eq!(classifier.classify("Radiated emc scan"), Some("CISPR 25"));
    }
}
