use anyhow::{bail, Result};
use std::fmt::Write as _;

use crate::partition::Bucket;
use crate::processor::{ReportSummary, VerificationOutcome};
use crate::session::Dashboard;
use crate::types::TestRecord;

pub const NOTHING_RECOGNIZED: &str = "No recognizable data was extracted.";

/// Values the card leaves out: blanks, dashes and spreadsheet NaNs.
pub fn is_displayable(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != "—" && !trimmed.eq_ignore_ascii_case("nan")
}

pub fn headline(summary: &ReportSummary) -> String {
    let (passed, failed, others) = summary.counts();
    format!("Found {passed} Passed, {failed} Failed, and {others} Other items.")
}

/// One record as a block of labelled lines.
pub fn render_card(record: &TestRecord) -> String {
    let mut card = format!("🧪 Test: {}\n", record.name);
    let fields: [(&str, Option<&str>); 4] = [
        ("📘 Standard", Some(record.standard.as_str())),
        ("🎯 Expected", record.expected.as_deref()),
        ("📌 Actual", Some(record.actual.as_str())),
        ("💬 Description", record.description.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| is_displayable(v)) {
            let _ = writeln!(card, "   {label}: {value}");
        }
    }
    card
}

pub fn render_summary(summary: &ReportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", headline(summary));
    for (bucket, icon) in [
        (Bucket::Passed, "✅"),
        (Bucket::Failed, "❌"),
        (Bucket::Other, "ℹ️"),
    ] {
        let records = summary.bucket(bucket);
        if records.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{icon} {} ({})", bucket.label(), records.len());
        for record in records {
            out.push_str(&render_card(record));
        }
    }
    out
}

pub fn render_outcome(outcome: &VerificationOutcome) -> String {
    match outcome {
        VerificationOutcome::Recognized(summary) => render_summary(summary),
        VerificationOutcome::NothingRecognized { .. } => format!("{NOTHING_RECOGNIZED}\n"),
        VerificationOutcome::Unsupported { file_name } => {
            format!("Unsupported file type: {file_name}\n")
        }
        VerificationOutcome::DecodeFailed { message, .. } => {
            format!("An error occurred while parsing: {message}\n")
        }
    }
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "   {:.<35} {}", "Reports Verified", dashboard.reports_verified);
    let _ = writeln!(out, "   {:.<35} {}", "Requirements Generated", dashboard.requirements_generated);
    let _ = writeln!(out, "   {:.<35} {}", "Components Looked Up", dashboard.components_looked_up);
    let _ = writeln!(out, "   {:.<35} {}", "Components in DB", dashboard.components_in_catalog);
    out
}

impl ReportSummary {
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Report: {} ({}, {} bytes, sha256 {})\n",
            self.source.file_name, self.source.format, self.source.size_bytes, self.source.sha256
        );
        out.push_str(&render_summary(self));
        out
    }

    pub fn save_with_format(&self, path: &str, format: &str) -> Result<()> {
        match format {
            "json" => {
                let json = serde_json::to_string_pretty(self)?;
                std::fs::write(path, json)?;
            }
            "text" | "txt" => {
                std::fs::write(path, self.to_text())?;
            }
            other => bail!("Unknown output format '{other}' (expected json or text)"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsingConfig;
    use crate::processor::ReportProcessor;
    use crate::session::SessionContext;
    use crate::types::{RecordOrigin, Verdict, NOT_FOUND};

    fn summary(text: &str) -> ReportSummary {
        let processor = ReportProcessor::new(ParsingConfig::default()).unwrap();
        processor
            .verify("r.txt", text.as_bytes(), &mut SessionContext::new())
            .summary()
            .cloned()
            .unwrap()
    }

    #[test]
    fn displayable_values() {
        assert!(is_displayable("ISO 11898"));
        assert!(!is_displayable("  "));
        assert!(!is_displayable("—"));
        assert!(!is_displayable("NaN"));
    }

    #[test]
    fn card_shows_sentinels_but_hides_blank_fields() {
        let mut record = TestRecord::new(
            "GPS LOCK",
            Verdict::Fail,
            RecordOrigin::Line { number: 1, rule: "NumberedToken".to_string() },
        );
        record.expected = Some("nan".to_string());
        let card = render_card(&record);
        assert!(card.starts_with("🧪 Test: GPS LOCK\n"));
        assert!(card.contains(&format!("📌 Actual: {NOT_FOUND}")));
        assert!(!card.contains("Expected"));
        assert!(!card.contains("Description"));
    }

    #[test]
    fn summary_lists_buckets_in_order() {
        let summary = summary("CAN Bus Test --> Passed --> 1 Mbps\nBoot --> 2 s\nGPS fix Failed\n");
        let text = render_summary(&summary);
        assert!(text.starts_with("Found 1 Passed, 1 Failed, and 1 Other items.\n"));
        let passed = text.find("✅ Passed (1)").unwrap();
        let failed = text.find("❌ Failed (1)").unwrap();
        let other = text.find("Other (1)").unwrap();
        assert!(passed < failed && failed < other);
    }

    #[test]
    fn notices_for_unrecognized_outcomes() {
        assert_eq!(
            render_outcome(&VerificationOutcome::Unsupported { file_name: "a.png".to_string() }),
            "Unsupported file type: a.png\n"
        );
        assert_eq!(
            render_outcome(&VerificationOutcome::DecodeFailed {
                file_name: "a.pdf".to_string(),
                message: "bad xref".to_string(),
            }),
            "An error occurred while parsing: bad xref\n"
        );
    }

    #[test]
    fn save_json_and_text() {
        let summary = summary("Wifi scan Passed\n");
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("out.json");
        let text_path = dir.path().join("out.txt");
        summary.save_with_format(json_path.to_str().unwrap(), "json").unwrap();
        summary.save_with_format(text_path.to_str().unwrap(), "text").unwrap();

        let back: ReportSummary =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, summary);
        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("Test: Wifi scan"));
        assert!(summary.save_with_format(json_path.to_str().unwrap(), "xml").is_err());
    }
}
