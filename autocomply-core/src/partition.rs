use serde::{Deserialize, Serialize};

use crate::types::{TestRecord, Verdict};

/// Display group of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Passed,
    Failed,
    Other,
}

impl Bucket {
    /// Case-insensitive substring test; "PASS" is checked before "FAIL".
    pub fn of(result: &Verdict) -> Self {
        let upper = result.as_str().to_uppercase();
        if upper.contains("PASS") {
            Bucket::Passed
        } else if upper.contains("FAIL") {
            Bucket::Failed
        } else {
            Bucket::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Passed => "Passed",
            Bucket::Failed => "Failed",
            Bucket::Other => "Other",
        }
    }
}

/// Indices into the record list, one list per bucket, each in record order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub passed: Vec<usize>,
    pub failed: Vec<usize>,
    pub others: Vec<usize>,
}

impl Partition {
    pub fn indices(&self, bucket: Bucket) -> &[usize] {
        match bucket {
            Bucket::Passed => &self.passed,
            Bucket::Failed => &self.failed,
            Bucket::Other => &self.others,
        }
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.others.len()
    }
}

pub fn partition(records: &[TestRecord]) -> Partition {
    let mut result = Partition::default();
    for (index, record) in records.iter().enumerate() {
        match Bucket::of(&record.result) {
            Bucket::Passed => result.passed.push(index),
            Bucket::Failed => result.failed.push(index),
            Bucket::Other => result.others.push(index),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordOrigin;

    fn record(result: Verdict) -> TestRecord {
        TestRecord::new("t", result, RecordOrigin::Row { index: 0 })
    }

    #[test]
    fn pass_check_precedes_fail_check() {
        assert_eq!(
            Bucket::of(&Verdict::Verbatim("pass after fail".to_string())),
            Bucket::Passed
        );
        assert_eq!(Bucket::of(&Verdict::Verbatim("Failed".to_string())), Bucket::Failed);
        assert_eq!(Bucket::of(&Verdict::Verbatim("bypassed".to_string())), Bucket::Passed);
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(Bucket::of(&Verdict::Info), Bucket::Other);
        assert_eq!(Bucket::of(&Verdict::Unspecified), Bucket::Other);
        assert_eq!(Bucket::of(&Verdict::Verbatim("SKIPPED".to_string())), Bucket::Other);
    }

    #[test]
    fn buckets_cover_every_record_once() {
        let records = vec![
            record(Verdict::Pass),
            record(Verdict::Info),
            record(Verdict::Fail),
            record(Verdict::Pass),
            record(Verdict::Verbatim("n/a".to_string())),
        ];
        let split = partition(&records);
        assert_eq!(split.passed, vec![0, 3]);
        assert_eq!(split.failed, vec![2]);
        assert_eq!(split.others, vec![1, 4]);
        assert_eq!(split.total(), records.len());
        assert!(partition(&[]).passed.is_empty());
    }
}
