use regex::Regex;
use std::sync::LazyLock;

use super::engine::{LineMatch, LineRule};
use crate::types::Verdict;

static THREE_PART_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s*-->\s*(Passed|Failed|Success)\s*-->\s*(.+)$").unwrap()
});

static TWO_PART_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*?)\s*-->\s*(.+)$").unwrap());

static NUMBERED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^\d+:\s*([A-Z_]+):\s*"([A-Z]+)"$"#).unwrap());

static IS_PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+is\s+(success|failure|passed|failed)$").unwrap()
});

static TRAILING_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+(Failed|Passed)$").unwrap());

fn pass_or_fail(passed: bool) -> Verdict {
    if passed {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// `<name> --> <Passed|Failed|Success> --> <actual>`
pub struct ThreePartArrowRule;

impl LineRule for ThreePartArrowRule {
    fn name(&self) -> &str {
        "ThreePartArrow"
    }

    fn extract(&self, line: &str) -> Option<LineMatch> {
        let caps = THREE_PART_ARROW.captures(line)?;
        let status = caps[2].to_lowercase();
        Some(LineMatch {
            name: caps[1].trim().to_string(),
            result: pass_or_fail(status == "passed" || status == "success"),
            actual: Some(caps[3].trim().to_string()),
        })
    }
}

/// `<name> --> <tail>`, verdict read off the tail.
pub struct TwoPartArrowRule;

impl LineRule for TwoPartArrowRule {
    fn name(&self) -> &str {
        "TwoPartArrow"
    }

    fn extract(&self, line: &str) -> Option<LineMatch> {
        let caps = TWO_PART_ARROW.captures(line)?;
        let tail = caps[2].to_lowercase();
        let result = if tail.contains("passed") || tail.contains("success") {
            Verdict::Pass
        } else if tail.contains("failed") {
            Verdict::Fail
        } else {
            Verdict::Info
        };
        Some(LineMatch {
            name: caps[1].trim().to_string(),
            result,
            actual: Some(caps[2].trim().to_string()),
        })
    }
}

/// `<digits>: <TOKEN_NAME>: "<STATUS>"` as written by numbered test logs.
pub struct NumberedTokenRule;

impl LineRule for NumberedTokenRule {
    fn name(&self) -> &str {
        "NumberedToken"
    }

    fn extract(&self, line: &str) -> Option<LineMatch> {
        let caps = NUMBERED_TOKEN.captures(line)?;
        Some(LineMatch {
            name: caps[1].replace('_', " ").trim().to_string(),
            result: Verdict::from_token(&caps[2].to_uppercase()),
            actual: None,
        })
    }
}

/// `<name> is <success|failure|passed|failed>`
pub struct IsPredicateRule;

impl LineRule for IsPredicateRule {
    fn name(&self) -> &str {
        "IsPredicate"
    }

    fn extract(&self, line: &str) -> Option<LineMatch> {
        let caps = IS_PREDICATE.captures(line)?;
        let status = caps[2].to_lowercase();
        Some(LineMatch {
            name: caps[1].trim().to_string(),
            result: pass_or_fail(status == "success" || status == "passed"),
            actual: None,
        })
    }
}

/// `<name> <Passed|Failed>` with the keyword as the last token.
pub struct TrailingKeywordRule;

impl LineRule for TrailingKeywordRule {
    fn name(&self) -> &str {
        "TrailingKeyword"
    }

    fn extract(&self, line: &str) -> Option<LineMatch> {
        let caps = TRAILING_KEYWORD.captures(line)?;
        Some(LineMatch {
            name: caps[1].trim().to_string(),
            result: pass_or_fail(caps[2].eq_ignore_ascii_case("passed")),
            actual: None,
        })
    }
}
