// Line classification rules
// - engine.rs: LineRule trait, RuleEngine and line splitting
// - line_rules.rs: the five built-in line shapes

pub mod engine;
pub mod line_rules;

pub use engine::*;
pub use line_rules::*;
