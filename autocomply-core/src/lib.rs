// AutoComply Core Library
//
// Extracts PASS/FAIL verdicts from automotive test reports, looks up parts in
// the component catalog and renders canned test procedures.

pub mod bom;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod knowledge_base;
pub mod parser;
pub mod partition;
pub mod preprocessors;
pub mod processor;
pub mod render;
pub mod rules;
pub mod session;
pub mod tabular;
pub mod types;

// Re-export main types and functions for easy use
pub use catalog::{CatalogEntry, ComponentCatalog};
pub use config::ParsingConfig;
pub use error::DecodeError;
pub use knowledge_base::{KnowledgeBase, TestProcedureTemplate};
pub use parser::ReportParser;
pub use partition::{partition, Bucket, Partition};
pub use preprocessors::{Preprocessor, PreprocessorRegistry};
pub use processor::{read_upload, ReportProcessor, ReportSummary, StepProfiler, VerificationOutcome};
pub use session::{Dashboard, SessionContext};
pub use types::*;
