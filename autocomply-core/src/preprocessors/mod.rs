//! Report Decoders
//!
//! This module turns uploaded files into a `RawDocument` the report parser
//! understands: free text for the line rules, or a header + rows table for
//! the tabular normalizer.
//!
//! ## Architecture
//!
//! ```text
//! Upload (PDF, DOCX, XLSX, CSV, TXT, LOG)
//!     ↓
//! [Format-specific Preprocessor]
//!     ↓
//! RawDocument (text or table)
//!     ↓
//! [Report Parser]
//! ```
//!
//! ## Available Preprocessors
//!
//! - `TextPreprocessor` - plain text and logs
//! - `PdfPreprocessor` - PDF text layer via pdf-extract (`pdf-backend` feature)
//! - `DocxPreprocessor` - Word paragraphs via docx-rs (`docx-backend` feature)
//! - `XlsxPreprocessor` - Excel sheets via calamine, as table or flattened
//!   text (`xlsx-backend` feature)
//!
//! Decoders run third-party parsers over untrusted bytes; a panic inside
//! one is turned into `DecodeError::Panicked` by `catch_decoder_panic`.
//! - `CsvPreprocessor` - comma-separated tables

pub mod delimited;
pub mod docx;
pub mod ooxml;
pub mod pdf;
pub mod preprocessor;
pub mod text;
pub mod xlsx;

use std::sync::Arc;

pub use delimited::CsvPreprocessor;
pub use docx::DocxPreprocessor;
pub use pdf::PdfPreprocessor;
pub use preprocessor::{catch_decoder_panic, Preprocessor};
pub use text::TextPreprocessor;
pub use xlsx::XlsxPreprocessor;

use crate::config::ParsingConfig;
use crate::types::SourceFormat;

/// One decoder per supported format, picked by `SourceFormat`.
#[derive(Clone)]
pub struct PreprocessorRegistry {
    preprocessors: Vec<Arc<dyn Preprocessor>>,
}

impl PreprocessorRegistry {
    pub fn new(preprocessors: Vec<Arc<dyn Preprocessor>>) -> Self {
        Self { preprocessors }
    }

    pub fn from_config(config: &ParsingConfig) -> Self {
        let part_limit = config.limits.max_archive_entry_bytes;
        Self::new(vec![
            Arc::new(TextPreprocessor::new(SourceFormat::Txt)),
            Arc::new(TextPreprocessor::new(SourceFormat::Log)),
            Arc::new(PdfPreprocessor::new()),
            Arc::new(DocxPreprocessor::new(part_limit)),
            Arc::new(XlsxPreprocessor::new(
                config.spreadsheet_mode,
                part_limit,
                config.limits.max_sheet_cells,
            )),
            Arc::new(CsvPreprocessor),
        ])
    }

    pub fn for_format(&self, format: SourceFormat) -> Option<Arc<dyn Preprocessor>> {
        self.preprocessors
            .iter()
            .find(|preprocessor| preprocessor.supports_format(format))
            .cloned()
    }
}

impl Default for PreprocessorRegistry {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}
