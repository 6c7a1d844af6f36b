//! PDF Preprocessor
//!
//! Extracts the text layer page by page. Scanned PDFs without a text layer
//! decode to empty text, which the parser reports as nothing recognized.

use crate::error::DecodeError;
use crate::preprocessors::Preprocessor;
use crate::types::{RawDocument, SourceFormat};

pub struct PdfPreprocessor;

impl PdfPreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Each page with any text, followed by a newline.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text
}

#[cfg(feature = "pdf-backend")]
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    // pdf-extract panics on some malformed content streams
    crate::preprocessors::catch_decoder_panic("pdf-extract", || {
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| DecodeError::Pdf(e.to_string()))
    })
}

#[cfg(not(feature = "pdf-backend"))]
fn extract_pages(_bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    Err(DecodeError::FeatureDisabled("pdf-backend".to_string()))
}

impl Preprocessor for PdfPreprocessor {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, DecodeError> {
        let pages = extract_pages(bytes)?;
        Ok(RawDocument::Text {
            format: SourceFormat::Pdf,
            text: join_pages(pages),
        })
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn supports_format(&self, format: SourceFormat) -> bool {
        format == SourceFormat::Pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pages_are_skipped() {
        assert_eq!(
            join_pages(["CAN Passed", "", "LTE Failed"]),
            "CAN Passed\nLTE Failed\n"
        );
        assert_eq!(join_pages(Vec::<String>::new()), "");
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = PdfPreprocessor::new().decode(b"not a pdf at all").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Pdf(_) | DecodeError::Panicked(_) | DecodeError::FeatureDisabled(_)
        ));
    }
}
