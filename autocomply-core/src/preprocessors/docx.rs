use super::ooxml::check_part_sizes;
use super::Preprocessor;
use crate::error::DecodeError;
use crate::types::{RawDocument, SourceFormat};

/// Word documents: text of the body paragraphs, in document order.
pub struct DocxPreprocessor {
    max_part_bytes: u64,
}

impl DocxPreprocessor {
    pub fn new(max_part_bytes: u64) -> Self {
        Self { max_part_bytes }
    }
}

#[cfg(feature = "docx-backend")]
mod backend {
    use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};

    use super::super::catch_decoder_panic;
    use crate::error::DecodeError;

    fn push_run_children(children: &[ParagraphChild], text: &mut String) {
        for child in children {
            match child {
                ParagraphChild::Run(run) => {
                    for run_child in &run.children {
                        match run_child {
                            RunChild::Text(t) => text.push_str(&t.text),
                            RunChild::Tab(_) => text.push('\t'),
                            RunChild::Break(_) => text.push('\n'),
                            _ => {}
                        }
                    }
                }
                ParagraphChild::Hyperlink(link) => push_run_children(&link.children, text),
                _ => {}
            }
        }
    }

    /// Runs concatenated; run-level tabs and breaks become `\t` and `\n`.
    /// Tab stops declared in paragraph properties are not text.
    pub fn paragraph_text(paragraph: &Paragraph) -> String {
        let mut text = String::new();
        push_run_children(&paragraph.children, &mut text);
        text
    }

    /// Top-level body paragraphs; tables are not part of the paragraph flow.
    pub fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
        catch_decoder_panic("docx-rs", || {
            let docx = docx_rs::read_docx(bytes).map_err(|e| DecodeError::Docx(e.to_string()))?;
            Ok(docx
                .document
                .children
                .iter()
                .filter_map(|child| match child {
                    DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
                    _ => None,
                })
                .collect())
        })
    }
}

#[cfg(feature = "docx-backend")]
fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    backend::paragraphs(bytes)
}

#[cfg(not(feature = "docx-backend"))]
fn extract_paragraphs(_bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    Err(DecodeError::FeatureDisabled("docx-backend".to_string()))
}

impl Preprocessor for DocxPreprocessor {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, DecodeError> {
        check_part_sizes(bytes, self.max_part_bytes)?;
        let paragraphs = extract_paragraphs(bytes)?;
        Ok(RawDocument::Text {
            format: SourceFormat::Docx,
            text: paragraphs.join("\n"),
        })
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn supports_format(&self, format: SourceFormat) -> bool {
        format == SourceFormat::Docx
    }
}
