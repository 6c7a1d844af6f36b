use super::Preprocessor;
use crate::error::DecodeError;
use crate::types::{RawDocument, SourceFormat};

/// Plain text and log files.
pub struct TextPreprocessor {
    format: SourceFormat,
}

impl TextPreprocessor {
    pub fn new(format: SourceFormat) -> Self {
        Self { format }
    }
}

/// UTF-8 decode that silently drops undecodable bytes and a leading BOM.
pub fn decode_utf8_lossy(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).replace('\u{FFFD}', ""),
    }
}

impl Preprocessor for TextPreprocessor {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, DecodeError> {
        Ok(RawDocument::Text {
            format: self.format,
            text: decode_utf8_lossy(bytes),
        })
    }

    fn name(&self) -> &str {
        match self.format {
            SourceFormat::Log => "log",
            _ => "text",
        }
    }

    fn supports_format(&self, format: SourceFormat) -> bool {
        format == self.format
    }
}
