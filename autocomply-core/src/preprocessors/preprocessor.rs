// Preprocessor abstraction for report decoding
//
// This module defines the boundary between file decoding (bytes -> text or rows)
// and report parsing (text or rows -> records). Everything after this point is
// format-agnostic.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::DecodeError;
use crate::types::{RawDocument, SourceFormat};

/// Preprocessor trait - converts an uploaded file into a `RawDocument`
///
/// Preprocessors handle:
/// - Container and encoding details (ZIP parts, XML, PDF content streams)
/// - Text extraction in reading order
/// - Tabular shape for formats that have one
///
/// A preprocessor never panics on malformed input; every failure comes back
/// as a `DecodeError` so the caller can report it and move on.
pub trait Preprocessor: Send + Sync {
    /// Decode the raw bytes of one upload
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, DecodeError>;

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor handles the given format
    fn supports_format(&self, format: SourceFormat) -> bool;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs decoding work and turns a panic inside it into `DecodeError::Panicked`.
pub fn catch_decoder_panic<T, F>(decoder: &str, f: F) -> Result<T, DecodeError>
where
    F: FnOnce() -> Result<T, DecodeError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(DecodeError::Panicked(format!(
            "{decoder}: {}",
            panic_message(&*payload)
        ))),
    }
}
