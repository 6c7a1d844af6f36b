use thiserror::Error;

/// Errors raised while turning an uploaded file into text or rows.
///
/// None of these ever escape `ReportProcessor::verify`; they are folded
/// into a `VerificationOutcome` so one bad upload cannot take the host down.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
    #[error("Input is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("Spreadsheet extraction failed: {0}")]
    Spreadsheet(String),
    #[error("CSV parsing failed: {0}")]
    Csv(String),
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("Worksheet spans {cells} cells, above the {limit} cell limit")]
    SheetTooLarge { cells: u64, limit: u64 },
    #[error("Decoder aborted: {0}")]
    Panicked(String),
    #[error("Decoding did not finish within {0}s")]
    Timeout(u64),
    #[error("Feature not enabled: rebuild with --features {0}")]
    FeatureDisabled(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for DecodeError {
    fn from(err: zip::result::ZipError) -> Self {
        DecodeError::Archive(err.to_string())
    }
}

impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        DecodeError::Csv(err.to_string())
    }
}
