// Shared checks for Office Open XML containers (DOCX, XLSX)

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::DecodeError;

/// Rejects a container holding any part whose declared uncompressed size
/// is above `limit`, before a decoder library inflates it.
pub fn check_part_sizes(bytes: &[u8], limit: u64) -> Result<(), DecodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        let size = entry.size();
        if size > limit {
            return Err(DecodeError::TooLarge { size, limit });
        }
    }
    Ok(())
}
