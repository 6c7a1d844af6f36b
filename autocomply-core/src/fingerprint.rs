use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

/// SHA-256 of the uploaded bytes, hex encoded.
pub fn calculate_report_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hash of the effective configuration, so two summaries can be compared
/// knowing whether the same rules produced them.
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
