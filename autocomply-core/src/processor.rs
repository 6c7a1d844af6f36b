use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::ParsingConfig;
use crate::error::DecodeError;
use crate::fingerprint::{calculate_config_hash, calculate_report_hash};
use crate::parser::ReportParser;
use crate::partition::{partition, Bucket, Partition};
use crate::preprocessors::{catch_decoder_panic, Preprocessor, PreprocessorRegistry};
use crate::session::SessionContext;
use crate::types::{RawDocument, SourceFormat, TestRecord};

/// Simple profiler for tracking step timings
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        self.timings.push((step_name.to_string(), start.elapsed()));
        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Identity of the uploaded file a summary was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file_name: String,
    pub format: SourceFormat,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Everything extracted from one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub source: SourceInfo,
    pub config_hash: String,
    pub processed_at: DateTime<Utc>,
    pub records: Vec<TestRecord>,
    pub partition: Partition,
}

impl ReportSummary {
    pub fn bucket(&self, bucket: Bucket) -> Vec<&TestRecord> {
        self.partition
            .indices(bucket)
            .iter()
            .filter_map(|&index| self.records.get(index))
            .collect()
    }

    /// (passed, failed, other)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.partition.passed.len(),
            self.partition.failed.len(),
            self.partition.others.len(),
        )
    }
}

/// What happened to one upload. Never an error: every failure is a notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// At least one record was extracted
    Recognized(ReportSummary),
    /// Decoded fine, but no line or row yielded a record
    NothingRecognized { source: SourceInfo },
    /// Not one of the accepted formats
    Unsupported { file_name: String },
    /// The decoder gave up (corrupt file, size/time limit, missing backend)
    DecodeFailed { file_name: String, message: String },
}

impl VerificationOutcome {
    pub fn summary(&self) -> Option<&ReportSummary> {
        match self {
            VerificationOutcome::Recognized(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn records(&self) -> &[TestRecord] {
        self.summary()
            .map(|summary| summary.records.as_slice())
            .unwrap_or(&[])
    }
}

/// Picks the decoder format from the file name, then from a MIME type.
pub fn detect_format(file_name: &str, mime: Option<&str>) -> Option<SourceFormat> {
    SourceFormat::from_path(Path::new(file_name)).or_else(|| mime.and_then(SourceFormat::from_mime))
}

/// Runs the decoder on its own thread and stops waiting after `timeout_secs`.
/// A decoder still running at the deadline is left to finish on its own;
/// its result is discarded. With no timeout the decoder runs inline. A panic
/// is a decode error on either path.
fn decode_with_watchdog(
    preprocessor: Arc<dyn Preprocessor>,
    bytes: &[u8],
    timeout_secs: u64,
) -> Result<RawDocument, DecodeError> {
    if timeout_secs == 0 {
        return catch_decoder_panic(preprocessor.name(), || preprocessor.decode(bytes));
    }

    let (sender, receiver) = mpsc::channel();
    let owned = bytes.to_vec();
    thread::Builder::new()
        .name(format!("decode-{}", preprocessor.name()))
        .spawn(move || {
            let result = catch_decoder_panic(preprocessor.name(), || preprocessor.decode(&owned));
            let _ = sender.send(result);
        })?;

    match receiver.recv_timeout(Duration::from_secs(timeout_secs)) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(DecodeError::Timeout(timeout_secs)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(DecodeError::Io(std::io::Error::other(
            "decoder thread stopped without a result",
        ))),
    }
}

/// Reads an upload from disk without reading past `limit`; a larger file is
/// `TooLarge` whether its metadata says so or its contents do.
pub fn read_upload(path: &Path, limit: u64) -> Result<Vec<u8>, DecodeError> {
    let file = File::open(path)?;
    let declared = file.metadata()?.len();
    if declared > limit {
        return Err(DecodeError::TooLarge {
            size: declared,
            limit,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    let size = bytes.len() as u64;
    if size > limit {
        return Err(DecodeError::TooLarge { size, limit });
    }
    Ok(bytes)
}

/// Upload → decoded document → records → buckets.
pub struct ReportProcessor {
    config: ParsingConfig,
    config_hash: String,
    registry: PreprocessorRegistry,
    parser: ReportParser,
}

impl ReportProcessor {
    pub fn new(config: ParsingConfig) -> Result<Self> {
        let registry = PreprocessorRegistry::from_config(&config);
        Self::new_with_dependencies(config, registry)
    }

    /// Create processor with a custom set of decoders
    pub fn new_with_dependencies(config: ParsingConfig, registry: PreprocessorRegistry) -> Result<Self> {
        let config_hash = calculate_config_hash(&config)?;
        let parser = ReportParser::from_config(&config);
        Ok(Self {
            config,
            config_hash,
            registry,
            parser,
        })
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn parser(&self) -> &ReportParser {
        &self.parser
    }

    /// Size check, decoder lookup and the decode itself under the watchdog.
    pub fn decode(&self, format: SourceFormat, bytes: &[u8]) -> Result<RawDocument, DecodeError> {
        let limit = self.config.limits.max_input_bytes;
        let size = bytes.len() as u64;
        if size > limit {
            return Err(DecodeError::TooLarge { size, limit });
        }
        let preprocessor = self
            .registry
            .for_format(format)
            .ok_or_else(|| DecodeError::Unsupported(format.to_string()))?;
        decode_with_watchdog(preprocessor, bytes, self.config.limits.decode_timeout_secs)
    }

    pub fn verify(&self, file_name: &str, bytes: &[u8], session: &mut SessionContext) -> VerificationOutcome {
        self.verify_with_options(file_name, None, bytes, session, &mut StepProfiler::new(false))
    }

    /// Reads the file itself; an unreadable or oversized file is reported
    /// like a decode failure.
    pub fn verify_file(&self, path: &Path, session: &mut SessionContext) -> VerificationOutcome {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match read_upload(path, self.config.limits.max_input_bytes) {
            Ok(bytes) => self.verify(&file_name, &bytes, session),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                VerificationOutcome::DecodeFailed {
                    file_name,
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn verify_with_options(
        &self,
        file_name: &str,
        mime: Option<&str>,
        bytes: &[u8],
        session: &mut SessionContext,
        profiler: &mut StepProfiler,
    ) -> VerificationOutcome {
        let Some(format) = detect_format(file_name, mime) else {
            warn!("Unsupported upload: {}", file_name);
            return VerificationOutcome::Unsupported {
                file_name: file_name.to_string(),
            };
        };

        let document = match profiler.time_step("Decode", || self.decode(format, bytes)) {
            Ok(document) => document,
            Err(DecodeError::Unsupported(_)) => {
                return VerificationOutcome::Unsupported {
                    file_name: file_name.to_string(),
                }
            }
            Err(e) => {
                warn!("Decoding {} as {} failed: {}", file_name, format, e);
                return VerificationOutcome::DecodeFailed {
                    file_name: file_name.to_string(),
                    message: e.to_string(),
                };
            }
        };

        // Hashed only once the size check in `decode` has passed
        let source = SourceInfo {
            file_name: file_name.to_string(),
            format,
            size_bytes: bytes.len() as u64,
            sha256: calculate_report_hash(bytes),
        };

        let records = profiler.time_step("Parse", || self.parser.parse(&document));
        if records.is_empty() {
            info!("No records recognized in {}", file_name);
            return VerificationOutcome::NothingRecognized { source };
        }

        let split = profiler.time_step("Bucket", || partition(&records));
        info!(
            "{}: {} passed, {} failed, {} other",
            file_name,
            split.passed.len(),
            split.failed.len(),
            split.others.len()
        );
        session.record_report_verified();

        VerificationOutcome::Recognized(ReportSummary {
            source,
            config_hash: self.config_hash.clone(),
            processed_at: Utc::now(),
            records,
            partition: split,
        })
    }
}
