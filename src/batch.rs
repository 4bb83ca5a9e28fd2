use crate::border::{self, BorderError, CropConfirm, Outcome};
use crate::params::BorderParams;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions offered by the input picker.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tiff", "bmp", "gif"];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Written(PathBuf),
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub file_name: String,
    pub status: FileStatus,
}

impl FileOutcome {
    fn new(input: PathBuf, result: Result<Outcome, BorderError>) -> Self {
        let file_name = input
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let status = match result {
            Ok(Outcome::Written(path)) => FileStatus::Written(path),
            Ok(Outcome::Declined) => FileStatus::Skipped,
            Err(e) => FileStatus::Failed(e.to_string()),
        };

        Self {
            input,
            file_name,
            status,
        }
    }

    pub fn describe(&self) -> String {
        match &self.status {
            FileStatus::Written(path) => format!("✅ {} -> {}", self.file_name, path.display()),
            FileStatus::Skipped => format!("⏭ {} skipped (crop declined)", self.file_name),
            FileStatus::Failed(e) => format!("❌ {} failed: {}", self.input.display(), e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub outcomes: Vec<FileOutcome>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn stats(&self) -> BatchStats {
        let count = |pred: fn(&FileStatus) -> bool| {
            self.outcomes.iter().filter(|o| pred(&o.status)).count()
        };

        BatchStats {
            total: self.outcomes.len(),
            written: count(|s| matches!(s, FileStatus::Written(_))),
            skipped: count(|s| matches!(s, FileStatus::Skipped)),
            failed: count(|s| matches!(s, FileStatus::Failed(_))),
        }
    }

    pub fn summary(&self) -> String {
        let stats = self.stats();
        let elapsed = self.finished_at - self.started_at;
        format!(
            "Processed {} image(s) in {:.1}s: {} written, {} skipped, {} failed.",
            stats.total,
            elapsed.num_milliseconds() as f64 / 1000.0,
            stats.written,
            stats.skipped,
            stats.failed
        )
    }
}

/// Run the transformer over every input, one after the other. A failure on
/// one file is recorded and the rest still run.
pub fn run_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    params: &BorderParams,
    confirm: &mut dyn CropConfirm,
) -> Result<BatchReport, BatchError> {
    fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let started_at = Local::now();
    log::info!(
        "Processing {} image(s) into {} ({}x{}, border {}, postfix {:?})",
        inputs.len(),
        output_dir.display(),
        params.width,
        params.height,
        params.border,
        params.postfix
    );

    let mut outcomes = Vec::with_capacity(inputs.len());
    for input in inputs {
        let result = border::add_white_border(input, output_dir, params, confirm);
        if let Err(e) = &result {
            log::error!("Failed to process {}: {}", input.display(), e);
        }
        outcomes.push(FileOutcome::new(input.clone(), result));
    }

    let report = BatchReport {
        output_dir: output_dir.to_path_buf(),
        outcomes,
        started_at,
        finished_at: Local::now(),
    };
    log::info!("{}", report.summary());
    Ok(report)
}
