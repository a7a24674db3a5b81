use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// fatal errors: anything that stops the whole run rather than a single
/// molecule. per-molecule recoverable conditions live in
/// [`crate::aggregate::SkipReason`] instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// an external tool exited with a non-zero status during the
    /// optimization stage. always fatal: a broken tool chain would
    /// otherwise produce a systematically incomplete dataset.
    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} produced unusable output: {reason}")]
    ToolOutput { program: String, reason: String },

    #[error("unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("input table {path:?} has no target column")]
    NoTargetColumn { path: PathBuf },
}
