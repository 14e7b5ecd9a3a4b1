use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while converting Datafficheur logs.
#[derive(Error, Debug)]
pub enum ForceError {
    /// An input file or directory does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A raw log is not a rectangular numeric grid.
    #[error("Parse error in {path} (line {line}): {message}")]
    Parse {
        path: PathBuf,
        /// 1-based line number, `0` when the error concerns the whole file.
        line: usize,
        message: String,
    },

    /// No raw log file matched the naming pattern.
    #[error("No Datafficheur files found in {0}")]
    EmptyInput(PathBuf),

    /// The notes file does not carry the `start`, `end` and `action` fields.
    #[error("Notes schema error: {0}")]
    Schema(String),

    /// A caller-supplied value is out of its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// CSV reader/writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A chart could not be rendered.
    #[error("Failed to render chart: {0}")]
    Plot(String),

    /// A JSON configuration document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ForceError {
    /// Shorthand for a [`ForceError::Parse`] pointing at `line` of `path`.
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        ForceError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the force crates.
pub type Result<T> = std::result::Result<T, ForceError>;
