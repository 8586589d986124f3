use thiserror::Error;

#[derive(Error, Debug)]
pub enum H5CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A root file could not be opened; the message is the user-facing line.
    #[error("Unable to open file '{path}'")]
    FileOpen { path: String, reason: String },

    #[error("Unknown element type: {kind} ({path})")]
    UnrecognizedKind { path: String, kind: String },

    #[error("Container error: {0}")]
    Container(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl H5CompareError {
    pub fn file_open(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::FileOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, H5CompareError>;
