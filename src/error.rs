use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeltaError {
    #[error("Cannot open {file}: {source}\nCheck that the file exists and you have read permissions.")]
    Open {
        file: String,
        source: std::io::Error,
    },

    #[error("I/O error on {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("Short read on {file}: {remaining} bytes outstanding\nThe file shrank or the pipe closed mid-transfer.")]
    ShortRead { file: String, remaining: u64 },

    #[error("Cannot seek {file} to {expected} (landed at {actual})")]
    Seek {
        file: String,
        expected: u64,
        actual: u64,
    },

    #[error("Source file not found: {file}")]
    SourceMissing { file: String },

    #[error("Malformed wire data: {0}")]
    Wire(#[from] crate::protocol::WireError),
}

pub type Result<T> = std::result::Result<T, DeltaError>;
