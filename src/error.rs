use std::path::PathBuf;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("Invalid magic number: {found:#010x} (expected {expected:#010x})")]
    InvalidMagicNumber { expected: u64, found: u64 },

    #[error("Invalid header flags: {0:#010x}")]
    InvalidFlags(u64),

    #[error("Unexpected end of stream in header")]
    Truncated,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown BWT format: {0}")]
    UnknownFormat(String),

    #[error("{path}: {source}")]
    Header { path: PathBuf, source: HeaderError },

    #[error("{path}: truncated BWT stream")]
    TruncatedStream { path: PathBuf },

    #[error("The alphabets of the inputs do not match")]
    AlphabetMismatch,

    #[error("A {order} alphabet cannot be written in {format} format")]
    IncompatibleAlphabet {
        order: &'static str,
        format: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn header(path: impl Into<PathBuf>, source: HeaderError) -> Self {
        Error::Header {
            path: path.into(),
            source,
        }
    }
}
