// Error types shared by the library modules. The binary wraps these in
// `anyhow` at the top level; inside the crate every fallible call returns
// `error::Result<T>` so the dispatcher can report a failure and keep going.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    /// The user typed something we could not use (non-numeric choice, bad URL).
    #[error("invalid input: {0}")]
    Input(String),

    /// Account name or key missing or malformed.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// The container behind a blob handle could not be created or looked up.
    #[error("could not resolve container `{container}`: {source}")]
    Resolution {
        container: String,
        #[source]
        source: Box<TransferError>,
    },

    /// The storage service answered with a non-success status.
    #[error("service returned {status}{}: {message}", code_suffix(.code))]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

impl TransferError {
    pub fn resolution(container: &str, source: TransferError) -> Self {
        TransferError::Resolution {
            container: container.to_string(),
            source: Box::new(source),
        }
    }

    /// Service error code (`ContainerAlreadyExists`, `BlobNotFound`, ...) if any.
    pub fn service_code(&self) -> Option<&str> {
        match self {
            TransferError::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
