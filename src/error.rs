/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// The input is not a JSON Schema (neither an object nor a boolean)
    InvalidSchema(String),
    /// A `$ref` whose target cannot be located in the document
    DanglingReference { reference: String, reason: String },
    /// The remote endpoint source failed or answered with a non-success status
    Transport(String),
    /// An endpoint file or response body could not be decoded
    Decode { origin: String, message: String },
    InvalidArgument(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::InvalidSchema(msg) => write!(f, "invalid schema: {}", msg),
            Error::DanglingReference { reference, reason } => {
                write!(f, "dangling reference {}: {}", reference, reason)
            }
            Error::Transport(status) => write!(f, "fetch failed: {}", status),
            Error::Decode { origin, message } => write!(f, "cannot decode {}: {}", origin, message),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    pub(crate) fn dangling(reference: &str, reason: impl Into<String>) -> Self {
        Error::DanglingReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error is local to a single schema (as opposed to the whole load)
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Error::InvalidSchema(_) | Error::DanglingReference { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Transport(format!("request timed out: {}", err))
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => Error::IoError(io),
            None => Error::InvalidArgument("filesystem loop while scanning directory".to_string()),
        }
    }
}
