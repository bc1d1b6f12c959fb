use std::error::Error;
use std::fmt;

/// Errors raised by tile-name computation/parsing and SRTM byte decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SrtmError {
    OutOfRange { message: String },
    InvalidFormat { message: String },
}

impl SrtmError {
    pub fn out_of_range(message: impl Into<String>) -> Self {
        SrtmError::OutOfRange {
            message: message.into(),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        SrtmError::InvalidFormat {
            message: message.into(),
        }
    }
}

impl fmt::Display for SrtmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SrtmError::OutOfRange { message } => write!(f, "out of range: {message}"),
            SrtmError::InvalidFormat { message } => write!(f, "invalid format: {message}"),
        }
    }
}

impl Error for SrtmError {}
