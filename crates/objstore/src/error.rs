use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ObjectStoreError {
    Io { key: String, message: String },
}

impl fmt::Display for ObjectStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectStoreError::Io { key, message } => {
                write!(f, "object store I/O error for {key:?}: {message}")
            }
        }
    }
}

impl Error for ObjectStoreError {}
