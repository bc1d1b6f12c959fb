use std::error::Error;
use std::fmt;

use srtm::SrtmError;

/// Error kinds for the DEM ingestion pipeline (components D-I). Matches the
/// error taxonomy used throughout the workspace: hand-rolled enums with
/// `Display`/`Error` impls, no derive-macro crate.
#[derive(Debug)]
pub enum DemError {
    OutOfRange(String),
    InvalidFormat(String),
    TileNotFound { tile_name: String, url: String },
    Corrupt(String),
    TransportError(String),
    UnknownWorldVersion(String),
    Database(String),
    ObjectStore(String),
}

impl fmt::Display for DemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemError::OutOfRange(msg) => write!(f, "out of range: {msg}"),
            DemError::InvalidFormat(msg) => write!(f, "invalid format: {msg}"),
            DemError::TileNotFound { tile_name, url } => {
                write!(f, "tile {tile_name} not found at {url}")
            }
            DemError::Corrupt(msg) => write!(f, "corrupt tile data: {msg}"),
            DemError::TransportError(msg) => write!(f, "transport error: {msg}"),
            DemError::UnknownWorldVersion(msg) => write!(f, "unknown world version: {msg}"),
            DemError::Database(msg) => write!(f, "database error: {msg}"),
            DemError::ObjectStore(msg) => write!(f, "object store error: {msg}"),
        }
    }
}

impl Error for DemError {}

impl From<SrtmError> for DemError {
    fn from(e: SrtmError) -> Self {
        match e {
            SrtmError::OutOfRange { message } => DemError::OutOfRange(message),
            SrtmError::InvalidFormat { message } => DemError::InvalidFormat(message),
        }
    }
}

impl From<objstore::ObjectStoreError> for DemError {
    fn from(e: objstore::ObjectStoreError) -> Self {
        DemError::ObjectStore(e.to_string())
    }
}

impl From<sqlx::Error> for DemError {
    fn from(e: sqlx::Error) -> Self {
        DemError::Database(e.to_string())
    }
}
