use std::error::Error;
use std::fmt;

use dem::DemError;

#[derive(Debug)]
pub enum ChunkError {
    OutOfRange(String),
    Invariant(String),
    UnsupportedVersion { found: u16 },
    SizeMismatch { expected: usize, found: usize },
    UnknownWorldVersion(String),
    DemTileNotReady { tile_key: String },
    InvalidFormat(String),
    TileNotFound { tile_name: String, url: String },
    Corrupt(String),
    TransportError(String),
    Database(String),
    ObjectStore(String),
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::OutOfRange(msg) => write!(f, "out of range: {msg}"),
            ChunkError::Invariant(msg) => write!(f, "invariant violation: {msg}"),
            ChunkError::UnsupportedVersion { found } => {
                write!(f, "unsupported chunk wire format version {found}")
            }
            ChunkError::SizeMismatch { expected, found } => {
                write!(f, "chunk byte length mismatch: expected {expected}, found {found}")
            }
            ChunkError::UnknownWorldVersion(msg) => write!(f, "unknown world version: {msg}"),
            ChunkError::DemTileNotReady { tile_key } => {
                write!(f, "dem tile {tile_key} is not ready")
            }
            ChunkError::InvalidFormat(msg) => write!(f, "invalid format: {msg}"),
            ChunkError::TileNotFound { tile_name, url } => {
                write!(f, "tile {tile_name} not found at {url}")
            }
            ChunkError::Corrupt(msg) => write!(f, "corrupt tile data: {msg}"),
            ChunkError::TransportError(msg) => write!(f, "transport error: {msg}"),
            ChunkError::Database(msg) => write!(f, "database error: {msg}"),
            ChunkError::ObjectStore(msg) => write!(f, "object store error: {msg}"),
        }
    }
}

impl Error for ChunkError {}

impl From<DemError> for ChunkError {
    fn from(e: DemError) -> Self {
        match e {
            DemError::OutOfRange(msg) => ChunkError::OutOfRange(msg),
            DemError::InvalidFormat(msg) => ChunkError::InvalidFormat(msg),
            DemError::TileNotFound { tile_name, url } => ChunkError::TileNotFound { tile_name, url },
            DemError::Corrupt(msg) => ChunkError::Corrupt(msg),
            DemError::UnknownWorldVersion(msg) => ChunkError::UnknownWorldVersion(msg),
            DemError::TransportError(msg) => ChunkError::TransportError(msg),
            DemError::Database(msg) => ChunkError::Database(msg),
            DemError::ObjectStore(msg) => ChunkError::ObjectStore(msg),
        }
    }
}

impl From<objstore::ObjectStoreError> for ChunkError {
    fn from(e: objstore::ObjectStoreError) -> Self {
        ChunkError::ObjectStore(e.to_string())
    }
}

impl From<sqlx::Error> for ChunkError {
    fn from(e: sqlx::Error) -> Self {
        ChunkError::Database(e.to_string())
    }
}
