//! A small PUT/GET/exists abstraction over the bucket the rest of the
//! workspace treats as durable storage for DEM tiles and terrain chunks.
//! The AWS SDK itself is out of scope; only this contract is implemented,
//! backed locally by the filesystem.

pub mod error;
pub mod filesystem;

use std::future::Future;
use std::pin::Pin;

pub use error::ObjectStoreError;
pub use filesystem::FilesystemObjectStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable key/value byte storage. Every method is dyn-compatible via
/// `BoxFuture` so callers can hold a `dyn ObjectStore` behind an `Arc`.
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` under `key`, overwriting any existing object, and
    /// returns a server-assigned integrity tag for the stored content.
    fn put<'a>(&'a self, key: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<String, ObjectStoreError>>;

    /// Reads the object at `key`. Returns `Ok(None)` if it does not exist.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, ObjectStoreError>>;

    /// HEAD-style existence check: a missing object is `Ok(false)`, not an
    /// error.
    fn exists<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool, ObjectStoreError>>;

    /// Lists keys under `prefix`, used by the DEM index initializer at
    /// startup. An absent prefix yields an empty list, not an error.
    fn list_prefix<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, ObjectStoreError>>;
}

/// Content fingerprint used as the stand-in for a server-assigned ETag.
/// FNV-1a, chosen for being allocation-free and dependency-free; this is a
/// fingerprint for idempotence checks, not a security boundary.
pub fn fingerprint(bytes: &[u8]) -> String {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    format!("{hash:016x}")
}
