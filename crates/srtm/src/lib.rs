pub mod codec;
pub mod error;
pub mod sampler;
pub mod tile_name;

pub use codec::{decode, encode, RawTile, MISSING};
pub use error::SrtmError;
pub use sampler::{bilinear, sample_elevation};
pub use tile_name::{compute_tile_name, parse_tile_name, TileDescriptor};
