pub mod anchor;
pub mod coordinator;
pub mod error;
pub mod metadata_repo;
pub mod object_writer;
pub mod sampler;
pub mod serializer;
pub mod terrain_chunk;

pub use anchor::seed_anchor_chunks;
pub use coordinator::{ChunkCoordinator, ChunkStatusView, DEFAULT_DB_WRITE_SEMAPHORE_PERMITS};
pub use error::ChunkError;
pub use metadata_repo::{ChunkMetadataRepo, ChunkMetadataRow, ChunkStatus};
pub use object_writer::ChunkObjectWriter;
pub use sampler::ChunkSampler;
pub use serializer::{deserialize, serialize, FORMAT_VERSION};
pub use terrain_chunk::TerrainChunk;
