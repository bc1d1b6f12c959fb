pub mod error;
pub mod fetcher;
pub mod index;
pub mod index_init;
pub mod resolver;
pub mod status_repo;
pub mod store;
pub mod worker;
pub mod world_version;

pub use error::DemError;
pub use fetcher::SrtmFetcher;
pub use index::DemTileIndex;
pub use index_init::populate_index_from_store;
pub use resolver::DemResolver;
pub use status_repo::{DemStatusRepo, DemTileRow, DemTileStatus};
pub use store::LocalDemStore;
pub use worker::{DemDownloadWorker, DEFAULT_POLL_INTERVAL};
pub use world_version::{WorldVersion, WorldVersionCache};
