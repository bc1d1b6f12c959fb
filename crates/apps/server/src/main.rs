use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chunks::{ChunkCoordinator, ChunkStatusView, DEFAULT_DB_WRITE_SEMAPHORE_PERMITS};
use dem::{
    populate_index_from_store, DemDownloadWorker, DemResolver, DemStatusRepo, DemTileIndex,
    LocalDemStore, SrtmFetcher, WorldVersionCache, DEFAULT_POLL_INTERVAL,
};
use foundation::math::Geodesy;
use objstore::{FilesystemObjectStore, ObjectStore};
use serde::Deserialize;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Config {
    bind_addr: SocketAddr,
    database_url: String,
    object_store_root: PathBuf,
    origin_lat: f64,
    origin_lon: f64,
    chunk_size_meters: f64,
    meters_per_degree_lat: f64,
    poll_interval_secs: u64,
    db_write_semaphore_permits: usize,
}

impl Config {
    fn from_env() -> Self {
        let bind_addr = env::var("TERRAIN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:9100".to_string())
            .parse()
            .expect("invalid TERRAIN_ADDR");

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let object_store_root = env::var("TERRAIN_OBJECT_STORE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/data/terrain/objects"));

        Self {
            bind_addr,
            database_url,
            object_store_root,
            origin_lat: env_var_f64("TERRAIN_ORIGIN_LAT", 46.0),
            origin_lon: env_var_f64("TERRAIN_ORIGIN_LON", -113.0),
            chunk_size_meters: env_var_f64("TERRAIN_CHUNK_SIZE_METERS", 100.0),
            meters_per_degree_lat: env_var_f64("TERRAIN_METERS_PER_DEGREE_LAT", 111_320.0),
            poll_interval_secs: env_var_u64("TERRAIN_DEM_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs()),
            db_write_semaphore_permits: env_var_usize(
                "TERRAIN_DB_WRITE_SEMAPHORE_PERMITS",
                DEFAULT_DB_WRITE_SEMAPHORE_PERMITS,
            ),
        }
    }
}

#[derive(Clone)]
struct AppState {
    versions: Arc<WorldVersionCache>,
    dem_status: Arc<DemStatusRepo>,
    coordinator: Arc<ChunkCoordinator>,
    object_store: Arc<dyn ObjectStore>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let versions = Arc::new(
        WorldVersionCache::load(&pool)
            .await
            .expect("failed to load world versions"),
    );

    let object_store: Arc<dyn ObjectStore> =
        Arc::new(FilesystemObjectStore::new(config.object_store_root.clone()));

    let dem_index = Arc::new(DemTileIndex::new());
    let populated = populate_index_from_store(&object_store, &dem_index)
        .await
        .expect("failed to populate dem tile index from object store");
    info!(tiles = populated, "dem tile index populated from object store");

    let dem_status = Arc::new(DemStatusRepo::new(pool.clone(), versions.clone()));
    let chunk_metadata = Arc::new(chunks::ChunkMetadataRepo::new(pool.clone(), versions.clone()));

    let fetcher = SrtmFetcher::new();
    let dem_store = LocalDemStore::new(object_store.clone());
    let resolver = Arc::new(DemResolver::new(fetcher.clone(), dem_store.clone(), dem_index.clone()));

    let geodesy = Geodesy::new(
        config.origin_lat,
        config.origin_lon,
        config.chunk_size_meters,
        config.meters_per_degree_lat,
    );

    let sampler = Arc::new(chunks::ChunkSampler::new(geodesy, resolver.clone(), object_store.clone()));
    let object_writer = Arc::new(chunks::ChunkObjectWriter::new(object_store.clone()));

    let seeded = chunks::seed_anchor_chunks(&versions, &chunk_metadata, &object_writer)
        .await
        .expect("failed to seed anchor chunks");
    info!(seeded, "anchor chunks seeded");

    let db_write_semaphore = Arc::new(tokio::sync::Semaphore::new(config.db_write_semaphore_permits));
    let coordinator = Arc::new(ChunkCoordinator::new(
        geodesy,
        dem_status.clone(),
        chunk_metadata,
        sampler,
        object_writer,
        db_write_semaphore,
    ));

    let worker = DemDownloadWorker::new(
        fetcher,
        dem_store,
        dem_status.clone(),
        dem_index,
        versions.clone(),
        std::time::Duration::from_secs(config.poll_interval_secs),
    );
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });

    let state = AppState {
        versions,
        dem_status,
        coordinator,
        object_store,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/chunks/:world_version/:chunk_x/:chunk_z", get(get_chunk))
        .route("/dem-status/:world_version", get(get_dem_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("terrain chunk server listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await.unwrap();

    let serve = axum::serve(listener, app);
    tokio::select! {
        result = serve => {
            if let Err(err) = result {
                warn!("server exited with error: {err}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    }
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

#[derive(Debug, Deserialize)]
struct ChunkQuery {
    #[serde(default = "default_resolution")]
    resolution: u16,
    #[serde(default = "default_layer")]
    layer: String,
}

fn default_resolution() -> u16 {
    16
}

fn default_layer() -> String {
    "terrain".to_string()
}

async fn get_chunk(
    State(state): State<AppState>,
    AxumPath((world_version, chunk_x, chunk_z)): AxumPath<(String, i64, i64)>,
    Query(query): Query<ChunkQuery>,
) -> Response {
    if state.versions.get(&world_version).is_none() {
        return (StatusCode::NOT_FOUND, "unknown world version").into_response();
    }

    let status = match state
        .coordinator
        .get_chunk_status(&world_version, chunk_x, chunk_z, &query.layer, query.resolution)
        .await
    {
        Ok(status) => status,
        Err(err) => {
            warn!(error = %err, "failed to read chunk status");
            return (StatusCode::INTERNAL_SERVER_ERROR, "chunk status lookup failed").into_response();
        }
    };

    match status {
        ChunkStatusView::Ready => {
            let metadata = match state
                .coordinator
                .get_chunk_metadata(&world_version, chunk_x, chunk_z, &query.layer, query.resolution)
                .await
            {
                Ok(Some(row)) => row,
                Ok(None) => return (StatusCode::INTERNAL_SERVER_ERROR, "ready chunk missing metadata").into_response(),
                Err(err) => {
                    warn!(error = %err, "failed to read chunk metadata");
                    return (StatusCode::INTERNAL_SERVER_ERROR, "chunk metadata lookup failed").into_response();
                }
            };

            let Some(object_key) = metadata.object_key else {
                return (StatusCode::INTERNAL_SERVER_ERROR, "ready chunk missing object key").into_response();
            };

            match state.object_store.get(&object_key).await {
                Ok(Some(bytes)) => (
                    StatusCode::OK,
                    [(axum::http::header::CONTENT_TYPE, "application/octet-stream")],
                    bytes,
                )
                    .into_response(),
                Ok(None) => {
                    warn!(object_key, "ready chunk row points at a missing object");
                    (StatusCode::INTERNAL_SERVER_ERROR, "chunk object missing").into_response()
                }
                Err(err) => {
                    warn!(error = %err, "failed to read chunk object");
                    (StatusCode::INTERNAL_SERVER_ERROR, "chunk object read failed").into_response()
                }
            }
        }
        ChunkStatusView::Pending => {
            (StatusCode::ACCEPTED, [("Cache-Control", "no-store")], "pending").into_response()
        }
        ChunkStatusView::Failed => (StatusCode::INTERNAL_SERVER_ERROR, "chunk fabrication failed").into_response(),
        ChunkStatusView::NotFound => {
            match state
                .coordinator
                .trigger_generation(&world_version, chunk_x, chunk_z, &query.layer, query.resolution)
                .await
            {
                Ok(()) => (StatusCode::ACCEPTED, [("Cache-Control", "no-store")], "generation triggered").into_response(),
                Err(chunks::ChunkError::DemTileNotReady { tile_key }) => {
                    info!(tile_key, "chunk generation deferred: gating dem tile not ready");
                    (
                        StatusCode::ACCEPTED,
                        [("Cache-Control", "no-store"), ("Retry-After", "5")],
                        "dem tile not ready",
                    )
                        .into_response()
                }
                Err(err) => {
                    warn!(error = %err, "failed to trigger chunk generation");
                    (StatusCode::INTERNAL_SERVER_ERROR, "chunk generation trigger failed").into_response()
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DemStatusQuery {
    lat: f64,
    lon: f64,
}

async fn get_dem_status(
    State(state): State<AppState>,
    AxumPath(world_version): AxumPath<String>,
    Query(query): Query<DemStatusQuery>,
) -> Response {
    if state.versions.get(&world_version).is_none() {
        return (StatusCode::NOT_FOUND, "unknown world version").into_response();
    }

    let tile_key = match srtm::compute_tile_name(query.lat, query.lon) {
        Ok(key) => key,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    if let Err(err) = state.dem_status.get_or_create_missing(&world_version, &tile_key).await {
        warn!(error = %err, "failed to ensure dem tile row");
        return (StatusCode::INTERNAL_SERVER_ERROR, "dem status lookup failed").into_response();
    }

    match state.dem_status.get_status(&world_version, &tile_key).await {
        Ok(Some(row)) => axum::Json(json!({
            "tileKey": row.tile_key,
            "status": format!("{:?}", row.status).to_lowercase(),
            "lastError": row.last_error,
        }))
        .into_response(),
        Ok(None) => (StatusCode::INTERNAL_SERVER_ERROR, "dem tile row vanished").into_response(),
        Err(err) => {
            warn!(error = %err, "failed to read dem tile status");
            (StatusCode::INTERNAL_SERVER_ERROR, "dem status lookup failed").into_response()
        }
    }
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
