//! Query server for region lookups.
//!
//! Serves the places lookup used by the map and list views, plus the
//! currently loaded boundaries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barangay::boundaries::{AxisOrder, BoundaryRecord, BoundaryStore};
use barangay::config::{BoundarySource, Config};
use barangay::{LocateError, PlaceData, Point, RegionClassifier};

mod refresh;
use refresh::{refresh_loop, BoundaryLoader};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Region lookup server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Boundaries JSON file (overrides config)
    #[arg(long, conflicts_with = "boundaries_url")]
    boundaries_file: Option<PathBuf>,

    /// Boundaries endpoint URL (overrides config)
    #[arg(long)]
    boundaries_url: Option<String>,

    /// How the source fills lat/long (overrides config)
    #[arg(long, value_enum)]
    axis_order: Option<AxisOrder>,

    /// Reload boundaries every N seconds
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Nearby radius bands in meters, comma-separated
    #[arg(long, value_delimiter = ',')]
    bands: Option<Vec<u32>>,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(file) = self.boundaries_file {
            config.boundaries.file = Some(file);
            config.boundaries.url = None;
        }
        if let Some(url) = self.boundaries_url {
            config.boundaries.url = Some(url);
            config.boundaries.file = None;
        }
        if let Some(axis) = self.axis_order {
            config.boundaries.axis_order = axis;
        }
        if let Some(secs) = self.refresh_secs {
            config.boundaries.refresh_secs = Some(secs);
        }
        if let Some(bands) = self.bands {
            config.nearby.bands = bands;
        }
        config
    }
}

/// Application state shared across handlers
struct AppState {
    store: Arc<BoundaryStore>,
    classifier: RegionClassifier,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    let config = args.apply(config);

    info!("Barangay Query Server");

    let classifier = RegionClassifier::new(config.nearby.bands.clone())?;
    let source = config.boundaries.source()?;
    let axis = config.boundaries.axis_order;
    match &source {
        BoundarySource::File(path) => info!("Loading boundaries from {}", path.display()),
        BoundarySource::Url(url) => info!("Loading boundaries from {}", url),
    }

    let loader = BoundaryLoader::from_source(source)?;
    let snapshot = loader.load(axis).await?;
    if snapshot.polygon_count() == 0 {
        warn!("Boundary source contains no polygons; every lookup will be empty");
    }
    let store = Arc::new(BoundaryStore::new(snapshot));

    if let Some(secs) = config.boundaries.refresh_secs.filter(|s| *s > 0) {
        info!("Refreshing boundaries every {}s", secs);
        tokio::spawn(refresh_loop(
            loader,
            axis,
            Arc::clone(&store),
            Duration::from_secs(secs),
        ));
    }

    let state = Arc::new(AppState { store, classifier });
    let app = router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/places", get(places_handler))
        .route("/api/polygons", get(polygons_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error body returned for failed lookups
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<LocateError> for ApiError {
    fn from(err: LocateError) -> Self {
        let status = match &err {
            LocateError::InvalidCoordinates { .. } | LocateError::InvalidRadius(_) => {
                StatusCode::BAD_REQUEST
            }
            LocateError::UnknownContext { .. } => StatusCode::NOT_FOUND,
            LocateError::InvalidPolygon { .. } => {
                tracing::error!("Loaded boundaries failed validation: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    let polygons = snapshot.polygon_count();

    Json(HealthResponse {
        status: if polygons > 0 { "ok" } else { "empty" },
        polygons,
        contexts: snapshot.set.len(),
        source: snapshot.source.clone(),
        loaded_at: snapshot.loaded_at,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    polygons: usize,
    contexts: usize,
    source: String,
    loaded_at: DateTime<Utc>,
}

/// Places containing and near a point
async fn places_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlacesQueryParams>,
) -> Result<Json<PlaceData>, ApiError> {
    let point = Point::parse(
        params.lat.as_deref().unwrap_or_default(),
        params.long.as_deref().unwrap_or_default(),
    )?;

    let snapshot = state.store.snapshot();
    let index = snapshot.index_for(params.province.as_deref(), params.municipality.as_deref())?;
    let places = state.classifier.places(&point, index)?;

    Ok(Json(places))
}

/// Currently loaded boundary records
async fn polygons_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PolygonsQueryParams>,
) -> Json<Vec<BoundaryRecord>> {
    let snapshot = state.store.snapshot();
    Json(
        snapshot
            .records_for(params.province.as_deref())
            .into_iter()
            .cloned()
            .collect(),
    )
}

#[derive(Deserialize)]
struct PlacesQueryParams {
    /// Latitude, kept as text so malformed input gets a proper error
    lat: Option<String>,
    /// Longitude
    long: Option<String>,
    province: Option<String>,
    municipality: Option<String>,
}

#[derive(Deserialize)]
struct PolygonsQueryParams {
    province: Option<String>,
}
