#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the civic portal.
//!
//! Serves the admin console API (auth, users, articles, content) and the
//! public map portal API (markers, crime reports, shapes, overlay icons,
//! the politics feed).
//!
//! Configuration is environment-only; missing keys degrade features
//! silently instead of failing hard:
//!
//! | Variable | Effect when unset |
//! |---|---|
//! | `PORTAL_DOCS_URL` | in-memory store; persistence is session-local |
//! | `MAPS_API_KEY` | maps disabled (`mapsEnabled: false`, no drawing) |
//! | `MEDIA_*` (see storage crate) | uploads land in memory |
//! | `PORTAL_ADMIN_EMAIL` / `PORTAL_ADMIN_PASSWORD` | no seeded admin account |

mod handlers;
mod seed;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use civic_portal_auth::{AuthProvider, MemoryAuth, Session};
use civic_portal_calendar::DateRangeMode;
use civic_portal_gateway::{DocumentStore, MemoryStore, RestStore, collections, decode};
use civic_portal_map::MarkerStore;
use civic_portal_overlay::{IconCache, OverlaySet};
use civic_portal_storage::{MemoryStorage, ObjectStorage, S3Storage};
use tokio::sync::RwLock;

/// Fetch-size cap for gateway list reads. There is no pagination beyond
/// this.
pub const FETCH_CAP: u32 = 1000;

/// Category assigned to report drafts that carry none: the map page's
/// default selected type.
pub const DEFAULT_REPORT_CATEGORY: &str = "border";

/// Shared application state, constructed once in [`run_server`] and
/// passed to every handler — no ambient singletons.
pub struct AppState {
    /// Document store gateway.
    pub gateway: Arc<dyn DocumentStore>,
    /// Marker/shape state for the map page.
    pub markers: Arc<RwLock<MarkerStore>>,
    /// Image-overlay layer derived from the visible markers.
    pub overlays: Arc<RwLock<OverlaySet>>,
    /// Rendered-icon cache.
    pub icons: Arc<IconCache>,
    /// Identity provider.
    pub auth: Arc<dyn AuthProvider>,
    /// Observable admin session.
    pub session: Arc<Session>,
    /// Object storage for uploads.
    pub media: Arc<dyn ObjectStorage>,
    /// Whether the map SDK key is configured.
    pub maps_enabled: bool,
    /// Whether a remote document store is configured.
    pub persistence_enabled: bool,
}

/// Starts the portal API server.
///
/// Builds the gateway (remote or in-memory), seeds mock admin data and
/// the default marker, loads persisted markers and crime reports
/// (failures degrade to an empty map with a warning), and serves the
/// HTTP API.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send, clippy::too_many_lines)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let now = chrono::Local::now().naive_local();

    let persistence_enabled = std::env::var("PORTAL_DOCS_URL").is_ok();
    let gateway: Arc<dyn DocumentStore> = match std::env::var("PORTAL_DOCS_URL") {
        Ok(url) => {
            log::info!("Using document API at {url}");
            Arc::new(RestStore::new(url))
        }
        Err(_) => {
            log::info!("PORTAL_DOCS_URL not set; persistence is session-local");
            let memory = MemoryStore::new();
            seed::seed_admin_mock_data(&memory).await;
            Arc::new(memory)
        }
    };

    let maps_enabled = std::env::var("MAPS_API_KEY").is_ok();
    if !maps_enabled {
        log::info!("MAPS_API_KEY not set; map features disabled");
    }

    let media: Arc<dyn ObjectStorage> = match S3Storage::from_env() {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            log::info!("Media storage not configured ({e}); uploads land in memory");
            Arc::new(MemoryStorage::new())
        }
    };

    let auth = build_auth();
    let session = Arc::new(Session::new());

    // One-time load of persisted markers and crime reports. Read
    // failures leave the map empty rather than failing startup.
    let mut marker_store = MarkerStore::new(now, DateRangeMode::Week);
    seed::seed_default_marker(&mut marker_store, now);

    let markers = match gateway.list(collections::MARKERS, Some(FETCH_CAP)).await {
        Ok(docs) => docs
            .iter()
            .filter_map(|doc| match decode::decode_marker(doc) {
                Ok(marker) => Some(marker),
                Err(e) => {
                    log::warn!("skipping marker {}: {e}", doc.id);
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::warn!("failed to load markers: {e}");
            Vec::new()
        }
    };

    let reports = match gateway
        .list(collections::CRIME_REPORTS, Some(FETCH_CAP))
        .await
    {
        Ok(docs) => docs
            .iter()
            .filter_map(|doc| match decode::decode_crime_report(doc, now) {
                Ok(report) => Some(report),
                Err(e) => {
                    log::warn!("skipping crime report without valid location {}: {e}", doc.id);
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::warn!("failed to load crime reports: {e}");
            Vec::new()
        }
    };

    marker_store.load(markers, &reports);
    log::info!(
        "loaded {} markers ({} visible this week)",
        marker_store.all().len(),
        marker_store.visible().len()
    );

    let icons = Arc::new(IconCache::new());
    let mut overlay_set = OverlaySet::new();
    overlay_set.rebuild(marker_store.visible(), marker_store.generation(), &icons);

    let state = web::Data::new(AppState {
        gateway,
        markers: Arc::new(RwLock::new(marker_store)),
        overlays: Arc::new(RwLock::new(overlay_set)),
        icons,
        auth,
        session,
        media,
        maps_enabled,
        persistence_enabled,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/auth/login", web::post().to(handlers::login))
                    .route("/auth/logout", web::post().to(handlers::logout))
                    .route("/auth/admins", web::post().to(handlers::create_admin))
                    .route("/markers", web::get().to(handlers::markers))
                    .route("/markers/visible", web::get().to(handlers::visible_markers))
                    .route("/markers", web::post().to(handlers::create_marker))
                    .route("/markers/{id}", web::put().to(handlers::update_marker))
                    .route("/markers/{id}", web::delete().to(handlers::delete_marker))
                    .route("/icons/{id}.svg", web::get().to(handlers::marker_icon))
                    .route("/crime-reports", web::get().to(handlers::crime_reports))
                    .route("/crime-reports", web::post().to(handlers::create_crime_report))
                    .route("/shapes", web::get().to(handlers::shapes))
                    .route("/shapes", web::post().to(handlers::create_shape))
                    .route("/reports", web::post().to(handlers::save_report))
                    .route("/articles", web::get().to(handlers::articles))
                    .route("/articles/stats", web::get().to(handlers::article_stats))
                    .route("/articles", web::post().to(handlers::create_article))
                    .route("/articles/{id}", web::get().to(handlers::article))
                    .route("/articles/{id}", web::put().to(handlers::update_article))
                    .route("/articles/{id}", web::delete().to(handlers::delete_article))
                    .route("/articles/{id}/views", web::post().to(handlers::record_article_view))
                    .route("/politics", web::get().to(handlers::politics))
                    .route("/content", web::get().to(handlers::content))
                    .route("/content", web::post().to(handlers::save_content))
                    .route("/content/{id}/status", web::post().to(handlers::update_content_status))
                    .route("/content/{id}", web::delete().to(handlers::delete_content))
                    .route("/users", web::get().to(handlers::users))
                    .route("/users", web::post().to(handlers::save_user))
                    .route("/users/{id}/toggle-active", web::post().to(handlers::toggle_user_active))
                    .route("/users/{id}", web::delete().to(handlers::delete_user))
                    .route("/admin/stats", web::get().to(handlers::admin_stats))
                    .route("/uploads", web::post().to(handlers::upload)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Builds the identity provider: an in-memory table, optionally seeded
/// with one admin account from the environment.
fn build_auth() -> Arc<dyn AuthProvider> {
    let mut auth = MemoryAuth::new();
    if let (Ok(email), Ok(password)) = (
        std::env::var("PORTAL_ADMIN_EMAIL"),
        std::env::var("PORTAL_ADMIN_PASSWORD"),
    ) {
        auth = auth.with_account(&email, &password);
        log::info!("seeded admin account for {email}");
    } else {
        log::info!("PORTAL_ADMIN_EMAIL/PORTAL_ADMIN_PASSWORD not set; no admin accounts");
    }
    Arc::new(auth)
}
