//! Router configuration for the image and steg API.
//!
//! # Route Structure
//!
//! ```text
//! {base}/images/{group}                 GET list, POST upload
//! {base}/images/{group}/{name}.{type}   GET image bytes
//! {base}/images/{group}/{name}/meta     GET metadata
//! {base}/steg/{group}/{name}            POST hide, GET unhide
//! ```
//!
//! # Example
//!
//! ```ignore
//! use steg_ws::server::{create_router, RouterConfig};
//! use steg_ws::steg::LsbCodec;
//! use steg_ws::store::MemoryImageStore;
//!
//! let config = RouterConfig::new(3000).with_base("/api");
//! let router = create_router(MemoryImageStore::new(), LsbCodec::new(), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use http::header::{CONTENT_TYPE, LOCATION};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_image_handler, get_image_handler, image_meta_handler, list_images_handler,
    method_not_allowed_handler, not_found_handler, AppState,
};
use super::steg::{steg_hide_handler, steg_unhide_handler};
use crate::steg::StegCodec;
use crate::store::ImageStore;

/// Default request body limit (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Port advertised in `Location` headers
    pub port: u16,

    /// Base path prefix (normalised, see [`normalize_base`])
    pub base: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a configuration for a server listening on `port`.
    ///
    /// By default:
    /// - No base path
    /// - CORS allows any origin
    /// - Uploads up to 16 MiB
    /// - Tracing is enabled
    pub fn new(port: u16) -> Self {
        Self {
            port,
            base: String::new(),
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enable_tracing: true,
        }
    }

    /// Mount all routes under `base`.
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = normalize_base(base);
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the request body limit in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

/// Normalise a base path to either `""` or `/a/b` (leading `/`, no trailing `/`).
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `store` - Image store backing all routes
/// * `codec` - Codec for the steg routes
/// * `config` - Router configuration
pub fn create_router<S, C>(store: S, codec: C, config: RouterConfig) -> Router
where
    S: ImageStore + 'static,
    C: StegCodec + 'static,
{
    let app_state = AppState::new(store, codec, config.port, config.base.clone());

    let api = Router::new()
        .route(
            "/images/{group}",
            get(list_images_handler::<S, C>).post(create_image_handler::<S, C>),
        )
        .route("/images/{group}/{name}/meta", get(image_meta_handler::<S, C>))
        // {file} is "{name}.{type}", split at the final '.' by the handler
        .route("/images/{group}/{file}", get(get_image_handler::<S, C>))
        .route(
            "/steg/{group}/{name}",
            get(steg_unhide_handler::<S, C>).post(steg_hide_handler::<S, C>),
        )
        .method_not_allowed_fallback(method_not_allowed_handler)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    let router = if config.base.is_empty() {
        api
    } else {
        Router::new().nest(&config.base, api)
    };

    let router = router
        .fallback(not_found_handler)
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([LOCATION])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
