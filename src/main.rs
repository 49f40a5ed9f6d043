//! steg-ws - An image store with steganographic hide and unhide over HTTP.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use steg_ws::{
    config::{Config, StoreBackend},
    server::{create_router, RouterConfig},
    steg::LsbCodec,
    store::{create_s3_client, ImageStore, MemoryImageStore, S3ImageStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("steg-ws v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Store: {}", config.store);

    match config.store {
        StoreBackend::Memory => {
            warn!("  Images are kept in memory and lost on restart");
            serve(MemoryImageStore::new(), &config).await
        }
        StoreBackend::S3 => {
            let Some(bucket) = config.bucket() else {
                error!("Configuration error: S3 bucket name is required");
                return ExitCode::FAILURE;
            };
            info!("  S3 bucket: {}", bucket);
            if let Some(ref prefix) = config.s3_prefix {
                info!("  S3 prefix: {}", prefix);
            }
            if let Some(ref endpoint) = config.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.s3_region);

            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            let store = S3ImageStore::new(client, bucket, config.s3_prefix.as_deref());
            serve(store, &config).await
        }
    }
}

/// Bind the listener and serve the API over `store` until shutdown.
async fn serve<S: ImageStore + 'static>(store: S, config: &Config) -> ExitCode {
    let router_config = build_router_config(config);
    let base = router_config.base.clone();
    let router = create_router(store, LsbCodec::new(), router_config);

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}{}", addr, base);
    info!("");
    info!("  Try these endpoints:");
    info!(
        "    curl -F img=@photo.ppm http://{}{}/images/<group>",
        addr, base
    );
    info!("    curl http://{}{}/images/<group>", addr, base);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "steg_ws=debug,tower_http=debug"
    } else {
        "steg_ws=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new(config.port)
        .with_base(&config.base_path())
        .with_max_upload_bytes(config.max_upload_bytes);

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config = router_config.with_tracing(!config.no_tracing);

    router_config
}
