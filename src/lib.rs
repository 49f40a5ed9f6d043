//! # steg-ws
//!
//! An HTTP mediation layer over an image store, with steganographic hide and
//! unhide of text messages in stored pixmaps.
//!
//! ## Features
//!
//! - **Image storage**: upload by multipart form, fetch by `name.type`,
//!   metadata and per-group listing; names are always assigned by the store
//! - **Steganography**: least-significant-bit hiding of UTF-8 messages in
//!   binary `ppm` images
//! - **Pluggable backends**: in-memory store for development, S3 or
//!   S3-compatible object storage for deployment
//! - **Uniform errors**: every failure is a `{"code", "message"}` JSON body
//!
//! ## Architecture
//!
//! - [`store`] - `ImageStore` trait and its memory and S3 backends
//! - [`steg`] - PPM parsing and the `StegCodec` trait with its LSB codec
//! - [`server`] - Axum handlers, error mapping and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Domain error codes and service errors
//!
//! ## Example
//!
//! ```rust,no_run
//! use steg_ws::{create_router, LsbCodec, MemoryImageStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RouterConfig::new(3000).with_base("/api");
//!     let router = create_router(MemoryImageStore::new(), LsbCodec::new(), config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod steg;
pub mod store;

// Re-export commonly used types
pub use config::{Config, StoreBackend};
pub use error::{DomainError, ErrorCode, PpmError, ServiceError};
pub use server::{
    create_router, map_error, AppState, ErrorResponse, HideRequest, MappedError, RouterConfig,
    UnhideResponse,
};
pub use steg::{LsbCodec, Ppm, StegCodec};
pub use store::{create_s3_client, ImageMeta, ImageStore, MemoryImageStore, S3ImageStore};
