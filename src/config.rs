//! Configuration management for steg-ws.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `STEG_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use steg_ws::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `STEG_HOST` - Server bind address (default: 0.0.0.0)
//! - `STEG_PORT` - Server port (default: 3000)
//! - `STEG_BASE` - Base path prefix for all routes (default: none)
//! - `STEG_STORE` - Image store backend, `memory` or `s3` (default: memory)
//! - `STEG_S3_BUCKET` - S3 bucket name (required for the s3 store)
//! - `STEG_S3_PREFIX` - Key prefix inside the bucket
//! - `STEG_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `STEG_S3_REGION` - AWS region (default: us-east-1)
//! - `STEG_MAX_UPLOAD_BYTES` - Request body limit (default: 16 MiB)
//! - `STEG_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::fmt;

use clap::{Parser, ValueEnum};

use crate::server::{normalize_base, DEFAULT_MAX_UPLOAD_BYTES};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Image store backend.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local store, emptied on restart
    #[default]
    Memory,
    /// Objects in an S3 or S3-compatible bucket
    S3,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::S3 => write!(f, "s3"),
        }
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// steg-ws - An image store with steganographic hide and unhide over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "steg-ws")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "STEG_HOST")]
    pub host: String,

    /// Port to listen on. Also advertised in `Location` headers.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "STEG_PORT")]
    pub port: u16,

    /// Base path prefix for all routes (e.g. `/api`).
    #[arg(long, default_value = "", env = "STEG_BASE")]
    pub base: String,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "STEG_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    // =========================================================================
    // Store Configuration
    // =========================================================================
    /// Image store backend.
    #[arg(long, value_enum, default_value_t = StoreBackend::Memory, env = "STEG_STORE")]
    pub store: StoreBackend,

    /// S3 bucket holding the images (required with `--store s3`).
    #[arg(long, env = "STEG_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Key prefix for every object written to the bucket.
    #[arg(long, env = "STEG_S3_PREFIX")]
    pub s3_prefix: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "STEG_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "STEG_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "STEG_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if self.base.chars().any(char::is_whitespace) {
            return Err(format!("base path '{}' must not contain whitespace", self.base));
        }
        if self.base.split('/').any(|s| s == "." || s == "..") {
            return Err(format!(
                "base path '{}' must not contain '.' or '..' segments",
                self.base
            ));
        }

        if self.store == StoreBackend::S3 && self.bucket().is_none() {
            return Err(
                "S3 bucket name is required with --store s3. Set --s3-bucket or STEG_S3_BUCKET"
                    .to_string(),
            );
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the normalised base path (`""` or `/a/b`).
    pub fn base_path(&self) -> String {
        normalize_base(&self.base)
    }

    /// Get the S3 bucket, treating an empty value as unset.
    pub fn bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref().filter(|b| !b.is_empty())
    }
}

// =============================================================================
// Tests
// =============================================================================
