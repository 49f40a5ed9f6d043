//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     /images/{group}[/{name}.{type} | /{name}/meta]              │
//! │     /steg/{group}/{name}                                        │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────┐  ┌───────────┐  │
//! │  │  handlers   │  │    steg     │  │  errors  │  │  routes   │  │
//! │  │  (images)   │  │ (hide/seek) │  │ (mapper) │  │ (router)  │  │
//! │  └─────────────┘  └─────────────┘  └──────────┘  └───────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod steg;

pub use errors::{
    check_missing, map_error, missing_fields, status_for, ErrorResponse, MappedError, INTERNAL_CODE,
};
pub use handlers::{
    content_type_for, create_image_handler, get_image_handler, image_meta_handler,
    image_type_from_filename, list_images_handler, location_url, method_not_allowed_handler,
    not_found_handler, split_image_file, AppState, IMAGES, IMG_FIELD,
};
pub use routes::{create_router, normalize_base, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use steg::{steg_hide_handler, steg_unhide_handler, HideRequest, UnhideResponse, STEG};
