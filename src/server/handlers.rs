//! HTTP request handlers for the image API.
//!
//! # Endpoints
//!
//! - `POST /images/{group}` - Upload an image (multipart field `img`)
//! - `GET /images/{group}` - List image names in a group
//! - `GET /images/{group}/{name}.{type}` - Fetch image bytes
//! - `GET /images/{group}/{name}/meta` - Fetch image metadata
//!
//! All paths are relative to the configured base path.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::debug;

use crate::error::{DomainError, ErrorCode, ServiceError};
use crate::steg::StegCodec;
use crate::store::ImageStore;

use super::errors::missing_fields;

/// Prefix for image services.
pub const IMAGES: &str = "images";

/// Multipart field carrying the uploaded file.
pub const IMG_FIELD: &str = "img";

/// Host used in `Location` URLs when the request carries no `Host` header.
const DEFAULT_HOST: &str = "localhost";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State
/// extractor.
///
/// Everything here is fixed at router construction; handlers only read it.
pub struct AppState<S: ImageStore, C: StegCodec> {
    /// The image store
    pub store: Arc<S>,

    /// Codec used by the steg endpoints
    pub codec: Arc<C>,

    /// Port advertised in `Location` URLs
    pub port: u16,

    /// Normalised base path (empty, or `/segment...` without trailing `/`)
    pub base: String,
}

impl<S: ImageStore, C: StegCodec> AppState<S, C> {
    pub fn new(store: S, codec: C, port: u16, base: impl Into<String>) -> Self {
        Self {
            store: Arc::new(store),
            codec: Arc::new(codec),
            port,
            base: base.into(),
        }
    }

    /// Absolute URL of `path` (relative to the base path) for this request.
    pub fn location(&self, headers: &HeaderMap, path: &str) -> String {
        location_url(headers, self.port, &self.base, path)
    }
}

impl<S: ImageStore, C: StegCodec> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: Arc::clone(&self.codec),
            port: self.port,
            base: self.base.clone(),
        }
    }
}

// =============================================================================
// Utilities
// =============================================================================

/// Build `{scheme}://{host}:{port}{base}{path}`.
///
/// The scheme comes from `X-Forwarded-Proto` (for reverse proxy support) and
/// defaults to `http`; the host comes from the `Host` header with any port
/// stripped, since the configured port is always used.
pub fn location_url(headers: &HeaderMap, port: u16, base: &str, path: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(strip_port)
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST);

    format!("{}://{}:{}{}{}", scheme, host, port, base, path)
}

/// Remove a trailing `:port` from a `Host` value, keeping IPv6 brackets.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}

/// Percent-encode one path segment for use in a URL.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Lowercased extension after the last `.` of `filename`, or empty.
pub fn image_type_from_filename(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Split `name.type` at the final `.`.
pub fn split_image_file(file: &str) -> Option<(&str, &str)> {
    file.rsplit_once('.')
        .filter(|(name, image_type)| !name.is_empty() && !image_type.is_empty())
}

/// Content type served for an image type token.
pub fn content_type_for(image_type: &str) -> &'static str {
    match image_type {
        "ppm" => "image/x-portable-pixmap",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Respond `201 Created` with a `Location` header and no body.
pub(crate) fn created(location: String) -> Result<Response, ServiceError> {
    let value = HeaderValue::from_str(&location).map_err(ServiceError::internal)?;
    Ok((StatusCode::CREATED, [(header::LOCATION, value)]).into_response())
}

struct Upload {
    filename: String,
    bytes: Bytes,
}

/// Pull the `img` file field out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, DomainError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::new(ErrorCode::BadRequest, e.body_text()))?
    {
        if field.name() != Some(IMG_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::new(ErrorCode::BadRequest, e.body_text()))?;
        return Ok(Upload { filename, bytes });
    }

    Err(missing_fields(&[IMG_FIELD]))
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image uploads.
///
/// # Endpoint
///
/// `POST /images/{group}` with a multipart form whose `img` field is the file.
///
/// The image type is the extension of the uploaded file name; the name is
/// assigned by the store.
///
/// # Response
///
/// - `201 Created` with `Location: {scheme}://{host}:{port}{base}/images/{group}/{name}.{type}`
/// - `400 Bad Request`: No `img` field, malformed form, or rejected type
/// - `409 Conflict` / `500`: Store failures
pub async fn create_image_handler<S: ImageStore, C: StegCodec>(
    State(state): State<AppState<S, C>>,
    Path(group): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServiceError> {
    let multipart =
        multipart.map_err(|e| DomainError::new(ErrorCode::BadRequest, e.body_text()))?;
    let upload = read_upload(multipart).await?;
    let image_type = image_type_from_filename(&upload.filename);

    let name = state
        .store
        .put_bytes(&group, upload.bytes, &image_type)
        .await?;
    debug!(group = %group, name = %name, image_type = %image_type, "Created image");

    created(state.location(
        &headers,
        &format!(
            "/{}/{}/{}.{}",
            IMAGES,
            segment(&group),
            name,
            segment(&image_type)
        ),
    ))
}

/// Handle image fetches.
///
/// # Endpoint
///
/// `GET /images/{group}/{name}.{type}`
///
/// # Response
///
/// - `200 OK` with the stored bytes verbatim and a content type for `type`
/// - `404 Not Found`: No such image, or no `.type` suffix
pub async fn get_image_handler<S: ImageStore, C: StegCodec>(
    State(state): State<AppState<S, C>>,
    Path((group, file)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    let (name, image_type) = split_image_file(&file).ok_or_else(|| {
        DomainError::not_found(format!("image {}/{} not found: missing type", group, file))
    })?;

    let bytes = state.store.get(&group, name, image_type).await?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for(image_type))],
        bytes,
    )
        .into_response())
}

/// Handle metadata requests.
///
/// # Endpoint
///
/// `GET /images/{group}/{name}/meta`
///
/// # Response
///
/// `200 OK` with the store's metadata object, unchanged:
/// ```json
/// {
///   "group": "g1",
///   "name": "3f2a9c01d4e5b6a7",
///   "type": "ppm",
///   "width": 640,
///   "height": 480,
///   "size": 921615,
///   "createdAt": 1700000000000
/// }
/// ```
pub async fn image_meta_handler<S: ImageStore, C: StegCodec>(
    State(state): State<AppState<S, C>>,
    Path((group, name)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let meta = state.store.meta(&group, &name).await?;
    Ok(Json(meta))
}

/// Handle group listings.
///
/// # Endpoint
///
/// `GET /images/{group}`
///
/// # Response
///
/// `200 OK` with a JSON array of names, empty for an unknown group.
pub async fn list_images_handler<S: ImageStore, C: StegCodec>(
    State(state): State<AppState<S, C>>,
    Path(group): Path<String>,
) -> Result<Json<Vec<String>>, ServiceError> {
    let names = state.store.list(&group).await?;
    Ok(Json(names))
}

/// Fallback for unmatched routes, so that every failure has a JSON body.
pub async fn not_found_handler(method: Method, uri: Uri) -> ServiceError {
    DomainError::not_found(format!("no route for {} {}", method, uri.path())).into()
}

/// Fallback for known routes called with an unsupported method.
pub async fn method_not_allowed_handler(method: Method, uri: Uri) -> (StatusCode, DomainError) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        DomainError::new(
            ErrorCode::BadRequest,
            format!("method {} not allowed for {}", method, uri.path()),
        ),
    )
}

// =============================================================================
// Tests
// =============================================================================
