//! HTTP request handlers for the steganography API.
//!
//! # Endpoints
//!
//! - `POST /steg/{group}/{name}` - Hide a message in a stored `ppm` image
//! - `GET /steg/{group}/{name}` - Recover the message hidden in a `ppm` image

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DomainError, ErrorCode, ServiceError};
use crate::steg::{Ppm, StegCodec, PIXEL_TYPE};
use crate::store::ImageStore;

use super::errors::check_missing;
use super::handlers::{created, segment, AppState};

/// Prefix for steganography services.
pub const STEG: &str = "steg";

/// Body of a hide request.
///
/// Both fields are required; they are optional here so that absence can be
/// reported as `MISSING` rather than as a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideRequest {
    /// Message to hide
    #[serde(default)]
    pub msg: Option<String>,

    /// Group receiving the new image
    #[serde(default)]
    pub out_group: Option<String>,
}

impl HideRequest {
    /// Return `(msg, out_group)`, or a `MISSING` error naming the absent
    /// fields. An empty `outGroup` counts as absent since it cannot address
    /// a group.
    pub fn into_parts(self) -> Result<(String, String), DomainError> {
        let out_group = self.out_group.filter(|g| !g.is_empty());
        if let Some(err) = check_missing(&[
            ("msg", self.msg.is_some()),
            ("outGroup", out_group.is_some()),
        ]) {
            return Err(err);
        }
        Ok((self.msg.unwrap_or_default(), out_group.unwrap_or_default()))
    }
}

/// Body of an unhide response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnhideResponse {
    pub msg: String,
}

/// Fetch `group/name` as a pixmap and parse it.
async fn load_pixmap<S: ImageStore>(
    store: &S,
    group: &str,
    name: &str,
) -> Result<Ppm, ServiceError> {
    let bytes = store.get(group, name, PIXEL_TYPE).await?;
    Ok(Ppm::parse(name, &bytes)?)
}

/// Handle hide requests.
///
/// # Endpoint
///
/// `POST /steg/{group}/{name}` with body:
/// ```json
/// { "msg": "hello", "outGroup": "g2" }
/// ```
///
/// The source image is read as `ppm`, the message is hidden in a copy, and
/// the copy is stored as a new `ppm` image in `outGroup`.
///
/// # Response
///
/// - `201 Created` with `Location: {scheme}://{host}:{port}{base}/steg/{outGroup}/{name}`
/// - `400 Bad Request`: Missing fields, invalid JSON, not a PPM, or the
///   message does not fit
/// - `404 Not Found`: Source image not found
pub async fn steg_hide_handler<S: ImageStore, C: StegCodec>(
    State(state): State<AppState<S, C>>,
    Path((group, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Json<HideRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) =
        body.map_err(|e| DomainError::new(ErrorCode::BadRequest, e.body_text()))?;
    let (msg, out_group) = request.into_parts()?;

    let image = load_pixmap(state.store.as_ref(), &group, &name).await?;
    let hidden = state.codec.hide(&image, &msg)?;

    let out_name = state
        .store
        .put_bytes(&out_group, Bytes::from(hidden.to_bytes()), PIXEL_TYPE)
        .await?;
    debug!(
        group = %group,
        name = %name,
        out_group = %out_group,
        out_name = %out_name,
        "Hid message"
    );

    created(state.location(
        &headers,
        &format!("/{}/{}/{}", STEG, segment(&out_group), out_name),
    ))
}

/// Handle unhide requests.
///
/// # Endpoint
///
/// `GET /steg/{group}/{name}`
///
/// # Response
///
/// `200 OK` with body:
/// ```json
/// { "msg": "hello" }
/// ```
///
/// - `400 Bad Request`: Not a PPM, or no hidden message
/// - `404 Not Found`: Image not found
pub async fn steg_unhide_handler<S: ImageStore, C: StegCodec>(
    State(state): State<AppState<S, C>>,
    Path((group, name)): Path<(String, String)>,
) -> Result<Json<UnhideResponse>, ServiceError> {
    let image = load_pixmap(state.store.as_ref(), &group, &name).await?;
    let msg = state.codec.unhide(&image)?;
    Ok(Json(UnhideResponse { msg }))
}
