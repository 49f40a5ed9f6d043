//! Steganographic codec.
//!
//! Messages are hidden only in uncompressed binary pixmaps (`ppm`). Handlers
//! parse stored bytes into a [`Ppm`] and hand it to a [`StegCodec`]:
//!
//! ```text
//! store bytes ──► Ppm::parse ──► StegCodec::hide(msg) ──► Ppm::to_bytes ──► store
//! store bytes ──► Ppm::parse ──► StegCodec::unhide()  ──► msg
//! ```

mod lsb;
mod ppm;

pub use lsb::{LsbCodec, STEG_MAGIC};
pub use ppm::Ppm;

use crate::error::DomainError;

/// Image type token of the only format the codec accepts.
pub const PIXEL_TYPE: &str = "ppm";

/// Hides and recovers text payloads in pixel images.
///
/// Implementations are pure CPU transforms and must not retain state between
/// calls; failures are reported as domain errors.
pub trait StegCodec: Send + Sync {
    /// Return a new image carrying `message`.
    fn hide(&self, image: &Ppm, message: &str) -> Result<Ppm, DomainError>;

    /// Recover the message previously hidden in `image`.
    fn unhide(&self, image: &Ppm) -> Result<String, DomainError>;
}
