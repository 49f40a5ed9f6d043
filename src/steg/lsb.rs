//! Least-significant-bit message embedding.
//!
//! Payload layout, one bit per raster byte, most significant bit first:
//!
//! ```text
//! "STG" | message bytes | 0x00
//! ```

use crate::error::{DomainError, ErrorCode};

use super::ppm::Ppm;
use super::StegCodec;

/// Marker written ahead of every hidden message.
pub const STEG_MAGIC: &[u8; 3] = b"STG";

const TERMINATOR: u8 = 0;

const BITS_PER_BYTE: usize = 8;

/// Payload bytes added around the message (magic and terminator).
const OVERHEAD: usize = STEG_MAGIC.len() + 1;

/// Hides text in the low bit of each raster byte of a PPM image.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsbCodec;

impl LsbCodec {
    pub fn new() -> Self {
        Self
    }

    /// Maximum message length in bytes that fits in `image`.
    pub fn capacity(image: &Ppm) -> usize {
        (image.pixels().len() / BITS_PER_BYTE).saturating_sub(OVERHEAD)
    }
}

/// Set the low bit of `sample` to `bit` without exceeding `max_value`.
///
/// With an even max value, a sample at the max cannot carry a 1 in its low
/// bit; it steps down to `max_value - 1` instead.
fn embed_bit(sample: u8, bit: u8, max_value: u8) -> u8 {
    let embedded = (sample & !1) | bit;
    if embedded > max_value && embedded >= 2 {
        embedded - 2
    } else {
        embedded
    }
}

impl StegCodec for LsbCodec {
    fn hide(&self, image: &Ppm, message: &str) -> Result<Ppm, DomainError> {
        let message = message.as_bytes();
        if message.contains(&TERMINATOR) {
            return Err(DomainError::new(
                ErrorCode::BadMsg,
                "message contains a NUL character",
            ));
        }

        let capacity = Self::capacity(image);
        if message.len() + OVERHEAD > image.pixels().len() / BITS_PER_BYTE {
            return Err(DomainError::new(
                ErrorCode::BadMsg,
                format!(
                    "message of {} bytes exceeds capacity of {} bytes for image {}",
                    message.len(),
                    capacity,
                    image.name()
                ),
            ));
        }

        let payload = STEG_MAGIC
            .iter()
            .chain(message)
            .chain(std::iter::once(&TERMINATOR));
        let bits = payload
            .flat_map(|byte| (0..BITS_PER_BYTE).rev().map(move |i| (byte >> i) & 1));

        let max_value = image.max_value();
        let mut pixels = image.pixels().to_vec();
        for (sample, bit) in pixels.iter_mut().zip(bits) {
            *sample = embed_bit(*sample, bit, max_value);
        }

        Ok(image.with_pixels(pixels)?)
    }

    fn unhide(&self, image: &Ppm) -> Result<String, DomainError> {
        let mut bytes = image
            .pixels()
            .chunks_exact(BITS_PER_BYTE)
            .map(|chunk| chunk.iter().fold(0u8, |acc, sample| (acc << 1) | (sample & 1)));

        let magic: Vec<u8> = bytes.by_ref().take(STEG_MAGIC.len()).collect();
        if magic != STEG_MAGIC {
            return Err(DomainError::new(
                ErrorCode::BadMsg,
                format!("image {} does not contain a hidden message", image.name()),
            ));
        }

        let mut message = Vec::new();
        let mut terminated = false;
        for byte in bytes {
            if byte == TERMINATOR {
                terminated = true;
                break;
            }
            message.push(byte);
        }
        if !terminated {
            return Err(DomainError::new(
                ErrorCode::BadMsg,
                format!("hidden message in image {} is not terminated", image.name()),
            ));
        }

        String::from_utf8(message).map_err(|_| {
            DomainError::new(
                ErrorCode::BadMsg,
                format!("hidden message in image {} is not valid UTF-8", image.name()),
            )
        })
    }
}
