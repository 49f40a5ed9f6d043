//! Conversion between stored image representations.
//!
//! Only `ppm` and `png` are decodable. Conversion always goes through an
//! 8-bit RGB raster, so alpha is dropped when producing a pixmap.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};

use crate::error::{DomainError, ErrorCode};

fn image_format(image_type: &str) -> Option<ImageFormat> {
    match image_type {
        "ppm" => Some(ImageFormat::Pnm),
        "png" => Some(ImageFormat::Png),
        _ => None,
    }
}

/// Read the pixel dimensions of `bytes` without decoding the raster.
///
/// Returns `None` for undecodable types or malformed data.
pub fn image_dimensions(bytes: &[u8], image_type: &str) -> Option<(u32, u32)> {
    let format = image_format(image_type)?;
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .ok()
}

/// Re-encode `bytes` from type `from` to type `to`.
///
/// Returns `Ok(None)` when either type is not convertible.
pub fn transcode(bytes: &[u8], from: &str, to: &str) -> Result<Option<Vec<u8>>, DomainError> {
    let (Some(source), Some(target)) = (image_format(from), image_format(to)) else {
        return Ok(None);
    };

    let decoded = ImageReader::with_format(Cursor::new(bytes), source)
        .decode()
        .map_err(|e| {
            DomainError::new(
                ErrorCode::BadFormat,
                format!("stored bytes are not a valid {} image: {}", from, e),
            )
        })?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut out = Vec::new();
    let result = match target {
        ImageFormat::Png => PngEncoder::new(&mut out).write_image(
            rgb.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        _ => PnmEncoder::new(&mut out)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8),
    };
    result.map_err(|e| DomainError::read(format!("cannot encode image as {}: {}", to, e)))?;

    Ok(Some(out))
}
