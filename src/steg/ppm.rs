//! Binary PPM (`P6`) pixmaps.
//!
//! The header is kept byte-for-byte so that an image whose pixels were
//! rewritten serializes with exactly the header it was parsed from.

use crate::error::PpmError;

/// Magic number of a binary pixmap.
const MAGIC: &[u8; 2] = b"P6";

/// Largest supported sample value (one byte per sample).
const MAX_SAMPLE_VALUE: u32 = 255;

/// Samples per pixel (R, G, B).
const CHANNELS: usize = 3;

/// A parsed binary PPM image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ppm {
    name: String,
    width: u32,
    height: u32,
    max_value: u8,
    header: Vec<u8>,
    pixels: Vec<u8>,
}

impl Ppm {
    /// Parse a `P6` image from its raw bytes.
    ///
    /// `name` is carried along for error messages only.
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self, PpmError> {
        if !bytes.starts_with(MAGIC) {
            return Err(PpmError::InvalidMagic);
        }

        let mut cursor = HeaderCursor {
            bytes,
            pos: MAGIC.len(),
        };
        let width = cursor.read_number("width")?;
        let height = cursor.read_number("height")?;
        let max_value = cursor.read_number("max value")?;
        if max_value > MAX_SAMPLE_VALUE {
            return Err(PpmError::UnsupportedMaxValue(max_value));
        }

        // Exactly one whitespace byte separates the header from the raster.
        match bytes.get(cursor.pos) {
            Some(b) if b.is_ascii_whitespace() => cursor.pos += 1,
            _ => return Err(PpmError::TruncatedHeader("raster separator")),
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(PpmError::InvalidHeaderField {
                field: "dimensions",
                value: format!("{}x{}", width, height),
            })?;

        let (header, pixels) = bytes.split_at(cursor.pos);
        if pixels.len() != expected {
            return Err(PpmError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            width,
            height,
            max_value: max_value as u8,
            header: header.to_vec(),
            pixels: pixels.to_vec(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_value(&self) -> u8 {
        self.max_value
    }

    /// Raw raster bytes, three per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// A copy of this image with a replacement raster of the same length.
    pub fn with_pixels(&self, pixels: Vec<u8>) -> Result<Self, PpmError> {
        if pixels.len() != self.pixels.len() {
            return Err(PpmError::PixelCountMismatch {
                expected: self.pixels.len(),
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            ..self.clone()
        })
    }

    /// Serialize header and raster.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.len() + self.pixels.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.pixels);
        out
    }
}

/// Tokenizer over the ASCII part of a PPM header.
struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl HeaderCursor<'_> {
    /// Skip whitespace and `#` comments (which run to end of line).
    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.bytes.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self, field: &'static str) -> Result<u32, PpmError> {
        let start = self.pos;
        self.skip_separators();
        if self.pos == start {
            // Fields must be separated from whatever precedes them.
            return Err(PpmError::TruncatedHeader(field));
        }

        let digits_start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit())
        {
            self.pos += 1;
        }

        let digits = self
            .bytes
            .get(digits_start..self.pos)
            .filter(|d| !d.is_empty())
            .ok_or(PpmError::TruncatedHeader(field))?;
        let text = std::str::from_utf8(digits).unwrap_or_default();

        match text.parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(PpmError::InvalidHeaderField {
                field,
                value: text.to_string(),
            }),
        }
    }
}
