use crate::{Error, Result};
use image::ImageFormat;

/// Format tokens accepted from clients and file extensions.
pub const FORMATS: &[(&str, ImageFormat)] = &[
    ("jpeg", ImageFormat::Jpeg),
    ("jpg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tiff", ImageFormat::Tiff),
    ("png", ImageFormat::Png),
];

/// Resolve a case-insensitive format token to its codec.
pub fn resolve_format(token: &str) -> Result<ImageFormat> {
    FORMATS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, format)| *format)
        .ok_or_else(|| Error::UnknownFormat(token.to_string()))
}
