use super::format::resolve_format;
use crate::models::ResizeJob;
use crate::{Error, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Decode raw bytes with an explicit codec.
pub fn decode_bytes(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage> {
    Ok(image::load_from_memory_with_format(bytes, format)?)
}

/// Open an image from disk, sniffing the content before trusting the extension.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image)
}

/// Encode `image` into `path` and flush before returning.
///
/// Nothing is left at `path` when encoding fails.
pub fn write_image(image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<()> {
    let written = encode_to_file(image, path, format);
    if written.is_err() {
        let _ = std::fs::remove_file(path);
    }
    written
}

fn encode_to_file(image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encodable(image, format).write_to(&mut writer, format)?;
    writer.flush()?;
    Ok(())
}

/// Convert to a colour type the encoder for `format` accepts.
fn encodable(image: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    match (format, image) {
        // JPEG has no alpha channel and only 8-bit samples
        (ImageFormat::Jpeg, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => {
            Cow::Borrowed(image)
        }
        (ImageFormat::Jpeg, _) => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        (
            ImageFormat::Bmp,
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_),
        ) => Cow::Borrowed(image),
        (ImageFormat::Bmp, _) if image.color().has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
        }
        (ImageFormat::Bmp, _) => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        (ImageFormat::Gif, _) => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Borrowed(image),
    }
}

/// Resize to exactly `width` x `height` with linear resampling.
pub fn resize_linear(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Where the derivative of `source` lands: same base name, resized directory.
pub fn resized_path(source: &Path, resized_dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::InvalidFileName(source.display().to_string()))?;
    Ok(resized_dir.join(name))
}

/// Blocking body of one worker iteration: decode, resolve, resize, write.
pub fn resize_job_sync(
    job: &ResizeJob,
    width: u32,
    height: u32,
    resized_dir: &Path,
) -> Result<PathBuf> {
    let source = open_image(&job.source_path)?;
    let format = resolve_format(&job.format_token)?;
    let output_path = resized_path(&job.source_path, resized_dir)?;

    let resized = resize_linear(&source, width, height);
    write_image(&resized, &output_path, format)?;

    Ok(output_path)
}
