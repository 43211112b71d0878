//! Pure Rust image codec backend (plus libwebp for lossy WebP).
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::into_decoder` → `ImageDecoder::dimensions` (header only) |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Decode (JPEG, PNG, WebP, GIF, BMP, TIFF) | `image` crate decoders |
//! | Resize | `resize_exact` with `Lanczos3` (compression) or `Triangle` (preview) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB8, quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, quality ignored) |
//! | Encode → WebP | `webp::Encoder::encode_simple` (lossy) |

use super::backend::{CompressError, DecodeError, Dimensions, ImageBackend, ResizeFilter};
use super::params::{OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageError, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

/// Input extensions paired with the decoder that handles them.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has an extension we can decode (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Codec backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn map_image_error(path: &Path, err: ImageError) -> DecodeError {
    match err {
        ImageError::IoError(e) => DecodeError::Io(e),
        ImageError::Unsupported(e) => {
            DecodeError::Unsupported(format!("{}: {}", path.display(), e))
        }
        other => DecodeError::Malformed(format!("{}: {}", path.display(), other)),
    }
}

/// Open a decoder with the format sniffed from content (extension as hint).
fn open_decoder(path: &Path) -> Result<impl ImageDecoder, DecodeError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.into_decoder().map_err(|e| map_image_error(path, e))
}

/// Dimensions as displayed, after applying the EXIF orientation.
pub(crate) fn oriented_dimensions(stored: Dimensions, orientation: Orientation) -> Dimensions {
    match orientation {
        Orientation::Rotate90
        | Orientation::Rotate270
        | Orientation::Rotate90FlipH
        | Orientation::Rotate270FlipH => Dimensions {
            width: stored.height,
            height: stored.width,
        },
        _ => stored,
    }
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Preview => FilterType::Triangle,
        ResizeFilter::HighQuality => FilterType::Lanczos3,
    }
}

fn encode_error(format: OutputFormat, err: impl std::fmt::Display) -> CompressError {
    CompressError::EncodeFailed(format!("{format} encode failed: {err}"))
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CompressError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    // The encoder's lowest setting is 1
    let q = quality.value().clamp(1, 100) as u8;
    JpegEncoder::new_with_quality(&mut buf, q)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| encode_error(OutputFormat::Jpeg, e))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CompressError> {
    // PNG has no float sample types
    let img: Cow<'_, DynamicImage> = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16()))
        }
        other => Cow::Borrowed(other),
    };
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut buf))
        .map_err(|e| encode_error(OutputFormat::Png, e))?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CompressError> {
    let rgba = img.to_rgba8();
    let memory = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| encode_error(OutputFormat::Webp, format!("{e:?}")))?;
    Ok(memory.to_vec())
}

impl ImageBackend for RustBackend {
    type Raster = DynamicImage;

    fn identify(&self, path: &Path) -> Result<Dimensions, DecodeError> {
        let mut decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        Ok(oriented_dimensions(Dimensions { width, height }, orientation))
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let mut decoder = open_decoder(path)?;
        // A broken EXIF block should not make an otherwise valid image unreadable
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder).map_err(|e| map_image_error(path, e))?;
        img.apply_orientation(orientation);
        Ok(img)
    }

    fn dimensions(&self, raster: &DynamicImage) -> Dimensions {
        Dimensions {
            width: raster.width(),
            height: raster.height(),
        }
    }

    fn resize(&self, raster: &DynamicImage, target: Dimensions, filter: ResizeFilter) -> DynamicImage {
        raster.resize_exact(target.width, target.height, filter_type(filter))
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CompressError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(raster, quality),
            OutputFormat::Png => encode_png(raster),
            OutputFormat::Webp => encode_webp(raster, quality),
        }
    }
}
