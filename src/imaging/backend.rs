//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the capability seam between the portable
//! compression logic (scaling math, quality search, bounds policy) and a
//! concrete codec library. Operations in [`operations`](super::operations)
//! only ever talk to this trait.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate plus `webp` for lossy WebP. Tests use a recording mock.

use super::params::{OutputFormat, Quality};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to read or decode a source image.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {0}")]
    Unsupported(String),
    #[error("Malformed image: {0}")]
    Malformed(String),
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Failure of a compression call. Every variant is terminal for the call.
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Source unreadable: {0}")]
    SourceUnreadable(#[from] DecodeError),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Pixel dimensions of an image or raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Which resampling filter a resize should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    /// Cheap subsampling for previews.
    Preview,
    /// Quality-preserving filter for the compression path.
    HighQuality,
}

/// Trait for image codec backends.
///
/// Rasters are opaque to the callers: they are produced by [`decode`],
/// transformed by [`resize`] and consumed by [`encode`]. Every raster is
/// owned by the call that decoded it.
///
/// [`decode`]: ImageBackend::decode
/// [`resize`]: ImageBackend::resize
/// [`encode`]: ImageBackend::encode
pub trait ImageBackend: Sync {
    type Raster;

    /// Read intrinsic (display-oriented) dimensions from the header only.
    fn identify(&self, path: &Path) -> Result<Dimensions, DecodeError>;

    /// Decode at full resolution, rotated to display orientation.
    fn decode(&self, path: &Path) -> Result<Self::Raster, DecodeError>;

    /// Dimensions of a decoded raster.
    fn dimensions(&self, raster: &Self::Raster) -> Dimensions;

    /// Resample to exactly `target`.
    fn resize(&self, raster: &Self::Raster, target: Dimensions, filter: ResizeFilter)
    -> Self::Raster;

    /// Encode into an in-memory buffer. `quality` is ignored by lossless formats.
    fn encode(
        &self,
        raster: &Self::Raster,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CompressError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Raster stand-in: the mock never touches pixels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MockRaster {
        pub width: u32,
        pub height: u32,
    }

    type SizeFn = Box<dyn Fn(OutputFormat, Quality) -> usize + Send + Sync>;

    /// Mock backend that records operations and fakes encoded sizes.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    pub struct MockBackend {
        pub source: Option<Dimensions>,
        pub encode_size: SizeFn,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Decode(String),
        Resize {
            width: u32,
            height: u32,
            filter: ResizeFilter,
        },
        Encode {
            format: OutputFormat,
            quality: u32,
        },
    }

    impl MockBackend {
        /// Every source decodes to `width`x`height`; encoded size is
        /// `quality * 1000` bytes (PNG: a flat 250 000).
        pub fn with_source(width: u32, height: u32) -> Self {
            Self {
                source: Some(Dimensions { width, height }),
                encode_size: Box::new(|format, quality| match format {
                    OutputFormat::Png => 250_000,
                    _ => quality.value() as usize * 1000,
                }),
                fail_encode: false,
                operations: Mutex::new(Vec::new()),
            }
        }

        /// Every decode fails as if the file were missing.
        pub fn unreadable() -> Self {
            Self {
                source: None,
                ..Self::with_source(0, 0)
            }
        }

        pub fn with_encode_size(
            mut self,
            size: impl Fn(OutputFormat, Quality) -> usize + Send + Sync + 'static,
        ) -> Self {
            self.encode_size = Box::new(size);
            self
        }

        pub fn failing_encode(mut self) -> Self {
            self.fail_encode = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Qualities passed to `encode`, in call order.
        pub fn encoded_qualities(&self) -> Vec<u32> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality, .. } => Some(quality),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn source_or_err(&self, path: &Path) -> Result<Dimensions, DecodeError> {
            self.source.ok_or_else(|| {
                DecodeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                ))
            })
        }
    }

    impl ImageBackend for MockBackend {
        type Raster = MockRaster;

        fn identify(&self, path: &Path) -> Result<Dimensions, DecodeError> {
            self.record(RecordedOp::Identify(path.to_string_lossy().to_string()));
            self.source_or_err(path)
        }

        fn decode(&self, path: &Path) -> Result<MockRaster, DecodeError> {
            self.record(RecordedOp::Decode(path.to_string_lossy().to_string()));
            let dims = self.source_or_err(path)?;
            Ok(MockRaster {
                width: dims.width,
                height: dims.height,
            })
        }

        fn dimensions(&self, raster: &MockRaster) -> Dimensions {
            Dimensions {
                width: raster.width,
                height: raster.height,
            }
        }

        fn resize(&self, _raster: &MockRaster, target: Dimensions, filter: ResizeFilter) -> MockRaster {
            self.record(RecordedOp::Resize {
                width: target.width,
                height: target.height,
                filter,
            });
            MockRaster {
                width: target.width,
                height: target.height,
            }
        }

        fn encode(
            &self,
            _raster: &MockRaster,
            format: OutputFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, CompressError> {
            self.record(RecordedOp::Encode {
                format,
                quality: quality.value(),
            });
            if self.fail_encode {
                return Err(CompressError::EncodeFailed("mock encoder refused".into()));
            }
            Ok(vec![0u8; (self.encode_size)(format, quality)])
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_source(800, 600);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_unreadable_fails_decode() {
        let backend = MockBackend::unreadable();
        let result = backend.decode(Path::new("/missing.jpg"));
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[test]
    fn mock_encode_size_tracks_quality() {
        let backend = MockBackend::with_source(10, 10);
        let raster = backend.decode(Path::new("/a.jpg")).unwrap();
        let bytes = backend
            .encode(&raster, OutputFormat::Jpeg, Quality::new(70))
            .unwrap();
        assert_eq!(bytes.len(), 70_000);
        assert_eq!(backend.encoded_qualities(), vec![70]);
    }

    #[test]
    fn dimensions_empty_when_either_side_zero() {
        assert!(Dimensions { width: 0, height: 10 }.is_empty());
        assert!(Dimensions { width: 10, height: 0 }.is_empty());
        assert!(!Dimensions { width: 1, height: 1 }.is_empty());
    }
}
