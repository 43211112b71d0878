//! CLI output formatting.
//!
//! Each command has a `format_*` function returning `Vec<String>` for
//! testability; `main` prints the lines. Format functions are pure: no I/O,
//! no side effects. Diagnostics go through `log` instead.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! photo.jpg → compressed/1700000000.jpg
//!     Original: 2870kb | 4000x3000
//!     size: 480kb | resolution: 1080x810 | quality: 70
//!     Passes: 4
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 dawn.jpg → out/dawn.jpg
//!     480kb | 1080x810 | quality 70
//! 002 broken.jpg
//!     Error: Source unreadable: ...
//! ```

use crate::batch::{BatchEvent, BatchSummary};
use crate::imaging::{CompressOutcome, Dimensions};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Whole kilobytes, rounded down.
fn format_kb(bytes: u64) -> String {
    format!("{}kb", bytes / 1024)
}

fn format_dims(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_quality(outcome: &CompressOutcome) -> String {
    match outcome.quality {
        Some(q) => q.value().to_string(),
        None => "lossless".to_string(),
    }
}

/// Report for a single compression.
///
/// `source_bytes` is the original file size when known; `preview` is the
/// decoded size of the written output.
pub fn format_compress_report(
    source: &Path,
    source_bytes: Option<u64>,
    outcome: &CompressOutcome,
    preview: Dimensions,
) -> Vec<String> {
    let original_size = source_bytes.map_or_else(|| "?".to_string(), format_kb);
    vec![
        format!("{} \u{2192} {}", file_name(source), outcome.path.display()),
        format!(
            "    Original: {} | {}",
            original_size,
            format_dims(outcome.source_dimensions)
        ),
        format!(
            "    size: {} | resolution: {} | quality: {}",
            format_kb(outcome.bytes),
            format_dims(preview),
            format_quality(outcome)
        ),
        format!("    Passes: {}", outcome.attempts),
    ]
}

/// Header-only probe report.
pub fn format_probe(path: &Path, dims: Dimensions, bytes: Option<u64>) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", file_name(path), format_dims(dims))];
    if let Some(bytes) = bytes {
        lines.push(format!("    Size: {}", format_kb(bytes)));
    }
    lines
}

/// Bounded preview decode report.
pub fn format_preview(path: &Path, intrinsic: Dimensions, preview: Dimensions) -> Vec<String> {
    vec![
        format!("{}: {}", file_name(path), format_dims(intrinsic)),
        format!("    Preview: {}", format_dims(preview)),
    ]
}

/// Lines for one batch progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Compressed {
            index,
            source,
            outcome,
        } => {
            vec![
                format!(
                    "{} {} \u{2192} {}",
                    format_index(*index),
                    file_name(source),
                    outcome.path.display()
                ),
                format!(
                    "    {} | {} | quality {}",
                    format_kb(outcome.bytes),
                    format_dims(outcome.dimensions),
                    format_quality(outcome)
                ),
            ]
        }
        BatchEvent::Failed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("    Error: {}", error),
        ],
    }
}

/// Closing line for a batch.
pub fn format_batch_summary(summary: &BatchSummary) -> String {
    format!(
        "Batch: {} compressed, {} failed, {} KB written",
        summary.succeeded,
        summary.failed,
        summary.bytes_written / 1024
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::path::PathBuf;

    fn outcome(quality: Option<u32>, attempts: u32) -> CompressOutcome {
        CompressOutcome {
            path: PathBuf::from("out/1700000000.jpg"),
            source_dimensions: Dimensions {
                width: 4000,
                height: 3000,
            },
            dimensions: Dimensions {
                width: 1080,
                height: 810,
            },
            quality: quality.map(Quality::new),
            bytes: 491_520,
            attempts,
        }
    }

    #[test]
    fn compress_report_lines() {
        let lines = format_compress_report(
            Path::new("/photos/photo.jpg"),
            Some(2_938_880),
            &outcome(Some(70), 4),
            Dimensions {
                width: 1080,
                height: 810,
            },
        );
        assert_eq!(
            lines,
            vec![
                "photo.jpg \u{2192} out/1700000000.jpg",
                "    Original: 2870kb | 4000x3000",
                "    size: 480kb | resolution: 1080x810 | quality: 70",
                "    Passes: 4",
            ]
        );
    }

    #[test]
    fn compress_report_lossless_and_unknown_size() {
        let lines = format_compress_report(
            Path::new("a.png"),
            None,
            &outcome(None, 1),
            Dimensions {
                width: 1080,
                height: 810,
            },
        );
        assert_eq!(lines[1], "    Original: ? | 4000x3000");
        assert_eq!(
            lines[2],
            "    size: 480kb | resolution: 1080x810 | quality: lossless"
        );
    }

    #[test]
    fn compress_report_uses_decoded_output_dimensions() {
        let lines = format_compress_report(
            Path::new("a.jpg"),
            None,
            &outcome(Some(100), 1),
            Dimensions {
                width: 810,
                height: 1080,
            },
        );
        assert_eq!(
            lines[2],
            "    size: 480kb | resolution: 810x1080 | quality: 100"
        );
        assert_eq!(lines[3], "    Passes: 1");
    }

    #[test]
    fn probe_lines() {
        let dims = Dimensions {
            width: 800,
            height: 600,
        };
        assert_eq!(
            format_probe(Path::new("/x/a.png"), dims, Some(2048)),
            vec!["a.png: 800x600", "    Size: 2kb"]
        );
        assert_eq!(format_probe(Path::new("a.png"), dims, None).len(), 1);
    }

    #[test]
    fn preview_lines() {
        let lines = format_preview(
            Path::new("a.jpg"),
            Dimensions {
                width: 4000,
                height: 3000,
            },
            Dimensions {
                width: 500,
                height: 375,
            },
        );
        assert_eq!(lines, vec!["a.jpg: 4000x3000", "    Preview: 500x375"]);
    }

    #[test]
    fn batch_compressed_event() {
        let event = BatchEvent::Compressed {
            index: 1,
            source: PathBuf::from("/in/dawn.jpg"),
            outcome: outcome(Some(70), 4),
        };
        let lines = format_batch_event(&event);
        assert_eq!(lines[0], "001 dawn.jpg \u{2192} out/1700000000.jpg");
        assert_eq!(lines[1], "    480kb | 1080x810 | quality 70");
    }

    #[test]
    fn batch_failed_event() {
        let event = BatchEvent::Failed {
            index: 12,
            source: PathBuf::from("/in/broken.jpg"),
            error: "Source unreadable: boom".to_string(),
        };
        assert_eq!(
            format_batch_event(&event),
            vec!["012 broken.jpg", "    Error: Source unreadable: boom"]
        );
    }

    #[test]
    fn batch_summary_line() {
        let summary = BatchSummary {
            succeeded: 2,
            failed: 0,
            bytes_written: 2048,
        };
        assert_eq!(
            format_batch_summary(&summary),
            "Batch: 2 compressed, 0 failed, 2 KB written"
        );
    }

    #[test]
    fn batch_summary_rounds_kb_down() {
        let summary = BatchSummary {
            succeeded: 3,
            failed: 1,
            bytes_written: 5119,
        };
        assert_eq!(
            format_batch_summary(&summary),
            "Batch: 3 compressed, 1 failed, 4 KB written"
        );
    }
}
