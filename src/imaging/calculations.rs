//! Pure calculation functions for image dimensions and quality stepping.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::{Bounds, Quality};

/// Uniform downscale factor that fits `source` inside the width/height ceilings.
///
/// Unconstrained axes (`None`) do not participate. The result is clamped to
/// 1.0, so images are never upscaled.
///
/// # Examples
/// ```
/// # use imgbound::imaging::{Dimensions, calculate_scale_factor};
/// let src = Dimensions { width: 4000, height: 3000 };
/// assert_eq!(calculate_scale_factor(src, Some(1080), Some(1960)), 0.27);
/// assert_eq!(calculate_scale_factor(src, None, None), 1.0);
/// ```
pub fn calculate_scale_factor(
    source: Dimensions,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> f64 {
    let width_scale = max_width
        .filter(|_| source.width > 0)
        .map(|max| max as f64 / source.width as f64)
        .unwrap_or(1.0);
    let height_scale = max_height
        .filter(|_| source.height > 0)
        .map(|max| max as f64 / source.height as f64)
        .unwrap_or(1.0);

    width_scale.min(height_scale).min(1.0)
}

/// Output dimensions after applying the width/height ceilings.
///
/// Returns `source` unchanged when no downscale is needed. Otherwise each
/// side is `round(side * scale)`, at least 1 pixel and never above its ceiling.
pub fn calculate_scaled_dimensions(
    source: Dimensions,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Dimensions {
    let scale = calculate_scale_factor(source, max_width, max_height);
    if scale >= 1.0 {
        return source;
    }

    let scale_side = |side: u32, ceiling: Option<u32>| {
        let scaled = ((side as f64 * scale).round() as u32).max(1);
        ceiling.map_or(scaled, |c| scaled.min(c.max(1)))
    };

    Dimensions {
        width: scale_side(source.width, max_width),
        height: scale_side(source.height, max_height),
    }
}

/// Power-of-two subsample factor for a bounded preview decode.
///
/// The factor is the largest power of two not exceeding `1 / scale`, where
/// `scale` fits `intrinsic` inside `bounds`. The subsampled raster therefore
/// stays at or above the requested bound. Returns 1 when no subsampling is
/// needed.
pub fn calculate_subsample_factor(intrinsic: Dimensions, bounds: Bounds) -> u32 {
    let max_width = (bounds.width > 0).then_some(bounds.width);
    let max_height = (bounds.height > 0).then_some(bounds.height);
    let scale = calculate_scale_factor(intrinsic, max_width, max_height);
    if scale >= 1.0 || scale <= 0.0 {
        return 1;
    }

    let ratio = (1.0 / scale).floor().min(u32::MAX as f64) as u32;
    if ratio <= 1 {
        1
    } else {
        1 << (u32::BITS - 1 - ratio.leading_zeros())
    }
}

/// Dimensions of a raster subsampled by `factor` (rounded up, at least 1).
pub fn subsampled_dimensions(intrinsic: Dimensions, factor: u32) -> Dimensions {
    let factor = factor.max(1);
    Dimensions {
        width: intrinsic.width.div_ceil(factor).max(1),
        height: intrinsic.height.div_ceil(factor).max(1),
    }
}

/// Next quality in the linear step-down search.
///
/// Steps down by `step`, clamped so it never goes below `floor`.
pub fn next_linear_quality(current: Quality, step: u32, floor: Quality) -> Quality {
    Quality::new(current.value().saturating_sub(step.max(1)).max(floor.value()))
}

/// Every quality the linear search can visit from 100 down to `floor`.
///
/// Useful for reasoning about worst-case encode counts.
pub fn linear_quality_schedule(step: u32, floor: Quality) -> Vec<Quality> {
    let mut schedule = vec![Quality::MAX];
    let mut quality = Quality::MAX;
    while quality > floor {
        quality = next_linear_quality(quality, step, floor);
        schedule.push(quality);
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // calculate_scale_factor / calculate_scaled_dimensions tests
    // =========================================================================

    #[test]
    fn scale_landscape_limited_by_width() {
        // 4000x3000 into 1080x1960 → width-limited, scale 0.27
        let scaled = calculate_scaled_dimensions(dims(4000, 3000), Some(1080), Some(1960));
        assert_eq!(scaled, dims(1080, 810));
    }

    #[test]
    fn scale_portrait_limited_by_height() {
        // 2000x5000 into 1080x1960 → height-limited, scale 0.392
        let scaled = calculate_scaled_dimensions(dims(2000, 5000), Some(1080), Some(1960));
        assert_eq!(scaled, dims(784, 1960));
    }

    #[test]
    fn scale_never_upscales() {
        let src = dims(800, 600);
        assert_eq!(calculate_scale_factor(src, Some(1080), Some(1960)), 1.0);
        assert_eq!(calculate_scaled_dimensions(src, Some(1080), Some(1960)), src);
    }

    #[test]
    fn scale_ignores_unconstrained_axis() {
        // Only height constrained
        let scaled = calculate_scaled_dimensions(dims(4000, 3000), None, Some(300));
        assert_eq!(scaled, dims(400, 300));
    }

    #[test]
    fn scale_without_limits_is_identity() {
        let src = dims(12000, 9000);
        assert_eq!(calculate_scaled_dimensions(src, None, None), src);
    }

    #[test]
    fn scale_extreme_aspect_keeps_one_pixel() {
        // 10000x1 squeezed to 100 wide → height would round to 0
        let scaled = calculate_scaled_dimensions(dims(10000, 1), Some(100), Some(100));
        assert_eq!(scaled, dims(100, 1));
    }

    #[test]
    fn scale_preserves_aspect_within_one_pixel() {
        for &(w, h) in &[(4000, 3000), (3001, 1999), (1234, 5678), (999, 997)] {
            let out = calculate_scaled_dimensions(dims(w, h), Some(640), Some(480));
            assert!(out.width <= 640 && out.height <= 480);
            // The limiting side is exact; the other is rounded from it.
            let expected_h = out.width as f64 * h as f64 / w as f64;
            let expected_w = out.height as f64 * w as f64 / h as f64;
            assert!(
                (out.height as f64 - expected_h).abs() <= 1.0
                    || (out.width as f64 - expected_w).abs() <= 1.0,
                "{w}x{h} → {out:?}"
            );
        }
    }

    // =========================================================================
    // subsample tests
    // =========================================================================

    #[test]
    fn subsample_not_needed_within_bounds() {
        assert_eq!(calculate_subsample_factor(dims(800, 600), Bounds::new(1080, 1920)), 1);
    }

    #[test]
    fn subsample_rounds_down_to_power_of_two() {
        // 4000 → 500 is exactly 8
        assert_eq!(calculate_subsample_factor(dims(4000, 3000), Bounds::new(500, 0)), 8);
        // 4000 → 700: 1/scale = 5.7 → 5 → 4
        assert_eq!(calculate_subsample_factor(dims(4000, 3000), Bounds::new(700, 0)), 4);
        // 4000 → 2100: 1/scale = 1.9 → 1
        assert_eq!(calculate_subsample_factor(dims(4000, 3000), Bounds::new(2100, 0)), 1);
    }

    #[test]
    fn subsample_uses_tighter_axis() {
        // width allows 4, height allows 2 → min scale wins (larger factor)
        assert_eq!(calculate_subsample_factor(dims(4000, 3000), Bounds::new(1000, 1500)), 4);
    }

    #[test]
    fn subsample_keeps_raster_at_or_above_bound() {
        let intrinsic = dims(4000, 3000);
        let bounds = Bounds::new(700, 700);
        let factor = calculate_subsample_factor(intrinsic, bounds);
        let out = subsampled_dimensions(intrinsic, factor);
        assert!(out.width >= 700 || out.height >= 700);
    }

    #[test]
    fn subsampled_dimensions_round_up() {
        assert_eq!(subsampled_dimensions(dims(1001, 3), 2), dims(501, 2));
        assert_eq!(subsampled_dimensions(dims(5, 5), 1), dims(5, 5));
    }

    // =========================================================================
    // quality stepping tests
    // =========================================================================

    #[test]
    fn linear_step_clamps_to_floor() {
        let next = next_linear_quality(Quality::new(50), 10, Quality::new(45));
        assert_eq!(next, Quality::new(45));
    }

    #[test]
    fn linear_step_never_underflows() {
        let next = next_linear_quality(Quality::new(5), 10, Quality::new(0));
        assert_eq!(next, Quality::new(0));
    }

    #[test]
    fn linear_schedule_reference_step() {
        let schedule: Vec<u32> = linear_quality_schedule(10, Quality::new(40))
            .into_iter()
            .map(Quality::value)
            .collect();
        assert_eq!(schedule, vec![100, 90, 80, 70, 60, 50, 40]);
    }

    #[test]
    fn linear_schedule_ends_exactly_on_odd_floor() {
        let schedule = linear_quality_schedule(10, Quality::new(35));
        assert_eq!(schedule.last(), Some(&Quality::new(35)));
        assert_eq!(schedule.len(), 8);
    }

    #[test]
    fn linear_schedule_floor_at_max_is_single_pass() {
        assert_eq!(linear_quality_schedule(10, Quality::MAX), vec![Quality::MAX]);
    }

    #[test]
    fn linear_schedule_is_bounded() {
        // Worst case: floor 0 → 100, 90, …, 0
        assert_eq!(linear_quality_schedule(10, Quality::new(0)).len(), 11);
    }
}
