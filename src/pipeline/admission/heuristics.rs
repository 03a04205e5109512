//! Pixel statistics that decide whether an image could be a radiograph.
//! Both heuristics are pure functions of a `PixelSample`.

use serde::Serialize;

use super::sampler::PixelSample;

/// Max per-pair channel difference for a pixel to count as gray.
/// Absorbs JPEG chroma noise.
pub const GRAY_CHANNEL_TOLERANCE: u8 = 5;

/// Fraction of gray pixels above which the image is monochrome.
pub const MIN_GRAY_RATIO: f32 = 0.9;

/// Red-channel range above which contrast is sufficient.
pub const MIN_CONTRAST_RANGE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrayscaleReport {
    pub gray_pixels: usize,
    pub total_pixels: usize,
    pub gray_ratio: f32,
    pub is_grayscale: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GrayscaleHeuristic {
    pub tolerance: u8,
    pub min_gray_ratio: f32,
}

impl Default for GrayscaleHeuristic {
    fn default() -> Self {
        Self {
            tolerance: GRAY_CHANNEL_TOLERANCE,
            min_gray_ratio: MIN_GRAY_RATIO,
        }
    }
}

impl GrayscaleHeuristic {
    pub fn is_gray_pixel(&self, [r, g, b]: [u8; 3]) -> bool {
        r.abs_diff(g) < self.tolerance
            && r.abs_diff(b) < self.tolerance
            && g.abs_diff(b) < self.tolerance
    }

    pub fn evaluate(&self, sample: &PixelSample) -> GrayscaleReport {
        let total_pixels = sample.len();
        let gray_pixels = sample
            .pixels()
            .iter()
            .filter(|p| self.is_gray_pixel(**p))
            .count();

        // An empty sample carries no evidence of being monochrome.
        let gray_ratio = if total_pixels == 0 {
            0.0
        } else {
            gray_pixels as f32 / total_pixels as f32
        };

        GrayscaleReport {
            gray_pixels,
            total_pixels,
            gray_ratio,
            is_grayscale: total_pixels > 0 && gray_ratio > self.min_gray_ratio,
        }
    }

    pub fn is_grayscale(&self, sample: &PixelSample) -> bool {
        self.evaluate(sample).is_grayscale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContrastReport {
    pub min: u8,
    pub max: u8,
    pub range: u8,
    pub sufficient: bool,
}

/// Red channel stands in for luminance: the grayscale check has already run.
#[derive(Debug, Clone, Copy)]
pub struct ContrastHeuristic {
    pub min_range: u8,
}

impl Default for ContrastHeuristic {
    fn default() -> Self {
        Self {
            min_range: MIN_CONTRAST_RANGE,
        }
    }
}

impl ContrastHeuristic {
    pub fn evaluate(&self, sample: &PixelSample) -> ContrastReport {
        let (min, max) = sample
            .pixels()
            .iter()
            .map(|[r, _, _]| *r)
            .fold((u8::MAX, u8::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let range = max.saturating_sub(min);

        ContrastReport {
            min,
            max,
            range,
            sufficient: !sample.is_empty() && range > self.min_range,
        }
    }

    pub fn has_sufficient_contrast(&self, sample: &PixelSample) -> bool {
        self.evaluate(sample).sufficient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: [u8; 3], count: usize) -> PixelSample {
        PixelSample::from_pixels(vec![value; count])
    }

    #[test]
    fn uniform_gray_is_grayscale_at_any_size() {
        let heuristic = GrayscaleHeuristic::default();
        for count in [1, 7, 100, 500] {
            for v in [0u8, 42, 128, 255] {
                assert!(heuristic.is_grayscale(&uniform([v, v, v], count)));
            }
        }
    }

    #[test]
    fn color_photo_is_not_grayscale() {
        let heuristic = GrayscaleHeuristic::default();
        let sample = PixelSample::from_pixels(vec![[200, 40, 40], [30, 180, 60], [20, 20, 220]]);
        assert!(!heuristic.is_grayscale(&sample));
    }

    #[test]
    fn tolerance_is_strict() {
        let heuristic = GrayscaleHeuristic::default();
        assert!(heuristic.is_gray_pixel([100, 104, 96]));
        assert!(!heuristic.is_gray_pixel([100, 105, 100]));
        assert!(!heuristic.is_gray_pixel([100, 100, 95]));
    }

    #[test]
    fn ratio_must_exceed_ninety_percent() {
        let heuristic = GrayscaleHeuristic::default();
        // exactly 90% gray is not enough
        let mut pixels = vec![[50, 50, 50]; 9];
        pixels.push([255, 0, 0]);
        let report = heuristic.evaluate(&PixelSample::from_pixels(pixels.clone()));
        assert!((report.gray_ratio - 0.9).abs() < 1e-6);
        assert!(!report.is_grayscale);

        pixels.extend(vec![[50, 50, 50]; 10]);
        assert!(heuristic.is_grayscale(&PixelSample::from_pixels(pixels)));
    }

    #[test]
    fn empty_sample_is_not_grayscale() {
        let report = GrayscaleHeuristic::default().evaluate(&PixelSample::default());
        assert!(!report.is_grayscale);
        assert_eq!(report.total_pixels, 0);
    }

    #[test]
    fn contrast_range_at_threshold_is_insufficient() {
        let heuristic = ContrastHeuristic::default();
        let sample = PixelSample::from_pixels(vec![[20, 20, 20], [120, 120, 120]]);
        let report = heuristic.evaluate(&sample);
        assert_eq!(report.range, 100);
        assert!(!report.sufficient);
    }

    #[test]
    fn contrast_above_threshold_is_sufficient() {
        let heuristic = ContrastHeuristic::default();
        let sample = PixelSample::from_pixels(vec![[10, 10, 10], [128, 128, 128], [240, 240, 240]]);
        let report = heuristic.evaluate(&sample);
        assert_eq!((report.min, report.max, report.range), (10, 240, 230));
        assert!(report.sufficient);
    }

    #[test]
    fn contrast_reads_red_channel_only() {
        let heuristic = ContrastHeuristic::default();
        // green and blue vary widely, red does not
        let sample = PixelSample::from_pixels(vec![[90, 0, 255], [95, 255, 0]]);
        assert!(!heuristic.has_sufficient_contrast(&sample));
    }

    #[test]
    fn low_range_always_fails_contrast() {
        let heuristic = ContrastHeuristic::default();
        for base in [0u8, 60, 155] {
            let pixels = (0..=100u8).map(|d| [base + d, 0, 0]).collect();
            assert!(!heuristic.has_sufficient_contrast(&PixelSample::from_pixels(pixels)));
        }
    }

    #[test]
    fn empty_sample_has_no_contrast() {
        assert!(!ContrastHeuristic::default().has_sufficient_contrast(&PixelSample::default()));
    }
}
