//! Thumbnail request parameters
//!
//! [`ThumbnailParams`] is the normalized form of a resize request. Its
//! [`encode`](ThumbnailParams::encode) output is part of the cache key, so two
//! requests that normalize to the same value always share a cached file.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Rendered in place of an absent quality in encoded parameters
pub const QUALITY_SENTINEL: &str = "n";

/// Default upper bound for a requested width or height
pub const MAX_DIMENSION: u32 = 8192;

/// Upper bound for a requested quality
pub const MAX_QUALITY: u32 = 100;

/// Resize strategy. Exactly one is active per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMode {
    /// Bound both dimensions, preserve aspect ratio, may shrink or grow
    #[default]
    Fit,
    /// Like `Fit` but never upscale
    ShrinkOnly,
    /// Ignore aspect ratio
    Stretch,
    /// Requested dimensions are a lower bound, preserve aspect ratio
    Fill,
    /// Force the exact output box, cropping as needed
    Exact,
}

/// How numeric resize flags coming from callers are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagPolicy {
    /// Clamp out-of-range values (`<= 0` is `Fit`, `>= 8` is `Exact`) and map
    /// combined bits to their most significant strategy.
    #[default]
    Lenient,
    /// Accept only the canonical values 0, 1, 2, 4 and 8.
    Strict,
}

impl ResizeMode {
    pub const ALL: [ResizeMode; 5] = [
        ResizeMode::Fit,
        ResizeMode::ShrinkOnly,
        ResizeMode::Stretch,
        ResizeMode::Fill,
        ResizeMode::Exact,
    ];

    /// Numeric flag value, as written into thumbnail file names.
    pub fn flags(self) -> u8 {
        match self {
            ResizeMode::Fit => 0,
            ResizeMode::ShrinkOnly => 1,
            ResizeMode::Stretch => 2,
            ResizeMode::Fill => 4,
            ResizeMode::Exact => 8,
        }
    }

    /// Interpret a numeric flag value under the given policy.
    pub fn from_flags(flags: i64, policy: FlagPolicy) -> StoreResult<Self> {
        let canonical = match flags {
            0 => Some(ResizeMode::Fit),
            1 => Some(ResizeMode::ShrinkOnly),
            2 => Some(ResizeMode::Stretch),
            4 => Some(ResizeMode::Fill),
            8 => Some(ResizeMode::Exact),
            _ => None,
        };

        match (canonical, policy) {
            (Some(mode), _) => Ok(mode),
            (None, FlagPolicy::Strict) => Err(StoreError::InvalidResizeMode(flags.to_string())),
            (None, FlagPolicy::Lenient) => Ok(match flags {
                i64::MIN..=0 => ResizeMode::Fit,
                8.. => ResizeMode::Exact,
                4..=7 => ResizeMode::Fill,
                _ => ResizeMode::Stretch,
            }),
        }
    }
}

impl FromStr for ResizeMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fit" => Ok(ResizeMode::Fit),
            "shrink_only" | "shrink" => Ok(ResizeMode::ShrinkOnly),
            "stretch" => Ok(ResizeMode::Stretch),
            "fill" => Ok(ResizeMode::Fill),
            "exact" => Ok(ResizeMode::Exact),
            other => match other.parse::<i64>() {
                Ok(flags) => ResizeMode::from_flags(flags, FlagPolicy::Strict),
                Err(_) => Err(StoreError::InvalidResizeMode(s.to_string())),
            },
        }
    }
}

impl Display for ResizeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResizeMode::Fit => write!(f, "fit"),
            ResizeMode::ShrinkOnly => write!(f, "shrink_only"),
            ResizeMode::Stretch => write!(f, "stretch"),
            ResizeMode::Fill => write!(f, "fill"),
            ResizeMode::Exact => write!(f, "exact"),
        }
    }
}

/// Normalized thumbnail parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThumbnailParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub mode: ResizeMode,
}

/// Non-positive values are absent; values above `max` are rejected.
fn bounded(name: &str, value: Option<i64>, max: u32) -> StoreResult<Option<u32>> {
    match value {
        Some(v) if v > 0 => match u32::try_from(v) {
            Ok(v) if v <= max => Ok(Some(v)),
            _ => Err(StoreError::InvalidParameter(format!(
                "{} {} exceeds the maximum of {}",
                name, v, max
            ))),
        },
        _ => Ok(None),
    }
}

impl ThumbnailParams {
    /// Normalize raw request values under the default [`MAX_DIMENSION`].
    pub fn new(
        width: Option<i64>,
        height: Option<i64>,
        quality: Option<i64>,
        mode: ResizeMode,
    ) -> StoreResult<Self> {
        Self::with_max_dimension(width, height, quality, mode, MAX_DIMENSION)
    }

    /// Normalize raw request values.
    ///
    /// Non-positive width, height and quality become absent. Fails with
    /// [`StoreError::MissingDimensions`] when neither dimension survives, and
    /// with [`StoreError::InvalidParameter`] when a dimension exceeds
    /// `max_dimension` or the quality exceeds [`MAX_QUALITY`].
    pub fn with_max_dimension(
        width: Option<i64>,
        height: Option<i64>,
        quality: Option<i64>,
        mode: ResizeMode,
        max_dimension: u32,
    ) -> StoreResult<Self> {
        let width = bounded("width", width, max_dimension)?;
        let height = bounded("height", height, max_dimension)?;

        if width.is_none() && height.is_none() {
            return Err(StoreError::MissingDimensions);
        }

        Ok(ThumbnailParams {
            width,
            height,
            quality: bounded("quality", quality, MAX_QUALITY)?,
            mode,
        })
    }

    /// `width_height_quality_flags`, with `0` for an absent dimension and
    /// [`QUALITY_SENTINEL`] for an absent quality.
    pub fn encode(&self) -> String {
        let quality = self
            .quality
            .map(|q| q.to_string())
            .unwrap_or_else(|| QUALITY_SENTINEL.to_string());

        format!(
            "{}_{}_{}_{}",
            self.width.unwrap_or(0),
            self.height.unwrap_or(0),
            quality,
            self.mode.flags()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_flags() {
        for mode in ResizeMode::ALL {
            let parsed = ResizeMode::from_flags(mode.flags() as i64, FlagPolicy::Strict).unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn test_lenient_clamping() {
        assert_eq!(
            ResizeMode::from_flags(-5, FlagPolicy::Lenient).unwrap(),
            ResizeMode::Fit
        );
        assert_eq!(
            ResizeMode::from_flags(99, FlagPolicy::Lenient).unwrap(),
            ResizeMode::Exact
        );
        assert_eq!(
            ResizeMode::from_flags(3, FlagPolicy::Lenient).unwrap(),
            ResizeMode::Stretch
        );
        assert_eq!(
            ResizeMode::from_flags(5, FlagPolicy::Lenient).unwrap(),
            ResizeMode::Fill
        );
    }

    #[test]
    fn test_strict_rejects_non_canonical() {
        for flags in [-1, 3, 5, 6, 7, 9, 16] {
            let result = ResizeMode::from_flags(flags, FlagPolicy::Strict);
            assert!(
                matches!(result, Err(StoreError::InvalidResizeMode(ref f)) if *f == flags.to_string()),
                "flags {} should be rejected",
                flags
            );
        }
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("FIT".parse::<ResizeMode>().unwrap(), ResizeMode::Fit);
        assert_eq!(
            "shrink-only".parse::<ResizeMode>().unwrap(),
            ResizeMode::ShrinkOnly
        );
        assert_eq!("8".parse::<ResizeMode>().unwrap(), ResizeMode::Exact);
        assert!("crop".parse::<ResizeMode>().is_err());
    }

    #[test]
    fn test_missing_dimensions() {
        let result = ThumbnailParams::new(None, None, Some(80), ResizeMode::Fit);
        assert!(matches!(result, Err(StoreError::MissingDimensions)));

        let result = ThumbnailParams::new(Some(0), Some(-10), None, ResizeMode::Fit);
        assert!(matches!(result, Err(StoreError::MissingDimensions)));
    }

    #[test]
    fn test_normalization() {
        let params = ThumbnailParams::new(Some(100), Some(-1), Some(0), ResizeMode::Fill).unwrap();
        assert_eq!(params.width, Some(100));
        assert_eq!(params.height, None);
        assert_eq!(params.quality, None);
        assert_eq!(params.encode(), "100_0_n_4");
    }

    #[test]
    fn test_absent_and_zero_quality_encode_identically() {
        let absent = ThumbnailParams::new(Some(10), Some(20), None, ResizeMode::Fit).unwrap();
        let zero = ThumbnailParams::new(Some(10), Some(20), Some(0), ResizeMode::Fit).unwrap();
        assert_eq!(absent, zero);
        assert_eq!(absent.encode(), zero.encode());
    }

    #[test]
    fn test_oversized_values_rejected() {
        let result = ThumbnailParams::new(Some(1_000_000), Some(1_000_000), None, ResizeMode::Fit);
        assert!(matches!(result, Err(StoreError::InvalidParameter(_))));

        let result = ThumbnailParams::new(Some(10), Some(i64::MAX), None, ResizeMode::Fit);
        assert!(matches!(result, Err(StoreError::InvalidParameter(_))));

        let result = ThumbnailParams::new(Some(10), None, Some(101), ResizeMode::Fit);
        assert!(matches!(result, Err(StoreError::InvalidParameter(_))));

        let result = ThumbnailParams::new(Some(10), None, Some(1 << 40), ResizeMode::Fit);
        assert!(matches!(result, Err(StoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_custom_dimension_limit() {
        let params =
            ThumbnailParams::with_max_dimension(Some(64), None, Some(100), ResizeMode::Fit, 64)
                .unwrap();
        assert_eq!(params.encode(), "64_0_100_0");

        let result =
            ThumbnailParams::with_max_dimension(None, Some(65), None, ResizeMode::Fit, 64);
        assert!(matches!(result, Err(StoreError::InvalidParameter(_))));
    }
}
