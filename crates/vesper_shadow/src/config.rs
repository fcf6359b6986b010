//! Configuration options for shadow mapping.

use crate::MAX_CASCADES;
use anyhow::{Result, bail};

/// Configuration options for the shadow subsystem. Read-only for the
/// duration of a frame.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ShadowConfig {
    /// The view distance beyond which no real-time shadows are rendered.
    pub max_distance: f32,
    /// Fraction of `max_distance` over which shadows fade out towards the
    /// distance limit.
    pub distance_fade: f32,
    /// Options for directional light shadows.
    pub directional: DirectionalShadowConfig,
    /// Options for point and spot light shadows.
    pub other: OtherShadowConfig,
    /// How baked occlusion masks are combined with real-time shadows.
    pub mask_mode: ShadowMaskMode,
}

/// Configuration options for the directional shadow atlas.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct DirectionalShadowConfig {
    /// The width and height of the directional shadow atlas in texels.
    pub atlas_size: u32,
    /// The PCF kernel used when sampling the directional atlas.
    pub filter: ShadowFilter,
    /// Number of view frustum partitions rendered per directional light.
    pub cascade_count: u32,
    /// Relative view distances at which the first three cascades end.
    pub cascade_ratios: [f32; 3],
    /// Fraction of a cascade's extent over which it blends into the next.
    pub cascade_fade: f32,
    /// How fragments near a cascade boundary combine the two cascades.
    pub cascade_blend: CascadeBlendMode,
}

/// Configuration options for the point and spot light shadow atlas.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct OtherShadowConfig {
    /// The width and height of the point/spot shadow atlas in texels.
    pub atlas_size: u32,
    /// The PCF kernel used when sampling the point/spot atlas.
    pub filter: ShadowFilter,
}

/// Size of the percentage-closer filtering kernel applied when sampling a
/// shadow atlas. `Pcf2x2` is the hardware bilinear comparison with no
/// additional taps.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadowFilter {
    Pcf2x2 = 0,
    Pcf3x3 = 1,
    Pcf5x5 = 2,
    Pcf7x7 = 3,
}

/// How fragments near a cascade boundary combine samples from the two
/// adjacent cascades.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CascadeBlendMode {
    Hard = 0,
    Soft = 1,
    Dither = 2,
}

/// Whether baked occlusion masks are applied at all distances or only beyond
/// the real-time shadow distance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadowMaskMode {
    Always,
    Distance,
}

/// Smallest supported atlas resolution in texels.
pub const MIN_ATLAS_SIZE: u32 = 256;
/// Largest supported atlas resolution in texels.
pub const MAX_ATLAS_SIZE: u32 = 8192;

impl ShadowConfig {
    /// Checks that every value is usable by the shadow subsystem.
    ///
    /// Called at configuration-load time; the subsystem itself assumes a
    /// validated configuration.
    ///
    /// # Errors
    /// Returns an error describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_distance > 0.0) {
            bail!(
                "Maximum shadow distance must be positive, got {}",
                self.max_distance
            );
        }
        if !(self.distance_fade > 0.0 && self.distance_fade <= 1.0) {
            bail!(
                "Shadow distance fade must be in (0, 1], got {}",
                self.distance_fade
            );
        }
        self.directional.validate()?;
        self.other.validate()
    }
}

impl DirectionalShadowConfig {
    fn validate(&self) -> Result<()> {
        validate_atlas_size(self.atlas_size, "directional")?;

        if !(1..=MAX_CASCADES as u32).contains(&self.cascade_count) {
            bail!(
                "Cascade count must be between 1 and {MAX_CASCADES}, got {}",
                self.cascade_count
            );
        }
        let mut previous = 0.0;
        for &ratio in &self.cascade_ratios {
            if !(ratio > 0.0 && ratio <= 1.0) || ratio < previous {
                bail!(
                    "Cascade split ratios must be non-decreasing values in (0, 1], got {:?}",
                    self.cascade_ratios
                );
            }
            previous = ratio;
        }
        if !(self.cascade_fade > 0.0 && self.cascade_fade <= 1.0) {
            bail!("Cascade fade must be in (0, 1], got {}", self.cascade_fade);
        }
        Ok(())
    }
}

impl OtherShadowConfig {
    fn validate(&self) -> Result<()> {
        validate_atlas_size(self.atlas_size, "point/spot")
    }
}

fn validate_atlas_size(atlas_size: u32, category: &str) -> Result<()> {
    if !atlas_size.is_power_of_two() || !(MIN_ATLAS_SIZE..=MAX_ATLAS_SIZE).contains(&atlas_size) {
        bail!(
            "The {category} shadow atlas resolution must be a power of two \
             between {MIN_ATLAS_SIZE} and {MAX_ATLAS_SIZE}, got {atlas_size}"
        );
    }
    Ok(())
}

impl ShadowFilter {
    /// Width factor of the filter footprint in texels, used for bias and
    /// culling-sphere padding derivations.
    pub fn sample_footprint(self) -> f32 {
        self as u32 as f32 + 1.0
    }

    /// Index into the per-category filter keyword group, or [`None`] for the
    /// plain 2x2 hardware filter.
    pub fn keyword_slot(self) -> Option<usize> {
        (self as usize).checked_sub(1)
    }
}

impl CascadeBlendMode {
    /// Index into the cascade blend keyword group, or [`None`] for hard
    /// cascade transitions.
    pub fn keyword_slot(self) -> Option<usize> {
        (self as usize).checked_sub(1)
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowConfig::default(),
            other: OtherShadowConfig::default(),
            mask_mode: ShadowMaskMode::Distance,
        }
    }
}

impl Default for DirectionalShadowConfig {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            filter: ShadowFilter::Pcf2x2,
            cascade_count: 4,
            cascade_ratios: [0.1, 0.25, 0.5],
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl Default for OtherShadowConfig {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            filter: ShadowFilter::Pcf2x2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ShadowConfig::default().validate().unwrap();
    }

    #[test]
    fn non_power_of_two_atlas_size_is_rejected() {
        let mut config = ShadowConfig::default();
        config.directional.atlas_size = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_atlas_size_is_rejected() {
        let mut config = ShadowConfig::default();
        config.other.atlas_size = 128;
        assert!(config.validate().is_err());
        config.other.atlas_size = 16384;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cascade_count_is_rejected() {
        let mut config = ShadowConfig::default();
        config.directional.cascade_count = 0;
        assert!(config.validate().is_err());
        config.directional.cascade_count = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn decreasing_cascade_ratios_are_rejected() {
        let mut config = ShadowConfig::default();
        config.directional.cascade_ratios = [0.5, 0.25, 0.1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_max_distance_is_rejected() {
        let mut config = ShadowConfig::default();
        config.max_distance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn filter_sample_footprint_grows_with_kernel_size() {
        assert_eq!(ShadowFilter::Pcf2x2.sample_footprint(), 1.0);
        assert_eq!(ShadowFilter::Pcf3x3.sample_footprint(), 2.0);
        assert_eq!(ShadowFilter::Pcf5x5.sample_footprint(), 3.0);
        assert_eq!(ShadowFilter::Pcf7x7.sample_footprint(), 4.0);
    }

    #[test]
    fn plain_hardware_filter_has_no_keyword() {
        assert_eq!(ShadowFilter::Pcf2x2.keyword_slot(), None);
        assert_eq!(ShadowFilter::Pcf7x7.keyword_slot(), Some(2));
        assert_eq!(CascadeBlendMode::Hard.keyword_slot(), None);
        assert_eq!(CascadeBlendMode::Dither.keyword_slot(), Some(1));
    }
}
