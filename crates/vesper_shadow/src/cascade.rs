//! Cascade data for directional shadows.
//!
//! Cascades are camera-relative, not light-relative, so the per-cascade
//! culling spheres and sampling data are computed once per frame from the
//! first accepted directional light and shared by all of them.

use crate::{MAX_CASCADES, config::ShadowFilter};
use nalgebra::Vector4;
use std::f32::consts::SQRT_2;

/// Per-cascade culling spheres and sampling data for the directional shadow
/// atlas, in the layout uploaded to the shading pass.
#[derive(Clone, Debug)]
pub struct CascadeArrays {
    /// Camera-relative culling spheres; `w` holds the *squared* padded
    /// radius so the fragment-side containment test needs no square root.
    pub culling_spheres: [Vector4<f32>; MAX_CASCADES],
    /// `(1 / r_padded^2, texel_size * sqrt(2), filter_padding * sqrt(2), 0)`
    /// per cascade.
    pub data: [Vector4<f32>; MAX_CASCADES],
}

impl CascadeArrays {
    /// Creates zeroed cascade arrays.
    pub fn new() -> Self {
        Self {
            culling_spheres: [Vector4::zeros(); MAX_CASCADES],
            data: [Vector4::zeros(); MAX_CASCADES],
        }
    }

    /// Derives and stores the sampling data for one cascade from its culling
    /// sphere (center in `xyz`, radius in `w`) and the tile resolution it is
    /// rendered at.
    ///
    /// The sphere radius is shrunk by the widest possible filter footprint
    /// before squaring, so that filtered lookups never sample outside the
    /// cascade's tile. Texel size and padding are scaled by sqrt(2) for the
    /// worst case of sampling along the tile diagonal.
    pub fn set_cascade(
        &mut self,
        cascade_index: usize,
        culling_sphere: Vector4<f32>,
        tile_size: f32,
        filter: ShadowFilter,
    ) {
        let mut sphere = culling_sphere;
        let mut texel_size = 2.0 * sphere.w / tile_size;
        let filter_padding = texel_size * filter.sample_footprint();

        sphere.w = (sphere.w - filter_padding).max(0.0);
        sphere.w *= sphere.w;

        texel_size *= SQRT_2;

        self.culling_spheres[cascade_index] = sphere;
        self.data[cascade_index] =
            Vector4::new(sphere.w.recip(), texel_size, filter_padding * SQRT_2, 0.0);
    }
}

/// The multiplier applied to each cascade's caster-culling sphere radius.
///
/// 0.8 limits cascade-seam artifacts without shrinking so far that casters
/// pop between cascades prematurely.
pub fn culling_shrink_factor(cascade_fade: f32) -> f32 {
    (0.8 - cascade_fade).max(0.0)
}

/// The `(1 / max_distance, 1 / distance_fade, 1 / (1 - (1 - cascade_fade)^2),
/// 0)` vector driving the distance and cascade fade computations in the
/// shading pass. Reciprocals are taken here so the per-fragment fade needs
/// no division.
pub fn distance_fade_vector(max_distance: f32, distance_fade: f32, cascade_fade: f32) -> Vector4<f32> {
    let f = 1.0 - cascade_fade;
    Vector4::new(
        max_distance.recip(),
        distance_fade.recip(),
        (1.0 - f * f).recip(),
        0.0,
    )
}
