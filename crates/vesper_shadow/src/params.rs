//! Marshalling of shadow parameters for the shading pass.

use crate::{MAX_CASCADES, MAX_SHADOWED_DIRECTIONAL_LIGHTS, MAX_SHADOWED_OTHER_LIGHTS};
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix4, Vector4};

/// Compact per-light shadow descriptor handed back by a reservation and later
/// packed into the light's shading data.
///
/// Encoding (shared with the shading pass):
/// - `x`: shadow strength. A *negative* strength signals "sample the baked
///   shadow mask only, skip the real-time atlas". Zero means no shadowing.
/// - `y`: first atlas tile of the light (cascade base index for directional
///   lights, slot index for point/spot lights).
/// - `z`: normal bias for directional lights; the is-point flag (1/0) for
///   other lights.
/// - `w`: baked shadow-mask channel of the light, or -1 when the light has
///   none.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Zeroable, Pod)]
pub struct ShadowParams(Vector4<f32>);

impl ShadowParams {
    /// The inert descriptor: no real-time shadows, no baked mask.
    pub fn none() -> Self {
        Self(Vector4::new(0.0, 0.0, 0.0, -1.0))
    }

    /// Descriptor for a light that only samples its baked shadow mask. The
    /// negated strength is the signal channel.
    pub fn baked_only(strength: f32, mask_channel: f32) -> Self {
        Self(Vector4::new(-strength, 0.0, 0.0, mask_channel))
    }

    /// Descriptor for a light granted real-time atlas capacity.
    pub fn realtime(strength: f32, tile_index: f32, extra: f32, mask_channel: f32) -> Self {
        Self(Vector4::new(strength, tile_index, extra, mask_channel))
    }

    /// The shadow strength; negative when only the baked mask applies.
    pub fn strength(&self) -> f32 {
        self.0.x
    }

    /// Index of the light's first atlas tile.
    pub fn tile_index(&self) -> f32 {
        self.0.y
    }

    /// The normal bias (directional lights only).
    pub fn normal_bias(&self) -> f32 {
        self.0.z
    }

    /// Whether the descriptor belongs to a point light (other lights only).
    pub fn is_point(&self) -> bool {
        self.0.z > 0.5
    }

    /// The baked shadow-mask channel, or -1 when the light has none.
    pub fn mask_channel(&self) -> f32 {
        self.0.w
    }

    /// The raw parameter vector as uploaded to the GPU.
    pub fn as_vector(&self) -> &Vector4<f32> {
        &self.0
    }
}

bitflags! {
    /// Bitflags selecting the shadow sampling variants used by the shading
    /// pass. Within each group (directional filter, other filter, cascade
    /// blend, shadow mask) at most one flag may be set.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable, Pod)]
    pub struct ShadowFlags: u32 {
        const DIRECTIONAL_PCF3   = 1 << 0;
        const DIRECTIONAL_PCF5   = 1 << 1;
        const DIRECTIONAL_PCF7   = 1 << 2;
        const OTHER_PCF3         = 1 << 3;
        const OTHER_PCF5         = 1 << 4;
        const OTHER_PCF7         = 1 << 5;
        const CASCADE_BLEND_SOFT   = 1 << 6;
        const CASCADE_BLEND_DITHER = 1 << 7;
        const SHADOW_MASK_ALWAYS   = 1 << 8;
        const SHADOW_MASK_DISTANCE = 1 << 9;
    }
}

impl ShadowFlags {
    /// The mutually exclusive directional atlas filter flags.
    pub const DIRECTIONAL_FILTER_GROUP: [ShadowFlags; 3] = [
        Self::DIRECTIONAL_PCF3,
        Self::DIRECTIONAL_PCF5,
        Self::DIRECTIONAL_PCF7,
    ];
    /// The mutually exclusive point/spot atlas filter flags.
    pub const OTHER_FILTER_GROUP: [ShadowFlags; 3] =
        [Self::OTHER_PCF3, Self::OTHER_PCF5, Self::OTHER_PCF7];
    /// The mutually exclusive cascade blend flags.
    pub const CASCADE_BLEND_GROUP: [ShadowFlags; 2] =
        [Self::CASCADE_BLEND_SOFT, Self::CASCADE_BLEND_DITHER];
    /// The mutually exclusive shadow-mask mode flags.
    pub const SHADOW_MASK_GROUP: [ShadowFlags; 2] =
        [Self::SHADOW_MASK_ALWAYS, Self::SHADOW_MASK_DISTANCE];

    /// Enables the flag at `enabled` within the group and disables every
    /// other flag of the group. [`None`] disables the whole group.
    pub fn select(&mut self, group: &[ShadowFlags], enabled: Option<usize>) {
        for (slot, &flag) in group.iter().enumerate() {
            self.set(flag, Some(slot) == enabled);
        }
    }
}

/// The shader-global shadow parameter set, uploaded once per frame after all
/// shadow draws have been recorded.
///
/// # Warning
/// The fields must not be reordered, as this layout is expected by the
/// shading pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Zeroable, Pod)]
pub struct ShadowGlobalParams {
    /// World-to-atlas matrices for every directional cascade tile, laid out
    /// as `light * cascade_count + cascade`.
    pub directional_matrices: [Matrix4<f32>; MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES],
    /// World-to-atlas matrices for every point/spot tile.
    pub other_matrices: [Matrix4<f32>; MAX_SHADOWED_OTHER_LIGHTS],
    /// Tile bounds and sampling bias for every point/spot tile: `(min_x,
    /// min_y)` of the clamped tile rectangle, its span, and the normal bias.
    pub other_tiles: [Vector4<f32>; MAX_SHADOWED_OTHER_LIGHTS],
    /// Camera-relative cascade culling spheres; `w` holds the *squared*
    /// padded radius.
    pub cascade_culling_spheres: [Vector4<f32>; MAX_CASCADES],
    /// Per-cascade `(1 / r_padded^2, texel_size * sqrt(2), filter_padding *
    /// sqrt(2), 0)`.
    pub cascade_data: [Vector4<f32>; MAX_CASCADES],
    /// `(directional size, 1 / directional size, other size, 1 / other
    /// size)` of the two atlases in texels.
    pub atlas_size: Vector4<f32>,
    /// `(1 / max_distance, 1 / distance_fade, 1 / (1 - (1 - cascade_fade)^2),
    /// 0)` for the distance and cascade fade computations.
    pub distance_fade: Vector4<f32>,
    /// Number of cascades rendered this frame, zero when no directional light
    /// was accepted.
    pub cascade_count: u32,
    /// Sampling variant selectors.
    pub flags: ShadowFlags,
    // Padding to make size multiple of 16-bytes
    _padding: [u32; 2],
}

impl ShadowGlobalParams {
    /// An all-inert parameter set (identity of the frame accumulation).
    pub fn new() -> Self {
        Self::zeroed()
    }
}

/// Per-slice uniform consumed by shadow caster rasterization. One instance is
/// written for every atlas tile drawn this frame, bound at a dynamic offset.
///
/// # Warning
/// The fields must not be reordered, as this layout is expected by the
/// caster shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Zeroable, Pod)]
pub struct SliceUniform {
    /// World-to-clip matrix of the slice (projection * view, without the
    /// atlas remap, which only applies to sampling).
    pub light_from_world: Matrix4<f32>,
    /// `(constant, slope_scale, 0, 0)` depth bias applied by the caster
    /// shader while rasterizing this slice.
    pub depth_bias: Vector4<f32>,
    /// `x` is 1 when near-plane pancaking of casters is enabled for the
    /// slice's atlas (orthographic directional projections only).
    pub pancaking: Vector4<f32>,
    // Padding to the 256-byte dynamic uniform offset alignment
    _padding: [[f32; 4]; 10],
}

/// Byte stride between consecutive [`SliceUniform`]s in the per-frame slice
/// uniform buffer.
pub const SLICE_UNIFORM_STRIDE: usize = 256;

impl SliceUniform {
    /// Creates the uniform for one atlas slice.
    pub fn new(light_from_world: Matrix4<f32>, slope_scale_bias: f32, pancaking: bool) -> Self {
        Self {
            light_from_world,
            depth_bias: Vector4::new(0.0, slope_scale_bias, 0.0, 0.0),
            pancaking: Vector4::new(if pancaking { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0),
            _padding: [[0.0; 4]; 10],
        }
    }
}
