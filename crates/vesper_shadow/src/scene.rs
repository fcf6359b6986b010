//! Seam to the camera culling and visibility collaborator.

use nalgebra::{Matrix4, Vector4};

/// One of the six faces of a point light's shadow cubemap. The enum value
/// corresponds to the conventional index of the face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CubemapFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubemapFace {
    /// Returns an array with each face in the conventional order.
    pub const fn all() -> [Self; 6] {
        [
            Self::PositiveX,
            Self::NegativeX,
            Self::PositiveY,
            Self::NegativeY,
            Self::PositiveZ,
            Self::NegativeZ,
        ]
    }

    /// Returns the index of the face according to the conventional ordering
    /// as a [`u32`].
    pub const fn as_idx_u32(&self) -> u32 {
        *self as u32
    }

    /// Returns the index of the face according to the conventional ordering
    /// as a [`usize`].
    pub const fn as_idx_usize(&self) -> usize {
        *self as usize
    }
}

/// The view and projection of one shadow atlas tile, together with the
/// culling volume of the geometry rendered into it.
#[derive(Copy, Clone, Debug)]
pub struct ShadowSlice {
    /// World-to-light-space view matrix.
    pub view: Matrix4<f32>,
    /// Light-space-to-clip projection matrix.
    pub projection: Matrix4<f32>,
    /// Camera-relative culling sphere of the slice (center in `xyz`, radius
    /// in `w`). Only meaningful for directional cascades.
    pub culling_sphere: Vector4<f32>,
}

/// Inputs for deriving one directional cascade's shadow slice.
#[derive(Copy, Clone, Debug)]
pub struct DirectionalSliceRequest {
    /// Index of the light in the frame's visible-light list.
    pub light_index: u32,
    /// The cascade to derive, in `0..cascade_count`.
    pub cascade_index: u32,
    /// Total number of cascades rendered for the light.
    pub cascade_count: u32,
    /// Relative view distances at which the first three cascades end.
    pub split_ratios: [f32; 3],
    /// Resolution in texels of the atlas tile the cascade renders into.
    pub tile_size: u32,
    /// Near-plane offset of the light's shadow projection.
    pub near_plane_offset: f32,
    /// Multiplier the collaborator applies to the cascade's caster-culling
    /// sphere radius.
    pub culling_shrink_factor: f32,
}

/// The culling collaborator: supplies per-light visibility verdicts and the
/// view/projection/culling data for every shadow atlas tile.
///
/// Implemented by the camera culling pass of the surrounding renderer;
/// implemented by lightweight mocks in tests.
pub trait ShadowCasterCulling {
    /// Whether the light with the given visible-light index affects any
    /// shadow-casting geometry within the shadow distance.
    fn shadow_casters_in_bounds(&self, light_index: u32) -> bool;

    /// Derives the view/projection pair and culling sphere for one cascade
    /// of a directional light.
    fn directional_slice(&self, request: &DirectionalSliceRequest) -> ShadowSlice;

    /// Derives the perspective view/projection pair for a spot light.
    fn spot_slice(&self, light_index: u32) -> ShadowSlice;

    /// Derives the view/projection pair for one cubemap face of a point
    /// light. `fov_bias_degrees` widens the 90-degree face frustum so that
    /// filtered lookups never sample across a face seam.
    fn point_slice(&self, light_index: u32, face: CubemapFace, fov_bias_degrees: f32)
    -> ShadowSlice;
}
