//! Real-time shadow mapping for the Vesper renderer.
//!
//! Each frame, lights that want real-time shadows reserve capacity in one of
//! two shared atlas textures (one for directional lights, one for point and
//! spot lights) through the [`ledger::ShadowLedger`]. Once all reservations
//! are in, a frame plan ([`frame::build_frame_plan`]) lays the accepted
//! lights out on the atlases, derives cascade, bias and filter data, and
//! produces the shader-global parameter set ([`params::ShadowGlobalParams`])
//! consumed by the shading pass.

pub mod atlas;
pub mod cascade;
pub mod config;
pub mod frame;
pub mod ledger;
pub mod light;
pub mod map;
pub mod params;
pub mod scene;

/// Maximum number of directional lights that can render real-time shadows in
/// a single frame.
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

/// Maximum number of atlas slots available to point and spot lights in a
/// single frame. A spot light occupies one slot, a point light six.
pub const MAX_SHADOWED_OTHER_LIGHTS: usize = 16;

/// Maximum number of cascades in the directional shadow atlas.
pub const MAX_CASCADES: usize = 4;

/// Number of contiguous atlas slots a point light occupies, one per cubemap
/// face.
pub const POINT_LIGHT_SLOT_COUNT: usize = 6;
