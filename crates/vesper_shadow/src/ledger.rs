//! Per-frame reservation of shadow atlas capacity.

use crate::{
    MAX_SHADOWED_DIRECTIONAL_LIGHTS, MAX_SHADOWED_OTHER_LIGHTS, POINT_LIGHT_SLOT_COUNT,
    light::{BakedShadowing, LightKind, VisibleLight},
    params::ShadowParams,
};
use tinyvec::ArrayVec;

/// A directional light granted real-time shadow capacity this frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShadowedDirectionalLight {
    /// Index of the light in the frame's visible-light list.
    pub visible_light_index: u32,
    /// Slope-scale depth bias applied while rasterizing the light's casters.
    pub slope_scale_bias: f32,
    /// Near-plane offset for the light's cascade projections.
    pub near_plane_offset: f32,
}

/// A point or spot light granted real-time shadow capacity this frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShadowedOtherLight {
    /// Index of the light in the frame's visible-light list.
    pub visible_light_index: u32,
    /// Slope-scale depth bias applied while rasterizing the light's casters.
    pub slope_scale_bias: f32,
    /// World-space normal bias used for the light's sampling offsets.
    pub normal_bias: f32,
    /// Whether the light is a point light occupying six contiguous slots.
    pub is_point: bool,
}

/// Per-frame record of which visible lights have been granted real-time
/// shadow capacity.
///
/// The ledger must be [reset](Self::reset) exactly once per frame before any
/// reservation, and all reservations must be in before the atlases are
/// rendered: slot indices handed out here become atlas tile assignments.
///
/// Every reservation returns a well-defined [`ShadowParams`]; rejection
/// (capacity exhausted, zero strength, no casters in bounds) degrades to the
/// baked-mask or inert encoding rather than an error.
#[derive(Clone, Debug)]
pub struct ShadowLedger {
    directional: ArrayVec<[ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS]>,
    other: ArrayVec<[ShadowedOtherLight; MAX_SHADOWED_OTHER_LIGHTS]>,
    other_used_slots: usize,
    use_shadow_mask: bool,
}

impl ShadowLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            directional: ArrayVec::new(),
            other: ArrayVec::new(),
            other_used_slots: 0,
            use_shadow_mask: false,
        }
    }

    /// Empties both light categories and clears the shadow-mask flag.
    pub fn reset(&mut self) {
        self.directional.clear();
        self.other.clear();
        self.other_used_slots = 0;
        self.use_shadow_mask = false;
    }

    /// Requests real-time shadow capacity for a visible directional light.
    ///
    /// `has_casters_in_bounds` is the culling collaborator's verdict on
    /// whether the light affects any shadow-casting geometry. A light that
    /// is rejected for capacity or empty bounds falls back to its baked
    /// shadow mask (negated strength) without consuming a slot.
    pub fn reserve_directional(
        &mut self,
        light: &VisibleLight,
        visible_light_index: u32,
        has_casters_in_bounds: bool,
        cascade_count: u32,
    ) -> ShadowParams {
        if !light.wants_realtime_shadows() {
            return ShadowParams::none();
        }

        let mask_channel = self.resolve_mask_channel(light);

        if self.directional.len() == MAX_SHADOWED_DIRECTIONAL_LIGHTS || !has_casters_in_bounds {
            return ShadowParams::baked_only(light.shadow_strength, mask_channel);
        }

        let slot_index = self.directional.len();
        self.directional.push(ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.slope_scale_bias,
            near_plane_offset: light.shadow_near_plane,
        });

        ShadowParams::realtime(
            light.shadow_strength,
            (cascade_count * slot_index as u32) as f32,
            light.normal_bias,
            mask_channel,
        )
    }

    /// Requests real-time shadow capacity for a visible point or spot light.
    ///
    /// A point light needs six contiguous slots and is reserved atomically:
    /// when fewer than six remain it is rejected entirely and falls back to
    /// its baked shadow mask, leaving the slot counter untouched.
    pub fn reserve_other(
        &mut self,
        light: &VisibleLight,
        visible_light_index: u32,
        has_casters_in_bounds: bool,
    ) -> ShadowParams {
        if !light.wants_realtime_shadows() {
            return ShadowParams::none();
        }

        let mask_channel = self.resolve_mask_channel(light);

        let is_point = light.kind == LightKind::Point;
        let needed_slots = if is_point { POINT_LIGHT_SLOT_COUNT } else { 1 };

        if self.other_used_slots + needed_slots > MAX_SHADOWED_OTHER_LIGHTS
            || !has_casters_in_bounds
        {
            return ShadowParams::baked_only(light.shadow_strength, mask_channel);
        }

        let first_slot = self.other_used_slots;
        self.other.push(ShadowedOtherLight {
            visible_light_index,
            slope_scale_bias: light.slope_scale_bias,
            normal_bias: light.normal_bias,
            is_point,
        });
        self.other_used_slots += needed_slots;

        ShadowParams::realtime(
            light.shadow_strength,
            first_slot as f32,
            if is_point { 1.0 } else { 0.0 },
            mask_channel,
        )
    }

    /// The directional lights accepted this frame, in slot order.
    pub fn directional_lights(&self) -> &[ShadowedDirectionalLight] {
        &self.directional
    }

    /// The point and spot lights accepted this frame, in record order. Slot
    /// indices follow from the records' slot consumption (six per point
    /// light, one per spot light).
    pub fn other_lights(&self) -> &[ShadowedOtherLight] {
        &self.other
    }

    /// Number of atlas slots consumed by the accepted point and spot lights.
    pub fn other_used_slot_count(&self) -> usize {
        self.other_used_slots
    }

    /// Whether any light reserved this frame relies on the baked shadow
    /// mask.
    pub fn use_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    fn resolve_mask_channel(&mut self, light: &VisibleLight) -> f32 {
        match light.baking {
            BakedShadowing::Shadowmask { channel } => {
                self.use_shadow_mask = true;
                channel as f32
            }
            BakedShadowing::RealtimeOnly => -1.0,
        }
    }
}

impl Default for ShadowLedger {
    fn default() -> Self {
        Self::new()
    }
}
