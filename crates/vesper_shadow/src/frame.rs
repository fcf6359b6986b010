//! Per-frame shadow render planning.
//!
//! Once all reservations are in, [`build_frame_plan`] lays the accepted
//! lights out on the two atlases and derives every matrix, viewport, bias
//! and shader parameter the render pass and the shading pass consume. The
//! plan is pure data; executing it against the GPU is the render crate's
//! job.

use crate::{
    atlas::{TileViewport, other_tile_data, split_factor, tile_offset, tile_viewport,
        to_atlas_matrix},
    cascade::{CascadeArrays, culling_shrink_factor, distance_fade_vector},
    config::ShadowConfig,
    ledger::{ShadowLedger, ShadowedOtherLight},
    params::{ShadowFlags, ShadowGlobalParams},
    scene::{CubemapFace, DirectionalSliceRequest, ShadowCasterCulling},
};
use nalgebra::Matrix4;
use std::f32::consts::SQRT_2;

/// Which of the two shadow atlases a slice renders into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadowAtlasKind {
    Directional,
    Other,
}

/// What a slice represents within its light's atlas allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SliceKind {
    /// One cascade of a directional light.
    Cascade(u32),
    /// The single tile of a spot light.
    Spot,
    /// One cubemap face of a point light.
    Face(CubemapFace),
}

/// One depth draw into an atlas tile.
#[derive(Copy, Clone, Debug)]
pub struct SliceDraw {
    /// The atlas the slice renders into.
    pub atlas: ShadowAtlasKind,
    /// The slice's role within its light's allocation.
    pub kind: SliceKind,
    /// Index of the light in the frame's visible-light list.
    pub visible_light_index: u32,
    /// The tile's viewport rectangle within the atlas.
    pub viewport: TileViewport,
    /// World-to-light-space view matrix used for rasterization.
    pub view: Matrix4<f32>,
    /// Light-space-to-clip projection matrix used for rasterization.
    pub projection: Matrix4<f32>,
    /// Slope-scale depth bias active while rasterizing the slice.
    pub slope_scale_bias: f32,
}

/// Everything the render pass executes and the shading pass consumes for one
/// frame of shadows.
#[derive(Clone, Debug)]
pub struct ShadowFramePlan {
    /// Resolution of the directional atlas, or [`None`] when no directional
    /// light was accepted and a 1x1 dummy target suffices.
    pub directional_atlas_size: Option<u32>,
    /// Resolution of the point/spot atlas, or [`None`] for the dummy.
    pub other_atlas_size: Option<u32>,
    /// The depth draws of the frame, directional atlas first.
    pub slices: Vec<SliceDraw>,
    /// The shader-global parameter set to upload after the draws.
    pub globals: ShadowGlobalParams,
}

impl SliceDraw {
    /// The world-to-clip matrix rasterization uses for this slice.
    pub fn light_from_world(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

/// Lays out all accepted lights on the two shadow atlases.
///
/// `reversed_z` declares the depth convention of the projection matrices the
/// culling collaborator produces; it controls the z-row handling of the
/// sampling remap.
pub fn build_frame_plan(
    ledger: &ShadowLedger,
    config: &ShadowConfig,
    culling: &impl ShadowCasterCulling,
    reversed_z: bool,
) -> ShadowFramePlan {
    let mut plan = ShadowFramePlan {
        directional_atlas_size: None,
        other_atlas_size: None,
        slices: Vec::with_capacity(
            ledger.directional_lights().len() * config.directional.cascade_count as usize
                + ledger.other_used_slot_count(),
        ),
        globals: ShadowGlobalParams::new(),
    };

    plan_directional_atlas(&mut plan, ledger, config, culling, reversed_z);
    plan_other_atlas(&mut plan, ledger, config, culling, reversed_z);

    let globals = &mut plan.globals;

    globals.cascade_count = if ledger.directional_lights().is_empty() {
        0
    } else {
        config.directional.cascade_count
    };

    globals.distance_fade = distance_fade_vector(
        config.max_distance,
        config.distance_fade,
        config.directional.cascade_fade,
    );

    let mask_slot = if ledger.use_shadow_mask() {
        match config.mask_mode {
            crate::config::ShadowMaskMode::Always => Some(0),
            crate::config::ShadowMaskMode::Distance => Some(1),
        }
    } else {
        None
    };
    globals
        .flags
        .select(&ShadowFlags::SHADOW_MASK_GROUP, mask_slot);

    plan
}

fn plan_directional_atlas(
    plan: &mut ShadowFramePlan,
    ledger: &ShadowLedger,
    config: &ShadowConfig,
    culling: &impl ShadowCasterCulling,
    reversed_z: bool,
) {
    let lights = ledger.directional_lights();
    if lights.is_empty() {
        return;
    }

    let atlas_size = config.directional.atlas_size;
    let cascade_count = config.directional.cascade_count;

    plan.directional_atlas_size = Some(atlas_size);
    plan.globals.atlas_size.x = atlas_size as f32;
    plan.globals.atlas_size.y = (atlas_size as f32).recip();

    let tiles = lights.len() as u32 * cascade_count;
    let split = split_factor(tiles);
    let tile_size = atlas_size / split;
    let tile_scale = (split as f32).recip();

    let shrink_factor = culling_shrink_factor(config.directional.cascade_fade);

    let mut cascades = CascadeArrays::new();

    for (slot_index, light) in lights.iter().enumerate() {
        let tile_base = slot_index as u32 * cascade_count;

        for cascade_index in 0..cascade_count {
            let slice = culling.directional_slice(&DirectionalSliceRequest {
                light_index: light.visible_light_index,
                cascade_index,
                cascade_count,
                split_ratios: config.directional.cascade_ratios,
                tile_size,
                near_plane_offset: light.near_plane_offset,
                culling_shrink_factor: shrink_factor,
            });

            // Cascades are camera-relative, so the cull spheres of every
            // directional light coincide; only the first light fills them in.
            if slot_index == 0 {
                cascades.set_cascade(
                    cascade_index as usize,
                    slice.culling_sphere,
                    tile_size as f32,
                    config.directional.filter,
                );
            }

            let tile_index = tile_base + cascade_index;
            let offset = tile_offset(tile_index, split);

            plan.globals.directional_matrices[tile_index as usize] = to_atlas_matrix(
                slice.projection * slice.view,
                offset,
                tile_scale,
                reversed_z,
            );

            plan.slices.push(SliceDraw {
                atlas: ShadowAtlasKind::Directional,
                kind: SliceKind::Cascade(cascade_index),
                visible_light_index: light.visible_light_index,
                viewport: tile_viewport(tile_index, split, tile_size),
                view: slice.view,
                projection: slice.projection,
                slope_scale_bias: light.slope_scale_bias,
            });
        }
    }

    plan.globals.cascade_culling_spheres = cascades.culling_spheres;
    plan.globals.cascade_data = cascades.data;

    plan.globals.flags.select(
        &ShadowFlags::DIRECTIONAL_FILTER_GROUP,
        config.directional.filter.keyword_slot(),
    );
    plan.globals.flags.select(
        &ShadowFlags::CASCADE_BLEND_GROUP,
        config.directional.cascade_blend.keyword_slot(),
    );
}

fn plan_other_atlas(
    plan: &mut ShadowFramePlan,
    ledger: &ShadowLedger,
    config: &ShadowConfig,
    culling: &impl ShadowCasterCulling,
    reversed_z: bool,
) {
    let tiles = ledger.other_used_slot_count() as u32;
    if tiles == 0 {
        return;
    }

    let atlas_size = config.other.atlas_size;

    plan.other_atlas_size = Some(atlas_size);
    plan.globals.atlas_size.z = atlas_size as f32;
    plan.globals.atlas_size.w = (atlas_size as f32).recip();

    let split = split_factor(tiles);
    let tile_size = atlas_size / split;
    let tile_scale = (split as f32).recip();
    // Half a texel of inset keeps bilinear lookups inside the tile.
    let border = 0.5 * (atlas_size as f32).recip();

    let filter_footprint = config.other.filter.sample_footprint();

    let mut slot_cursor = 0u32;
    for light in ledger.other_lights() {
        if light.is_point {
            plan_point_light(
                plan,
                culling,
                light,
                slot_cursor,
                split,
                tile_size,
                tile_scale,
                border,
                filter_footprint,
                reversed_z,
            );
            slot_cursor += 6;
        } else {
            plan_spot_light(
                plan,
                culling,
                light,
                slot_cursor,
                split,
                tile_size,
                tile_scale,
                border,
                filter_footprint,
                reversed_z,
            );
            slot_cursor += 1;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn plan_spot_light(
    plan: &mut ShadowFramePlan,
    culling: &impl ShadowCasterCulling,
    light: &ShadowedOtherLight,
    slot_index: u32,
    split: u32,
    tile_size: u32,
    tile_scale: f32,
    border: f32,
    filter_footprint: f32,
    reversed_z: bool,
) {
    let slice = culling.spot_slice(light.visible_light_index);

    // The perspective projection stretches texels with distance; the world
    // texel size at depth 1 follows from the vertical scale term.
    let texel_size = 2.0 / (tile_size as f32 * slice.projection.m11);
    let filter_size = texel_size * filter_footprint;
    let bias = light.normal_bias * filter_size * SQRT_2;

    let offset = tile_offset(slot_index, split);
    plan.globals.other_tiles[slot_index as usize] =
        other_tile_data(offset, tile_scale, border, bias);
    plan.globals.other_matrices[slot_index as usize] =
        to_atlas_matrix(slice.projection * slice.view, offset, tile_scale, reversed_z);

    plan.slices.push(SliceDraw {
        atlas: ShadowAtlasKind::Other,
        kind: SliceKind::Spot,
        visible_light_index: light.visible_light_index,
        viewport: tile_viewport(slot_index, split, tile_size),
        view: slice.view,
        projection: slice.projection,
        slope_scale_bias: light.slope_scale_bias,
    });
}

#[allow(clippy::too_many_arguments)]
fn plan_point_light(
    plan: &mut ShadowFramePlan,
    culling: &impl ShadowCasterCulling,
    light: &ShadowedOtherLight,
    first_slot: u32,
    split: u32,
    tile_size: u32,
    tile_scale: f32,
    border: f32,
    filter_footprint: f32,
    reversed_z: bool,
) {
    // Cube faces have a 90-degree field of view, so the world-space tile
    // size at depth 1 is two texels per texel of resolution.
    let texel_size = 2.0 / tile_size as f32;
    let filter_size = texel_size * filter_footprint;
    let bias = light.normal_bias * filter_size * SQRT_2;

    // Widen the face frustum so filtered lookups never reach a tile edge,
    // where the neighboring sample would belong to another face.
    let fov_bias_degrees = (1.0 + bias + filter_size).atan().to_degrees() * 2.0 - 90.0;

    for face in CubemapFace::all() {
        let mut slice = culling.point_slice(light.visible_light_index, face, fov_bias_degrees);

        // Point light shadows are captured upside down, which reverses the
        // triangle winding and makes the rasterizer keep the back faces.
        // Negating the second view row flips the image back so front-face
        // depths are stored; left uncorrected, contact points leak light.
        // (The row's first column is always zero.)
        slice.view.m22 = -slice.view.m22;
        slice.view.m23 = -slice.view.m23;
        slice.view.m24 = -slice.view.m24;

        let tile_index = first_slot + face.as_idx_u32();
        let offset = tile_offset(tile_index, split);

        plan.globals.other_tiles[tile_index as usize] =
            other_tile_data(offset, tile_scale, border, bias);
        plan.globals.other_matrices[tile_index as usize] =
            to_atlas_matrix(slice.projection * slice.view, offset, tile_scale, reversed_z);

        plan.slices.push(SliceDraw {
            atlas: ShadowAtlasKind::Other,
            kind: SliceKind::Face(face),
            visible_light_index: light.visible_light_index,
            viewport: tile_viewport(tile_index, split, tile_size),
            view: slice.view,
            projection: slice.projection,
            slope_scale_bias: light.slope_scale_bias,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{CascadeBlendMode, ShadowFilter, ShadowMaskMode},
        light::{BakedShadowing, LightKind, ShadowMode, VisibleLight},
        scene::ShadowSlice,
    };
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector4;

    /// Culling mock handing out recognizable matrices.
    struct StubCulling {
        casters_in_bounds: bool,
    }

    impl StubCulling {
        fn new() -> Self {
            Self {
                casters_in_bounds: true,
            }
        }
    }

    fn tagged_view(tag: f32) -> Matrix4<f32> {
        let mut view = Matrix4::identity();
        view.m14 = tag;
        view
    }

    impl ShadowCasterCulling for StubCulling {
        fn shadow_casters_in_bounds(&self, _light_index: u32) -> bool {
            self.casters_in_bounds
        }

        fn directional_slice(&self, request: &DirectionalSliceRequest) -> ShadowSlice {
            // The sphere radius encodes both the cascade and the light, so
            // tests can tell whose request filled the cascade arrays.
            let radius = 10.0 * (request.cascade_index + 1) as f32 + request.light_index as f32;
            ShadowSlice {
                view: tagged_view(request.cascade_index as f32),
                projection: Matrix4::identity(),
                culling_sphere: Vector4::new(0.0, 0.0, 0.0, radius),
            }
        }

        fn spot_slice(&self, light_index: u32) -> ShadowSlice {
            let mut projection = Matrix4::identity();
            projection.m11 = 2.0;
            ShadowSlice {
                view: tagged_view(light_index as f32),
                projection,
                culling_sphere: Vector4::zeros(),
            }
        }

        fn point_slice(
            &self,
            light_index: u32,
            face: CubemapFace,
            _fov_bias_degrees: f32,
        ) -> ShadowSlice {
            let mut view = tagged_view(light_index as f32);
            view.m22 = 1.0;
            view.m23 = 0.5;
            view.m24 = face.as_idx_u32() as f32;
            ShadowSlice {
                view,
                projection: Matrix4::identity(),
                culling_sphere: Vector4::zeros(),
            }
        }
    }

    fn config() -> ShadowConfig {
        ShadowConfig {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: crate::config::DirectionalShadowConfig {
                atlas_size: 1024,
                filter: ShadowFilter::Pcf3x3,
                cascade_count: 4,
                cascade_ratios: [0.1, 0.25, 0.5],
                cascade_fade: 0.1,
                cascade_blend: CascadeBlendMode::Soft,
            },
            other: crate::config::OtherShadowConfig {
                atlas_size: 512,
                filter: ShadowFilter::Pcf5x5,
            },
            mask_mode: ShadowMaskMode::Distance,
        }
    }

    fn directional_light() -> VisibleLight {
        VisibleLight {
            kind: LightKind::Directional,
            shadow_mode: ShadowMode::Soft,
            shadow_strength: 1.0,
            slope_scale_bias: 3.0,
            normal_bias: 0.5,
            shadow_near_plane: 0.1,
            baking: BakedShadowing::RealtimeOnly,
        }
    }

    #[test]
    fn empty_frame_plans_dummy_atlases_for_both_categories() {
        let ledger = ShadowLedger::new();
        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert_eq!(plan.directional_atlas_size, None);
        assert_eq!(plan.other_atlas_size, None);
        assert!(plan.slices.is_empty());
        assert_eq!(plan.globals.cascade_count, 0);
        assert!(plan.globals.flags.is_empty());
        // Distance fade is uploaded regardless so the shading pass never
        // reads stale values.
        assert_abs_diff_eq!(plan.globals.distance_fade.x, 0.01);
    }

    #[test]
    fn single_directional_light_renders_one_slice_per_cascade() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_directional(&directional_light(), 2, true, 4);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert_eq!(plan.directional_atlas_size, Some(1024));
        assert_eq!(plan.slices.len(), 4);
        assert_eq!(plan.globals.cascade_count, 4);

        // 4 tiles on a 2x2 grid of 512-texel tiles.
        let viewports: Vec<_> = plan.slices.iter().map(|slice| slice.viewport).collect();
        assert_eq!(viewports[0], TileViewport { x: 0, y: 0, size: 512 });
        assert_eq!(viewports[1], TileViewport { x: 512, y: 0, size: 512 });
        assert_eq!(viewports[2], TileViewport { x: 0, y: 512, size: 512 });
        assert_eq!(viewports[3], TileViewport { x: 512, y: 512, size: 512 });

        for (cascade_index, slice) in plan.slices.iter().enumerate() {
            assert_eq!(slice.atlas, ShadowAtlasKind::Directional);
            assert_eq!(slice.kind, SliceKind::Cascade(cascade_index as u32));
            assert_eq!(slice.visible_light_index, 2);
            assert_abs_diff_eq!(slice.slope_scale_bias, 3.0);
        }
    }

    #[test]
    fn only_the_first_directional_light_fills_the_cascade_arrays() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_directional(&directional_light(), 0, true, 4);
        ledger.reserve_directional(&directional_light(), 1, true, 4);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        // 8 tiles on a 4x4 grid of 256-texel tiles.
        assert_eq!(plan.slices.len(), 8);
        assert_eq!(plan.slices[0].viewport.size, 256);

        // The stub's spheres grow with cascade index; the stored values must
        // come from cascades 0..4, not from the second light's requests.
        for cascade_index in 0..4usize {
            let radius = 10.0 * (cascade_index + 1) as f32;
            let texel_size = 2.0 * radius / 256.0;
            let padded = radius - texel_size * 2.0;
            assert_abs_diff_eq!(
                plan.globals.cascade_culling_spheres[cascade_index].w,
                padded * padded,
                epsilon = 1e-4
            );
        }
    }

    #[test]
    fn directional_matrices_map_into_distinct_tiles() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_directional(&directional_light(), 0, true, 4);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        // The identity projection remaps to a pure tile transform; the
        // translation column identifies the tile.
        let mut corners = Vec::new();
        for tile_index in 0..4usize {
            let m = plan.globals.directional_matrices[tile_index];
            corners.push((m.m14, m.m24));
        }
        corners.sort_by(|a, b| a.partial_cmp(b).unwrap());
        corners.dedup_by(|a, b| (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6);
        assert_eq!(corners.len(), 4);
    }

    #[test]
    fn directional_keywords_follow_the_configuration() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_directional(&directional_light(), 0, true, 4);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert!(plan.globals.flags.contains(ShadowFlags::DIRECTIONAL_PCF3));
        assert!(!plan.globals.flags.contains(ShadowFlags::DIRECTIONAL_PCF5));
        assert!(
            plan.globals
                .flags
                .contains(ShadowFlags::CASCADE_BLEND_SOFT)
        );
        assert!(
            !plan
                .globals
                .flags
                .intersects(ShadowFlags::SHADOW_MASK_ALWAYS | ShadowFlags::SHADOW_MASK_DISTANCE)
        );
    }

    #[test]
    fn shadow_mask_keyword_follows_reservations_and_quality_setting() {
        let mut ledger = ShadowLedger::new();
        let mut light = directional_light();
        light.baking = BakedShadowing::Shadowmask { channel: 0 };
        ledger.reserve_directional(&light, 0, true, 4);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);
        assert!(
            plan.globals
                .flags
                .contains(ShadowFlags::SHADOW_MASK_DISTANCE)
        );

        let mut always = config();
        always.mask_mode = ShadowMaskMode::Always;
        let plan = build_frame_plan(&ledger, &always, &StubCulling::new(), false);
        assert!(plan.globals.flags.contains(ShadowFlags::SHADOW_MASK_ALWAYS));
        assert!(
            !plan
                .globals
                .flags
                .contains(ShadowFlags::SHADOW_MASK_DISTANCE)
        );
    }

    fn spot_light() -> VisibleLight {
        VisibleLight {
            kind: LightKind::Spot,
            ..directional_light()
        }
    }

    fn point_light() -> VisibleLight {
        VisibleLight {
            kind: LightKind::Point,
            ..directional_light()
        }
    }

    #[test]
    fn spot_light_bias_derives_from_projection_scale() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_other(&spot_light(), 4, true);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert_eq!(plan.other_atlas_size, Some(512));
        assert_eq!(plan.slices.len(), 1);
        assert_eq!(plan.slices[0].kind, SliceKind::Spot);

        // One tile: the full 512-texel atlas. The stub projection has a
        // vertical scale of 2.
        let texel_size = 2.0 / (512.0 * 2.0);
        let filter_size = texel_size * 3.0;
        let expected_bias = 0.5 * filter_size * SQRT_2;
        assert_abs_diff_eq!(plan.globals.other_tiles[0].w, expected_bias);

        // Tile bounds inset by half a texel of the atlas.
        let border = 0.5 / 512.0;
        assert_abs_diff_eq!(plan.globals.other_tiles[0].x, border);
        assert_abs_diff_eq!(plan.globals.other_tiles[0].z, 1.0 - 2.0 * border);
    }

    #[test]
    fn point_light_renders_six_faces_with_flipped_second_view_row() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_other(&point_light(), 1, true);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert_eq!(plan.slices.len(), 6);
        for (face_index, slice) in plan.slices.iter().enumerate() {
            assert_eq!(
                slice.kind,
                SliceKind::Face(CubemapFace::all()[face_index])
            );
            // The stub returns m22 = 1, m23 = 0.5, m24 = face index; the
            // plan must negate all three.
            assert_abs_diff_eq!(slice.view.m22, -1.0);
            assert_abs_diff_eq!(slice.view.m23, -0.5);
            assert_abs_diff_eq!(slice.view.m24, -(face_index as f32));
        }

        // Six tiles on a 4x4 grid of 128-texel tiles, row-major.
        assert_eq!(plan.slices[4].viewport, TileViewport { x: 0, y: 128, size: 128 });
    }

    #[test]
    fn mixed_other_lights_occupy_consecutive_slots() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_other(&spot_light(), 0, true);
        ledger.reserve_other(&point_light(), 1, true);
        ledger.reserve_other(&spot_light(), 2, true);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert_eq!(plan.slices.len(), 8);
        assert_eq!(plan.slices[0].kind, SliceKind::Spot);
        assert_eq!(plan.slices[1].kind, SliceKind::Face(CubemapFace::PositiveX));
        assert_eq!(plan.slices[7].kind, SliceKind::Spot);

        // 8 tiles on a 4x4 grid: the trailing spot light sits in slot 7.
        assert_eq!(
            plan.slices[7].viewport,
            TileViewport { x: 3 * 128, y: 128, size: 128 }
        );
    }

    #[test]
    fn atlas_size_vector_covers_both_categories() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_directional(&directional_light(), 0, true, 4);
        ledger.reserve_other(&spot_light(), 1, true);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), false);

        assert_abs_diff_eq!(plan.globals.atlas_size.x, 1024.0);
        assert_abs_diff_eq!(plan.globals.atlas_size.y, 1.0 / 1024.0);
        assert_abs_diff_eq!(plan.globals.atlas_size.z, 512.0);
        assert_abs_diff_eq!(plan.globals.atlas_size.w, 1.0 / 512.0);
    }

    #[test]
    fn reversed_z_projections_store_standard_depth() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_directional(&directional_light(), 0, true, 4);

        let plan = build_frame_plan(&ledger, &config(), &StubCulling::new(), true);

        // With the stub's identity projection and the z row negated, clip
        // z = 1 must land at stored depth 0 in every cascade matrix.
        let m = plan.globals.directional_matrices[0];
        assert_abs_diff_eq!(m.m33 + m.m34, 0.0, epsilon = 1e-6);
    }
}
