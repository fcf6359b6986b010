//! The shadow render pass.
//!
//! Drives one frame of shadow work through a strict two-phase protocol:
//! every visible light that wants shadows is reserved first, then the
//! accepted lights are rendered into the two shared atlases and the
//! shader-global parameter set is uploaded. Reservations hand out atlas
//! tiles, so interleaving them with rendering would corrupt the layout;
//! the phase machine makes such misuse panic instead.

use anyhow::Result;
use std::mem;
use vesper_gpu::{buffer::GPUBuffer, device::GraphicsDevice, wgpu};
use vesper_shadow::{
    MAX_CASCADES, MAX_SHADOWED_DIRECTIONAL_LIGHTS, MAX_SHADOWED_OTHER_LIGHTS,
    config::ShadowConfig,
    frame::{ShadowAtlasKind, ShadowFramePlan, SliceDraw, build_frame_plan},
    ledger::ShadowLedger,
    light::VisibleLight,
    map::ShadowAtlasTexture,
    params::{SLICE_UNIFORM_STRIDE, ShadowGlobalParams, ShadowParams, SliceUniform},
    scene::ShadowCasterCulling,
};

/// Largest number of atlas tiles a frame can draw: every directional cascade
/// plus every point/spot slot.
const MAX_SLICES: usize =
    MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES + MAX_SHADOWED_OTHER_LIGHTS;

/// Where the frame's shadow work currently stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FramePhase {
    /// No frame in flight yet.
    Idle,
    /// Reservations are being accepted.
    Collecting,
    /// The atlases are being rendered.
    Rendering,
    /// Draws are recorded and the global parameters written.
    Uploaded,
    /// The frame's atlas textures have been released.
    Released,
}

impl FramePhase {
    fn begin_collecting(&mut self) {
        assert!(
            matches!(self, Self::Idle | Self::Released),
            "Shadow frame started while the previous frame was still in phase {self:?}"
        );
        *self = Self::Collecting;
    }

    fn require_collecting(&self) {
        assert!(
            *self == Self::Collecting,
            "Shadow reservation outside the collecting phase (phase {self:?})"
        );
    }

    fn begin_rendering(&mut self) {
        assert!(
            *self == Self::Collecting,
            "Shadow rendering requested in phase {self:?}"
        );
        *self = Self::Rendering;
    }

    fn finish_upload(&mut self) {
        assert!(*self == Self::Rendering);
        *self = Self::Uploaded;
    }

    fn require_uploaded(&self) {
        assert!(
            *self == Self::Uploaded,
            "Shadow outputs requested in phase {self:?}"
        );
    }

    fn release(&mut self) {
        self.require_uploaded();
        *self = Self::Released;
    }
}

/// Renderer for the per-frame shadow atlases.
///
/// Owns the reservation ledger, the per-slice and shader-global uniform
/// buffers, and (for the duration of a frame) the two atlas textures. The
/// per-frame protocol is `begin_frame` -> `reserve_*` for every visible
/// light -> `render` -> consume outputs -> `end_frame`.
#[derive(Debug)]
pub struct ShadowRenderer {
    ledger: ShadowLedger,
    phase: FramePhase,
    config: ShadowConfig,
    slice_uniforms: GPUBuffer,
    slice_bind_group_layout: wgpu::BindGroupLayout,
    slice_bind_group: wgpu::BindGroup,
    global_params: GPUBuffer,
    global_bind_group_layout: wgpu::BindGroupLayout,
    global_bind_group: wgpu::BindGroup,
    directional_atlas: Option<ShadowAtlasTexture>,
    other_atlas: Option<ShadowAtlasTexture>,
}

impl ShadowRenderer {
    /// The bind group index caster pipelines use for the per-slice uniforms.
    pub const SLICE_BIND_GROUP_INDEX: u32 = 0;

    /// Creates a shadow renderer for the given device.
    ///
    /// # Panics
    /// If the device requires uniform offsets coarser than the slice
    /// uniform stride.
    pub fn new(graphics_device: &GraphicsDevice) -> Self {
        assert!(
            graphics_device.uniform_offset_alignment() as usize <= SLICE_UNIFORM_STRIDE,
            "Device uniform offset alignment exceeds the slice uniform stride"
        );

        let device = graphics_device.device();

        let slice_uniforms = GPUBuffer::new_uniform_with_capacity(
            graphics_device,
            MAX_SLICES * SLICE_UNIFORM_STRIDE,
            "Shadow slice uniforms".into(),
        );

        let slice_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(SLICE_UNIFORM_STRIDE as u64),
                    },
                    count: None,
                }],
                label: Some("Shadow slice uniform bind group layout"),
            });

        let slice_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &slice_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: slice_uniforms.buffer(),
                    offset: 0,
                    size: wgpu::BufferSize::new(SLICE_UNIFORM_STRIDE as u64),
                }),
            }],
            label: Some("Shadow slice uniform bind group"),
        });

        let global_params = GPUBuffer::new_uniform(
            graphics_device,
            bytemuck::bytes_of(&ShadowGlobalParams::new()),
            "Shadow global parameters".into(),
        );

        let global_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            mem::size_of::<ShadowGlobalParams>() as u64,
                        ),
                    },
                    count: None,
                }],
                label: Some("Shadow global parameter bind group layout"),
            });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &global_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_params.buffer().as_entire_binding(),
            }],
            label: Some("Shadow global parameter bind group"),
        });

        Self {
            ledger: ShadowLedger::new(),
            phase: FramePhase::Idle,
            config: ShadowConfig::default(),
            slice_uniforms,
            slice_bind_group_layout,
            slice_bind_group,
            global_params,
            global_bind_group_layout,
            global_bind_group,
            directional_atlas: None,
            other_atlas: None,
        }
    }

    /// Starts a new frame of shadow work with the given (already validated)
    /// configuration, resetting the reservation ledger.
    pub fn begin_frame(&mut self, config: &ShadowConfig) {
        self.phase.begin_collecting();
        self.config = config.clone();
        self.ledger.reset();
    }

    /// Requests real-time shadow capacity for a visible directional light.
    ///
    /// Always returns a usable descriptor; rejected lights degrade to the
    /// baked-mask or inert encoding.
    pub fn reserve_directional_shadows(
        &mut self,
        culling: &impl ShadowCasterCulling,
        light: &VisibleLight,
        visible_light_index: u32,
    ) -> ShadowParams {
        self.phase.require_collecting();
        let has_casters = culling.shadow_casters_in_bounds(visible_light_index);
        self.ledger.reserve_directional(
            light,
            visible_light_index,
            has_casters,
            self.config.directional.cascade_count,
        )
    }

    /// Requests real-time shadow capacity for a visible point or spot light.
    pub fn reserve_other_shadows(
        &mut self,
        culling: &impl ShadowCasterCulling,
        light: &VisibleLight,
        visible_light_index: u32,
    ) -> ShadowParams {
        self.phase.require_collecting();
        let has_casters = culling.shadow_casters_in_bounds(visible_light_index);
        self.ledger
            .reserve_other(light, visible_light_index, has_casters)
    }

    /// Renders the accepted lights into the two atlases and uploads the
    /// shader-global parameter set.
    ///
    /// `draw_casters` is invoked once per atlas tile with its render pass
    /// configured (viewport, scissor and slice uniforms bound); it records
    /// the depth draws for the slice's shadow casters.
    ///
    /// # Errors
    /// Propagates failures from `draw_casters`.
    pub fn render(
        &mut self,
        graphics_device: &GraphicsDevice,
        command_encoder: &mut wgpu::CommandEncoder,
        culling: &impl ShadowCasterCulling,
        draw_casters: &mut impl FnMut(&SliceDraw, &mut wgpu::RenderPass<'_>) -> Result<()>,
    ) -> Result<()> {
        self.phase.begin_rendering();

        let plan = build_frame_plan(
            &self.ledger,
            &self.config,
            culling,
            graphics_device.uses_reversed_z(),
        );

        self.write_slice_uniforms(graphics_device, &plan);

        self.directional_atlas = Some(match plan.directional_atlas_size {
            Some(resolution) => {
                ShadowAtlasTexture::new(graphics_device, resolution, "Directional shadow atlas")
            }
            None => ShadowAtlasTexture::dummy(graphics_device, "Directional shadow atlas (dummy)"),
        });
        self.other_atlas = Some(match plan.other_atlas_size {
            Some(resolution) => {
                ShadowAtlasTexture::new(graphics_device, resolution, "Other shadow atlas")
            }
            None => ShadowAtlasTexture::dummy(graphics_device, "Other shadow atlas (dummy)"),
        });

        // Cleared to the far-plane depth so untouched tiles read unshadowed.
        let clear_depth = if graphics_device.uses_reversed_z() {
            0.0
        } else {
            1.0
        };

        let mut recorded_slice_count = 0;

        for (atlas_kind, atlas, label) in [
            (
                ShadowAtlasKind::Directional,
                self.directional_atlas.as_ref().unwrap(),
                "Directional shadow atlas pass",
            ),
            (
                ShadowAtlasKind::Other,
                self.other_atlas.as_ref().unwrap(),
                "Other shadow atlas pass",
            ),
        ] {
            let mut render_pass = command_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[],
                depth_stencil_attachment: Some(atlas.depth_attachment(clear_depth)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (slice_index, slice) in plan
                .slices
                .iter()
                .enumerate()
                .filter(|(_, slice)| slice.atlas == atlas_kind)
            {
                let viewport = slice.viewport;
                render_pass.set_viewport(
                    viewport.x as f32,
                    viewport.y as f32,
                    viewport.size as f32,
                    viewport.size as f32,
                    0.0,
                    1.0,
                );
                render_pass.set_scissor_rect(viewport.x, viewport.y, viewport.size, viewport.size);

                render_pass.set_bind_group(
                    Self::SLICE_BIND_GROUP_INDEX,
                    &self.slice_bind_group,
                    &[(slice_index * SLICE_UNIFORM_STRIDE) as u32],
                );

                draw_casters(slice, &mut render_pass)?;
                recorded_slice_count += 1;
            }
        }

        self.global_params
            .update(graphics_device, 0, bytemuck::bytes_of(&plan.globals));

        vesper_log::trace!(
            "Recorded shadow atlas passes for {} directional and {} other lights ({} slices)",
            self.ledger.directional_lights().len(),
            self.ledger.other_lights().len(),
            recorded_slice_count
        );

        self.phase.finish_upload();
        Ok(())
    }

    /// Releases the frame-scoped atlas textures.
    pub fn end_frame(&mut self) {
        self.phase.release();
        self.directional_atlas = None;
        self.other_atlas = None;
    }

    /// The directional shadow atlas of the current frame.
    ///
    /// # Panics
    /// If the frame has not been rendered yet or was already released.
    pub fn directional_atlas(&self) -> &ShadowAtlasTexture {
        self.phase.require_uploaded();
        self.directional_atlas.as_ref().unwrap()
    }

    /// The point/spot shadow atlas of the current frame.
    ///
    /// # Panics
    /// If the frame has not been rendered yet or was already released.
    pub fn other_atlas(&self) -> &ShadowAtlasTexture {
        self.phase.require_uploaded();
        self.other_atlas.as_ref().unwrap()
    }

    /// The bind group layout caster pipelines declare for the per-slice
    /// uniforms.
    pub fn slice_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.slice_bind_group_layout
    }

    /// The bind group layout the shading pass declares for the shader-global
    /// shadow parameters.
    pub fn global_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.global_bind_group_layout
    }

    /// The bind group holding the uploaded shader-global shadow parameters.
    pub fn global_bind_group(&self) -> &wgpu::BindGroup {
        &self.global_bind_group
    }

    /// The reservation ledger of the current frame.
    pub fn ledger(&self) -> &ShadowLedger {
        &self.ledger
    }

    fn write_slice_uniforms(&self, graphics_device: &GraphicsDevice, plan: &ShadowFramePlan) {
        for (slice_index, slice) in plan.slices.iter().enumerate() {
            let uniform = SliceUniform::new(
                slice.light_from_world(),
                slice.slope_scale_bias,
                // Caster pancaking only works for the orthographic
                // directional projections.
                slice.atlas == ShadowAtlasKind::Directional,
            );
            self.slice_uniforms.update(
                graphics_device,
                slice_index * SLICE_UNIFORM_STRIDE,
                bytemuck::bytes_of(&uniform),
            );
        }
    }
}
