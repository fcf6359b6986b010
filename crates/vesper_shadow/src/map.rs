//! Textures backing the shadow atlases.

use vesper_gpu::{device::GraphicsDevice, wgpu};

/// Texture format of both shadow atlases.
pub const SHADOW_ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A depth texture holding one frame's shadow atlas for one light category,
/// with the sampling state the shading pass binds.
///
/// Atlas textures are frame-scoped: the renderer allocates them when the
/// atlas is rendered and drops them when the frame's shadow work is
/// released. A category with no accepted lights still gets a cleared 1x1
/// texture so the shading pass always has a valid depth texture of the
/// expected format to sample.
#[derive(Debug)]
pub struct ShadowAtlasTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl ShadowAtlasTexture {
    /// The binding location of the atlas texture.
    pub const fn texture_binding() -> u32 {
        0
    }
    /// The binding location of the atlas comparison sampler.
    pub const fn sampler_binding() -> u32 {
        1
    }

    /// Creates a new shadow atlas texture with the given width and height in
    /// texels.
    pub fn new(graphics_device: &GraphicsDevice, resolution: u32, label: &str) -> Self {
        let device = graphics_device.device();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_ATLAS_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            label: Some(label),
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = create_atlas_sampler(device);

        let bind_group_layout = Self::create_bind_group_layout(device);
        let bind_group = Self::create_bind_group(device, &bind_group_layout, &view, &sampler);

        Self {
            texture,
            view,
            sampler,
            bind_group_layout,
            bind_group,
        }
    }

    /// Creates the 1x1 dummy texture bound when a category has no accepted
    /// lights.
    pub fn dummy(graphics_device: &GraphicsDevice, label: &str) -> Self {
        Self::new(graphics_device, 1, label)
    }

    /// Returns the width and height of the atlas in texels.
    pub fn resolution(&self) -> u32 {
        self.texture.width()
    }

    /// Returns a view into the full atlas texture.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Returns the comparison sampler for the atlas.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Returns a reference to the bind group layout for the atlas texture
    /// and its sampler.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Returns a reference to the bind group for the atlas texture and its
    /// sampler.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// The depth attachment clearing and writing the atlas for this frame.
    pub fn depth_attachment(&self, clear_depth: f32) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_depth),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    /// Creates the bind group layout for a shadow atlas texture and its
    /// comparison sampler.
    pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: Self::texture_binding(),
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: Self::sampler_binding(),
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("Shadow atlas bind group layout"),
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: Self::texture_binding(),
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: Self::sampler_binding(),
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("Shadow atlas bind group"),
        })
    }
}

fn create_atlas_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}
