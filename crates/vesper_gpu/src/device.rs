//! Graphics device management.

/// Wrapper for the WGPU device and queue together with the device
/// capabilities the renderer consults when deriving projection data.
#[derive(Debug)]
pub struct GraphicsDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    uses_reversed_z: bool,
}

impl GraphicsDevice {
    /// Wraps the given device and queue.
    ///
    /// `uses_reversed_z` declares the depth convention of the projection
    /// matrices the surrounding application produces for this device: when
    /// set, clip-space depth runs from 1 at the near plane to 0 at the far
    /// plane.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, uses_reversed_z: bool) -> Self {
        Self {
            device,
            queue,
            uses_reversed_z,
        }
    }

    /// Returns the underlying [`wgpu::Device`].
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns the underlying [`wgpu::Queue`].
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Whether projection matrices produced for this device map the near
    /// plane to depth 1 and the far plane to depth 0.
    pub fn uses_reversed_z(&self) -> bool {
        self.uses_reversed_z
    }

    /// The required alignment of dynamic uniform buffer offsets on this
    /// device.
    pub fn uniform_offset_alignment(&self) -> u32 {
        self.device.limits().min_uniform_buffer_offset_alignment
    }
}
