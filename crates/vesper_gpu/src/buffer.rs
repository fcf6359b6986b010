//! GPU buffers for rendering.

use crate::device::GraphicsDevice;
use std::borrow::Cow;
use wgpu::util::DeviceExt;

/// A buffer of bytes residing on the GPU.
#[derive(Debug)]
pub struct GPUBuffer {
    buffer: wgpu::Buffer,
    buffer_size: usize,
    label: Cow<'static, str>,
}

impl GPUBuffer {
    /// Creates a uniform buffer initialized with the given bytes.
    ///
    /// # Panics
    /// If `bytes` is empty.
    pub fn new_uniform(
        graphics_device: &GraphicsDevice,
        bytes: &[u8],
        label: Cow<'static, str>,
    ) -> Self {
        assert!(!bytes.is_empty(), "Tried to create empty uniform buffer");

        let buffer_label = format!("{label} GPU buffer");
        let buffer =
            graphics_device
                .device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    contents: bytes,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    label: Some(&buffer_label),
                });

        Self {
            buffer,
            buffer_size: bytes.len(),
            label,
        }
    }

    /// Creates an uninitialized uniform buffer with room for the given number
    /// of bytes.
    ///
    /// # Panics
    /// If `buffer_size` is zero.
    pub fn new_uniform_with_capacity(
        graphics_device: &GraphicsDevice,
        buffer_size: usize,
        label: Cow<'static, str>,
    ) -> Self {
        assert_ne!(buffer_size, 0, "Tried to create empty uniform buffer");

        let buffer_label = format!("{label} GPU buffer");
        let buffer = graphics_device
            .device()
            .create_buffer(&wgpu::BufferDescriptor {
                size: buffer_size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
                label: Some(&buffer_label),
            });

        Self {
            buffer,
            buffer_size,
            label,
        }
    }

    /// Queues a write of the given bytes to the buffer, starting at the given
    /// byte offset.
    ///
    /// # Panics
    /// If the write would exceed the size of the buffer.
    pub fn update(&self, graphics_device: &GraphicsDevice, byte_offset: usize, bytes: &[u8]) {
        assert!(
            byte_offset + bytes.len() <= self.buffer_size,
            "Write of {} bytes at offset {} exceeds size of {} buffer ({} bytes)",
            bytes.len(),
            byte_offset,
            &self.label,
            self.buffer_size
        );
        graphics_device
            .queue()
            .write_buffer(&self.buffer, byte_offset as u64, bytes);
    }

    /// Returns the underlying [`wgpu::Buffer`].
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Returns the size of the buffer in bytes.
    pub fn size(&self) -> usize {
        self.buffer_size
    }
}
