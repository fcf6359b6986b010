//! Abstractions for GPU interaction.

pub mod buffer;
pub mod device;

pub use wgpu;
