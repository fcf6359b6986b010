//! Render-command recording for the Vesper renderer.

pub mod shadow;

pub use shadow::ShadowRenderer;
