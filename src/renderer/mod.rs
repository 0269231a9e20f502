//! Rendering backends for the particle field.
//!
//! The backend is chosen once at engine initialization: the wgpu path when a
//! context and pipeline come up cleanly, the software rasterizer otherwise.
//! Frame code talks only to the [`ParticleRenderer`] trait.

mod gpu;
mod software;

pub use gpu::GpuRenderer;
pub use software::SoftwareRenderer;

use thiserror::Error;

use crate::particles::Particle;

/// Which backend an engine ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Accelerated wgpu point-sprite pipeline.
    Gpu,
    /// Headless CPU rasterizer.
    Software,
}

/// Per-frame parameters shared by both backends.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    /// Simulation time in seconds, drives the glow pulse.
    pub time: f32,
    /// Pointer position in backing-store pixels.
    pub mouse: [f32; 2],
    /// Whether the glow pulse is applied.
    pub glow: bool,
}

/// Errors surfaced from a frame draw.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The wgpu surface could not provide a texture.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// A rendering backend for the particle field.
///
/// Dropping a renderer releases everything it holds (GPU buffers and
/// pipeline on the accelerated path, the frame buffer on the software path).
pub trait ParticleRenderer {
    /// Push the current particle state to the backend.
    fn upload(&mut self, particles: &[Particle]);

    /// Clear the surface and draw every uploaded particle.
    fn render(&mut self, params: &FrameParams) -> Result<(), RenderError>;

    /// Resize the rendering surface to new backing-store dimensions.
    fn resize(&mut self, width: u32, height: u32);

    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// The rendered RGBA8 frame, for backends that draw into host-visible
    /// memory. The accelerated path presents directly and returns `None`.
    fn frame_data(&self) -> Option<&[u8]> {
        None
    }
}
