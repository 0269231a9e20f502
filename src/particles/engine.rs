//! The particle field engine.
//!
//! Composes the simulation, a rendering backend, and a clock, and exposes
//! the host-facing operations: per-frame advance, pointer input, bursts,
//! reconfiguration, pause/resume, and teardown. The host owns event-listener
//! wiring and calls the matching method for each signal.

use glam::Vec2;
use thiserror::Error;

use super::config::{ConfigUpdate, FieldConfig};
use super::simulation::Simulation;
use crate::core::{Clock, Context};
use crate::renderer::{
    Backend, FrameParams, GpuRenderer, ParticleRenderer, RenderError, SoftwareRenderer,
};

/// Default number of particles spawned by a burst.
pub const DEFAULT_BURST_COUNT: usize = 50;

/// Errors from engine construction.
#[derive(Error, Debug)]
pub enum FieldError {
    /// The requested surface has a zero dimension.
    #[error("surface dimensions must be non-zero ({width}x{height})")]
    ZeroSizedSurface {
        /// Requested width in CSS pixels.
        width: u32,
        /// Requested height in CSS pixels.
        height: u32,
    },
}

/// A fixed-population 2D particle field.
///
/// One engine owns one rendering surface. The backend is chosen once during
/// construction: the wgpu pipeline when context and shaders come up, the
/// software rasterizer otherwise. All methods are cheap and safe to call
/// from host event handlers between frames.
pub struct ParticleField {
    simulation: Simulation,
    renderer: Option<Box<dyn ParticleRenderer>>,
    clock: Clock,
    /// Device pixel ratio; page coordinates are scaled by this into
    /// backing-store space.
    scale_factor: f32,
    running: bool,
    destroyed: bool,
}

impl ParticleField {
    /// Create an engine attached to a window surface.
    ///
    /// `width` and `height` are CSS pixels; the backing store is scaled by
    /// `scale_factor`. A missing adapter, device failure, or shader
    /// validation error is not fatal: the engine logs the diagnostic and
    /// comes up on the software backend instead.
    pub async fn attach<W>(
        window: W,
        width: u32,
        height: u32,
        scale_factor: f32,
        config: FieldConfig,
    ) -> Result<Self, FieldError>
    where
        W: Into<wgpu::SurfaceTarget<'static>>,
    {
        let (backing_width, backing_height) =
            Self::backing_dimensions(width, height, scale_factor)?;

        let renderer: Box<dyn ParticleRenderer> =
            match Context::new(window, backing_width, backing_height).await {
                Ok(context) => match GpuRenderer::new(context).await {
                    Ok(gpu) => Box::new(gpu),
                    Err(error) => {
                        log::warn!("shader setup failed, using software renderer: {error}");
                        Box::new(SoftwareRenderer::new(backing_width, backing_height))
                    }
                },
                Err(error) => {
                    log::warn!("no GPU context, using software renderer: {error}");
                    Box::new(SoftwareRenderer::new(backing_width, backing_height))
                }
            };

        log::info!(
            "particle field up on {:?} backend, {} particles",
            renderer.backend(),
            config.particle_count
        );

        Ok(Self::assemble(
            renderer,
            config,
            backing_width,
            backing_height,
            scale_factor,
        ))
    }

    /// Create an engine on the software backend without any window.
    /// Used for display-free hosts and tests.
    pub fn headless(
        width: u32,
        height: u32,
        scale_factor: f32,
        config: FieldConfig,
    ) -> Result<Self, FieldError> {
        let (backing_width, backing_height) =
            Self::backing_dimensions(width, height, scale_factor)?;
        let renderer = Box::new(SoftwareRenderer::new(backing_width, backing_height));
        Ok(Self::assemble(
            renderer,
            config,
            backing_width,
            backing_height,
            scale_factor,
        ))
    }

    fn backing_dimensions(
        width: u32,
        height: u32,
        scale_factor: f32,
    ) -> Result<(u32, u32), FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::ZeroSizedSurface { width, height });
        }
        let scale = scale_factor.max(0.1);
        Ok((
            ((width as f32 * scale) as u32).max(1),
            ((height as f32 * scale) as u32).max(1),
        ))
    }

    fn assemble(
        renderer: Box<dyn ParticleRenderer>,
        config: FieldConfig,
        backing_width: u32,
        backing_height: u32,
        scale_factor: f32,
    ) -> Self {
        Self {
            simulation: Simulation::new(config, backing_width as f32, backing_height as f32),
            renderer: Some(renderer),
            clock: Clock::start_new(),
            scale_factor: scale_factor.max(0.1),
            running: true,
            destroyed: false,
        }
    }

    /// Advance one frame using the engine's own clock.
    ///
    /// Call once per host animation frame. A no-op while paused or after
    /// [`destroy`](Self::destroy).
    pub fn frame(&mut self) -> Result<(), RenderError> {
        let dt = self.clock.get_delta() as f32;
        self.advance(dt)
    }

    /// Advance one frame by an explicit delta, for hosts that carry their
    /// own frame timestamps.
    pub fn advance(&mut self, dt: f32) -> Result<(), RenderError> {
        if !self.running || self.destroyed {
            return Ok(());
        }

        self.simulation.step(dt);

        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        renderer.upload(self.simulation.particles());

        let mouse = self.simulation.mouse();
        let params = FrameParams {
            time: self.simulation.time(),
            mouse: [mouse.x, mouse.y],
            glow: self.simulation.config().glow_effect,
        };

        match renderer.render(&params) {
            Ok(()) => Ok(()),
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                // The GPU path is gone for good; finish the engine's life on
                // the software rasterizer.
                log::error!("surface out of memory, degrading to software renderer");
                let (width, height) = self.backing_size();
                self.renderer = Some(Box::new(SoftwareRenderer::new(width, height)));
                Ok(())
            }
            Err(error) => {
                log::warn!("frame dropped: {error}");
                Ok(())
            }
        }
    }

    /// Record the pointer position in page coordinates.
    /// Ignored when the configuration is not interactive.
    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        if self.destroyed || !self.simulation.config().interactive {
            return;
        }
        self.simulation
            .set_mouse(Vec2::new(x, y) * self.scale_factor);
    }

    /// Spawn a transient burst radiating from `(x, y)` in page coordinates.
    /// Off-screen coordinates are legal; the extra particles animate and
    /// wrap like any others until they expire.
    pub fn add_particles_burst(&mut self, x: f32, y: f32, count: usize) {
        if self.destroyed {
            return;
        }
        self.simulation
            .burst(Vec2::new(x, y) * self.scale_factor, count);
    }

    /// Spawn a burst with the default particle count.
    pub fn add_particles_burst_default(&mut self, x: f32, y: f32) {
        self.add_particles_burst(x, y, DEFAULT_BURST_COUNT);
    }

    /// Merge a partial update into the configuration and replace it
    /// wholesale. A changed `particle_count` regenerates the population
    /// immediately with fresh random positions.
    pub fn update_config(&mut self, update: ConfigUpdate) {
        if self.destroyed {
            return;
        }
        let next = self.simulation.config().merged(update);
        self.simulation.apply_config(next);
    }

    /// Resize the surface to new CSS-pixel dimensions. Particles stranded
    /// beyond the new extent are redistributed in bounds.
    pub fn handle_resize(&mut self, width: u32, height: u32, scale_factor: f32) {
        if self.destroyed || width == 0 || height == 0 {
            return;
        }
        self.scale_factor = scale_factor.max(0.1);
        let backing_width = ((width as f32 * self.scale_factor) as u32).max(1);
        let backing_height = ((height as f32 * self.scale_factor) as u32).max(1);
        self.simulation
            .resize(backing_width as f32, backing_height as f32);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(backing_width, backing_height);
        }
    }

    /// Stop the per-frame loop. Idempotent.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Restart the per-frame loop. A no-op on an already-running engine.
    pub fn resume(&mut self) {
        if self.running || self.destroyed {
            return;
        }
        self.running = true;
        // Exclude the paused interval from the next frame's delta.
        self.clock.discard_delta();
    }

    /// Map page visibility onto pause/resume.
    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Tear the engine down: stop the loop, release the rendering backend
    /// and its GPU objects, and empty the particle sequence. Safe to call
    /// multiple times.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.running = false;
        self.renderer = None;
        self.simulation.clear();
    }

    /// Whether the frame loop is active.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running && !self.destroyed
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The selected backend, `None` after destruction.
    pub fn backend(&self) -> Option<Backend> {
        self.renderer.as_ref().map(|r| r.backend())
    }

    /// Total population, bursts included.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.simulation.len()
    }

    /// The current configuration.
    #[inline]
    pub fn config(&self) -> &FieldConfig {
        self.simulation.config()
    }

    /// The software backend's rendered frame, if that is the active
    /// backend. The host blits this into its own surface.
    pub fn frame_data(&self) -> Option<&[u8]> {
        self.renderer.as_ref().and_then(|r| r.frame_data())
    }

    fn backing_size(&self) -> (u32, u32) {
        // Simulation extent is authoritative once constructed.
        let (width, height) = self.simulation.extent();
        (width as u32, height as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::config::FieldPreset;
    use crate::particles::simulation::BURST_LIFETIME_SECS;

    const DT: f32 = 1.0 / 60.0;

    fn field() -> ParticleField {
        ParticleField::headless(800, 600, 1.0, FieldConfig::default()).unwrap()
    }

    #[test]
    fn test_headless_uses_software_backend() {
        let field = field();
        assert_eq!(field.backend(), Some(Backend::Software));
        assert!(field.frame_data().is_some());
    }

    #[test]
    fn test_zero_sized_surface_is_rejected() {
        assert!(ParticleField::headless(0, 600, 1.0, FieldConfig::default()).is_err());
    }

    #[test]
    fn test_default_population() {
        let field = field();
        assert_eq!(field.particle_count(), 500);
    }

    #[test]
    fn test_burst_then_baseline() {
        let mut field = field();
        field.add_particles_burst_default(100.0, 100.0);
        assert_eq!(field.particle_count(), 550);
        let frames = (BURST_LIFETIME_SECS / DT) as usize + 2;
        for _ in 0..frames {
            field.advance(DT).unwrap();
        }
        assert_eq!(field.particle_count(), 500);
    }

    #[test]
    fn test_burst_survives_pause_cycles() {
        let mut field = field();
        field.add_particles_burst(100.0, 100.0, 50);
        field.pause();
        field.advance(DT).unwrap(); // no-op while paused
        assert_eq!(field.particle_count(), 550);
        field.resume();
        let frames = (BURST_LIFETIME_SECS / DT) as usize + 2;
        for _ in 0..frames {
            field.advance(DT).unwrap();
        }
        assert_eq!(field.particle_count(), 500);
    }

    #[test]
    fn test_pause_stops_stepping() {
        let mut field = field();
        field.pause();
        assert!(!field.is_running());
        field.advance(DT).unwrap();
        // Bursts are only swept during a step, so the count is unchanged.
        field.add_particles_burst(0.0, 0.0, 10);
        field.advance(1000.0).unwrap();
        assert_eq!(field.particle_count(), 510);
    }

    #[test]
    fn test_resume_is_idempotent() {
        let mut field = field();
        field.resume();
        field.resume();
        assert!(field.is_running());
        field.pause();
        field.resume();
        field.resume();
        assert!(field.is_running());
    }

    #[test]
    fn test_visibility_maps_to_pause_resume() {
        let mut field = field();
        field.set_visible(false);
        assert!(!field.is_running());
        field.set_visible(true);
        assert!(field.is_running());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut field = field();
        field.destroy();
        field.destroy();
        assert!(field.is_destroyed());
        assert_eq!(field.particle_count(), 0);
        assert_eq!(field.backend(), None);
        // Every operation is a safe no-op afterwards.
        field.advance(DT).unwrap();
        field.add_particles_burst(0.0, 0.0, 10);
        field.set_mouse_position(1.0, 1.0);
        field.resume();
        assert!(!field.is_running());
        assert_eq!(field.particle_count(), 0);
    }

    #[test]
    fn test_mouse_scaled_by_device_pixel_ratio() {
        let mut field = ParticleField::headless(800, 600, 2.0, FieldConfig::default()).unwrap();
        field.set_mouse_position(10.0, 20.0);
        assert_eq!(field.simulation.mouse(), glam::Vec2::new(20.0, 40.0));
    }

    #[test]
    fn test_mouse_ignored_when_not_interactive() {
        let config = FieldConfig {
            interactive: false,
            ..FieldConfig::default()
        };
        let mut field = ParticleField::headless(800, 600, 1.0, config).unwrap();
        let before = field.simulation.mouse();
        field.set_mouse_position(10.0, 20.0);
        assert_eq!(field.simulation.mouse(), before);
    }

    #[test]
    fn test_update_config_changes_population() {
        let mut field = field();
        field.update_config(ConfigUpdate::count(42));
        assert_eq!(field.particle_count(), 42);
        assert_eq!(field.config().particle_count, 42);
    }

    #[test]
    fn test_resize_updates_backing_store() {
        let mut field = field();
        field.handle_resize(400, 300, 2.0);
        assert_eq!(field.backing_size(), (800, 600));
        field.advance(DT).unwrap();
        assert_eq!(field.frame_data().unwrap().len(), 800 * 600 * 4);
    }

    #[test]
    fn test_preset_construction() {
        let field =
            ParticleField::headless(800, 600, 1.0, FieldPreset::Minimal.config()).unwrap();
        assert_eq!(field.particle_count(), 150);
    }

    #[test]
    fn test_frames_render_particles() {
        let mut field = field();
        // Let alpha envelopes climb off zero.
        for _ in 0..30 {
            field.advance(DT).unwrap();
        }
        let lit = field
            .frame_data()
            .unwrap()
            .iter()
            .filter(|&&b| b > 0)
            .count();
        assert!(lit > 0, "expected rendered pixels after 30 frames");
    }
}
