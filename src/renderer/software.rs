//! Software rendering backend.
//!
//! A plain CPU rasterizer used when no GPU context can be acquired. Each
//! particle is drawn as a radial-gradient-filled disc straight from the
//! uploaded state into an RGBA8 frame buffer; the host blits the result.
//! Also serves as the display-free backend for engine tests.

use super::{Backend, FrameParams, ParticleRenderer, RenderError};
use crate::particles::{Particle, ParticleInstance};

/// The fallback backend. Owns its frame buffer; no external resources.
pub struct SoftwareRenderer {
    width: u32,
    height: u32,
    /// RGBA8 pixels, `width * height * 4` bytes.
    frame: Vec<u8>,
    instances: Vec<ParticleInstance>,
}

impl SoftwareRenderer {
    /// Create a renderer for the given backing-store dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            frame: vec![0; (width * height * 4) as usize],
            instances: Vec::new(),
        }
    }

    /// The rendered frame as RGBA8 pixels (premultiplied alpha).
    #[inline]
    pub fn frame_data(&self) -> &[u8] {
        &self.frame
    }

    /// Frame dimensions in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_disc(&mut self, instance: &ParticleInstance, pulse: f32) {
        let radius = instance.size.max(0.5);
        let alpha = (instance.alpha * pulse).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        let cx = instance.position[0];
        let cy = instance.position[1];
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as i64).clamp(0, self.width as i64) as u32;
        let y1 = ((cy + radius).ceil() as i64).clamp(0, self.height as i64) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() / radius;
                if d > 1.0 {
                    continue;
                }
                // Radial gradient: opaque center fading to the rim.
                let falloff = (1.0 - d) * (1.0 - d);
                let a = alpha * falloff;
                let index = ((y * self.width + x) * 4) as usize;
                for channel in 0..3 {
                    let src = instance.color[channel] * a * 255.0;
                    let dst = self.frame[index + channel] as f32;
                    self.frame[index + channel] = (src + dst * (1.0 - a)).min(255.0) as u8;
                }
                let dst_a = self.frame[index + 3] as f32;
                self.frame[index + 3] = (a * 255.0 + dst_a * (1.0 - a)).min(255.0) as u8;
            }
        }
    }
}

impl ParticleRenderer for SoftwareRenderer {
    fn upload(&mut self, particles: &[Particle]) {
        self.instances.clear();
        self.instances
            .extend(particles.iter().map(ParticleInstance::from));
    }

    fn render(&mut self, params: &FrameParams) -> Result<(), RenderError> {
        self.frame.fill(0);

        let instances = std::mem::take(&mut self.instances);
        for instance in &instances {
            let pulse = if params.glow {
                0.85 + 0.15
                    * (params.time * 2.0
                        + instance.position[0] * 0.01
                        + instance.position[1] * 0.013)
                        .sin()
            } else {
                1.0
            };
            self.draw_disc(instance, pulse);
        }
        self.instances = instances;

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.frame = vec![0; (self.width * self.height * 4) as usize];
    }

    fn backend(&self) -> Backend {
        Backend::Software
    }

    fn frame_data(&self) -> Option<&[u8]> {
        Some(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            size: 4.0,
            color: [255, 255, 255],
            alpha: 1.0,
            life: 50.0,
            max_life: 100.0,
            oscillation: 0.0,
            oscillation_speed: 0.0,
            expires_at: None,
        }
    }

    fn frame_params() -> FrameParams {
        FrameParams {
            time: 0.0,
            mouse: [f32::MIN, f32::MIN],
            glow: false,
        }
    }

    #[test]
    fn test_frame_buffer_dimensions() {
        let renderer = SoftwareRenderer::new(64, 32);
        assert_eq!(renderer.frame_data().len(), 64 * 32 * 4);
    }

    #[test]
    fn test_draws_pixels_at_particle_center() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.upload(&[particle_at(32.0, 32.0)]);
        renderer.render(&frame_params()).unwrap();
        let index = ((32 * 64 + 32) * 4) as usize;
        assert!(renderer.frame_data()[index] > 0);
        assert!(renderer.frame_data()[index + 3] > 0);
    }

    #[test]
    fn test_clears_between_frames() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.upload(&[particle_at(32.0, 32.0)]);
        renderer.render(&frame_params()).unwrap();
        renderer.upload(&[]);
        renderer.render(&frame_params()).unwrap();
        assert!(renderer.frame_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_offscreen_particle_is_clipped() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.upload(&[particle_at(-500.0, -500.0)]);
        renderer.render(&frame_params()).unwrap();
        assert!(renderer.frame_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_reallocates_frame() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.resize(128, 16);
        assert_eq!(renderer.frame_data().len(), 128 * 16 * 4);
        assert_eq!(renderer.dimensions(), (128, 16));
    }
}
