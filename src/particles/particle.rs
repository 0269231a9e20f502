//! Particle data structures.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// A single simulated particle.
///
/// Particles are plain value records stored in one contiguous sequence;
/// nothing holds references to individual particles. Steady-state particles
/// respawn in place when their life runs out, so the population size stays
/// constant. Burst particles carry an expiry time instead and are swept out
/// of the sequence once it passes.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// Position in backing-store pixels.
    pub position: Vec2,
    /// Velocity in backing-store pixels per tick.
    pub velocity: Vec2,
    /// Render radius in pixels.
    pub size: f32,
    /// Palette color (RGB), fixed for the particle's life.
    pub color: [u8; 3],
    /// Current opacity in `[0, 1]`, derived from the life-cycle phase.
    pub alpha: f32,
    /// Age in ticks; advances by `dt * 60` per frame.
    pub life: f32,
    /// Age at which the particle respawns (or, for bursts, fades out).
    pub max_life: f32,
    /// Phase of the per-particle turbulence oscillator.
    pub oscillation: f32,
    /// Phase advance per tick.
    pub oscillation_speed: f32,
    /// Simulation time at which this particle is removed. `None` for the
    /// steady-state population, `Some` for burst particles.
    pub expires_at: Option<f32>,
}

impl Particle {
    /// Whether this particle belongs to a transient burst.
    #[inline]
    pub fn is_burst(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Opacity envelope: a half-sine over the life cycle, zero at birth and
    /// death, peaking at midlife.
    #[inline]
    pub fn life_alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        let phase = (self.life / self.max_life).clamp(0.0, 1.0);
        (phase * std::f32::consts::PI).sin().clamp(0.0, 1.0)
    }
}

/// Per-particle data uploaded to the GPU instance stream.
/// Layout matches the vertex attributes in `shaders/particles.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ParticleInstance {
    /// Position in backing-store pixels.
    pub position: [f32; 2],
    /// Color (RGB, normalized to `[0, 1]`).
    pub color: [f32; 3],
    /// Render radius in pixels.
    pub size: f32,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
}

impl From<&Particle> for ParticleInstance {
    fn from(p: &Particle) -> Self {
        Self {
            position: [p.position.x, p.position.y],
            color: [
                p.color[0] as f32 / 255.0,
                p.color[1] as f32 / 255.0,
                p.color[2] as f32 / 255.0,
            ],
            size: p.size,
            alpha: p.alpha,
        }
    }
}
