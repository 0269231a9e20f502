//! CPU particle simulation.
//!
//! One `step` per host frame: turbulence, pointer repulsion, integration,
//! toroidal wraparound, life-cycle bookkeeping, in-place respawn, and burst
//! expiry all happen here. Rendering backends only ever read the resulting
//! particle sequence.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::FieldConfig;
use super::particle::Particle;

/// Pointer repulsion radius in backing-store pixels.
pub const REPULSION_RADIUS: f32 = 100.0;

/// Scale applied to the `(radius - distance)` repulsion magnitude.
const REPULSION_SCALE: f32 = 0.01;

/// Particles wrap once a coordinate passes the extent by this margin, and
/// re-enter the same distance beyond the opposite edge.
pub const WRAP_MARGIN: f32 = 50.0;

/// Wall-clock lifetime of burst particles in seconds.
pub const BURST_LIFETIME_SECS: f32 = 2.0;

/// Steady-state lifetime range in ticks (one tick = one frame at 60 Hz).
const LIFE_RANGE: std::ops::Range<f32> = 200.0..500.0;

/// Per-tick phase advance range for the turbulence oscillator.
const OSCILLATION_SPEED_RANGE: std::ops::Range<f32> = 0.01..0.05;

/// The particle simulation state.
pub struct Simulation {
    config: FieldConfig,
    particles: Vec<Particle>,
    /// Field extent in backing-store pixels.
    width: f32,
    height: f32,
    /// Pointer position in backing-store pixels.
    mouse: Vec2,
    /// Accumulated simulation time in seconds.
    time: f32,
    rng: StdRng,
}

impl Simulation {
    /// Create a simulation with a full population randomized into the
    /// given extent.
    pub fn new(config: FieldConfig, width: f32, height: f32) -> Self {
        Self::with_rng(config, width, height, StdRng::from_entropy())
    }

    /// Create a simulation with a fixed RNG seed. Deterministic; used by
    /// tests and reproducible captures.
    pub fn seeded(config: FieldConfig, width: f32, height: f32, seed: u64) -> Self {
        Self::with_rng(config, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut config: FieldConfig, width: f32, height: f32, rng: StdRng) -> Self {
        config.sanitize();
        let mut sim = Self {
            config,
            particles: Vec::new(),
            width,
            height,
            mouse: Vec2::new(f32::MIN, f32::MIN),
            time: 0.0,
            rng,
        };
        sim.regenerate();
        sim
    }

    /// The current configuration.
    #[inline]
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// All live particles, bursts included.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Total population, bursts included.
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the field is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Steady-state population, excluding transient burst particles.
    pub fn steady_count(&self) -> usize {
        self.particles.iter().filter(|p| !p.is_burst()).count()
    }

    /// Accumulated simulation time in seconds.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Field extent in backing-store pixels.
    #[inline]
    pub fn extent(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Record the pointer position in backing-store pixels.
    pub fn set_mouse(&mut self, position: Vec2) {
        self.mouse = position;
    }

    /// The last recorded pointer position in backing-store pixels.
    #[inline]
    pub fn mouse(&self) -> Vec2 {
        self.mouse
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        // Normalize to ticks so motion is frame-rate independent while the
        // tuning constants keep their per-frame-at-60Hz meaning.
        let ticks = dt.max(0.0) * 60.0;
        self.time += dt.max(0.0);

        let repulsion_active = self.config.mouse_repulsion && self.config.interactive;
        let mouse = self.mouse;
        let turbulence = self.config.turbulence;

        for p in &mut self.particles {
            p.oscillation += p.oscillation_speed * ticks;
            p.velocity += Vec2::new(
                p.oscillation.sin() * turbulence,
                (p.oscillation * 1.5).cos() * turbulence,
            ) * ticks;

            if repulsion_active {
                let to_mouse = mouse - p.position;
                let distance = to_mouse.length();
                if distance < REPULSION_RADIUS && distance > f32::EPSILON {
                    let magnitude = (REPULSION_RADIUS - distance) * REPULSION_SCALE * ticks;
                    p.velocity -= to_mouse / distance * magnitude;
                }
            }

            p.position += p.velocity * ticks;
            p.life += ticks;
        }

        self.wrap_all();

        // Respawn expired steady-state particles in place; the population
        // size never changes here.
        for i in 0..self.particles.len() {
            let p = self.particles[i];
            if !p.is_burst() && p.life > p.max_life {
                self.particles[i] = self.spawn_steady();
            }
        }

        for p in &mut self.particles {
            p.alpha = p.life_alpha();
        }

        // Burst expiry is part of the normal life-cycle pass: no timers,
        // nothing left dangling if the caller pauses or destroys mid-burst.
        let now = self.time;
        self.particles
            .retain(|p| p.expires_at.map_or(true, |expiry| now < expiry));
    }

    /// Spawn `count` burst particles radiating from `origin` at uniform
    /// angles. They expire `BURST_LIFETIME_SECS` after spawning and never
    /// count toward the steady-state population.
    pub fn burst(&mut self, origin: Vec2, count: usize) {
        if count == 0 {
            return;
        }
        let expiry = self.time + BURST_LIFETIME_SECS;
        self.particles.reserve(count);
        for i in 0..count {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let speed = self.rng.gen_range(1.0..4.0);
            let size = 1.0 + self.rng.gen_range(0.0..=self.config.particle_size.max(0.5));
            let color = self.pick_color();
            let oscillation_speed = self.rng.gen_range(OSCILLATION_SPEED_RANGE);
            self.particles.push(Particle {
                position: origin,
                velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                size,
                color,
                alpha: 0.0,
                life: 0.0,
                max_life: BURST_LIFETIME_SECS * 60.0,
                oscillation: angle,
                oscillation_speed,
                expires_at: Some(expiry),
            });
        }
    }

    /// Resize the field extent. Particles stranded beyond the new bounds
    /// are relocated to random in-bounds positions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        for i in 0..self.particles.len() {
            let position = self.particles[i].position;
            if position.x > width || position.y > height {
                let relocated = Vec2::new(
                    self.rng.gen_range(0.0..width.max(1.0)),
                    self.rng.gen_range(0.0..height.max(1.0)),
                );
                self.particles[i].position = relocated;
            }
        }
    }

    /// Replace the configuration wholesale. A changed population size
    /// regenerates the entire field with fresh random positions (dropping
    /// any in-flight burst particles).
    pub fn apply_config(&mut self, mut config: FieldConfig) {
        config.sanitize();
        let count_changed = config.particle_count != self.config.particle_count;
        self.config = config;
        if count_changed {
            self.regenerate();
        }
    }

    /// Drop every particle. Called from engine teardown.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn regenerate(&mut self) {
        let count = self.config.particle_count;
        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            let p = self.spawn_steady();
            self.particles.push(p);
        }
    }

    fn spawn_steady(&mut self) -> Particle {
        let speed = self.config.speed;
        let position = Vec2::new(
            self.rng.gen_range(0.0..self.width.max(1.0)),
            self.rng.gen_range(0.0..self.height.max(1.0)),
        );
        let velocity = Vec2::new(
            self.rng.gen_range(-0.5..=0.5) * speed,
            self.rng.gen_range(-0.5..=0.5) * speed,
        );
        Particle {
            position,
            velocity,
            size: 1.0 + self.rng.gen_range(0.0..=self.config.particle_size.max(0.0)),
            color: self.pick_color(),
            alpha: 0.0,
            life: 0.0,
            max_life: self.rng.gen_range(LIFE_RANGE),
            oscillation: self.rng.gen_range(0.0..std::f32::consts::TAU),
            oscillation_speed: self.rng.gen_range(OSCILLATION_SPEED_RANGE),
            expires_at: None,
        }
    }

    fn pick_color(&mut self) -> [u8; 3] {
        let index = self.rng.gen_range(0..self.config.colors.len());
        self.config.colors[index]
    }

    fn wrap_all(&mut self) {
        let max_x = self.width + WRAP_MARGIN;
        let max_y = self.height + WRAP_MARGIN;
        for p in &mut self.particles {
            if p.position.x > max_x {
                p.position.x = -WRAP_MARGIN;
            } else if p.position.x < -WRAP_MARGIN {
                p.position.x = max_x;
            }
            if p.position.y > max_y {
                p.position.y = -WRAP_MARGIN;
            } else if p.position.y < -WRAP_MARGIN {
                p.position.y = max_y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::config::ConfigUpdate;

    const DT: f32 = 1.0 / 60.0;

    fn calm_config(count: usize) -> FieldConfig {
        FieldConfig {
            particle_count: count,
            speed: 0.0,
            turbulence: 0.0,
            interactive: false,
            mouse_repulsion: false,
            ..FieldConfig::default()
        }
    }

    fn sim(config: FieldConfig) -> Simulation {
        Simulation::seeded(config, 800.0, 600.0, 7)
    }

    #[test]
    fn test_population_stays_constant() {
        let mut sim = sim(FieldConfig {
            particle_count: 50,
            ..FieldConfig::default()
        });
        for _ in 0..300 {
            sim.step(DT);
            assert_eq!(sim.len(), 50);
            assert_eq!(sim.steady_count(), 50);
        }
    }

    #[test]
    fn test_alpha_bounds_every_tick() {
        let mut sim = sim(FieldConfig {
            particle_count: 40,
            ..FieldConfig::default()
        });
        for _ in 0..200 {
            sim.step(DT);
            for p in sim.particles() {
                assert!((0.0..=1.0).contains(&p.alpha), "alpha {} out of range", p.alpha);
            }
        }
    }

    #[test]
    fn test_wraparound_right_edge() {
        let mut sim = sim(calm_config(1));
        sim.particles[0].position = Vec2::new(860.0, 300.0);
        sim.step(DT);
        assert_eq!(sim.particles()[0].position.x, -WRAP_MARGIN);
    }

    #[test]
    fn test_wraparound_left_edge() {
        let mut sim = sim(calm_config(1));
        sim.particles[0].position = Vec2::new(-60.0, 300.0);
        sim.step(DT);
        assert_eq!(sim.particles()[0].position.x, 800.0 + WRAP_MARGIN);
    }

    #[test]
    fn test_no_coordinate_escapes_margin() {
        let mut sim = sim(FieldConfig {
            particle_count: 100,
            speed: 3.0,
            turbulence: 0.5,
            ..FieldConfig::default()
        });
        for _ in 0..500 {
            sim.step(DT);
            for p in sim.particles() {
                assert!(p.position.x <= 800.0 + WRAP_MARGIN);
                assert!(p.position.x >= -WRAP_MARGIN);
                assert!(p.position.y <= 600.0 + WRAP_MARGIN);
                assert!(p.position.y >= -WRAP_MARGIN);
            }
        }
    }

    #[test]
    fn test_repulsion_pushes_away_inside_radius() {
        let mut sim = sim(FieldConfig {
            particle_count: 1,
            speed: 0.0,
            turbulence: 0.0,
            ..FieldConfig::default()
        });
        sim.particles[0].position = Vec2::new(100.0, 100.0);
        sim.particles[0].velocity = Vec2::ZERO;
        // Mouse 30px to the right: the particle must be pushed left.
        sim.set_mouse(Vec2::new(130.0, 100.0));
        sim.step(DT);
        assert!(sim.particles()[0].velocity.x < 0.0);
    }

    #[test]
    fn test_no_repulsion_outside_radius() {
        let mut sim = sim(FieldConfig {
            particle_count: 1,
            speed: 0.0,
            turbulence: 0.0,
            ..FieldConfig::default()
        });
        sim.particles[0].position = Vec2::new(100.0, 100.0);
        sim.particles[0].velocity = Vec2::ZERO;
        sim.set_mouse(Vec2::new(300.0, 100.0));
        sim.step(DT);
        assert_eq!(sim.particles()[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_repulsion_disabled_by_config() {
        let mut sim = sim(calm_config(1));
        sim.particles[0].position = Vec2::new(100.0, 100.0);
        sim.set_mouse(Vec2::new(130.0, 100.0));
        sim.step(DT);
        assert_eq!(sim.particles()[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_burst_adds_then_expires() {
        let mut sim = sim(FieldConfig::default());
        assert_eq!(sim.len(), 500);
        sim.burst(Vec2::new(100.0, 100.0), 50);
        assert_eq!(sim.len(), 550);
        assert_eq!(sim.steady_count(), 500);
        // Run past the burst lifetime.
        for _ in 0..((BURST_LIFETIME_SECS / DT) as usize + 2) {
            sim.step(DT);
        }
        assert_eq!(sim.len(), 500);
        assert_eq!(sim.steady_count(), 500);
    }

    #[test]
    fn test_burst_zero_count_is_noop() {
        let mut sim = sim(FieldConfig::default());
        sim.burst(Vec2::ZERO, 0);
        assert_eq!(sim.len(), 500);
    }

    #[test]
    fn test_burst_offscreen_origin_is_legal() {
        let mut sim = sim(FieldConfig::default());
        sim.burst(Vec2::new(-5000.0, 9000.0), 10);
        assert_eq!(sim.len(), 510);
        sim.step(DT);
        for p in sim.particles() {
            assert!(p.position.is_finite());
        }
    }

    #[test]
    fn test_apply_config_regenerates_on_count_change() {
        let mut sim = sim(FieldConfig::default());
        let before: Vec<_> = sim.particles().iter().map(|p| p.position).collect();
        let next = sim.config().merged(ConfigUpdate::count(42));
        sim.apply_config(next);
        assert_eq!(sim.len(), 42);
        let after: Vec<_> = sim.particles().iter().map(|p| p.position).collect();
        assert_ne!(before[..42.min(before.len())], after[..]);
    }

    #[test]
    fn test_apply_config_without_count_change_keeps_population() {
        let mut sim = sim(FieldConfig::default());
        let positions: Vec<_> = sim.particles().iter().map(|p| p.position).collect();
        let next = sim.config().merged(ConfigUpdate {
            turbulence: Some(0.3),
            ..Default::default()
        });
        sim.apply_config(next);
        let unchanged: Vec<_> = sim.particles().iter().map(|p| p.position).collect();
        assert_eq!(positions, unchanged);
        assert_eq!(sim.config().turbulence, 0.3);
    }

    #[test]
    fn test_resize_relocates_stranded_particles() {
        let mut sim = sim(calm_config(5));
        sim.particles[0].position = Vec2::new(5000.0, 50.0);
        sim.resize(640.0, 480.0);
        for p in sim.particles() {
            assert!(p.position.x <= 640.0);
            assert!(p.position.y <= 480.0);
        }
    }

    #[test]
    fn test_sixty_tick_scenario_stays_finite() {
        let mut sim = sim(FieldConfig {
            particle_count: 10,
            interactive: false,
            ..FieldConfig::default()
        });
        for _ in 0..60 {
            sim.step(0.01667);
        }
        assert_eq!(sim.len(), 10);
        for p in sim.particles() {
            assert!(p.position.is_finite());
            assert!((0.0..=1.0).contains(&p.alpha));
        }
    }

    #[test]
    fn test_zero_count_yields_empty_field() {
        let sim = sim(calm_config(0));
        assert!(sim.is_empty());
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let mut a = Simulation::seeded(FieldConfig::default(), 800.0, 600.0, 11);
        let mut b = Simulation::seeded(FieldConfig::default(), 800.0, 600.0, 11);
        for _ in 0..30 {
            a.step(DT);
            b.step(DT);
        }
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.position, pb.position);
        }
    }
}
