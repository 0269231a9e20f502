//! Particle field module.
//!
//! CPU-side simulation, configuration, and the host-facing engine. The
//! simulation is deliberately renderer-agnostic so it can be driven and
//! inspected without a display.

mod config;
mod engine;
mod particle;
mod simulation;

pub use config::{ConfigUpdate, FieldConfig, FieldPreset, DEFAULT_PALETTE, MAX_PARTICLE_COUNT};
pub use engine::{FieldError, ParticleField, DEFAULT_BURST_COUNT};
pub use particle::{Particle, ParticleInstance};
pub use simulation::{
    Simulation, BURST_LIFETIME_SECS, REPULSION_RADIUS, WRAP_MARGIN,
};
