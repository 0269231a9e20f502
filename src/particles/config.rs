//! Field configuration, partial updates, and presets.

use serde::{Deserialize, Serialize};

/// Upper bound on the steady-state population. Reconfigurations above this
/// clamp rather than allocate unbounded simulation and GPU memory.
pub const MAX_PARTICLE_COUNT: usize = 10_000;

/// Default 4-entry palette sampled per particle at creation (RGB).
pub const DEFAULT_PALETTE: [[u8; 3]; 4] = [
    [0, 122, 255],  // blue
    [88, 86, 214],  // indigo
    [94, 92, 230],  // violet
    [100, 210, 255], // cyan
];

/// Complete field configuration.
///
/// The engine treats this as an immutable value: partial updates produce a
/// whole new `FieldConfig` via [`FieldConfig::merged`] rather than mutating
/// fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Target steady-state population size.
    pub particle_count: usize,
    /// Base radius multiplier; actual radius is uniform in `[1, 1 + particle_size]`.
    pub particle_size: f32,
    /// Initial velocity magnitude scale; components are uniform in `[-0.5, 0.5] * speed`.
    pub speed: f32,
    /// Magnitude of the oscillatory perturbation added to velocity each tick.
    pub turbulence: f32,
    /// Color candidates (RGB), sampled uniformly per particle at creation and respawn.
    pub colors: Vec<[u8; 3]>,
    /// Whether pointer position is tracked.
    pub interactive: bool,
    /// Whether the glow pulse is applied in the fragment stage.
    pub glow_effect: bool,
    /// Whether particles within 100 px of the pointer are pushed away.
    pub mouse_repulsion: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 500,
            particle_size: 2.0,
            speed: 0.5,
            turbulence: 0.1,
            colors: DEFAULT_PALETTE.to_vec(),
            interactive: true,
            glow_effect: true,
            mouse_repulsion: true,
        }
    }
}

impl FieldConfig {
    /// Produce a new configuration with the given update merged in.
    /// Unset fields keep their current values.
    pub fn merged(&self, update: ConfigUpdate) -> Self {
        let mut next = self.clone();
        if let Some(count) = update.particle_count {
            next.particle_count = count;
        }
        if let Some(size) = update.particle_size {
            next.particle_size = size;
        }
        if let Some(speed) = update.speed {
            next.speed = speed;
        }
        if let Some(turbulence) = update.turbulence {
            next.turbulence = turbulence;
        }
        if let Some(colors) = update.colors {
            next.colors = colors;
        }
        if let Some(interactive) = update.interactive {
            next.interactive = interactive;
        }
        if let Some(glow_effect) = update.glow_effect {
            next.glow_effect = glow_effect;
        }
        if let Some(mouse_repulsion) = update.mouse_repulsion {
            next.mouse_repulsion = mouse_repulsion;
        }
        next.sanitize();
        next
    }

    /// Clamp out-of-range values. An empty palette falls back to the
    /// default so respawn always has a color to sample.
    pub fn sanitize(&mut self) {
        if self.particle_count > MAX_PARTICLE_COUNT {
            log::warn!(
                "particle_count {} exceeds maximum, clamping to {}",
                self.particle_count,
                MAX_PARTICLE_COUNT
            );
            self.particle_count = MAX_PARTICLE_COUNT;
        }
        if self.colors.is_empty() {
            self.colors = DEFAULT_PALETTE.to_vec();
        }
        self.particle_size = self.particle_size.max(0.0);
        self.turbulence = self.turbulence.max(0.0);
    }
}

/// Partial configuration update. Every field is optional; set fields
/// replace the corresponding value wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    /// New steady-state population size.
    pub particle_count: Option<usize>,
    /// New base radius multiplier.
    pub particle_size: Option<f32>,
    /// New velocity magnitude scale.
    pub speed: Option<f32>,
    /// New turbulence magnitude.
    pub turbulence: Option<f32>,
    /// New color palette.
    pub colors: Option<Vec<[u8; 3]>>,
    /// New pointer-tracking toggle.
    pub interactive: Option<bool>,
    /// New glow toggle.
    pub glow_effect: Option<bool>,
    /// New repulsion toggle.
    pub mouse_repulsion: Option<bool>,
}

impl ConfigUpdate {
    /// Update that only changes the population size.
    pub fn count(count: usize) -> Self {
        Self {
            particle_count: Some(count),
            ..Default::default()
        }
    }
}

/// Named configuration presets. The host picks one from device heuristics
/// (GPU renderer string, core count, mobile flag); that selection logic
/// lives outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPreset {
    /// Sparse, motion-light field for constrained devices.
    Minimal,
    /// The default experience.
    Standard,
    /// Dense field with stronger motion and glow.
    Premium,
    /// Standard look with effects trimmed for weak GPUs.
    Performance,
}

impl FieldPreset {
    /// Produce the full options record for this preset.
    pub fn config(self) -> FieldConfig {
        match self {
            FieldPreset::Minimal => FieldConfig {
                particle_count: 150,
                particle_size: 1.5,
                speed: 0.3,
                turbulence: 0.05,
                glow_effect: false,
                mouse_repulsion: false,
                ..FieldConfig::default()
            },
            FieldPreset::Standard => FieldConfig::default(),
            FieldPreset::Premium => FieldConfig {
                particle_count: 800,
                particle_size: 2.5,
                speed: 0.6,
                turbulence: 0.15,
                ..FieldConfig::default()
            },
            FieldPreset::Performance => FieldConfig {
                particle_count: 250,
                particle_size: 1.8,
                speed: 0.4,
                glow_effect: false,
                ..FieldConfig::default()
            },
        }
    }
}
