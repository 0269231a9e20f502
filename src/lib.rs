//! # Drift - Interactive Particle Field Engine
//!
//! Drift is a fixed-population 2D particle background engine built with Rust,
//! rendering through wgpu when a GPU context is available and through a
//! software rasterizer otherwise.
//!
//! ## Features
//!
//! - **Core**: wgpu context management and frame timing
//! - **Particles**: CPU simulation with turbulence, pointer repulsion,
//!   toroidal wraparound, and transient bursts
//! - **Renderer**: one instanced point-sprite draw call per frame, with a
//!   headless software fallback
//!
//! ## Example
//!
//! ```ignore
//! use drift::prelude::*;
//!
//! let config = FieldPreset::Standard.config();
//! let mut field = ParticleField::attach(window, width, height, scale, config).await?;
//!
//! // host animation loop
//! field.set_mouse_position(cursor_x, cursor_y);
//! field.frame()?;
//! ```

#![warn(missing_docs)]

#[cfg(feature = "web")]
use wasm_bindgen::prelude::*;

pub mod core;
pub mod particles;
pub mod renderer;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::core::*;
    pub use crate::particles::*;
    pub use crate::renderer::*;
}

/// Initialize the engine for WASM environments.
/// Sets up panic hooks for better error messages in the browser console.
#[cfg(feature = "web")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Engine version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const NAME: &str = "Drift";
