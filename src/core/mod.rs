//! # Core Module
//!
//! Core engine functionality: wgpu context management and frame timing.

mod clock;
mod context;

pub use clock::Clock;
pub use context::{Context, ContextError};
