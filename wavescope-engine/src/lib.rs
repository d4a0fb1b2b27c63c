//! Wavescope Engine — realtime glue between the audio driver and the DSP
//! core.
//!
//! Crate layout:
//! - [`engine`]   : `AudioEngine`, cpal stream ownership, commands, status
//! - [`params`]   : lock-free atomic parameter cells + per-block snapshots
//! - [`capture`]  : single-slot latest-wins handoff (input callback → consumer)
//! - [`analysis`] : `ScopeView`, the pull port display drivers poll
//! - [`error`]    : engine error taxonomy
//!
//! The engine deliberately keeps the audio callbacks free of locks, heap
//! growth and panics; everything that may block or allocate lives on the
//! analysis side.

pub mod analysis;
pub mod capture;
pub mod engine;
pub mod error;
pub mod params;

// Re-export some commonly used items to make downstream imports ergonomic.
pub use analysis::{AnalysisFrame, ScopeView};
pub use capture::{CaptureBlock, CaptureSlot};
pub use engine::{AudioEngine, StatusReport, DEFAULT_CAPTURE_BLOCK, DEFAULT_SAMPLE_RATE};
pub use error::EngineError;
pub use params::SharedParams;
