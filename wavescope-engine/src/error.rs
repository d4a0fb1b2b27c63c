//! Error types for the audio engine

use std::fmt;

/// Errors surfaced by engine construction and non-realtime operations.
///
/// Nothing here crosses a realtime callback boundary: callback-side
/// problems are counted in [`crate::engine::StatusReport`] instead of
/// being raised.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// A device could not be opened, or offers no f32 config at the
    /// requested sample rate. Non-fatal for the input side: the engine
    /// degrades to output-only.
    DeviceUnavailable(String),

    /// Building, starting or stopping a stream failed.
    Stream(String),

    /// Invalid parameter rejected at the control boundary before it could
    /// reach the realtime path.
    InvalidConfig(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DeviceUnavailable(msg) => write!(f, "device unavailable: {}", msg),
            EngineError::Stream(msg) => write!(f, "stream error: {}", msg),
            EngineError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
