//! Wavescope Core — DSP primitives for a realtime audio oscilloscope and
//! signal generator.
//!
//! Features
//! - `fast-math`: polynomial sine approximation on the oscillator hot path
//!
//! Modules
//! - [`synth`]    : tagged waveform kinds, parameter snapshots, phase-continuous block synthesis
//! - [`spectral`] : FFT magnitude spectrum + harmonic-product pitch estimate
//! - [`display`]  : trigger alignment and time/frequency plot axes
//!
//! Design
//! - `synth` is realtime-safe (no heap, no locks) and pure: a block is a
//!   function of the absolute sample index, which makes phase continuity a
//!   provable property rather than an accident
//! - `spectral` and `display` run on the analysis consumer, which may
//!   allocate; nothing here is shared with an audio callback

pub mod display;
pub mod spectral;
pub mod synth;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::display::{frequency_axis, time_axis, trigger_index};
    pub use crate::spectral::{SpectralEstimator, SpectrumResult};
    pub use crate::synth::{SynthParams, Synthesizer, Waveform};
}

#[cfg(test)]
mod smoke {

    #[test]
    fn prelude_exists() {
        use crate::prelude::*;
        let mut synth = Synthesizer::new(44_100);
        let mut block = vec![0.0; 64];
        synth.fill_block(&SynthParams::default(), &mut block);
        let result = SpectralEstimator::new().analyze(&block, 44_100);
        let _ = trigger_index(&block, 0.0);
        assert_eq!(result.magnitude().len(), 64);
    }
}
