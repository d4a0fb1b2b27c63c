//! Atomically published engine parameters.
//!
//! The UI/control side stores values at any time; the realtime output
//! callback loads one [`SynthParams`] snapshot per block. Every field is an
//! individual lock-free atomic, so the callback can never observe a torn
//! write and never touches a lock. Clamping happens here, at the control
//! boundary, so the synthesis hot path stays validation-free.

use std::sync::atomic::{AtomicU32, Ordering};

use wavescope_core::synth::{SynthParams, Waveform};

/// Atomic f32 cell stored as its bit pattern in an `AtomicU32`.
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    #[inline]
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Shared parameter store for one engine instance.
///
/// Lives behind an `Arc`; the engine, its callbacks and any number of
/// analysis consumers hold clones.
pub struct SharedParams {
    waveform: AtomicU32,
    frequency_hz: AtomicF32,
    amplitude: AtomicF32,
    trigger_level: AtomicF32,
    display_gain: AtomicF32,
    max_display_hz: AtomicF32,
}

impl SharedParams {
    /// Defaults mirror the classic bench setup: 440 Hz sine at full
    /// amplitude, trigger at 0, unity display gain, spectrum x-range up to
    /// the full sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            waveform: AtomicU32::new(Waveform::Sine.index()),
            frequency_hz: AtomicF32::new(440.0),
            amplitude: AtomicF32::new(1.0),
            trigger_level: AtomicF32::new(0.0),
            display_gain: AtomicF32::new(1.0),
            max_display_hz: AtomicF32::new(sample_rate as f32),
        }
    }

    #[inline]
    pub fn set_waveform(&self, wave: Waveform) {
        self.waveform.store(wave.index(), Ordering::Relaxed);
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed))
    }

    /// Output frequency in Hz; negative values clamp to 0 (silent ramp).
    #[inline]
    pub fn set_frequency(&self, hz: f32) {
        self.frequency_hz.store(hz.max(0.0));
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency_hz.load()
    }

    /// Output amplitude, clamped to [0, 1].
    #[inline]
    pub fn set_amplitude(&self, a: f32) {
        self.amplitude.store(a.clamp(0.0, 1.0));
    }

    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude.load()
    }

    /// Trigger level for display alignment, clamped to [-1, 1].
    #[inline]
    pub fn set_trigger_level(&self, v: f32) {
        self.trigger_level.store(v.clamp(-1.0, 1.0));
    }

    #[inline]
    pub fn trigger_level(&self) -> f32 {
        self.trigger_level.load()
    }

    /// Gain applied to captured samples before trigger scan and display.
    #[inline]
    pub fn set_display_gain(&self, gain: f32) {
        self.display_gain.store(gain.max(0.0));
    }

    #[inline]
    pub fn display_gain(&self) -> f32 {
        self.display_gain.load()
    }

    /// Upper frequency bound a renderer should show of the half-spectrum.
    #[inline]
    pub fn set_max_display_hz(&self, hz: f32) {
        self.max_display_hz.store(hz.max(0.0));
    }

    #[inline]
    pub fn max_display_hz(&self) -> f32 {
        self.max_display_hz.load()
    }

    /// One consistent snapshot for a whole synthesis block.
    #[inline]
    pub fn snapshot(&self) -> SynthParams {
        SynthParams {
            waveform: self.waveform(),
            frequency_hz: self.frequency(),
            amplitude: self.amplitude(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_f32_round_trips() {
        let cell = AtomicF32::new(1.5);
        assert_eq!(cell.load(), 1.5);
        cell.store(-0.25);
        assert_eq!(cell.load(), -0.25);
    }

    #[test]
    fn snapshot_reflects_stores() {
        let p = SharedParams::new(44_100);
        p.set_waveform(Waveform::Square);
        p.set_frequency(220.0);
        p.set_amplitude(0.5);
        let s = p.snapshot();
        assert_eq!(s.waveform, Waveform::Square);
        assert_eq!(s.frequency_hz, 220.0);
        assert_eq!(s.amplitude, 0.5);
    }

    #[test]
    fn boundary_clamps() {
        let p = SharedParams::new(44_100);
        p.set_frequency(-10.0);
        p.set_amplitude(3.0);
        p.set_trigger_level(-7.0);
        p.set_display_gain(-1.0);
        assert_eq!(p.frequency(), 0.0);
        assert_eq!(p.amplitude(), 1.0);
        assert_eq!(p.trigger_level(), -1.0);
        assert_eq!(p.display_gain(), 0.0);
        assert_eq!(p.max_display_hz(), 44_100.0);
    }
}
