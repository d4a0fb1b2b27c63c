//! Block waveform synthesis.
//!
//! The synthesizer is a pure function generator: it fills one block of mono
//! samples for a parameter snapshot and advances a running sample index, so
//! consecutive blocks are phase-continuous even when parameters change
//! between blocks (only the *next* block reflects new values).
//!
//! Contents:
//! - `Waveform`    : tagged waveform kind (Sine/Sawtooth/Triangle/Square)
//! - `SynthParams` : per-block parameter snapshot (kind, frequency, amplitude)
//! - `Synthesizer` : running sample index + block fill
//!
//! Notes:
//! - Sample `i` of a block is evaluated at absolute time
//!   `t = (sample_index + i) / sample_rate`, in f64 to keep phase accurate
//!   over long runs.
//! - No validation happens here; callers clamp at the control boundary.

use cfg_if::cfg_if;
use core::f32::consts::PI;

/// 2π as f32 (hot-path constant).
pub const TAU: f32 = 2.0 * PI;

const TAU64: f64 = core::f64::consts::TAU;

cfg_if! {
    if #[cfg(feature = "fast-math")] {
        /// Fast sine with range reduction into [-π, π] and a 5th-order
        /// odd polynomial. Max abs error ~1e-3, fine for audible tones.
        #[inline]
        fn sine01(cycles: f64) -> f32 {
            let mut xr = (TAU64 * cycles.fract()) as f32;
            let k = (xr / TAU).round();
            xr -= k * TAU;
            let x2 = xr * xr;
            xr * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        }
    } else {
        /// Exact sine of one cycle position (cycles = θ/2π).
        #[inline]
        fn sine01(cycles: f64) -> f32 {
            (TAU64 * cycles.fract()).sin() as f32
        }
    }
}

/// Synthesized waveform kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
    Triangle,
    Square,
}

impl Waveform {
    /// All kinds, in UI/order of the combo box they historically came from.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Sawtooth,
        Waveform::Triangle,
        Waveform::Square,
    ];

    /// Stable discriminant for atomic storage.
    #[inline]
    pub fn index(self) -> u32 {
        match self {
            Waveform::Sine => 0,
            Waveform::Sawtooth => 1,
            Waveform::Triangle => 2,
            Waveform::Square => 3,
        }
    }

    /// Decode a stored discriminant; unknown values fall back to `Sine`.
    #[inline]
    pub fn from_index(i: u32) -> Waveform {
        match i {
            1 => Waveform::Sawtooth,
            2 => Waveform::Triangle,
            3 => Waveform::Square,
            _ => Waveform::Sine,
        }
    }

    /// Human-readable label (CLI display and argument parsing).
    pub fn label(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
            Waveform::Square => "square",
        }
    }
}

/// Parameter snapshot a synthesis block is rendered from.
///
/// The realtime callback reads one snapshot per block from the shared
/// parameter store; it never holds a reference into shared state.
#[derive(Copy, Clone, Debug)]
pub struct SynthParams {
    pub waveform: Waveform,
    pub frequency_hz: f32,
    pub amplitude: f32,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency_hz: 440.0,
            amplitude: 1.0,
        }
    }
}

/// One waveform sample at cycle position `cycles = f · t` (i.e. θ/2π).
#[inline]
fn wave_sample(cycles: f64, wave: Waveform) -> f32 {
    match wave {
        Waveform::Sine => sine01(cycles),
        // 2·(θ/2π − floor(θ/2π + 0.5)): full-range ramp, period 1 cycle.
        Waveform::Sawtooth => (2.0 * (cycles - (cycles + 0.5).floor())) as f32,
        // Symmetric triangle: ramp −1→1 over the first half cycle, 1→−1 over
        // the second (sawtooth with width 0.5).
        Waveform::Triangle => {
            let p = cycles.fract();
            if p < 0.5 {
                (4.0 * p - 1.0) as f32
            } else {
                (3.0 - 4.0 * p) as f32
            }
        }
        Waveform::Square => {
            if sine01(cycles) >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
    }
}

/// Phase-continuous block generator.
///
/// Owns nothing but the running sample index; rendering is a pure function
/// of `(index, sample_rate, params)`, which is what makes the concatenation
/// law hold exactly: two consecutive blocks equal one combined block.
#[derive(Copy, Clone, Debug)]
pub struct Synthesizer {
    sample_rate: u32,
    sample_index: u64,
}

impl Synthesizer {
    #[inline]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            sample_index: 0,
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Running index of the next sample to render. Monotonic; wraps only on
    /// u64 overflow.
    #[inline]
    pub fn sample_index(&self) -> u64 {
        self.sample_index
    }

    /// Rewind to t = 0.
    #[inline]
    pub fn reset(&mut self) {
        self.sample_index = 0;
    }

    /// Fill `out` with `params` starting at the current sample index, then
    /// advance the index by `out.len()`. Realtime-safe: no allocation, no
    /// locking, bounded work per sample.
    pub fn fill_block(&mut self, params: &SynthParams, out: &mut [f32]) {
        let sr = f64::from(self.sample_rate);
        let f = f64::from(params.frequency_hz);
        let amp = params.amplitude;
        for (i, y) in out.iter_mut().enumerate() {
            let t = (self.sample_index.wrapping_add(i as u64)) as f64 / sr;
            *y = wave_sample(f * t, params.waveform) * amp;
        }
        self.sample_index = self.sample_index.wrapping_add(out.len() as u64);
    }
}
