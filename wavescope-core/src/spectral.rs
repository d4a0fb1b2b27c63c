//! Magnitude spectrum and dominant-frequency estimation.
//!
//! One analysis cycle is fully self-contained: a captured block goes in, a
//! [`SpectrumResult`] comes out. There is no carry-over state between
//! cycles, so a consumer can freely skip or drop blocks.
//!
//! The pitch estimate uses harmonic-product-spectrum weighting: the
//! normalized spectrum is multiplied by its decimate-by-2 and decimate-by-3
//! copies (the by-3 copy twice), which reinforces the fundamental bin for
//! harmonically rich signals. The exact weighting is kept as-is; see
//! DESIGN.md for the rationale.

use rustfft::{num_complex::Complex, FftPlanner};

/// Result of analyzing one block.
///
/// `magnitude` is the full-length DFT magnitude, normalized so the peak bin
/// is 1.0 (all zeros for a silent block). Only the first half is meaningful
/// for display; [`SpectrumResult::display_half`] exposes it.
#[derive(Clone, Debug)]
pub struct SpectrumResult {
    magnitude: Vec<f32>,
    estimated_hz: f32,
    sample_rate: u32,
}

impl SpectrumResult {
    /// Full-length normalized magnitude spectrum (internal use: the
    /// harmonic product runs over this array).
    #[inline]
    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    /// Displayable half-spectrum, bins `0..N/2` (Nyquist symmetry).
    #[inline]
    pub fn display_half(&self) -> &[f32] {
        &self.magnitude[..self.magnitude.len() / 2]
    }

    /// Estimated dominant frequency in Hz; 0.0 when no estimate exists.
    #[inline]
    pub fn estimated_hz(&self) -> f32 {
        self.estimated_hz
    }

    /// Width of one FFT bin in Hz (`sample_rate / N`).
    #[inline]
    pub fn bin_width_hz(&self) -> f32 {
        if self.magnitude.is_empty() {
            0.0
        } else {
            self.sample_rate as f32 / self.magnitude.len() as f32
        }
    }
}

/// Spectrum analyzer with cached FFT plans and reusable scratch.
///
/// Not realtime-safe by design: the analysis consumer may allocate and
/// block, the audio callbacks never call into this.
pub struct SpectralEstimator {
    planner: FftPlanner<f32>,
    buf: Vec<Complex<f32>>,
}

impl SpectralEstimator {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            buf: Vec::new(),
        }
    }

    /// Analyze one mono block sampled at `sample_rate`.
    ///
    /// Never panics: an empty or tiny block yields an all-zero spectrum and
    /// a 0 Hz estimate.
    pub fn analyze(&mut self, samples: &[f32], sample_rate: u32) -> SpectrumResult {
        let n = samples.len();
        if n == 0 {
            return SpectrumResult {
                magnitude: Vec::new(),
                estimated_hz: 0.0,
                sample_rate,
            };
        }

        let fft = self.planner.plan_fft_forward(n);
        self.buf.clear();
        self.buf.extend(samples.iter().map(|&s| Complex::new(s, 0.0)));
        fft.process(&mut self.buf);

        let mut magnitude: Vec<f32> = self.buf.iter().map(|c| c.norm()).collect();
        let peak = magnitude.iter().copied().fold(0.0_f32, f32::max);
        if peak > 0.0 {
            for m in &mut magnitude {
                *m /= peak;
            }
        } else {
            // Silence: define every bin as 0 rather than dividing by 0.
            magnitude.fill(0.0);
        }

        let estimated_hz = match harmonic_product_argmax(&magnitude) {
            Some(k) => sample_rate as f32 * k as f32 / n as f32,
            None => 0.0,
        };

        SpectrumResult {
            magnitude,
            estimated_hz,
            sample_rate,
        }
    }
}

impl Default for SpectralEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Bin index maximizing `mag[k] · mag[2k] · mag[3k] · mag[3k]` for
/// `k < ceil(N/3)` (the length all decimated copies truncate to).
/// First maximum wins on ties. `None` only for an empty spectrum.
fn harmonic_product_argmax(magnitude: &[f32]) -> Option<usize> {
    let n = magnitude.len();
    let len3 = n.div_ceil(3);
    if len3 == 0 {
        return None;
    }
    let mut best = 0usize;
    let mut best_score = f32::MIN;
    for k in 0..len3 {
        let m3 = magnitude[3 * k];
        let score = magnitude[k] * magnitude[2 * k] * m3 * m3;
        if score > best_score {
            best_score = score;
            best = k;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{SynthParams, Synthesizer, Waveform};

    const SR: u32 = 44_100;

    fn tone(wave: Waveform, freq: f32, n: usize) -> Vec<f32> {
        let mut synth = Synthesizer::new(SR);
        let mut out = vec![0.0; n];
        synth.fill_block(
            &SynthParams {
                waveform: wave,
                frequency_hz: freq,
                amplitude: 0.8,
            },
            &mut out,
        );
        out
    }

    #[test]
    fn estimates_fundamental_of_harmonic_tone() {
        // 4410 samples at 44.1 kHz: bin width 10 Hz, 440 Hz sits on bin 44.
        // A sawtooth carries the full harmonic series, which is what the
        // product weighting needs to single out the fundamental.
        let block = tone(Waveform::Sawtooth, 440.0, 4410);
        let mut est = SpectralEstimator::new();
        let result = est.analyze(&block, SR);
        let bin = result.bin_width_hz();
        assert!((bin - 10.0).abs() < 1e-3);
        assert!(
            (result.estimated_hz() - 440.0).abs() <= bin,
            "estimated {} Hz",
            result.estimated_hz()
        );
    }

    #[test]
    fn estimates_across_block_sizes() {
        for n in [1024usize, 2048, 4410] {
            let freq = 30.0 * SR as f32 / n as f32; // exactly on bin 30
            let block = tone(Waveform::Sawtooth, freq, n);
            let result = SpectralEstimator::new().analyze(&block, SR);
            assert!(
                (result.estimated_hz() - freq).abs() <= result.bin_width_hz(),
                "n={n} freq={freq} estimated {}",
                result.estimated_hz()
            );
        }
    }

    #[test]
    fn sine_spectrum_peaks_at_fundamental_bin() {
        let block = tone(Waveform::Sine, 440.0, 4410);
        let result = SpectralEstimator::new().analyze(&block, SR);
        let half = result.display_half();
        assert_eq!(half.len(), 2205);
        let peak_bin = half
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 44);
        assert!((half[44] - 1.0).abs() < 1e-6, "normalized peak = {}", half[44]);
    }

    #[test]
    fn silence_yields_zero_spectrum_and_zero_estimate() {
        let block = vec![0.0; 4410];
        let result = SpectralEstimator::new().analyze(&block, SR);
        assert_eq!(result.estimated_hz(), 0.0);
        assert!(result.magnitude().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn degenerate_blocks_do_not_panic() {
        let mut est = SpectralEstimator::new();
        for n in 0..4usize {
            let result = est.analyze(&vec![0.3; n], SR);
            assert_eq!(result.estimated_hz(), 0.0, "n={n}");
        }
        assert!(est.analyze(&[], SR).display_half().is_empty());
    }

    #[test]
    fn estimator_is_reusable_across_lengths() {
        let mut est = SpectralEstimator::new();
        let a = est.analyze(&tone(Waveform::Sawtooth, 440.0, 4410), SR);
        let b = est.analyze(&tone(Waveform::Sawtooth, 861.0, 1024), SR);
        assert!((a.estimated_hz() - 440.0).abs() <= a.bin_width_hz());
        assert!((b.estimated_hz() - 861.328).abs() <= b.bin_width_hz() + 0.5);
    }
}
