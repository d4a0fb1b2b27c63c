//! Pull-style analysis port for display drivers.
//!
//! A [`ScopeView`] is the consumer end of the engine: any renderer (GUI,
//! terminal, headless test harness) calls [`ScopeView::poll`] on its own
//! schedule, completely decoupled from audio callback timing. Each poll is
//! independent; stale blocks are simply gone (latest-wins upstream), and a
//! slow consumer costs the audio threads nothing.

use std::sync::Arc;

use wavescope_core::display::{frequency_axis, time_axis, trigger_index};
use wavescope_core::spectral::SpectralEstimator;

use crate::capture::{CaptureBlock, CaptureSlot};
use crate::params::SharedParams;

/// Everything one display refresh needs, computed from one captured block.
#[derive(Clone, Debug)]
pub struct AnalysisFrame {
    /// Gain-scaled samples starting at the trigger point.
    pub samples: Vec<f32>,
    /// Seconds, same length as `samples`, starting at 0.
    pub time_axis: Vec<f32>,
    /// Normalized half-spectrum (bins `0..N/2`).
    pub spectrum: Vec<f32>,
    /// Hz, same length as `spectrum`, covering `0..sample_rate/2`.
    pub freq_axis: Vec<f32>,
    /// Dominant-frequency estimate in Hz (0.0 when none).
    pub estimated_hz: f32,
    /// Renderer hint: upper bound of the spectrum x-range, in Hz.
    pub max_display_hz: f32,
}

/// `Send` analysis port over the engine's capture slot and parameters.
pub struct ScopeView {
    capture: Arc<CaptureSlot>,
    params: Arc<SharedParams>,
    estimator: SpectralEstimator,
    sample_rate: u32,
}

impl ScopeView {
    pub(crate) fn new(
        capture: Arc<CaptureSlot>,
        params: Arc<SharedParams>,
        sample_rate: u32,
    ) -> Self {
        Self {
            capture,
            params,
            estimator: SpectralEstimator::new(),
            sample_rate,
        }
    }

    /// Remove and return the latest raw captured block, if any.
    pub fn try_latest_capture(&self) -> Option<CaptureBlock> {
        self.capture.try_pop()
    }

    /// One analysis cycle: pop the latest block, estimate its spectrum,
    /// scale and trigger-align the trace. `None` when no new block arrived
    /// since the last poll (renderers keep their previous frame).
    pub fn poll(&mut self) -> Option<AnalysisFrame> {
        let block = self.capture.try_pop()?;
        Some(self.analyze_block(&block))
    }

    /// Analysis of one explicit block; `poll` uses this, and test harnesses
    /// can feed synthetic data through the identical path.
    pub fn analyze_block(&mut self, block: &CaptureBlock) -> AnalysisFrame {
        let result = self
            .estimator
            .analyze(&block.samples, block.sample_rate);

        let gain = self.params.display_gain();
        let level = self.params.trigger_level();
        let mut samples: Vec<f32> = block.samples.iter().map(|s| s * gain).collect();
        let start = trigger_index(&samples, level);
        samples.drain(..start);

        let spectrum = result.display_half().to_vec();
        let freq_axis = frequency_axis(spectrum.len(), block.samples.len(), block.sample_rate);

        AnalysisFrame {
            time_axis: time_axis(samples.len(), block.sample_rate),
            samples,
            spectrum,
            freq_axis,
            estimated_hz: result.estimated_hz(),
            max_display_hz: self.params.max_display_hz(),
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavescope_core::synth::{SynthParams, Synthesizer, Waveform};

    const SR: u32 = 44_100;

    fn feed_tone(slot: &CaptureSlot, wave: Waveform, freq: f32, n: usize) {
        let mut synth = Synthesizer::new(SR);
        let mut block = vec![0.0; n];
        synth.fill_block(
            &SynthParams {
                waveform: wave,
                frequency_hz: freq,
                amplitude: 0.8,
            },
            &mut block,
        );
        slot.push(&block, SR);
    }

    fn view_over(slot: &Arc<CaptureSlot>, params: &Arc<SharedParams>) -> ScopeView {
        ScopeView::new(Arc::clone(slot), Arc::clone(params), SR)
    }

    #[test]
    fn poll_on_empty_slot_is_none() {
        let slot = Arc::new(CaptureSlot::new());
        let params = Arc::new(SharedParams::new(SR));
        assert!(view_over(&slot, &params).poll().is_none());
    }

    #[test]
    fn end_to_end_estimates_440_hz() {
        let slot = Arc::new(CaptureSlot::new());
        let params = Arc::new(SharedParams::new(SR));
        feed_tone(&slot, Waveform::Sawtooth, 440.0, 4410);

        let mut view = view_over(&slot, &params);
        let frame = view.poll().expect("a block was captured");
        // Bin width 44100/4410 = 10 Hz.
        assert!(
            (frame.estimated_hz - 440.0).abs() <= 10.0,
            "estimated {} Hz",
            frame.estimated_hz
        );
        assert_eq!(frame.spectrum.len(), 2205);
        assert_eq!(frame.freq_axis.len(), 2205);
        assert!((frame.freq_axis[1] - 10.0).abs() < 1e-3);
        assert!(view.poll().is_none(), "block consumed");
    }

    #[test]
    fn trace_starts_at_trigger_crossing() {
        let slot = Arc::new(CaptureSlot::new());
        let params = Arc::new(SharedParams::new(SR));
        params.set_trigger_level(0.0);
        // Starts above the level, dips below, crosses upward at index 3.
        slot.push(&[0.5, 0.1, -0.3, -0.1, 0.2, 0.4], SR);

        let mut view = view_over(&slot, &params);
        let frame = view.poll().unwrap();
        assert_eq!(frame.samples, vec![-0.1, 0.2, 0.4]);
        assert_eq!(frame.time_axis.len(), 3);
        assert_eq!(frame.time_axis[0], 0.0);
    }

    #[test]
    fn display_gain_scales_before_trigger_scan() {
        let slot = Arc::new(CaptureSlot::new());
        let params = Arc::new(SharedParams::new(SR));
        params.set_trigger_level(0.5);
        params.set_display_gain(10.0);
        // Raw samples never exceed 0.5, but the scaled trace does.
        slot.push(&[0.01, 0.02, 0.04, 0.08], SR);

        let frame = view_over(&slot, &params).poll().unwrap();
        // Scaled: [0.1, 0.2, 0.4, 0.8]; first upward crossing of 0.5 at i=2.
        assert_eq!(frame.samples.len(), 2);
        assert!((frame.samples[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn no_crossing_shows_whole_block() {
        let slot = Arc::new(CaptureSlot::new());
        let params = Arc::new(SharedParams::new(SR));
        params.set_trigger_level(0.9);
        slot.push(&[0.1, 0.2, 0.1, 0.0], SR);

        let frame = view_over(&slot, &params).poll().unwrap();
        assert_eq!(frame.samples.len(), 4);
    }

    #[test]
    fn view_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ScopeView>();
    }
}
