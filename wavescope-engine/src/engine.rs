//! Audio engine: owns the cpal input/output streams and wires them to the
//! DSP core.
//!
//! Responsibilities:
//! - output callback → [`Synthesizer::fill_block`] from one parameter
//!   snapshot per block, mono duplicated across device channels
//! - input callback → channel-0 extraction, accumulation to a fixed block
//!   length, [`CaptureSlot::push`]
//! - start/stop, live parameter commands, input block reconfiguration
//!
//! Failure semantics: a missing or unusable *input* device degrades the
//! engine to output-only (`capture_available()` reports it); a missing
//! *output* device fails construction. Problems the driver reports inside
//! a callback are counted and logged via the cpal error callback, never
//! raised across the realtime boundary.
//!
//! `cpal::Stream` is `!Send`, so the engine lives on the thread that built
//! it. The analysis side is detached through [`AudioEngine::view`], which
//! hands out a `Send` port over the shared slot and parameters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use wavescope_core::synth::{Synthesizer, Waveform};

use crate::analysis::ScopeView;
use crate::capture::CaptureSlot;
use crate::error::EngineError;
use crate::params::SharedParams;

/// Default stream sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Default capture block length in samples (0.1 s at the default rate).
pub const DEFAULT_CAPTURE_BLOCK: usize = 4_410;

/// Counters the realtime callbacks feed instead of raising errors.
#[derive(Default)]
pub(crate) struct StreamStatus {
    output_errors: AtomicUsize,
    input_errors: AtomicUsize,
}

impl StreamStatus {
    #[inline]
    fn note_output_error(&self) {
        self.output_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn note_input_error(&self) {
        self.input_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of the engine's asynchronous failure counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Driver-reported output stream errors since construction.
    pub output_errors: usize,
    /// Driver-reported input stream errors since construction.
    pub input_errors: usize,
    /// Capture blocks dropped because the producer found the slot busy.
    pub dropped_blocks: usize,
}

/// Realtime oscilloscope/generator engine over one mono-logical output and
/// one mono-logical input stream.
pub struct AudioEngine {
    params: Arc<SharedParams>,
    capture: Arc<CaptureSlot>,
    status: Arc<StreamStatus>,
    sample_rate: u32,
    capture_block_len: usize,
    output: cpal::Stream,
    output_running: bool,
    input: Option<cpal::Stream>,
    input_device: Option<cpal::Device>,
}

impl AudioEngine {
    /// Open the default host devices.
    ///
    /// The output stream is built paused; call [`AudioEngine::start_output`]
    /// to make sound. The input stream starts capturing immediately when a
    /// usable device exists; otherwise the engine runs output-only and all
    /// input-dependent operations are no-ops.
    pub fn new(sample_rate: u32, capture_block_len: usize) -> Result<Self, EngineError> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        if capture_block_len == 0 {
            return Err(EngineError::InvalidConfig(
                "capture block length must be positive".into(),
            ));
        }

        let host = cpal::default_host();
        let params = Arc::new(SharedParams::new(sample_rate));
        let capture = Arc::new(CaptureSlot::new());
        let status = Arc::new(StreamStatus::default());

        let output_device = host
            .default_output_device()
            .ok_or_else(|| EngineError::DeviceUnavailable("no default output device".into()))?;
        println!("[engine] output device: {}", device_name(&output_device));

        let output = build_output_stream(&output_device, sample_rate, &params, &status)?;
        // Some backends start a stream on creation; hold it until start_output.
        if let Err(e) = output.pause() {
            eprintln!("[engine] could not hold output stream paused: {e}");
        }

        let (input, input_device) = match host.default_input_device() {
            Some(device) => {
                match build_input_stream(&device, sample_rate, capture_block_len, &capture, &status)
                {
                    Ok(stream) => {
                        println!("[engine] input device: {}", device_name(&device));
                        (Some(stream), Some(device))
                    }
                    Err(e) => {
                        eprintln!("[engine] input unavailable, running output-only: {e}");
                        (None, None)
                    }
                }
            }
            None => {
                eprintln!("[engine] no default input device, running output-only");
                (None, None)
            }
        };

        Ok(Self {
            params,
            capture,
            status,
            sample_rate,
            capture_block_len,
            output,
            output_running: false,
            input,
            input_device,
        })
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn capture_block_len(&self) -> usize {
        self.capture_block_len
    }

    /// Whether the capture path (display + estimation) is available.
    #[inline]
    pub fn capture_available(&self) -> bool {
        self.input.is_some()
    }

    #[inline]
    pub fn is_output_running(&self) -> bool {
        self.output_running
    }

    /// Start sound generation. Idempotent.
    pub fn start_output(&mut self) -> Result<(), EngineError> {
        if self.output_running {
            return Ok(());
        }
        self.output
            .play()
            .map_err(|e| EngineError::Stream(format!("failed to start output: {e}")))?;
        self.output_running = true;
        Ok(())
    }

    /// Stop sound generation. Idempotent; synchronous: no synthesis
    /// callback runs after this returns.
    pub fn stop_output(&mut self) -> Result<(), EngineError> {
        if !self.output_running {
            return Ok(());
        }
        self.output
            .pause()
            .map_err(|e| EngineError::Stream(format!("failed to stop output: {e}")))?;
        self.output_running = false;
        Ok(())
    }

    // --- live parameter commands (effective from the next block) ---

    #[inline]
    pub fn set_waveform(&self, wave: Waveform) {
        self.params.set_waveform(wave);
    }

    #[inline]
    pub fn set_frequency(&self, hz: f32) {
        self.params.set_frequency(hz);
    }

    #[inline]
    pub fn set_amplitude(&self, a: f32) {
        self.params.set_amplitude(a);
    }

    #[inline]
    pub fn set_trigger_level(&self, v: f32) {
        self.params.set_trigger_level(v);
    }

    /// Gain over captured samples before trigger scan and display (the
    /// front-panel "amplification" control).
    #[inline]
    pub fn set_display_gain(&self, gain: f32) {
        self.params.set_display_gain(gain);
    }

    #[inline]
    pub fn set_spectrum_display_max_freq(&self, hz: f32) {
        self.params.set_max_display_hz(hz);
    }

    #[inline]
    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    /// Reconfigure the capture block length from a sweep duration in
    /// seconds. Expensive: stops and restarts the input stream.
    pub fn set_input_block_duration(&mut self, seconds: f64) -> Result<(), EngineError> {
        let block_len = block_len_for_duration(seconds, self.sample_rate)?;
        self.reconfigure_input_block_size(block_len)
    }

    /// Stop and restart the input stream with a new block length. In-flight
    /// capture content is discarded. Blocking; must not be called from a
    /// realtime callback. No-op in output-only mode.
    pub fn reconfigure_input_block_size(&mut self, block_len: usize) -> Result<(), EngineError> {
        if block_len == 0 {
            return Err(EngineError::InvalidConfig(
                "capture block length must be positive".into(),
            ));
        }
        self.capture_block_len = block_len;

        // Tear the old stream down before clearing, so a late callback
        // cannot repopulate the slot with stale-sized data.
        if let Some(stream) = self.input.take() {
            drop(stream);
        }
        self.capture.clear();

        let Some(device) = &self.input_device else {
            return Ok(());
        };
        let stream = build_input_stream(
            device,
            self.sample_rate,
            block_len,
            &self.capture,
            &self.status,
        )?;
        self.input = Some(stream);
        Ok(())
    }

    /// Hand the analysis consumer a `Send` pull port, detached from the
    /// `!Send` streams. Any number of calls; each port polls independently
    /// (they share the single slot, so normally one consumer exists).
    pub fn view(&self) -> ScopeView {
        ScopeView::new(
            Arc::clone(&self.capture),
            Arc::clone(&self.params),
            self.sample_rate,
        )
    }

    /// Asynchronously collected callback-side failure counters.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            output_errors: self.status.output_errors.load(Ordering::Relaxed),
            input_errors: self.status.input_errors.load(Ordering::Relaxed),
            dropped_blocks: self.capture.dropped_blocks(),
        }
    }
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "<unknown>".into())
}

/// Translate a sweep duration into a whole capture block length.
fn block_len_for_duration(seconds: f64, sample_rate: u32) -> Result<usize, EngineError> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(EngineError::InvalidConfig(format!(
            "block duration must be positive, got {seconds}"
        )));
    }
    let block_len = (seconds * f64::from(sample_rate)).round() as usize;
    if block_len == 0 {
        return Err(EngineError::InvalidConfig(format!(
            "block duration {seconds} s is shorter than one sample"
        )));
    }
    Ok(block_len)
}

/// Pick an f32 config range containing `sample_rate`, keeping the device's
/// channel count (we up-mix our mono signal ourselves).
fn pick_f32_config<I>(ranges: I, sample_rate: u32) -> Option<cpal::StreamConfig>
where
    I: Iterator<Item = cpal::SupportedStreamConfigRange>,
{
    ranges
        .filter(|r| r.sample_format() == cpal::SampleFormat::F32)
        .find(|r| r.min_sample_rate().0 <= sample_rate && sample_rate <= r.max_sample_rate().0)
        .map(|r| cpal::StreamConfig {
            channels: r.channels(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        })
}

fn resolve_output_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::StreamConfig, EngineError> {
    let ranges = device.supported_output_configs().map_err(|e| {
        EngineError::DeviceUnavailable(format!("cannot query output configs: {e}"))
    })?;
    pick_f32_config(ranges, sample_rate).ok_or_else(|| {
        EngineError::DeviceUnavailable(format!("no f32 output config at {sample_rate} Hz"))
    })
}

fn resolve_input_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::StreamConfig, EngineError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| EngineError::DeviceUnavailable(format!("cannot query input configs: {e}")))?;
    pick_f32_config(ranges, sample_rate).ok_or_else(|| {
        EngineError::DeviceUnavailable(format!("no f32 input config at {sample_rate} Hz"))
    })
}

/// Build the (paused-capable) output stream. The callback synthesizes one
/// mono block per period into a reused scratch buffer and duplicates it
/// across the device's channels. No locks, no unbounded allocation, no
/// panics on the audio thread.
fn build_output_stream(
    device: &cpal::Device,
    sample_rate: u32,
    params: &Arc<SharedParams>,
    status: &Arc<StreamStatus>,
) -> Result<cpal::Stream, EngineError> {
    let config = resolve_output_config(device, sample_rate)?;
    let channels = (config.channels as usize).max(1);

    let params = Arc::clone(params);
    let status = Arc::clone(status);
    let mut synth = Synthesizer::new(sample_rate);
    let mut mono: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                if mono.len() < frames {
                    // Grows to the device period once, then stays put.
                    mono.resize(frames, 0.0);
                }
                let snapshot = params.snapshot();
                synth.fill_block(&snapshot, &mut mono[..frames]);
                for (frame, &s) in data.chunks_mut(channels).zip(mono.iter()) {
                    for ch in frame.iter_mut() {
                        *ch = s;
                    }
                }
            },
            move |err| {
                status.note_output_error();
                eprintln!("[engine] output stream error: {err}");
            },
            None,
        )
        .map_err(|e| EngineError::Stream(format!("failed to build output stream: {e}")))
}

/// Build and start the input stream. The callback takes channel 0 of each
/// frame, accumulates exactly `block_len` samples, and hands the block to
/// the capture slot (latest-wins, non-blocking).
fn build_input_stream(
    device: &cpal::Device,
    sample_rate: u32,
    block_len: usize,
    capture: &Arc<CaptureSlot>,
    status: &Arc<StreamStatus>,
) -> Result<cpal::Stream, EngineError> {
    let config = resolve_input_config(device, sample_rate)?;
    let channels = (config.channels as usize).max(1);

    let capture = Arc::clone(capture);
    let status = Arc::clone(status);
    let mut pending: Vec<f32> = Vec::with_capacity(block_len);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    pending.push(frame[0]);
                    if pending.len() == block_len {
                        capture.push(&pending, sample_rate);
                        pending.clear();
                    }
                }
            },
            move |err| {
                status.note_input_error();
                eprintln!("[engine] input stream error: {err}");
            },
            None,
        )
        .map_err(|e| EngineError::Stream(format!("failed to build input stream: {e}")))?;
    stream
        .play()
        .map_err(|e| EngineError::Stream(format!("failed to start input stream: {e}")))?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize, SupportedStreamConfigRange};

    fn range(fmt: SampleFormat, lo: u32, hi: u32, channels: u16) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(lo),
            SampleRate(hi),
            SupportedBufferSize::Unknown,
            fmt,
        )
    }

    #[test]
    fn picks_f32_range_containing_rate() {
        let ranges = vec![
            range(SampleFormat::I16, 8_000, 96_000, 2),
            range(SampleFormat::F32, 8_000, 48_000, 2),
        ];
        let cfg = pick_f32_config(ranges.into_iter(), 44_100).expect("f32 range exists");
        assert_eq!(cfg.sample_rate, SampleRate(44_100));
        assert_eq!(cfg.channels, 2);
    }

    #[test]
    fn rejects_rate_outside_every_f32_range() {
        let ranges = vec![range(SampleFormat::F32, 8_000, 22_050, 1)];
        assert!(pick_f32_config(ranges.into_iter(), 44_100).is_none());
    }

    #[test]
    fn block_duration_validation() {
        assert_eq!(block_len_for_duration(0.1, 44_100).unwrap(), 4_410);
        assert!(block_len_for_duration(0.0, 44_100).is_err());
        assert!(block_len_for_duration(-1.0, 44_100).is_err());
        assert!(block_len_for_duration(f64::NAN, 44_100).is_err());
        assert!(block_len_for_duration(1e-9, 44_100).is_err());
    }
}
