//! Wavescope CLI — terminal oscilloscope and signal generator.
//!
//! This is the polling display driver: it builds the engine, starts tone
//! generation, and pulls analysis frames on its own cadence, printing the
//! estimated frequency and an ASCII half-spectrum. The audio callbacks
//! never wait for it.

use std::error::Error;
use std::io::Write;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait};
use wavescope_core::synth::Waveform;
use wavescope_engine::{AudioEngine, DEFAULT_SAMPLE_RATE};

/// Poll cadence of the render loop (the analysis side is free-running and
/// independent of audio callback timing).
const POLL_INTERVAL: Duration = Duration::from_millis(33);

/// Width of the ASCII spectrum display.
const SPECTRUM_COLS: usize = 48;

#[derive(Debug, Default)]
struct Args {
    list_devices: bool,
    sample_rate: Option<u32>,
    wave: Option<String>,
    freq: Option<f32>,
    amp: Option<f32>,
    gain: Option<f32>,
    trigger: Option<f32>,
    block_secs: Option<f64>,
    max_freq: Option<f32>,
    duration_sec: Option<u64>,
    no_tone: bool,
}

fn parse_args() -> Args {
    let mut a = Args::default();
    for s in std::env::args().skip(1) {
        if s == "--list-devices" { a.list_devices = true; continue; }
        if s == "--no-tone"      { a.no_tone = true;      continue; }
        if let Some(rest) = s.strip_prefix("--sample-rate=") { a.sample_rate  = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--wave=")        { a.wave         = Some(rest.to_string());continue; }
        if let Some(rest) = s.strip_prefix("--freq=")        { a.freq         = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--amp=")         { a.amp          = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--gain=")        { a.gain         = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--trigger=")     { a.trigger      = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--block=")       { a.block_secs   = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--max-freq=")    { a.max_freq     = rest.parse().ok();     continue; }
        if let Some(rest) = s.strip_prefix("--duration=")    { a.duration_sec = rest.parse().ok();     continue; }
        eprintln!("[warn] unknown arg: {s}");
    }
    a
}

fn parse_wave(name: &str) -> Option<Waveform> {
    match name.to_ascii_lowercase().as_str() {
        "sine" | "sin" => Some(Waveform::Sine),
        "sawtooth" | "saw" => Some(Waveform::Sawtooth),
        "triangle" | "tri" => Some(Waveform::Triangle),
        "square" | "sq" => Some(Waveform::Square),
        _ => None,
    }
}

fn list_devices() -> Result<(), Box<dyn Error>> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices()? {
        println!("- {}", dev.name()?);
    }
    println!("Available input devices:");
    for dev in host.input_devices()? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

/// Bucket the half-spectrum up to `max_hz` into fixed-width columns, one
/// character per column scaled by the bucket maximum.
fn spectrum_bars(spectrum: &[f32], freq_axis: &[f32], max_hz: f32) -> String {
    const RAMP: &[u8] = b" .:-=+*#%@";
    let upper = spectrum
        .iter()
        .zip(freq_axis)
        .take_while(|(_, &f)| f <= max_hz)
        .count()
        .max(1)
        .min(spectrum.len());
    let mut bars = String::with_capacity(SPECTRUM_COLS);
    for col in 0..SPECTRUM_COLS {
        let start = col * upper / SPECTRUM_COLS;
        let end = ((col + 1) * upper / SPECTRUM_COLS).max(start + 1).min(upper);
        let peak = spectrum[start..end].iter().copied().fold(0.0_f32, f32::max);
        let idx = ((peak * (RAMP.len() - 1) as f32).round() as usize).min(RAMP.len() - 1);
        bars.push(RAMP[idx] as char);
    }
    bars
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();

    if args.list_devices {
        list_devices()?;
        return Ok(());
    }

    println!("wavescope-cli — realtime oscilloscope / signal generator\n");

    let sample_rate = args.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
    let block_secs = args.block_secs.unwrap_or(0.1);

    let mut engine = AudioEngine::new(sample_rate, (block_secs * sample_rate as f64) as usize)?;

    if let Some(name) = &args.wave {
        match parse_wave(name) {
            Some(wave) => engine.set_waveform(wave),
            None => eprintln!("[warn] unknown waveform: {name} (sine/sawtooth/triangle/square)"),
        }
    }
    if let Some(hz) = args.freq { engine.set_frequency(hz); }
    if let Some(a) = args.amp { engine.set_amplitude(a); }
    if let Some(g) = args.gain { engine.set_display_gain(g); }
    if let Some(v) = args.trigger { engine.set_trigger_level(v); }
    if let Some(hz) = args.max_freq { engine.set_spectrum_display_max_freq(hz); }

    let p = engine.params();
    println!(
        "Tone: {} @ {:.1} Hz, amplitude {:.3} | trigger {:.2}, gain {:.2}, block {:.3} s",
        p.waveform().label(),
        p.frequency(),
        p.amplitude(),
        p.trigger_level(),
        p.display_gain(),
        engine.capture_block_len() as f64 / sample_rate as f64,
    );
    if !engine.capture_available() {
        println!("Capture unavailable: running as generator only, no display.");
    }
    if let Some(d) = args.duration_sec { println!("Auto-stop after {d} seconds"); }
    println!("Press Ctrl+C to stop…\n");

    if !args.no_tone {
        engine.start_output()?;
    }

    let mut view = engine.view();
    let started = Instant::now();
    let mut stdout = std::io::stdout();

    loop {
        if let Some(frame) = view.poll() {
            let bars = spectrum_bars(&frame.spectrum, &frame.freq_axis, frame.max_display_hz);
            print!("\r[scope] est {:8.1} Hz  |{}|", frame.estimated_hz, bars);
            stdout.flush()?;
        }
        std::thread::sleep(POLL_INTERVAL);

        if let Some(d) = args.duration_sec {
            if started.elapsed() >= Duration::from_secs(d) {
                engine.stop_output()?;
                let status = engine.status();
                println!(
                    "\n[scope] done: {} output / {} input stream errors, {} dropped blocks",
                    status.output_errors, status.input_errors, status.dropped_blocks
                );
                return Ok(());
            }
        }
    }
}
