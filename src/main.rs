use wavescope::console_display;
use wavescope::engine::{EngineConfig, EngineState, ScopeEngine};
#[cfg(feature = "hardware")]
use wavescope::serial_reader::SerialDeviceSource;
use wavescope::simulator::{SyntheticGenerator, WaveShape};
use wavescope::source::SampleSource;
use wavescope::types::*;

use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "wavescope")]
#[command(about = "Multi-channel digital oscilloscope capture engine")]
struct Cli {
    /// Run against the synthetic generator (no hardware required)
    #[arg(long, default_value_t = true)]
    simulate: bool,

    /// Serial port of the acquisition device (e.g., /dev/ttyUSB0)
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = 115200)]
    baud: u32,

    /// Acquisition sample rate (Hz)
    #[arg(long, default_value_t = 200.0)]
    sample_rate: f64,

    /// Number of input channels (1-4)
    #[arg(long, default_value_t = 4)]
    channels: usize,

    /// Synthetic waveform shape: sine, square, triangle, or rectified
    #[arg(long, default_value = "sine")]
    shape: String,

    /// Synthetic channel 1 amplitude (V)
    #[arg(long, default_value_t = 2.5)]
    amplitude: f64,

    /// Synthetic channel 1 signal frequency (Hz)
    #[arg(long, default_value_t = 1.0)]
    signal_hz: f64,

    /// Peak additive jitter for the synthetic generator (V)
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Ring buffer capacity per channel
    #[arg(long, default_value_t = 1000)]
    max_samples: usize,

    /// Visible window length in samples
    #[arg(long, default_value_t = 1000)]
    window: usize,

    /// Horizontal position offset in samples
    #[arg(long, default_value_t = 0)]
    horizontal: i32,

    /// Display refresh rate (Hz)
    #[arg(long, default_value_t = 20)]
    display_hz: u32,

    /// Trigger mode: auto, normal, or single
    #[arg(long, default_value = "auto")]
    trigger_mode: String,

    /// Trigger source: channel 1-4, or "ext"
    #[arg(long, default_value = "1")]
    trigger_source: String,

    /// Trigger slope: rising or falling
    #[arg(long, default_value = "rising")]
    trigger_slope: String,

    /// Trigger level (V)
    #[arg(long, default_value_t = 2.5)]
    trigger_level: f64,

    /// Trigger holdoff (ms)
    #[arg(long, default_value_t = 0.0)]
    holdoff: f64,

    /// Stop after this many seconds (0 = run until killed)
    #[arg(long, default_value_t = 0.0)]
    duration: f64,

    /// Write a JSON snapshot of the visible window on exit
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn trigger_config_from_cli(cli: &Cli) -> Option<TriggerConfig> {
    let mode = match cli.trigger_mode.as_str() {
        "auto" => TriggerMode::Auto,
        "normal" => TriggerMode::Normal,
        "single" => TriggerMode::Single,
        other => {
            error!("Unknown trigger mode: {}", other);
            return None;
        }
    };
    let source = match cli.trigger_source.as_str() {
        "ext" => TriggerSource::External,
        s => match s.parse::<usize>() {
            Ok(n) if (1..=MAX_CHANNELS).contains(&n) => TriggerSource::Channel(n - 1),
            _ => {
                error!("Unknown trigger source: {}", s);
                return None;
            }
        },
    };
    let slope = match cli.trigger_slope.as_str() {
        "rising" => TriggerSlope::Rising,
        "falling" => TriggerSlope::Falling,
        other => {
            error!("Unknown trigger slope: {}", other);
            return None;
        }
    };
    Some(TriggerConfig {
        mode,
        source,
        slope,
        level: cli.trigger_level,
        holdoff_ms: cli.holdoff,
    })
}

fn build_source(cli: &Cli) -> Option<Box<dyn SampleSource>> {
    if cli.simulate {
        let Some(shape) = WaveShape::from_name(&cli.shape) else {
            error!("Unknown waveform shape: {}", cli.shape);
            return None;
        };
        return Some(Box::new(
            SyntheticGenerator::new(cli.sample_rate, cli.channels)
                .with_shape(shape)
                .with_amplitude(cli.amplitude)
                .with_signal_hz(cli.signal_hz)
                .with_jitter(cli.jitter),
        ));
    }

    #[cfg(feature = "hardware")]
    {
        return match SerialDeviceSource::open(&cli.port, cli.baud, cli.channels) {
            Ok(source) => Some(Box::new(source)),
            Err(e) => {
                error!("{}", e);
                error!("Is the device connected? Run with --simulate for dev mode.");
                None
            }
        };
    }
    #[cfg(not(feature = "hardware"))]
    {
        error!("Hardware mode requires the 'hardware' feature. Falling back to simulator.");
        return Some(Box::new(
            SyntheticGenerator::new(cli.sample_rate, cli.channels).with_amplitude(cli.amplitude),
        ));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    info!("═══════════════════════════════════════════════");
    info!("  WAVESCOPE v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Mode: {}",
        if cli.simulate { "SIMULATOR" } else { "HARDWARE" }
    );
    info!(
        "  {} ch @ {} Hz, window {} samples",
        cli.channels, cli.sample_rate, cli.window
    );
    info!("═══════════════════════════════════════════════");

    let mut engine = match ScopeEngine::new(EngineConfig {
        max_samples: cli.max_samples,
        visible_count: cli.window,
    }) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    engine.set_horizontal_position(cli.horizontal);

    let Some(trigger_cfg) = trigger_config_from_cli(&cli) else {
        std::process::exit(2);
    };
    if let Err(e) = engine.configure_trigger(trigger_cfg) {
        error!("{}", e);
        std::process::exit(2);
    }

    let Some(source) = build_source(&cli) else {
        std::process::exit(1);
    };
    if let Err(e) = engine.start(source, cli.sample_rate, cli.channels) {
        error!("Failed to start acquisition: {}", e);
        std::process::exit(1);
    }

    let measure_channel = match trigger_cfg.source {
        TriggerSource::Channel(i) => i,
        TriggerSource::External => 0,
    };
    let tick_period = Duration::from_secs_f64(1.0 / cli.display_hz.max(1) as f64);
    let started = Instant::now();

    loop {
        std::thread::sleep(tick_period);
        if let Some(frame) = engine.tick() {
            debug!("{}", frame);
            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");
            println!("{}", console_display::render(&frame, measure_channel));
        }
        if engine.state() == EngineState::Faulted {
            error!(
                "Acquisition lost: {}",
                engine.last_fault().unwrap_or("unknown fault")
            );
            break;
        }
        if cli.duration > 0.0 && started.elapsed().as_secs_f64() >= cli.duration {
            info!("Run duration reached");
            break;
        }
    }

    engine.stop();

    if let Some(path) = &cli.snapshot {
        let snapshot = engine.export_snapshot();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => info!("Snapshot written to {}", path.display()),
                Err(e) => error!("Failed to write snapshot: {}", e),
            },
            Err(e) => error!("Failed to serialize snapshot: {}", e),
        }
    }
}
