//! Scribekey - Push-to-talk voice-to-clipboard for Wayland
//!
//! Run with `scribekey` or `scribekey daemon` to start the daemon.
//! Use `scribekey bind <spec>` to change the recording trigger.
//! Use `scribekey transcribe <file>` to transcribe an audio file.

use clap::{Parser, Subcommand};
use scribekey::config::{self, Config};
use scribekey::hotkey::spec::parse_spec;
use scribekey::transcribe::{self, Transcriber};
use scribekey::Daemon;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scribekey")]
#[command(author, version, about = "Push-to-talk voice-to-clipboard for Wayland")]
#[command(long_about = "
Scribekey is a push-to-talk dictation tool for Wayland Linux systems.
Hold the trigger to record, release to transcribe; the transcript lands
on the clipboard, ready to paste.

SETUP:
  1. Install whisper-cli (whisper.cpp) and wl-clipboard
  2. Place a ggml model at ~/.local/share/scribekey/models/
  3. Run: scribekey (to start the daemon)

USAGE:
  Hold ctrl+` (default) while speaking, release to transcribe.
  Press ctrl+shift+h to capture a new trigger interactively, or run
  `scribekey bind <spec>` (e.g. `scribekey bind x2`).
")]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Override recording trigger (e.g., "ctrl+`", "ctrl+shift+r", "x2")
    #[arg(long, value_name = "SPEC")]
    trigger: Option<String>,

    /// Override model file path
    #[arg(long, value_name = "FILE")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Transcribe an audio file (WAV)
    Transcribe {
        /// Path to audio file
        file: PathBuf,
    },

    /// Validate a trigger spec and persist it as the recording trigger
    Bind {
        /// Trigger spec, e.g. "ctrl+`", "ctrl+shift+r", "x2"
        spec: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("scribekey={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(trigger) = cli.trigger {
        config.hotkey.recording_trigger = trigger;
    }
    if let Some(model) = cli.model {
        config.engine.model = model;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            let mut daemon = Daemon::new(config, cli.config.clone());
            daemon.run().await?;
        }

        Commands::Transcribe { file } => {
            transcribe_file(&config, &file).await?;
        }

        Commands::Bind { spec } => {
            bind_trigger(&mut config, cli.config.clone(), &spec)?;
        }

        Commands::Config => {
            show_config(&config);
        }
    }

    Ok(())
}

/// Transcribe an audio file through the configured engine
async fn transcribe_file(config: &Config, path: &PathBuf) -> anyhow::Result<()> {
    use hound::WavReader;

    println!("Loading audio file: {:?}", path);

    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    println!(
        "Audio format: {} Hz, {} channel(s), {:?}",
        spec.sample_rate, spec.channels, spec.sample_format
    );

    // Convert samples to f32
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f32 / max_val)
                .collect()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .collect(),
    };

    // Mix to mono if stereo
    let mono_samples: Vec<f32> = if spec.channels > 1 {
        samples
            .chunks(spec.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
            .collect()
    } else {
        samples
    };

    // Resample to 16kHz if needed
    let final_samples = if spec.sample_rate != 16000 {
        println!("Resampling from {} Hz to 16000 Hz...", spec.sample_rate);
        resample(&mono_samples, spec.sample_rate, 16000)
    } else {
        mono_samples
    };

    println!(
        "Processing {} samples ({:.2}s)...",
        final_samples.len(),
        final_samples.len() as f32 / 16000.0
    );

    let transcriber = transcribe::create_transcriber(&config.engine)?;
    let text = transcriber.transcribe(&final_samples).await?;

    println!("\n{}", text);
    Ok(())
}

/// Simple linear resampling
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = (src_idx - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples.get(idx).copied().unwrap_or(0.0)
        };

        output.push(sample);
    }

    output
}

/// Validate and persist a new recording trigger
fn bind_trigger(
    config: &mut Config,
    config_path: Option<PathBuf>,
    spec: &str,
) -> anyhow::Result<()> {
    let binding = parse_spec(spec)?;

    config.hotkey.recording_trigger = binding.spec_string();

    let path = config_path
        .or_else(Config::default_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file location"))?;
    config::save_config(config, &path)?;

    println!("Recording trigger set to {:?}", binding.spec_string());
    println!("Saved to {:?}", path);
    Ok(())
}

/// Show current configuration
fn show_config(config: &Config) {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("[hotkey]");
    println!("  recording_trigger = {:?}", config.hotkey.recording_trigger);
    println!("  settings_trigger = {:?}", config.hotkey.settings_trigger);

    println!("\n[audio]");
    println!("  device = {:?}", config.audio.device);
    println!("  sample_rate = {}", config.audio.sample_rate);
    println!("  max_duration_secs = {}", config.audio.max_duration_secs);

    println!("\n[engine]");
    match config.engine.path {
        Some(ref path) => println!("  path = {:?}", path),
        None => println!("  path = (search PATH)"),
    }
    println!("  model = {:?}", config.engine.model);
    println!("  timeout_secs = {}", config.engine.timeout_secs);

    println!("\n[overlay]");
    println!("  enabled = {}", config.overlay.enabled);

    println!("\n---");
    println!(
        "Config file: {:?}",
        Config::default_path().unwrap_or_else(|| PathBuf::from("(not found)"))
    );
    println!("Models dir: {:?}", Config::models_dir());
}
