use anyhow::{Context, Result};
use clap::Parser;
use nav_core::{
    command_channel, Coordinator, Intent, NavConfig, PerceptionLoop, ShutdownSignal, VoiceListener,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use vision_detect::ComputeDevice;

mod backends;
use backends::{AsrBackend, SpeechBackend, VisionBackend};

#[derive(Parser, Debug)]
#[command(name = "guide-daemon")]
#[command(about = "Voice-controlled obstacle guidance assistant")]
struct Args {
    /// YAML or JSON configuration file
    #[arg(long, env = "GUIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Minimum detector confidence for a detection to count
    #[arg(long, env = "GUIDE_CONFIDENCE")]
    confidence_threshold: Option<f32>,

    /// Seconds between two spoken announcements
    #[arg(long, env = "GUIDE_ANNOUNCE_INTERVAL")]
    announce_interval: Option<f64>,

    /// Compute device for the detector (auto, cpu, cuda)
    #[arg(long, env = "GUIDE_DEVICE")]
    device: Option<ComputeDevice>,

    /// Camera index or video file path
    #[arg(long, env = "GUIDE_CAMERA")]
    camera: Option<String>,

    /// ONNX detector model
    #[arg(long)]
    model: Option<String>,

    /// Class names file, one per line
    #[arg(long)]
    labels: Option<String>,

    #[arg(long)]
    start_word: Option<String>,

    #[arg(long)]
    stop_word: Option<String>,

    #[arg(long)]
    sleep_word: Option<String>,

    /// Show detections in a debug window (opencv backend only)
    #[arg(long)]
    debug_display: bool,

    #[arg(long, value_enum, default_value = "script")]
    asr_backend: AsrBackend,

    /// Phrases replayed by the script backend, comma separated
    #[arg(long, value_delimiter = ',', default_value = "assist,hello,stop,assist,sleep")]
    script: Vec<String>,

    /// Seconds between scripted phrases
    #[arg(long, default_value = "4")]
    script_pace: f64,

    /// Whisper ggml model for the mic backend (e.g. ggml-base.en.bin)
    #[arg(long, env = "WHISPER_MODEL_PATH")]
    whisper_model: Option<String>,

    #[arg(long, value_enum, default_value = "log")]
    speech: SpeechBackend,

    #[arg(long, value_enum, default_value = "mock")]
    vision: VisionBackend,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let args = Args::parse();
    let config = build_config(&args)?;

    info!("Guidance assistant starting");
    info!(
        "Keywords: start={:?} stop={:?} sleep={:?}",
        config.keywords.start, config.keywords.stop, config.keywords.sleep
    );
    info!(
        "Confidence threshold {} | announce every {:?}",
        config.confidence_threshold,
        config.announcement_interval()
    );

    let parser = intent_parser::IntentParser::new(config.keywords.clone())
        .context("building keyword matcher")?;
    let (intents, inbox) = command_channel();
    let shutdown = ShutdownSignal::new();

    let pace = Duration::try_from_secs_f64(args.script_pace.max(0.0))
        .context("invalid --script-pace")?;
    let transcriber = backends::transcriber(
        args.asr_backend,
        &args.script,
        pace,
        args.whisper_model.as_deref(),
    )?;
    let listener = VoiceListener::new(transcriber, parser, intents.clone(), shutdown.clone())
        .spawn()
        .context("starting voice listener")?;

    let perception = PerceptionLoop::new(
        backends::resource_factory(args.vision, &config)?,
        backends::speaker(args.speech)?,
        &config,
    );
    let mut coordinator = Coordinator::new(inbox, perception, shutdown, config.poll_interval());
    let state = coordinator.state_handle();

    let mut worker = tokio::task::spawn_blocking(move || {
        let final_state = coordinator.run();
        (final_state, coordinator.episodes())
    });

    let (final_state, episodes) = tokio::select! {
        joined = &mut worker => joined.context("coordinator thread panicked")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            info!("Interrupted while {:?}, asking the assistant to sleep", state.get());
            intents.push(Intent::Sleep);
            worker.await.context("coordinator thread panicked")?
        }
    };

    if !listener.shutdown(Duration::from_secs(2)) {
        warn!("Voice listener did not stop in time");
    }
    info!(
        "Guidance assistant finished in state {:?} after {} detection episodes",
        final_state, episodes
    );
    Ok(())
}

/// File configuration with command-line overrides applied on top.
fn build_config(args: &Args) -> Result<NavConfig> {
    let mut config = match &args.config {
        Some(path) => NavConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => NavConfig::default(),
    };

    if let Some(threshold) = args.confidence_threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(interval) = args.announce_interval {
        config.announcement_interval_secs = interval;
    }
    if let Some(device) = args.device {
        config.device = device;
    }
    if let Some(camera) = &args.camera {
        config.camera = camera.clone();
    }
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(labels) = &args.labels {
        config.labels_path = labels.clone();
    }
    if let Some(word) = &args.start_word {
        config.keywords.start = word.clone();
    }
    if let Some(word) = &args.stop_word {
        config.keywords.stop = word.clone();
    }
    if let Some(word) = &args.sleep_word {
        config.keywords.sleep = word.clone();
    }
    if args.debug_display {
        config.debug_display = true;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn setup_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["guide-daemon"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = args(&[]);
        assert_eq!(args.asr_backend, AsrBackend::Script);
        assert_eq!(args.script, vec!["assist", "hello", "stop", "assist", "sleep"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config, NavConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = args(&[
            "--confidence-threshold",
            "0.5",
            "--announce-interval",
            "2",
            "--device",
            "gpu",
            "--start-word",
            "guide me",
            "--script",
            "guide me,sleep",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.announcement_interval(), Duration::from_secs(2));
        assert_eq!(config.device, ComputeDevice::Cuda);
        assert_eq!(config.keywords.start, "guide me");
        assert_eq!(args.script, vec!["guide me", "sleep"]);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = args(&["--confidence-threshold", "3"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_unrepresentable_interval_rejected() {
        let args = args(&["--announce-interval", "1e20"]);
        assert!(build_config(&args).is_err());
    }
}
