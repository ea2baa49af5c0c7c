//! Construction of the pluggable voice, speech and vision backends.

use anyhow::Result;
use clap::ValueEnum;
use nav_core::{NavConfig, ResourceFactory, Resources};
use std::io::BufReader;
use std::time::Duration;
use tracing::{info, warn};
use vision_detect::{BoundingBox, Detection, MockCamera, ScriptedDetector};
use voice_local::{LineTranscriber, LogSpeaker, ScriptedTranscriber, SpeechRenderer, Transcriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AsrBackend {
    /// Replay the `--script` phrases, one every few seconds
    Script,
    /// Read one command per line from standard input
    Stdin,
    /// Default microphone transcribed by a local Whisper model
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpeechBackend {
    /// Log spoken text only
    Log,
    /// Play a tone per utterance on the default output device
    Tone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VisionBackend {
    /// Synthetic camera with a cycling demo scene
    Mock,
    /// OpenCV camera and ONNX detector
    Opencv,
}

const MOCK_WIDTH: u32 = 640;
const MOCK_HEIGHT: u32 = 480;
const MOCK_FRAMES: u64 = 300;

/// Longest wait for one spoken command before the attempt counts as silence
#[cfg_attr(not(all(feature = "audio", feature = "whisper")), allow(dead_code))]
const UTTERANCE_TIMEOUT: Duration = Duration::from_secs(10);

pub fn transcriber(
    backend: AsrBackend,
    script: &[String],
    pace: Duration,
    whisper_model: Option<&str>,
) -> Result<Box<dyn Transcriber + Send>> {
    match backend {
        AsrBackend::Script => {
            info!("Using scripted commands: {:?}", script);
            Ok(Box::new(
                ScriptedTranscriber::from_phrases(script.iter().cloned())
                    .with_pace(pace)
                    .with_idle(Duration::from_secs(1)),
            ))
        }
        AsrBackend::Stdin => {
            info!("Type commands on standard input, one per line");
            Ok(Box::new(LineTranscriber::new(BufReader::new(
                std::io::stdin(),
            ))))
        }
        AsrBackend::Mic => mic_transcriber(whisper_model),
    }
}

#[cfg(all(feature = "audio", feature = "whisper"))]
fn mic_transcriber(whisper_model: Option<&str>) -> Result<Box<dyn Transcriber + Send>> {
    use anyhow::Context;
    use voice_local::{
        AsrTranscriber, EndpointConfig, MicCapture, SegmentingAsr, WhisperRecognizer,
    };

    let model = whisper_model.context("the mic backend needs --whisper-model")?;
    let recognizer = WhisperRecognizer::load(model, Some("en"))
        .with_context(|| format!("loading Whisper model {model}"))?;
    let (capture, mic, audio) =
        MicCapture::start_default().context("opening the default microphone")?;
    info!(
        "Listening on the default microphone ({} Hz, {} channels)",
        mic.sample_rate_hz, mic.channels
    );
    let asr = SegmentingAsr::new(recognizer, mic.sample_rate_hz, EndpointConfig::default());
    Ok(Box::new(
        AsrTranscriber::new(Box::new(asr), audio, UTTERANCE_TIMEOUT).with_source(capture),
    ))
}

#[cfg(not(all(feature = "audio", feature = "whisper")))]
fn mic_transcriber(_whisper_model: Option<&str>) -> Result<Box<dyn Transcriber + Send>> {
    anyhow::bail!("the mic backend requires building with the `audio` and `whisper` features")
}

pub fn speaker(backend: SpeechBackend) -> Result<Box<dyn SpeechRenderer + Send>> {
    match backend {
        SpeechBackend::Log => Ok(Box::new(LogSpeaker)),
        SpeechBackend::Tone => tone_speaker(),
    }
}

#[cfg(feature = "audio")]
fn tone_speaker() -> Result<Box<dyn SpeechRenderer + Send>> {
    use anyhow::Context;
    use voice_local::{CpalSink, MockTts, TtsConfig, TtsEngine, TtsSpeaker};

    let sink = CpalSink::open_default().context("opening the default audio output")?;
    let engine = MockTts::new(TtsConfig {
        voice: None,
        sample_rate_hz: 22_050,
    });
    Ok(Box::new(TtsSpeaker::new(engine, Box::new(sink))))
}

#[cfg(not(feature = "audio"))]
fn tone_speaker() -> Result<Box<dyn SpeechRenderer + Send>> {
    anyhow::bail!("tone speech requires building with the `audio` feature")
}

pub fn resource_factory(
    backend: VisionBackend,
    config: &NavConfig,
) -> Result<Box<dyn ResourceFactory>> {
    match backend {
        VisionBackend::Mock => {
            if config.debug_display {
                warn!("Debug display needs the opencv vision backend, continuing without it");
            }
            Ok(Box::new(mock_factory()))
        }
        VisionBackend::Opencv => opencv_factory(config),
    }
}

fn mock_factory() -> impl ResourceFactory {
    || -> nav_core::Result<Resources> {
        let camera = MockCamera::new(MOCK_WIDTH, MOCK_HEIGHT)
            .with_limit(MOCK_FRAMES)
            .with_frame_interval(Duration::from_millis(33));
        let scene = demo_scene();
        let script = scene
            .iter()
            .cycle()
            .take(MOCK_FRAMES as usize)
            .cloned()
            .collect::<Vec<_>>();
        Ok(Resources::new(
            Box::new(camera),
            Box::new(ScriptedDetector::new(script)),
        ))
    }
}

/// A short walk past a person, a chair and a parked car, 30 frames each.
fn demo_scene() -> Vec<Vec<Detection>> {
    let person = Detection::new("person", 0.92, BoundingBox::new(280.0, 100.0, 80.0, 300.0));
    let chair = Detection::new("chair", 0.86, BoundingBox::new(40.0, 260.0, 120.0, 160.0));
    let car = Detection::new("car", 0.9, BoundingBox::new(480.0, 200.0, 150.0, 120.0));
    let faint = Detection::new("dog", 0.4, BoundingBox::new(300.0, 300.0, 60.0, 60.0));

    [
        vec![person.clone()],
        vec![person.clone(), chair.clone()],
        vec![faint],
        vec![chair.clone(), car.clone()],
        vec![person, chair, car],
    ]
    .into_iter()
    .flat_map(|frame| std::iter::repeat(frame).take(30))
    .collect()
}

#[cfg(feature = "opencv")]
fn opencv_factory(config: &NavConfig) -> Result<Box<dyn ResourceFactory>> {
    use anyhow::Context;
    use vision_detect::{labels::load_labels, HighGuiDisplay, OnnxDetector, OpenCvCamera};

    let labels = load_labels(&config.labels_path)
        .with_context(|| format!("loading class names from {}", config.labels_path))?;
    let camera = config.camera.clone();
    let model = config.model_path.clone();
    let device = config.device;
    let debug_display = config.debug_display;
    info!("Vision: camera {} model {} on {}", camera, model, device);

    Ok(Box::new(move || -> nav_core::Result<Resources> {
        let source = OpenCvCamera::open(&camera)?;
        let detector = OnnxDetector::load(&model, labels.clone(), device)?;
        let resources = Resources::new(Box::new(source), Box::new(detector));
        if !debug_display {
            return Ok(resources);
        }
        let display = HighGuiDisplay::new("Object detection")?;
        Ok(resources.with_display(Box::new(display)))
    }))
}

#[cfg(not(feature = "opencv"))]
fn opencv_factory(_config: &NavConfig) -> Result<Box<dyn ResourceFactory>> {
    anyhow::bail!("the opencv vision backend requires building with the `opencv` feature")
}
