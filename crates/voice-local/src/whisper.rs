use crate::pcm::{resample_nearest, to_f32};
use crate::{Error, Result, UtteranceRecognizer};
use tracing::debug;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const WHISPER_RATE_HZ: u32 = 16_000;

/// Local Whisper recogniser for a ggml model file (for example
/// `ggml-base.en.bin`). Input at any rate is resampled to 16 kHz.
pub struct WhisperRecognizer {
    _context: WhisperContext,
    state: whisper_rs::WhisperState,
    language: Option<String>,
}

impl WhisperRecognizer {
    pub fn load(model_path: &str, language: Option<&str>) -> Result<Self> {
        let context =
            WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
                .map_err(|e| Error::Recognizer(format!("load {model_path}: {e}")))?;
        let state = context
            .create_state()
            .map_err(|e| Error::Recognizer(format!("state init: {e}")))?;
        Ok(Self {
            _context: context,
            state,
            language: language.map(str::to_string),
        })
    }
}

impl UtteranceRecognizer for WhisperRecognizer {
    fn recognize(&mut self, pcm_s16le: &[i16], sample_rate_hz: u32) -> Result<String> {
        if pcm_s16le.is_empty() {
            return Ok(String::new());
        }
        let samples = to_f32(&resample_nearest(pcm_s16le, sample_rate_hz, WHISPER_RATE_HZ));

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_no_timestamps(true);
        params.set_language(self.language.as_deref());

        self.state
            .full(params, &samples)
            .map_err(|e| Error::Recognizer(format!("inference: {e}")))?;
        let text = self
            .state
            .as_iter()
            .filter_map(|segment| segment.to_str().ok().map(str::to_string))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();
        debug!("whisper: {:?}", text);
        Ok(text)
    }
}
