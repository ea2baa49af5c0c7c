use crate::pcm::resample_nearest;
use crate::{AudioSink, Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Plays PCM on the default output device.
pub struct CpalSink {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
}

impl CpalSink {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no default output device".to_string()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| Error::Audio(format!("output config: {e}")))?;
        let format = supported.sample_format();
        Ok(Self {
            device,
            config: supported.into(),
            format,
        })
    }
}

impl AudioSink for CpalSink {
    fn play_blocking(&mut self, pcm_s16le: &[i16], sample_rate_hz: u32) -> Result<()> {
        let out_rate = self.config.sample_rate.0;
        let samples = Arc::new(resample_nearest(pcm_s16le, sample_rate_hz, out_rate));
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let stream = match self.format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&self.device, &self.config, samples.clone(), done_tx)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&self.device, &self.config, samples.clone(), done_tx)?
            }
            _ => return Err(Error::Unsupported("speaker sample format")),
        };
        stream
            .play()
            .map_err(|e| Error::Audio(format!("stream play: {e}")))?;

        let expected = Duration::from_secs_f64(samples.len() as f64 / f64::from(out_rate.max(1)));
        if done_rx.recv_timeout(expected + Duration::from_secs(1)).is_err() {
            warn!("playback did not report completion, continuing");
        }
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Vec<i16>>,
    done: mpsc::Sender<()>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let channels = usize::from(config.channels.max(1));
    let mut cursor = 0usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _| {
                for frame in data.chunks_mut(channels) {
                    let i = cursor;
                    cursor += 1;
                    let v = samples.get(i).copied().unwrap_or(0);
                    for out in frame.iter_mut() {
                        *out = T::from_sample(v);
                    }
                    if i == samples.len() {
                        let _ = done.send(());
                    }
                }
            },
            |err| warn!("output stream error: {err}"),
            None,
        )
        .map_err(|e| Error::Audio(format!("build output stream: {e}")))
}
