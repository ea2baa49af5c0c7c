use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Mono samples per chunk sent on the capture channel.
pub const CHUNK_SAMPLES: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicConfig {
    pub sample_rate_hz: u32,
    pub channels: u16,
}

/// Default-input capture running on its own thread.
///
/// The cpal stream lives on that thread; dropping the handle stops it and
/// closes the PCM channel.
pub struct MicCapture {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MicCapture {
    /// Open the default input device and start streaming mono i16 chunks
    /// (first channel only) at the device's native rate.
    pub fn start_default() -> Result<(Self, MicConfig, Receiver<Vec<i16>>)> {
        let (pcm_tx, pcm_rx) = mpsc::channel::<Vec<i16>>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<MicConfig>>(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || match open_default_input(pcm_tx) {
                Ok((stream, config)) => {
                    let _ = ready_tx.send(Ok(config));
                    // blocks until the handle is dropped
                    let _ = stop_rx.recv();
                    drop(stream);
                    debug!("microphone stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| Error::Audio(format!("spawn capture thread: {e}")))?;

        let config = ready_rx
            .recv()
            .map_err(|_| Error::Audio("capture thread exited".to_string()))??;
        Ok((
            Self {
                stop: Some(stop_tx),
                thread: Some(thread),
            },
            config,
            pcm_rx,
        ))
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("capture thread panicked");
            }
        }
    }
}

fn open_default_input(tx: Sender<Vec<i16>>) -> Result<(cpal::Stream, MicConfig)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::Audio("no default input device".to_string()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| Error::Audio(format!("input config: {e}")))?;
    let format = supported.sample_format();
    let config = MicConfig {
        sample_rate_hz: supported.sample_rate().0,
        channels: supported.channels(),
    };
    let stream_config: cpal::StreamConfig = supported.into();

    let stream = match format {
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, tx)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, tx)?,
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, tx)?,
        _ => return Err(Error::Unsupported("microphone sample format")),
    };
    stream
        .play()
        .map_err(|e| Error::Audio(format!("stream play: {e}")))?;
    Ok((stream, config))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<Vec<i16>>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    let mut buf = Vec::<i16>::with_capacity(CHUNK_SAMPLES * 2);
    device
        .build_input_stream(
            config,
            move |data: &[T], _| {
                buf.extend(
                    data.chunks_exact(channels)
                        .map(|frame| frame[0].to_sample::<i16>()),
                );
                if buf.len() >= CHUNK_SAMPLES {
                    let _ = tx.send(std::mem::take(&mut buf));
                }
            },
            |err| warn!("input stream error: {err}"),
            None,
        )
        .map_err(|e| Error::Audio(format!("build input stream: {e}")))
}
