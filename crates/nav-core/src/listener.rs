//! Background voice listener feeding the command channel.

use crate::channel::IntentSender;
use crate::signal::ShutdownSignal;
use intent_parser::{Intent, IntentParser};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use voice_local::{TranscribeError, Transcriber};

const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

pub struct VoiceListener<T> {
    transcriber: T,
    parser: IntentParser,
    sender: IntentSender,
    shutdown: ShutdownSignal,
    error_backoff: Duration,
    input_ended: bool,
}

impl<T> VoiceListener<T>
where
    T: Transcriber + Send + 'static,
{
    pub fn new(
        transcriber: T,
        parser: IntentParser,
        sender: IntentSender,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            transcriber,
            parser,
            sender,
            shutdown,
            error_backoff: Duration::from_millis(500),
            input_ended: false,
        }
    }

    /// Pause after a transcription service error before listening again
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// True once the transcriber reported that its input is gone for good.
    pub fn input_ended(&self) -> bool {
        self.input_ended
    }

    /// Capture one utterance and push the intent it carries, if any.
    pub fn listen_once(&mut self) -> Option<Intent> {
        debug!("Listening for command...");
        match self.transcriber.listen_once() {
            Ok(text) => {
                let text = text.to_lowercase();
                info!("Command detected: {}", text);
                let intent = self.parser.parse(&text)?;
                info!("{} command received", intent);
                self.sender.push(intent);
                Some(intent)
            }
            Err(TranscribeError::Unrecognized) => {
                debug!("Could not understand audio");
                None
            }
            Err(TranscribeError::Service(e)) => {
                warn!("Could not request results: {}", e);
                self.pause(self.error_backoff);
                None
            }
            Err(TranscribeError::EndOfInput) => {
                info!("Voice input ended, no further commands will be heard");
                self.input_ended = true;
                None
            }
        }
    }

    /// Listen until the shutdown signal is raised or the input ends.
    pub fn run(mut self) {
        info!("Voice listener started");
        while !self.shutdown.is_raised() && !self.input_ended {
            self.listen_once();
        }
        info!("Voice listener stopped");
    }

    pub fn spawn(self) -> std::io::Result<ListenerHandle> {
        let shutdown = self.shutdown.clone();
        let join = thread::Builder::new()
            .name("voice-listener".to_string())
            .spawn(move || self.run())?;
        Ok(ListenerHandle {
            join: Some(join),
            shutdown,
        })
    }

    fn pause(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.shutdown.is_raised() && Instant::now() < deadline {
            thread::sleep(SHUTDOWN_POLL.min(deadline.saturating_duration_since(Instant::now())));
        }
    }
}

pub struct ListenerHandle {
    join: Option<JoinHandle<()>>,
    shutdown: ShutdownSignal,
}

impl ListenerHandle {
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Raise the shutdown signal and wait up to `grace` for the thread.
    ///
    /// Returns false if the listener is still blocked in a capture when the
    /// grace period ends; the thread is then left to finish on its own.
    pub fn shutdown(mut self, grace: Duration) -> bool {
        self.shutdown.raise();
        let Some(join) = self.join.take() else {
            return true;
        };

        let deadline = Instant::now() + grace;
        while !join.is_finished() {
            if Instant::now() >= deadline {
                warn!("Voice listener still busy after {:?}, detaching", grace);
                return false;
            }
            thread::sleep(SHUTDOWN_POLL);
        }
        if join.join().is_err() {
            warn!("Voice listener thread panicked");
            return false;
        }
        true
    }
}
