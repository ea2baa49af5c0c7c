//! Per-frame perception loop: frames in, spoken guidance out.

use crate::channel::IntentReceiver;
use crate::clock::{Clock, SystemClock};
use crate::config::NavConfig;
use crate::policy::{decide, Directive};
use crate::throttle::AnnouncementThrottle;
use crate::zone::FrameOccupancy;
use crate::Result;
use intent_parser::Intent;
use tracing::{debug, error, info};
use vision_detect::{DebugDisplay, Detection, Detector, Frame, FrameSource, NullDisplay};
use voice_local::SpeechRenderer;

/// Camera, detector and debug display held for one running episode.
///
/// All three are released when this value is dropped, so a debug window
/// never outlives the episode that opened it.
pub struct Resources {
    source: Box<dyn FrameSource + Send>,
    detector: Box<dyn Detector + Send>,
    display: Box<dyn DebugDisplay + Send>,
}

impl Resources {
    pub fn new(source: Box<dyn FrameSource + Send>, detector: Box<dyn Detector + Send>) -> Self {
        Self {
            source,
            detector,
            display: Box::new(NullDisplay),
        }
    }

    pub fn with_display(mut self, display: Box<dyn DebugDisplay + Send>) -> Self {
        self.display = display;
        self
    }
}

impl Drop for Resources {
    fn drop(&mut self) {
        info!("Releasing camera, detector and display");
    }
}

/// Opens a fresh camera + detector pair for each running episode.
pub trait ResourceFactory: Send {
    fn acquire(&mut self) -> Result<Resources>;
}

impl<F> ResourceFactory for F
where
    F: FnMut() -> Result<Resources> + Send,
{
    fn acquire(&mut self) -> Result<Resources> {
        self()
    }
}

/// Why a running episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Stop intent received
    Stopped,
    /// Sleep intent received; the assistant must shut down
    Sleep,
    /// Frame source has no more frames
    EndOfStream,
    /// Frame source reported an error
    SourceFailed,
    /// Detector reported an error
    DetectorFailed,
    /// Operator pressed the quit key on the debug display
    QuitKey,
    /// Camera or detector could not be opened
    Unavailable,
}

impl LoopExit {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopExit::Sleep)
    }
}

pub struct PerceptionLoop {
    resources: Box<dyn ResourceFactory>,
    speaker: Box<dyn SpeechRenderer + Send>,
    clock: Box<dyn Clock>,
    throttle: AnnouncementThrottle,
    confidence_threshold: f32,
    frames_processed: u64,
}

impl PerceptionLoop {
    pub fn new(
        resources: Box<dyn ResourceFactory>,
        speaker: Box<dyn SpeechRenderer + Send>,
        config: &NavConfig,
    ) -> Self {
        Self {
            resources,
            speaker,
            clock: Box::new(SystemClock),
            throttle: AnnouncementThrottle::new(config.announcement_interval()),
            confidence_threshold: config.confidence_threshold,
            frames_processed: 0,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Speak outside of the per-frame flow (lifecycle announcements).
    pub fn speak(&mut self, text: &str) {
        self.speaker.speak(text);
    }

    /// Run one episode until an intent, the frame source or an error ends it.
    ///
    /// Camera, detector and display are acquired on entry and released
    /// before return on every path.
    pub fn run(&mut self, intents: &mut IntentReceiver) -> LoopExit {
        let mut resources = match self.resources.acquire() {
            Ok(resources) => resources,
            Err(e) => {
                error!("Could not open camera or detector: {}", e);
                return LoopExit::Unavailable;
            }
        };
        info!("Object detection running");
        let start_frames = self.frames_processed;

        let exit = self.drive(&mut resources, intents);
        drop(resources);

        info!(
            "Object detection ended: {:?} after {} frames",
            exit,
            self.frames_processed - start_frames
        );
        exit
    }

    fn drive(&mut self, resources: &mut Resources, intents: &mut IntentReceiver) -> LoopExit {
        loop {
            while let Some(intent) = intents.try_pop() {
                match intent {
                    Intent::Stop => {
                        info!("Stopping object detection...");
                        return LoopExit::Stopped;
                    }
                    Intent::Sleep => {
                        info!("Terminating the program...");
                        return LoopExit::Sleep;
                    }
                    Intent::Start => info!("Start ignored: object detection already running"),
                }
            }

            let frame = match resources.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Frame source ended");
                    return LoopExit::EndOfStream;
                }
                Err(e) => {
                    error!("Frame source failed: {}", e);
                    return LoopExit::SourceFailed;
                }
            };

            let detections = match resources.detector.detect(&frame) {
                Ok(detections) => detections,
                Err(e) => {
                    error!("Detector failed: {}", e);
                    return LoopExit::DetectorFailed;
                }
            };

            self.process_frame(&frame, &detections);
            self.frames_processed += 1;

            resources.display.show(&frame, &detections);
            if resources.display.poll_quit_key() {
                info!("Quit key pressed");
                return LoopExit::QuitKey;
            }
        }
    }

    /// Aggregate one frame's detections and, if the throttle allows, speak
    /// the summary followed by the directive. Returns the directive spoken.
    pub fn process_frame(&mut self, frame: &Frame, detections: &[Detection]) -> Option<Directive> {
        let occupancy =
            FrameOccupancy::from_detections(detections, frame.width, self.confidence_threshold);
        debug!(
            "frame {}: {} detections, {} qualifying (L={} C={} R={})",
            self.frames_processed,
            detections.len(),
            occupancy.labels.len(),
            occupancy.left,
            occupancy.center,
            occupancy.right
        );
        let summary = occupancy.summary()?;
        if !self.throttle.try_announce(self.clock.now()) {
            return None;
        }

        self.speaker.speak(&summary);
        let directive = decide(&occupancy);
        if let Some(phrase) = directive.phrase() {
            self.speaker.speak(phrase);
        }
        Some(directive)
    }
}
