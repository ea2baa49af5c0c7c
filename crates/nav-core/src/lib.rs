//! nav-core: voice-commanded obstacle guidance
//!
//! This crate holds the concurrency and decision core of the guidance
//! assistant:
//! - a command channel carrying voice intents between threads
//! - the voice listener that turns transcripts into intents
//! - per-frame zone classification and the navigation decision table
//! - a throttle limiting how often guidance is spoken
//! - the perception loop and the coordinator lifecycle state machine
//!
//! Camera, detector, transcription and speech are reached only through the
//! traits in `vision-detect` and `voice-local`.

mod error;
pub use error::{NavError, Result};

pub mod config;
pub use config::NavConfig;

pub mod channel;
pub use channel::{command_channel, IntentReceiver, IntentSender};

mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

mod signal;
pub use signal::ShutdownSignal;

pub mod throttle;
pub use throttle::AnnouncementThrottle;

pub mod zone;
pub use zone::{classify, FrameOccupancy, Zone};

pub mod policy;
pub use policy::{decide, Directive};

pub mod listener;
pub use listener::{ListenerHandle, VoiceListener};

pub mod perception;
pub use perception::{LoopExit, PerceptionLoop, ResourceFactory, Resources};

pub mod coordinator;
pub use coordinator::{transition, Coordinator, Event, RunState, RunStateHandle, Step};

pub use intent_parser::Intent;
