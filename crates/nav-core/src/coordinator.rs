//! Lifecycle state machine: Idle, Running, Terminated.

use crate::channel::IntentReceiver;
use crate::perception::{LoopExit, PerceptionLoop};
use crate::signal::ShutdownSignal;
use intent_parser::Intent;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Terminated,
}

impl RunState {
    fn as_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Terminated => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunState::Idle,
            1 => RunState::Running,
            _ => RunState::Terminated,
        }
    }
}

/// Read-only view of the coordinator's state for other threads.
#[derive(Debug, Clone)]
pub struct RunStateHandle(Arc<AtomicU8>);

impl RunStateHandle {
    fn new(state: RunState) -> Self {
        Self(Arc::new(AtomicU8::new(state.as_u8())))
    }

    fn set(&self, state: RunState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }

    pub fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Intent(Intent),
    LoopExited(LoopExit),
    /// No producer can send intents any more
    ChannelClosed,
}

/// What the coordinator must do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    None,
    StartLoop,
    Ignore,
    Shutdown,
}

pub fn transition(state: RunState, event: Event) -> (RunState, Step) {
    match (state, event) {
        (RunState::Terminated, _) => (RunState::Terminated, Step::None),

        (RunState::Idle, Event::Intent(Intent::Start)) => (RunState::Running, Step::StartLoop),
        (RunState::Idle, Event::Intent(Intent::Stop)) => (RunState::Idle, Step::Ignore),
        (RunState::Idle, Event::Intent(Intent::Sleep)) => (RunState::Terminated, Step::Shutdown),
        (RunState::Idle, Event::ChannelClosed) => (RunState::Terminated, Step::Shutdown),
        // A loop exit can only follow Running
        (RunState::Idle, Event::LoopExited(_)) => (RunState::Idle, Step::Ignore),

        (RunState::Running, Event::Intent(_)) => (RunState::Running, Step::Ignore),
        (RunState::Running, Event::LoopExited(exit)) if exit.is_terminal() => {
            (RunState::Terminated, Step::Shutdown)
        }
        (RunState::Running, Event::LoopExited(_)) => (RunState::Idle, Step::None),
        (RunState::Running, Event::ChannelClosed) => (RunState::Running, Step::None),
    }
}

/// Owns the run state and drives the perception loop from voice intents.
pub struct Coordinator {
    state: RunState,
    handle: RunStateHandle,
    intents: IntentReceiver,
    perception: PerceptionLoop,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
    episodes: u64,
}

impl Coordinator {
    pub fn new(
        intents: IntentReceiver,
        perception: PerceptionLoop,
        shutdown: ShutdownSignal,
        poll_interval: Duration,
    ) -> Self {
        Self {
            state: RunState::Idle,
            handle: RunStateHandle::new(RunState::Idle),
            intents,
            perception,
            shutdown,
            poll_interval,
            episodes: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn state_handle(&self) -> RunStateHandle {
        self.handle.clone()
    }

    /// Number of perception episodes started so far
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn perception(&self) -> &PerceptionLoop {
        &self.perception
    }

    /// Dispatch intents until the assistant is told to sleep.
    pub fn run(&mut self) -> RunState {
        info!("Voice assistant ready, waiting for a start command");
        while self.state != RunState::Terminated {
            match self.intents.pop_timeout(self.poll_interval) {
                Some(intent) => self.handle(Event::Intent(intent)),
                None if self.intents.is_closed() => {
                    warn!("All command producers are gone");
                    self.handle(Event::ChannelClosed);
                }
                None => {}
            }
        }
        self.state
    }

    /// Apply one event, running the perception loop when it asks for it.
    pub fn handle(&mut self, event: Event) {
        let mut event = event;
        loop {
            let previous = self.state;
            let (next, step) = transition(previous, event);
            if next != previous {
                info!("{:?} -> {:?} on {:?}", previous, next, event);
            }
            self.state = next;
            self.handle.set(next);

            match step {
                Step::StartLoop => {
                    self.episodes += 1;
                    self.perception.speak("Starting object detection");
                    let exit = self.perception.run(&mut self.intents);
                    event = Event::LoopExited(exit);
                    continue;
                }
                Step::Shutdown => {
                    info!("Shutting down voice assistant");
                    self.shutdown.raise();
                }
                Step::Ignore => info!("Ignoring {:?} while {:?}", event, previous),
                Step::None => {}
            }
            return;
        }
    }
}
