//! Unbounded FIFO carrying intents from producers (the voice listener, the
//! signal handler) to the coordinator thread.

use intent_parser::Intent;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use tracing::debug;

pub fn command_channel() -> (IntentSender, IntentReceiver) {
    let (tx, rx) = mpsc::channel();
    (
        IntentSender { tx },
        IntentReceiver { rx, closed: false },
    )
}

/// Producer side. Cheap to clone; each clone is an independent producer.
#[derive(Debug, Clone)]
pub struct IntentSender {
    tx: Sender<Intent>,
}

impl IntentSender {
    /// Enqueue without blocking. Dropped silently once the consumer is gone.
    pub fn push(&self, intent: Intent) {
        if self.tx.send(intent).is_err() {
            debug!("Command channel closed, dropping {}", intent);
        }
    }
}

/// Consumer side, owned by the coordinator and lent to the perception loop.
#[derive(Debug)]
pub struct IntentReceiver {
    rx: Receiver<Intent>,
    closed: bool,
}

impl IntentReceiver {
    /// Next queued intent, if any. Never blocks.
    pub fn try_pop(&mut self) -> Option<Intent> {
        match self.rx.try_recv() {
            Ok(intent) => Some(intent),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    /// Wait up to `timeout` for the next intent.
    ///
    /// With no producers left this still waits out the timeout so callers
    /// polling in a loop do not spin.
    pub fn pop_timeout(&mut self, timeout: Duration) -> Option<Intent> {
        match self.rx.recv_timeout(timeout) {
            Ok(intent) => Some(intent),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                std::thread::sleep(timeout);
                None
            }
        }
    }

    /// True once every producer has been dropped and the queue is drained.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_single_producer() {
        let (tx, mut rx) = command_channel();
        let sent = [Intent::Start, Intent::Stop, Intent::Start, Intent::Sleep];
        for intent in sent {
            tx.push(intent);
        }
        let received: Vec<_> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(received, sent);
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_two_producers_keep_relative_order() {
        let (tx, mut rx) = command_channel();
        let a = tx.clone();
        let b = tx;

        let ta = thread::spawn(move || {
            for _ in 0..500 {
                a.push(Intent::Start);
                a.push(Intent::Stop);
            }
        });
        let tb = thread::spawn(move || {
            for _ in 0..500 {
                b.push(Intent::Sleep);
            }
        });
        ta.join().unwrap();
        tb.join().unwrap();

        let received: Vec<_> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(received.len(), 1500);

        // Producer A alternates Start/Stop; that pattern must survive interleaving.
        let from_a: Vec<_> = received
            .iter()
            .filter(|i| **i != Intent::Sleep)
            .copied()
            .collect();
        assert_eq!(from_a.len(), 1000);
        for pair in from_a.chunks(2) {
            assert_eq!(pair, [Intent::Start, Intent::Stop]);
        }
        assert_eq!(received.iter().filter(|i| **i == Intent::Sleep).count(), 500);
    }

    #[test]
    fn test_pop_timeout_returns_pushed_intent() {
        let (tx, mut rx) = command_channel();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.push(Intent::Start);
        });
        let got = rx.pop_timeout(Duration::from_secs(2));
        producer.join().unwrap();
        assert_eq!(got, Some(Intent::Start));
    }

    #[test]
    fn test_closed_after_producers_drop() {
        let (tx, mut rx) = command_channel();
        tx.push(Intent::Stop);
        drop(tx);
        assert!(!rx.is_closed());
        assert_eq!(rx.try_pop(), Some(Intent::Stop));
        assert_eq!(rx.pop_timeout(Duration::from_millis(1)), None);
        assert!(rx.is_closed());
    }

    #[test]
    fn test_push_after_consumer_dropped_is_harmless() {
        let (tx, rx) = command_channel();
        drop(rx);
        tx.push(Intent::Sleep);
    }
}
