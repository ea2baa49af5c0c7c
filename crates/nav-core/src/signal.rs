use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way shutdown flag shared between the coordinator and the listener.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    raised: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_visible_to_clones() {
        let signal = ShutdownSignal::new();
        let seen_by_listener = signal.clone();
        assert!(!seen_by_listener.is_raised());
        signal.raise();
        assert!(seen_by_listener.is_raised());
    }
}
