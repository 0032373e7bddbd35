//! Cooperative stop request shared between the pipeline loop and its owner.
//!
//! A quit is raised by sending on, or dropping, the trigger side. Ctrl-C
//! handlers and UI code hold a [`QuitTrigger`]; the loop polls a
//! [`QuitSignal`] once per frame.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::cell::Cell;

/// Create a connected trigger/signal pair.
pub fn quit_signal() -> (QuitTrigger, QuitSignal) {
    let (tx, rx) = bounded(1);
    (
        QuitTrigger { tx },
        QuitSignal {
            rx,
            raised: Cell::new(false),
            _keepalive: None,
        },
    )
}

#[derive(Debug, Clone)]
pub struct QuitTrigger {
    tx: Sender<()>,
}

impl QuitTrigger {
    /// Request a stop. Repeated calls are harmless.
    pub fn trigger(&self) {
        // Full means a request is already pending.
        self.tx.try_send(()).ok();
    }
}

#[derive(Debug, Clone)]
pub struct QuitSignal {
    rx: Receiver<()>,
    raised: Cell<bool>,
    _keepalive: Option<Sender<()>>,
}

impl QuitSignal {
    /// A signal nobody can raise.
    pub fn never() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            rx,
            raised: Cell::new(false),
            _keepalive: Some(tx),
        }
    }

    /// Non-blocking check. Once raised it stays raised.
    pub fn is_raised(&self) -> bool {
        if self.raised.get() {
            return true;
        }
        let raised = match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        };
        self.raised.set(raised);
        raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_raised_initially() {
        let (_trigger, signal) = quit_signal();
        assert!(!signal.is_raised());
    }

    #[test]
    fn test_trigger_raises_signal() {
        let (trigger, signal) = quit_signal();
        trigger.trigger();
        trigger.trigger();
        assert!(signal.is_raised());
        assert!(signal.is_raised());
    }

    #[test]
    fn test_dropping_every_trigger_raises_signal() {
        let (trigger, signal) = quit_signal();
        let clone = trigger.clone();
        drop(trigger);
        assert!(!signal.is_raised());
        drop(clone);
        assert!(signal.is_raised());
    }

    #[test]
    fn test_never_is_never_raised() {
        let signal = QuitSignal::never();
        assert!(!signal.is_raised());
        assert!(!signal.clone().is_raised());
    }
}
