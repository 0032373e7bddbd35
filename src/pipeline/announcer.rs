//! Asynchronous, drop-on-full announcement delivery.
//!
//! The frame loop enqueues with [`AnnouncementChannel::try_announce`], which
//! never blocks. One worker thread drains the queue in FIFO order and calls
//! the speech engine for each item, so at most one utterance is in flight.
//! Speech failures and panics are reported and swallowed.

use crate::defaults;
use crate::error::{Result, SeesayError};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::speech::SpeechEngine;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Text destined for speech, consumed once by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementRequest {
    text: String,
}

impl AnnouncementRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnnouncerConfig {
    /// Queue capacity; announcements beyond this are dropped.
    pub capacity: NonZeroUsize,
    /// How long the idle worker waits for an item before re-checking for shutdown.
    pub wait_timeout: Duration,
    /// How long `shutdown` waits for the worker to exit.
    pub shutdown_timeout: Duration,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(defaults::QUEUE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            wait_timeout: Duration::from_millis(defaults::WAIT_TIMEOUT_MS),
            shutdown_timeout: Duration::from_millis(defaults::SHUTDOWN_TIMEOUT_MS),
        }
    }
}

/// Queue plus the worker thread that speaks its items.
pub struct AnnouncementChannel {
    queue_tx: Option<Sender<AnnouncementRequest>>,
    /// Dropped (before `queue_tx`) to cancel the worker.
    cancel_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    capacity: NonZeroUsize,
    shutdown_timeout: Duration,
}

impl AnnouncementChannel {
    /// Start the worker with a logging error reporter.
    pub fn spawn(engine: Arc<dyn SpeechEngine>, config: AnnouncerConfig) -> Result<Self> {
        Self::spawn_with_reporter(engine, config, Arc::new(LogReporter))
    }

    pub fn spawn_with_reporter(
        engine: Arc<dyn SpeechEngine>,
        config: AnnouncerConfig,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let (queue_tx, queue_rx) = bounded::<AnnouncementRequest>(config.capacity.get());
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let wait_timeout = config.wait_timeout;

        let worker = thread::Builder::new()
            .name("announcer".to_string())
            .spawn(move || {
                run_worker(
                    &queue_rx,
                    &cancel_rx,
                    engine.as_ref(),
                    reporter.as_ref(),
                    wait_timeout,
                )
            })?;

        Ok(Self {
            queue_tx: Some(queue_tx),
            cancel_tx: Some(cancel_tx),
            worker: Some(worker),
            capacity: config.capacity,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Enqueue without blocking. False when the queue is full or shut down.
    pub fn try_announce(&self, text: impl Into<String>) -> bool {
        let Some(tx) = &self.queue_tx else {
            return false;
        };
        tx.try_send(AnnouncementRequest::new(text)).is_ok()
    }

    /// Items waiting for the worker.
    pub fn pending(&self) -> usize {
        self.queue_tx.as_ref().map_or(0, Sender::len)
    }

    /// Announcements accepted before `try_announce` starts dropping.
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Stop the worker and wait for it up to the shutdown timeout.
    ///
    /// Queued items are discarded. An utterance already being spoken is left
    /// to its own timeout; if the worker is still busy at the deadline it is
    /// detached and `false` is returned. Idempotent.
    pub fn shutdown(&mut self) -> bool {
        self.cancel_tx.take();
        self.queue_tx.take();

        let Some(handle) = self.worker.take() else {
            return true;
        };

        let deadline = Instant::now() + self.shutdown_timeout;
        let poll_interval = Duration::from_millis(10);
        loop {
            if handle.is_finished() {
                if let Err(panic_info) = handle.join() {
                    tracing::warn!("announcer thread panicked: {}", panic_message(&*panic_info));
                }
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "announcer still busy after {:?}, detaching",
                    self.shutdown_timeout
                );
                return false;
            }
            thread::sleep(poll_interval);
        }
    }
}

impl Drop for AnnouncementChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    queue_rx: &Receiver<AnnouncementRequest>,
    cancel_rx: &Receiver<()>,
    engine: &dyn SpeechEngine,
    reporter: &dyn ErrorReporter,
    wait_timeout: Duration,
) {
    tracing::debug!(engine = engine.name(), "announcer started");
    loop {
        match queue_rx.recv_timeout(wait_timeout) {
            Ok(request) => {
                // Shutdown may race an item out of the queue; cancellation wins.
                if is_cancelled(cancel_rx) {
                    break;
                }
                speak_one(engine, reporter, &request);
            }
            Err(RecvTimeoutError::Timeout) => {
                if is_cancelled(cancel_rx) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("announcer stopped");
}

fn is_cancelled(cancel_rx: &Receiver<()>) -> bool {
    !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty))
}

fn speak_one(engine: &dyn SpeechEngine, reporter: &dyn ErrorReporter, request: &AnnouncementRequest) {
    let started = Instant::now();
    match panic::catch_unwind(AssertUnwindSafe(|| engine.speak(request.text()))) {
        Ok(Ok(())) => {
            tracing::debug!(
                text = request.text(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "announced"
            );
        }
        Ok(Err(e)) => reporter.report("announcer", &e),
        Err(panic_info) => reporter.report(
            "announcer",
            &SeesayError::Speech {
                message: format!("speech engine panicked: {}", panic_message(&*panic_info)),
            },
        ),
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> &str {
    panic_info
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}
