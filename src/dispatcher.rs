//! Drives the processing of a [`PostOffice`] from a host loop.
//!
//! Receive callbacks may themselves ask for the office to be processed, for example
//! while waiting for an answer. A [`Dispatcher`] never processes an office re-entrantly:
//! such a nested [`Dispatcher::tick`] is deferred, and the outer tick makes one more
//! pass when its current one is done.
//!

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
    time::Duration,
};
use tokio::sync::Notify;

use crate::{
    config::{DEFAULT_PROCESS_BATCH, DEFAULT_TICK_INTERVAL},
    PostOffice, PostOfficeConfig,
};

/// The result of a [`Dispatcher::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The office was processed; this many messages were handed to receive callbacks.
    Processed(usize),

    /// The office was already being processed; another pass has been scheduled.
    Deferred,
}

/// Processes a [`PostOffice`] in batches, on demand or on a timer.
pub struct Dispatcher {
    office: Arc<PostOffice>,
    batch: usize,
    interval: Duration,

    processing: AtomicBool,
    needs_processing: AtomicBool,

    handle: OnceLock<tokio::task::JoinHandle<()>>,
    _terminate_flag: Arc<Notify>,
}

/// Clears the processing flag, even if a receive callback panics.
struct ProcessingGuard<'d>(&'d AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Dispatcher {
    /// Create a new dispatcher for `office` with the default batch and interval.
    pub fn new(office: Arc<PostOffice>) -> Self {
        Self {
            office,
            batch: DEFAULT_PROCESS_BATCH,
            interval: DEFAULT_TICK_INTERVAL,
            processing: AtomicBool::new(false),
            needs_processing: AtomicBool::new(false),
            handle: OnceLock::new(),
            _terminate_flag: Arc::new(Notify::new()),
        }
    }

    /// Create a new dispatcher for `office` from a [`PostOfficeConfig`].
    pub fn from_config(office: Arc<PostOffice>, config: &PostOfficeConfig) -> Self {
        Self::new(office)
            .with_batch(config.batch)
            .with_interval(config.tick_interval())
    }

    /// Sets the number of messages to process per pass.
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch;
        self
    }

    /// Sets the interval between ticks once [started](Self::start).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Get the office this dispatcher processes.
    pub fn office(&self) -> &Arc<PostOffice> {
        &self.office
    }

    /// Get the number of messages processed per pass.
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Process the office once.
    ///
    /// If the office is already being processed, typically because this was called
    /// from inside a receive callback or from another thread, nothing is processed
    /// here; the ongoing tick makes another pass instead.
    pub fn tick(&self) -> TickOutcome {
        // Requested before claiming, so that a claim lost to another tick is never
        // missed by it.
        self.needs_processing.store(true, Ordering::SeqCst);

        if self.processing.swap(true, Ordering::SeqCst) {
            logger::trace!(
                "Deferred processing of process {}.",
                self.office.process_id()
            );
            return TickOutcome::Deferred;
        }

        let mut processed = 0;

        loop {
            {
                let _guard = ProcessingGuard(&self.processing);

                while self.needs_processing.swap(false, Ordering::SeqCst) {
                    processed += self.office.process(self.batch);
                }
            }

            // A tick deferred after the last pass but before the release is picked up
            // here, unless yet another tick has claimed the office meanwhile.
            if !self.needs_processing.load(Ordering::SeqCst)
                || self.processing.swap(true, Ordering::SeqCst)
            {
                break;
            }
        }

        TickOutcome::Processed(processed)
    }

    /// Start ticking on the configured interval in the background.
    ///
    /// The spawned task only holds a weak reference to the dispatcher, and terminates
    /// when the dispatcher is dropped or [stopped](Self::stop). Calling this more than
    /// once has no effect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let weak_self = Arc::downgrade(self);
        let arc_notify = Arc::clone(&self._terminate_flag);
        let period = self.interval;

        self.handle.get_or_init(|| {
            tokio::spawn(async move {
                let ticks = async move {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                    loop {
                        interval.tick().await;

                        let Some(arc_self) = weak_self.upgrade() else {
                            logger::info!("Terminating dispatcher due to dropped reference.");
                            break;
                        };

                        if let TickOutcome::Processed(_count @ 1..) = arc_self.tick() {
                            logger::trace!(
                                "Dispatcher processed {} messages in process {}.",
                                _count,
                                arc_self.office.process_id()
                            );
                        }
                    }
                };

                tokio::select! {
                    _ = arc_notify.notified() => {
                        logger::info!("Terminating dispatcher due to termination notification.");
                    },
                    _ = ticks => {},
                }
            })
        });
    }

    /// Check if the background task has been started and is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .get()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the background task, if any.
    pub fn stop(&self) {
        logger::debug!(
            "Stopping dispatcher of process {}...",
            self.office.process_id()
        );
        self._terminate_flag.notify_one();
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        logger::debug!("Drop triggered on Dispatcher.");
        self.stop()
    }
}
