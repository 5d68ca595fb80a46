//! The mailbox model.
//!
use deadqueue::unlimited::Queue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{message::*, Envelope};

/// The callback invoked with each message when a mailbox is processed.
///
/// The callback should not process the post office it was registered with directly;
/// a [`Dispatcher`](crate::Dispatcher) defers such nested processing instead.
pub type ReceiveCallback = Box<dyn Fn(OpenedMessage) + Send + Sync>;

/// The result of delivering a [`RawMessage`] to a [`Mailbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The message was opened and queued.
    Queued,

    /// The message was not a routed envelope, and was ignored.
    NotRouted,

    /// The message claimed to be a routed envelope but could not be decoded. It was
    /// dropped and counted.
    Malformed,

    /// The mailbox has been closed, and takes no more messages.
    Closed,
}

/// An addressable inbound endpoint with a receive callback and a FIFO queue.
///
/// [`Self::deliver`] and [`Self::process`] may be called from different threads: the
/// queue is the only shared state, and it is a concurrency-safe [`Queue`].
pub struct Mailbox {
    address: String,
    receive: ReceiveCallback,

    /// Opened messages awaiting the receive callback, in arrival order.
    queue: Queue<OpenedMessage>,

    /// The number of malformed envelopes dropped by this mailbox.
    malformed: AtomicUsize,

    /// Set once the mailbox is removed from its post office.
    closed: AtomicBool,
}

impl Mailbox {
    /// Create a new mailbox with the given local address and receive callback.
    pub fn new(address: impl ToString, receive: ReceiveCallback) -> Self {
        Self {
            address: address.to_string(),
            receive,
            queue: Queue::new(),
            malformed: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Get the local address of this mailbox.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Deliver a message to this mailbox, to be handled by the receive callback when
    /// the mailbox is next processed.
    ///
    /// Messages that are not tagged [`MessageTag::ROUTE`] are ignored. This never
    /// invokes the receive callback.
    pub fn deliver(&self, message: RawMessage) -> DeliveryOutcome {
        if self.is_closed() {
            logger::trace!("Mailbox {} is closed, dropping {:?}.", self.address, message);
            return DeliveryOutcome::Closed;
        }

        if !message.tag().is_route() {
            logger::trace!(
                "Mailbox {} ignored a message tagged {}.",
                self.address,
                message.tag()
            );
            return DeliveryOutcome::NotRouted;
        }

        match Envelope::from_bytes(message.body()) {
            Ok(envelope) => {
                self.queue.push(OpenedMessage::open(envelope, message));
                DeliveryOutcome::Queued
            }
            Err(err) => {
                let dropped = self.malformed.fetch_add(1, Ordering::Relaxed) + 1;
                logger::warn!(
                    "Mailbox {} dropped a malformed envelope of {} bytes ({} so far): {}",
                    self.address,
                    message.len(),
                    dropped,
                    err
                );
                DeliveryOutcome::Malformed
            }
        }
    }

    /// Process up to `how_many` queued messages, oldest first.
    ///
    /// Each message is handed to the receive callback, which runs to completion before
    /// the next message is considered. Returns the number of messages processed, which
    /// is fewer than `how_many` if the queue runs dry, or if the mailbox is closed
    /// meanwhile.
    pub fn process(&self, how_many: usize) -> usize {
        let mut processed = 0;

        while processed < how_many && !self.is_closed() {
            let Some(message) = self.queue.try_pop() else {
                break;
            };

            (self.receive)(message);
            processed += 1;
        }

        processed
    }

    /// Close this mailbox: queued messages are discarded, and neither delivery nor
    /// processing has any effect afterwards.
    ///
    /// Returns the number of messages discarded.
    pub fn close(&self) -> usize {
        self.closed.store(true, Ordering::Release);

        let mut discarded = 0;
        while self.queue.try_pop().is_some() {
            discarded += 1;
        }
        discarded
    }

    /// Check if this mailbox has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get the number of messages waiting to be processed.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if no messages are waiting to be processed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of malformed envelopes this mailbox has dropped.
    pub fn malformed(&self) -> usize {
        self.malformed.load(Ordering::Relaxed)
    }
}
