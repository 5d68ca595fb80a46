//! The post office model.
//!
use fxhash::FxHashMap;
use std::{
    collections::hash_map::Entry,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use super::Router;
use crate::{
    mailbox::{DeliveryOutcome, Mailbox},
    message::*,
    proto::Address,
    Dropbox, PostOfficeConfig,
};

/// The map of mailboxes by their local address.
pub type MailboxMap = FxHashMap<String, Arc<Mailbox>>;

macro_rules! ignore_poison {
    ($what:literal) => {
        |poison| {
            logger::warn!(
                "Poisoned mailbox registry lock ignored while {what}.",
                what = $what
            );
            poison.into_inner()
        }
    };
}

/// The registry and scheduler of all mailboxes in a process.
///
/// A [`PostOffice`] is always shared behind an [`Arc`]: the dropboxes it hands out
/// keep a weak reference back to it, so that they can route posts and unregister
/// themselves, without keeping it alive.
///
/// Deliveries may arrive on a receive thread while a host thread calls
/// [`Self::process`]; receive callbacks are always invoked without any registry lock
/// held, so they are free to register or remove mailboxes and to post messages.
pub struct PostOffice {
    process_id: u32,
    mailboxes: RwLock<MailboxMap>,
    router: Box<dyn Router>,

    /// A weak reference to itself, handed to every [`Dropbox`].
    _cyclical: Weak<Self>,
}

impl PostOffice {
    /// Create a new post office for the current process, routing through `router`.
    pub fn new_arc(router: impl Router + 'static) -> Arc<Self> {
        Self::with_process_id(std::process::id(), router)
    }

    /// Create a new post office that identifies as process `process_id`.
    ///
    /// Useful to run several post offices in a single process.
    pub fn with_process_id(process_id: u32, router: impl Router + 'static) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            process_id,
            mailboxes: RwLock::new(MailboxMap::default()),
            router: Box::new(router),
            _cyclical: weak_self.clone(),
        })
    }

    /// Create a new post office from a [`PostOfficeConfig`].
    pub fn from_config(config: &PostOfficeConfig, router: impl Router + 'static) -> Arc<Self> {
        Self::with_process_id(config.process_id(), router)
    }

    /// Get the process id this post office identifies as.
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Get the full address of a local mailbox name.
    pub fn address_of(&self, local_address: &str) -> Address {
        Address::new(self.process_id, local_address)
    }

    fn read(&self) -> RwLockReadGuard<'_, MailboxMap> {
        self.mailboxes
            .read()
            .unwrap_or_else(ignore_poison!("reading"))
    }

    fn write(&self) -> RwLockWriteGuard<'_, MailboxMap> {
        self.mailboxes
            .write()
            .unwrap_or_else(ignore_poison!("writing"))
    }

    /// Get the mailbox at a local address.
    fn get(&self, local_address: &str) -> Option<Arc<Mailbox>> {
        self.read().get(local_address).cloned()
    }

    /// A snapshot of all the mailboxes, so that no lock is held while they are used.
    fn snapshot(&self) -> Vec<Arc<Mailbox>> {
        self.read().values().cloned().collect()
    }

    /// Creates and registers a mailbox at `local_address`.
    ///
    /// Returns the [`Dropbox`] the mailbox owner uses to send addressed messages. If
    /// the address is already taken, nothing is registered and the returned dropbox is
    /// a [duplicate](crate::DropboxStatus::Duplicate) that will not send anything.
    pub fn register_address<F>(&self, local_address: &str, receive: F) -> Dropbox
    where
        F: Fn(OpenedMessage) + Send + Sync + 'static,
    {
        match self.write().entry(local_address.to_owned()) {
            Entry::Occupied(_) => {
                logger::warn!(
                    "Address {} is already registered in process {}.",
                    local_address,
                    self.process_id
                );
                return Dropbox::duplicate(local_address, self.process_id);
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mailbox::new(local_address, Box::new(receive))));
            }
        }

        logger::debug!(
            "Registered mailbox {} in process {}.",
            local_address,
            self.process_id
        );

        let post = {
            let office = self._cyclical.clone();
            move |message: RawMessage| match office.upgrade() {
                Some(office) => {
                    office.route_message(message);
                    true
                }
                None => {
                    logger::warn!("Post office is gone, dropping {:?}.", message);
                    false
                }
            }
        };

        let unregister = {
            let office = self._cyclical.clone();
            move |local_address: &str| {
                office
                    .upgrade()
                    .is_some_and(|office| office.remove_mailbox(local_address))
            }
        };

        Dropbox::new(
            local_address,
            self.process_id,
            Box::new(post),
            Box::new(unregister),
        )
    }

    /// Removes a mailbox from the post office.
    ///
    /// Messages still queued in the mailbox are discarded. Returns if a mailbox was
    /// removed.
    pub fn remove_mailbox(&self, local_address: &str) -> bool {
        let removed = self.write().remove(local_address);

        // Closed outside the lock; a pass already holding the mailbox stops at once.
        if let Some(mailbox) = &removed {
            let _discarded = mailbox.close();
            logger::debug!(
                "Removed mailbox {} from process {}, discarding {} queued messages.",
                local_address,
                self.process_id,
                _discarded
            );
        }

        removed.is_some()
    }

    /// Delivers a message to a local mailbox.
    ///
    /// If there is no mailbox at `local_address`, the message is handed to `failed`
    /// instead, and `false` is returned; this is where a router can escalate to
    /// routing the message elsewhere.
    pub fn deliver_to<F>(&self, local_address: &str, message: RawMessage, failed: F) -> bool
    where
        F: FnOnce(RawMessage),
    {
        match self.get(local_address) {
            Some(mailbox) => {
                let _outcome = mailbox.deliver(message);
                logger::trace!(
                    "Delivered to {} in process {}: {:?}.",
                    local_address,
                    self.process_id,
                    _outcome
                );
                true
            }
            None => {
                logger::trace!(
                    "No mailbox {} in process {}.",
                    local_address,
                    self.process_id
                );
                failed(message);
                false
            }
        }
    }

    /// Delivers a message to a local mailbox, discarding it if there is no mailbox at
    /// `local_address`.
    pub fn deliver(&self, local_address: &str, message: RawMessage) -> bool {
        self.deliver_to(local_address, message, |_| {})
    }

    /// Delivers a copy of a message to every local mailbox, except the one at `except`.
    ///
    /// Each mailbox receives its own [detached copy](RawMessage::detached_copy). Returns
    /// the number of mailboxes that queued their copy.
    pub fn deliver_all(&self, message: &RawMessage, except: Option<&str>) -> usize {
        self.snapshot()
            .into_iter()
            .filter(|mailbox| Some(mailbox.address()) != except)
            .map(|mailbox| mailbox.deliver(message.detached_copy()))
            .filter(|outcome| *outcome == DeliveryOutcome::Queued)
            .count()
    }

    /// Processes messages waiting in the mailboxes.
    ///
    /// Every mailbox gets the same share of `how_many`, rounded, but at least one
    /// message each, regardless of how deep its queue is. Returns the number of
    /// messages processed.
    pub fn process(&self, how_many: usize) -> usize {
        let mailboxes = self.snapshot();
        if mailboxes.is_empty() {
            return 0;
        }

        let per_mailbox = share_per_mailbox(how_many, mailboxes.len());

        mailboxes
            .iter()
            .map(|mailbox| mailbox.process(per_mailbox))
            .sum()
    }

    /// Routes a message through the router of this post office.
    pub fn route_message(&self, message: RawMessage) {
        self.router.route_message(self, message)
    }

    /// Routes a raw data buffer holding an encoded envelope through the router of this
    /// post office.
    pub fn route_bytes(&self, data: &[u8]) {
        self.router.route_bytes(self, data)
    }

    /// Check if a mailbox is registered at `local_address`.
    pub fn contains(&self, local_address: &str) -> bool {
        self.read().contains_key(local_address)
    }

    /// Get the number of messages waiting in the mailbox at `local_address`.
    pub fn queued(&self, local_address: &str) -> Option<usize> {
        self.get(local_address).map(|mailbox| mailbox.len())
    }

    /// Get the local addresses of all registered mailboxes, in no particular order.
    pub fn addresses(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Get the number of registered mailboxes.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if no mailboxes are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The share of `how_many` each of `mailboxes` gets: rounded, and at least one.
pub fn share_per_mailbox(how_many: usize, mailboxes: usize) -> usize {
    if mailboxes == 0 {
        return 0;
    }

    ((how_many as f64 / mailboxes as f64).round() as usize).max(1)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        _tests::{collector, recording_router, routed_to},
        DropboxStatus, Removal,
    };
    use std::sync::Mutex;

    const PID: u32 = 1000;

    #[test]
    fn registration_uniqueness() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let (first, first_received) = collector();
        let (second, second_received) = collector();

        let dropbox = office.register_address("x", first);
        let duplicate = office.register_address("x", second);

        assert!(dropbox.is_valid());
        assert!(!duplicate.is_valid());
        assert_eq!(duplicate.status(), DropboxStatus::Duplicate);
        assert_eq!(office.len(), 1);

        office.deliver("x", routed_to(PID, "x", 1));
        office.process(10);

        assert_eq!(first_received.lock().unwrap().len(), 1);
        assert!(second_received.lock().unwrap().is_empty());
    }

    #[test]
    fn post_goes_to_router() {
        let (router, routed) = recording_router();
        let office = PostOffice::with_process_id(PID, router);
        let (receive, _) = collector();

        let dropbox = office.register_address("worker1", receive);
        dropbox.post_data(&Address::new(1234, "worker2"), 42u32, "hello");

        let routed = routed.lock().unwrap();
        assert_eq!(routed.len(), 1);

        let envelope = crate::Envelope::from_bytes(routed[0].body()).unwrap();
        assert_eq!(envelope.destination, Address::new(1234, "worker2"));
        assert_eq!(envelope.return_address, Some(Address::new(PID, "worker1")));
        assert_eq!(envelope.message_kind, Some(42));
        assert_eq!(envelope.payload.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn remove_through_dropbox() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);
        let (receive, _) = collector();

        let mut dropbox = office.register_address("worker1", receive);
        assert!(office.contains("worker1"));

        assert_eq!(dropbox.remove(), Removal::Unregistered);
        assert!(!office.contains("worker1"));
        assert_eq!(dropbox.remove(), Removal::Inactive);

        // The address is free again.
        let (receive, _) = collector();
        assert!(office.register_address("worker1", receive).is_valid());
    }

    #[test]
    fn remove_after_office_removed_mailbox() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);
        let (receive, _) = collector();

        let mut dropbox = office.register_address("worker1", receive);

        assert!(office.remove_mailbox("worker1"));
        assert!(!office.remove_mailbox("worker1"));
        assert_eq!(dropbox.remove(), Removal::AlreadyGone);
    }

    #[test]
    fn dropbox_outlives_office() {
        let (router, routed) = recording_router();
        let office = PostOffice::with_process_id(PID, router);
        let (receive, _) = collector();

        let mut dropbox = office.register_address("worker1", receive);
        drop(office);

        // The router went away with the office, so nothing can be recorded.
        assert_eq!(
            dropbox.post_empty(&Address::new(1, "anyone"), 1u32),
            crate::PostStatus::Inactive
        );
        assert!(routed.lock().unwrap().is_empty());
        assert_eq!(dropbox.remove(), Removal::AlreadyGone);
    }

    #[test]
    fn deliver_to_unknown() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let failed = Mutex::new(None);
        let delivered = office.deliver_to("nobody", routed_to(PID, "nobody", 3), |message| {
            *failed.lock().unwrap() = Some(message);
        });

        assert!(!delivered);
        let failed = failed.into_inner().unwrap().expect("Failure callback not called.");
        assert_eq!(failed.tag(), MessageTag::ROUTE);
    }

    #[test]
    fn broadcast_exclusion_and_isolation() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let (receive_a, received_a) = collector();
        let (receive_b, received_b) = collector();
        let _a = office.register_address("a", receive_a);
        let _b = office.register_address("b", receive_b);

        let message = routed_to(PID, "anyone", 5);

        assert_eq!(office.deliver_all(&message, Some("a")), 1);
        assert_eq!(office.queued("a"), Some(0));
        assert_eq!(office.queued("b"), Some(1));

        // The original is untouched and still ours.
        assert_eq!(message.tag(), MessageTag::ROUTE);
        assert!(!message.is_empty());

        assert_eq!(office.deliver_all(&message, None), 2);
        office.process(10);

        assert_eq!(received_a.lock().unwrap().len(), 1);
        assert_eq!(received_b.lock().unwrap().len(), 2);
    }

    #[test]
    fn fair_share_processing() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let receivers = ["m1", "m2", "m3"]
            .into_iter()
            .map(|name| {
                let (receive, received) = collector();
                let dropbox = office.register_address(name, receive);
                for kind in 0..10 {
                    office.deliver(name, routed_to(PID, name, kind));
                }
                (dropbox, received)
            })
            .collect::<Vec<_>>();

        assert_eq!(office.process(9), 9);

        for (_, received) in &receivers {
            assert_eq!(received.lock().unwrap().len(), 3);
        }
        for name in ["m1", "m2", "m3"] {
            assert_eq!(office.queued(name), Some(7));
        }
    }

    #[test]
    fn at_least_one_each() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let receivers = (0..4)
            .map(|index| {
                let name = format!("m{index}");
                let (receive, received) = collector();
                let dropbox = office.register_address(&name, receive);
                office.deliver(&name, routed_to(PID, &name, 1));
                office.deliver(&name, routed_to(PID, &name, 2));
                (dropbox, received)
            })
            .collect::<Vec<_>>();

        assert_eq!(office.process(1), 4);
        for (_, received) in &receivers {
            assert_eq!(received.lock().unwrap().len(), 1);
        }
    }

    #[test]
    fn share() {
        assert_eq!(share_per_mailbox(9, 3), 3);
        assert_eq!(share_per_mailbox(10, 4), 3);
        assert_eq!(share_per_mailbox(9, 4), 2);
        assert_eq!(share_per_mailbox(1, 4), 1);
        assert_eq!(share_per_mailbox(0, 4), 1);
        assert_eq!(share_per_mailbox(10, 0), 0);
    }

    #[test]
    fn process_without_mailboxes() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        assert_eq!(office.process(10), 0);
    }

    #[test]
    fn callback_may_register_during_process() {
        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let registered = Arc::new(Mutex::new(Vec::new()));
        let _dropbox = office.register_address("spawner", {
            let office = Arc::downgrade(&office);
            let registered = registered.clone();
            move |message: OpenedMessage| {
                if let Some(office) = office.upgrade() {
                    let name = format!("child{}", message.kind());
                    let (receive, _) = collector();
                    registered
                        .lock()
                        .unwrap()
                        .push(office.register_address(&name, receive));
                }
            }
        });

        office.deliver("spawner", routed_to(PID, "spawner", 1));
        office.deliver("spawner", routed_to(PID, "spawner", 2));

        assert_eq!(office.process(10), 2);
        assert!(office.contains("child1"));
        assert!(office.contains("child2"));
        assert_eq!(registered.lock().unwrap().len(), 2);
    }

    #[test]
    fn removed_during_process() {
        const COUNT: usize = 8;

        let (router, _) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        let names = (0..COUNT).map(|index| format!("m{index}")).collect::<Vec<_>>();
        let called = Arc::new(Mutex::new(Vec::new()));
        let removed = Arc::new(Mutex::new(Vec::<String>::new()));

        let _dropboxes = names
            .iter()
            .map(|name| {
                let dropbox = office.register_address(name, {
                    let office = Arc::downgrade(&office);
                    let names = names.clone();
                    let name = name.clone();
                    let called = called.clone();
                    let removed = removed.clone();
                    move |_message: OpenedMessage| {
                        called.lock().unwrap().push(name.clone());
                        let Some(office) = office.upgrade() else {
                            return;
                        };
                        for other in names.iter().filter(|other| **other != name) {
                            if office.remove_mailbox(other) {
                                removed.lock().unwrap().push(other.clone());
                            }
                        }
                    }
                });
                office.deliver(name, routed_to(PID, name, 1));
                dropbox
            })
            .collect::<Vec<_>>();

        assert_eq!(office.process(COUNT * 10), 1);

        let called = called.lock().unwrap();
        assert_eq!(called.len(), 1);
        assert_eq!(removed.lock().unwrap().len(), COUNT - 1);
        assert!(!removed.lock().unwrap().contains(&called[0]));
        assert_eq!(office.addresses(), vec![called[0].clone()]);
    }

    #[test]
    fn route_bytes() {
        let (router, routed) = recording_router();
        let office = PostOffice::with_process_id(PID, router);

        office.route_bytes(routed_to(PID, "x", 1).body());

        let routed = routed.lock().unwrap();
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].tag(), MessageTag::ROUTE);
    }
}
