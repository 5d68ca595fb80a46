//! An in-memory transport between post offices in the same process.

use fxhash::FxHashMap;
use std::sync::{Arc, RwLock, Weak};

use super::Transport;
use crate::{
    message::{MessageHeader, RawMessage, ReplyChannel},
    PostOffice, PostOfficeError,
};

macro_rules! ignore_poison {
    () => {
        |poison| {
            logger::warn!("Poisoned exchange lock ignored.");
            poison.into_inner()
        }
    };
}

/// Joins several [`PostOffice`]s by process id.
///
/// Each office is typically built with a [`LocalRouter`](super::LocalRouter) over a
/// shared `Arc<Exchange>`, then [attached](Self::attach). The exchange only holds
/// weak references to the offices; an office that has been dropped counts as
/// detached.
///
/// Messages sent without a reply channel get one that routes replies back into the
/// office of the origin process. Only routed replies can find their way there; direct
/// replies of any other tag are refused, so that the replying side sees them fail.
#[derive(Default)]
pub struct Exchange {
    offices: RwLock<FxHashMap<u32, Weak<PostOffice>>>,
}

impl Exchange {
    /// Create a new empty exchange.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach a post office under its process id.
    ///
    /// Returns `false` if another live office is already attached under the same id.
    pub fn attach(&self, office: &Arc<PostOffice>) -> bool {
        let mut offices = self.offices.write().unwrap_or_else(ignore_poison!());

        let pid = office.process_id();
        if offices
            .get(&pid)
            .is_some_and(|attached| attached.strong_count() > 0)
        {
            logger::warn!("Process {} is already attached to the exchange.", pid);
            return false;
        }

        offices.insert(pid, Arc::downgrade(office));
        logger::debug!("Process {} attached to the exchange.", pid);
        true
    }

    /// Detach the post office of a process. Returns if one was attached.
    pub fn detach(&self, pid: u32) -> bool {
        self.offices
            .write()
            .unwrap_or_else(ignore_poison!())
            .remove(&pid)
            .is_some()
    }

    /// Get the post office attached for a process, if it is still alive.
    pub fn office(&self, pid: u32) -> Option<Arc<PostOffice>> {
        self.offices
            .read()
            .unwrap_or_else(ignore_poison!())
            .get(&pid)
            .and_then(Weak::upgrade)
    }

    /// Check if a live post office is attached for a process.
    pub fn contains(&self, pid: u32) -> bool {
        self.office(pid).is_some()
    }

    /// Get the process ids of all live attached offices, in no particular order.
    pub fn processes(&self) -> Vec<u32> {
        self.offices
            .read()
            .unwrap_or_else(ignore_poison!())
            .iter()
            .filter(|(_, office)| office.strong_count() > 0)
            .map(|(pid, _)| *pid)
            .collect()
    }
}

impl Transport for Exchange {
    fn send(
        &self,
        origin: u32,
        destination: u32,
        message: RawMessage,
    ) -> Result<(), PostOfficeError> {
        let office = self
            .office(destination)
            .ok_or(PostOfficeError::UnknownProcess(destination))?;

        let message = match (message.has_reply_channel(), self.office(origin)) {
            (false, Some(origin)) => message.with_reply_channel(Arc::new(ReturnToOffice {
                office: Arc::downgrade(&origin),
            })),
            _ => message,
        };

        logger::trace!(
            "Exchange carrying a message from process {} to process {}.",
            origin,
            destination
        );

        office.route_message(message);
        Ok(())
    }
}

/// Routes replies into the post office that sent the original message.
struct ReturnToOffice {
    office: Weak<PostOffice>,
}

impl ReplyChannel for ReturnToOffice {
    fn send_reply(&self, header: MessageHeader, body: Vec<u8>) -> bool {
        if !header.tag.is_route() {
            logger::warn!(
                "Refusing a reply tagged {}: only routed replies can cross the exchange.",
                header.tag
            );
            return false;
        }

        match self.office.upgrade() {
            Some(office) => {
                office.route_message(RawMessage::with_header(header, body));
                true
            }
            None => {
                logger::warn!(
                    "Refusing a reply tagged {}: its post office is gone.",
                    header.tag
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        _tests::{collector, routed_to},
        proto::Address,
        router::{LocalRouter, STATUS_ROUTING_FAILED},
    };

    fn office(exchange: &Arc<Exchange>, pid: u32) -> Arc<PostOffice> {
        let office = PostOffice::with_process_id(pid, LocalRouter::new(exchange.clone()));
        assert!(exchange.attach(&office));
        office
    }

    #[test]
    fn attach_and_detach() {
        let exchange = Exchange::new_arc();
        let first = office(&exchange, 1);

        let clash = PostOffice::with_process_id(1, LocalRouter::new(exchange.clone()));
        assert!(!exchange.attach(&clash));

        assert!(exchange.contains(1));
        assert_eq!(exchange.processes(), vec![1]);

        drop(first);
        assert!(!exchange.contains(1));
        assert!(exchange.attach(&clash));

        assert!(exchange.detach(1));
        assert!(!exchange.detach(1));
    }

    #[test]
    fn unknown_process() {
        let exchange = Exchange::new_arc();

        assert!(matches!(
            exchange.send(1, 2, routed_to(2, "inbox", 1)),
            Err(PostOfficeError::UnknownProcess(2))
        ));
    }

    #[test]
    fn carries_between_offices() {
        let exchange = Exchange::new_arc();
        let first = office(&exchange, 1);
        let second = office(&exchange, 2);

        let (receive, received) = collector();
        let _inbox = second.register_address("inbox", receive);
        let (receive, _) = collector();
        let outbox = first.register_address("outbox", receive);

        outbox.post_data(&Address::new(2, "inbox"), 4u32, "over");

        assert_eq!(first.process(10), 0);
        assert_eq!(second.process(10), 1);

        let received = received.lock().unwrap();
        assert_eq!(received[0].sender(), Some(&Address::new(1, "outbox")));
        assert_eq!(received[0].payload(), b"over");
        assert!(received[0].has_reply_channel());
    }

    #[test]
    fn direct_reply_is_refused() {
        let exchange = Exchange::new_arc();
        let first = office(&exchange, 1);
        let second = office(&exchange, 2);

        let slot: Arc<std::sync::OnceLock<crate::Dropbox>> = Default::default();
        let statuses = Arc::new(std::sync::Mutex::new(Vec::new()));
        let dropbox = second.register_address("server", {
            let slot = slot.clone();
            let statuses = statuses.clone();
            move |message: crate::OpenedMessage| {
                let status = slot.get().unwrap().post_reply_data(message, 7u32, "pong", 0);
                statuses.lock().unwrap().push(status);
            }
        });
        slot.set(dropbox).unwrap();

        let (receive, received) = collector();
        let _client = first.register_address("client", receive);

        // An anonymous envelope can only be answered over the reply channel.
        exchange
            .send(1, 2, routed_to(2, "server", 1))
            .expect("Exchange refused to carry the message.");
        assert_eq!(second.process(10), 1);

        assert_eq!(*statuses.lock().unwrap(), vec![crate::PostStatus::NoReplyPath]);
        assert_eq!(first.process(10), 0);
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn bounces_back_to_origin() {
        let exchange = Exchange::new_arc();
        let first = office(&exchange, 1);
        let _second = office(&exchange, 2);

        let (receive, received) = collector();
        let outbox = first.register_address("outbox", receive);

        outbox.post_empty(&Address::new(2, "missing"), 4u32);
        assert_eq!(first.process(10), 1);

        let received = received.lock().unwrap();
        assert_eq!(received[0].status(), STATUS_ROUTING_FAILED);
        assert_eq!(
            Address::from_bytes(received[0].payload()).unwrap(),
            Address::new(2, "missing")
        );
    }
}
