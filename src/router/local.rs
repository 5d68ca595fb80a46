//! The standard router.

use super::{routing_failed, Transport, STATUS_NO_CONNECTION, STATUS_ROUTING_FAILED};
use crate::{message::RawMessage, office::Router, Envelope, PostOffice};

/// Delivers messages addressed to its own process locally, and sends everything else
/// through a [`Transport`].
///
/// Messages that cannot be delivered are bounced back to their sender with
/// [`routing_failed`].
#[derive(Debug, Clone)]
pub struct LocalRouter<T: Transport> {
    transport: T,
}

impl<T: Transport> LocalRouter<T> {
    /// Create a new router sending non-local messages through `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the transport of this router.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Router for LocalRouter<T> {
    fn route_message(&self, office: &PostOffice, message: RawMessage) {
        if !message.tag().is_route() {
            logger::warn!(
                "Process {} cannot route a message tagged {}, dropping it.",
                office.process_id(),
                message.tag()
            );
            return;
        }

        let envelope = match Envelope::from_bytes(message.body()) {
            Ok(envelope) => envelope,
            Err(err) => {
                logger::warn!(
                    "Process {} dropped an unroutable message of {} bytes: {}",
                    office.process_id(),
                    message.len(),
                    err
                );
                return;
            }
        };

        let destination = envelope.destination.pid;

        if destination == office.process_id() {
            office.deliver_to(&envelope.destination.mailbox, message, |message| {
                routing_failed(STATUS_ROUTING_FAILED, &envelope, &message);
            });
            return;
        }

        let reply_path = message.reply_path();

        logger::trace!(
            "Process {} sending message for {} over the transport.",
            office.process_id(),
            envelope.destination
        );

        if let Err(err) = self
            .transport
            .send(office.process_id(), destination, message)
        {
            logger::warn!(
                "Process {} failed to send a message to {}: {}",
                office.process_id(),
                envelope.destination,
                err
            );
            routing_failed(STATUS_NO_CONNECTION, &envelope, &reply_path);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        _tests::{collector, routed_to, RecordingReply},
        message::MessageTag,
        proto::Address,
        PostOfficeError,
    };
    use std::sync::{Arc, Mutex};

    const PID: u32 = 10;

    /// A transport recording what it sends, or refusing everything.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(u32, u32, RawMessage)>>,
        refuse: bool,
    }

    impl Transport for RecordingTransport {
        fn send(
            &self,
            origin: u32,
            destination: u32,
            message: RawMessage,
        ) -> Result<(), PostOfficeError> {
            if self.refuse {
                return Err(PostOfficeError::TransportClosed("refused".to_owned()));
            }

            self.sent.lock().unwrap().push((origin, destination, message));
            Ok(())
        }
    }

    fn signed(destination: Address) -> RawMessage {
        RawMessage::routed(
            Envelope::new(destination)
                .with_return_address(Address::new(99, "sender"))
                .with_kind(1)
                .to_bytes(),
        )
    }

    #[test]
    fn delivers_locally() {
        let transport = Arc::new(RecordingTransport::default());
        let office = PostOffice::with_process_id(PID, LocalRouter::new(transport.clone()));

        let (receive, received) = collector();
        let _dropbox = office.register_address("inbox", receive);

        office.route_message(routed_to(PID, "inbox", 3));
        assert_eq!(office.process(10), 1);

        assert_eq!(received.lock().unwrap()[0].kind(), 3);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn sends_remote() {
        let transport = Arc::new(RecordingTransport::default());
        let office = PostOffice::with_process_id(PID, LocalRouter::new(transport.clone()));

        let (receive, _) = collector();
        let dropbox = office.register_address("outbox", receive);
        dropbox.post_data(&Address::new(20, "inbox"), 5u32, "hi");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!((sent[0].0, sent[0].1), (PID, 20));
        assert_eq!(sent[0].2.tag(), MessageTag::ROUTE);
    }

    #[test]
    fn unknown_local_mailbox_is_bounced() {
        let transport = Arc::new(RecordingTransport::default());
        let office = PostOffice::with_process_id(PID, LocalRouter::new(transport));
        let reply = RecordingReply::new_arc();

        office.route_message(signed(Address::new(PID, "missing")).with_reply_channel(reply.clone()));

        let replies = reply.take();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0.tag, MessageTag::ROUTE);
        assert_eq!(replies[0].0.status, STATUS_ROUTING_FAILED);

        let notice = Envelope::from_bytes(&replies[0].1).unwrap();
        assert_eq!(notice.destination, Address::new(99, "sender"));
        assert_eq!(
            Address::from_bytes(notice.payload.as_deref().unwrap()).unwrap(),
            Address::new(PID, "missing")
        );
    }

    #[test]
    fn transport_failure_is_bounced() {
        let transport = RecordingTransport {
            refuse: true,
            ..Default::default()
        };
        let office = PostOffice::with_process_id(PID, LocalRouter::new(transport));
        let reply = RecordingReply::new_arc();

        office.route_message(signed(Address::new(30, "inbox")).with_reply_channel(reply.clone()));

        let replies = reply.take();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0.status, STATUS_NO_CONNECTION);
    }

    #[test]
    fn drops_garbage() {
        let transport = Arc::new(RecordingTransport::default());
        let office = PostOffice::with_process_id(PID, LocalRouter::new(transport.clone()));
        let reply = RecordingReply::new_arc();

        office.route_message(RawMessage::routed(vec![0xff, 0xff]).with_reply_channel(reply.clone()));
        office.route_message(RawMessage::new(MessageTag::IDENTIFICATION, b"who".to_vec()));

        assert!(reply.take().is_empty());
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
