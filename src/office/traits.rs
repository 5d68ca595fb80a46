//! The routing seam of a [`PostOffice`].

use super::PostOffice;
use crate::message::RawMessage;

/// Decides how a routed message reaches its destination.
///
/// Every post from a [`Dropbox`](crate::Dropbox) arrives here as a
/// [`MessageTag::ROUTE`](crate::MessageTag::ROUTE) message. An implementation would
/// typically deliver messages addressed to its own process with
/// [`PostOffice::deliver_to`], and hand everything else to a transport; see
/// [`LocalRouter`](crate::router::LocalRouter).
///
/// The router is called synchronously from whatever thread posted the message, and
/// must not block.
pub trait Router: Send + Sync {
    /// Route a message; it should be in an envelope and tagged as a routed message.
    fn route_message(&self, office: &PostOffice, message: RawMessage);

    /// Route a raw data buffer holding an encoded envelope.
    fn route_bytes(&self, office: &PostOffice, data: &[u8]) {
        self.route_message(office, RawMessage::routed(data.to_vec()))
    }
}

/// Any suitable closure can act as a [`Router`].
impl<F> Router for F
where
    F: Fn(&PostOffice, RawMessage) + Send + Sync,
{
    fn route_message(&self, office: &PostOffice, message: RawMessage) {
        self(office, message)
    }
}
