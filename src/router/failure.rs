//! Bouncing messages that could not be routed.

use crate::{
    message::{MessageTag, RawMessage},
    Envelope,
};

/// The status of a bounced message whose destination mailbox does not exist.
pub const STATUS_ROUTING_FAILED: u8 = u8::MAX;

/// The status of a bounced message whose destination process could not be reached.
pub const STATUS_NO_CONNECTION: u8 = u8::MAX - 1;

/// Tell the sender of `envelope` that it could not be routed.
///
/// The notice is an envelope addressed to the return address of the failed one, with
/// the failed destination encoded as its payload. It is written back over the reply
/// channel of `message` as a [`MessageTag::ROUTE`] message carrying `status`, since
/// nothing can be assumed about which mailboxes exist on either side.
///
/// Returns if the notice was written. Without a return address or a reply channel
/// the failure is only logged.
pub fn routing_failed(status: u8, envelope: &Envelope, message: &RawMessage) -> bool {
    let Some(return_address) = &envelope.return_address else {
        logger::warn!(
            "Failed to route to {} with status {}, and there is no return address.",
            envelope.destination,
            status
        );
        return false;
    };

    let notice =
        Envelope::new(return_address.clone()).with_payload(envelope.destination.to_bytes());

    if message.send_reply(MessageTag::ROUTE, notice.to_bytes(), status) {
        logger::debug!(
            "Bounced message to {} back to {} with status {}.",
            envelope.destination,
            return_address,
            status
        );
        true
    } else {
        logger::warn!(
            "Failed to route message from {} to {} with status {}, and there is no reply channel.",
            return_address,
            envelope.destination,
            status
        );
        false
    }
}
