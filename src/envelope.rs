//! The envelope wrapping every routed message.

use crate::{
    proto::{Address, WireEnvelope},
    PostOfficeError,
};

/// A routed message: a destination, where to reply, what kind of message it is,
/// and an opaque payload.
///
/// An [`Envelope`] is built fresh for every post and never mutated after it has been
/// serialized. Optional fields that were not set are absent on the wire too; an
/// envelope with an empty payload is different from one without a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The mailbox this envelope is addressed to.
    pub destination: Address,

    /// The mailbox replies should be sent to.
    pub return_address: Option<Address>,

    /// The kind of message, interpreted by the receiver.
    pub message_kind: Option<u32>,

    /// The opaque payload.
    pub payload: Option<Vec<u8>>,
}

impl Envelope {
    /// Create a new envelope to the given destination, with every optional field absent.
    pub fn new(destination: Address) -> Self {
        Self {
            destination,
            return_address: None,
            message_kind: None,
            payload: None,
        }
    }

    /// Sets the return address.
    pub fn with_return_address(mut self, return_address: Address) -> Self {
        self.return_address = Some(return_address);
        self
    }

    /// Sets the message kind.
    pub fn with_kind(mut self, message_kind: u32) -> Self {
        self.message_kind = Some(message_kind);
        self
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Serialize the envelope into bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        WireEnvelope::from(self).to_bytes()
    }

    /// Deserialize an envelope from bytes.
    ///
    /// Fails if the bytes are not a valid envelope, or if the envelope has no
    /// destination.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PostOfficeError> {
        WireEnvelope::from_bytes(bytes)?.try_into()
    }
}
