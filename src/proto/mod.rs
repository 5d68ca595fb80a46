//! protobuf records and their implementations.
//!
//! The [`WireEnvelope`] is what actually travels between post offices: a routed
//! message whose body is an encoded [`WireEnvelope`] is tagged
//! [`MessageTag::ROUTE`](crate::MessageTag::ROUTE). Every field except the
//! destination is optional on the wire, and absent fields stay absent after a
//! round trip.
//!
//! The validated, domain-level form is [`Envelope`](crate::Envelope).

/// The address of a mailbox: the owning process and the name of the mailbox in it.
///
/// Mailbox names are only unique within one process.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Address {
    /// The process id of the post office owning the mailbox.
    #[prost(uint32, tag = "1")]
    pub pid: u32,

    /// The local name of the mailbox.
    #[prost(string, tag = "2")]
    pub mailbox: String,
}

/// The envelope record as encoded on the wire.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WireEnvelope {
    /// Destination of the message. Required, but optional in the protobuf sense.
    #[prost(message, optional, tag = "1")]
    pub address: Option<Address>,

    /// Where replies should go.
    #[prost(message, optional, tag = "2")]
    pub return_address: Option<Address>,

    /// The kind of message, interpreted by the receiver.
    #[prost(uint32, optional, tag = "3")]
    pub message_id: Option<u32>,

    /// The opaque payload.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub payload: Option<Vec<u8>>,
}

mod implementations;
