//! Messages as they are exchanged with a transport, and as they are handed to a
//! receive callback.
//!
//! A [`RawMessage`] is what the transport carries: a [`MessageHeader`] and an opaque
//! body, plus an optional [`ReplyChannel`] back to whoever sent it. Only raw messages
//! tagged [`MessageTag::ROUTE`] carry an [`Envelope`](crate::Envelope) and are eligible
//! for mailbox delivery. A mailbox opens such a message into an [`OpenedMessage`]
//! before queueing it.

mod header;
pub use header::*;

mod raw;
pub use raw::*;

mod opened;
pub use opened::*;
