//! Common types for the header of a [`RawMessage`](super::RawMessage).

use std::fmt;

/// The tag of a raw message, telling the receiver how to read its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageTag(pub u32);

impl MessageTag {
    /// The body is an encoded [`Envelope`](crate::Envelope) to be routed.
    pub const ROUTE: MessageTag = MessageTag(1);

    /// The body identifies a post office joining the system.
    ///
    /// Not interpreted by the core; provided for hosts.
    pub const IDENTIFICATION: MessageTag = MessageTag(2);

    /// The body identifies a post office leaving the system.
    ///
    /// Not interpreted by the core; provided for hosts.
    pub const DROPPED: MessageTag = MessageTag(3);

    /// Check if this tag marks a routed envelope.
    pub const fn is_route(&self) -> bool {
        self.0 == Self::ROUTE.0
    }
}

impl From<u32> for MessageTag {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<MessageTag> for u32 {
    fn from(tag: MessageTag) -> Self {
        tag.0
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ROUTE => write!(f, "ROUTE"),
            Self::IDENTIFICATION => write!(f, "IDENTIFICATION"),
            Self::DROPPED => write!(f, "DROPPED"),
            MessageTag(other) => write!(f, "#{other}"),
        }
    }
}

/// The header of a raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// How to read the body.
    pub tag: MessageTag,

    /// A return status, used by reply handling logic. ``0`` means success.
    pub status: u8,
}

impl MessageHeader {
    /// Create a new header with a success status.
    pub const fn new(tag: MessageTag) -> Self {
        Self { tag, status: 0 }
    }

    /// Sets the status.
    pub const fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }
}
