//! The unit exchanged with transports.

use std::{fmt, sync::Arc};

use super::{MessageHeader, MessageTag};

/// The reverse path of whatever transport delivered a message.
///
/// Transports that can answer a request over the same channel it arrived on attach
/// one of these to the [`RawMessage`]s they hand to a post office.
pub trait ReplyChannel: Send + Sync {
    /// Write a reply back to the sender of the original message.
    ///
    /// Returns `false` if the reply was refused, because the channel is closed or
    /// cannot carry this kind of reply.
    fn send_reply(&self, header: MessageHeader, body: Vec<u8>) -> bool;
}

/// A message as exchanged with a transport: a header and an opaque body.
///
/// Ownership of a [`RawMessage`] is transferred on every hand-off; broadcasting
/// uses [`Self::detached_copy`] so that no two mailboxes share a buffer.
pub struct RawMessage {
    header: MessageHeader,
    body: Vec<u8>,
    reply: Option<Arc<dyn ReplyChannel>>,
}

impl fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMessage")
            .field("header", &self.header)
            .field("body_len", &self.body.len())
            .field("has_reply_channel", &self.reply.is_some())
            .finish()
    }
}

impl RawMessage {
    /// Create a new message with the given tag and body.
    pub fn new(tag: MessageTag, body: impl Into<Vec<u8>>) -> Self {
        Self::with_header(MessageHeader::new(tag), body)
    }

    /// Create a new message with the given header and body.
    pub fn with_header(header: MessageHeader, body: impl Into<Vec<u8>>) -> Self {
        Self {
            header,
            body: body.into(),
            reply: None,
        }
    }

    /// Create a new [`MessageTag::ROUTE`] message around an encoded envelope.
    pub fn routed(envelope: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageTag::ROUTE, envelope)
    }

    /// Sets the status in the header.
    pub fn with_status(mut self, status: u8) -> Self {
        self.header.status = status;
        self
    }

    /// Attach the reverse path of the transport that carried this message.
    pub fn with_reply_channel(mut self, reply: Arc<dyn ReplyChannel>) -> Self {
        self.reply = Some(reply);
        self
    }

    /// Get the header.
    pub fn header(&self) -> MessageHeader {
        self.header
    }

    /// Get the tag.
    pub fn tag(&self) -> MessageTag {
        self.header.tag
    }

    /// Get the status.
    pub fn status(&self) -> u8 {
        self.header.status
    }

    /// Get the body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get the size of the body in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Take the body out of the message.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Check if a reply can be written back over the carrying transport.
    pub fn has_reply_channel(&self) -> bool {
        self.reply.is_some()
    }

    /// Take the reply channel out of the message.
    pub(crate) fn take_reply_channel(&mut self) -> Option<Arc<dyn ReplyChannel>> {
        self.reply.take()
    }

    /// An empty message with the same header, sharing the reply channel of this one.
    ///
    /// Keeps a way to answer the sender after this message has been handed off.
    pub fn reply_path(&self) -> Self {
        Self {
            header: self.header,
            body: Vec::new(),
            reply: self.reply.clone(),
        }
    }

    /// An independent copy of this message: same header, its own copy of the body,
    /// and no reply channel.
    pub fn detached_copy(&self) -> Self {
        Self::with_header(self.header, self.body.clone())
    }

    /// Write a reply back over the transport that carried this message.
    ///
    /// Returns `false` if the message has no reply channel or the channel refused the
    /// reply, in which case the reply is dropped.
    pub fn send_reply(&self, tag: MessageTag, body: impl Into<Vec<u8>>, status: u8) -> bool {
        self.reply.as_ref().is_some_and(|reply| {
            reply.send_reply(MessageHeader::new(tag).with_status(status), body.into())
        })
    }
}
