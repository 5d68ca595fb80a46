//! A routed message after its envelope has been opened by a mailbox.

use std::{fmt, sync::Arc};

use super::{MessageHeader, MessageTag, RawMessage, ReplyChannel};
use crate::{proto::Address, Envelope, PostOfficeError};

/// A delivered message, unwrapped from its [`Envelope`].
///
/// Created exactly once per delivered envelope and owned by the mailbox queue until
/// the mailbox is processed, at which point ownership passes to the receive callback.
pub struct OpenedMessage {
    kind: u32,
    status: u8,
    payload: Option<Vec<u8>>,
    sender: Option<Address>,
    reply: Option<Arc<dyn ReplyChannel>>,
}

impl fmt::Debug for OpenedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedMessage")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("payload_len", &self.payload.as_ref().map(Vec::len))
            .field("sender", &self.sender)
            .field("has_reply_channel", &self.reply.is_some())
            .finish()
    }
}

impl OpenedMessage {
    /// Open an envelope that arrived in the given raw message.
    ///
    /// The kind falls back to the raw tag if the envelope carries none; the sender is
    /// the envelope's return address. The raw message's reply channel is kept for
    /// [`Self::send_reply`].
    pub fn open(envelope: Envelope, mut raw: RawMessage) -> Self {
        let header = raw.header();

        Self {
            kind: envelope.message_kind.unwrap_or(header.tag.0),
            status: header.status,
            payload: envelope.payload,
            sender: envelope.return_address,
            reply: raw.take_reply_channel(),
        }
    }

    /// The kind of message, used by the receiver to decide how to read the payload.
    pub fn kind(&self) -> u32 {
        self.kind
    }

    /// The status carried in the header of the raw message.
    pub fn status(&self) -> u8 {
        self.status
    }

    /// The payload, or an empty slice if the envelope carried none.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }

    /// Check if the envelope carried a payload at all.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Take the payload out of the message.
    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }

    /// The address of the mailbox that sent the message, if any.
    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }

    /// Check if a reply can be written back over the carrying transport.
    pub fn has_reply_channel(&self) -> bool {
        self.reply.is_some()
    }

    /// Deserializes the payload into the given type.
    ///
    /// This is the counterpart of [`Dropbox::post`](crate::Dropbox::post).
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, PostOfficeError> {
        serde_json::from_slice(self.payload()).map_err(|err| {
            logger::debug!(
                "Failed to parse payload of kind {} into {}: {}",
                self.kind,
                std::any::type_name::<T>(),
                err
            );
            PostOfficeError::Serde(err)
        })
    }

    /// Reply directly over the transport that carried this message, bypassing
    /// addressed routing.
    ///
    /// The reply is a raw message tagged with `kind` whose body is `data` as is.
    /// Returns `false` if there is no reply channel or the channel refused the reply,
    /// in which case the reply is dropped.
    pub fn send_reply(&self, kind: u32, data: impl Into<Vec<u8>>, status: u8) -> bool {
        self.reply.as_ref().is_some_and(|reply| {
            reply.send_reply(
                MessageHeader::new(MessageTag(kind)).with_status(status),
                data.into(),
            )
        })
    }
}
