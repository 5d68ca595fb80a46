//! The dropbox model.
//!
use std::fmt;

use super::{DropboxStatus, PostStatus, Removal};
use crate::{message::*, proto::Address, Envelope, PostOfficeError};

/// Hands a routed [`RawMessage`] to the post office for routing; returns `false` if
/// there was no post office left to take it.
pub type PostCallback = Box<dyn Fn(RawMessage) -> bool + Send + Sync>;

/// Unregisters the mailbox at the given local address; returns if one was removed.
pub type UnregisterCallback = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// The outbound handle of a registered mailbox.
///
/// Obtained from [`PostOffice::register_address`](crate::PostOffice::register_address).
/// If registration failed, the returned dropbox is not [open](Self::is_valid) and all
/// posts through it are no-ops reporting [`PostStatus::Inactive`].
///
/// Outbound posts always go through the post office's router. Replies to a message
/// either go through the router too, if the message names its sender, or back over
/// the reply channel of the transport that carried it.
pub struct Dropbox {
    local_address: String,
    process_id: u32,
    post: Option<PostCallback>,
    unregister: Option<UnregisterCallback>,
    status: DropboxStatus,
}

impl fmt::Debug for Dropbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropbox")
            .field("local_address", &self.local_address)
            .field("process_id", &self.process_id)
            .field("status", &self.status)
            .finish()
    }
}

impl Dropbox {
    /// Create a new open dropbox for the mailbox at `local_address` in process
    /// `process_id`.
    pub fn new(
        local_address: impl ToString,
        process_id: u32,
        post: PostCallback,
        unregister: UnregisterCallback,
    ) -> Self {
        Self {
            local_address: local_address.to_string(),
            process_id,
            post: Some(post),
            unregister: Some(unregister),
            status: DropboxStatus::Open,
        }
    }

    /// Create a dropbox that was never bound, because `local_address` was taken.
    pub fn duplicate(local_address: impl ToString, process_id: u32) -> Self {
        Self {
            local_address: local_address.to_string(),
            process_id,
            post: None,
            unregister: None,
            status: DropboxStatus::Duplicate,
        }
    }

    /// Get the local address of the mailbox this dropbox belongs to.
    pub fn address(&self) -> &str {
        &self.local_address
    }

    /// Get the full address stamped as the return address on every post.
    pub fn return_address(&self) -> Address {
        Address::new(self.process_id, &self.local_address)
    }

    /// Get the state of this dropbox.
    pub fn status(&self) -> DropboxStatus {
        self.status
    }

    /// Check if this dropbox is bound to a registered mailbox and will send messages.
    pub fn is_valid(&self) -> bool {
        self.status == DropboxStatus::Open
    }

    /// Sends an object to an address.
    ///
    /// The object is serialized with [`serde_json`], and can be read back by the
    /// receiver with [`OpenedMessage::parse`].
    pub fn post<T: serde::Serialize>(
        &self,
        address: &Address,
        kind: impl Into<u32>,
        obj: &T,
    ) -> Result<PostStatus, PostOfficeError> {
        if !self.is_valid() {
            return Ok(PostStatus::Inactive);
        }

        let data = serde_json::to_vec(obj)?;
        Ok(self.post_data(address, kind, data))
    }

    /// Sends pre-serialized data to an address.
    pub fn post_data(
        &self,
        address: &Address,
        kind: impl Into<u32>,
        data: impl Into<Vec<u8>>,
    ) -> PostStatus {
        self.send(self.stuff(address, kind.into(), Some(data.into())), 0)
    }

    /// Sends a message without any payload to an address.
    pub fn post_empty(&self, address: &Address, kind: impl Into<u32>) -> PostStatus {
        self.send(self.stuff(address, kind.into(), None), 0)
    }

    /// Sends a reply to the sender of a message.
    ///
    /// See [`Self::post_reply_data`] for how the reply finds its way back.
    pub fn post_reply<T: serde::Serialize>(
        &self,
        message: OpenedMessage,
        kind: impl Into<u32>,
        obj: &T,
        status: u8,
    ) -> Result<PostStatus, PostOfficeError> {
        if !self.is_valid() {
            return Ok(PostStatus::Inactive);
        }

        let data = serde_json::to_vec(obj)?;
        Ok(self.post_reply_data(message, kind, data, status))
    }

    /// Sends pre-serialized data as a reply to the sender of a message.
    ///
    /// If the message names its sender, the reply is a fresh envelope addressed to
    /// the sender and routed like any other post. Otherwise the reply is written
    /// directly over the reply channel of the original message, which is how peers
    /// sharing a single channel talk without addressing each other.
    pub fn post_reply_data(
        &self,
        message: OpenedMessage,
        kind: impl Into<u32>,
        data: impl Into<Vec<u8>>,
        status: u8,
    ) -> PostStatus {
        if !self.is_valid() {
            return PostStatus::Inactive;
        }

        let kind = kind.into();
        let data = data.into();

        if let Some(sender) = message.sender() {
            return self.send(self.stuff(sender, kind, Some(data)), status);
        }

        if message.send_reply(kind, data, status) {
            PostStatus::Replied
        } else {
            logger::warn!(
                "{} cannot reply to a message of kind {}: no sender, and no reply channel took the reply.",
                self.local_address,
                kind
            );
            PostStatus::NoReplyPath
        }
    }

    /// Sends a reply to an explicit address, back over the transport that carried the
    /// original message.
    ///
    /// The original message can be anything: no assumption is made about what is
    /// in it. The reply is an envelope to `address`, written over the reply channel of
    /// `message` as a [`MessageTag::ROUTE`] message with the given status; it is never
    /// handed to the router.
    pub fn post_reply_to<T: serde::Serialize>(
        &self,
        message: RawMessage,
        address: &Address,
        kind: impl Into<u32>,
        obj: &T,
        status: u8,
    ) -> Result<PostStatus, PostOfficeError> {
        if !self.is_valid() {
            return Ok(PostStatus::Inactive);
        }

        let data = serde_json::to_vec(obj)?;
        Ok(self.post_reply_data_to(message, address, kind, data, status))
    }

    /// Sends pre-serialized data as a reply to an explicit address, back over the
    /// transport that carried the original message.
    pub fn post_reply_data_to(
        &self,
        message: RawMessage,
        address: &Address,
        kind: impl Into<u32>,
        data: impl Into<Vec<u8>>,
        status: u8,
    ) -> PostStatus {
        if !self.is_valid() {
            return PostStatus::Inactive;
        }

        let envelope = self.stuff(address, kind.into(), Some(data.into()));
        if message.send_reply(MessageTag::ROUTE, envelope.to_bytes(), status) {
            PostStatus::Replied
        } else {
            logger::warn!(
                "{} cannot reply to {}: no reply channel took the reply.",
                self.local_address,
                address
            );
            PostStatus::NoReplyPath
        }
    }

    /// Removes the mailbox of this dropbox from the post office.
    ///
    /// Only the first call has any effect; this dropbox is closed afterwards.
    pub fn remove(&mut self) -> Removal {
        if !self.is_valid() {
            return Removal::Inactive;
        }

        let removed = self
            .unregister
            .take()
            .is_some_and(|unregister| unregister(&self.local_address));

        self.post = None;
        self.status = DropboxStatus::Removed;

        if removed {
            Removal::Unregistered
        } else {
            Removal::AlreadyGone
        }
    }

    /// Put the data in an envelope to `address`, stamped with our return address.
    fn stuff(&self, address: &Address, kind: u32, payload: Option<Vec<u8>>) -> Envelope {
        Envelope {
            destination: address.clone(),
            return_address: Some(self.return_address()),
            message_kind: Some(kind),
            payload,
        }
    }

    /// Hand the envelope to the post callback.
    fn send(&self, envelope: Envelope, status: u8) -> PostStatus {
        match (&self.post, self.is_valid()) {
            (Some(post), true) => {
                logger::trace!(
                    "{} posting kind {:?} to {}.",
                    self.local_address,
                    envelope.message_kind,
                    envelope.destination
                );
                if post(RawMessage::routed(envelope.to_bytes()).with_status(status)) {
                    PostStatus::Routed
                } else {
                    PostStatus::Inactive
                }
            }
            _ => PostStatus::Inactive,
        }
    }
}
