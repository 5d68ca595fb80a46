//! The transport seam of a [`LocalRouter`](super::LocalRouter).

use std::sync::Arc;

use crate::{message::RawMessage, PostOfficeError};

/// Carries routed messages between processes.
pub trait Transport: Send + Sync {
    /// Send a message from process `origin` to the post office of process
    /// `destination`.
    ///
    /// The message is an envelope tagged as a routed message. If it carries a reply
    /// channel, the transport should keep it, so that the receiving side can answer
    /// over it; otherwise the transport may attach its own.
    fn send(
        &self,
        origin: u32,
        destination: u32,
        message: RawMessage,
    ) -> Result<(), PostOfficeError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        origin: u32,
        destination: u32,
        message: RawMessage,
    ) -> Result<(), PostOfficeError> {
        (**self).send(origin, destination, message)
    }
}
