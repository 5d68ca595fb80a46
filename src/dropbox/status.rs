//! Status values reported by a [`Dropbox`](super::Dropbox).
//!
//! None of these are errors: routing is best-effort, and these values only make the
//! outcome observable to the caller.

/// The state of a [`Dropbox`](super::Dropbox).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropboxStatus {
    /// Bound to a registered mailbox; posts will be sent.
    Open,

    /// The address was already taken when registering; this dropbox was never bound.
    Duplicate,

    /// The mailbox was removed through this dropbox.
    Removed,
}

/// What happened to a post or a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    /// The envelope was handed to the post office's router.
    Routed,

    /// The reply was written directly over the reply channel of the original message.
    Replied,

    /// The reply had neither a sender address nor a reply channel to go back over,
    /// and was dropped.
    NoReplyPath,

    /// The dropbox is not open, or its post office is gone; nothing was sent.
    Inactive,
}

/// What happened when removing a [`Dropbox`](super::Dropbox).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The mailbox was unregistered from the post office.
    Unregistered,

    /// The dropbox was open, but its mailbox had already been removed by other means
    /// or its post office is gone.
    AlreadyGone,

    /// The dropbox was not open; nothing was done.
    Inactive,
}
