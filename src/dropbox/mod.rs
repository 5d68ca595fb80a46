//! A dropbox is the outbound half of a registered mailbox: it posts addressed
//! envelopes stamped with the mailbox's own address, replies to messages the mailbox
//! received, and removes the mailbox when it is no longer needed.
//!
//! Dropboxes are move-only. There is exactly one handle per registered mailbox, so
//! removing a mailbox can never leave a sibling handle posting on its behalf.
//!

mod model;
pub use model::*;

mod status;
pub use status::*;
