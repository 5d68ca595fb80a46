//! A mailbox is an addressable inbound endpoint. Messages delivered to it are opened
//! and staged in a queue; they are handed to the receive callback only when the host
//! processes the mailbox, so delivery and processing happen on separate schedules.
//!

mod model;
pub use model::*;
