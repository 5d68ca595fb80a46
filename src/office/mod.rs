//! The post office owns every mailbox of a process. It registers and removes
//! mailboxes, delivers raw messages to them, and processes their queues in bounded,
//! evenly shared slices.
//!
//! How a message leaves the process is not decided here: every post goes through a
//! [`Router`], supplied by the hosting application, which delivers locally or hands
//! the message to a transport.
//!

mod model;
pub use model::*;

pub mod traits;
pub use traits::Router;
