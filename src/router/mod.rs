//! Routers and transports.
//!
//! A [`PostOffice`](crate::PostOffice) does not know how to reach other processes.
//! [`LocalRouter`] delivers to the office's own mailboxes and hands everything else
//! to a [`Transport`]; [`Exchange`] is a [`Transport`] joining several post offices
//! living in the same process.
//!

mod exchange;
pub use exchange::Exchange;

mod failure;
pub use failure::*;

mod local;
pub use local::LocalRouter;

pub mod traits;
pub use traits::Transport;
