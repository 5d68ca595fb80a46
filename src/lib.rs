//! Post office library.
//!
//! Addressed message routing between named mailboxes, within and across processes.
//! A [`PostOffice`] owns the [`Mailbox`]es of a process; each mailbox owner gets a
//! [`Dropbox`] to post [`Envelope`]s with. How messages leave the process is up to the
//! [`Router`] the office was built with.
//!

pub mod config;
pub use config::{CliArgs, PostOfficeConfig};

mod dispatcher;
pub use dispatcher::*;

pub mod dropbox;
pub use dropbox::*;

mod envelope;
pub use envelope::Envelope;

mod errors;
pub use errors::PostOfficeError;

pub mod mailbox;
pub use mailbox::{DeliveryOutcome, Mailbox};

pub mod message;
pub use message::*;

pub mod office;
pub use office::{PostOffice, Router};

pub mod proto;
pub use proto::Address;

pub mod router;
