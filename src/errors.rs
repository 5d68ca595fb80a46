//! Error types.
//!
//! Routing itself never fails loudly: unknown tags, duplicate registrations and
//! missing mailboxes are reported through status values instead. The variants here
//! cover the genuinely exceptional cases around them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostOfficeError {
    #[error("Failed to decode envelope: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Envelope carries no destination address.")]
    MissingDestination,
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("No post office is attached for process {0}.")]
    UnknownProcess(u32),
    #[error("Transport is closed: {0}")]
    TransportClosed(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
