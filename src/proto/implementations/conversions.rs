//! Conversion between the [`WireEnvelope`] and the domain [`Envelope`].

use super::super::WireEnvelope;
use crate::{Envelope, PostOfficeError};

impl From<&Envelope> for WireEnvelope {
    fn from(envelope: &Envelope) -> Self {
        WireEnvelope {
            address: Some(envelope.destination.clone()),
            return_address: envelope.return_address.clone(),
            message_id: envelope.message_kind,
            payload: envelope.payload.clone(),
        }
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        WireEnvelope {
            address: Some(envelope.destination),
            return_address: envelope.return_address,
            message_id: envelope.message_kind,
            payload: envelope.payload,
        }
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = PostOfficeError;

    /// Validate a [`WireEnvelope`], which must carry a destination.
    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        Ok(Envelope {
            destination: wire.address.ok_or(PostOfficeError::MissingDestination)?,
            return_address: wire.return_address,
            message_kind: wire.message_id,
            payload: wire.payload,
        })
    }
}
