//! Deals with the serialization and deserialization of the wire records into bytes.

use prost::Message;

use super::super::{Address, WireEnvelope};
use crate::PostOfficeError;

impl WireEnvelope {
    /// Serialize the envelope into bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Deserialize the envelope from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PostOfficeError> {
        Ok(WireEnvelope::decode(bytes)?)
    }
}

impl Address {
    /// Serialize the address into bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Deserialize the address from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PostOfficeError> {
        Ok(Address::decode(bytes)?)
    }
}
