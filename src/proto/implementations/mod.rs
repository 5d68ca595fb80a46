//! Additional implementations for the protobuf structs.

mod bytes;
mod conversions;
mod new;
