//! Deterministic wire codec.
//!
//! Every value that is hashed, signed or gossiped goes through these two
//! functions so all validators produce byte-identical encodings.

use crate::errors::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode with bincode's default (fixed-int, little-endian) options.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode bytes produced by [`encode`]. Empty input is rejected.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
