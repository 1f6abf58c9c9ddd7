//! Transactions and messages.
//!
//! A transaction carries one or more type-tagged messages. Modules dispatch
//! on `Msg::type_url`; the message body is the module's own encoding.

use crate::codec;
use crate::entities::{Address, Hash};
use crate::errors::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A type-tagged message (the equivalent of a protobuf `Any`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Msg {
    /// Pack a typed message under `type_url`.
    pub fn pack<T: Serialize>(type_url: &str, body: &T) -> Result<Self, CodecError> {
        Ok(Self {
            type_url: type_url.to_string(),
            value: codec::encode(body)?,
        })
    }

    /// Unpack the body as `T`.
    pub fn unpack<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        codec::decode(&self.value)
    }
}

/// A signed transaction as it appears in a block.
///
/// Signature checking is the ante handler's concern and happens outside this
/// workspace; `signer` is the already-authenticated sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub msgs: Vec<Msg>,
    pub signer: Address,
    pub nonce: u64,
}

impl Tx {
    pub fn new(msgs: Vec<Msg>, signer: Address, nonce: u64) -> Self {
        Self {
            msgs,
            signer,
            nonce,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }
}

/// Hash of raw transaction bytes (SHA-256), the key side-tx votes refer to.
pub fn tx_hash(tx_bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(tx_bytes);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        n: u64,
    }

    #[test]
    fn test_pack_unpack() {
        let msg = Msg::pack("/test.Ping", &Ping { n: 9 }).unwrap();
        assert_eq!(msg.type_url, "/test.Ping");
        assert_eq!(msg.unpack::<Ping>().unwrap(), Ping { n: 9 });
    }

    #[test]
    fn test_tx_hash_depends_on_bytes() {
        let a = Tx::new(vec![], [1u8; 20], 0).encode().unwrap();
        let b = Tx::new(vec![], [1u8; 20], 1).encode().unwrap();
        assert_ne!(tx_hash(&a), tx_hash(&b));
        assert_eq!(tx_hash(&a), tx_hash(&a));
    }
}
