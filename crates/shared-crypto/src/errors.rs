use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature does not match")]
    SignatureVerificationFailed,

    #[error("signature must be 64 bytes, got {0}")]
    InvalidSignatureFormat(usize),

    #[error("not a secp256k1 public key")]
    InvalidPublicKey,

    #[error("not a secp256k1 secret key")]
    InvalidPrivateKey,

    #[error("malformed signature")]
    InvalidSignature,
}
