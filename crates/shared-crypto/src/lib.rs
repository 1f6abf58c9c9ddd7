//! # Shared Crypto
//!
//! Cryptographic primitives used by the vote-extension protocol.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 | Validator consensus-key signatures over vote extensions |
//! | `hashing` | SHA-256, Keccak-256 | Tx hashes, signer addresses, sign-bytes digests |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S signatures
//! - Signer addresses follow the Ethereum derivation so the same key signs on
//!   the sidechain and is recognised by the root-chain contracts

#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{verify_signature, Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{keccak256, sha256};
