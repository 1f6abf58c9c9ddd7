//! Error types for the side-tx registry.

use sv_01_state_store::StoreError;
use thiserror::Error;

/// Which handler table a registration targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Side,
    Post,
    Msg,
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::Side => f.write_str("side"),
            HandlerKind::Post => f.write_str("post"),
            HandlerKind::Msg => f.write_str("msg"),
        }
    }
}

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A handler of this kind is already registered for the type.
    /// Raised during assembly; the node must not start.
    #[error("{kind} handler already registered for {msg_type}")]
    HandlerAlreadyExists { kind: HandlerKind, msg_type: String },

    /// Transaction carries more than one side message
    #[error("transaction carries {count} side messages, at most one allowed")]
    MultipleSideMsgs { count: usize },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Transaction-level error returned by handlers.
///
/// `codespace` + `code` are stable and end up in `ExecTxResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{codespace} error {code}: {log}")]
pub struct HandlerError {
    pub codespace: String,
    pub code: u32,
    pub log: String,
}

impl HandlerError {
    pub fn new(codespace: impl Into<String>, code: u32, log: impl Into<String>) -> Self {
        Self {
            codespace: codespace.into(),
            code,
            log: log.into(),
        }
    }

    /// No route registered for the message type.
    pub fn unknown_request(type_url: &str) -> Self {
        Self::new("sdk", 6, format!("unrecognized message type: {type_url}"))
    }

    /// Transaction bytes that do not decode.
    pub fn tx_decode(reason: impl std::fmt::Display) -> Self {
        Self::new("sdk", 2, format!("tx parse error: {reason}"))
    }

    /// A transaction that breaks the single-side-message rule.
    pub fn from_registry(err: &RegistryError) -> Self {
        Self::new("sidetx", 2, err.to_string())
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self::new("sdk", 1, format!("internal store error: {err}"))
    }
}
