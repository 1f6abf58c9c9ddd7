//! Checkpoint domain types and pure functions.

pub mod merkle;
pub mod sign_bytes;
pub mod types;

pub use merkle::merkle_root;
pub use sign_bytes::{checkpoint_sign_bytes, parse_checkpoint_sign_bytes, CHECKPOINT_SIGN_BYTES_LEN};
pub use types::{
    Checkpoint, MsgCheckpoint, MsgCpAck, MsgCpNoAck, Params, RootCheckpointEvent, MSG_CHECKPOINT,
    MSG_CP_ACK, MSG_CP_NO_ACK,
};
