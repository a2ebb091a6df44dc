//! Protocol errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid public key encoding: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),
}
