//! Request and response types for the directory operations.
//!
//! Payloads carry exactly the fields a client sends; unknown fields are
//! rejected at deserialization so schema drift surfaces as a client error
//! instead of being silently ignored.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// SHA-256 fingerprint of a node's Ed25519 public key.
///
/// The stable identity a node registers under. Rendered as 64 hex chars on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; 32]);

impl NodeId {
    /// Create a node id from raw fingerprint bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for NodeId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ProtocolError::InvalidNodeId(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidNodeId("expected 32 bytes".into()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Register a node's reachable endpoint under its public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterPayload {
    /// The address at which the node claims to be reachable.
    pub endpoint: SocketAddr,

    /// Base64-encoded Ed25519 public key.
    pub pubkey: String,

    /// Hex-encoded signature over the canonical register message.
    pub signature: String,

    /// Unix timestamp (seconds) of the request.
    pub timestamp: u64,
}

impl RegisterPayload {
    /// The bytes the registering node signs.
    pub fn canonical_message(&self) -> Vec<u8> {
        register_message(&self.endpoint, &self.pubkey, self.timestamp)
    }
}

/// Response after a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: NodeId,
    pub endpoint: SocketAddr,
    pub registered_at: String,
}

/// Resolve a node id to its registered endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupPayload {
    /// The identity being looked up.
    pub id: NodeId,

    /// The querying client's own endpoint, recorded for `listconns`.
    pub client: SocketAddr,

    /// Unix timestamp (seconds) of the request.
    pub timestamp: u64,
}

/// Response to a successful lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub id: NodeId,
    pub endpoint: SocketAddr,
}

/// List the clients that have looked up the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListConnsPayload {
    /// The identity whose lookup history is requested.
    pub id: NodeId,

    /// Hex-encoded signature over the canonical listconns message,
    /// proving control of the registered key.
    pub signature: String,

    /// Unix timestamp (seconds) of the request.
    pub timestamp: u64,
}

impl ListConnsPayload {
    /// The bytes the identity owner signs.
    pub fn canonical_message(&self) -> Vec<u8> {
        listconns_message(&self.id, self.timestamp)
    }
}

/// One prior lookup against an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEntry {
    pub client: SocketAddr,
    pub looked_up_at: String,
}

/// Lookup history, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConnsResponse {
    pub peers: Vec<PeerEntry>,
    pub total: usize,
}

/// Response after a wipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeResponse {
    pub status: String,
    pub registrations_removed: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub registrations: usize,
}

/// Canonical message for `register`.
///
/// Domain-separated join of the semantic fields. A signature over these
/// bytes cannot be replayed against a different operation, endpoint, key,
/// or timestamp.
pub fn register_message(endpoint: &SocketAddr, pubkey_b64: &str, timestamp: u64) -> Vec<u8> {
    format!("register:{}:{}:{}", endpoint, pubkey_b64, timestamp).into_bytes()
}

/// Canonical message for `listconns`.
pub fn listconns_message(id: &NodeId, timestamp: u64) -> Vec<u8> {
    format!("listconns:{}:{}", id, timestamp).into_bytes()
}
