//! Identity derivation and Ed25519 signing.
//!
//! The directory never sees a private key: it derives identities from
//! public keys and checks detached signatures over canonical messages.
//! `Keypair` exists for clients and tests that need to produce signatures.

use crate::error::ProtocolError;
use crate::types::NodeId;
use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Derive the stable identity for a public key.
///
/// SHA-256 over the raw key bytes. A pure function: the same key always
/// yields the same id.
pub fn derive_id(pubkey: &[u8]) -> NodeId {
    let mut hasher = Sha256::new();
    hasher.update(pubkey);
    let hash = hasher.finalize();

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    NodeId::new(bytes)
}

/// Check that `signature` was produced by the private counterpart of
/// `pubkey` over exactly `message`.
///
/// Returns false (never panics) on malformed key or signature input.
pub fn verify(pubkey: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(pubkey) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key.verify(message, &signature).is_ok()
}

/// Decode a base64 wire public key into raw Ed25519 key bytes.
pub fn decode_public_key(encoded: &str) -> Result<[u8; 32], ProtocolError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ProtocolError::InvalidPublicKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| ProtocolError::InvalidPublicKey("expected 32 bytes".into()))
}

/// Decode a hex wire signature into raw Ed25519 signature bytes.
pub fn decode_signature(encoded: &str) -> Result<[u8; 64], ProtocolError> {
    let bytes = hex::decode(encoded).map_err(|e| ProtocolError::InvalidSignature(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| ProtocolError::InvalidSignature("expected 64 bytes".into()))
}

/// Ed25519 identity keypair.
#[derive(Debug, Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// Reconstruct a keypair from stored private key bytes.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key in the wire encoding.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key_bytes())
    }

    /// The identity this keypair registers under.
    pub fn node_id(&self) -> NodeId {
        derive_id(&self.public_key_bytes())
    }

    /// Sign a canonical message.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}
