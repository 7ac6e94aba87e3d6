//! Per-message authentication.
//!
//! Every protocol message carries an ed25519 signature over its bincode
//! payload. Verification keys are distributed through cluster configuration
//! and pinned in the `MembershipView`; a message that fails verification is
//! dropped at the ingress boundary.

use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::Verifier;
use ed25519_dalek::VerifyingKey;
use rand::rngs::OsRng;

use crate::ids::NodeId;
use crate::Result;
use crate::SerializationError;

/// Holds this node's signing identity.
#[derive(Clone)]
pub struct MessageSigner {
    node_id: NodeId,
    signing_key: SigningKey,
}

impl MessageSigner {
    pub fn new(
        node_id: NodeId,
        signing_key: SigningKey,
    ) -> Self {
        Self { node_id, signing_key }
    }

    /// Fresh identity, for tests and single-run tooling.
    pub fn generate(node_id: NodeId) -> Self {
        Self {
            node_id,
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load a signing key from its 32-byte hex secret.
    pub fn from_hex(
        node_id: NodeId,
        secret_hex: &str,
    ) -> Result<Self> {
        let bytes = hex::decode(secret_hex)
            .map_err(|e| SerializationError::InvalidKey(format!("signing key hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SerializationError::InvalidKey("signing key must be 32 bytes".to_string()))?;
        Ok(Self {
            node_id,
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn verifying_key_hex(&self) -> String {
        hex::encode(self.verifying_key().as_bytes())
    }

    pub(crate) fn sign(
        &self,
        payload: &[u8],
    ) -> Vec<u8> {
        self.signing_key.sign(payload).to_bytes().to_vec()
    }
}

impl std::fmt::Debug for MessageSigner {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MessageSigner").field("node_id", &self.node_id).finish()
    }
}

/// True when `signature` is a valid ed25519 signature by `key` over
/// `payload`. Malformed signatures verify as false, never as errors.
pub fn verify_signature(
    key: &VerifyingKey,
    payload: &[u8],
    signature: &[u8],
) -> bool {
    match Signature::from_slice(signature) {
        Ok(sig) => key.verify(payload, &sig).is_ok(),
        Err(_) => false,
    }
}

pub fn verifying_key_from_hex(key_hex: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(key_hex)
        .map_err(|e| SerializationError::InvalidKey(format!("verifying key hex: {}", e)))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| SerializationError::InvalidKey("verifying key must be 32 bytes".to_string()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| SerializationError::InvalidKey(format!("verifying key: {}", e)).into())
}
