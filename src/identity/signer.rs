use crate::identity::{keccak256_concat, Address, Keypair};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use thiserror::Error;

/// Length of a recoverable signature: r (32) ‖ s (32) ‖ v (1)
pub const SIGNATURE_LENGTH: usize = 65;

const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid signature length: expected 65, got {0}")]
    InvalidLength(usize),

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Recoverable ECDSA signature (65 bytes, v in {27, 28})
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Create a signature from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let array: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Get the raw bytes of the signature
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Digest a validator actually signs: the personal-message digest of `message`
pub fn signed_message_digest(message: &[u8]) -> [u8; 32] {
    let length = message.len().to_string();
    keccak256_concat(&[SIGNED_MESSAGE_PREFIX, length.as_bytes(), message])
}

/// Recovers the signer identity from a signature over a message.
///
/// The consensus core only depends on this trait; `EcdsaRecovery` is the
/// production implementation.
pub trait SignerRecovery: Send + Sync {
    fn recover_signer(&self, signature: &[u8], message: &[u8]) -> Result<Address, SignatureError>;
}

/// Signing and recovery operations
pub struct Signer;

impl Signer {
    /// Sign a message with a keypair
    pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
        let secp = Secp256k1::signing_only();
        let digest = Message::from_digest(signed_message_digest(message));
        let recoverable = secp.sign_ecdsa_recoverable(&digest, keypair.secret_key());
        let (recovery_id, compact) = recoverable.serialize_compact();

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = recovery_id.to_i32() as u8 + 27;
        Signature(bytes)
    }

    /// Recover the address that signed `message`
    pub fn recover(signature: &[u8], message: &[u8]) -> Result<Address, SignatureError> {
        if signature.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(signature.len()));
        }

        let v = signature[64];
        let normalized = if v >= 27 { v - 27 } else { v };
        let recovery_id = RecoveryId::from_i32(normalized as i32)
            .map_err(|_| SignatureError::InvalidRecoveryId(v))?;
        let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

        let secp = Secp256k1::verification_only();
        let digest = Message::from_digest(signed_message_digest(message));
        let public_key = secp
            .recover_ecdsa(&digest, &recoverable)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

        Ok(Address::from_public_key(&public_key))
    }
}

/// secp256k1 public-key recovery
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaRecovery;

impl SignerRecovery for EcdsaRecovery {
    fn recover_signer(&self, signature: &[u8], message: &[u8]) -> Result<Address, SignatureError> {
        Signer::recover(signature, message)
    }
}
