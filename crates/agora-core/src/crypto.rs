//! Cryptographic primitives for the Agora exchange.
//!
//! Wraps Ed25519 signing with strong types and defines the [`Signer`]
//! capability that the exchange facade receives by injection.

use std::fmt;

use ed25519_dalek::Signer as _;
use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::types::Author;

/// A 32-byte Ed25519 verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form, as recorded in proofs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, rejecting wrong lengths.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Check a signature over a message against this key.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Ed25519Signature,
    ) -> Result<(), ValidationError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| ValidationError::InvalidKey)?;

        let sig = Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| ValidationError::SignatureFailed)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Ed25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte Ed25519 signature.
///
/// Serializes as a hex string, matching the proof wire form.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex form, the proof wire form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, rejecting wrong lengths.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Ed25519Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ed25519Signature::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A keypair for signing expressions.
///
/// Thin wrapper over ed25519-dalek's `SigningKey`.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Random keypair from the thread RNG.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// The verifying half.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message. Ed25519 signing is deterministic: the same message
    /// and key always produce the same signature.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }

    /// Raw seed bytes. Secret key material, handle accordingly.
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// The signing capability an exchange is constructed with.
///
/// Bundles the author identity with the key that signs for it, so a proof
/// always records the key of the identity that produced the envelope.
pub trait Signer: Send + Sync {
    /// The author identity this signer signs for.
    fn author(&self) -> &Author;

    /// Hex form of the verifying key, recorded as the proof `key`.
    fn verifying_key_hex(&self) -> String;

    /// Sign a message.
    fn sign(&self, message: &[u8]) -> Ed25519Signature;
}

/// A local signer: an author identity plus an Ed25519 keypair.
#[derive(Clone)]
pub struct AgentSigner {
    author: Author,
    keypair: Keypair,
}

impl AgentSigner {
    /// Wrap an existing keypair.
    pub fn new(author: Author, keypair: Keypair) -> Self {
        Self { author, keypair }
    }

    /// Generate a fresh keypair for the author.
    pub fn generate(author: Author) -> Self {
        Self::new(author, Keypair::generate())
    }

    /// Deterministic signer from a 32-byte seed.
    pub fn from_seed(author: Author, seed: &[u8; 32]) -> Self {
        Self::new(author, Keypair::from_seed(seed))
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }
}

impl Signer for AgentSigner {
    fn author(&self) -> &Author {
        &self.author
    }

    fn verifying_key_hex(&self) -> String {
        self.keypair.public_key().to_hex()
    }

    fn sign(&self, message: &[u8]) -> Ed25519Signature {
        self.keypair.sign(message)
    }
}

impl fmt::Debug for AgentSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentSigner({}, {:?})", self.author, self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let keypair = Keypair::generate();
        let message = b"canonical envelope bytes";
        let signature = keypair.sign(message);

        keypair
            .public_key()
            .verify(message, &signature)
            .expect("fresh signature verifies");

        assert!(keypair
            .public_key()
            .verify(b"canonical envelope byteS", &signature)
            .is_err());

        let mut flipped = *signature.as_bytes();
        flipped[0] ^= 0x01;
        assert!(keypair
            .public_key()
            .verify(message, &Ed25519Signature(flipped))
            .is_err());
    }

    #[test]
    fn test_same_seed_same_keys() {
        let seed = [0xA7u8; 32];
        let kp1 = Keypair::from_seed(&seed);
        let kp2 = Keypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.seed(), seed);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = Keypair::from_seed(&[0x07; 32]);
        let a = keypair.sign(b"payload");
        let b = keypair.sign(b"payload");
        assert_eq!(a, b);
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = Keypair::from_seed(&[0x2F; 32]).public_key();
        let hex = pk.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hex.to_lowercase());
        assert_eq!(Ed25519PublicKey::from_hex(&hex).unwrap(), pk);
        assert!(Ed25519PublicKey::from_hex(&hex[..62]).is_err());
    }

    #[test]
    fn test_signature_serializes_as_hex() {
        let keypair = Keypair::from_seed(&[0x01; 32]);
        let sig = keypair.sign(b"msg");
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, format!("\"{}\"", sig.to_hex()));
        let back: Ed25519Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn test_agent_signer_exposes_identity() {
        let signer = AgentSigner::from_seed(Author::new("did:key:alice"), &[0x11; 32]);
        assert_eq!(signer.author().id(), "did:key:alice");
        assert_eq!(signer.verifying_key_hex(), signer.public_key().to_hex());

        let sig = Signer::sign(&signer, b"msg");
        signer.public_key().verify(b"msg", &sig).unwrap();
    }
}
