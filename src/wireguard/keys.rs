//! WireGuard key management
//!
//! This module handles generation and encoding of WireGuard curve25519 keys.
//! The random source is always passed in by the caller so that tests can run
//! with a seeded generator and production code can use the OS source.

use crate::error::{ProvisionError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Size of WireGuard private and public keys in bytes
pub const KEY_SIZE: usize = 32;

/// Apply curve25519 scalar clamping in place.
///
/// Clears the low 3 bits of the first byte, clears the high bit of the last
/// byte and sets its second-highest bit. Applying it twice is a no-op.
pub fn clamp(bytes: &mut [u8; KEY_SIZE]) {
    bytes[0] &= 248;
    bytes[31] = (bytes[31] & 127) | 64;
}

/// WireGuard private key (32 bytes, x25519)
#[derive(Clone)]
pub struct PrivateKey {
    secret: Zeroizing<[u8; KEY_SIZE]>,
}

impl PrivateKey {
    /// Generate a new clamped private key from the operating system's random source
    pub fn generate() -> Result<Self> {
        Self::generate_from(&mut OsRng)
    }

    /// Generate a new clamped private key from the given random source.
    ///
    /// Fails only if the source cannot deliver bytes; there is no fallback.
    pub fn generate_from<R>(rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        rng.try_fill_bytes(&mut bytes[..])?;
        clamp(&mut bytes);
        Ok(Self { secret: bytes })
    }

    /// Create a private key from raw bytes, as given
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self {
            secret: Zeroizing::new(bytes),
        }
    }

    /// Parse a private key from base64-encoded string
    pub fn from_base64(s: &str) -> Result<Self> {
        decode_key(s, "private").map(Self::from_bytes)
    }

    /// Convert to base64-encoded string
    pub fn to_base64(&self) -> String {
        BASE64.encode(*self.secret)
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(*self.secret);
        let public = X25519PublicKey::from(&secret);
        PublicKey {
            key: public.to_bytes(),
        }
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.secret
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        *self.secret == *other.secret
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

// Ensure private keys are never accidentally logged
impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// WireGuard public key (32 bytes, x25519)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key: [u8; KEY_SIZE],
}

impl PublicKey {
    /// Create a public key from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { key: bytes }
    }

    /// Parse a public key from base64-encoded string
    pub fn from_base64(s: &str) -> Result<Self> {
        decode_key(s, "public").map(Self::from_bytes)
    }

    /// Convert to base64-encoded string
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.key)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

fn decode_key(s: &str, kind: &str) -> Result<[u8; KEY_SIZE]> {
    let decoded = BASE64
        .decode(s.trim())
        .map_err(|e| ProvisionError::Config(format!("Invalid base64 {} key: {}", kind, e)))?;

    <[u8; KEY_SIZE]>::try_from(decoded.as_slice()).map_err(|_| {
        ProvisionError::Config(format!(
            "Invalid {} key length: expected {} bytes, got {}",
            kind,
            KEY_SIZE,
            decoded.len()
        ))
    })
}

/// WireGuard key pair (private + public)
#[derive(Clone)]
pub struct KeyPair {
    /// Private key
    pub private: PrivateKey,
    /// Public key (derived from private)
    pub public: PublicKey,
}

impl KeyPair {
    /// Generate a new key pair from the operating system's random source
    pub fn generate() -> Result<Self> {
        Ok(Self::from_private(PrivateKey::generate()?))
    }

    /// Generate a new key pair from the given random source
    pub fn generate_from<R>(rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        Ok(Self::from_private(PrivateKey::generate_from(rng)?))
    }

    /// Create a key pair from a private key
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private", &"[REDACTED]")
            .field("public", &self.public)
            .finish()
    }
}
