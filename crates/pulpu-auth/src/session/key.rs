//! Session signing key.

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::config::ConfigError;
use crate::error::AuthError;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Process-wide HMAC-SHA256 key used to sign and verify session tokens.
///
/// Immutable once constructed; clones share the same bytes. `Debug` never
/// prints key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    bytes: Arc<[u8]>,
}

impl SecretKey {
    /// Minimum accepted key length in bytes (256 bits).
    pub const MIN_LENGTH: usize = 32;

    /// Length of keys produced by [`generate_secret_key`].
    pub const GENERATED_LENGTH: usize = 32;

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the key is shorter than
    /// [`SecretKey::MIN_LENGTH`].
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let bytes = bytes.as_ref();
        if bytes.len() < Self::MIN_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "session secret key must be at least {} bytes, got {}",
                Self::MIN_LENGTH,
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    /// Creates a key from its hex encoding.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the input is not hex or decodes
    /// to fewer than [`SecretKey::MIN_LENGTH`] bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = hex::decode(encoded).map_err(|e| {
            ConfigError::InvalidValue(format!("session secret key is not valid hex: {e}"))
        })?;
        Self::new(bytes)
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex encoding of the key, as accepted by [`SecretKey::from_hex`].
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub(crate) fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.bytes).expect("HMAC key of any length is valid")
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Generates a new 32-byte key from the operating system CSPRNG.
///
/// # Errors
///
/// Returns `AuthError::Entropy` if the OS random source fails. No key is
/// produced in that case.
pub fn generate_secret_key() -> Result<SecretKey, AuthError> {
    let mut bytes = [0u8; SecretKey::GENERATED_LENGTH];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "OS random source failed while generating a secret key");
        AuthError::entropy(e.to_string())
    })?;
    Ok(SecretKey {
        bytes: Arc::from(&bytes[..]),
    })
}
