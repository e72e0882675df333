//! Passphrase to key derivation (PBKDF2-HMAC-SHA256)

use crate::error::{ErrorCategory, ErrorKind, ProfileError, Result};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use std::num::NonZeroU32;
use zeroize::Zeroizing;

/// Length of the derived AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// A derived key, wiped from memory on drop.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Derive a 32-byte key from a passphrase and salt using PBKDF2-HMAC-SHA256
pub fn derive_key(passphrase: &[u8], salt: &[u8], iterations: NonZeroU32) -> Result<DerivedKey> {
    let mut key: DerivedKey = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::<Hmac<Sha256>>(passphrase, salt, iterations.get(), &mut key[..]).map_err(|e| {
        ProfileError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            format!("PBKDF2 key derivation failed: {}", e),
        )
    })?;
    Ok(key)
}
