//! AES-256-GCM authenticated decryption
//!
//! The sealed input is the GCM ciphertext with its 16-byte tag appended,
//! opened with no associated data. Plaintext is only returned once the tag
//! has verified.

use crate::error::{ErrorCategory, ErrorKind, ProfileError, Result};
use crate::kdf::DerivedKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use zeroize::Zeroizing;

/// Length of the GCM nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Verify and decrypt `sealed` (ciphertext || tag).
pub fn open(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let plaintext = cipher.decrypt(Nonce::from_slice(nonce), sealed).map_err(|_| {
        ProfileError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt input, tampered-with data, or bad passphrase",
        )
    })?;
    Ok(Zeroizing::new(plaintext))
}
