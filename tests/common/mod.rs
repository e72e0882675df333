//! Helpers shared by the integration tests.
//!
//! The crate only decrypts, so fixtures are sealed here directly with the
//! same primitives.

#![allow(dead_code)]

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::Hmac;
use sha2::Sha256;
use std::path::PathBuf;

/// Returns the raw GCM output (ciphertext || tag).
pub fn seal(
    passphrase: &[u8],
    plaintext: &[u8],
    salt: &[u8],
    iv: &[u8; 12],
    iterations: u32,
) -> Vec<u8> {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(passphrase, salt, iterations, &mut key).unwrap();
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
        .encrypt(Nonce::from_slice(iv), plaintext)
        .unwrap()
}

/// Builds an encrypted profile document. `iterations: None` seals with
/// 100000 rounds and omits the field.
pub fn profile_json(
    passphrase: &[u8],
    plaintext: &[u8],
    salt: &[u8],
    iv: &[u8; 12],
    iterations: Option<u32>,
) -> String {
    let ciphertext = seal(passphrase, plaintext, salt, iv, iterations.unwrap_or(100_000));
    profile_json_from_parts(salt, iv, &ciphertext, iterations)
}

pub fn profile_json_from_parts(
    salt: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    iterations: Option<u32>,
) -> String {
    let mut doc = serde_json::json!({
        "salt": STANDARD.encode(salt),
        "iv": STANDARD.encode(iv),
        "ciphertext": STANDARD.encode(ciphertext),
    });
    if let Some(n) = iterations {
        doc["iterations"] = n.into();
    }
    doc.to_string()
}

/// Get path to testdata directory
pub fn testdata_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("testdata");
    path.push(filename);
    path
}
