//! The encrypted profile document
//!
//! An encrypted profile is a JSON object:
//!
//! ```json
//! {"salt": "<base64>", "iv": "<base64>", "ciphertext": "<base64>", "iterations": 100000}
//! ```
//!
//! All binary fields use the standard base64 alphabet with padding.
//! `iterations` is optional; when absent (or `null`) the caller's default
//! applies. Unknown fields are ignored.

use crate::cipher::{NONCE_LEN, TAG_LEN};
use crate::error::{ErrorCategory, ErrorKind, ProfileError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Number;
use std::num::NonZeroU32;

/// Iteration count used when a profile does not carry one.
pub const DEFAULT_ITERATIONS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();

/// The profile exactly as it appears on disk, before any decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptedProfile {
    pub salt: String,
    pub iv: String,
    pub ciphertext: String,
    pub iterations: Option<Number>,
}

/// A profile whose fields have been base64-decoded and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedProfile {
    pub salt: Vec<u8>,
    pub iv: [u8; NONCE_LEN],
    /// Ciphertext followed by the GCM tag.
    pub ciphertext: Vec<u8>,
    pub iterations: Option<NonZeroU32>,
}

impl EncryptedProfile {
    /// Parse a profile from raw JSON bytes.
    pub fn from_json(input: &[u8]) -> Result<Self> {
        serde_json::from_slice(input).map_err(|e| {
            ProfileError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Format,
                format!("invalid profile document: {}", e),
                e,
            )
        })
    }

    /// Decode and validate every field.
    pub fn decode(&self) -> Result<DecodedProfile> {
        let salt = decode_field("salt", &self.salt)?;

        let iv_bytes = decode_field("iv", &self.iv)?;
        let iv: [u8; NONCE_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            ProfileError::format(format!(
                "iv must be {} bytes, got {}",
                NONCE_LEN,
                iv_bytes.len()
            ))
        })?;

        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;
        if ciphertext.len() < TAG_LEN {
            return Err(ProfileError::format(format!(
                "ciphertext too short to hold a {}-byte authentication tag; likely truncated",
                TAG_LEN
            )));
        }

        let iterations = self.iterations.as_ref().map(parse_iterations).transpose()?;

        Ok(DecodedProfile {
            salt,
            iv,
            ciphertext,
            iterations,
        })
    }
}

impl DecodedProfile {
    /// The iteration count to derive the key with.
    pub fn resolve_iterations(&self, default: NonZeroU32) -> NonZeroU32 {
        self.iterations.unwrap_or(default)
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD.decode(value).map_err(|e| {
        ProfileError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            format!("{} is not valid base64: {}", name, e),
            e,
        )
    })
}

fn parse_iterations(raw: &Number) -> Result<NonZeroU32> {
    let invalid = || {
        ProfileError::format(format!(
            "iterations must be a positive integer no larger than {}, got {}",
            u32::MAX,
            raw
        ))
    };
    // Whole-valued floats such as 100000.0 or 1e5 are accepted.
    let wide = match raw.as_u64() {
        Some(n) => n,
        None => match raw.as_f64() {
            Some(f) if f.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(&f) => {
                f as u64
            }
            _ => return Err(invalid()),
        },
    };
    let narrow = u32::try_from(wide).map_err(|_| invalid())?;
    NonZeroU32::new(narrow).ok_or_else(invalid)
}
