//! profile-decrypt - Decrypts passphrase-protected JSON profiles
//!
//! Profiles are sealed with AES-256-GCM under a key derived from a
//! passphrase with PBKDF2-HMAC-SHA256. See [`profile`] for the document
//! format and [`file_ops`] for the entry points.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod logging;
pub mod passphrase;
pub mod profile;

pub use config::DecryptConfig;
pub use error::{ErrorCategory, ErrorKind, ProfileError, Result};
pub use file_ops::{decrypt_file, decrypt_profile, verify_file};
