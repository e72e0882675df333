//! Profile decryption operations
//!
//! This module ties the pieces together: read the encrypted profile, decode
//! it, obtain the passphrase, derive the key, open the ciphertext and write
//! the plaintext out atomically.
//!
//! Everything that can be validated without the passphrase is validated
//! before the passphrase is requested, and nothing is written until the
//! authentication tag has verified.

use crate::cipher;
use crate::config::DecryptConfig;
use crate::error::{ErrorCategory, ErrorKind, ProfileError, Result};
use crate::kdf;
use crate::passphrase::PassphraseReader;
use crate::profile::{DecodedProfile, EncryptedProfile};
use std::fs;
use std::io::{self, Write};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Decrypt the profile at `config.input_path` into `config.output_path`
///
/// The output file is replaced atomically and created with mode 0o600
/// (read/write for owner only) on Unix systems. On any failure the output
/// path is left exactly as it was.
pub fn decrypt_file(
    config: &DecryptConfig,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let profile = load_profile(&config.input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = unseal(&profile, &passphrase, config.iterations_default)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_atomic(&config.output_path, &plaintext).map_err(|e| {
        e.with_context(format!("failed to write to {}", config.output_path.display()))
    })?;
    info!(
        output = %config.output_path.display(),
        bytes = plaintext.len(),
        "wrote decrypted profile"
    );
    Ok(())
}

/// Check that the profile at `input_path` opens with the passphrase
///
/// Runs the full decryption and discards the plaintext. Nothing is written.
pub fn verify_file(
    input_path: &Path,
    iterations_default: NonZeroU32,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let profile = load_profile(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    unseal(&profile, &passphrase, iterations_default)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    info!(input = %input_path.display(), "profile verified");
    Ok(())
}

/// Decrypt an encrypted profile document held in memory
pub fn decrypt_profile(
    input: &[u8],
    passphrase: &[u8],
    iterations_default: NonZeroU32,
) -> Result<Zeroizing<Vec<u8>>> {
    let profile = EncryptedProfile::from_json(input)?.decode()?;
    unseal(&profile, passphrase, iterations_default)
}

fn load_profile(path: &Path) -> Result<DecodedProfile> {
    let raw = fs::read(path).map_err(|e| read_error(path, e))?;
    debug!(input = %path.display(), bytes = raw.len(), "read encrypted profile");
    EncryptedProfile::from_json(&raw)
        .and_then(|p| p.decode())
        .map_err(|e| e.with_context(format!("failed to parse {}", path.display())))
}

fn unseal(
    profile: &DecodedProfile,
    passphrase: &[u8],
    iterations_default: NonZeroU32,
) -> Result<Zeroizing<Vec<u8>>> {
    let iterations = profile.resolve_iterations(iterations_default);
    debug!(
        iterations = iterations.get(),
        explicit = profile.iterations.is_some(),
        salt_len = profile.salt.len(),
        "deriving key"
    );
    let key = kdf::derive_key(passphrase, &profile.salt, iterations)?;
    cipher::open(&key, &profile.iv, &profile.ciphertext)
}

/// Symlinks followed before giving up, matching Linux's ELOOP limit.
const MAX_SYMLINK_HOPS: usize = 40;

/// Replace `path` with `contents` (tempfile + fsync + rename)
///
/// Either the old file or the complete new file exists at `path`, never a
/// partial one. If `path` is a symlink the file it points to is replaced and
/// the link is left alone.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let resolved = resolve_symlinks(path)?;
    let path = resolved.as_path();
    let dir = target_dir(path);
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        let category = if e.kind() == io::ErrorKind::NotFound {
            ErrorCategory::User
        } else {
            ErrorCategory::Internal
        };
        ProfileError::with_kind_and_source(
            category,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        ProfileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        ProfileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        ProfileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                ProfileError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            ProfileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }
    temp_file.persist(path).map_err(|e| {
        ProfileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Follow `path` through any chain of symlinks to the file they name.
///
/// The final target need not exist yet, so a dangling link resolves to the
/// path it would create.
fn resolve_symlinks(path: &Path) -> Result<PathBuf> {
    let mut resolved = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        match fs::symlink_metadata(&resolved) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = fs::read_link(&resolved).map_err(|e| {
                    ProfileError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        format!("failed to read symlink {}", resolved.display()),
                        e,
                    )
                })?;
                debug!(link = %resolved.display(), target = %link.display(), "following symlink");
                resolved = target_dir(&resolved).join(link);
            }
            _ => return Ok(resolved),
        }
    }
    Err(ProfileError::with_kind(
        ErrorCategory::User,
        ErrorKind::Io,
        format!("too many levels of symbolic links at {}", path.display()),
    ))
}

/// Directory the tempfile for `path` must live in for the rename to be atomic.
fn target_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn read_error(path: &Path, err: io::Error) -> ProfileError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    ProfileError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
