use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error is not caused by the
    /// user, merely that the code cannot tell.
    Internal,

    /// The user provided invalid input (a malformed profile, a wrong
    /// passphrase, a missing file) or asked for something impossible.
    User,
}

/// Condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The profile document is malformed: invalid JSON, a missing or
    /// mistyped field, bad base64, a wrong nonce length or an invalid
    /// iteration count.
    Format,
    /// The GCM tag did not verify: wrong passphrase, corruption or
    /// tampering.
    AuthenticationFailed,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// PBKDF2 key derivation failed.
    KeyDerivation,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct ProfileError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Any code consuming errors MUST
    /// handle the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl ProfileError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Shorthand for a user-caused [`ErrorKind::Format`] failure.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, ErrorKind::Format, msg)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// True when the profile document itself was rejected.
    pub fn is_format(&self) -> bool {
        self.kind == Some(ErrorKind::Format)
    }

    /// True when the passphrase was wrong or the ciphertext was altered.
    pub fn is_authentication(&self) -> bool {
        self.kind == Some(ErrorKind::AuthenticationFailed)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ProfileError>;
