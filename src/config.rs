//! Decryption run configuration

use crate::profile::DEFAULT_ITERATIONS;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Default location of the encrypted profile.
pub const DEFAULT_INPUT_PATH: &str = "profile.enc.json";

/// Default location of the decrypted output.
pub const DEFAULT_OUTPUT_PATH: &str = "profile.json";

/// Where to read from, where to write to, and which iteration count to
/// assume for profiles that do not carry one.
///
/// The passphrase is not part of the configuration; it is supplied through
/// a [`PassphraseReader`](crate::passphrase::PassphraseReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub iterations_default: NonZeroU32,
}

impl DecryptConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            iterations_default: DEFAULT_ITERATIONS,
        }
    }

    pub fn with_iterations_default(mut self, iterations: NonZeroU32) -> Self {
        self.iterations_default = iterations;
        self
    }
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH)
    }
}
