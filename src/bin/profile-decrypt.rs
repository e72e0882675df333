//! profile-decrypt CLI - Decrypt passphrase-protected JSON profiles
//!
//! Command-line interface over the library: PBKDF2-HMAC-SHA256 key
//! derivation and AES-256-GCM decryption of `profile.enc.json` style files.

use clap::{Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process;

use profile_decrypt::config::{DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH};
use profile_decrypt::passphrase::{
    EnvPassphraseReader, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};
use profile_decrypt::{DecryptConfig, file_ops, logging};

#[derive(Parser)]
#[command(name = "profile-decrypt")]
#[command(version)]
#[command(about = "Decrypt passphrase-protected JSON profiles.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true, conflicts_with = "passphrase_env")]
    passphrase_stdin: bool,

    /// Read passphrase from the named environment variable
    #[arg(long, global = true, value_name = "VAR")]
    passphrase_env: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decrypt a profile and write the plaintext
    #[command(alias = "d")]
    Decrypt {
        /// Path to the encrypted profile
        #[arg(short, long, value_name = "FILE", env = "PROFILE_DECRYPT_INPUT", default_value = DEFAULT_INPUT_PATH)]
        input: PathBuf,

        /// Path to write the decrypted profile to (replaced if it exists)
        #[arg(short, long, value_name = "FILE", env = "PROFILE_DECRYPT_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Iteration count for profiles that do not specify one
        #[arg(long, value_name = "N", env = "PROFILE_DECRYPT_DEFAULT_ITERATIONS", default_value = "100000")]
        default_iterations: NonZeroU32,
    },

    /// Check that the passphrase opens a profile, without writing anything
    #[command(alias = "v")]
    Verify {
        /// Path to the encrypted profile
        #[arg(short, long, value_name = "FILE", env = "PROFILE_DECRYPT_INPUT", default_value = DEFAULT_INPUT_PATH)]
        input: PathBuf,

        /// Iteration count for profiles that do not specify one
        #[arg(long, value_name = "N", env = "PROFILE_DECRYPT_DEFAULT_ITERATIONS", default_value = "100000")]
        default_iterations: NonZeroU32,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut reader = get_passphrase_reader(cli.passphrase_stdin, cli.passphrase_env);
    let result = match cli.command {
        Commands::Decrypt {
            input,
            output,
            default_iterations,
        } => {
            let config =
                DecryptConfig::new(input, output).with_iterations_default(default_iterations);
            file_ops::decrypt_file(&config, &mut *reader)
        }
        Commands::Verify {
            input,
            default_iterations,
        } => file_ops::verify_file(&input, default_iterations, &mut *reader).map(|()| {
            println!("OK");
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn get_passphrase_reader(use_stdin: bool, env_var: Option<String>) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else if let Some(var) = env_var {
        Box::new(EnvPassphraseReader::new(var))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}

/// "outer: inner: innermost", following `source()` links. A cause whose text
/// the previous message already ends with is not repeated.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = cause.source();
    }
    out
}
