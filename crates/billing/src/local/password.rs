//! Password hashing and strength checking through system tools.
//!
//! Hashes are MD5-crypt strings (`$1$pstripe$...`) produced by
//! `openssl passwd` with a fixed salt, so the same password always yields the
//! same hash and logins compare hashes directly.

use std::io;

use thiserror::Error;

use super::process::{run_with_stdin, text};

/// Fixed salt of every stored hash.
pub const HASH_SALT: &str = "pstripe";

/// Errors from the password tools.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The tool could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    /// The tool exited unsuccessfully.
    #[error("{program} failed: {detail}")]
    Failed {
        program: &'static str,
        detail: String,
    },

    /// The hasher printed nothing.
    #[error("password hash is empty")]
    EmptyHash,

    /// The strength checker printed nothing.
    #[error("password check failed")]
    CheckFailed,

    /// The strength checker rejected the password.
    #[error("the password, {0}")]
    Weak(String),
}

/// Turns a password into the hash stored as customer metadata.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password`.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError` if the hash cannot be computed.
    fn hash(&self, password: &str) -> Result<String, PasswordError>;
}

/// Judges whether a password is strong enough to register with.
pub trait PasswordStrengthChecker: Send + Sync {
    /// Check `password`.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Weak` with the checker's verdict when rejected.
    fn check(&self, password: &str) -> Result<(), PasswordError>;
}

/// `openssl passwd -1 -salt pstripe -stdin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslHasher;

impl PasswordHasher for OpensslHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        const PROGRAM: &str = "openssl";

        let output = run_with_stdin(PROGRAM, &["passwd", "-1", "-salt", HASH_SALT, "-stdin"], password)
            .map_err(|source| PasswordError::Spawn {
                program: PROGRAM,
                source,
            })?;
        if !output.status.success() {
            return Err(PasswordError::Failed {
                program: PROGRAM,
                detail: failure_detail(&output),
            });
        }

        let stdout = text(&output.stdout);
        let hash = stdout.lines().next().unwrap_or_default().trim();
        if hash.is_empty() {
            return Err(PasswordError::EmptyHash);
        }
        Ok(hash.to_owned())
    }
}

/// `cracklib-check`, reading the password on stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct CracklibChecker;

impl PasswordStrengthChecker for CracklibChecker {
    fn check(&self, password: &str) -> Result<(), PasswordError> {
        const PROGRAM: &str = "cracklib-check";

        let output = run_with_stdin(PROGRAM, &[], password).map_err(|source| {
            PasswordError::Spawn {
                program: PROGRAM,
                source,
            }
        })?;
        if !output.status.success() {
            return Err(PasswordError::Failed {
                program: PROGRAM,
                detail: failure_detail(&output),
            });
        }

        verdict(&text(&output.stdout))
    }
}

/// Interpret `cracklib-check` output (`<password>: <verdict>`).
fn verdict(output: &str) -> Result<(), PasswordError> {
    if output.is_empty() {
        return Err(PasswordError::CheckFailed);
    }
    if reports_ok(output) {
        return Ok(());
    }
    Err(PasswordError::Weak(output.trim_end().to_owned()))
}

/// Whether the output contains `:` followed by optional spaces and `OK`.
fn reports_ok(output: &str) -> bool {
    output.match_indices(':').any(|(at, _)| {
        output
            .get(at + 1..)
            .is_some_and(|rest| rest.trim_start_matches(' ').starts_with("OK"))
    })
}

fn failure_detail(output: &std::process::Output) -> String {
    let stderr = text(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        stderr.to_owned()
    }
}

/// Compare two hashes without short-circuiting on the first difference.
#[must_use]
pub fn hashes_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
