//! Error types for passman.
//!
//! Store failures are typed so the session can tell a wrong master password
//! apart from an unreadable or corrupt database file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be read or created.
    #[error("failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a passman database.
    #[error("database {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The envelope was written by a newer passman.
    #[error("database {} uses unsupported format version {version}", path.display())]
    UnsupportedVersion { path: PathBuf, version: u8 },

    /// The master password does not decrypt the database.
    #[error("wrong password for database {}", path.display())]
    Authentication { path: PathBuf },

    /// Key derivation, encryption or random number generation failed.
    #[error("cryptographic failure: {0}")]
    Crypto(String),

    /// The database could not be persisted.
    #[error("failed to write database {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record operation ran before the passwords table was created.
    #[error("passwords table does not exist")]
    MissingTable,
}

/// Errors that end an interactive session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("master password cannot be empty")]
    EmptyPassword,

    #[error("unexpected end of input")]
    EndOfInput,

    #[error("input cancelled")]
    Cancelled,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, StoreError>;
