//! Passman - a simple command-line password manager.
//!
//! This library provides the pieces of the passman binary: an encrypted
//! single-table credential store, terminal echo control for secret entry,
//! and the one-shot interactive session that ties them together.

pub mod cli;
pub mod config;
pub mod console;
pub mod credentials;
pub mod crypto;
pub mod echo;
pub mod error;
pub mod logging;
pub mod session;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use credentials::{Record, RecordSummary};
pub use crypto::KdfParams;
pub use error::{SessionError, StoreError};
pub use logging::{LogConfig, init_logging};
pub use session::{MenuChoice, Outcome, SessionOptions};
pub use store::CredentialStore;
