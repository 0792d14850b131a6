//! # agora-shared
//!
//! Vocabulary shared by the store and the server: the string enums persisted
//! in every table, wallet credentials and their Ed25519 verification, and the
//! fixed user-facing messages.

pub mod constants;
pub mod credential;
pub mod error;
pub mod types;

pub use credential::{generate_nonce, verify_credential, Credential, WalletData};
pub use error::{CredentialError, UnknownVariant};
pub use types::*;
