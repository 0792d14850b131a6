use thiserror::Error;

/// Reasons a wallet credential fails verification.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential data is missing")]
    MissingData,

    #[error("Nonce does not match")]
    NonceMismatch,

    #[error("Wallet id does not match the signing address")]
    AddressMismatch,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid signature encoding")]
    InvalidSignature,

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// A persisted or submitted string did not name any variant of an enum.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
