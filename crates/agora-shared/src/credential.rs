use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::constants::{NONCE_SIZE, PUBKEY_SIZE, SIGNATURE_SIZE};
use crate::error::CredentialError;
use crate::types::WalletType;

/// Wallet payload carried inside a credential. `id` is the external wallet
/// address and must equal the signing address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletData {
    #[serde(default)]
    pub id: String,
}

/// Proof that a user controls an external wallet: the user's current nonce
/// signed with the wallet's Ed25519 key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub nonce: String,
    /// Hex-encoded 64-byte Ed25519 signature over the nonce bytes.
    pub signature: String,
    /// Hex-encoded 32-byte Ed25519 public key.
    pub public_address: String,
    pub network_type: String,
    pub wallet_type: WalletType,
    #[serde(default)]
    pub data: Option<WalletData>,
}

/// Generate a fresh one-time nonce (128 random bits, hex-encoded).
pub fn generate_nonce() -> String {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    hex::encode(nonce)
}

/// Verify a wallet credential against the nonce currently stored for the user.
pub fn verify_credential(
    credential: &Credential,
    expected_nonce: &str,
) -> Result<(), CredentialError> {
    let data = credential.data.as_ref().ok_or(CredentialError::MissingData)?;

    if credential.nonce != expected_nonce {
        return Err(CredentialError::NonceMismatch);
    }

    let address = credential.public_address.trim_start_matches("0x");
    if data.id.trim_start_matches("0x") != address {
        return Err(CredentialError::AddressMismatch);
    }

    let pubkey = decode_fixed::<PUBKEY_SIZE>(address).ok_or(CredentialError::InvalidPublicKey)?;
    let verifying_key =
        VerifyingKey::from_bytes(&pubkey).map_err(|_| CredentialError::InvalidPublicKey)?;

    let sig_bytes = decode_fixed::<SIGNATURE_SIZE>(credential.signature.trim_start_matches("0x"))
        .ok_or(CredentialError::InvalidSignature)?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(credential.nonce.as_bytes(), &signature)
        .map_err(|_| CredentialError::VerificationFailed)
}

fn decode_fixed<const N: usize>(hex_str: &str) -> Option<[u8; N]> {
    let bytes = hex::decode(hex_str).ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signed_credential(key: &SigningKey, nonce: &str) -> Credential {
        let address = hex::encode(key.verifying_key().to_bytes());
        Credential {
            nonce: nonce.to_string(),
            signature: hex::encode(key.sign(nonce.as_bytes()).to_bytes()),
            public_address: address.clone(),
            network_type: "agora".to_string(),
            wallet_type: WalletType::Polkadot,
            data: Some(WalletData { id: address }),
        }
    }

    #[test]
    fn test_nonce_is_random_hex() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), NONCE_SIZE * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_valid_credential_verifies() {
        let key = SigningKey::generate(&mut OsRng);
        let credential = signed_credential(&key, "abc123");
        assert!(verify_credential(&credential, "abc123").is_ok());
    }

    #[test]
    fn test_stale_nonce_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let credential = signed_credential(&key, "abc123");
        assert_eq!(
            verify_credential(&credential, "fresh"),
            Err(CredentialError::NonceMismatch)
        );
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let other = SigningKey::generate(&mut OsRng);
        let mut credential = signed_credential(&key, "abc123");
        credential.signature = hex::encode(other.sign(b"abc123").to_bytes());

        assert_eq!(
            verify_credential(&credential, "abc123"),
            Err(CredentialError::VerificationFailed)
        );
    }

    #[test]
    fn test_wallet_id_must_match_address() {
        let key = SigningKey::generate(&mut OsRng);
        let mut credential = signed_credential(&key, "abc123");
        credential.data = Some(WalletData {
            id: "deadbeef".to_string(),
        });

        assert_eq!(
            verify_credential(&credential, "abc123"),
            Err(CredentialError::AddressMismatch)
        );
    }
}
