use agora_shared::{generate_nonce, verify_credential};
use agora_store::Wallet;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::fanout::FanOut;
use crate::pipeline::{Committed, EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

/// Links an external wallet to a user once the credential proves ownership.
pub struct WalletRule {
    services: Services,
    fanout: FanOut,
}

impl WalletRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for WalletRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::UserWallet {
            user_id,
            credential,
            wallet,
        } = &mut cx.args
        else {
            return Err(cx.mismatch(EntityKind::UserWallet));
        };
        let (user_id, credential) = (user_id.as_str(), &*credential);

        let Some(data) = credential.data.as_ref() else {
            return Err(ApiError::validation("Data cannot be empty"));
        };

        let network_id = credential.network_type.clone();
        let user = self.services.store.with(|db| {
            if !db.network_exists(&network_id)? {
                return Ok(Err(ApiError::validation("Network not exists")));
            }
            if data.id.is_empty() {
                return Ok(Err(ApiError::validation("Id must included")));
            }
            if db.wallet_exists(&data.id)? {
                return Ok(Err(ApiError::conflict("Wallet Id already exist")));
            }
            if db
                .find_wallet_by_type(user_id, credential.wallet_type)?
                .is_some()
            {
                return Ok(Err(ApiError::conflict("Wallet already connected")));
            }
            db.get_user(user_id).map(Ok)
        })??;

        if let Err(e) = verify_credential(credential, &user.nonce) {
            warn!(user = %user.id, error = %e, "wallet credential rejected");
            return Err(ApiError::Verification("Failed to verify".into()));
        }

        *wallet = Some(Wallet {
            id: data.id.clone(),
            user_id: user.id,
            network_id,
            wallet_type: credential.wallet_type,
            primary: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    /// Rotates the user's nonce so the credential cannot be replayed.
    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let Committed::Wallet(wallet) = &committed else {
            return Ok(committed);
        };
        let nonce = generate_nonce();

        let network = self.services.network.clone();
        let connected = wallet.clone();
        self.fanout.submit("wallet-connect", async move {
            network.connect_account(&connected)?;
            Ok(())
        });

        let currency = self.services.currency.clone();
        let (user_id, network_id) = (wallet.user_id.clone(), wallet.network_id.clone());
        self.fanout.submit("wallet-currencies", async move {
            let added = currency.add_user_currencies(&user_id, &network_id)?;
            debug!(user = %user_id, network = %network_id, added, "user currencies initialised");
            Ok(())
        });

        let store = self.services.store.clone();
        let user_id = wallet.user_id.clone();
        self.fanout.submit("wallet-nonce", async move {
            store.with(|db| db.update_user_nonce(&user_id, &nonce))?;
            Ok(())
        });

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ApiError;
    use crate::pipeline::{Committed, Mutation};
    use crate::test_support::{
        seed_currency, seed_network, seed_user, signed_credential, Harness,
    };
    use agora_shared::WalletType;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    fn link(user_id: &str, credential: agora_shared::Credential) -> Mutation {
        Mutation::UserWallet {
            user_id: user_id.into(),
            credential,
            wallet: None,
        }
    }

    #[tokio::test]
    async fn test_verified_wallet_becomes_primary_and_rotates_nonce() {
        let h = Harness::new();
        let network = seed_network(&h.state.store, "polkadot");
        seed_currency(&h.state.store, &network.id, "DOT", true);
        seed_currency(&h.state.store, &network.id, "USDT", false);
        let user = seed_user(&h.state.store, "alice");
        let key = SigningKey::generate(&mut OsRng);

        let credential = signed_credential(&key, &user.nonce, &network.id, WalletType::Polkadot);
        let Committed::Wallet(wallet) = h.create(link(&user.id, credential)).await.unwrap() else {
            panic!("expected a wallet");
        };
        assert!(!wallet.primary);
        h.settle().await;

        let store = &h.state.store;
        let wallets = store.with(|db| db.list_user_wallets(&user.id)).unwrap();
        assert_eq!(wallets.len(), 1);
        assert!(wallets[0].primary);
        assert_eq!(store.with(|db| db.list_user_currencies(&user.id)).unwrap().len(), 2);
        assert_ne!(store.with(|db| db.get_user(&user.id)).unwrap().nonce, user.nonce);
    }

    #[tokio::test]
    async fn test_replayed_credential_fails_verification() {
        let h = Harness::new();
        let network = seed_network(&h.state.store, "polkadot");
        let user = seed_user(&h.state.store, "alice");
        let key = SigningKey::generate(&mut OsRng);
        let credential = signed_credential(&key, &user.nonce, &network.id, WalletType::Polkadot);

        h.create(link(&user.id, credential.clone())).await.unwrap();
        h.settle().await;

        let second = SigningKey::generate(&mut OsRng);
        let replay = signed_credential(&second, &user.nonce, &network.id, WalletType::Near);
        let err = h.create(link(&user.id, replay)).await.unwrap_err();
        assert!(matches!(err, ApiError::Verification(ref m) if m == "Failed to verify"));
    }

    #[tokio::test]
    async fn test_one_wallet_per_type_and_globally_unique_ids() {
        let h = Harness::new();
        let network = seed_network(&h.state.store, "polkadot");
        let alice = seed_user(&h.state.store, "alice");
        let bob = seed_user(&h.state.store, "bob");
        let key = SigningKey::generate(&mut OsRng);

        let credential = signed_credential(&key, &alice.nonce, &network.id, WalletType::Polkadot);
        h.create(link(&alice.id, credential)).await.unwrap();

        let taken = signed_credential(&key, &bob.nonce, &network.id, WalletType::Polkadot);
        let err = h.create(link(&bob.id, taken)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "Wallet Id already exist"));

        let other = SigningKey::generate(&mut OsRng);
        h.settle().await;
        let nonce = h.state.store.with(|db| db.get_user(&alice.id)).unwrap().nonce;
        let same_type = signed_credential(&other, &nonce, &network.id, WalletType::Polkadot);
        let err = h.create(link(&alice.id, same_type)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "Wallet already connected"));
    }

    #[tokio::test]
    async fn test_missing_data_and_unknown_network_are_rejected() {
        let h = Harness::new();
        let user = seed_user(&h.state.store, "alice");
        let key = SigningKey::generate(&mut OsRng);

        let mut credential = signed_credential(&key, &user.nonce, "polkadot", WalletType::Polkadot);
        credential.data = None;
        let err = h.create(link(&user.id, credential)).await.unwrap_err();
        assert_eq!(err.to_string(), "Data cannot be empty");

        let credential = signed_credential(&key, &user.nonce, "missing", WalletType::Polkadot);
        let err = h.create(link(&user.id, credential)).await.unwrap_err();
        assert_eq!(err.to_string(), "Network not exists");
    }
}
