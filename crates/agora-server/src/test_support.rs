//! Shared fixtures for unit tests: an in-memory application state, a stub
//! contract verifier and record seeding helpers.

use std::sync::Arc;

use agora_shared::{
    Credential, PlatformType, PostStatus, ReferenceType, SectionType, WalletData, WalletType,
};
use agora_store::{
    Comment, Currency, Network, NewComment, NewCurrency, NewNetwork, NewPost, NewUser, NewVote,
    Post, Store, User, Vote,
};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};

use crate::api::AppState;
use crate::error::ApiResult;
use crate::fanout::FanOut;
use crate::pipeline::{Committed, Mutation, MutationContext};
use crate::services::CurrencyVerifier;

/// Answers every `eth_getCode` with the same bytecode.
pub struct StubVerifier {
    code: String,
}

impl StubVerifier {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
        }
    }
}

#[async_trait]
impl CurrencyVerifier for StubVerifier {
    async fn contract_code(&self, _rpc_url: &str, _address: &str) -> ApiResult<String> {
        Ok(self.code.clone())
    }
}

/// Application state over an in-memory store.  Must be built inside a
/// Tokio runtime since the fan-out queue spawns its dispatcher.
pub struct Harness {
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_contract_code("0x6080604052")
    }

    pub fn with_contract_code(code: &str) -> Self {
        let store = Store::open_in_memory().unwrap();
        let fanout = FanOut::spawn(4, 256);
        Self {
            state: AppState::new(store, Arc::new(StubVerifier::new(code)), fanout),
        }
    }

    pub async fn create(&self, args: Mutation) -> ApiResult<Committed> {
        self.state.pipeline.execute(MutationContext::create(args)).await
    }

    /// Wait for every queued side effect to finish.
    pub async fn settle(&self) {
        self.state.fanout.wait_idle().await;
    }
}

pub fn seed_user(store: &Store, name: &str) -> User {
    store
        .with(|db| {
            db.create_user(&NewUser {
                id: None,
                name: name.to_string(),
                username: name.to_lowercase(),
                profile_picture_url: None,
                bio: None,
            })
        })
        .unwrap()
}

/// A published native post, stored as-is without publish finalization.
pub fn seed_post(store: &Store, author_id: &str) -> Post {
    store
        .with(|db| {
            db.create_post(&NewPost {
                created_by: author_id.to_string(),
                text: "hello agora".to_string(),
                platform: PlatformType::Agora,
                status: PostStatus::Published,
                original_post_id: None,
                url: None,
                tags: Vec::new(),
                mentions: Vec::new(),
            })
        })
        .unwrap()
}

pub fn seed_comment(
    store: &Store,
    user_id: &str,
    post_id: &str,
    reference_type: ReferenceType,
    reference_id: &str,
    section: SectionType,
) -> Comment {
    store
        .with(|db| {
            db.create_comment(&NewComment {
                text: "a comment".to_string(),
                reference_type,
                section,
                reference_id: reference_id.to_string(),
                user_id: user_id.to_string(),
                post_id: post_id.to_string(),
            })
        })
        .unwrap()
}

pub fn seed_vote(store: &Store, user_id: &str, post: &Post, state: bool) -> Vote {
    store
        .with(|db| {
            db.upsert_vote(&NewVote {
                reference_type: ReferenceType::Post,
                reference_id: post.id.clone(),
                post_id: post.id.clone(),
                section: None,
                state,
                user_id: user_id.to_string(),
                to_user_id: post.created_by.clone(),
            })
        })
        .unwrap()
        .value
}

pub fn seed_network(store: &Store, id: &str) -> Network {
    store
        .with(|db| {
            db.create_network(&NewNetwork {
                id: id.to_string(),
                rpc_url: "http://localhost:8545".to_string(),
                explorer_url: None,
            })
        })
        .unwrap()
}

pub fn seed_currency(store: &Store, network_id: &str, symbol: &str, native: bool) -> Currency {
    let reference_id = (!native).then(|| format!("0x{:0>40}", hex::encode(symbol)));
    store
        .with(|db| {
            db.create_currency(&NewCurrency {
                network_id: network_id.to_string(),
                name: symbol.to_string(),
                symbol: symbol.to_string(),
                decimal: 18,
                image: None,
                native,
                reference_id,
            })
        })
        .unwrap()
}

/// A credential for the wallet owned by `key`, signing `nonce`.
pub fn signed_credential(
    key: &SigningKey,
    nonce: &str,
    network_type: &str,
    wallet_type: WalletType,
) -> Credential {
    let address = hex::encode(key.verifying_key().to_bytes());
    Credential {
        nonce: nonce.to_string(),
        signature: hex::encode(key.sign(nonce.as_bytes()).to_bytes()),
        public_address: address.clone(),
        network_type: network_type.to_string(),
        wallet_type,
        data: Some(WalletData { id: address }),
    }
}
