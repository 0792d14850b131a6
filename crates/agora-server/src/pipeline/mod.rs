//! Mutation pipeline.
//!
//! Every entity-creating request runs as:
//!
//! ```text
//! before-rule (validate / rewrite args) -> commit -> after-rule (fan-out / reshape)
//! ```
//!
//! Rules are looked up by [`EntityKind`] in a table built once at startup.
//! Kinds without a rule commit unchanged.

pub mod commit;
pub mod context;
pub mod redact;
pub mod rules;
pub mod vote_guard;

use std::collections::HashMap;

use agora_shared::constants::COMMENT_FIRST_MESSAGE;
use agora_store::Store;
use async_trait::async_trait;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::fanout::FanOut;
use crate::services::Services;

pub use context::{Committed, EntityKind, Mutation, MutationContext, OperationKind, ReportDetail};
pub use redact::{PostView, ReadGuard};
pub use vote_guard::{VoteCall, VoteGuard, VoteOutcome};

/// Before/after hooks of one entity kind.
#[async_trait]
pub trait MutationRule: Send + Sync {
    /// Validate the request and prepare its arguments.  An error aborts the
    /// mutation before anything is written.
    async fn before(&self, _cx: &mut MutationContext) -> ApiResult<()> {
        Ok(())
    }

    /// Runs once the primary write has committed.  Side effects go to the
    /// fan-out queue; only writes the response depends on happen inline.
    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        Ok(committed)
    }
}

pub struct Pipeline {
    store: Store,
    rules: HashMap<EntityKind, Box<dyn MutationRule>>,
}

impl Pipeline {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        let store = services.store.clone();
        let mut pipeline = Self {
            store,
            rules: HashMap::new(),
        };

        pipeline.register(
            EntityKind::Transaction,
            rules::TransactionRule::new(services.clone(), fanout.clone()),
        );
        pipeline.register(
            EntityKind::Comment,
            rules::CommentRule::new(services.clone(), fanout.clone()),
        );
        pipeline.register(
            EntityKind::Friend,
            rules::FriendRule::new(services.clone(), fanout.clone()),
        );
        pipeline.register(
            EntityKind::Vote,
            rules::VoteRule::new(services.clone(), fanout.clone()),
        );
        pipeline.register(EntityKind::Tag, rules::TagRule::new(services.clone()));
        pipeline.register(
            EntityKind::ExperiencePost,
            rules::ExperiencePostRule::new(services.clone()),
        );
        pipeline.register(
            EntityKind::UserWallet,
            rules::WalletRule::new(services.clone(), fanout.clone()),
        );
        pipeline.register(
            EntityKind::NetworkCurrency,
            rules::CurrencyRule::new(services.clone()),
        );
        pipeline.register(EntityKind::UserReport, rules::ReportRule::new(services.clone()));
        pipeline.register(
            EntityKind::UserSocialMedia,
            rules::SocialMediaRule::new(services.clone(), fanout.clone()),
        );
        pipeline.register(EntityKind::Post, rules::PostRule::new(services, fanout));

        pipeline
    }

    pub fn register(&mut self, kind: EntityKind, rule: impl MutationRule + 'static) {
        self.rules.insert(kind, Box::new(rule));
    }

    /// Run a mutation with the default storage commit.
    pub async fn execute(&self, cx: MutationContext) -> ApiResult<Committed> {
        let store = self.store.clone();
        self.run(cx, move |cx| commit::apply(&store, cx)).await
    }

    /// Run a mutation, using `commit` as the primary write.
    pub async fn run<F>(&self, cx: MutationContext, commit: F) -> ApiResult<Committed>
    where
        F: FnOnce(&MutationContext) -> ApiResult<Committed> + Send,
    {
        let kind = cx.kind();
        match self.dispatch(cx, commit).await {
            Err(ApiError::CommentFirst) if kind == EntityKind::Vote => {
                Err(ApiError::validation(COMMENT_FIRST_MESSAGE))
            }
            other => other,
        }
    }

    async fn dispatch<F>(&self, mut cx: MutationContext, commit: F) -> ApiResult<Committed>
    where
        F: FnOnce(&MutationContext) -> ApiResult<Committed> + Send,
    {
        let kind = cx.kind();
        let Some(rule) = self.rules.get(&kind) else {
            return commit(&cx);
        };

        rule.before(&mut cx).await?;
        let committed = commit(&cx)?;
        debug!(kind = %kind, operation = ?cx.operation, "mutation committed");
        rule.after(&cx, committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_post, seed_user, Harness};
    use agora_shared::ReferenceType;
    use agora_store::{NewTransaction, NewUser, NewVote};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn transaction(from: &str, to: &str) -> Mutation {
        Mutation::Transaction(NewTransaction {
            hash: "0xhash".into(),
            amount: 1.0,
            from: from.into(),
            to: to.into(),
            reference_type: None,
            reference_id: None,
            currency_id: "missing".into(),
        })
    }

    #[tokio::test]
    async fn test_rejected_before_rule_skips_commit() {
        let h = Harness::new();
        let committed = AtomicBool::new(false);

        let err = h
            .state
            .pipeline
            .run(MutationContext::create(transaction("alice", "alice")), |_| {
                committed.store(true, Ordering::SeqCst);
                Err(ApiError::Internal("unreachable".into()))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "From and to address cannot be the same!");
        assert!(!committed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unregistered_kind_passes_through() {
        let h = Harness::new();
        let committed = h
            .create(Mutation::User(NewUser {
                id: Some("u-1".into()),
                name: "Alice".into(),
                username: "alice".into(),
                profile_picture_url: None,
                bio: None,
            }))
            .await
            .unwrap();
        assert!(matches!(committed, Committed::User(ref u) if u.id == "u-1"));
    }

    #[tokio::test]
    async fn test_comment_first_is_translated_for_votes_only() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let voter = seed_user(&h.state.store, "voter");
        let post = seed_post(&h.state.store, &author.id);

        let err = h
            .create(Mutation::Vote(NewVote {
                reference_type: ReferenceType::Post,
                reference_id: post.id.clone(),
                post_id: post.id.clone(),
                section: None,
                state: false,
                user_id: voter.id.clone(),
                to_user_id: String::new(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == COMMENT_FIRST_MESSAGE));

        let user = Mutation::User(NewUser {
            id: None,
            name: "Bob".into(),
            username: "bob".into(),
            profile_picture_url: None,
            bio: None,
        });
        let err = h
            .state
            .pipeline
            .run(MutationContext::create(user), |_| Err(ApiError::CommentFirst))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CommentFirst));
    }

    #[tokio::test]
    async fn test_other_vote_errors_propagate_unchanged() {
        let h = Harness::new();
        let voter = seed_user(&h.state.store, "voter");

        let err = h
            .create(Mutation::Vote(NewVote {
                reference_type: ReferenceType::Post,
                reference_id: "missing".into(),
                post_id: "missing".into(),
                section: None,
                state: true,
                user_id: voter.id,
                to_user_id: String::new(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { entity: "Post", .. }));
    }
}
