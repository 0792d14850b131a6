//! Vote calls made outside the entity pipeline.
//!
//! The guard is keyed by the call rather than the entity: creating a vote
//! re-runs target resolution, and deleting one looks the vote up first so
//! the counters of its target can be recomputed once it is gone.

use agora_shared::constants::COMMENT_FIRST_MESSAGE;
use agora_store::{NewVote, Vote};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::rules::resolve_vote_target;
use crate::services::Services;

#[derive(Debug, Clone)]
pub enum VoteCall {
    Create(NewVote),
    DeleteById(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum VoteOutcome {
    Created(Vote),
    Deleted { id: String },
}

#[derive(Clone)]
pub struct VoteGuard {
    services: Services,
}

impl VoteGuard {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Runs the call and recomputes every counter it touches before
    /// returning.
    pub fn call(&self, call: VoteCall) -> ApiResult<VoteOutcome> {
        match call {
            VoteCall::Create(mut new) => {
                resolve_vote_target(&self.services, &mut new).map_err(|e| match e {
                    ApiError::CommentFirst => ApiError::validation(COMMENT_FIRST_MESSAGE),
                    other => other,
                })?;

                let vote = self.services.store.with(|db| db.upsert_vote(&new))?.value;
                self.after_vote(&vote)?;
                Ok(VoteOutcome::Created(vote))
            }
            VoteCall::DeleteById(id) => {
                let vote = self.services.store.with(|db| {
                    let vote = db.get_vote(&id)?;
                    db.delete_vote(&id)?;
                    Ok(vote)
                })?;
                self.after_vote(&vote)?;
                Ok(VoteOutcome::Deleted { id })
            }
        }
    }

    fn after_vote(&self, vote: &Vote) -> ApiResult<()> {
        let metric = self
            .services
            .metric
            .public_metric(vote.reference_type, &vote.reference_id)?;
        self.services.metric.refresh_user_metric(&vote.to_user_id)?;
        self.services
            .metric
            .persist_public_metric(vote.reference_type, &vote.reference_id, metric)?;
        self.services.metric.refresh_popular_count(&vote.post_id)?;
        debug!(kind = %vote.reference_type, id = %vote.reference_id, ?metric, "vote counted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_comment, seed_post, seed_user, Harness};
    use agora_shared::{ReferenceType, SectionType};

    fn upvote(user_id: &str, post_id: &str) -> VoteCall {
        VoteCall::Create(NewVote {
            reference_type: ReferenceType::Post,
            reference_id: post_id.into(),
            post_id: post_id.into(),
            section: Some(SectionType::Discussion),
            state: true,
            user_id: user_id.into(),
            to_user_id: String::new(),
        })
    }

    #[tokio::test]
    async fn test_create_then_delete_keeps_counters_in_step() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let voter = seed_user(&h.state.store, "voter");
        let post = seed_post(&h.state.store, &author.id);
        h.state
            .store
            .with(|db| {
                let mut metric = db.get_post(&post.id)?.metric;
                metric.tips = 3;
                db.update_post_metric(&post.id, &metric)
            })
            .unwrap();

        let VoteOutcome::Created(vote) = h.state.votes.call(upvote(&voter.id, &post.id)).unwrap()
        else {
            panic!("expected a created vote");
        };
        assert_eq!(vote.section, None);

        let store = &h.state.store;
        let stored = store.with(|db| db.get_post(&post.id)).unwrap();
        assert_eq!(stored.metric.upvotes, 1);
        assert_eq!(stored.metric.tips, 3);
        assert_eq!(stored.popular_count, 1);
        assert_eq!(store.with(|db| db.get_user(&author.id)).unwrap().metric.total_kudos, 1);

        let outcome = h.state.votes.call(VoteCall::DeleteById(vote.id.clone())).unwrap();
        assert!(matches!(outcome, VoteOutcome::Deleted { ref id } if *id == vote.id));

        let stored = store.with(|db| db.get_post(&post.id)).unwrap();
        assert_eq!(stored.metric.upvotes, 0);
        assert_eq!(stored.metric.tips, 3);
        assert_eq!(stored.popular_count, 0);
        assert_eq!(store.with(|db| db.get_user(&author.id)).unwrap().metric.total_kudos, 0);
    }

    #[tokio::test]
    async fn test_downvote_requires_debate_comment() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let post = seed_post(&h.state.store, &author.id);
        let downvote = || {
            VoteCall::Create(NewVote {
                reference_type: ReferenceType::Post,
                reference_id: post.id.clone(),
                post_id: post.id.clone(),
                section: None,
                state: false,
                user_id: "critic".into(),
                to_user_id: String::new(),
            })
        };

        let err = h.state.votes.call(downvote()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == COMMENT_FIRST_MESSAGE));

        seed_comment(&h.state.store, "critic", &post.id, ReferenceType::Post, &post.id, SectionType::Debate);
        assert!(h.state.votes.call(downvote()).is_ok());
    }

    #[tokio::test]
    async fn test_deleting_unknown_vote_is_not_found() {
        let h = Harness::new();
        let err = h
            .state
            .votes
            .call(VoteCall::DeleteById("missing".into()))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { entity: "Vote", .. }));
    }
}
