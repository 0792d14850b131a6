use agora_shared::{ActivityLogType, ReferenceType};
use agora_store::NewVote;
use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::fanout::FanOut;
use crate::pipeline::{Committed, EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

/// Attach the owner of the voted content as `to_user_id` and enforce the
/// per-target vote rules.  Shared with the vote guard.
pub fn resolve_vote_target(services: &Services, vote: &mut NewVote) -> ApiResult<()> {
    match vote.reference_type {
        ReferenceType::Post => {
            let post = services.vote.validate_post_vote(vote)?;
            vote.to_user_id = post.created_by;
            vote.section = None;
        }
        ReferenceType::Comment => {
            let comment = services.vote.validate_comment_vote(vote)?;
            vote.to_user_id = comment.user_id;
        }
        ReferenceType::User | ReferenceType::Transaction => {
            return Err(ApiError::validation("Type not found"));
        }
    }
    Ok(())
}

pub struct VoteRule {
    services: Services,
    fanout: FanOut,
}

impl VoteRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for VoteRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::Vote(vote) = &mut cx.args else {
            return Err(cx.mismatch(EntityKind::Vote));
        };
        resolve_vote_target(&self.services, vote)
    }

    /// Responds with the vote itself rather than the upsert envelope.
    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let vote = match committed {
            Committed::VoteUpsert(upsert) => upsert.value,
            other => return Ok(other),
        };

        let votes = self.services.vote.clone();
        let counted = vote.clone();
        self.fanout.submit("vote-counter", async move {
            votes.update_vote_counter(&counted)?;
            Ok(())
        });

        let activity = self.services.activity.clone();
        let logged = vote.clone();
        self.fanout.submit("vote-activity", async move {
            activity.create_log(
                ActivityLogType::GiveVote,
                &logged.user_id,
                logged.reference_type,
                Some(&logged.reference_id),
            )?;
            Ok(())
        });

        Ok(Committed::Vote(vote))
    }
}
