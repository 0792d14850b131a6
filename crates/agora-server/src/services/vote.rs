use agora_shared::ReferenceType;
use agora_store::{Comment, NewVote, Post, Store, Vote};

use crate::error::{ApiError, ApiResult};
use crate::services::metric::{MetricService, PublicMetric};

pub const SECTION_REQUIRED_MESSAGE: &str = "Section cannot empty when you upvote/downvote comment";

#[derive(Clone)]
pub struct VoteService {
    store: Store,
    metric: MetricService,
}

impl VoteService {
    pub fn new(store: Store, metric: MetricService) -> Self {
        Self { store, metric }
    }

    /// The voted post.  Downvoting requires the voter to have left a debate
    /// comment on it first; otherwise fails with [`ApiError::CommentFirst`].
    pub fn validate_post_vote(&self, vote: &NewVote) -> ApiResult<Post> {
        self.store
            .with(|db| {
                let post = db.get_post(&vote.reference_id)?;
                let debated = vote.state
                    || db
                        .find_debate_comment(&vote.user_id, ReferenceType::Post, &vote.reference_id)?
                        .is_some();
                Ok((post, debated))
            })
            .map_err(ApiError::from)
            .and_then(|(post, debated)| {
                if debated {
                    Ok(post)
                } else {
                    Err(ApiError::CommentFirst)
                }
            })
    }

    /// The voted comment.  Comment votes must name a section.
    pub fn validate_comment_vote(&self, vote: &NewVote) -> ApiResult<Comment> {
        if vote.section.is_none() {
            return Err(ApiError::validation(SECTION_REQUIRED_MESSAGE));
        }
        Ok(self.store.with(|db| db.get_comment(&vote.reference_id))?)
    }

    /// Recount the votes on the target and refresh its owner's metric.
    pub fn update_vote_counter(&self, vote: &Vote) -> ApiResult<PublicMetric> {
        let metric = self
            .metric
            .refresh_public_metric(vote.reference_type, &vote.reference_id)?;
        self.metric.refresh_user_metric(&vote.to_user_id)?;
        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_comment, seed_post, seed_user};
    use agora_shared::SectionType;

    fn downvote(user_id: &str, post: &Post) -> NewVote {
        NewVote {
            reference_type: ReferenceType::Post,
            reference_id: post.id.clone(),
            post_id: post.id.clone(),
            section: None,
            state: false,
            user_id: user_id.to_string(),
            to_user_id: String::new(),
        }
    }

    #[test]
    fn test_downvote_requires_debate_comment() {
        let store = Store::open_in_memory().unwrap();
        let author = seed_user(&store, "author");
        let alice = seed_user(&store, "alice");
        let post = seed_post(&store, &author.id);
        let service = VoteService::new(store.clone(), MetricService::new(store.clone()));

        let err = service.validate_post_vote(&downvote(&alice.id, &post)).unwrap_err();
        assert!(matches!(err, ApiError::CommentFirst));

        seed_comment(&store, &alice.id, &post.id, ReferenceType::Post, &post.id, SectionType::Discussion);
        assert!(service.validate_post_vote(&downvote(&alice.id, &post)).is_err());

        seed_comment(&store, &alice.id, &post.id, ReferenceType::Post, &post.id, SectionType::Debate);
        let found = service.validate_post_vote(&downvote(&alice.id, &post)).unwrap();
        assert_eq!(found.id, post.id);
    }

    #[test]
    fn test_comment_vote_requires_section() {
        let store = Store::open_in_memory().unwrap();
        let service = VoteService::new(store.clone(), MetricService::new(store));
        let vote = NewVote {
            reference_type: ReferenceType::Comment,
            reference_id: "c1".to_string(),
            post_id: "p1".to_string(),
            section: None,
            state: true,
            user_id: "alice".to_string(),
            to_user_id: String::new(),
        };
        let err = service.validate_comment_vote(&vote).unwrap_err();
        assert_eq!(err.to_string(), SECTION_REQUIRED_MESSAGE);
    }
}
