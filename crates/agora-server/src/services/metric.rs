//! Engagement counters.
//!
//! Every counter is recomputed from source rows rather than patched by a
//! delta, so refreshing twice without an intervening change is a no-op.

use agora_shared::{FriendStatus, ReferenceType, SectionType};
use agora_store::{CommentMetric, Database, PostMetric, Store, UserMetric};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;

/// Vote and comment counters of a post or comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMetric {
    pub upvotes: i64,
    pub downvotes: i64,
    pub debates: i64,
    pub discussions: i64,
    pub comments: i64,
}

impl PublicMetric {
    /// Overwrite the counters this metric owns, leaving `tips` intact.
    pub fn merge_into(self, metric: &mut PostMetric) {
        metric.upvotes = self.upvotes;
        metric.downvotes = self.downvotes;
        metric.debates = self.debates;
        metric.discussions = self.discussions;
        metric.comments = self.comments;
    }

    pub fn to_comment_metric(self) -> CommentMetric {
        CommentMetric {
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            comments: self.comments,
        }
    }
}

#[derive(Clone)]
pub struct MetricService {
    store: Store,
}

impl MetricService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Compute the public counters of a post or comment without writing
    /// them.  Other reference types have no public counters.
    pub fn public_metric(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> ApiResult<PublicMetric> {
        Ok(self
            .store
            .with(|db| compute_public(db, reference_type, reference_id))?)
    }

    /// Write computed counters onto the target.  Post metrics are merged so
    /// fields owned elsewhere survive; comment metrics are replaced.
    pub fn persist_public_metric(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
        metric: PublicMetric,
    ) -> ApiResult<()> {
        Ok(self
            .store
            .with(|db| persist_public(db, reference_type, reference_id, metric))?)
    }

    pub fn refresh_public_metric(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> ApiResult<PublicMetric> {
        let metric = self.store.with(|db| {
            let metric = compute_public(db, reference_type, reference_id)?;
            persist_public(db, reference_type, reference_id, metric)?;
            Ok(metric)
        })?;
        debug!(kind = %reference_type, id = %reference_id, ?metric, "public metric refreshed");
        Ok(metric)
    }

    /// Recount tips sent to a post.
    pub fn refresh_tips(&self, post_id: &str) -> ApiResult<i64> {
        Ok(self.store.with(|db| {
            let Some(post) = db.find_post(post_id)? else {
                return Ok(0);
            };
            let mut metric = post.metric;
            metric.tips = db.count_tips(ReferenceType::Post, post_id)?;
            db.update_post_metric(post_id, &metric)?;
            Ok(metric.tips)
        })?)
    }

    /// Popularity of a post: upvotes plus every comment in its thread.
    pub fn count_popular_post(&self, post_id: &str) -> ApiResult<i64> {
        Ok(self.store.with(|db| popular_count(db, post_id))?)
    }

    pub fn refresh_popular_count(&self, post_id: &str) -> ApiResult<i64> {
        Ok(self.store.with(|db| {
            let count = popular_count(db, post_id)?;
            db.update_post_popular_count(post_id, count)?;
            Ok(count)
        })?)
    }

    /// Recompute and store a user's aggregate counters.  An unknown user
    /// gets the computed metric back without anything being written.
    pub fn refresh_user_metric(&self, user_id: &str) -> ApiResult<UserMetric> {
        let metric = self.store.with(|db| {
            let metric = UserMetric {
                total_posts: db.count_published_posts(user_id)?,
                total_kudos: db.count_votes_to_user(user_id, true)?,
                total_friends: db.count_friends(user_id, FriendStatus::Approved)?,
                total_experiences: db.count_experiences_by(user_id)?,
            };
            if db.find_user(user_id)?.is_some() {
                db.update_user_metric(user_id, &metric)?;
            }
            Ok(metric)
        })?;
        debug!(user = %user_id, ?metric, "user metric refreshed");
        Ok(metric)
    }
}

fn compute_public(
    db: &Database,
    reference_type: ReferenceType,
    reference_id: &str,
) -> agora_store::Result<PublicMetric> {
    let comments = match reference_type {
        ReferenceType::Post => db.count_comments_on_post(reference_id)?,
        ReferenceType::Comment => db.count_comments(reference_type, reference_id, None)?,
        ReferenceType::User | ReferenceType::Transaction => return Ok(PublicMetric::default()),
    };

    Ok(PublicMetric {
        upvotes: db.count_votes(reference_type, reference_id, true)?,
        downvotes: db.count_votes(reference_type, reference_id, false)?,
        debates: db.count_comments(reference_type, reference_id, Some(SectionType::Debate))?,
        discussions: db.count_comments(
            reference_type,
            reference_id,
            Some(SectionType::Discussion),
        )?,
        comments,
    })
}

fn persist_public(
    db: &Database,
    reference_type: ReferenceType,
    reference_id: &str,
    metric: PublicMetric,
) -> agora_store::Result<()> {
    match reference_type {
        ReferenceType::Post => {
            if let Some(post) = db.find_post(reference_id)? {
                let mut merged = post.metric;
                metric.merge_into(&mut merged);
                db.update_post_metric(reference_id, &merged)?;
            }
        }
        ReferenceType::Comment => {
            db.update_comment_metric(reference_id, &metric.to_comment_metric())?;
        }
        ReferenceType::User | ReferenceType::Transaction => {}
    }
    Ok(())
}

fn popular_count(db: &Database, post_id: &str) -> agora_store::Result<i64> {
    Ok(db.count_votes(ReferenceType::Post, post_id, true)? + db.count_comments_on_post(post_id)?)
}
