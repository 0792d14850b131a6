use agora_shared::{ActivityLogType, ReferenceType};
use async_trait::async_trait;

use crate::error::ApiResult;
use crate::fanout::FanOut;
use crate::pipeline::{Committed, EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

pub struct CommentRule {
    services: Services,
    fanout: FanOut,
}

impl CommentRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for CommentRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::Comment(comment) = &cx.args else {
            return Err(cx.mismatch(EntityKind::Comment));
        };
        self.services.store.with(|db| db.get_post(&comment.post_id))?;
        Ok(())
    }

    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let Committed::Comment(comment) = &committed else {
            return Ok(committed);
        };

        let notification = self.services.notification.clone();
        let sent = comment.clone();
        self.fanout.submit("comment-notification", async move {
            notification.send_post_comment(&sent)?;
            Ok(())
        });

        let metric = self.services.metric.clone();
        let post_id = comment.post_id.clone();
        self.fanout.submit("comment-popular-count", async move {
            metric.refresh_popular_count(&post_id)?;
            Ok(())
        });

        let metric = self.services.metric.clone();
        let post_id = comment.post_id.clone();
        self.fanout.submit("comment-post-metric", async move {
            metric.refresh_public_metric(ReferenceType::Post, &post_id)?;
            Ok(())
        });

        if comment.reference_type == ReferenceType::Comment {
            let metric = self.services.metric.clone();
            let parent_id = comment.reference_id.clone();
            self.fanout.submit("comment-parent-metric", async move {
                metric.refresh_public_metric(ReferenceType::Comment, &parent_id)?;
                Ok(())
            });
        }

        let activity = self.services.activity.clone();
        let (user_id, id) = (comment.user_id.clone(), comment.id.clone());
        self.fanout.submit("comment-activity", async move {
            activity.create_log(
                ActivityLogType::CreateComment,
                &user_id,
                ReferenceType::Comment,
                Some(&id),
            )?;
            Ok(())
        });

        Ok(committed)
    }
}
