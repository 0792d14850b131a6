use agora_shared::{ActivityLogType, PostStatus, ReferenceType};
use async_trait::async_trait;

use crate::error::ApiResult;
use crate::fanout::FanOut;
use crate::pipeline::{Committed, MutationContext, MutationRule};
use crate::services::Services;

pub struct PostRule {
    services: Services,
    fanout: FanOut,
}

impl PostRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for PostRule {
    /// Published posts are finalized before responding; drafts are returned
    /// as stored.
    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let Committed::Post(post) = &committed else {
            return Ok(committed);
        };
        if post.status != PostStatus::Published {
            return Ok(committed);
        }

        let post = self.services.post.finalize_publish(post)?;

        let tags = self.services.tag.clone();
        let post_tags = post.tags.clone();
        self.fanout.submit("post-tags", async move {
            tags.create_tags(&post_tags)
        });

        if !post.mentions.is_empty() {
            let notification = self.services.notification.clone();
            let (id, author, mentions) =
                (post.id.clone(), post.created_by.clone(), post.mentions.clone());
            self.fanout.submit("post-mentions", async move {
                notification.send_mention(&id, &author, &mentions)?;
                Ok(())
            });
        }

        let metric = self.services.metric.clone();
        let author = post.created_by.clone();
        self.fanout.submit("post-user-metric", async move {
            metric.refresh_user_metric(&author)?;
            Ok(())
        });

        let activity = self.services.activity.clone();
        let (author, id) = (post.created_by.clone(), post.id.clone());
        self.fanout.submit("post-activity", async move {
            activity.create_log(ActivityLogType::CreatePost, &author, ReferenceType::Post, Some(&id))?;
            Ok(())
        });

        Ok(Committed::Post(post))
    }
}
