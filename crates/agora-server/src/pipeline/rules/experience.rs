use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{Committed, EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

pub struct ExperiencePostRule {
    services: Services,
}

impl ExperiencePostRule {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl MutationRule for ExperiencePostRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::ExperiencePost {
            experience_id,
            post_id,
            experience_index,
        } = &mut cx.args
        else {
            return Err(cx.mismatch(EntityKind::ExperiencePost));
        };
        let (experience_id, post_id) = (experience_id.as_str(), post_id.as_str());

        let (post, existing) = self.services.store.with(|db| {
            db.get_experience(experience_id)?;
            let post = db.get_post(post_id)?;
            let existing = db.find_experience_post(experience_id, post_id)?;
            Ok((post, existing))
        })?;
        if existing.is_some() {
            return Err(ApiError::conflict("Already added to experience"));
        }

        let mut index = post.experience_index;
        index.insert(experience_id.to_string(), 1);
        *experience_index = Some(index);
        Ok(())
    }

    /// The post's index is written inline so a read right after the
    /// response already lists the experience.  The write merges into the
    /// stored map under the store lock, so links committed between this
    /// rule's before and after are kept.
    fn after(&self, cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        if let Mutation::ExperiencePost {
            post_id,
            experience_index: Some(index),
            ..
        } = &cx.args
        {
            self.services
                .store
                .with(|db| db.merge_post_experience_index(post_id, index))?;
        }
        Ok(committed)
    }
}
