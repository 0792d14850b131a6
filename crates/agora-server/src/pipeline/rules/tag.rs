use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::{normalize_tag_id, Services};

pub struct TagRule {
    services: Services,
}

impl TagRule {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl MutationRule for TagRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::Tag(tag) = &mut cx.args else {
            return Err(cx.mismatch(EntityKind::Tag));
        };

        let id = normalize_tag_id(&tag.id);
        if id.is_empty() {
            return Err(ApiError::validation("Tag cannot be empty"));
        }
        if self.services.tag.exists_any_case(&id)? {
            return Err(ApiError::conflict("Tag already exist"));
        }

        tag.id = id;
        Ok(())
    }
}
