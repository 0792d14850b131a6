use async_trait::async_trait;

use crate::error::ApiResult;
use crate::fanout::FanOut;
use crate::pipeline::{Committed, MutationContext, MutationRule};
use crate::services::Services;

pub struct SocialMediaRule {
    services: Services,
    fanout: FanOut,
}

impl SocialMediaRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for SocialMediaRule {
    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let Committed::UserSocialMedia(social) = &committed else {
            return Ok(committed);
        };

        let network = self.services.network.clone();
        let (user_id, people_id) = (social.user_id.clone(), social.people_id.clone());
        self.fanout.submit("social-connect", async move {
            network.connect_social_media(&user_id, &people_id)?;
            Ok(())
        });

        Ok(committed)
    }
}
