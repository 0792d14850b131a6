use agora_shared::{ActivityLogType, FriendStatus, ReferenceType};
use async_trait::async_trait;

use crate::error::ApiResult;
use crate::fanout::FanOut;
use crate::pipeline::{
    Committed, EntityKind, Mutation, MutationContext, MutationRule, OperationKind,
};
use crate::services::{FriendPlan, Services};

pub struct FriendRule {
    services: Services,
    fanout: FanOut,
}

impl FriendRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for FriendRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::Friend { request, plan } = &mut cx.args else {
            return Err(cx.mismatch(EntityKind::Friend));
        };

        let resolved = self.services.friend.resolve_request(request)?;
        let is_update = matches!(resolved, FriendPlan::Update { .. });
        *plan = Some(resolved);

        if is_update {
            cx.operation = OperationKind::Update;
        }
        Ok(())
    }

    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let Committed::Friend(friend) = &committed else {
            return Ok(committed);
        };
        if friend.status != FriendStatus::Pending {
            return Ok(committed);
        }

        let notification = self.services.notification.clone();
        let sent = friend.clone();
        self.fanout.submit("friend-notification", async move {
            notification.send_friend_request(&sent)?;
            Ok(())
        });

        let activity = self.services.activity.clone();
        let (requestor, requestee) = (friend.requestor_id.clone(), friend.requestee_id.clone());
        self.fanout.submit("friend-activity", async move {
            activity.create_log(
                ActivityLogType::FriendRequest,
                &requestor,
                ReferenceType::User,
                Some(&requestee),
            )?;
            Ok(())
        });

        Ok(committed)
    }
}
