use agora_shared::{ActivityLogType, ReferenceType};
use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::fanout::FanOut;
use crate::pipeline::{Committed, EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

pub struct TransactionRule {
    services: Services,
    fanout: FanOut,
}

impl TransactionRule {
    pub fn new(services: Services, fanout: FanOut) -> Self {
        Self { services, fanout }
    }
}

#[async_trait]
impl MutationRule for TransactionRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::Transaction(tx) = &cx.args else {
            return Err(cx.mismatch(EntityKind::Transaction));
        };

        if tx.from == tx.to {
            return Err(ApiError::validation("From and to address cannot be the same!"));
        }

        if matches!(
            tx.reference_type,
            Some(ReferenceType::Post | ReferenceType::Comment)
        ) && tx.reference_id.as_deref().map_or(true, str::is_empty)
        {
            return Err(ApiError::validation("Please insert referenceId"));
        }

        self.services.currency.find(&tx.currency_id)?;
        Ok(())
    }

    fn after(&self, _cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let Committed::Transaction(tx) = &committed else {
            return Ok(committed);
        };

        let notification = self.services.notification.clone();
        let sent = tx.clone();
        self.fanout.submit("tips-notification", async move {
            notification.send_tips_success(&sent)?;
            Ok(())
        });

        if let (Some(reference_type), Some(reference_id)) =
            (tx.reference_type, tx.reference_id.clone())
        {
            let metric = self.services.metric.clone();
            self.fanout.submit("tips-metric", async move {
                match reference_type {
                    ReferenceType::Post => {
                        metric.refresh_tips(&reference_id)?;
                    }
                    ReferenceType::Comment => {
                        metric.refresh_public_metric(reference_type, &reference_id)?;
                    }
                    ReferenceType::User | ReferenceType::Transaction => {}
                }
                Ok(())
            });
        }

        let activity = self.services.activity.clone();
        let (from, id) = (tx.from.clone(), tx.id.clone());
        self.fanout.submit("tips-activity", async move {
            activity.create_log(
                ActivityLogType::SendTip,
                &from,
                ReferenceType::Transaction,
                Some(&id),
            )?;
            Ok(())
        });

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ApiError;
    use crate::pipeline::{Committed, Mutation};
    use crate::test_support::{seed_currency, seed_network, seed_post, seed_user, Harness};
    use agora_shared::ReferenceType;
    use agora_store::NewTransaction;

    fn tip(from: &str, to: &str, currency_id: &str, post_id: Option<&str>) -> Mutation {
        Mutation::Transaction(NewTransaction {
            hash: "0xabc".into(),
            amount: 2.5,
            from: from.into(),
            to: to.into(),
            reference_type: Some(ReferenceType::Post),
            reference_id: post_id.map(str::to_string),
            currency_id: currency_id.into(),
        })
    }

    #[tokio::test]
    async fn test_same_sender_and_recipient_is_rejected_without_write() {
        let h = Harness::new();
        let network = seed_network(&h.state.store, "polkadot");
        let currency = seed_currency(&h.state.store, &network.id, "DOT", true);

        let err = h
            .create(tip("alice", "alice", &currency.id, Some("p1")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "From and to address cannot be the same!");

        let tips = h
            .state
            .store
            .with(|db| db.count_tips(ReferenceType::Post, "p1"))
            .unwrap();
        assert_eq!(tips, 0);
    }

    #[tokio::test]
    async fn test_reference_id_required_and_currency_must_exist() {
        let h = Harness::new();
        let err = h.create(tip("alice", "bob", "DOT", None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Please insert referenceId");

        let err = h
            .create(tip("alice", "bob", "missing", Some("p1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { entity: "Currency", .. }));
    }

    #[tokio::test]
    async fn test_tip_fans_out_notification_metric_and_log() {
        let h = Harness::new();
        let network = seed_network(&h.state.store, "polkadot");
        let currency = seed_currency(&h.state.store, &network.id, "DOT", true);
        let alice = seed_user(&h.state.store, "alice");
        let bob = seed_user(&h.state.store, "bob");
        let post = seed_post(&h.state.store, &bob.id);

        let committed = h
            .create(tip(&alice.id, &bob.id, &currency.id, Some(&post.id)))
            .await
            .unwrap();
        assert!(matches!(committed, Committed::Transaction(_)));
        h.settle().await;

        let store = &h.state.store;
        assert_eq!(store.with(|db| db.get_post(&post.id)).unwrap().metric.tips, 1);
        assert_eq!(store.with(|db| db.list_notifications_for(&bob.id)).unwrap().len(), 1);
        assert_eq!(store.with(|db| db.list_activity_logs(&alice.id)).unwrap().len(), 1);
    }
}
