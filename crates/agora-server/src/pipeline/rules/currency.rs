use async_trait::async_trait;

use crate::error::ApiResult;
use crate::pipeline::{EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

pub struct CurrencyRule {
    services: Services,
}

impl CurrencyRule {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl MutationRule for CurrencyRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::NetworkCurrency {
            network_id,
            raw,
            verified,
        } = &mut cx.args
        else {
            return Err(cx.mismatch(EntityKind::NetworkCurrency));
        };

        let network = self.services.store.with(|db| db.get_network(network_id))?;
        let currency = self
            .services
            .network
            .verify_contract_address(&network, raw.clone())
            .await?;
        *verified = Some(currency);
        Ok(())
    }
}
