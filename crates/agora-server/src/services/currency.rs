use agora_store::{Currency, Store};
use tracing::debug;

use crate::error::ApiResult;

#[derive(Clone)]
pub struct CurrencyService {
    store: Store,
}

impl CurrencyService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Look up a currency; a missing id surfaces as `NotFound`.
    pub fn find(&self, id: &str) -> ApiResult<Currency> {
        Ok(self.store.with(|db| db.get_currency(id))?)
    }

    /// Give a user every currency of a network, native currency first.
    /// Currencies the user already holds are skipped.  Returns how many were
    /// added.
    pub fn add_user_currencies(&self, user_id: &str, network_id: &str) -> ApiResult<usize> {
        let added = self.store.with(|db| {
            let held = db.list_user_currencies(user_id)?.len() as i64;
            let mut added: usize = 0;
            for currency in db.list_network_currencies(network_id)? {
                if db.add_user_currency(user_id, &currency, held + added as i64)? {
                    added += 1;
                }
            }
            Ok(added)
        })?;
        debug!(user = %user_id, network = %network_id, added, "user currencies initialised");
        Ok(added)
    }
}
