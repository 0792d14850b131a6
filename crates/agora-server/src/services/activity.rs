use agora_shared::{ActivityLogType, ReferenceType};
use agora_store::{ActivityLog, Store};
use tracing::debug;

use crate::error::ApiResult;

#[derive(Clone)]
pub struct ActivityLogService {
    store: Store,
}

impl ActivityLogService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create_log(
        &self,
        log_type: ActivityLogType,
        user_id: &str,
        reference_type: ReferenceType,
        reference_id: Option<&str>,
    ) -> ApiResult<ActivityLog> {
        let log = self.store.with(|db| {
            db.create_activity_log(log_type, user_id, reference_type, reference_id)
        })?;
        debug!(kind = %log_type, user = %user_id, "activity logged");
        Ok(log)
    }
}
