use agora_store::{Store, StoreError};
use tracing::debug;

use crate::error::ApiResult;

/// Canonical form of a tag: the first whitespace-delimited token, lowercased,
/// with every non-alphanumeric character removed.
pub fn normalize_tag_id(raw: &str) -> String {
    raw.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[derive(Clone)]
pub struct TagService {
    store: Store,
}

impl TagService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn exists_any_case(&self, id: &str) -> ApiResult<bool> {
        Ok(self.store.with(|db| db.find_tag_any_case(id))?.is_some())
    }

    /// Count one more use of each tag, creating the ones seen for the first
    /// time.
    pub fn create_tags(&self, tags: &[String]) -> ApiResult<()> {
        self.store.with(|db| {
            for tag in tags {
                let id = normalize_tag_id(tag);
                if id.is_empty() || db.increment_tag(&id)? {
                    continue;
                }
                match db.create_tag(&id) {
                    Ok(_) => {}
                    // Created under another spelling since the increment.
                    Err(StoreError::Conflict(_)) => {
                        db.increment_tag(&id)?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })?;
        debug!(count = tags.len(), "tags counted");
        Ok(())
    }
}
