use agora_shared::constants::MAX_LISTED_IMPORTERS;
use agora_shared::PlatformType;
use agora_store::{Post, Store};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::tag::normalize_tag_id;

/// A user who imported the same external post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Importer {
    pub id: String,
    pub name: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Importers {
    pub importers: Vec<Importer>,
    pub total_importers: usize,
}

#[derive(Clone)]
pub struct PostService {
    store: Store,
}

impl PostService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Normalise and dedupe tags and mentions, stamp `published_at`, and
    /// return the stored post.
    pub fn finalize_publish(&self, post: &Post) -> ApiResult<Post> {
        let tags = dedup(post.tags.iter().map(|t| normalize_tag_id(t)));
        let mentions = dedup(post.mentions.iter().map(|m| m.trim().to_string()));

        Ok(self.store.with(|db| {
            db.publish_post(&post.id, &tags, &mentions, Utc::now())?;
            db.get_post(&post.id)
        })?)
    }

    /// Everyone who imported the same external post, members of
    /// `friend_ids` first.  Native posts have no importers.
    pub fn detail_importers(&self, post: &Post, friend_ids: &[String]) -> ApiResult<Importers> {
        let Some(original_post_id) = post.original_post_id.as_deref() else {
            return Ok(Importers::default());
        };
        if post.platform == PlatformType::Agora {
            return Ok(Importers::default());
        }

        Ok(self.store.with(|db| {
            let mut ids: Vec<String> = Vec::new();
            for copy in db.list_posts_by_origin(post.platform, original_post_id)? {
                if !ids.contains(&copy.created_by) {
                    ids.push(copy.created_by);
                }
            }
            let total_importers = ids.len();

            ids.sort_by_key(|id| !friend_ids.contains(id));

            let mut importers = Vec::new();
            for id in ids.iter().take(MAX_LISTED_IMPORTERS) {
                if let Some(user) = db.find_user(id)? {
                    importers.push(Importer {
                        id: user.id,
                        name: user.name,
                        username: user.username,
                        profile_picture_url: user.profile_picture_url,
                    });
                }
            }

            Ok(Importers {
                importers,
                total_importers,
            })
        })?)
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seed_user;
    use agora_shared::PostStatus;
    use agora_store::NewPost;

    fn import(store: &Store, user_id: &str) -> Post {
        store
            .with(|db| {
                db.create_post(&NewPost {
                    created_by: user_id.to_string(),
                    text: "imported".to_string(),
                    platform: PlatformType::Twitter,
                    status: PostStatus::Published,
                    original_post_id: Some("tweet-1".to_string()),
                    url: None,
                    tags: vec![],
                    mentions: vec![],
                })
            })
            .unwrap()
    }

    #[test]
    fn test_finalize_publish_normalises_tags() {
        let store = Store::open_in_memory().unwrap();
        let user = seed_user(&store, "alice");
        let post = store
            .with(|db| {
                db.create_post(&NewPost {
                    created_by: user.id.clone(),
                    text: "hello".to_string(),
                    platform: PlatformType::Agora,
                    status: PostStatus::Published,
                    original_post_id: None,
                    url: None,
                    tags: vec!["Rust".into(), "rust".into(), "Web 3".into()],
                    mentions: vec!["bob".into(), "bob".into()],
                })
            })
            .unwrap();

        let published = PostService::new(store).finalize_publish(&post).unwrap();
        assert_eq!(published.tags, vec!["rust".to_string(), "web".to_string()]);
        assert_eq!(published.mentions, vec!["bob".to_string()]);
        assert!(published.published_at.is_some());
    }

    #[test]
    fn test_importers_list_friends_first() {
        let store = Store::open_in_memory().unwrap();
        let alice = seed_user(&store, "alice");
        let bob = seed_user(&store, "bob");
        let carol = seed_user(&store, "carol");
        let post = import(&store, &alice.id);
        import(&store, &bob.id);
        import(&store, &carol.id);

        let service = PostService::new(store);
        let detail = service
            .detail_importers(&post, &[carol.id.clone()])
            .unwrap();
        assert_eq!(detail.total_importers, 3);
        assert_eq!(detail.importers[0].id, carol.id);
    }
}
