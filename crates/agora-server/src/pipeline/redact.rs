//! Read-side visibility.
//!
//! Soft-deleted records keep their row; on the way out their readable
//! content is swapped for a placeholder, or the record is hidden when its
//! kind has no placeholder.  Storage is never touched here.

use agora_shared::constants::{
    BANNED_USER_PLACEHOLDER, REMOVED_COMMENT_PLACEHOLDER, REMOVED_POST_PLACEHOLDER,
};
use agora_shared::PlatformType;
use agora_store::{Comment, Experience, Post, User};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::services::{Importers, Services};

/// A record that can carry a deletion marker.
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Replace the readable content with a placeholder.  Returns `false`
    /// when the kind has none and must be hidden instead.
    fn mask(&mut self) -> bool {
        false
    }
}

/// Apply the deletion marker: live records pass, deleted ones are masked or
/// dropped.
pub fn redact<T: SoftDeletable>(mut record: T) -> Option<T> {
    if record.deleted_at().is_none() {
        return Some(record);
    }
    record.mask().then_some(record)
}

impl SoftDeletable for User {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mask(&mut self) -> bool {
        self.name = BANNED_USER_PLACEHOLDER.to_string();
        true
    }
}

impl SoftDeletable for Comment {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mask(&mut self) -> bool {
        self.text = REMOVED_COMMENT_PLACEHOLDER.to_string();
        true
    }
}

impl SoftDeletable for Experience {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

/// A post as served to readers, with the importers of a re-shared post.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    #[serde(flatten)]
    pub importers: Importers,
}

impl SoftDeletable for PostView {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.post.deleted_at
    }

    fn mask(&mut self) -> bool {
        self.post.text = REMOVED_POST_PLACEHOLDER.to_string();
        true
    }
}

/// Read paths for users, posts, comments and experiences.  `viewer` is the
/// optional id of the user asking; a blocked relationship between viewer
/// and owner reads as not found.
#[derive(Clone)]
pub struct ReadGuard {
    services: Services,
}

impl ReadGuard {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn read_user(&self, id: &str, viewer: Option<&str>) -> ApiResult<Option<User>> {
        if self.blocked(viewer, id)? {
            return Ok(None);
        }
        let user = self.services.store.with(|db| db.get_user(id))?;
        Ok(redact(user))
    }

    pub fn read_post(&self, id: &str, viewer: Option<&str>) -> ApiResult<Option<PostView>> {
        let post = self.services.store.with(|db| db.get_post(id))?;
        if self.blocked(viewer, &post.created_by)? {
            return Ok(None);
        }

        let importers = if post.platform == PlatformType::Agora {
            Importers::default()
        } else {
            let friend_ids = self.services.friend.importer_ids(&post.created_by)?;
            self.services.post.detail_importers(&post, &friend_ids)?
        };
        Ok(redact(PostView { post, importers }))
    }

    pub fn read_comment(&self, id: &str) -> ApiResult<Option<Comment>> {
        let comment = self.services.store.with(|db| db.get_comment(id))?;
        Ok(redact(comment))
    }

    pub fn read_experience(&self, id: &str) -> ApiResult<Option<Experience>> {
        let experience = self.services.store.with(|db| db.get_experience(id))?;
        Ok(redact(experience))
    }

    fn blocked(&self, viewer: Option<&str>, owner: &str) -> ApiResult<bool> {
        let Some(viewer) = viewer.filter(|v| !v.is_empty() && *v != owner) else {
            return Ok(false);
        };
        let blocked = self.services.friend.is_blocked(viewer, owner)?;
        if blocked {
            debug!(viewer = %viewer, owner = %owner, "read hidden by block");
        }
        Ok(blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_comment, seed_post, seed_user, Harness};
    use agora_shared::{FriendStatus, PostStatus, ReferenceType, SectionType};
    use agora_store::{NewFriend, NewPost};

    fn block(h: &Harness, from: &str, to: &str) {
        h.state
            .store
            .with(|db| {
                db.create_friend(&NewFriend {
                    requestor_id: from.into(),
                    requestee_id: to.into(),
                    status: FriendStatus::Blocked,
                })
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_banned_user_is_masked_but_stored_unchanged() {
        let h = Harness::new();
        let user = seed_user(&h.state.store, "mallory");
        h.state.store.with(|db| db.soft_delete_user(&user.id)).unwrap();

        let read = h.state.reads.read_user(&user.id, None).unwrap().unwrap();
        assert_eq!(read.name, BANNED_USER_PLACEHOLDER);

        let stored = h.state.store.with(|db| db.get_user(&user.id)).unwrap();
        assert_eq!(stored.name, user.name);
        assert!(stored.deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_blocked_viewer_sees_nothing() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let viewer = seed_user(&h.state.store, "viewer");
        let post = seed_post(&h.state.store, &author.id);
        block(&h, &author.id, &viewer.id);

        let reads = &h.state.reads;
        assert!(reads.read_user(&author.id, Some(&viewer.id)).unwrap().is_none());
        assert!(reads.read_post(&post.id, Some(&viewer.id)).unwrap().is_none());
        assert!(reads.read_post(&post.id, None).unwrap().is_some());
        assert!(reads.read_user(&author.id, Some(&author.id)).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_removed_post_and_comment_are_masked() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let post = seed_post(&h.state.store, &author.id);
        let comment = seed_comment(
            &h.state.store,
            &author.id,
            &post.id,
            ReferenceType::Post,
            &post.id,
            SectionType::Discussion,
        );
        h.state
            .store
            .with(|db| {
                db.soft_delete_post(&post.id)?;
                db.soft_delete_comment(&comment.id)
            })
            .unwrap();

        let view = h.state.reads.read_post(&post.id, None).unwrap().unwrap();
        assert_eq!(view.post.text, REMOVED_POST_PLACEHOLDER);
        let read = h.state.reads.read_comment(&comment.id).unwrap().unwrap();
        assert_eq!(read.text, REMOVED_COMMENT_PLACEHOLDER);
    }

    #[test]
    fn test_deleted_kind_without_placeholder_is_hidden() {
        let experience = Experience {
            id: "e1".into(),
            name: "Web3".into(),
            description: None,
            created_by: "u1".into(),
            created_at: Utc::now(),
            deleted_at: Some(Utc::now()),
        };
        assert!(redact(experience.clone()).is_none());
        assert!(redact(Experience {
            deleted_at: None,
            ..experience
        })
        .is_some());
    }

    #[tokio::test]
    async fn test_reshared_post_lists_importers_friends_first() {
        let h = Harness::new();
        let store = &h.state.store;
        let author = seed_user(store, "author");
        let stranger = seed_user(store, "stranger");
        let friend = seed_user(store, "friend");
        store
            .with(|db| {
                db.create_friend(&NewFriend {
                    requestor_id: author.id.clone(),
                    requestee_id: friend.id.clone(),
                    status: FriendStatus::Approved,
                })
            })
            .unwrap();

        let import = |by: &str| {
            store
                .with(|db| {
                    db.create_post(&NewPost {
                        created_by: by.into(),
                        text: "imported".into(),
                        platform: PlatformType::Twitter,
                        status: PostStatus::Published,
                        original_post_id: Some("tweet-1".into()),
                        url: None,
                        tags: Vec::new(),
                        mentions: Vec::new(),
                    })
                })
                .unwrap()
        };
        let own = import(&author.id);
        import(&stranger.id);
        import(&friend.id);

        let view = h.state.reads.read_post(&own.id, None).unwrap().unwrap();
        assert_eq!(view.importers.total_importers, 3);
        let ids: Vec<&str> = view.importers.importers.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![friend.id.as_str(), author.id.as_str(), stranger.id.as_str()]);
    }
}
