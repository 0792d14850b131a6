//! CRUD operations for [`Post`] records.

use agora_shared::{PlatformType, PostStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::codec::{enum_col, json_col, new_id, opt_ts, or_not_found, to_json, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{ExperienceIndex, NewPost, Post, PostMetric};

const POST_COLUMNS: &str = "id, created_by, text, platform, status, original_post_id, url,
     tags, mentions, experience_index, metric, popular_count, published_at,
     created_at, updated_at, deleted_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create_post(&self, new: &NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: new_id(),
            created_by: new.created_by.clone(),
            text: new.text.clone(),
            platform: new.platform,
            status: new.status,
            original_post_id: new.original_post_id.clone(),
            url: new.url.clone(),
            tags: new.tags.clone(),
            mentions: new.mentions.clone(),
            experience_index: ExperienceIndex::new(),
            metric: PostMetric::default(),
            popular_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.conn().execute(
            "INSERT INTO posts (id, created_by, text, platform, status, original_post_id, url,
                                tags, mentions, experience_index, metric, popular_count,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                post.id,
                post.created_by,
                post.text,
                post.platform.as_str(),
                post.status.as_str(),
                post.original_post_id,
                post.url,
                to_json(&post.tags)?,
                to_json(&post.mentions)?,
                to_json(&post.experience_index)?,
                to_json(&post.metric)?,
                post.popular_count,
                post.created_at.to_rfc3339(),
                post.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_post(&self, id: &str) -> Result<Post> {
        self.conn()
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                row_to_post,
            )
            .map_err(or_not_found("Post", id))
    }

    pub fn find_post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                row_to_post,
            )
            .optional()?)
    }

    /// Every copy of an imported post, oldest import first.
    pub fn list_posts_by_origin(
        &self,
        platform: PlatformType,
        original_post_id: &str,
    ) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE platform = ?1 AND original_post_id = ?2 AND deleted_at IS NULL
             ORDER BY created_at ASC"
        ))?;

        let rows = stmt.query_map(params![platform.as_str(), original_post_id], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    pub fn count_published_posts(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM posts
             WHERE created_by = ?1 AND status = ?2 AND deleted_at IS NULL",
            params![user_id, PostStatus::Published.as_str()],
            |row| row.get(0),
        )?)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist the published form of a post.
    pub fn publish_post(
        &self,
        id: &str,
        tags: &[String],
        mentions: &[String],
        published_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "UPDATE posts
             SET status = ?1, tags = ?2, mentions = ?3, published_at = ?4, updated_at = ?4
             WHERE id = ?5",
            params![
                PostStatus::Published.as_str(),
                to_json(&tags)?,
                to_json(&mentions)?,
                published_at.to_rfc3339(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Add `entries` to the stored experience index of a post, keeping
    /// whatever is already there.  Returns the merged index.
    pub fn merge_post_experience_index(
        &self,
        id: &str,
        entries: &ExperienceIndex,
    ) -> Result<ExperienceIndex> {
        let mut index = self.get_post(id)?.experience_index;
        index.extend(entries.iter().map(|(k, v)| (k.clone(), *v)));
        self.conn().execute(
            "UPDATE posts SET experience_index = ?1 WHERE id = ?2",
            params![to_json(&index)?, id],
        )?;
        Ok(index)
    }

    pub fn update_post_metric(&self, id: &str, metric: &PostMetric) -> Result<()> {
        self.conn().execute(
            "UPDATE posts SET metric = ?1 WHERE id = ?2",
            params![to_json(metric)?, id],
        )?;
        Ok(())
    }

    pub fn update_post_popular_count(&self, id: &str, popular_count: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE posts SET popular_count = ?1 WHERE id = ?2",
            params![popular_count, id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Mark a post as removed.  Returns `true` if a live post was marked.
    pub fn soft_delete_post(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE posts SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(affected > 0)
    }

    /// Clear a soft delete.  Returns `true` if a removed post came back.
    pub fn restore_post(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE posts SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL",
            params![id],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let platform: String = row.get(3)?;
    let status: String = row.get(4)?;
    let tags: String = row.get(7)?;
    let mentions: String = row.get(8)?;
    let experience_index: String = row.get(9)?;
    let metric: String = row.get(10)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(Post {
        id: row.get(0)?,
        created_by: row.get(1)?,
        text: row.get(2)?,
        platform: enum_col(3, &platform)?,
        status: enum_col(4, &status)?,
        original_post_id: row.get(5)?,
        url: row.get(6)?,
        tags: json_col(7, &tags)?,
        mentions: json_col(8, &mentions)?,
        experience_index: json_col(9, &experience_index)?,
        metric: json_col(10, &metric)?,
        popular_count: row.get(11)?,
        published_at: opt_ts(12, row.get(12)?)?,
        created_at: ts(13, &created_at)?,
        updated_at: ts(14, &updated_at)?,
        deleted_at: opt_ts(15, row.get(15)?)?,
    })
}
