//! CRUD operations for [`Comment`] records.

use agora_shared::{ReferenceType, SectionType};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{enum_col, json_col, new_id, opt_ts, or_not_found, to_json, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{Comment, CommentMetric, NewComment};

const COMMENT_COLUMNS: &str = "id, text, reference_type, section, reference_id, user_id, post_id,
     metric, created_at, updated_at, deleted_at";

impl Database {
    pub fn create_comment(&self, new: &NewComment) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: new_id(),
            text: new.text.clone(),
            reference_type: new.reference_type,
            section: new.section,
            reference_id: new.reference_id.clone(),
            user_id: new.user_id.clone(),
            post_id: new.post_id.clone(),
            metric: CommentMetric::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.conn().execute(
            "INSERT INTO comments (id, text, reference_type, section, reference_id, user_id,
                                   post_id, metric, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                comment.id,
                comment.text,
                comment.reference_type.as_str(),
                comment.section.as_str(),
                comment.reference_id,
                comment.user_id,
                comment.post_id,
                to_json(&comment.metric)?,
                comment.created_at.to_rfc3339(),
                comment.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(comment)
    }

    pub fn get_comment(&self, id: &str) -> Result<Comment> {
        self.conn()
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id],
                row_to_comment,
            )
            .map_err(or_not_found("Comment", id))
    }

    pub fn find_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id],
                row_to_comment,
            )
            .optional()?)
    }

    /// The first debate-section comment a user left on a target, if any.
    pub fn find_debate_comment(
        &self,
        user_id: &str,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<Option<Comment>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {COMMENT_COLUMNS} FROM comments
                     WHERE user_id = ?1 AND reference_type = ?2 AND reference_id = ?3
                       AND section = ?4 AND deleted_at IS NULL
                     ORDER BY created_at ASC
                     LIMIT 1"
                ),
                params![
                    user_id,
                    reference_type.as_str(),
                    reference_id,
                    SectionType::Debate.as_str()
                ],
                row_to_comment,
            )
            .optional()?)
    }

    /// Live comments directly under a target, optionally limited to one
    /// section.
    pub fn count_comments(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
        section: Option<SectionType>,
    ) -> Result<i64> {
        let count = match section {
            Some(section) => self.conn().query_row(
                "SELECT COUNT(*) FROM comments
                 WHERE reference_type = ?1 AND reference_id = ?2 AND section = ?3
                   AND deleted_at IS NULL",
                params![reference_type.as_str(), reference_id, section.as_str()],
                |row| row.get(0),
            )?,
            None => self.conn().query_row(
                "SELECT COUNT(*) FROM comments
                 WHERE reference_type = ?1 AND reference_id = ?2 AND deleted_at IS NULL",
                params![reference_type.as_str(), reference_id],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Every live comment in a post's thread, replies included.
    pub fn count_comments_on_post(&self, post_id: &str) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND deleted_at IS NULL",
            params![post_id],
            |row| row.get(0),
        )?)
    }

    pub fn update_comment_metric(&self, id: &str, metric: &CommentMetric) -> Result<()> {
        self.conn().execute(
            "UPDATE comments SET metric = ?1 WHERE id = ?2",
            params![to_json(metric)?, id],
        )?;
        Ok(())
    }

    pub fn soft_delete_comment(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE comments SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(affected > 0)
    }

    pub fn restore_comment(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE comments SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL",
            params![id],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let reference_type: String = row.get(2)?;
    let section: String = row.get(3)?;
    let metric: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Comment {
        id: row.get(0)?,
        text: row.get(1)?,
        reference_type: enum_col(2, &reference_type)?,
        section: enum_col(3, &section)?,
        reference_id: row.get(4)?,
        user_id: row.get(5)?,
        post_id: row.get(6)?,
        metric: json_col(7, &metric)?,
        created_at: ts(8, &created_at)?,
        updated_at: ts(9, &updated_at)?,
        deleted_at: opt_ts(10, row.get(10)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(user: &str, section: SectionType) -> NewComment {
        NewComment {
            text: "a comment".to_string(),
            reference_type: ReferenceType::Post,
            section,
            reference_id: "p1".to_string(),
            user_id: user.to_string(),
            post_id: "p1".to_string(),
        }
    }

    #[test]
    fn test_debate_comment_lookup() {
        let db = Database::open_in_memory().unwrap();
        db.create_comment(&comment("alice", SectionType::Discussion))
            .unwrap();
        assert!(db
            .find_debate_comment("alice", ReferenceType::Post, "p1")
            .unwrap()
            .is_none());

        let debate = db.create_comment(&comment("alice", SectionType::Debate)).unwrap();
        let found = db
            .find_debate_comment("alice", ReferenceType::Post, "p1")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, debate.id);
        assert!(db
            .find_debate_comment("bob", ReferenceType::Post, "p1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_counts_skip_deleted_comments() {
        let db = Database::open_in_memory().unwrap();
        db.create_comment(&comment("alice", SectionType::Discussion))
            .unwrap();
        db.create_comment(&comment("bob", SectionType::Debate)).unwrap();
        let gone = db.create_comment(&comment("carol", SectionType::Debate)).unwrap();
        assert!(db.soft_delete_comment(&gone.id).unwrap());

        assert_eq!(db.count_comments(ReferenceType::Post, "p1", None).unwrap(), 2);
        assert_eq!(
            db.count_comments(ReferenceType::Post, "p1", Some(SectionType::Debate))
                .unwrap(),
            1
        );
        assert_eq!(db.count_comments_on_post("p1").unwrap(), 2);
    }
}
