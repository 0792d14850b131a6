//! CRUD operations for [`Tag`] records.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::ts;
use crate::database::Database;
use crate::error::Result;
use crate::models::Tag;

impl Database {
    pub fn create_tag(&self, id: &str) -> Result<Tag> {
        let now = Utc::now();
        let tag = Tag {
            id: id.to_string(),
            count: 1,
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            "INSERT INTO tags (id, count, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                tag.id,
                tag.count,
                tag.created_at.to_rfc3339(),
                tag.updated_at.to_rfc3339()
            ],
        )?;
        Ok(tag)
    }

    /// Case-insensitive lookup.
    pub fn find_tag_any_case(&self, id: &str) -> Result<Option<Tag>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, count, created_at, updated_at FROM tags WHERE lower(id) = lower(?1)",
                params![id],
                row_to_tag,
            )
            .optional()?)
    }

    /// Bump the usage counter of an existing tag, returning `false` when the
    /// tag does not exist.
    pub fn increment_tag(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE tags SET count = count + 1, updated_at = ?1 WHERE lower(id) = lower(?2)",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    let created_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;

    Ok(Tag {
        id: row.get(0)?,
        count: row.get(1)?,
        created_at: ts(2, &created_at)?,
        updated_at: ts(3, &updated_at)?,
    })
}
