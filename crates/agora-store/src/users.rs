//! CRUD operations for [`User`] records.

use agora_shared::generate_nonce;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{json_col, new_id, opt_ts, or_not_found, to_json, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{NewUser, User, UserMetric};

const USER_COLUMNS: &str = "id, name, username, profile_picture_url, bio, nonce, metric,
     created_at, updated_at, deleted_at";

impl Database {
    /// Insert a new user with a fresh nonce and empty metrics.
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: new.id.clone().unwrap_or_else(new_id),
            name: new.name.clone(),
            username: new.username.clone(),
            profile_picture_url: new.profile_picture_url.clone(),
            bio: new.bio.clone(),
            nonce: generate_nonce(),
            metric: UserMetric::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.conn().execute(
            "INSERT INTO users (id, name, username, profile_picture_url, bio, nonce, metric,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.id,
                user.name,
                user.username,
                user.profile_picture_url,
                user.bio,
                user.nonce,
                to_json(&user.metric)?,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(user)
    }

    /// Fetch a user by id, failing with `NotFound` when absent.
    pub fn get_user(&self, id: &str) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map_err(or_not_found("User", id))
    }

    pub fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()?)
    }

    pub fn update_user_nonce(&self, id: &str, nonce: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET nonce = ?1, updated_at = ?2 WHERE id = ?3",
            params![nonce, Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    pub fn update_user_metric(&self, id: &str, metric: &UserMetric) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET metric = ?1 WHERE id = ?2",
            params![to_json(metric)?, id],
        )?;
        Ok(())
    }

    /// Mark a user as banned.  Returns `true` if a live user was marked.
    pub fn soft_delete_user(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(affected > 0)
    }

    /// Clear a soft delete.  Returns `true` if a removed user came back.
    pub fn restore_user(&self, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL",
            params![id],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let metric: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        profile_picture_url: row.get(3)?,
        bio: row.get(4)?,
        nonce: row.get(5)?,
        metric: json_col(6, &metric)?,
        created_at: ts(7, &created_at)?,
        updated_at: ts(8, &updated_at)?,
        deleted_at: opt_ts(9, row.get(9)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            id: None,
            name: name.to_string(),
            username: name.to_lowercase(),
            profile_picture_url: None,
            bio: None,
        }
    }

    #[test]
    fn test_soft_delete_keeps_row() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("Alice")).unwrap();

        assert!(db.soft_delete_user(&user.id).unwrap());
        assert!(!db.soft_delete_user(&user.id).unwrap());

        let stored = db.get_user(&user.id).unwrap();
        assert_eq!(stored.name, "Alice");
        assert!(stored.deleted_at.is_some());
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.get_user("nobody").unwrap_err();
        assert!(matches!(err, crate::StoreError::NotFound { entity: "User", .. }));
    }
}
