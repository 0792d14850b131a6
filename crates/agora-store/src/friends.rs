//! CRUD operations for [`Friend`] relationships.
//!
//! A relationship is stored once per pair; lookups match either direction.

use agora_shared::FriendStatus;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{enum_col, new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{Friend, NewFriend};

const FRIEND_COLUMNS: &str =
    "id, requestor_id, requestee_id, status, created_at, updated_at";

impl Database {
    pub fn create_friend(&self, new: &NewFriend) -> Result<Friend> {
        let now = Utc::now();
        let friend = Friend {
            id: new_id(),
            requestor_id: new.requestor_id.clone(),
            requestee_id: new.requestee_id.clone(),
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            "INSERT INTO friends (id, requestor_id, requestee_id, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                friend.id,
                friend.requestor_id,
                friend.requestee_id,
                friend.status.as_str(),
                friend.created_at.to_rfc3339(),
                friend.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(friend)
    }

    /// Rewrite an existing relationship and return the stored row.
    pub fn update_friend(
        &self,
        id: &str,
        status: FriendStatus,
        requestor_id: &str,
        requestee_id: &str,
    ) -> Result<Friend> {
        self.conn().execute(
            "UPDATE friends SET status = ?1, requestor_id = ?2, requestee_id = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                status.as_str(),
                requestor_id,
                requestee_id,
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        self.get_friend(id)
    }

    pub fn get_friend(&self, id: &str) -> Result<Friend> {
        self.conn()
            .query_row(
                &format!("SELECT {FRIEND_COLUMNS} FROM friends WHERE id = ?1"),
                params![id],
                row_to_friend,
            )
            .map_err(or_not_found("Friend", id))
    }

    /// The relationship between two users, whichever of them requested it.
    pub fn find_friend_between(&self, a: &str, b: &str) -> Result<Option<Friend>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {FRIEND_COLUMNS} FROM friends
                     WHERE (requestor_id = ?1 AND requestee_id = ?2)
                        OR (requestor_id = ?2 AND requestee_id = ?1)
                     ORDER BY updated_at DESC
                     LIMIT 1"
                ),
                params![a, b],
                row_to_friend,
            )
            .optional()?)
    }

    /// Ids of the users on the other side of every relationship of `user_id`
    /// with the given status.
    pub fn list_friend_ids(&self, user_id: &str, status: FriendStatus) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT CASE WHEN requestor_id = ?1 THEN requestee_id ELSE requestor_id END
             FROM friends
             WHERE (requestor_id = ?1 OR requestee_id = ?1) AND status = ?2
             ORDER BY updated_at ASC",
        )?;

        let rows = stmt.query_map(params![user_id, status.as_str()], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    pub fn count_friends(&self, user_id: &str, status: FriendStatus) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM friends
             WHERE (requestor_id = ?1 OR requestee_id = ?1) AND status = ?2",
            params![user_id, status.as_str()],
            |row| row.get(0),
        )?)
    }
}

fn row_to_friend(row: &rusqlite::Row<'_>) -> rusqlite::Result<Friend> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(Friend {
        id: row.get(0)?,
        requestor_id: row.get(1)?,
        requestee_id: row.get(2)?,
        status: enum_col(3, &status)?,
        created_at: ts(4, &created_at)?,
        updated_at: ts(5, &updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(from: &str, to: &str, status: FriendStatus) -> NewFriend {
        NewFriend {
            requestor_id: from.to_string(),
            requestee_id: to.to_string(),
            status,
        }
    }

    #[test]
    fn test_lookup_matches_either_direction() {
        let db = Database::open_in_memory().unwrap();
        let friend = db
            .create_friend(&request("alice", "bob", FriendStatus::Pending))
            .unwrap();

        assert_eq!(db.find_friend_between("alice", "bob").unwrap().unwrap().id, friend.id);
        assert_eq!(db.find_friend_between("bob", "alice").unwrap().unwrap().id, friend.id);
        assert!(db.find_friend_between("alice", "carol").unwrap().is_none());
    }

    #[test]
    fn test_update_and_list() {
        let db = Database::open_in_memory().unwrap();
        let friend = db
            .create_friend(&request("alice", "bob", FriendStatus::Pending))
            .unwrap();
        db.create_friend(&request("carol", "alice", FriendStatus::Approved))
            .unwrap();

        let updated = db
            .update_friend(&friend.id, FriendStatus::Approved, "alice", "bob")
            .unwrap();
        assert_eq!(updated.status, FriendStatus::Approved);

        let ids = db.list_friend_ids("alice", FriendStatus::Approved).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"bob".to_string()));
        assert!(ids.contains(&"carol".to_string()));
        assert_eq!(db.count_friends("bob", FriendStatus::Approved).unwrap(), 1);
    }
}
