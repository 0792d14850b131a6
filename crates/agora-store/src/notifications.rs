//! CRUD operations for [`Notification`] records.

use chrono::Utc;
use rusqlite::params;

use crate::codec::{enum_col, new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, type, from_user, to_user, reference_id, message, read, created_at";

impl Database {
    pub fn create_notification(&self, new: &NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: new_id(),
            notification_type: new.notification_type,
            from: new.from.clone(),
            to: new.to.clone(),
            reference_id: new.reference_id.clone(),
            message: new.message.clone(),
            read: false,
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO notifications (id, type, from_user, to_user, reference_id, message,
                                        read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                notification.id,
                notification.notification_type.as_str(),
                notification.from,
                notification.to,
                notification.reference_id,
                notification.message,
                notification.read,
                notification.created_at.to_rfc3339(),
            ],
        )?;
        Ok(notification)
    }

    pub fn get_notification(&self, id: &str) -> Result<Notification> {
        self.conn()
            .query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
                params![id],
                row_to_notification,
            )
            .map_err(or_not_found("Notification", id))
    }

    /// Notifications addressed to a user, newest first.
    pub fn list_notifications_for(&self, user_id: &str) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE to_user = ?1
             ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_notification)?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    /// Count a user's notifications, optionally only read or unread ones.
    pub fn count_notifications(&self, user_id: &str, read: Option<bool>) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE to_user = ?1 AND (?2 IS NULL OR read = ?2)",
            params![user_id, read],
            |row| row.get(0),
        )?)
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1",
            params![id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("Notification", id));
        }
        Ok(())
    }

    /// Mark several notifications read.  Unknown ids are skipped; returns
    /// how many rows matched.
    pub fn mark_notifications_read(&self, ids: &[String]) -> Result<usize> {
        let mut stmt = self
            .conn()
            .prepare("UPDATE notifications SET read = 1 WHERE id = ?1")?;
        let mut matched = 0;
        for id in ids {
            matched += stmt.execute(params![id])?;
        }
        Ok(matched)
    }

    pub fn delete_notification(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let notification_type: String = row.get(1)?;
    let created_at: String = row.get(7)?;

    Ok(Notification {
        id: row.get(0)?,
        notification_type: enum_col(1, &notification_type)?,
        from: row.get(2)?,
        to: row.get(3)?,
        reference_id: row.get(4)?,
        message: row.get(5)?,
        read: row.get(6)?,
        created_at: ts(7, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_shared::NotificationType;

    fn new_notification(to: &str) -> NewNotification {
        NewNotification {
            notification_type: NotificationType::PostComment,
            from: Some("alice".to_string()),
            to: to.to_string(),
            reference_id: "c1".to_string(),
            message: "commented on your post".to_string(),
        }
    }

    #[test]
    fn test_read_count_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let first = db.create_notification(&new_notification("bob")).unwrap();
        let second = db.create_notification(&new_notification("bob")).unwrap();
        let third = db.create_notification(&new_notification("bob")).unwrap();
        db.create_notification(&new_notification("carol")).unwrap();

        assert_eq!(db.count_notifications("bob", None).unwrap(), 3);
        assert_eq!(db.count_notifications("bob", Some(false)).unwrap(), 3);

        db.mark_notification_read(&first.id).unwrap();
        assert!(db.get_notification(&first.id).unwrap().read);

        let ids = vec![second.id.clone(), "missing".to_string()];
        assert_eq!(db.mark_notifications_read(&ids).unwrap(), 1);
        assert_eq!(db.count_notifications("bob", Some(true)).unwrap(), 2);
        assert_eq!(db.count_notifications("bob", Some(false)).unwrap(), 1);

        assert!(db.delete_notification(&third.id).unwrap());
        assert!(!db.delete_notification(&third.id).unwrap());
        assert_eq!(db.list_notifications_for("bob").unwrap().len(), 2);

        let err = db.mark_notification_read("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Notification", .. }));
    }
}
