//! Append-only activity log.

use agora_shared::{ActivityLogType, ReferenceType};
use chrono::Utc;
use rusqlite::params;

use crate::codec::{enum_col, new_id, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::ActivityLog;

impl Database {
    pub fn create_activity_log(
        &self,
        log_type: ActivityLogType,
        user_id: &str,
        reference_type: ReferenceType,
        reference_id: Option<&str>,
    ) -> Result<ActivityLog> {
        let log = ActivityLog {
            id: new_id(),
            log_type,
            user_id: user_id.to_string(),
            reference_type,
            reference_id: reference_id.map(str::to_string),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO activity_logs (id, type, user_id, reference_type, reference_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.id,
                log.log_type.as_str(),
                log.user_id,
                log.reference_type.as_str(),
                log.reference_id,
                log.created_at.to_rfc3339(),
            ],
        )?;
        Ok(log)
    }

    /// A user's activity, newest first.
    pub fn list_activity_logs(&self, user_id: &str) -> Result<Vec<ActivityLog>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, type, user_id, reference_type, reference_id, created_at
             FROM activity_logs
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            let log_type: String = row.get(1)?;
            let reference_type: String = row.get(3)?;
            let created_at: String = row.get(5)?;
            Ok(ActivityLog {
                id: row.get(0)?,
                log_type: enum_col(1, &log_type)?,
                user_id: row.get(2)?,
                reference_type: enum_col(3, &reference_type)?,
                reference_id: row.get(4)?,
                created_at: ts(5, &created_at)?,
            })
        })?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }
}
