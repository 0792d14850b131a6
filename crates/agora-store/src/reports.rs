//! CRUD operations for [`Report`] aggregates and the [`UserReport`] rows
//! behind them.

use agora_shared::{ReferenceType, ReportStatus};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{enum_col, new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUserReport, Report, UserReport};

const REPORT_COLUMNS: &str =
    "id, reference_type, reference_id, status, total_reported, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Return the report for a target, opening a pending one on first use.
    pub fn open_report(&self, reference_type: ReferenceType, reference_id: &str) -> Result<Report> {
        if let Some(report) = self.find_report(reference_type, reference_id)? {
            return Ok(report);
        }

        let now = Utc::now();
        let report = Report {
            id: new_id(),
            reference_type,
            reference_id: reference_id.to_string(),
            status: ReportStatus::Pending,
            total_reported: 0,
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            "INSERT INTO reports (id, reference_type, reference_id, status, total_reported,
                                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.id,
                report.reference_type.as_str(),
                report.reference_id,
                report.status.as_str(),
                report.total_reported,
                report.created_at.to_rfc3339(),
                report.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(report)
    }

    pub fn find_report(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<Option<Report>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {REPORT_COLUMNS} FROM reports
                     WHERE reference_type = ?1 AND reference_id = ?2"
                ),
                params![reference_type.as_str(), reference_id],
                row_to_report,
            )
            .optional()?)
    }

    pub fn get_report(&self, id: &str) -> Result<Report> {
        self.conn()
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
                params![id],
                row_to_report,
            )
            .map_err(or_not_found("Report", id))
    }

    /// Reports, most recently updated first.  `status` narrows the list.
    pub fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY updated_at DESC"
        ))?;

        let rows = stmt.query_map(params![status.map(|s| s.as_str())], row_to_report)?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }

    pub fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<Report> {
        let affected = self.conn().execute(
            "UPDATE reports SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("Report", id));
        }
        self.get_report(id)
    }

    /// Drop a report together with every user report filed against it.
    pub fn delete_report(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM reports WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn update_report_totals(
        &self,
        id: &str,
        total_reported: i64,
        status: ReportStatus,
    ) -> Result<Report> {
        self.conn().execute(
            "UPDATE reports SET total_reported = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
            params![total_reported, status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        self.get_report(id)
    }

    // ------------------------------------------------------------------
    // Individual user reports
    // ------------------------------------------------------------------

    pub fn find_user_report(&self, report_id: &str, reported_by: &str) -> Result<Option<UserReport>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, report_id, reported_by, reference_type, description, created_at
                 FROM user_reports WHERE report_id = ?1 AND reported_by = ?2",
                params![report_id, reported_by],
                row_to_user_report,
            )
            .optional()?)
    }

    pub fn create_user_report(&self, new: &NewUserReport) -> Result<UserReport> {
        let report = UserReport {
            id: new_id(),
            report_id: new.report_id.clone(),
            reported_by: new.reported_by.clone(),
            reference_type: new.reference_type,
            description: new.description.clone(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO user_reports (id, report_id, reported_by, reference_type, description,
                                       created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.id,
                report.report_id,
                report.reported_by,
                report.reference_type.as_str(),
                report.description,
                report.created_at.to_rfc3339(),
            ],
        )?;
        Ok(report)
    }

    /// Ids of the users who filed a report, oldest first.
    pub fn list_reporters(&self, report_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT reported_by FROM user_reports WHERE report_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![report_id], |row| row.get(0))?;

        let mut reporters = Vec::new();
        for row in rows {
            reporters.push(row?);
        }
        Ok(reporters)
    }

    pub fn count_user_reports(&self, report_id: &str) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM user_reports WHERE report_id = ?1",
            params![report_id],
            |row| row.get(0),
        )?)
    }
}

fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let reference_type: String = row.get(1)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(Report {
        id: row.get(0)?,
        reference_type: enum_col(1, &reference_type)?,
        reference_id: row.get(2)?,
        status: enum_col(3, &status)?,
        total_reported: row.get(4)?,
        created_at: ts(5, &created_at)?,
        updated_at: ts(6, &updated_at)?,
    })
}

fn row_to_user_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserReport> {
    let reference_type: String = row.get(3)?;
    let created_at: String = row.get(5)?;

    Ok(UserReport {
        id: row.get(0)?,
        report_id: row.get(1)?,
        reported_by: row.get(2)?,
        reference_type: enum_col(3, &reference_type)?,
        description: row.get(4)?,
        created_at: ts(5, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_report(report_id: &str, by: &str) -> NewUserReport {
        NewUserReport {
            report_id: report_id.to_string(),
            reported_by: by.to_string(),
            reference_type: ReferenceType::Post,
            description: "spam".to_string(),
        }
    }

    #[test]
    fn test_open_report_is_find_or_create() {
        let db = Database::open_in_memory().unwrap();
        let first = db.open_report(ReferenceType::Post, "p1").unwrap();
        let again = db.open_report(ReferenceType::Post, "p1").unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.status, ReportStatus::Pending);

        let other = db.open_report(ReferenceType::Comment, "p1").unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_user_reports_are_counted_once_per_reporter() {
        let db = Database::open_in_memory().unwrap();
        let report = db.open_report(ReferenceType::Post, "p1").unwrap();

        db.create_user_report(&user_report(&report.id, "alice")).unwrap();
        db.create_user_report(&user_report(&report.id, "bob")).unwrap();
        let err = db
            .create_user_report(&user_report(&report.id, "alice"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert!(db.find_user_report(&report.id, "alice").unwrap().is_some());
        assert!(db.find_user_report(&report.id, "carol").unwrap().is_none());

        let total = db.count_user_reports(&report.id).unwrap();
        let updated = db
            .update_report_totals(&report.id, total, ReportStatus::Pending)
            .unwrap();
        assert_eq!(updated.total_reported, 2);
    }

    #[test]
    fn test_review_and_delete_report() {
        let db = Database::open_in_memory().unwrap();
        let report = db.open_report(ReferenceType::Post, "p1").unwrap();
        db.open_report(ReferenceType::User, "u1").unwrap();
        db.create_user_report(&user_report(&report.id, "alice")).unwrap();
        db.create_user_report(&user_report(&report.id, "bob")).unwrap();
        assert_eq!(db.list_reporters(&report.id).unwrap(), vec!["alice", "bob"]);

        let reviewed = db
            .update_report_status(&report.id, ReportStatus::Removed)
            .unwrap();
        assert_eq!(reviewed.status, ReportStatus::Removed);
        assert_eq!(db.list_reports(None).unwrap().len(), 2);
        let removed = db.list_reports(Some(ReportStatus::Removed)).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, report.id);

        assert!(db.delete_report(&report.id).unwrap());
        assert!(!db.delete_report(&report.id).unwrap());
        assert_eq!(db.count_user_reports(&report.id).unwrap(), 0);

        let err = db
            .update_report_status(&report.id, ReportStatus::Ignored)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Report", .. }));
    }
}
