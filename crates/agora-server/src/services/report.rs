//! Moderation of reported content.
//!
//! A report marked `removed` soft-deletes its target; moving it to any other
//! status, or dropping the report, brings the target back.

use agora_shared::{ReferenceType, ReportStatus};
use agora_store::{Database, Report, Store};
use tracing::info;

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct ReportService {
    store: Store,
}

impl ReportService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The user who owns a reportable target.  A missing target surfaces
    /// as `NotFound`; transactions cannot be reported.
    pub fn target_owner(&self, reference_type: ReferenceType, reference_id: &str) -> ApiResult<String> {
        self.store
            .with(|db| target_owner(db, reference_type, reference_id))?
            .ok_or_else(|| ApiError::validation("Type not found"))
    }

    pub fn list(&self, status: Option<ReportStatus>) -> ApiResult<Vec<Report>> {
        Ok(self.store.with(|db| db.list_reports(status))?)
    }

    pub fn find(&self, id: &str) -> ApiResult<Report> {
        Ok(self.store.with(|db| db.get_report(id))?)
    }

    pub fn review(&self, id: &str, status: ReportStatus) -> ApiResult<Report> {
        let report = self.store.with(|db| {
            let previous = db.get_report(id)?.status;
            let report = db.update_report_status(id, status)?;
            if status == ReportStatus::Removed {
                set_removed(db, &report, true)?;
            } else if previous == ReportStatus::Removed {
                set_removed(db, &report, false)?;
            }
            Ok(report)
        })?;
        info!(report = %report.id, status = %report.status, "report reviewed");
        Ok(report)
    }

    /// Drop a report and every user report behind it, restoring the target
    /// if the report had removed it.  Returns the report as it was.
    pub fn restore(&self, id: &str) -> ApiResult<Report> {
        let report = self.store.with(|db| {
            let report = db.get_report(id)?;
            if report.status == ReportStatus::Removed {
                set_removed(db, &report, false)?;
            }
            db.delete_report(id)?;
            Ok(report)
        })?;
        info!(report = %report.id, reference = %report.reference_id, "report dropped");
        Ok(report)
    }
}

/// `None` for reference types that have no owner to report.
pub(crate) fn target_owner(
    db: &Database,
    reference_type: ReferenceType,
    reference_id: &str,
) -> agora_store::Result<Option<String>> {
    Ok(match reference_type {
        ReferenceType::Post => Some(db.get_post(reference_id)?.created_by),
        ReferenceType::Comment => Some(db.get_comment(reference_id)?.user_id),
        ReferenceType::User => Some(db.get_user(reference_id)?.id),
        ReferenceType::Transaction => None,
    })
}

fn set_removed(db: &Database, report: &Report, removed: bool) -> agora_store::Result<bool> {
    let id = report.reference_id.as_str();
    match (report.reference_type, removed) {
        (ReferenceType::Post, true) => db.soft_delete_post(id),
        (ReferenceType::Post, false) => db.restore_post(id),
        (ReferenceType::Comment, true) => db.soft_delete_comment(id),
        (ReferenceType::Comment, false) => db.restore_comment(id),
        (ReferenceType::User, true) => db.soft_delete_user(id),
        (ReferenceType::User, false) => db.restore_user(id),
        (ReferenceType::Transaction, _) => Ok(false),
    }
}
