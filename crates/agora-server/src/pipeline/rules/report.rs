use agora_shared::ReferenceType;
use agora_store::NewUserReport;
use async_trait::async_trait;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{Committed, EntityKind, Mutation, MutationContext, MutationRule};
use crate::services::Services;

/// Checks the target exists and was not already reported by the same
/// user, then files the report against the aggregate opened by the commit
/// and recounts it.  The after-rule runs inline: the response carries the
/// count.
pub struct ReportRule {
    services: Services,
}

impl ReportRule {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

fn already_reported(reference_type: ReferenceType) -> ApiError {
    ApiError::conflict(format!("You have report this {reference_type}"))
}

#[async_trait]
impl MutationRule for ReportRule {
    async fn before(&self, cx: &mut MutationContext) -> ApiResult<()> {
        let Mutation::UserReport {
            reported_by,
            detail,
        } = &cx.args
        else {
            return Err(cx.mismatch(EntityKind::UserReport));
        };

        self.services
            .report
            .target_owner(detail.reference_type, &detail.reference_id)?;

        let filed = self.services.store.with(|db| {
            match db.find_report(detail.reference_type, &detail.reference_id)? {
                Some(report) => Ok(db.find_user_report(&report.id, reported_by)?.is_some()),
                None => Ok(false),
            }
        })?;
        if filed {
            return Err(already_reported(detail.reference_type));
        }
        Ok(())
    }

    fn after(&self, cx: &MutationContext, committed: Committed) -> ApiResult<Committed> {
        let report = match committed {
            Committed::Report(report) => report,
            other => return Ok(other),
        };
        let Mutation::UserReport {
            reported_by,
            detail,
        } = &cx.args
        else {
            return Err(cx.mismatch(EntityKind::UserReport));
        };

        let report = self
            .services
            .store
            .with(|db| {
                db.create_user_report(&NewUserReport {
                    report_id: report.id.clone(),
                    reported_by: reported_by.clone(),
                    reference_type: detail.reference_type,
                    description: detail.description.clone(),
                })?;
                let total = db.count_user_reports(&report.id)?;
                db.update_report_totals(&report.id, total, report.status)
            })
            .map_err(|e| match ApiError::from(e) {
                ApiError::Conflict(_) => already_reported(detail.reference_type),
                other => other,
            })?;

        info!(
            report = %report.id,
            reference = %report.reference_id,
            total = report.total_reported,
            "report filed"
        );
        Ok(Committed::Report(report))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ApiError;
    use crate::pipeline::{Committed, Mutation, ReportDetail};
    use crate::test_support::{seed_post, seed_user, Harness};
    use agora_shared::{ReferenceType, ReportStatus};

    fn report(reported_by: &str, post_id: &str) -> Mutation {
        Mutation::UserReport {
            reported_by: reported_by.into(),
            detail: ReportDetail {
                reference_type: ReferenceType::Post,
                reference_id: post_id.into(),
                description: "spam".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_total_tracks_distinct_reporters() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let post = seed_post(&h.state.store, &author.id);

        for (i, reporter) in ["alice", "bob", "carol"].into_iter().enumerate() {
            let Committed::Report(aggregate) = h.create(report(reporter, &post.id)).await.unwrap()
            else {
                panic!("expected a report");
            };
            assert_eq!(aggregate.total_reported, i as i64 + 1);
            assert_eq!(aggregate.status, ReportStatus::Pending);

            let rows = h
                .state
                .store
                .with(|db| db.count_user_reports(&aggregate.id))
                .unwrap();
            assert_eq!(aggregate.total_reported, rows);
        }
    }

    #[tokio::test]
    async fn test_second_report_by_same_user_is_rejected() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let post = seed_post(&h.state.store, &author.id);

        h.create(report("alice", &post.id)).await.unwrap();
        let err = h.create(report("alice", &post.id)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "You have report this post"));

        let total = h
            .state
            .store
            .with(|db| db.find_report(ReferenceType::Post, &post.id))
            .unwrap()
            .unwrap()
            .total_reported;
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_reporting_missing_target_writes_nothing() {
        let h = Harness::new();

        let err = h.create(report("alice", "missing")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { entity: "Post", .. }));
        assert!(h.state.store.with(|db| db.list_reports(None)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_before_commit() {
        let h = Harness::new();
        let author = seed_user(&h.state.store, "author");
        let post = seed_post(&h.state.store, &author.id);
        h.create(report("alice", &post.id)).await.unwrap();

        let before = h
            .state
            .store
            .with(|db| db.find_report(ReferenceType::Post, &post.id))
            .unwrap()
            .unwrap();
        let err = h.create(report("alice", &post.id)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let after = h
            .state
            .store
            .with(|db| db.find_report(ReferenceType::Post, &post.id))
            .unwrap()
            .unwrap();
        assert_eq!(before, after);
    }
}
