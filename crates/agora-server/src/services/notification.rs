//! Notification fan-out.  Nobody is ever notified about their own action.

use agora_shared::{NotificationType, ReferenceType, ReportStatus};
use agora_store::{Comment, Database, Friend, NewNotification, Report, Store, Transaction};
use tracing::debug;

use crate::error::ApiResult;
use crate::services::report::target_owner;

#[derive(Clone)]
pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Tell the post owner about a new comment, and the parent comment's
    /// author about a reply.
    pub fn send_post_comment(&self, comment: &Comment) -> ApiResult<usize> {
        let sent = self.store.with(|db| {
            let post = db.get_post(&comment.post_id)?;
            let mut sent = 0;

            if notify(
                db,
                NotificationType::PostComment,
                &comment.user_id,
                &post.created_by,
                &comment.id,
                "commented on your post",
            )? {
                sent += 1;
            }

            if comment.reference_type == ReferenceType::Comment {
                if let Some(parent) = db.find_comment(&comment.reference_id)? {
                    if parent.user_id != post.created_by
                        && notify(
                            db,
                            NotificationType::CommentComment,
                            &comment.user_id,
                            &parent.user_id,
                            &comment.id,
                            "replied to your comment",
                        )?
                    {
                        sent += 1;
                    }
                }
            }
            Ok(sent)
        })?;
        debug!(comment = %comment.id, sent, "comment notifications sent");
        Ok(sent)
    }

    pub fn send_friend_request(&self, friend: &Friend) -> ApiResult<bool> {
        Ok(self.store.with(|db| {
            notify(
                db,
                NotificationType::FriendRequest,
                &friend.requestor_id,
                &friend.requestee_id,
                &friend.id,
                "sent you a friend request",
            )
        })?)
    }

    pub fn send_tips_success(&self, tx: &Transaction) -> ApiResult<bool> {
        Ok(self.store.with(|db| {
            notify(
                db,
                NotificationType::TipsSuccess,
                &tx.from,
                &tx.to,
                &tx.id,
                "sent you a tip",
            )
        })?)
    }

    /// Notify every mentioned user once.
    pub fn send_mention(&self, post_id: &str, author: &str, mentions: &[String]) -> ApiResult<usize> {
        Ok(self.store.with(|db| {
            let mut sent = 0;
            let mut seen: Vec<&str> = Vec::new();
            for mention in mentions {
                if seen.contains(&mention.as_str()) {
                    continue;
                }
                seen.push(mention);
                if notify(
                    db,
                    NotificationType::PostMention,
                    author,
                    mention,
                    post_id,
                    "mentioned you in a post",
                )? {
                    sent += 1;
                }
            }
            Ok(sent)
        })?)
    }

    /// Tell the owner of reported content that it was taken down.  Nothing
    /// is sent for other outcomes.
    pub fn send_report_response_to_user(&self, report: &Report) -> ApiResult<bool> {
        if report.status != ReportStatus::Removed {
            return Ok(false);
        }
        Ok(self.store.with(|db| {
            let Some(owner) = target_owner(db, report.reference_type, &report.reference_id)? else {
                return Ok(false);
            };
            let message = match report.reference_type {
                ReferenceType::User => "your account has been suspended".to_string(),
                other => format!("your {other} has been removed"),
            };
            db.create_notification(&NewNotification {
                notification_type: NotificationType::ReportUser,
                from: None,
                to: owner,
                reference_id: report.reference_id.clone(),
                message,
            })?;
            Ok(true)
        })?)
    }

    /// Tell everyone who filed a report how it was resolved.
    pub fn send_report_response_to_reporters(&self, report: &Report) -> ApiResult<usize> {
        if report.status == ReportStatus::Pending {
            return Ok(0);
        }
        let sent = self.store.with(|db| {
            let reporters = db.list_reporters(&report.id)?;
            for reporter in &reporters {
                db.create_notification(&NewNotification {
                    notification_type: NotificationType::ReportReporter,
                    from: None,
                    to: reporter.clone(),
                    reference_id: report.id.clone(),
                    message: format!(
                        "the {} you reported was {}",
                        report.reference_type, report.status
                    ),
                })?;
            }
            Ok(reporters.len())
        })?;
        debug!(report = %report.id, sent, "report responses sent");
        Ok(sent)
    }
}

/// Returns `false` when the recipient is the actor.
fn notify(
    db: &Database,
    notification_type: NotificationType,
    from: &str,
    to: &str,
    reference_id: &str,
    message: &str,
) -> agora_store::Result<bool> {
    if from == to {
        return Ok(false);
    }
    db.create_notification(&NewNotification {
        notification_type,
        from: Some(from.to_string()),
        to: to.to_string(),
        reference_id: reference_id.to_string(),
        message: message.to_string(),
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_comment, seed_post, seed_user};
    use agora_shared::SectionType;

    #[test]
    fn test_comment_and_reply_notifications() {
        let store = Store::open_in_memory().unwrap();
        let author = seed_user(&store, "author");
        let alice = seed_user(&store, "alice");
        let bob = seed_user(&store, "bob");
        let post = seed_post(&store, &author.id);
        let service = NotificationService::new(store.clone());

        let top = seed_comment(&store, &alice.id, &post.id, ReferenceType::Post, &post.id, SectionType::Discussion);
        assert_eq!(service.send_post_comment(&top).unwrap(), 1);

        let reply = seed_comment(&store, &bob.id, &post.id, ReferenceType::Comment, &top.id, SectionType::Discussion);
        assert_eq!(service.send_post_comment(&reply).unwrap(), 2);

        let own = seed_comment(&store, &author.id, &post.id, ReferenceType::Post, &post.id, SectionType::Discussion);
        assert_eq!(service.send_post_comment(&own).unwrap(), 0);

        let inbox = store.with(|db| db.list_notifications_for(&alice.id)).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::CommentComment);
    }

    #[test]
    fn test_report_responses() {
        let store = Store::open_in_memory().unwrap();
        let author = seed_user(&store, "author");
        let post = seed_post(&store, &author.id);
        let report = store
            .with(|db| {
                let report = db.open_report(ReferenceType::Post, &post.id)?;
                for reporter in ["alice", "bob"] {
                    db.create_user_report(&agora_store::NewUserReport {
                        report_id: report.id.clone(),
                        reported_by: reporter.to_string(),
                        reference_type: ReferenceType::Post,
                        description: "spam".to_string(),
                    })?;
                }
                Ok(report)
            })
            .unwrap();
        let service = NotificationService::new(store.clone());

        assert!(!service.send_report_response_to_user(&report).unwrap());
        assert_eq!(service.send_report_response_to_reporters(&report).unwrap(), 0);

        let removed = Report {
            status: ReportStatus::Removed,
            ..report
        };
        assert!(service.send_report_response_to_user(&removed).unwrap());
        assert_eq!(service.send_report_response_to_reporters(&removed).unwrap(), 2);

        let inbox = store.with(|db| db.list_notifications_for(&author.id)).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::ReportUser);
        assert_eq!(inbox[0].message, "your post has been removed");
        assert_eq!(inbox[0].from, None);

        let inbox = store.with(|db| db.list_notifications_for("bob")).unwrap();
        assert_eq!(inbox[0].message, "the post you reported was removed");
    }

    #[test]
    fn test_mentions_skip_author_and_duplicates() {
        let store = Store::open_in_memory().unwrap();
        let service = NotificationService::new(store.clone());
        let mentions = vec!["bob".to_string(), "alice".to_string(), "bob".to_string()];
        assert_eq!(service.send_mention("p1", "alice", &mentions).unwrap(), 1);
    }
}
