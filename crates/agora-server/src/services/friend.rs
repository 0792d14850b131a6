//! Friend request resolution.
//!
//! A relationship is one row per pair.  Creating a request may therefore
//! turn into an update of the existing row: answering a reverse pending
//! request approves it, and blocking rewrites whatever relationship exists.

use agora_shared::FriendStatus;
use agora_store::{NewFriend, Store};

use crate::error::{ApiError, ApiResult};

/// What committing a friend request should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendPlan {
    Insert,
    Update {
        id: String,
        status: FriendStatus,
        requestor_id: String,
        requestee_id: String,
    },
}

#[derive(Clone)]
pub struct FriendService {
    store: Store,
}

impl FriendService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn resolve_request(&self, request: &NewFriend) -> ApiResult<FriendPlan> {
        if request.requestor_id == request.requestee_id {
            return Err(ApiError::validation("You cannot add yourself as a friend"));
        }

        let existing = self
            .store
            .with(|db| db.find_friend_between(&request.requestor_id, &request.requestee_id))?;
        let Some(existing) = existing else {
            return match request.status {
                FriendStatus::Pending | FriendStatus::Blocked => Ok(FriendPlan::Insert),
                FriendStatus::Approved => Err(ApiError::validation(
                    "Friend request must be pending or blocked",
                )),
            };
        };

        match (request.status, existing.status) {
            (_, FriendStatus::Blocked) => Err(ApiError::validation("This user has been blocked")),

            (FriendStatus::Blocked, _) => Ok(FriendPlan::Update {
                id: existing.id,
                status: FriendStatus::Blocked,
                requestor_id: request.requestor_id.clone(),
                requestee_id: request.requestee_id.clone(),
            }),

            (FriendStatus::Pending, FriendStatus::Approved) => {
                Err(ApiError::conflict("You already friends"))
            }

            (FriendStatus::Pending, FriendStatus::Pending) => {
                if existing.requestor_id == request.requestor_id {
                    Err(ApiError::conflict(
                        "Please wait for this user to approve your request",
                    ))
                } else {
                    Ok(FriendPlan::Update {
                        id: existing.id,
                        status: FriendStatus::Approved,
                        requestor_id: existing.requestor_id,
                        requestee_id: existing.requestee_id,
                    })
                }
            }

            (FriendStatus::Approved, _) => Err(ApiError::validation(
                "Friend request must be pending or blocked",
            )),
        }
    }

    /// Approved friends of a user; their imports are listed first on a
    /// re-shared post.
    pub fn importer_ids(&self, user_id: &str) -> ApiResult<Vec<String>> {
        Ok(self
            .store
            .with(|db| db.list_friend_ids(user_id, FriendStatus::Approved))?)
    }

    /// Whether either user has blocked the other.
    pub fn is_blocked(&self, a: &str, b: &str) -> ApiResult<bool> {
        let friend = self.store.with(|db| db.find_friend_between(a, b))?;
        Ok(friend.is_some_and(|f| f.status == FriendStatus::Blocked))
    }
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

    fn service_with(rows: &[NewFriend]) -> FriendService {
        let store = Store::open_in_memory().unwrap();
        for row in rows {
            store.with(|db| db.create_friend(row)).unwrap();
        }
        FriendService::new(store)
    }

    #[test]
    fn test_fresh_request_inserts() {
        let service = service_with(&[]);
        let plan = service
            .resolve_request(&request("alice", "bob", FriendStatus::Pending))
            .unwrap();
        assert_eq!(plan, FriendPlan::Insert);
    }

    #[test]
    fn test_self_request_rejected() {
        let service = service_with(&[]);
        let err = service
            .resolve_request(&request("alice", "alice", FriendStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_reverse_pending_request_approves() {
        let service = service_with(&[request("alice", "bob", FriendStatus::Pending)]);
        let plan = service
            .resolve_request(&request("bob", "alice", FriendStatus::Pending))
            .unwrap();
        match plan {
            FriendPlan::Update {
                status,
                requestor_id,
                ..
            } => {
                assert_eq!(status, FriendStatus::Approved);
                assert_eq!(requestor_id, "alice");
            }
            FriendPlan::Insert => panic!("expected an update"),
        }
    }

    #[test]
    fn test_repeat_and_existing_friendship_conflict() {
        let service = service_with(&[
            request("alice", "bob", FriendStatus::Pending),
            request("alice", "carol", FriendStatus::Approved),
        ]);

        let err = service
            .resolve_request(&request("alice", "bob", FriendStatus::Pending))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please wait for this user to approve your request");

        let err = service
            .resolve_request(&request("carol", "alice", FriendStatus::Pending))
            .unwrap_err();
        assert_eq!(err.to_string(), "You already friends");
    }

    #[test]
    fn test_block_rewrites_existing_relationship() {
        let service = service_with(&[request("alice", "bob", FriendStatus::Approved)]);
        let plan = service
            .resolve_request(&request("bob", "alice", FriendStatus::Blocked))
            .unwrap();
        assert!(matches!(
            plan,
            FriendPlan::Update {
                status: FriendStatus::Blocked,
                ..
            }
        ));

        let blocked = service_with(&[request("bob", "alice", FriendStatus::Blocked)]);
        assert!(blocked.is_blocked("alice", "bob").unwrap());
        assert!(blocked
            .resolve_request(&request("alice", "bob", FriendStatus::Pending))
            .is_err());
    }
}
