//! The primary write of each mutation.

use agora_store::Store;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::context::{Committed, Mutation, MutationContext};
use crate::services::FriendPlan;

/// Write the mutation described by `cx`.  Runs between the before- and
/// after-rule of its entity.
pub fn apply(store: &Store, cx: &MutationContext) -> ApiResult<Committed> {
    let committed = store.with(|db| {
        Ok(match &cx.args {
            Mutation::Transaction(new) => Some(Committed::Transaction(db.create_transaction(new)?)),
            Mutation::Comment(new) => Some(Committed::Comment(db.create_comment(new)?)),
            Mutation::Friend { request, plan } => {
                let friend = match plan {
                    None | Some(FriendPlan::Insert) => db.create_friend(request)?,
                    Some(FriendPlan::Update {
                        id,
                        status,
                        requestor_id,
                        requestee_id,
                    }) => db.update_friend(id, *status, requestor_id, requestee_id)?,
                };
                Some(Committed::Friend(friend))
            }
            Mutation::Vote(new) => Some(Committed::VoteUpsert(db.upsert_vote(new)?)),
            Mutation::Tag(new) => Some(Committed::Tag(db.create_tag(&new.id)?)),
            Mutation::ExperiencePost {
                experience_id,
                post_id,
                ..
            } => Some(Committed::ExperiencePost(
                db.create_experience_post(experience_id, post_id)?,
            )),
            Mutation::UserWallet { wallet, .. } => match wallet {
                Some(wallet) => {
                    db.create_wallet(wallet)?;
                    Some(Committed::Wallet(wallet.clone()))
                }
                None => None,
            },
            Mutation::NetworkCurrency { verified, .. } => match verified {
                Some(currency) => Some(Committed::Currency(db.create_currency(currency)?)),
                None => None,
            },
            Mutation::UserReport { detail, .. } => Some(Committed::Report(
                db.open_report(detail.reference_type, &detail.reference_id)?,
            )),
            Mutation::UserSocialMedia(new) => {
                Some(Committed::UserSocialMedia(db.create_user_social_media(new)?))
            }
            Mutation::Post(new) => Some(Committed::Post(db.create_post(new)?)),
            Mutation::User(new) => Some(Committed::User(db.create_user(new)?)),
        })
    })?;

    committed.ok_or_else(|| {
        ApiError::Internal(format!("{} arguments were not prepared for commit", cx.kind()))
    })
}
