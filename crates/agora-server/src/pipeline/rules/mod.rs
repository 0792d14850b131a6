//! One rule per entity kind.

mod comment;
mod currency;
mod experience;
mod friend;
mod post;
mod report;
mod social;
mod tag;
mod transaction;
mod vote;
mod wallet;

pub use comment::CommentRule;
pub use currency::CurrencyRule;
pub use experience::ExperiencePostRule;
pub use friend::FriendRule;
pub use post::PostRule;
pub use report::ReportRule;
pub use social::SocialMediaRule;
pub use tag::TagRule;
pub use transaction::TransactionRule;
pub use vote::{resolve_vote_target, VoteRule};
pub use wallet::WalletRule;
