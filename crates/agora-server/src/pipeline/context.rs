//! The mutable context a mutation carries through the pipeline.

use std::fmt;

use agora_shared::{Credential, ReferenceType};
use agora_store::{
    Comment, Currency, ExperienceIndex, ExperiencePost, Friend, NewComment, NewCurrency,
    NewFriend, NewPost, NewTag, NewTransaction, NewUser, NewUserSocialMedia, NewVote, Post,
    Report, Tag, Transaction, User, UserSocialMedia, Vote, VoteUpsert, Wallet,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::services::{FriendPlan, RawCurrency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Transaction,
    Comment,
    Friend,
    Vote,
    Tag,
    ExperiencePost,
    UserWallet,
    NetworkCurrency,
    UserReport,
    UserSocialMedia,
    Post,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    /// A create that a rule turned into an update of an existing record.
    Update,
}

/// What a client asked to report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    pub reference_type: ReferenceType,
    pub reference_id: String,
    #[serde(default)]
    pub description: String,
}

/// Typed arguments of a mutation.  Fields wrapped in `Option` are filled
/// by the entity's before-rule and consumed by the commit.
#[derive(Debug, Clone)]
pub enum Mutation {
    Transaction(NewTransaction),
    Comment(NewComment),
    Friend {
        request: NewFriend,
        plan: Option<FriendPlan>,
    },
    Vote(NewVote),
    Tag(NewTag),
    ExperiencePost {
        experience_id: String,
        post_id: String,
        experience_index: Option<ExperienceIndex>,
    },
    UserWallet {
        user_id: String,
        credential: Credential,
        wallet: Option<Wallet>,
    },
    NetworkCurrency {
        network_id: String,
        raw: RawCurrency,
        verified: Option<NewCurrency>,
    },
    UserReport {
        reported_by: String,
        detail: ReportDetail,
    },
    UserSocialMedia(NewUserSocialMedia),
    Post(NewPost),
    User(NewUser),
}

impl Mutation {
    pub fn kind(&self) -> EntityKind {
        match self {
            Mutation::Transaction(_) => EntityKind::Transaction,
            Mutation::Comment(_) => EntityKind::Comment,
            Mutation::Friend { .. } => EntityKind::Friend,
            Mutation::Vote(_) => EntityKind::Vote,
            Mutation::Tag(_) => EntityKind::Tag,
            Mutation::ExperiencePost { .. } => EntityKind::ExperiencePost,
            Mutation::UserWallet { .. } => EntityKind::UserWallet,
            Mutation::NetworkCurrency { .. } => EntityKind::NetworkCurrency,
            Mutation::UserReport { .. } => EntityKind::UserReport,
            Mutation::UserSocialMedia(_) => EntityKind::UserSocialMedia,
            Mutation::Post(_) => EntityKind::Post,
            Mutation::User(_) => EntityKind::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MutationContext {
    pub operation: OperationKind,
    pub args: Mutation,
}

impl MutationContext {
    pub fn create(args: Mutation) -> Self {
        Self {
            operation: OperationKind::Create,
            args,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.args.kind()
    }

    /// Error for a rule handed arguments of another entity.
    pub(crate) fn mismatch(&self, expected: EntityKind) -> ApiError {
        ApiError::Internal(format!("{expected} rule received {} arguments", self.kind()))
    }
}

/// The committed record, as returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Committed {
    Transaction(Transaction),
    Comment(Comment),
    Friend(Friend),
    VoteUpsert(VoteUpsert),
    Vote(Vote),
    Tag(Tag),
    ExperiencePost(ExperiencePost),
    Wallet(Wallet),
    Currency(Currency),
    Report(Report),
    UserSocialMedia(UserSocialMedia),
    Post(Post),
    User(User),
}
