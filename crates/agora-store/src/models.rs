//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.  `New*` structs are insert payloads; the store
//! assigns ids and timestamps.

use std::collections::BTreeMap;

use agora_shared::{
    ActivityLogType, FriendStatus, NotificationType, PlatformType, PostStatus, ReferenceType,
    ReportStatus, SectionType, WalletType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Aggregate counters recomputed from source rows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMetric {
    pub total_posts: i64,
    pub total_kudos: i64,
    pub total_friends: i64,
    pub total_experiences: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub bio: Option<String>,
    /// One-time value a wallet must sign to be linked to this user.
    pub nonce: String,
    pub metric: UserMetric,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the user is banned. The row itself is never removed.
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

// ---------------------------------------------------------------------------
// Network / Currency / Wallet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNetwork {
    pub id: String,
    pub rpc_url: String,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: String,
    pub network_id: String,
    pub name: String,
    pub symbol: String,
    pub decimal: u8,
    pub image: Option<String>,
    pub native: bool,
    /// Contract address for non-native currencies.
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCurrency {
    pub network_id: String,
    pub name: String,
    pub symbol: String,
    pub decimal: u8,
    pub image: Option<String>,
    pub native: bool,
    pub reference_id: Option<String>,
}

/// Editable fields of a currency.  `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrencyUpdate {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimal: Option<u8>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserCurrency {
    pub id: String,
    pub user_id: String,
    pub currency_id: String,
    pub network_id: String,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

/// An external wallet owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// External wallet address, globally unique.
    pub id: String,
    pub user_id: String,
    pub network_id: String,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    pub primary: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// Experience id -> membership flag.
pub type ExperienceIndex = BTreeMap<String, i64>;

/// Public engagement counters of a post.  `tips` is maintained separately
/// from the vote/comment counters and survives their recomputation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PostMetric {
    pub upvotes: i64,
    pub downvotes: i64,
    pub debates: i64,
    pub discussions: i64,
    pub comments: i64,
    pub tips: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub created_by: String,
    pub text: String,
    pub platform: PlatformType,
    pub status: PostStatus,
    /// Id of the post on its source platform, for imports.
    pub original_post_id: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub mentions: Vec<String>,
    pub experience_index: ExperienceIndex,
    pub metric: PostMetric,
    pub popular_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_platform() -> PlatformType {
    PlatformType::Agora
}

fn default_post_status() -> PostStatus {
    PostStatus::Published
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub created_by: String,
    pub text: String,
    #[serde(default = "default_platform")]
    pub platform: PlatformType,
    #[serde(default = "default_post_status")]
    pub status: PostStatus,
    #[serde(default)]
    pub original_post_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentMetric {
    pub upvotes: i64,
    pub downvotes: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    /// Whether this comment answers a post or another comment.
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub section: SectionType,
    pub reference_id: String,
    pub user_id: String,
    pub post_id: String,
    pub metric: CommentMetric,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_section() -> SectionType {
    SectionType::Discussion
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub text: String,
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    #[serde(default = "default_section")]
    pub section: SectionType,
    pub reference_id: String,
    pub user_id: String,
    pub post_id: String,
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub post_id: String,
    pub section: Option<SectionType>,
    /// `true` is an upvote, `false` a downvote.
    pub state: bool,
    pub user_id: String,
    pub to_user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVote {
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub post_id: String,
    #[serde(default)]
    pub section: Option<SectionType>,
    pub state: bool,
    pub user_id: String,
    /// Owner of the voted content. Resolved server-side, never accepted from
    /// the client.
    #[serde(skip_deserializing)]
    pub to_user_id: String,
}

/// Result of writing a vote: one vote per (user, target) exists, so a repeat
/// vote replaces the earlier one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VoteUpsert {
    pub value: Vote,
    pub created: bool,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub hash: String,
    pub amount: f64,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub currency_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub hash: String,
    pub amount: f64,
    pub from: String,
    pub to: String,
    #[serde(rename = "type", default)]
    pub reference_type: Option<ReferenceType>,
    #[serde(default)]
    pub reference_id: Option<String>,
    pub currency_id: String,
}

// ---------------------------------------------------------------------------
// Tag / Experience
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTag {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExperience {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePost {
    pub id: String,
    pub experience_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Friend / Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: String,
    pub requestor_id: String,
    pub requestee_id: String,
    pub status: FriendStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewFriend {
    pub requestor_id: String,
    pub requestee_id: String,
    pub status: FriendStatus,
}

/// Aggregate over every individual report filed against one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub status: ReportStatus,
    pub total_reported: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserReport {
    pub id: String,
    pub report_id: String,
    pub reported_by: String,
    pub reference_type: ReferenceType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserReport {
    pub report_id: String,
    pub reported_by: String,
    pub reference_type: ReferenceType,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Notification / ActivityLog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub from: Option<String>,
    pub to: String,
    pub reference_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub from: Option<String>,
    pub to: String,
    pub reference_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    #[serde(rename = "type")]
    pub log_type: ActivityLogType,
    pub user_id: String,
    pub reference_type: ReferenceType,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// People / social media
// ---------------------------------------------------------------------------

/// An account on an external platform whose posts were imported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct People {
    pub id: String,
    pub name: String,
    pub username: String,
    pub platform: PlatformType,
    pub origin_user_id: String,
    /// The Agora user who claimed this account, once connected.
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPeople {
    pub name: String,
    pub username: String,
    pub platform: PlatformType,
    pub origin_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSocialMedia {
    pub id: String,
    pub user_id: String,
    pub people_id: String,
    pub platform: PlatformType,
    pub verified: bool,
    pub primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserSocialMedia {
    pub user_id: String,
    pub people_id: String,
    pub platform: PlatformType,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub primary: bool,
}
