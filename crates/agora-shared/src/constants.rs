/// Nonce size in bytes before hex encoding (128 bits)
pub const NONCE_SIZE: usize = 16;

/// Ed25519 public key size in bytes
pub const PUBKEY_SIZE: usize = 32;

/// Ed25519 signature size in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Replacement for the name of a soft-deleted user
pub const BANNED_USER_PLACEHOLDER: &str = "[user banned]";

/// Replacement for the text of a soft-deleted post
pub const REMOVED_POST_PLACEHOLDER: &str = "[post removed]";

/// Replacement for the text of a soft-deleted comment
pub const REMOVED_COMMENT_PLACEHOLDER: &str = "[comment removed]";

/// Shown when a post is downvoted without a prior debate comment
pub const COMMENT_FIRST_MESSAGE: &str =
    "Please comment first in debate sections, before you downvote this post";

/// Maximum number of importers listed on a re-shared post
pub const MAX_LISTED_IMPORTERS: usize = 5;
