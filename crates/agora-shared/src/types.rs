use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

/// Declares a fieldless enum stored as lowercase text, with serde, `Display`
/// and `FromStr` all agreeing on the same spelling.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// What a vote, comment, transaction, report or log entry points at.
    ReferenceType {
        Post => "post",
        Comment => "comment",
        User => "user",
        Transaction => "transaction",
    }
}

string_enum! {
    /// Comment category. Downvoting a post requires a debate comment first.
    SectionType {
        Discussion => "discussion",
        Debate => "debate",
    }
}

string_enum! {
    PostStatus {
        Draft => "draft",
        Published => "published",
    }
}

string_enum! {
    /// Where a post originates. Anything other than `Agora` is an import.
    PlatformType {
        Agora => "agora",
        Twitter => "twitter",
        Reddit => "reddit",
    }
}

string_enum! {
    FriendStatus {
        Pending => "pending",
        Approved => "approved",
        Blocked => "blocked",
    }
}

string_enum! {
    WalletType {
        Polkadot => "polkadot",
        Near => "near",
        Ethereum => "ethereum",
    }
}

string_enum! {
    ReportStatus {
        Pending => "pending",
        Removed => "removed",
        Ignored => "ignored",
    }
}

string_enum! {
    NotificationType {
        PostComment => "post_comment",
        CommentComment => "comment_comment",
        FriendRequest => "friend_request",
        TipsSuccess => "tips_success",
        PostMention => "post_mention",
        ReportUser => "report_user",
        ReportReporter => "report_reporter",
    }
}

string_enum! {
    ActivityLogType {
        CreatePost => "create_post",
        CreateComment => "create_comment",
        FriendRequest => "friend_request",
        SendTip => "send_tip",
        GiveVote => "give_vote",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_serde_spelling() {
        let parsed: NotificationType = "tips_success".parse().unwrap();
        assert_eq!(parsed, NotificationType::TipsSuccess);

        let json = serde_json::to_string(&NotificationType::TipsSuccess).unwrap();
        assert_eq!(json, "\"tips_success\"");
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = "shout".parse::<SectionType>().unwrap_err();
        assert_eq!(err.kind, "SectionType");
        assert_eq!(err.value, "shout");
    }
}
