//! v001 -- Initial schema creation.
//!
//! Every entity lives in its own table.  Composite values (tags, mentions,
//! experience index, metrics) are JSON text; timestamps are RFC-3339 text.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id                  TEXT PRIMARY KEY NOT NULL,
    name                TEXT NOT NULL,
    username            TEXT NOT NULL,
    profile_picture_url TEXT,
    bio                 TEXT,
    nonce               TEXT NOT NULL,
    metric              TEXT NOT NULL DEFAULT '{}',  -- JSON UserMetric
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    deleted_at          TEXT
);

-- ----------------------------------------------------------------
-- Networks, currencies, balances
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS networks (
    id           TEXT PRIMARY KEY NOT NULL,
    rpc_url      TEXT NOT NULL,
    explorer_url TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS currencies (
    id           TEXT PRIMARY KEY NOT NULL,
    network_id   TEXT NOT NULL,
    name         TEXT NOT NULL,
    symbol       TEXT NOT NULL,
    decimal      INTEGER NOT NULL,
    image        TEXT,
    native       INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    reference_id TEXT,                        -- contract address, NULL for native
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_currencies_network ON currencies(network_id);

CREATE TABLE IF NOT EXISTS user_currencies (
    id          TEXT PRIMARY KEY NOT NULL,
    user_id     TEXT NOT NULL,
    currency_id TEXT NOT NULL,
    network_id  TEXT NOT NULL,
    priority    INTEGER NOT NULL,
    created_at  TEXT NOT NULL,

    UNIQUE (user_id, currency_id)
);

CREATE TABLE IF NOT EXISTS wallets (
    id         TEXT PRIMARY KEY NOT NULL,     -- external wallet address
    user_id    TEXT NOT NULL,
    network_id TEXT NOT NULL,
    type       TEXT NOT NULL,
    is_primary INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wallets_user ON wallets(user_id);

-- ----------------------------------------------------------------
-- Content
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id               TEXT PRIMARY KEY NOT NULL,
    created_by       TEXT NOT NULL,
    text             TEXT NOT NULL,
    platform         TEXT NOT NULL,
    status           TEXT NOT NULL,
    original_post_id TEXT,
    url              TEXT,
    tags             TEXT NOT NULL DEFAULT '[]',
    mentions         TEXT NOT NULL DEFAULT '[]',
    experience_index TEXT NOT NULL DEFAULT '{}',
    metric           TEXT NOT NULL DEFAULT '{}',
    popular_count    INTEGER NOT NULL DEFAULT 0,
    published_at     TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    deleted_at       TEXT
);

CREATE INDEX IF NOT EXISTS idx_posts_created_by ON posts(created_by);
CREATE INDEX IF NOT EXISTS idx_posts_origin ON posts(platform, original_post_id);

CREATE TABLE IF NOT EXISTS comments (
    id             TEXT PRIMARY KEY NOT NULL,
    text           TEXT NOT NULL,
    reference_type TEXT NOT NULL,
    section        TEXT NOT NULL,
    reference_id   TEXT NOT NULL,
    user_id        TEXT NOT NULL,
    post_id        TEXT NOT NULL,
    metric         TEXT NOT NULL DEFAULT '{}',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    deleted_at     TEXT
);

CREATE INDEX IF NOT EXISTS idx_comments_reference ON comments(reference_type, reference_id);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);

CREATE TABLE IF NOT EXISTS votes (
    id             TEXT PRIMARY KEY NOT NULL,
    reference_type TEXT NOT NULL,
    reference_id   TEXT NOT NULL,
    post_id        TEXT NOT NULL,
    section        TEXT,
    state          INTEGER NOT NULL,          -- 1 upvote, 0 downvote
    user_id        TEXT NOT NULL,
    to_user_id     TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_votes_reference ON votes(reference_type, reference_id);
CREATE INDEX IF NOT EXISTS idx_votes_to_user ON votes(to_user_id);

CREATE TABLE IF NOT EXISTS transactions (
    id             TEXT PRIMARY KEY NOT NULL,
    hash           TEXT NOT NULL,
    amount         REAL NOT NULL,
    from_user      TEXT NOT NULL,
    to_user        TEXT NOT NULL,
    reference_type TEXT,
    reference_id   TEXT,
    currency_id    TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_reference ON transactions(reference_type, reference_id);

CREATE TABLE IF NOT EXISTS tags (
    id         TEXT PRIMARY KEY NOT NULL,
    count      INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS experiences (
    id          TEXT PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    created_by  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS experience_posts (
    id            TEXT PRIMARY KEY NOT NULL,
    experience_id TEXT NOT NULL,
    post_id       TEXT NOT NULL,
    created_at    TEXT NOT NULL,

    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Social graph and moderation
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS friends (
    id           TEXT PRIMARY KEY NOT NULL,
    requestor_id TEXT NOT NULL,
    requestee_id TEXT NOT NULL,
    status       TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_friends_pair ON friends(requestor_id, requestee_id);

CREATE TABLE IF NOT EXISTS reports (
    id             TEXT PRIMARY KEY NOT NULL,
    reference_type TEXT NOT NULL,
    reference_id   TEXT NOT NULL,
    status         TEXT NOT NULL,
    total_reported INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,

    UNIQUE (reference_type, reference_id)
);

CREATE TABLE IF NOT EXISTS user_reports (
    id             TEXT PRIMARY KEY NOT NULL,
    report_id      TEXT NOT NULL,
    reported_by    TEXT NOT NULL,
    reference_type TEXT NOT NULL,
    description    TEXT NOT NULL,
    created_at     TEXT NOT NULL,

    FOREIGN KEY (report_id) REFERENCES reports(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Side-effect sinks
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id           TEXT PRIMARY KEY NOT NULL,
    type         TEXT NOT NULL,
    from_user    TEXT,
    to_user      TEXT NOT NULL,
    reference_id TEXT NOT NULL,
    message      TEXT NOT NULL,
    read         INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_to ON notifications(to_user, created_at DESC);

CREATE TABLE IF NOT EXISTS activity_logs (
    id             TEXT PRIMARY KEY NOT NULL,
    type           TEXT NOT NULL,
    user_id        TEXT NOT NULL,
    reference_type TEXT NOT NULL,
    reference_id   TEXT,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activity_logs_user ON activity_logs(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Imported identities
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS people (
    id             TEXT PRIMARY KEY NOT NULL,
    name           TEXT NOT NULL,
    username       TEXT NOT NULL,
    platform       TEXT NOT NULL,
    origin_user_id TEXT NOT NULL,
    user_id        TEXT,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_social_medias (
    id         TEXT PRIMARY KEY NOT NULL,
    user_id    TEXT NOT NULL,
    people_id  TEXT NOT NULL,
    platform   TEXT NOT NULL,
    verified   INTEGER NOT NULL DEFAULT 0,
    is_primary INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
