//! v002 -- Storage-level uniqueness.
//!
//! The pipeline checks these invariants before writing, but check-then-act
//! leaves a race window.  These indexes close it: a lost race fails the
//! insert with a constraint violation instead of producing a duplicate.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_wallets_user_type ON wallets(user_id, type);
CREATE UNIQUE INDEX IF NOT EXISTS idx_user_reports_unique ON user_reports(report_id, reported_by);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_lower ON tags(lower(id));
CREATE UNIQUE INDEX IF NOT EXISTS idx_experience_posts_unique ON experience_posts(experience_id, post_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_unique ON votes(user_id, reference_type, reference_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
