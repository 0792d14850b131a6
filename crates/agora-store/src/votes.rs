//! CRUD operations for [`Vote`] records.

use agora_shared::ReferenceType;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{enum_col, new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{NewVote, Vote, VoteUpsert};

const VOTE_COLUMNS: &str = "id, reference_type, reference_id, post_id, section, state, user_id,
     to_user_id, created_at, updated_at";

impl Database {
    /// Write a vote.  A user holds at most one vote per target, so a repeat
    /// vote replaces the state and section of the earlier one.
    pub fn upsert_vote(&self, new: &NewVote) -> Result<VoteUpsert> {
        let now = Utc::now();
        let section = new.section.map(|s| s.as_str());

        let existing = self.find_vote_by(&new.user_id, new.reference_type, &new.reference_id)?;
        if let Some(mut vote) = existing {
            self.conn().execute(
                "UPDATE votes SET state = ?1, section = ?2, to_user_id = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![new.state, section, new.to_user_id, now.to_rfc3339(), vote.id],
            )?;
            vote.state = new.state;
            vote.section = new.section;
            vote.to_user_id = new.to_user_id.clone();
            vote.updated_at = now;
            return Ok(VoteUpsert {
                value: vote,
                created: false,
            });
        }

        let vote = Vote {
            id: new_id(),
            reference_type: new.reference_type,
            reference_id: new.reference_id.clone(),
            post_id: new.post_id.clone(),
            section: new.section,
            state: new.state,
            user_id: new.user_id.clone(),
            to_user_id: new.to_user_id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            "INSERT INTO votes (id, reference_type, reference_id, post_id, section, state,
                                user_id, to_user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                vote.id,
                vote.reference_type.as_str(),
                vote.reference_id,
                vote.post_id,
                section,
                vote.state,
                vote.user_id,
                vote.to_user_id,
                vote.created_at.to_rfc3339(),
                vote.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(VoteUpsert {
            value: vote,
            created: true,
        })
    }

    pub fn get_vote(&self, id: &str) -> Result<Vote> {
        self.conn()
            .query_row(
                &format!("SELECT {VOTE_COLUMNS} FROM votes WHERE id = ?1"),
                params![id],
                row_to_vote,
            )
            .map_err(or_not_found("Vote", id))
    }

    pub fn find_vote_by(
        &self,
        user_id: &str,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<Option<Vote>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {VOTE_COLUMNS} FROM votes
                     WHERE user_id = ?1 AND reference_type = ?2 AND reference_id = ?3"
                ),
                params![user_id, reference_type.as_str(), reference_id],
                row_to_vote,
            )
            .optional()?)
    }

    /// Returns `true` if a vote was removed.
    pub fn delete_vote(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM votes WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn count_votes(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
        state: bool,
    ) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM votes
             WHERE reference_type = ?1 AND reference_id = ?2 AND state = ?3",
            params![reference_type.as_str(), reference_id, state],
            |row| row.get(0),
        )?)
    }

    /// Votes of the given state received by a user across all of their
    /// content.
    pub fn count_votes_to_user(&self, user_id: &str, state: bool) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM votes WHERE to_user_id = ?1 AND state = ?2",
            params![user_id, state],
            |row| row.get(0),
        )?)
    }
}

fn row_to_vote(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vote> {
    let reference_type: String = row.get(1)?;
    let section: Option<String> = row.get(4)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Vote {
        id: row.get(0)?,
        reference_type: enum_col(1, &reference_type)?,
        reference_id: row.get(2)?,
        post_id: row.get(3)?,
        section: section.map(|s| enum_col(4, &s)).transpose()?,
        state: row.get(5)?,
        user_id: row.get(6)?,
        to_user_id: row.get(7)?,
        created_at: ts(8, &created_at)?,
        updated_at: ts(9, &updated_at)?,
    })
}
