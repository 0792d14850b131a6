//! CRUD operations for [`Transaction`] records.

use agora_shared::ReferenceType;
use chrono::Utc;
use rusqlite::params;

use crate::codec::{enum_col, new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

impl Database {
    pub fn create_transaction(&self, new: &NewTransaction) -> Result<Transaction> {
        let tx = Transaction {
            id: new_id(),
            hash: new.hash.clone(),
            amount: new.amount,
            from: new.from.clone(),
            to: new.to.clone(),
            reference_type: new.reference_type,
            reference_id: new.reference_id.clone(),
            currency_id: new.currency_id.clone(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO transactions (id, hash, amount, from_user, to_user, reference_type,
                                       reference_id, currency_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                tx.id,
                tx.hash,
                tx.amount,
                tx.from,
                tx.to,
                tx.reference_type.map(|t| t.as_str()),
                tx.reference_id,
                tx.currency_id,
                tx.created_at.to_rfc3339(),
            ],
        )?;
        Ok(tx)
    }

    pub fn get_transaction(&self, id: &str) -> Result<Transaction> {
        self.conn()
            .query_row(
                "SELECT id, hash, amount, from_user, to_user, reference_type, reference_id,
                        currency_id, created_at
                 FROM transactions WHERE id = ?1",
                params![id],
                row_to_transaction,
            )
            .map_err(or_not_found("Transaction", id))
    }

    /// Number of tips sent to a piece of content.
    pub fn count_tips(&self, reference_type: ReferenceType, reference_id: &str) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM transactions WHERE reference_type = ?1 AND reference_id = ?2",
            params![reference_type.as_str(), reference_id],
            |row| row.get(0),
        )?)
    }
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let reference_type: Option<String> = row.get(5)?;
    let created_at: String = row.get(8)?;

    Ok(Transaction {
        id: row.get(0)?,
        hash: row.get(1)?,
        amount: row.get(2)?,
        from: row.get(3)?,
        to: row.get(4)?,
        reference_type: reference_type.map(|t| enum_col(5, &t)).transpose()?,
        reference_id: row.get(6)?,
        currency_id: row.get(7)?,
        created_at: ts(8, &created_at)?,
    })
}
