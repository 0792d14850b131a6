//! CRUD operations for [`Wallet`] records.

use agora_shared::WalletType;
use rusqlite::{params, OptionalExtension};

use crate::codec::{enum_col, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::Wallet;

impl Database {
    /// Insert a wallet.  A second wallet with the same address, or a second
    /// wallet of the same type for one user, fails with `Conflict`.
    pub fn create_wallet(&self, wallet: &Wallet) -> Result<()> {
        self.conn().execute(
            "INSERT INTO wallets (id, user_id, network_id, type, is_primary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                wallet.id,
                wallet.user_id,
                wallet.network_id,
                wallet.wallet_type.as_str(),
                wallet.primary,
                wallet.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn wallet_exists(&self, id: &str) -> Result<bool> {
        let found: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM wallets WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }

    pub fn find_wallet_by_type(
        &self,
        user_id: &str,
        wallet_type: WalletType,
    ) -> Result<Option<Wallet>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, user_id, network_id, type, is_primary, created_at
                 FROM wallets WHERE user_id = ?1 AND type = ?2",
                params![user_id, wallet_type.as_str()],
                row_to_wallet,
            )
            .optional()?)
    }

    pub fn list_user_wallets(&self, user_id: &str) -> Result<Vec<Wallet>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, network_id, type, is_primary, created_at
             FROM wallets WHERE user_id = ?1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_wallet)?;

        let mut wallets = Vec::new();
        for row in rows {
            wallets.push(row?);
        }
        Ok(wallets)
    }

    /// Make `wallet_id` the user's only primary wallet.
    pub fn set_primary_wallet(&self, user_id: &str, wallet_id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE wallets SET is_primary = (id = ?2) WHERE user_id = ?1",
            params![user_id, wallet_id],
        )?;
        Ok(())
    }
}

fn row_to_wallet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Wallet> {
    let wallet_type: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    Ok(Wallet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        network_id: row.get(2)?,
        wallet_type: enum_col(3, &wallet_type)?,
        primary: row.get(4)?,
        created_at: ts(5, &created_at)?,
    })
}
