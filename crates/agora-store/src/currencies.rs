//! Networks, the currencies they carry, and per-user currency lists.

use chrono::Utc;
use rusqlite::params;

use crate::codec::{new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{Currency, CurrencyUpdate, Network, NewCurrency, NewNetwork, UserCurrency};

const CURRENCY_COLUMNS: &str =
    "id, network_id, name, symbol, decimal, image, native, reference_id, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Networks
    // ------------------------------------------------------------------

    pub fn create_network(&self, new: &NewNetwork) -> Result<Network> {
        let network = Network {
            id: new.id.clone(),
            rpc_url: new.rpc_url.clone(),
            explorer_url: new.explorer_url.clone(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO networks (id, rpc_url, explorer_url, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                network.id,
                network.rpc_url,
                network.explorer_url,
                network.created_at.to_rfc3339(),
            ],
        )?;
        Ok(network)
    }

    pub fn get_network(&self, id: &str) -> Result<Network> {
        self.conn()
            .query_row(
                "SELECT id, rpc_url, explorer_url, created_at FROM networks WHERE id = ?1",
                params![id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(Network {
                        id: row.get(0)?,
                        rpc_url: row.get(1)?,
                        explorer_url: row.get(2)?,
                        created_at: ts(3, &created_at)?,
                    })
                },
            )
            .map_err(or_not_found("Network", id))
    }

    pub fn network_exists(&self, id: &str) -> Result<bool> {
        let found: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM networks WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }

    // ------------------------------------------------------------------
    // Currencies
    // ------------------------------------------------------------------

    pub fn create_currency(&self, new: &NewCurrency) -> Result<Currency> {
        let currency = Currency {
            id: new_id(),
            network_id: new.network_id.clone(),
            name: new.name.clone(),
            symbol: new.symbol.clone(),
            decimal: new.decimal,
            image: new.image.clone(),
            native: new.native,
            reference_id: new.reference_id.clone(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO currencies (id, network_id, name, symbol, decimal, image, native,
                                     reference_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                currency.id,
                currency.network_id,
                currency.name,
                currency.symbol,
                currency.decimal,
                currency.image,
                currency.native,
                currency.reference_id,
                currency.created_at.to_rfc3339(),
            ],
        )?;
        Ok(currency)
    }

    pub fn get_currency(&self, id: &str) -> Result<Currency> {
        self.conn()
            .query_row(
                &format!("SELECT {CURRENCY_COLUMNS} FROM currencies WHERE id = ?1"),
                params![id],
                row_to_currency,
            )
            .map_err(or_not_found("Currency", id))
    }

    pub fn list_currencies(&self) -> Result<Vec<Currency>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies ORDER BY network_id ASC, created_at ASC"
        ))?;
        let rows = stmt.query_map([], row_to_currency)?;

        let mut currencies = Vec::new();
        for row in rows {
            currencies.push(row?);
        }
        Ok(currencies)
    }

    pub fn update_currency(&self, id: &str, update: &CurrencyUpdate) -> Result<Currency> {
        let mut currency = self.get_currency(id)?;
        if let Some(name) = &update.name {
            currency.name = name.clone();
        }
        if let Some(symbol) = &update.symbol {
            currency.symbol = symbol.clone();
        }
        if let Some(decimal) = update.decimal {
            currency.decimal = decimal;
        }
        if update.image.is_some() {
            currency.image = update.image.clone();
        }

        self.conn().execute(
            "UPDATE currencies SET name = ?1, symbol = ?2, decimal = ?3, image = ?4 WHERE id = ?5",
            params![
                currency.name,
                currency.symbol,
                currency.decimal,
                currency.image,
                id
            ],
        )?;
        Ok(currency)
    }

    /// Delete a currency and detach it from every user holding it.
    pub fn delete_currency(&self, id: &str) -> Result<bool> {
        self.conn().execute(
            "DELETE FROM user_currencies WHERE currency_id = ?1",
            params![id],
        )?;
        let affected = self
            .conn()
            .execute("DELETE FROM currencies WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Currencies of a network, native ones first.
    pub fn list_network_currencies(&self, network_id: &str) -> Result<Vec<Currency>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies
             WHERE network_id = ?1
             ORDER BY native DESC, created_at ASC"
        ))?;

        let rows = stmt.query_map(params![network_id], row_to_currency)?;

        let mut currencies = Vec::new();
        for row in rows {
            currencies.push(row?);
        }
        Ok(currencies)
    }

    // ------------------------------------------------------------------
    // User currencies
    // ------------------------------------------------------------------

    /// Attach a currency to a user.  Returns `false` when already attached.
    pub fn add_user_currency(
        &self,
        user_id: &str,
        currency: &Currency,
        priority: i64,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO user_currencies
                 (id, user_id, currency_id, network_id, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new_id(),
                user_id,
                currency.id,
                currency.network_id,
                priority,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn list_user_currencies(&self, user_id: &str) -> Result<Vec<UserCurrency>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, currency_id, network_id, priority, created_at
             FROM user_currencies
             WHERE user_id = ?1
             ORDER BY priority ASC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            let created_at: String = row.get(5)?;
            Ok(UserCurrency {
                id: row.get(0)?,
                user_id: row.get(1)?,
                currency_id: row.get(2)?,
                network_id: row.get(3)?,
                priority: row.get(4)?,
                created_at: ts(5, &created_at)?,
            })
        })?;

        let mut currencies = Vec::new();
        for row in rows {
            currencies.push(row?);
        }
        Ok(currencies)
    }
}

fn row_to_currency(row: &rusqlite::Row<'_>) -> rusqlite::Result<Currency> {
    let created_at: String = row.get(8)?;
    Ok(Currency {
        id: row.get(0)?,
        network_id: row.get(1)?,
        name: row.get(2)?,
        symbol: row.get(3)?,
        decimal: row.get(4)?,
        image: row.get(5)?,
        native: row.get(6)?,
        reference_id: row.get(7)?,
        created_at: ts(8, &created_at)?,
    })
}
