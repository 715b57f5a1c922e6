// Ledger store
// One explicitly opened `Ledger` owns the SQLite connection; every component
// goes through it. CRUD plus referential checks live here; paired transfer
// writes live in transfer.rs and share the connection.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::entities::{
    Account, AccountKind, Asset, AssetSnapshot, Category, NewTransaction, Transaction,
    TransactionKind,
};
use crate::error::{LedgerError, Result};

pub struct Ledger {
    pub(crate) conn: Connection,
}

impl Ledger {
    /// Open (creating if needed) the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory ledger for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // WAL for crash recovery, foreign keys as a backstop behind the
        // explicit referential checks below
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        setup_schema(&conn)?;
        Ok(Ledger { conn })
    }

    /// End the lifecycle explicitly, surfacing any close failure.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    pub fn add_account(&mut self, name: &str, kind: AccountKind) -> Result<Account> {
        require_non_empty("account name", name)?;
        let created_at = Utc::now();

        let result = self.conn.execute(
            "INSERT INTO accounts (name, kind, created_at) VALUES (?1, ?2, ?3)",
            params![name.trim(), kind.as_str(), created_at.to_rfc3339()],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(LedgerError::validation(format!(
                    "account name {:?} is already taken",
                    name.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Account {
            id: self.conn.last_insert_rowid(),
            name: name.trim().to_string(),
            kind,
            created_at,
        })
    }

    pub fn account(&self, id: i64) -> Result<Account> {
        self.conn
            .query_row(
                "SELECT id, name, kind, created_at FROM accounts WHERE id = ?1",
                params![id],
                account_from_row,
            )
            .optional()?
            .ok_or_else(|| LedgerError::not_found("account", id))
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind, created_at FROM accounts ORDER BY name")?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    pub fn find_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, kind, created_at FROM accounts WHERE name = ?1",
                params![name.trim()],
                account_from_row,
            )
            .optional()?)
    }

    pub fn update_account(&mut self, id: i64, name: &str, kind: AccountKind) -> Result<Account> {
        require_non_empty("account name", name)?;
        let result = self.conn.execute(
            "UPDATE accounts SET name = ?1, kind = ?2 WHERE id = ?3",
            params![name.trim(), kind.as_str(), id],
        );
        match result {
            Ok(0) => Err(LedgerError::not_found("account", id)),
            Ok(_) => self.account(id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::validation(format!(
                    "account name {:?} is already taken",
                    name.trim()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an account. Without `cascade` the account must be unreferenced;
    /// with `cascade` its transactions go too, including the far leg of any
    /// transfer touching it so no orphaned leg survives.
    pub fn delete_account(&mut self, id: i64, cascade: bool) -> Result<()> {
        self.account(id)?;
        let references: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE account_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if references > 0 && !cascade {
            return Err(LedgerError::referential(format!(
                "account {id} still has {references} transactions"
            )));
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM transactions
             WHERE linked_id IN (SELECT id FROM transactions WHERE account_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM transactions WHERE account_id = ?1", params![id])?;
        tx.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // CATEGORIES
    // ========================================================================

    pub fn add_category(&mut self, name: &str, parent_id: Option<i64>) -> Result<Category> {
        require_non_empty("category name", name)?;
        if let Some(pid) = parent_id {
            if !self.category_exists(pid)? {
                return Err(LedgerError::referential(format!(
                    "parent category {pid} does not exist"
                )));
            }
        }

        let result = self.conn.execute(
            "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
            params![name.trim(), parent_id],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(LedgerError::validation(format!(
                    "category name {:?} is already taken",
                    name.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Category {
            id: self.conn.last_insert_rowid(),
            name: name.trim().to_string(),
            parent_id,
        })
    }

    pub fn category(&self, id: i64) -> Result<Category> {
        self.conn
            .query_row(
                "SELECT id, name, parent_id FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?
            .ok_or_else(|| LedgerError::not_found("category", id))
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn subcategories(&self, parent_id: i64) -> Result<Vec<Category>> {
        self.category(parent_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, name, parent_id FROM categories WHERE parent_id = ?1 ORDER BY name",
        )?;
        let categories = stmt
            .query_map(params![parent_id], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, parent_id FROM categories WHERE name = ?1",
                params![name.trim()],
                category_from_row,
            )
            .optional()?)
    }

    pub fn rename_category(&mut self, id: i64, name: &str) -> Result<Category> {
        require_non_empty("category name", name)?;
        let result = self.conn.execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2",
            params![name.trim(), id],
        );
        match result {
            Ok(0) => Err(LedgerError::not_found("category", id)),
            Ok(_) => self.category(id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::validation(format!(
                    "category name {:?} is already taken",
                    name.trim()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a category. Without `cascade` it must have no subcategories and
    /// no referencing transactions; with `cascade` the whole subtree and its
    /// transactions (transfer pairs included) are removed.
    pub fn delete_category(&mut self, id: i64, cascade: bool) -> Result<()> {
        self.category(id)?;
        // Parents before children, so deletion walks the list in reverse
        let subtree = self.category_subtree(id)?;

        let references: i64 = {
            let mut total = 0;
            for cat_id in &subtree {
                total += self.conn.query_row(
                    "SELECT COUNT(*) FROM transactions WHERE category_id = ?1",
                    params![cat_id],
                    |row| row.get::<_, i64>(0),
                )?;
            }
            total
        };
        if !cascade {
            if subtree.len() > 1 {
                return Err(LedgerError::referential(format!(
                    "category {id} still has {} subcategories",
                    subtree.len() - 1
                )));
            }
            if references > 0 {
                return Err(LedgerError::referential(format!(
                    "category {id} still has {references} transactions"
                )));
            }
        }

        let tx = self.conn.transaction()?;
        for cat_id in &subtree {
            tx.execute(
                "DELETE FROM transactions
                 WHERE linked_id IN (SELECT id FROM transactions WHERE category_id = ?1)",
                params![cat_id],
            )?;
            tx.execute(
                "DELETE FROM transactions WHERE category_id = ?1",
                params![cat_id],
            )?;
        }
        for cat_id in subtree.iter().rev() {
            tx.execute("DELETE FROM categories WHERE id = ?1", params![cat_id])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Breadth-first ids of a category and all its descendants.
    fn category_subtree(&self, id: i64) -> Result<Vec<i64>> {
        let mut ids = vec![id];
        let mut cursor = 0;
        while cursor < ids.len() {
            let parent = ids[cursor];
            cursor += 1;
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM categories WHERE parent_id = ?1")?;
            let children = stmt
                .query_map(params![parent], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids.extend(children);
        }
        Ok(ids)
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    /// Create a plain income or expense transaction. Transfer legs are
    /// refused here; they exist only as pairs written by `transfer`.
    pub fn add_transaction(&mut self, new: &NewTransaction) -> Result<Transaction> {
        if new.kind == TransactionKind::TransferLeg {
            return Err(LedgerError::validation(
                "transfer legs are created through Ledger::transfer",
            ));
        }
        validate_transaction_fields(&new.description, new.amount, new.kind)?;
        self.check_transaction_refs(new.account_id, new.category_id)?;

        self.conn.execute(
            "INSERT INTO transactions (date, description, amount, kind, account_id, category_id, linked_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
            params![
                new.date.to_string(),
                new.description.trim(),
                new.amount,
                new.kind.as_str(),
                new.account_id,
                new.category_id,
            ],
        )?;

        Ok(Transaction {
            id: self.conn.last_insert_rowid(),
            date: new.date,
            description: new.description.trim().to_string(),
            amount: new.amount,
            kind: new.kind,
            account_id: new.account_id,
            category_id: new.category_id,
            linked_id: None,
        })
    }

    pub fn transaction(&self, id: i64) -> Result<Transaction> {
        self.conn
            .query_row(
                "SELECT id, date, description, amount, kind, account_id, category_id, linked_id
                 FROM transactions WHERE id = ?1",
                params![id],
                tx_from_row,
            )
            .optional()?
            .ok_or_else(|| LedgerError::not_found("transaction", id))
    }

    /// Filtered listing, newest first (date, then id).
    pub fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT id, date, description, amount, kind, account_id, category_id, linked_id
             FROM transactions",
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(account_id) = filter.account_id {
            clauses.push("account_id = ?");
            binds.push(Box::new(account_id));
        }
        if let Some(category_id) = filter.category_id {
            clauses.push("category_id = ?");
            binds.push(Box::new(category_id));
        }
        if let Some(kind) = filter.kind {
            clauses.push("kind = ?");
            binds.push(Box::new(kind.as_str()));
        }
        if let Some(from) = filter.from {
            clauses.push("date >= ?");
            binds.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            clauses.push("date <= ?");
            binds.push(Box::new(to.to_string()));
        }
        if let Some(search) = &filter.search {
            clauses.push("description LIKE ?");
            binds.push(Box::new(format!("%{search}%")));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");
        match (filter.limit, filter.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(
                rusqlite::params_from_iter(binds.iter().map(|b| b.as_ref())),
                tx_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(transactions)
    }

    pub fn recent_transactions(&self, limit: u32) -> Result<Vec<Transaction>> {
        self.transactions(&TransactionFilter {
            limit: Some(limit),
            ..TransactionFilter::default()
        })
    }

    pub fn transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    /// Apply a patch. Plain transactions accept any field; transfer legs
    /// accept only date, description, and amount, and the change is mirrored
    /// onto the paired leg (see transfer.rs).
    pub fn update_transaction(&mut self, id: i64, patch: &TransactionPatch) -> Result<Transaction> {
        let existing = self.transaction(id)?;

        if existing.is_transfer_leg() {
            return self.apply_leg_patch(&existing, patch);
        }

        if patch.kind == Some(TransactionKind::TransferLeg) {
            return Err(LedgerError::validation(
                "a transaction cannot be turned into a transfer leg",
            ));
        }

        let date = patch.date.unwrap_or(existing.date);
        let description = patch
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone());
        let amount = patch.amount.unwrap_or(existing.amount);
        let kind = patch.kind.unwrap_or(existing.kind);
        let account_id = patch.account_id.unwrap_or(existing.account_id);
        let category_id = patch.category_id.unwrap_or(existing.category_id);

        validate_transaction_fields(&description, amount, kind)?;
        self.check_transaction_refs(account_id, category_id)?;

        self.conn.execute(
            "UPDATE transactions
             SET date = ?1, description = ?2, amount = ?3, kind = ?4, account_id = ?5, category_id = ?6
             WHERE id = ?7",
            params![
                date.to_string(),
                description.trim(),
                amount,
                kind.as_str(),
                account_id,
                category_id,
                id,
            ],
        )?;

        self.transaction(id)
    }

    /// Delete a transaction. Deleting either leg of a transfer removes both
    /// legs in one atomic write.
    pub fn delete_transaction(&mut self, id: i64) -> Result<()> {
        let existing = self.transaction(id)?;
        match existing.linked_id {
            Some(pair_id) => {
                let tx = self.conn.transaction()?;
                tx.execute(
                    "DELETE FROM transactions WHERE id IN (?1, ?2)",
                    params![id, pair_id],
                )?;
                tx.commit()?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
            }
        }
        Ok(())
    }

    pub(crate) fn check_transaction_refs(&self, account_id: i64, category_id: i64) -> Result<()> {
        if !self.account_exists(account_id)? {
            return Err(LedgerError::referential(format!(
                "transaction references missing account {account_id}"
            )));
        }
        if !self.category_exists(category_id)? {
            return Err(LedgerError::referential(format!(
                "transaction references missing category {category_id}"
            )));
        }
        Ok(())
    }

    pub(crate) fn account_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn category_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ========================================================================
    // ASSETS
    // ========================================================================

    /// Create an asset and its first value snapshot in one write.
    pub fn add_asset(
        &mut self,
        name: &str,
        kind: AccountKind,
        current_value: i64,
        purchase_value: Option<i64>,
        purchase_date: Option<NaiveDate>,
    ) -> Result<Asset> {
        require_non_empty("asset name", name)?;
        if current_value < 0 {
            return Err(LedgerError::validation("asset value must not be negative"));
        }
        if purchase_value.is_some_and(|v| v < 0) {
            return Err(LedgerError::validation(
                "asset purchase value must not be negative",
            ));
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO assets (name, kind, current_value, purchase_value, purchase_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name.trim(),
                kind.as_str(),
                current_value,
                purchase_value,
                purchase_date.map(|d| d.to_string()),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO asset_snapshots (asset_id, value, recorded_at) VALUES (?1, ?2, ?3)",
            params![id, current_value, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(Asset {
            id,
            name: name.trim().to_string(),
            kind,
            current_value,
            purchase_value,
            purchase_date,
        })
    }

    pub fn asset(&self, id: i64) -> Result<Asset> {
        self.conn
            .query_row(
                "SELECT id, name, kind, current_value, purchase_value, purchase_date
                 FROM assets WHERE id = ?1",
                params![id],
                asset_from_row,
            )
            .optional()?
            .ok_or_else(|| LedgerError::not_found("asset", id))
    }

    pub fn assets(&self) -> Result<Vec<Asset>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, current_value, purchase_value, purchase_date
             FROM assets ORDER BY name",
        )?;
        let assets = stmt
            .query_map([], asset_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assets)
    }

    /// Set a new current value and append it to the history.
    pub fn update_asset_value(&mut self, id: i64, value: i64) -> Result<Asset> {
        if value < 0 {
            return Err(LedgerError::validation("asset value must not be negative"));
        }
        self.asset(id)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE assets SET current_value = ?1 WHERE id = ?2",
            params![value, id],
        )?;
        tx.execute(
            "INSERT INTO asset_snapshots (asset_id, value, recorded_at) VALUES (?1, ?2, ?3)",
            params![id, value, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        self.asset(id)
    }

    /// Value history, oldest snapshot first.
    pub fn asset_history(&self, id: i64) -> Result<Vec<AssetSnapshot>> {
        self.asset(id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, asset_id, value, recorded_at FROM asset_snapshots
             WHERE asset_id = ?1 ORDER BY recorded_at, id",
        )?;
        let snapshots = stmt
            .query_map(params![id], snapshot_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    /// Delete an asset; its snapshots go with it.
    pub fn delete_asset(&mut self, id: i64) -> Result<()> {
        self.asset(id)?;
        self.conn
            .execute("DELETE FROM assets WHERE id = ?1", params![id])?;
        Ok(())
    }
}

/// Filter for transaction listings. Unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Substring match on the description.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Partial update for a transaction. Unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
}

fn setup_schema(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Accounts
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Categories (optional single parent for subcategories)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            parent_id INTEGER REFERENCES categories(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Transactions (amounts in signed minor units; linked_id pairs transfer legs)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL,
            kind TEXT NOT NULL,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            category_id INTEGER NOT NULL REFERENCES categories(id),
            linked_id INTEGER REFERENCES transactions(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Assets and their value history
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            current_value INTEGER NOT NULL,
            purchase_value INTEGER,
            purchase_date TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS asset_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
            value INTEGER NOT NULL,
            recorded_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_asset ON asset_snapshots(asset_id)",
        [],
    )?;

    Ok(())
}

pub(crate) fn validate_transaction_fields(
    description: &str,
    amount: i64,
    kind: TransactionKind,
) -> Result<()> {
    require_non_empty("description", description)?;
    if !kind.allows_sign(amount) {
        return Err(LedgerError::validation(match kind {
            TransactionKind::Income => "income amount must be positive",
            TransactionKind::Expense => "expense amount must be negative",
            TransactionKind::TransferLeg => "transfer amount must not be zero",
        }));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

// ============================================================================
// Row mapping
// ============================================================================

fn bad_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("malformed value: {value:?}").into(),
    )
}

pub(crate) fn account_from_row(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    let kind_str: String = row.get(2)?;
    let created_str: String = row.get(3)?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: AccountKind::parse(&kind_str).ok_or_else(|| bad_column(2, &kind_str))?,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map_err(|_| bad_column(3, &created_str))?
            .with_timezone(&Utc),
    })
}

pub(crate) fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
    })
}

pub(crate) fn tx_from_row(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(1)?;
    let kind_str: String = row.get(4)?;
    Ok(Transaction {
        id: row.get(0)?,
        date: date_str.parse().map_err(|_| bad_column(1, &date_str))?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind: TransactionKind::parse(&kind_str).ok_or_else(|| bad_column(4, &kind_str))?,
        account_id: row.get(5)?,
        category_id: row.get(6)?,
        linked_id: row.get(7)?,
    })
}

pub(crate) fn asset_from_row(row: &rusqlite::Row) -> rusqlite::Result<Asset> {
    let kind_str: String = row.get(2)?;
    let purchase_date_str: Option<String> = row.get(5)?;
    let purchase_date = match purchase_date_str {
        Some(s) => Some(s.parse().map_err(|_| bad_column(5, &s))?),
        None => None,
    };
    Ok(Asset {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: AccountKind::parse(&kind_str).ok_or_else(|| bad_column(2, &kind_str))?,
        current_value: row.get(3)?,
        purchase_value: row.get(4)?,
        purchase_date,
    })
}

pub(crate) fn snapshot_from_row(row: &rusqlite::Row) -> rusqlite::Result<AssetSnapshot> {
    let recorded_str: String = row.get(3)?;
    Ok(AssetSnapshot {
        id: row.get(0)?,
        asset_id: row.get(1)?,
        value: row.get(2)?,
        recorded_at: DateTime::parse_from_rfc3339(&recorded_str)
            .map_err(|_| bad_column(3, &recorded_str))?
            .with_timezone(&Utc),
    })
}
