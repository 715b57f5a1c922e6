// Export adapters
// CSV for spreadsheets, JSON for full backup. The backup document carries a
// SHA-256 checksum over its serialized collections; restore verifies it and
// only loads into an empty ledger, reinserting every row with its original
// id so transfer links and snapshot history survive exactly.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::{Account, Asset, AssetSnapshot, Category, Transaction};
use crate::error::LedgerError;
use crate::money::format_amount;
use crate::store::{snapshot_from_row, Ledger, TransactionFilter};

pub const CSV_HEADER: [&str; 6] = ["date", "description", "amount", "type", "account", "category"];

/// Full-ledger backup document.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupDocument {
    pub backup_id: Uuid,
    pub exported_at: DateTime<Utc>,
    /// SHA-256 over the serialized collections below.
    pub checksum: String,
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub assets: Vec<Asset>,
    pub asset_snapshots: Vec<AssetSnapshot>,
}

/// Row counts written by a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub accounts: usize,
    pub categories: usize,
    pub transactions: usize,
    pub assets: usize,
    pub snapshots: usize,
}

/// Write transactions matching `filter` as CSV into `dir`, creating the
/// directory if needed. Returns the path of the timestamped file.
pub fn export_csv(
    ledger: &Ledger,
    dir: &Path,
    filter: &TransactionFilter,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(format!(
        "transactions_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));

    let account_names: HashMap<i64, String> = ledger
        .accounts()?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let category_names: HashMap<i64, String> = ledger
        .categories()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("cannot write {}", path.display()))?;
    writer.write_record(CSV_HEADER)?;
    for tx in ledger.transactions(filter)? {
        writer.write_record([
            tx.date.to_string().as_str(),
            tx.description.as_str(),
            format_amount(tx.amount).as_str(),
            tx.kind.as_str(),
            account_names.get(&tx.account_id).map(String::as_str).unwrap_or(""),
            category_names.get(&tx.category_id).map(String::as_str).unwrap_or(""),
        ])?;
    }
    writer.flush().context("cannot flush CSV export")?;
    Ok(path)
}

/// Write a checksummed JSON backup of the whole ledger into `dir`.
pub fn export_json(ledger: &Ledger, dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(format!(
        "ledger_backup_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));

    let accounts = ledger.accounts()?;
    let categories = ledger.categories()?;
    let transactions = ledger.transactions(&TransactionFilter::default())?;
    let assets = ledger.assets()?;
    let asset_snapshots = all_snapshots(ledger)?;

    let document = BackupDocument {
        backup_id: Uuid::new_v4(),
        exported_at: Utc::now(),
        checksum: collections_checksum(
            &accounts,
            &categories,
            &transactions,
            &assets,
            &asset_snapshots,
        )?,
        accounts,
        categories,
        transactions,
        assets,
        asset_snapshots,
    };

    let body = serde_json::to_string_pretty(&document).context("cannot serialize backup")?;
    fs::write(&path, body).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// Load a backup file into an empty ledger, preserving ids.
pub fn restore_json(ledger: &mut Ledger, path: &Path) -> anyhow::Result<RestoreSummary> {
    let body =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let document: BackupDocument =
        serde_json::from_str(&body).context("malformed backup document")?;

    let expected = collections_checksum(
        &document.accounts,
        &document.categories,
        &document.transactions,
        &document.assets,
        &document.asset_snapshots,
    )?;
    if expected != document.checksum {
        return Err(LedgerError::validation("backup checksum mismatch").into());
    }
    if !is_empty(ledger)? {
        return Err(LedgerError::validation(
            "restore requires an empty ledger; the current database already has data",
        )
        .into());
    }

    let tx = ledger.conn.transaction()?;
    for account in &document.accounts {
        tx.execute(
            "INSERT INTO accounts (id, name, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                account.id,
                account.name,
                account.kind.as_str(),
                account.created_at.to_rfc3339(),
            ],
        )?;
    }

    // Parents before children
    let mut pending: Vec<&Category> = document.categories.iter().collect();
    let mut inserted: HashSet<i64> = HashSet::new();
    while !pending.is_empty() {
        let mut next = Vec::new();
        let mut progressed = false;
        for category in pending {
            if category.parent_id.map_or(true, |p| inserted.contains(&p)) {
                tx.execute(
                    "INSERT INTO categories (id, name, parent_id) VALUES (?1, ?2, ?3)",
                    params![category.id, category.name, category.parent_id],
                )?;
                inserted.insert(category.id);
                progressed = true;
            } else {
                next.push(category);
            }
        }
        if !progressed {
            return Err(LedgerError::validation("backup contains orphaned categories").into());
        }
        pending = next;
    }

    // Legs reference each other, so links land in a second pass
    for t in &document.transactions {
        tx.execute(
            "INSERT INTO transactions (id, date, description, amount, kind, account_id, category_id, linked_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
            params![
                t.id,
                t.date.to_string(),
                t.description,
                t.amount,
                t.kind.as_str(),
                t.account_id,
                t.category_id,
            ],
        )?;
    }
    for t in &document.transactions {
        if let Some(linked_id) = t.linked_id {
            tx.execute(
                "UPDATE transactions SET linked_id = ?1 WHERE id = ?2",
                params![linked_id, t.id],
            )?;
        }
    }

    for asset in &document.assets {
        tx.execute(
            "INSERT INTO assets (id, name, kind, current_value, purchase_value, purchase_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                asset.id,
                asset.name,
                asset.kind.as_str(),
                asset.current_value,
                asset.purchase_value,
                asset.purchase_date.map(|d| d.to_string()),
            ],
        )?;
    }
    for snapshot in &document.asset_snapshots {
        tx.execute(
            "INSERT INTO asset_snapshots (id, asset_id, value, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.id,
                snapshot.asset_id,
                snapshot.value,
                snapshot.recorded_at.to_rfc3339(),
            ],
        )?;
    }
    tx.commit()?;

    Ok(RestoreSummary {
        accounts: document.accounts.len(),
        categories: document.categories.len(),
        transactions: document.transactions.len(),
        assets: document.assets.len(),
        snapshots: document.asset_snapshots.len(),
    })
}

fn collections_checksum(
    accounts: &[Account],
    categories: &[Category],
    transactions: &[Transaction],
    assets: &[Asset],
    asset_snapshots: &[AssetSnapshot],
) -> anyhow::Result<String> {
    #[derive(Serialize)]
    struct Body<'a> {
        accounts: &'a [Account],
        categories: &'a [Category],
        transactions: &'a [Transaction],
        assets: &'a [Asset],
        asset_snapshots: &'a [AssetSnapshot],
    }

    let bytes = serde_json::to_vec(&Body {
        accounts,
        categories,
        transactions,
        assets,
        asset_snapshots,
    })
    .context("cannot serialize backup collections")?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn all_snapshots(ledger: &Ledger) -> crate::error::Result<Vec<AssetSnapshot>> {
    let mut stmt = ledger
        .conn
        .prepare("SELECT id, asset_id, value, recorded_at FROM asset_snapshots ORDER BY id")?;
    let snapshots = stmt
        .query_map([], snapshot_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(snapshots)
}

fn is_empty(ledger: &Ledger) -> crate::error::Result<bool> {
    for table in ["accounts", "categories", "transactions", "assets", "asset_snapshots"] {
        let count: i64 =
            ledger
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountKind, NewTransaction, TransactionKind};
    use crate::import::{import_csv, ImportOptions};
    use crate::transfer::TransferRequest;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tallybook-export-{}", Uuid::new_v4()))
    }

    /// Ledger with two accounts, one income, one expense, and a transfer.
    fn populated_ledger() -> Ledger {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let everyday = ledger.add_account("Everyday", AccountKind::Checking).unwrap();
        let savings = ledger.add_account("Rainy day", AccountKind::Savings).unwrap();
        let salary = ledger.add_category("Salary", None).unwrap();
        let groceries = ledger.add_category("Groceries", None).unwrap();

        ledger
            .add_transaction(&NewTransaction {
                date: date(2024, 3, 1),
                description: "Paycheck".to_string(),
                amount: 250_000,
                kind: TransactionKind::Income,
                account_id: everyday.id,
                category_id: salary.id,
            })
            .unwrap();
        ledger
            .add_transaction(&NewTransaction {
                date: date(2024, 3, 2),
                description: "Supermarket".to_string(),
                amount: -4_510,
                kind: TransactionKind::Expense,
                account_id: everyday.id,
                category_id: groceries.id,
            })
            .unwrap();
        ledger
            .transfer(&TransferRequest {
                from_account: everyday.id,
                to_account: savings.id,
                amount: 50_000,
                date: date(2024, 3, 5),
                description: "Monthly savings".to_string(),
            })
            .unwrap();
        ledger
            .add_asset("Index fund", AccountKind::Stocks, 300_000, Some(250_000), None)
            .unwrap();
        ledger
    }

    /// Comparable shape: (date, description, amount, kind, account, category).
    fn tuples(ledger: &Ledger) -> Vec<(String, String, i64, String, String, String)> {
        let mut out = Vec::new();
        for tx in ledger.transactions(&TransactionFilter::default()).unwrap() {
            let account = ledger.account(tx.account_id).unwrap();
            let category = ledger.category(tx.category_id).unwrap();
            out.push((
                tx.date.to_string(),
                tx.description,
                tx.amount,
                tx.kind.as_str().to_string(),
                account.name,
                category.name,
            ));
        }
        out.sort();
        out
    }

    #[test]
    fn test_csv_export_import_round_trip() {
        let ledger = populated_ledger();
        let dir = temp_dir();
        let path = export_csv(&ledger, &dir, &TransactionFilter::default()).unwrap();

        let mut fresh = Ledger::open_in_memory().unwrap();
        let report = import_csv(&mut fresh, &path, &ImportOptions::default()).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.transfer_pairs, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(tuples(&ledger), tuples(&fresh));

        // Re-imported legs are linked again
        let legs = fresh
            .transactions(&TransactionFilter {
                kind: Some(TransactionKind::TransferLeg),
                ..TransactionFilter::default()
            })
            .unwrap();
        assert_eq!(legs.len(), 2);
        assert!(legs[0].linked_id.is_some());
    }

    #[test]
    fn test_csv_export_writes_header() {
        let ledger = populated_ledger();
        let dir = temp_dir();
        let path = export_csv(&ledger, &dir, &TransactionFilter::default()).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let mut lines = body.lines();
        assert_eq!(lines.next(), Some("date,description,amount,type,account,category"));
        // 2 plain rows + 2 legs
        assert_eq!(lines.count(), 4);
        assert!(body.contains("-45.10"));
    }

    #[test]
    fn test_json_backup_restore_preserves_everything() {
        let mut original = populated_ledger();
        let asset = original.assets().unwrap().remove(0);
        original.update_asset_value(asset.id, 320_000).unwrap();

        let dir = temp_dir();
        let path = export_json(&original, &dir).unwrap();

        let mut restored = Ledger::open_in_memory().unwrap();
        let summary = restore_json(&mut restored, &path).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(
            summary,
            RestoreSummary {
                accounts: 2,
                categories: 3,
                transactions: 4,
                assets: 1,
                snapshots: 2,
            }
        );
        assert_eq!(original.accounts().unwrap(), restored.accounts().unwrap());
        assert_eq!(original.categories().unwrap(), restored.categories().unwrap());
        assert_eq!(
            original.transactions(&TransactionFilter::default()).unwrap(),
            restored.transactions(&TransactionFilter::default()).unwrap()
        );
        assert_eq!(original.assets().unwrap(), restored.assets().unwrap());
        assert_eq!(
            original.asset_history(asset.id).unwrap(),
            restored.asset_history(asset.id).unwrap()
        );
    }

    #[test]
    fn test_restore_rejects_tampered_backup() {
        let original = populated_ledger();
        let dir = temp_dir();
        let path = export_json(&original, &dir).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        fs::write(&path, body.replace("Paycheck", "Hacked")).unwrap();

        let mut fresh = Ledger::open_in_memory().unwrap();
        let err = restore_json(&mut fresh, &path).unwrap_err();
        fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::Validation(_))
        ));
        assert_eq!(fresh.transaction_count().unwrap(), 0);
    }

    #[test]
    fn test_restore_requires_empty_ledger() {
        let original = populated_ledger();
        let dir = temp_dir();
        let path = export_json(&original, &dir).unwrap();

        let mut occupied = Ledger::open_in_memory().unwrap();
        occupied.add_account("Existing", AccountKind::Checking).unwrap();

        let err = restore_json(&mut occupied, &path).unwrap_err();
        fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::Validation(_))
        ));
    }
}
