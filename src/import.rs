// CSV import adapter
// Bank exports disagree on column names, date style, and amount formatting.
// The column mapping is resolved once from the header, then each row parses
// independently: a bad row lands in the report and the rest keep going.
// Transfer rows are re-paired by date and magnitude and written through the
// transfer coordinator so the pair invariant holds for imported data too.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::entities::{AccountKind, NewTransaction, TransactionKind};
use crate::error::LedgerError;
use crate::money::parse_amount;
use crate::store::Ledger;
use crate::transfer::TRANSFER_CATEGORY;

/// Default category for rows that carry none.
const FALLBACK_CATEGORY: &str = "Uncategorized";

/// Column indexes into a CSV record. Date, description, and amount are
/// required; kind, account, and category refine placement when present.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    pub kind: Option<usize>,
    pub account: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnMapping {
    /// Resolve a mapping from the header row. Matching is case-insensitive
    /// substring search over the usual bank-export aliases; each column is
    /// claimed at most once, in required-first order.
    pub fn from_header(header: &StringRecord) -> crate::error::Result<Self> {
        let mut claimed = vec![false; header.len()];
        let date = claim_column(header, &mut claimed, &["date", "time"])
            .ok_or_else(|| LedgerError::validation("no date column in CSV header"))?;
        let description =
            claim_column(header, &mut claimed, &["desc", "label", "libelle", "objet", "memo"])
                .ok_or_else(|| LedgerError::validation("no description column in CSV header"))?;
        let amount = claim_column(header, &mut claimed, &["amount", "montant", "value", "solde"])
            .ok_or_else(|| LedgerError::validation("no amount column in CSV header"))?;
        let kind = claim_column(header, &mut claimed, &["type", "kind"]);
        let account = claim_column(header, &mut claimed, &["account", "compte"]);
        let category = claim_column(header, &mut claimed, &["categor"]);

        Ok(ColumnMapping { date, description, amount, kind, account, category })
    }
}

fn claim_column(header: &StringRecord, claimed: &mut [bool], aliases: &[&str]) -> Option<usize> {
    let idx = header.iter().enumerate().find_map(|(i, name)| {
        if claimed[i] {
            return None;
        }
        let lower = name.trim().to_lowercase();
        aliases.iter().any(|alias| lower.contains(alias)).then_some(i)
    })?;
    claimed[idx] = true;
    Some(idx)
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Account for rows without an account column, created if missing.
    pub fallback_account: Option<String>,
    /// Explicit column mapping; header detection otherwise. The file is
    /// expected to carry a header row either way.
    pub mapping: Option<ColumnMapping>,
}

/// What an import run did. Skipped rows carry their 1-based file line.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub transfer_pairs: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn total_written(&self) -> usize {
        self.imported + self.transfer_pairs * 2
    }
}

#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

struct ParsedRow {
    line: usize,
    date: NaiveDate,
    description: String,
    amount: i64,
    kind: TransactionKind,
    account: Option<String>,
    category: Option<String>,
}

/// Import transactions from a CSV file into the ledger.
pub fn import_csv(
    ledger: &mut Ledger,
    path: &Path,
    options: &ImportOptions,
) -> anyhow::Result<ImportReport> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mapping = match &options.mapping {
        Some(mapping) => mapping.clone(),
        None => ColumnMapping::from_header(
            reader.headers().context("cannot read the CSV header")?,
        )?,
    };
    if mapping.account.is_none() && options.fallback_account.is_none() {
        return Err(
            LedgerError::validation("CSV has no account column; supply a fallback account").into(),
        );
    }

    let mut report = ImportReport::default();
    let mut plain_rows = Vec::new();
    let mut transfer_rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.skipped.push(SkippedRow { line, reason: format!("unreadable row: {e}") });
                continue;
            }
        };
        match parse_row(&record, &mapping, line) {
            Ok(row) if row.kind == TransactionKind::TransferLeg => transfer_rows.push(row),
            Ok(row) => plain_rows.push(row),
            Err(reason) => report.skipped.push(SkippedRow { line, reason }),
        }
    }

    for row in &plain_rows {
        match write_plain_row(ledger, row, options) {
            Ok(()) => report.imported += 1,
            Err(e) => report.skipped.push(SkippedRow { line: row.line, reason: e.to_string() }),
        }
    }
    pair_transfer_rows(ledger, &transfer_rows, options, &mut report);

    report.skipped.sort_by_key(|s| s.line);
    Ok(report)
}

fn parse_row(
    record: &StringRecord,
    mapping: &ColumnMapping,
    line: usize,
) -> Result<ParsedRow, String> {
    let field = |idx: usize| record.get(idx).map(str::trim);

    let raw_date = field(mapping.date).ok_or("missing date field")?;
    let date = parse_date(raw_date).ok_or_else(|| format!("unparseable date {raw_date:?}"))?;

    let description = field(mapping.description).unwrap_or("").to_string();
    if description.is_empty() {
        return Err("empty description".to_string());
    }

    let raw_amount = field(mapping.amount).ok_or("missing amount field")?;
    let amount = parse_amount(raw_amount).map_err(|e| e.to_string())?;
    if amount == 0 {
        return Err("zero amount".to_string());
    }

    let kind = match mapping.kind.and_then(field) {
        Some(raw) if !raw.is_empty() => TransactionKind::parse(&raw.to_lowercase())
            .ok_or_else(|| format!("unknown type {raw:?}"))?,
        _ => {
            if amount > 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            }
        }
    };
    // The type column wins over the sign: many exports carry magnitudes
    // with a separate direction column. Transfer rows keep their sign.
    let magnitude = amount.checked_abs().ok_or("amount out of range")?;
    let amount = match kind {
        TransactionKind::Income => magnitude,
        TransactionKind::Expense => -magnitude,
        TransactionKind::TransferLeg => amount,
    };

    let field_string =
        |idx: Option<usize>| idx.and_then(field).filter(|s| !s.is_empty()).map(str::to_string);

    Ok(ParsedRow {
        line,
        date,
        description,
        amount,
        kind,
        account: field_string(mapping.account),
        category: field_string(mapping.category),
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .ok()
}

fn write_plain_row(
    ledger: &mut Ledger,
    row: &ParsedRow,
    options: &ImportOptions,
) -> crate::error::Result<()> {
    let account_id = resolve_account(ledger, row.account.as_deref(), options)?;
    let category_id = resolve_category(ledger, row.category.as_deref(), row.kind)?;
    ledger.add_transaction(&NewTransaction {
        date: row.date,
        description: row.description.clone(),
        amount: row.amount,
        kind: row.kind,
        account_id,
        category_id,
    })?;
    Ok(())
}

/// Match outgoing and incoming legs greedily in file order: same date,
/// equal magnitude, opposite sign. Unmatched rows are reported, not written.
fn pair_transfer_rows(
    ledger: &mut Ledger,
    rows: &[ParsedRow],
    options: &ImportOptions,
    report: &mut ImportReport,
) {
    let mut used = vec![false; rows.len()];
    for i in 0..rows.len() {
        if used[i] || rows[i].amount >= 0 {
            continue;
        }
        let candidate = (0..rows.len()).find(|&j| {
            !used[j]
                && j != i
                && rows[j].amount == -rows[i].amount
                && rows[j].date == rows[i].date
        });
        let Some(j) = candidate else {
            continue;
        };
        used[i] = true;
        used[j] = true;

        match write_leg_pair(ledger, &rows[i], &rows[j], options) {
            Ok(()) => report.transfer_pairs += 1,
            Err(e) => {
                report.skipped.push(SkippedRow { line: rows[i].line, reason: e.to_string() });
                report.skipped.push(SkippedRow {
                    line: rows[j].line,
                    reason: format!("paired with line {}: {e}", rows[i].line),
                });
            }
        }
    }
    for (i, row) in rows.iter().enumerate() {
        if !used[i] {
            report.skipped.push(SkippedRow {
                line: row.line,
                reason: "transfer row with no matching opposite leg".to_string(),
            });
        }
    }
}

fn write_leg_pair(
    ledger: &mut Ledger,
    outgoing: &ParsedRow,
    incoming: &ParsedRow,
    options: &ImportOptions,
) -> crate::error::Result<()> {
    let out_account = resolve_account(ledger, outgoing.account.as_deref(), options)?;
    let in_account = resolve_account(ledger, incoming.account.as_deref(), options)?;
    let out_category = resolve_category(ledger, outgoing.category.as_deref(), outgoing.kind)?;
    let in_category = resolve_category(ledger, incoming.category.as_deref(), incoming.kind)?;

    ledger.link_leg_pair(
        &NewTransaction {
            date: outgoing.date,
            description: outgoing.description.clone(),
            amount: outgoing.amount,
            kind: TransactionKind::TransferLeg,
            account_id: out_account,
            category_id: out_category,
        },
        &NewTransaction {
            date: incoming.date,
            description: incoming.description.clone(),
            amount: incoming.amount,
            kind: TransactionKind::TransferLeg,
            account_id: in_account,
            category_id: in_category,
        },
    )?;
    Ok(())
}

fn resolve_account(
    ledger: &mut Ledger,
    name: Option<&str>,
    options: &ImportOptions,
) -> crate::error::Result<i64> {
    let name = match name {
        Some(name) => name,
        None => options.fallback_account.as_deref().ok_or_else(|| {
            LedgerError::validation("row has no account and no fallback account was given")
        })?,
    };
    if let Some(account) = ledger.find_account_by_name(name)? {
        return Ok(account.id);
    }
    Ok(ledger.add_account(name, AccountKind::Checking)?.id)
}

fn resolve_category(
    ledger: &mut Ledger,
    name: Option<&str>,
    kind: TransactionKind,
) -> crate::error::Result<i64> {
    let name = name.unwrap_or(if kind == TransactionKind::TransferLeg {
        TRANSFER_CATEGORY
    } else {
        FALLBACK_CATEGORY
    });
    if let Some(category) = ledger.find_category_by_name(name)? {
        return Ok(category.id);
    }
    Ok(ledger.add_category(name, None)?.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TransactionFilter;
    use std::path::PathBuf;

    fn temp_csv(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tallybook-import-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn fallback() -> ImportOptions {
        ImportOptions {
            fallback_account: Some("Imported".to_string()),
            mapping: None,
        }
    }

    #[test]
    fn test_import_detects_columns_from_aliases() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv(
            "Date,Libelle,Montant,Type,Compte,Categorie\n\
             2024-03-01,Paycheck,\"2500,00\",income,Everyday,Salary\n\
             02/03/2024,Supermarket,\"-45,10\",expense,Everyday,Groceries\n",
        );

        let report = import_csv(&mut ledger, &path, &ImportOptions::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.imported, 2);
        assert!(report.skipped.is_empty());

        let account = ledger.find_account_by_name("Everyday").unwrap().unwrap();
        assert_eq!(account.kind, AccountKind::Checking);
        assert_eq!(ledger.account_balance(account.id).unwrap(), 250_000 - 4_510);

        let rows = ledger.transactions(&TransactionFilter::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(ledger.find_category_by_name("Groceries").unwrap().is_some());
    }

    #[test]
    fn test_import_infers_kind_from_sign() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv(
            "date,description,amount\n\
             2024-03-01,Paycheck,1234.56\n\
             2024-03-02,Rent,-800\n",
        );

        let report = import_csv(&mut ledger, &path, &fallback()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.imported, 2);
        let rows = ledger.transactions(&TransactionFilter::default()).unwrap();
        assert_eq!(rows[1].kind, TransactionKind::Income);
        assert_eq!(rows[1].amount, 123_456);
        assert_eq!(rows[0].kind, TransactionKind::Expense);
        assert_eq!(rows[0].amount, -80_000);
    }

    #[test]
    fn test_type_column_wins_over_sign() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        // Magnitude-style export: positive amounts, direction in the type column
        let path = temp_csv(
            "date,description,amount,type\n\
             2024-03-02,Rent,800.00,Expense\n",
        );

        import_csv(&mut ledger, &path, &fallback()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let rows = ledger.transactions(&TransactionFilter::default()).unwrap();
        assert_eq!(rows[0].amount, -80_000);
        assert_eq!(rows[0].kind, TransactionKind::Expense);
    }

    #[test]
    fn test_import_skips_bad_rows_and_reports_lines() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv(
            "date,description,amount\n\
             2024-03-01,Paycheck,1000\n\
             not-a-date,Ghost,50\n\
             2024-03-03,,50\n\
             2024-03-04,Garbage,abc\n\
             2024-03-05,Coffee,-3.20\n",
        );

        let report = import_csv(&mut ledger, &path, &fallback()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.imported, 2);
        let lines: Vec<usize> = report.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(report.skipped[0].reason.contains("date"));
        assert_eq!(ledger.transaction_count().unwrap(), 2);
    }

    #[test]
    fn test_import_repairs_transfer_rows() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv(
            "date,description,amount,type,account\n\
             2024-03-15,To savings,-100.00,transfer,Everyday\n\
             2024-03-15,From checking,100.00,transfer,Rainy day\n\
             2024-03-16,Lonely leg,-50.00,transfer,Everyday\n",
        );

        let report = import_csv(&mut ledger, &path, &ImportOptions::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.transfer_pairs, 1);
        assert_eq!(report.total_written(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 4);

        let legs = ledger
            .transactions(&TransactionFilter {
                kind: Some(TransactionKind::TransferLeg),
                ..TransactionFilter::default()
            })
            .unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].linked_id, Some(legs[1].id));
        assert_eq!(legs[1].linked_id, Some(legs[0].id));
        assert_eq!(legs[0].amount + legs[1].amount, 0);

        let category = ledger.category(legs[0].category_id).unwrap();
        assert_eq!(category.name, TRANSFER_CATEGORY);
    }

    #[test]
    fn test_import_requires_resolvable_columns() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv("when,who,how much\n2024-03-01,Someone,10\n");

        let err = import_csv(&mut ledger, &path, &fallback()).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        // "when" is never claimed as a date column
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_import_requires_fallback_without_account_column() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv("date,description,amount\n2024-03-01,Paycheck,1000\n");

        let err = import_csv(&mut ledger, &path, &ImportOptions::default()).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::Validation(_))
        ));
        assert_eq!(ledger.transaction_count().unwrap(), 0);
    }

    #[test]
    fn test_explicit_mapping_skips_detection() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let path = temp_csv("col_a,col_b,col_c\n2024-03-01,Paycheck,1000\n");

        let options = ImportOptions {
            fallback_account: Some("Imported".to_string()),
            mapping: Some(ColumnMapping {
                date: 0,
                description: 1,
                amount: 2,
                kind: None,
                account: None,
                category: None,
            }),
        };
        let report = import_csv(&mut ledger, &path, &options).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.imported, 1);
        assert!(ledger.find_account_by_name("Imported").unwrap().is_some());
    }
}
