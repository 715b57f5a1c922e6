// Aggregation engine
// Read-only rollups computed in SQL over the ledger. Transfer legs move
// balances between accounts but never count as income or spending, so flow
// queries filter them out by kind while balance queries keep them.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::params;

use crate::entities::{Account, AccountKind, Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use crate::store::{account_from_row, tx_from_row, Ledger};

/// An account together with the signed sum of its transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub account: Account,
    pub balance: i64,
}

/// Income and spending for one calendar month. `expenses` is the positive
/// magnitude of the month's expense total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyFlow {
    pub year: i32,
    pub month: u32,
    pub income: i64,
    pub expenses: i64,
}

impl MonthlyFlow {
    pub fn net(&self) -> i64 {
        self.income - self.expenses
    }
}

/// Spending total for one category over a date range, as a positive magnitude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub total: i64,
}

/// One kind's slice of the patrimony. `share` is its fraction of the sum of
/// all positive slices.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrimonySlice {
    pub kind: AccountKind,
    pub total: i64,
    pub share: f64,
}

/// Patrimony at the end of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatrimonyPoint {
    pub year: i32,
    pub month: u32,
    pub total: i64,
}

impl Ledger {
    // ========================================================================
    // BALANCES
    // ========================================================================

    /// Signed sum of one account's transactions.
    pub fn account_balance(&self, account_id: i64) -> Result<i64> {
        self.account(account_id)?;
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )?)
    }

    /// Every account with its balance, ordered by name. Accounts without
    /// transactions show a zero balance.
    pub fn balances(&self) -> Result<Vec<AccountBalance>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, a.kind, a.created_at, COALESCE(SUM(t.amount), 0)
             FROM accounts a
             LEFT JOIN transactions t ON t.account_id = a.id
             GROUP BY a.id
             ORDER BY a.name",
        )?;
        let balances = stmt
            .query_map([], |row| {
                Ok(AccountBalance {
                    account: account_from_row(row)?,
                    balance: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(balances)
    }

    /// Everything set aside: balances of all non-checking accounts plus the
    /// current value of all assets.
    pub fn savings_total(&self) -> Result<i64> {
        let accounts: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(t.amount), 0)
             FROM transactions t
             JOIN accounts a ON a.id = t.account_id
             WHERE a.kind != ?1",
            params![AccountKind::Checking.as_str()],
            |row| row.get(0),
        )?;
        let assets: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(current_value), 0) FROM assets",
            [],
            |row| row.get(0),
        )?;
        Ok(accounts + assets)
    }

    /// All account balances plus the current value of all assets.
    pub fn patrimony_total(&self) -> Result<i64> {
        let accounts: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions",
            [],
            |row| row.get(0),
        )?;
        let assets: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(current_value), 0) FROM assets",
            [],
            |row| row.get(0),
        )?;
        Ok(accounts + assets)
    }

    // ========================================================================
    // FLOW
    // ========================================================================

    /// Income and spending per month for the `months_back` months ending in
    /// the current one, oldest first. Months without activity appear with
    /// zeroes.
    pub fn monthly_flow(&self, months_back: u32) -> Result<Vec<MonthlyFlow>> {
        let today = Utc::now().date_naive();
        self.monthly_flow_ending(today, months_back)
    }

    /// Same as `monthly_flow` anchored at an explicit end month.
    pub fn monthly_flow_ending(
        &self,
        end: NaiveDate,
        months_back: u32,
    ) -> Result<Vec<MonthlyFlow>> {
        if months_back == 0 {
            return Ok(Vec::new());
        }
        let (start_year, start_month) =
            months_before(end.year(), end.month(), months_back - 1);

        let mut stmt = self.conn.prepare(
            "SELECT substr(date, 1, 7) AS ym,
                    SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END) AS income,
                    SUM(CASE WHEN kind = 'expense' THEN -amount ELSE 0 END) AS expenses
             FROM transactions
             WHERE kind != 'transfer' AND date >= ?1
             GROUP BY ym",
        )?;
        let rows = stmt
            .query_map(params![month_key(start_year, start_month) + "-01"], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let by_month: HashMap<String, (i64, i64)> = rows
            .into_iter()
            .map(|(ym, income, expenses)| (ym, (income, expenses)))
            .collect();

        let mut flows = Vec::with_capacity(months_back as usize);
        let (mut year, mut month) = (start_year, start_month);
        for _ in 0..months_back {
            let (income, expenses) = by_month
                .get(&month_key(year, month))
                .copied()
                .unwrap_or((0, 0));
            flows.push(MonthlyFlow { year, month, income, expenses });
            (year, month) = month_after(year, month);
        }
        Ok(flows)
    }

    /// Flow for a single calendar month.
    pub fn month_summary(&self, year: i32, month: u32) -> Result<MonthlyFlow> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::validation(format!("invalid month {month}")));
        }
        let (income, expenses) = self.conn.query_row(
            "SELECT SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END),
                    SUM(CASE WHEN kind = 'expense' THEN -amount ELSE 0 END)
             FROM transactions
             WHERE kind != 'transfer' AND substr(date, 1, 7) = ?1",
            params![month_key(year, month)],
            |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                    row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                ))
            },
        )?;
        Ok(MonthlyFlow { year, month, income, expenses })
    }

    // ========================================================================
    // SPENDING
    // ========================================================================

    /// The `limit` largest expenses in a date range, largest first. Equal
    /// amounts keep insertion order.
    pub fn top_expenses(
        &self,
        limit: u32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, description, amount, kind, account_id, category_id, linked_id
             FROM transactions
             WHERE kind = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY amount, id
             LIMIT ?4",
        )?;
        let expenses = stmt
            .query_map(
                params![
                    TransactionKind::Expense.as_str(),
                    from.to_string(),
                    to.to_string(),
                    limit,
                ],
                tx_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(expenses)
    }

    /// Spending grouped by category over a date range, biggest first.
    pub fn expenses_by_category(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, SUM(-t.amount) AS total
             FROM transactions t
             JOIN categories c ON c.id = t.category_id
             WHERE t.kind = ?1 AND t.date >= ?2 AND t.date <= ?3
             GROUP BY c.id
             ORDER BY total DESC, c.name",
        )?;
        let totals = stmt
            .query_map(
                params![
                    TransactionKind::Expense.as_str(),
                    from.to_string(),
                    to.to_string(),
                ],
                |row| {
                    Ok(CategoryTotal {
                        category_id: row.get(0)?,
                        name: row.get(1)?,
                        total: row.get(2)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(totals)
    }

    // ========================================================================
    // PATRIMONY
    // ========================================================================

    /// Positive patrimony broken down by kind, biggest slice first. Kinds
    /// whose combined total is zero or negative are dropped; shares are
    /// fractions of the remaining sum, so they add up to 1 whenever the
    /// breakdown is non-empty.
    pub fn patrimony_distribution(&self) -> Result<Vec<PatrimonySlice>> {
        let mut by_kind: HashMap<AccountKind, i64> = HashMap::new();
        for balance in self.balances()? {
            *by_kind.entry(balance.account.kind).or_insert(0) += balance.balance;
        }
        for asset in self.assets()? {
            *by_kind.entry(asset.kind).or_insert(0) += asset.current_value;
        }

        let mut slices: Vec<(AccountKind, i64)> = by_kind
            .into_iter()
            .filter(|(_, total)| *total > 0)
            .collect();
        let grand_total: i64 = slices.iter().map(|(_, total)| total).sum();
        if grand_total == 0 {
            return Ok(Vec::new());
        }
        slices.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.as_str().cmp(b.0.as_str())));

        Ok(slices
            .into_iter()
            .map(|(kind, total)| PatrimonySlice {
                kind,
                total,
                share: total as f64 / grand_total as f64,
            })
            .collect())
    }

    /// End-of-month patrimony for the `months_back` months ending in the
    /// current one, oldest first. Each asset counts at its latest snapshot
    /// on or before the month end, or not at all if none exists yet.
    pub fn patrimony_evolution(&self, months_back: u32) -> Result<Vec<PatrimonyPoint>> {
        let today = Utc::now().date_naive();
        self.patrimony_evolution_ending(today, months_back)
    }

    /// Same as `patrimony_evolution` anchored at an explicit end month.
    pub fn patrimony_evolution_ending(
        &self,
        end: NaiveDate,
        months_back: u32,
    ) -> Result<Vec<PatrimonyPoint>> {
        if months_back == 0 {
            return Ok(Vec::new());
        }
        let (mut year, mut month) = months_before(end.year(), end.month(), months_back - 1);

        let mut points = Vec::with_capacity(months_back as usize);
        for _ in 0..months_back {
            // Everything strictly before the first day of the next month
            let (next_year, next_month) = month_after(year, month);
            let boundary = month_key(next_year, next_month) + "-01";

            let accounts: i64 = self.conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE date < ?1",
                params![boundary],
                |row| row.get(0),
            )?;
            let assets: i64 = self.conn.query_row(
                "SELECT COALESCE(SUM(v), 0) FROM (
                    SELECT (SELECT s.value FROM asset_snapshots s
                            WHERE s.asset_id = a.id AND s.recorded_at < ?1
                            ORDER BY s.recorded_at DESC, s.id DESC LIMIT 1) AS v
                    FROM assets a
                 )",
                params![boundary],
                |row| row.get(0),
            )?;

            points.push(PatrimonyPoint { year, month, total: accounts + assets });
            (year, month) = (next_year, next_month);
        }
        Ok(points)
    }
}

fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 - back as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

fn month_after(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
