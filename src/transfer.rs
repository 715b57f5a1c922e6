// Transfer coordinator
// A transfer is two linked legs written in one SQLite transaction: an
// outgoing negative leg and an incoming positive leg of equal magnitude on
// the same date. Legs never exist alone; edits and deletes mirror the pair.

use chrono::NaiveDate;
use rusqlite::params;

use crate::entities::{NewTransaction, Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use crate::store::{validate_transaction_fields, Ledger, TransactionPatch};

/// Category every transfer leg lands in, created on first use.
pub const TRANSFER_CATEGORY: &str = "Transfers";

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_account: i64,
    pub to_account: i64,
    /// Moved amount in minor units, strictly positive.
    pub amount: i64,
    pub date: NaiveDate,
    pub description: String,
}

impl Ledger {
    /// Move money between two accounts. Returns (outgoing, incoming) legs.
    pub fn transfer(&mut self, request: &TransferRequest) -> Result<(Transaction, Transaction)> {
        if request.from_account == request.to_account {
            return Err(LedgerError::invalid_transfer(format!(
                "source and destination are the same account ({})",
                request.from_account
            )));
        }
        if request.amount <= 0 {
            return Err(LedgerError::validation("transfer amount must be positive"));
        }

        let description = if request.description.trim().is_empty() {
            "Transfer".to_string()
        } else {
            request.description.trim().to_string()
        };
        let category_id = self.ensure_transfer_category()?;

        let outgoing = NewTransaction {
            date: request.date,
            description: description.clone(),
            amount: -request.amount,
            kind: TransactionKind::TransferLeg,
            account_id: request.from_account,
            category_id,
        };
        let incoming = NewTransaction {
            amount: request.amount,
            account_id: request.to_account,
            ..outgoing.clone()
        };

        let (out_id, in_id) = self.link_leg_pair(&outgoing, &incoming)?;
        Ok((self.transaction(out_id)?, self.transaction(in_id)?))
    }

    /// Id of the built-in transfer category, created on demand.
    pub fn ensure_transfer_category(&mut self) -> Result<i64> {
        if let Some(category) = self.find_category_by_name(TRANSFER_CATEGORY)? {
            return Ok(category.id);
        }
        Ok(self.add_category(TRANSFER_CATEGORY, None)?.id)
    }

    /// Insert two legs and cross-link them atomically. Import re-pairs CSV
    /// rows through here so legs keep their own descriptions and categories.
    pub(crate) fn link_leg_pair(
        &mut self,
        outgoing: &NewTransaction,
        incoming: &NewTransaction,
    ) -> Result<(i64, i64)> {
        if outgoing.kind != TransactionKind::TransferLeg
            || incoming.kind != TransactionKind::TransferLeg
        {
            return Err(LedgerError::invalid_transfer(
                "both legs must have the transfer kind",
            ));
        }
        if outgoing.amount >= 0 {
            return Err(LedgerError::invalid_transfer(
                "the outgoing leg must carry a negative amount",
            ));
        }
        if incoming.amount != -outgoing.amount {
            return Err(LedgerError::invalid_transfer(
                "legs must have equal magnitude and opposite sign",
            ));
        }
        if outgoing.date != incoming.date {
            return Err(LedgerError::invalid_transfer("legs must share a date"));
        }
        if outgoing.account_id == incoming.account_id {
            return Err(LedgerError::invalid_transfer(format!(
                "source and destination are the same account ({})",
                outgoing.account_id
            )));
        }
        for leg in [outgoing, incoming] {
            validate_transaction_fields(&leg.description, leg.amount, leg.kind)?;
            self.check_transaction_refs(leg.account_id, leg.category_id)?;
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO transactions (date, description, amount, kind, account_id, category_id, linked_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
            params![
                outgoing.date.to_string(),
                outgoing.description.trim(),
                outgoing.amount,
                outgoing.kind.as_str(),
                outgoing.account_id,
                outgoing.category_id,
            ],
        )?;
        let out_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO transactions (date, description, amount, kind, account_id, category_id, linked_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                incoming.date.to_string(),
                incoming.description.trim(),
                incoming.amount,
                incoming.kind.as_str(),
                incoming.account_id,
                incoming.category_id,
                out_id,
            ],
        )?;
        let in_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE transactions SET linked_id = ?1 WHERE id = ?2",
            params![in_id, out_id],
        )?;
        tx.commit()?;
        Ok((out_id, in_id))
    }

    /// Mirror a patch across both legs. Only date, description, and amount
    /// may change; each leg keeps its own sign, so patching the amount on
    /// either leg sets the pair's magnitude.
    pub(crate) fn apply_leg_patch(
        &mut self,
        leg: &Transaction,
        patch: &TransactionPatch,
    ) -> Result<Transaction> {
        if patch.kind.is_some() {
            return Err(LedgerError::invalid_transfer(
                "the kind of a transfer leg cannot change",
            ));
        }
        if patch.account_id.is_some() || patch.category_id.is_some() {
            return Err(LedgerError::invalid_transfer(
                "a transfer leg cannot move account or category; delete the transfer and recreate it",
            ));
        }
        let pair_id = leg.linked_id.ok_or_else(|| {
            LedgerError::invalid_transfer(format!("transaction {} has no paired leg", leg.id))
        })?;
        let pair = self.transaction(pair_id)?;

        let date = patch.date.unwrap_or(leg.date);
        let description = patch
            .description
            .clone()
            .unwrap_or_else(|| leg.description.clone());
        let magnitude = match patch.amount {
            Some(amount) => amount
                .checked_abs()
                .filter(|m| *m > 0)
                .ok_or_else(|| LedgerError::validation("transfer amount must not be zero"))?,
            None => leg.amount.abs(),
        };
        validate_transaction_fields(&description, leg.amount.signum() * magnitude, leg.kind)?;

        let tx = self.conn.transaction()?;
        for (id, sign) in [(leg.id, leg.amount.signum()), (pair.id, pair.amount.signum())] {
            tx.execute(
                "UPDATE transactions SET date = ?1, description = ?2, amount = ?3 WHERE id = ?4",
                params![date.to_string(), description.trim(), sign * magnitude, id],
            )?;
        }
        tx.commit()?;
        self.transaction(leg.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AccountKind;
    use crate::store::TransactionFilter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_account_ledger() -> (Ledger, i64, i64) {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let checking = ledger.add_account("Everyday", AccountKind::Checking).unwrap();
        let savings = ledger.add_account("Rainy day", AccountKind::Savings).unwrap();
        (ledger, checking.id, savings.id)
    }

    fn request(from: i64, to: i64, amount: i64) -> TransferRequest {
        TransferRequest {
            from_account: from,
            to_account: to,
            amount,
            date: date(2024, 3, 15),
            description: "Monthly savings".to_string(),
        }
    }

    #[test]
    fn test_transfer_creates_linked_pair() {
        let (mut ledger, checking, savings) = two_account_ledger();
        let (out_leg, in_leg) = ledger.transfer(&request(checking, savings, 10_000)).unwrap();

        assert_eq!(out_leg.amount, -10_000);
        assert_eq!(in_leg.amount, 10_000);
        assert_eq!(out_leg.linked_id, Some(in_leg.id));
        assert_eq!(in_leg.linked_id, Some(out_leg.id));
        assert_eq!(out_leg.date, in_leg.date);
        assert_eq!(out_leg.account_id, checking);
        assert_eq!(in_leg.account_id, savings);
        assert!(out_leg.is_transfer_leg() && in_leg.is_transfer_leg());

        let category = ledger.category(out_leg.category_id).unwrap();
        assert_eq!(category.name, TRANSFER_CATEGORY);
    }

    #[test]
    fn test_transfer_category_created_once() {
        let (mut ledger, checking, savings) = two_account_ledger();
        ledger.transfer(&request(checking, savings, 1_000)).unwrap();
        ledger.transfer(&request(savings, checking, 2_000)).unwrap();

        let transfer_categories = ledger
            .categories()
            .unwrap()
            .into_iter()
            .filter(|c| c.name == TRANSFER_CATEGORY)
            .count();
        assert_eq!(transfer_categories, 1);
    }

    #[test]
    fn test_same_account_rejected() {
        let (mut ledger, checking, _) = two_account_ledger();
        let err = ledger.transfer(&request(checking, checking, 1_000)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransfer(_)));
        assert_eq!(ledger.transaction_count().unwrap(), 0);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let (mut ledger, checking, savings) = two_account_ledger();
        assert!(matches!(
            ledger.transfer(&request(checking, savings, 0)).unwrap_err(),
            LedgerError::Validation(_)
        ));
        assert!(matches!(
            ledger.transfer(&request(checking, savings, -500)).unwrap_err(),
            LedgerError::Validation(_)
        ));
        assert_eq!(ledger.transaction_count().unwrap(), 0);
    }

    #[test]
    fn test_missing_account_rejected() {
        let (mut ledger, checking, _) = two_account_ledger();
        let err = ledger.transfer(&request(checking, 999, 1_000)).unwrap_err();
        assert!(matches!(err, LedgerError::ReferentialViolation(_)));
        assert_eq!(ledger.transaction_count().unwrap(), 0);
    }

    #[test]
    fn test_deleting_either_leg_removes_both() {
        let (mut ledger, checking, savings) = two_account_ledger();

        let (out_leg, in_leg) = ledger.transfer(&request(checking, savings, 5_000)).unwrap();
        ledger.delete_transaction(out_leg.id).unwrap();
        assert_eq!(ledger.transaction_count().unwrap(), 0);
        assert!(ledger.transaction(in_leg.id).is_err());

        let (out_leg, in_leg) = ledger.transfer(&request(checking, savings, 5_000)).unwrap();
        ledger.delete_transaction(in_leg.id).unwrap();
        assert_eq!(ledger.transaction_count().unwrap(), 0);
        assert!(ledger.transaction(out_leg.id).is_err());
    }

    #[test]
    fn test_leg_patch_mirrors_pair() {
        let (mut ledger, checking, savings) = two_account_ledger();
        let (out_leg, in_leg) = ledger.transfer(&request(checking, savings, 5_000)).unwrap();

        let patched = ledger
            .update_transaction(
                in_leg.id,
                &TransactionPatch {
                    amount: Some(7_500),
                    date: Some(date(2024, 3, 20)),
                    description: Some("Bigger stash".to_string()),
                    ..TransactionPatch::default()
                },
            )
            .unwrap();
        assert_eq!(patched.amount, 7_500);

        let out_after = ledger.transaction(out_leg.id).unwrap();
        assert_eq!(out_after.amount, -7_500);
        assert_eq!(out_after.date, date(2024, 3, 20));
        assert_eq!(out_after.description, "Bigger stash");
    }

    #[test]
    fn test_leg_patch_amount_sets_magnitude_regardless_of_sign() {
        let (mut ledger, checking, savings) = two_account_ledger();
        let (out_leg, in_leg) = ledger.transfer(&request(checking, savings, 5_000)).unwrap();

        // Patching the outgoing leg with a negative amount keeps orientation
        ledger
            .update_transaction(
                out_leg.id,
                &TransactionPatch {
                    amount: Some(-2_000),
                    ..TransactionPatch::default()
                },
            )
            .unwrap();
        assert_eq!(ledger.transaction(out_leg.id).unwrap().amount, -2_000);
        assert_eq!(ledger.transaction(in_leg.id).unwrap().amount, 2_000);
    }

    #[test]
    fn test_leg_patch_rejects_structural_changes() {
        let (mut ledger, checking, savings) = two_account_ledger();
        let (out_leg, _) = ledger.transfer(&request(checking, savings, 5_000)).unwrap();
        let other = ledger.add_account("Broker", AccountKind::Stocks).unwrap();

        for patch in [
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                ..TransactionPatch::default()
            },
            TransactionPatch {
                account_id: Some(other.id),
                ..TransactionPatch::default()
            },
            TransactionPatch {
                category_id: Some(1),
                ..TransactionPatch::default()
            },
        ] {
            let err = ledger.update_transaction(out_leg.id, &patch).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidTransfer(_)));
        }
    }

    #[test]
    fn test_cascade_account_delete_takes_far_leg() {
        let (mut ledger, checking, savings) = two_account_ledger();
        ledger.transfer(&request(checking, savings, 5_000)).unwrap();

        ledger.delete_account(checking, true).unwrap();

        // The savings-side leg must not survive as an orphan
        assert_eq!(ledger.transaction_count().unwrap(), 0);
        let remaining = ledger
            .transactions(&TransactionFilter {
                account_id: Some(savings),
                ..TransactionFilter::default()
            })
            .unwrap();
        assert!(remaining.is_empty());
    }
}
