// Transaction entity
// One signed ledger movement. Amounts are minor units; the sign must agree
// with the kind (income positive, expense negative). Transfer legs always
// come in linked pairs and only the transfer coordinator writes them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION KIND
// ============================================================================

/// Closed set of movement kinds. Keeping this an enum (not a string) makes
/// the transfer-exclusion rule in the flow aggregates a checked `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in (positive amount)
    Income,

    /// Money going out (negative amount)
    Expense,

    /// One leg of a two-account transfer (either sign)
    #[serde(rename = "transfer")]
    TransferLeg,
}

impl TransactionKind {
    /// Storage form, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::TransferLeg => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            "transfer" => Some(TransactionKind::TransferLeg),
            _ => None,
        }
    }

    /// Whether a signed amount is legal for this kind.
    pub fn allows_sign(&self, amount: i64) -> bool {
        match self {
            TransactionKind::Income => amount > 0,
            TransactionKind::Expense => amount < 0,
            TransactionKind::TransferLeg => amount != 0,
        }
    }
}

// ============================================================================
// TRANSACTION ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Signed amount in minor units.
    pub amount: i64,
    pub kind: TransactionKind,
    pub account_id: i64,
    pub category_id: i64,
    /// The paired leg's id when `kind == TransferLeg`, otherwise `None`.
    pub linked_id: Option<i64>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_transfer_leg(&self) -> bool {
        self.kind == TransactionKind::TransferLeg
    }

    /// Magnitude of the movement, sign stripped.
    pub fn abs_amount(&self) -> i64 {
        self.amount.abs()
    }
}

/// Input for creating a plain (non-transfer) transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: i64,
    pub kind: TransactionKind,
    pub account_id: i64,
    pub category_id: i64,
}
