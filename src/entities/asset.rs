// Asset entity
// Valued holdings tracked outside the transaction log (real estate, stock
// portfolios, crypto). Every value change appends a timestamped snapshot,
// which is what the patrimony evolution series reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    /// Latest known value in minor units, never negative.
    pub current_value: i64,
    pub purchase_value: Option<i64>,
    pub purchase_date: Option<NaiveDate>,
}

impl Asset {
    /// Unrealized gain (or loss, negative) against the purchase value.
    pub fn gain_loss(&self) -> Option<i64> {
        self.purchase_value.map(|p| self.current_value - p)
    }
}

/// One point of an asset's value history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub id: i64,
    pub asset_id: i64,
    pub value: i64,
    pub recorded_at: DateTime<Utc>,
}
