// Account entity
// An account is a bucket money moves through (checking, savings) or sits in
// (stocks, real estate, crypto). Its balance is derived by the aggregation
// layer from the transaction log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACCOUNT KIND
// ============================================================================

/// Classification shared by accounts and assets. Everything except
/// `Checking` counts toward the savings total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Day-to-day spending account
    Checking,

    /// Interest-bearing savings account
    Savings,

    /// Brokerage / stock holdings
    Stocks,

    /// Real estate holdings
    RealEstate,

    /// Cryptocurrency holdings
    Crypto,
}

impl AccountKind {
    pub const ALL: [AccountKind; 5] = [
        AccountKind::Checking,
        AccountKind::Savings,
        AccountKind::Stocks,
        AccountKind::RealEstate,
        AccountKind::Crypto,
    ];

    /// Storage form, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::Stocks => "stocks",
            AccountKind::RealEstate => "real_estate",
            AccountKind::Crypto => "crypto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checking" => Some(AccountKind::Checking),
            "savings" => Some(AccountKind::Savings),
            "stocks" => Some(AccountKind::Stocks),
            "real_estate" => Some(AccountKind::RealEstate),
            "crypto" => Some(AccountKind::Crypto),
            _ => None,
        }
    }

    /// Display form for tables and reports.
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Checking => "Checking",
            AccountKind::Savings => "Savings",
            AccountKind::Stocks => "Stocks",
            AccountKind::RealEstate => "Real estate",
            AccountKind::Crypto => "Crypto",
        }
    }

    pub fn is_checking(&self) -> bool {
        matches!(self, AccountKind::Checking)
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_str_round_trip() {
        for kind in AccountKind::ALL {
            assert_eq!(AccountKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AccountKind::parse("margin"), None);
        assert_eq!(AccountKind::parse("Checking"), None);
    }

    #[test]
    fn test_kind_serde_matches_storage_form() {
        for kind in AccountKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_only_checking_is_checking() {
        assert!(AccountKind::Checking.is_checking());
        for kind in [
            AccountKind::Savings,
            AccountKind::Stocks,
            AccountKind::RealEstate,
            AccountKind::Crypto,
        ] {
            assert!(!kind.is_checking());
        }
    }
}
