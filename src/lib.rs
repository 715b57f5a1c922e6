// Tallybook - Core Library
// Exposes the ledger store, aggregation, transfer, and import/export
// modules for use in the CLI, the TUI, and tests

pub mod aggregate;
pub mod entities;
pub mod error;
pub mod export;
pub mod import;
pub mod money;
pub mod store;
pub mod transfer;

// Re-export commonly used types
pub use aggregate::{
    AccountBalance, CategoryTotal, MonthlyFlow, PatrimonyPoint, PatrimonySlice,
};
pub use entities::{
    Account, AccountKind, Asset, AssetSnapshot, Category, NewTransaction, Transaction,
    TransactionKind,
};
pub use error::{LedgerError, Result};
pub use export::{export_csv, export_json, restore_json, BackupDocument, RestoreSummary};
pub use import::{import_csv, ColumnMapping, ImportOptions, ImportReport, SkippedRow};
pub use money::{format_amount, parse_amount};
pub use store::{Ledger, TransactionFilter, TransactionPatch};
pub use transfer::{TransferRequest, TRANSFER_CATEGORY};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
