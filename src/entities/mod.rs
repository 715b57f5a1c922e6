// Entity models
// Plain data types owned by the ledger store. Identity is the SQLite rowid;
// balances are always derived from the transaction log, never cached here.

pub mod account;
pub mod asset;
pub mod category;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use asset::{Asset, AssetSnapshot};
pub use category::Category;
pub use transaction::{NewTransaction, Transaction, TransactionKind};
