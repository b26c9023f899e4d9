//! Points ledger domain types.
//!
//! The ledger is an append-only log of signed point deltas and the single
//! source of truth for balances. No cached balance field exists anywhere;
//! a balance is always a fold over entries.

mod types;

pub use types::{balance_of, LedgerEntryKind};
