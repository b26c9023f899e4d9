//! Receipt lifecycle, reconciliation, and deduplication.

mod dedup;
mod reconcile;
mod status;

pub use dedup::fingerprint;
pub use reconcile::{reconcile, ReconcileError, ReconcilePolicy, ReconciledTotals};
pub use status::{ReceiptError, ReceiptStatus};
