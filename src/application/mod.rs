mod error;
mod response;
mod transactions;
mod wallets;

pub use error::LedgerError;
pub use response::Envelope;
pub use transactions::{SWEEP_PAGE_SIZE, SweepOutcome, TransactionLedger};
pub use wallets::{CascadeSweep, WalletService};
