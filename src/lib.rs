pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod storage;

pub use application::{Envelope, LedgerError, TransactionLedger, WalletService};
pub use domain::*;
pub use storage::{DocumentStore, FileHost};
