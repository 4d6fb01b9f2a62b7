use thiserror::Error;

use crate::domain::{TransactionId, WalletId};
use crate::storage::UploadError;

/// Errors surfaced by the wallet and transaction services.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// The owning wallet's document could not be loaded while reversing or
    /// reapplying a contribution, so the aggregates cannot be kept
    /// consistent.
    #[error("wallet data unavailable for {0}")]
    InsufficientWalletData(WalletId),

    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
