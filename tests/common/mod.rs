// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use billfold::application::TransactionLedger;
use billfold::domain::{
    Cents, FileHandle, TransactionDraft, TransactionKind, WalletDraft, WalletId,
};
use billfold::storage::{FileHost, MemoryStore, UploadError};
use chrono::{DateTime, NaiveDate, Utc};

pub const OWNER: &str = "user-1";

/// File host stub that mints handles without touching any filesystem.
pub struct StubFileHost {
    pub fail: bool,
}

impl FileHost for StubFileHost {
    async fn upload(&self, file: &Path, folder: &str) -> Result<FileHandle, UploadError> {
        if self.fail {
            return Err(UploadError("stub host refused the upload".into()));
        }
        Ok(FileHandle::new(format!("{folder}/{}", file.display())))
    }
}

/// Ledger over an in-memory store, plus the store handle for tests that
/// need to poke at raw documents.
pub fn test_ledger() -> (TransactionLedger<MemoryStore, StubFileHost>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let ledger = TransactionLedger::new(Arc::clone(&store), Arc::new(StubFileHost { fail: false }));
    (ledger, store)
}

/// Same ledger, but every upload fails.
pub fn failing_upload_ledger() -> (TransactionLedger<MemoryStore, StubFileHost>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let ledger = TransactionLedger::new(Arc::clone(&store), Arc::new(StubFileHost { fail: true }));
    (ledger, store)
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn wallet_draft(name: &str) -> WalletDraft {
    WalletDraft::new(OWNER, name)
}

pub fn income(wallet: WalletId, amount: Cents) -> TransactionDraft {
    TransactionDraft::new(wallet, OWNER, TransactionKind::Income, amount)
}

pub fn expense(wallet: WalletId, amount: Cents, category: &str) -> TransactionDraft {
    TransactionDraft::new(wallet, OWNER, TransactionKind::Expense, amount).with_category(category)
}
