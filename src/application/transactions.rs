use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    AggregateDelta, Cents, FileHandle, ImageSource, Transaction, TransactionDraft,
    TransactionFacts, TransactionId, TransactionKind, TransactionUpdate, WalletId,
};
use crate::storage::{Document, DocumentStore, FileHost, Query, SortDirection, WriteMode};

use super::LedgerError;
use super::wallets::WalletService;

pub(crate) const TRANSACTIONS: &str = "transactions";

/// FileHost folder for receipt images.
const RECEIPT_FOLDER: &str = "receipts";

/// One query page / delete batch during a cascade sweep, mirroring the
/// store's per-batch write limit.
pub const SWEEP_PAGE_SIZE: usize = 500;

/// Outcome of a cascade sweep over a deleted wallet's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub deleted: usize,
    pub batches: usize,
}

/// Service owning transaction documents. Every write keeps the owning
/// wallet's cached aggregates consistent by reversing the old contribution
/// and applying the new one in a single adjustment.
pub struct TransactionLedger<S, F> {
    store: Arc<S>,
    files: Arc<F>,
    wallets: WalletService<S, F>,
    sweep_page_size: usize,
}

impl<S, F> Clone for TransactionLedger<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            files: Arc::clone(&self.files),
            wallets: self.wallets.clone(),
            sweep_page_size: self.sweep_page_size,
        }
    }
}

impl<S: DocumentStore, F: FileHost> TransactionLedger<S, F> {
    pub fn new(store: Arc<S>, files: Arc<F>) -> Self {
        let wallets = WalletService::new(Arc::clone(&store), Arc::clone(&files));
        Self {
            store,
            files,
            wallets,
            sweep_page_size: SWEEP_PAGE_SIZE,
        }
    }

    /// Override the sweep page size. Mainly for exercising multi-page
    /// sweeps without thousands of documents.
    pub fn with_sweep_page_size(mut self, size: usize) -> Self {
        self.sweep_page_size = size.max(1);
        self
    }

    /// The wallet service sharing this ledger's store and file host.
    pub fn wallets(&self) -> &WalletService<S, F> {
        &self.wallets
    }

    /// Record a new transaction and apply its contribution to the wallet.
    ///
    /// Wallet existence is verified before the transaction document is
    /// written, so a bad wallet id commits nothing.
    pub async fn record_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<Transaction, LedgerError> {
        validate(draft.kind, draft.amount, draft.category.as_deref())?;
        let receipt = self.resolve_receipt(draft.receipt).await?;
        self.wallets.require_wallet(draft.wallet_id).await?;

        let tx = Transaction {
            id: Uuid::new_v4(),
            wallet_id: draft.wallet_id,
            owner: draft.owner,
            kind: draft.kind,
            amount: draft.amount,
            category: normalize_category(draft.kind, draft.category),
            description: draft.description,
            receipt,
            occurred_at: draft.occurred_at,
            created_at: Utc::now(),
        };

        self.write_transaction(&tx).await?;
        self.wallets.apply_delta(tx.wallet_id, tx.contribution()).await?;
        debug!(transaction = %tx.id, wallet = %tx.wallet_id, kind = %tx.kind, "recorded transaction");
        Ok(tx)
    }

    /// Replace an existing transaction and move the wallet aggregates by
    /// the reversal of the old contribution plus the new one.
    ///
    /// The resulting balance may go negative; overdraft is not an error.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, LedgerError> {
        validate(update.kind, update.amount, update.category.as_deref())?;
        let previous = self.require_transaction(id).await?;
        let receipt = self.resolve_receipt(update.receipt).await?;

        // Without the wallet document there is nothing to reconcile against.
        if self.wallets.get_wallet(previous.wallet_id).await?.is_none() {
            return Err(LedgerError::InsufficientWalletData(previous.wallet_id));
        }

        let tx = Transaction {
            id,
            wallet_id: previous.wallet_id,
            owner: previous.owner.clone(),
            kind: update.kind,
            amount: update.amount,
            category: normalize_category(update.kind, update.category),
            description: update.description,
            receipt,
            occurred_at: update.occurred_at,
            created_at: previous.created_at,
        };

        self.write_transaction(&tx).await?;
        let delta = previous.contribution().reversed().combine(tx.contribution());
        self.wallets.apply_delta(tx.wallet_id, delta).await?;
        debug!(transaction = %id, wallet = %tx.wallet_id, "updated transaction");
        Ok(tx)
    }

    /// Remove a transaction and reverse its contribution. `facts` stands in
    /// for the stored document when the caller already knows the prior
    /// wallet, kind and amount.
    pub async fn delete_transaction(
        &self,
        id: TransactionId,
        facts: Option<TransactionFacts>,
    ) -> Result<(), LedgerError> {
        let facts = match facts {
            Some(facts) => facts,
            None => TransactionFacts::from(&self.require_transaction(id).await?),
        };
        if self.wallets.get_wallet(facts.wallet_id).await?.is_none() {
            return Err(LedgerError::InsufficientWalletData(facts.wallet_id));
        }

        self.store.remove(TRANSACTIONS, &id.to_string()).await?;
        let reversal = AggregateDelta::contribution(facts.kind, facts.amount).reversed();
        self.wallets.apply_delta(facts.wallet_id, reversal).await?;
        debug!(transaction = %id, wallet = %facts.wallet_id, "deleted transaction");
        Ok(())
    }

    pub async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        match self.store.get(TRANSACTIONS, &id.to_string()).await? {
            Some(doc) => Ok(Some(decode_transaction(doc)?)),
            None => Ok(None),
        }
    }

    async fn require_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.get_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Transactions for one wallet, most recent first.
    pub async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let docs = self
            .store
            .query(
                TRANSACTIONS,
                Query::new()
                    .filter_eq("wallet_id", wallet_id.to_string())
                    .ordered_by("occurred_at", SortDirection::Descending),
            )
            .await?;
        docs.into_iter().map(decode_transaction).collect()
    }

    /// Delete every transaction referencing `wallet_id`, one atomic batch
    /// per query page, until a query comes back empty. Used as the cascade
    /// behind wallet deletion; no aggregate recomputation happens here since
    /// the wallet itself is already gone.
    pub async fn sweep_wallet_transactions(
        &self,
        wallet_id: WalletId,
    ) -> Result<SweepOutcome, LedgerError> {
        sweep_pages(self.store.as_ref(), wallet_id, self.sweep_page_size).await
    }

    async fn write_transaction(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let data = serde_json::to_value(tx).context("failed to encode transaction")?;
        self.store
            .put(TRANSACTIONS, &tx.id.to_string(), data, WriteMode::Replace)
            .await?;
        Ok(())
    }

    async fn resolve_receipt(
        &self,
        source: Option<ImageSource>,
    ) -> Result<Option<FileHandle>, LedgerError> {
        match source {
            None => Ok(None),
            Some(ImageSource::Uploaded(handle)) => Ok(Some(handle)),
            Some(ImageSource::Local(path)) => {
                Ok(Some(self.files.upload(&path, RECEIPT_FOLDER).await?))
            }
        }
    }
}

/// Cascade entry point used by wallet deletion; runs with the default page
/// size.
pub(crate) async fn sweep_wallet<S: DocumentStore>(
    store: &S,
    wallet_id: WalletId,
) -> Result<SweepOutcome, LedgerError> {
    sweep_pages(store, wallet_id, SWEEP_PAGE_SIZE).await
}

async fn sweep_pages<S: DocumentStore>(
    store: &S,
    wallet_id: WalletId,
    page_size: usize,
) -> Result<SweepOutcome, LedgerError> {
    let mut outcome = SweepOutcome {
        deleted: 0,
        batches: 0,
    };
    loop {
        let page = store
            .query(
                TRANSACTIONS,
                Query::new()
                    .filter_eq("wallet_id", wallet_id.to_string())
                    .with_limit(page_size),
            )
            .await?;
        if page.is_empty() {
            break;
        }
        let ids: Vec<String> = page.into_iter().map(|doc| doc.id).collect();
        store.remove_batch(TRANSACTIONS, &ids).await?;
        outcome.deleted += ids.len();
        outcome.batches += 1;
        debug!(wallet = %wallet_id, batch = ids.len(), "cascade deleted transaction batch");
    }
    Ok(outcome)
}

fn validate(
    kind: TransactionKind,
    amount: Cents,
    category: Option<&str>,
) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::Validation("amount must be positive".into()));
    }
    if kind == TransactionKind::Expense && category.is_none_or(|c| c.trim().is_empty()) {
        return Err(LedgerError::Validation(
            "expense transactions require a category".into(),
        ));
    }
    Ok(())
}

/// Income ignores any supplied category; expenses keep theirs.
fn normalize_category(kind: TransactionKind, category: Option<String>) -> Option<String> {
    match kind {
        TransactionKind::Expense => category,
        TransactionKind::Income => None,
    }
}

fn decode_transaction(doc: Document) -> Result<Transaction, LedgerError> {
    Ok(serde_json::from_value(doc.data).context("failed to decode transaction document")?)
}
