use std::sync::Arc;

use anyhow::{Context, anyhow};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::{
    AggregateDelta, FileHandle, ImageSource, Wallet, WalletDraft, WalletId, WalletPatch,
};
use crate::storage::{Document, DocumentStore, FileHost, Query, SortDirection, WriteMode};

use super::transactions::{self, SweepOutcome};
use super::LedgerError;

pub(crate) const WALLETS: &str = "wallets";

/// FileHost folder for wallet icons.
const ICON_FOLDER: &str = "wallets";

/// Service owning wallet documents and their cached aggregate fields.
///
/// Creation assigns the server-owned fields; updates are merge-patches that
/// can never touch the aggregates. Aggregate changes only enter through
/// [`apply_delta`](Self::apply_delta), driven by the transaction ledger.
pub struct WalletService<S, F> {
    store: Arc<S>,
    files: Arc<F>,
}

impl<S, F> Clone for WalletService<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            files: Arc::clone(&self.files),
        }
    }
}

/// Handle on a cascade sweep running in the background.
///
/// Deleting a wallet starts the transaction sweep as its own task; the
/// caller chooses whether to [`join`](Self::join) the outcome or drop the
/// handle and let the sweep finish on its own.
pub struct CascadeSweep {
    wallet_id: WalletId,
    task: JoinHandle<Result<SweepOutcome, LedgerError>>,
}

impl CascadeSweep {
    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    /// Wait for the sweep to finish and return its outcome.
    pub async fn join(self) -> Result<SweepOutcome, LedgerError> {
        self.task
            .await
            .map_err(|err| LedgerError::Store(anyhow!("cascade sweep task failed: {err}")))?
    }

    /// Explicit fire-and-forget: the sweep keeps running, unobserved.
    pub fn detach(self) {}
}

impl<S: DocumentStore, F: FileHost> WalletService<S, F> {
    pub fn new(store: Arc<S>, files: Arc<F>) -> Self {
        Self { store, files }
    }

    /// Create a wallet. Balance and lifetime totals always start at zero
    /// and `created_at` is assigned here, whatever the caller intended.
    pub async fn create_wallet(&self, draft: WalletDraft) -> Result<Wallet, LedgerError> {
        if draft.name.trim().is_empty() {
            return Err(LedgerError::Validation("wallet name is required".into()));
        }
        // Upload before any document write: a failed upload aborts the whole
        // operation with nothing committed.
        let icon = match draft.icon {
            Some(source) => Some(self.upload_icon(source).await?),
            None => None,
        };

        let mut wallet = Wallet::new(draft.owner, draft.name);
        wallet.icon = icon;

        let data = serde_json::to_value(&wallet).context("failed to encode wallet")?;
        self.store
            .put(WALLETS, &wallet.id.to_string(), data, WriteMode::Replace)
            .await?;
        debug!(wallet = %wallet.id, name = %wallet.name, "created wallet");
        Ok(wallet)
    }

    /// Merge the supplied fields into an existing wallet. Unsupplied fields
    /// and the cached aggregates keep their prior values.
    pub async fn update_wallet(
        &self,
        id: WalletId,
        patch: WalletPatch,
    ) -> Result<Wallet, LedgerError> {
        let icon = match patch.icon {
            Some(source) => Some(self.upload_icon(source).await?),
            None => None,
        };
        let mut wallet = self.require_wallet(id).await?;

        let mut fields = serde_json::Map::new();
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(LedgerError::Validation("wallet name is required".into()));
            }
            fields.insert("name".into(), Value::from(name.clone()));
            wallet.name = name;
        }
        if let Some(handle) = icon {
            fields.insert("icon".into(), Value::from(handle.as_str()));
            wallet.icon = Some(handle);
        }
        if fields.is_empty() {
            return Ok(wallet);
        }

        self.store
            .put(WALLETS, &id.to_string(), Value::Object(fields), WriteMode::Merge)
            .await?;
        debug!(wallet = %id, "patched wallet");
        Ok(wallet)
    }

    pub async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, LedgerError> {
        match self.store.get(WALLETS, &id.to_string()).await? {
            Some(doc) => Ok(Some(decode_wallet(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn require_wallet(&self, id: WalletId) -> Result<Wallet, LedgerError> {
        self.get_wallet(id)
            .await?
            .ok_or(LedgerError::WalletNotFound(id))
    }

    pub async fn find_by_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<Wallet>, LedgerError> {
        let docs = self
            .store
            .query(
                WALLETS,
                Query::new()
                    .filter_eq("owner", owner)
                    .filter_eq("name", name)
                    .with_limit(1),
            )
            .await?;
        docs.into_iter().next().map(decode_wallet).transpose()
    }

    /// All wallets belonging to one user, newest first.
    pub async fn list_wallets(&self, owner: &str) -> Result<Vec<Wallet>, LedgerError> {
        let docs = self
            .store
            .query(
                WALLETS,
                Query::new()
                    .filter_eq("owner", owner)
                    .ordered_by("created_at", SortDirection::Descending),
            )
            .await?;
        docs.into_iter().map(decode_wallet).collect()
    }

    /// Delete the wallet document and start the transaction cascade in the
    /// background. The returned handle resolves once every transaction
    /// referencing the wallet is gone.
    ///
    /// The document delete is idempotent: deleting an unknown wallet
    /// succeeds and the cascade sweeps nothing.
    pub async fn delete_wallet(&self, id: WalletId) -> Result<CascadeSweep, LedgerError> {
        self.store.remove(WALLETS, &id.to_string()).await?;
        debug!(wallet = %id, "deleted wallet, starting cascade sweep");

        let store = Arc::clone(&self.store);
        let task =
            tokio::spawn(async move { transactions::sweep_wallet(store.as_ref(), id).await });
        Ok(CascadeSweep {
            wallet_id: id,
            task,
        })
    }

    /// Move the wallet's cached aggregates by a signed delta, through the
    /// store's atomic numeric adjustment. Concurrent deltas do not lose
    /// increments; whole-document writes remain last-write-wins.
    pub(crate) async fn apply_delta(
        &self,
        id: WalletId,
        delta: AggregateDelta,
    ) -> Result<(), LedgerError> {
        if delta.is_zero() {
            return Ok(());
        }
        self.store
            .adjust(
                WALLETS,
                &id.to_string(),
                &[
                    ("amount", delta.amount),
                    ("total_income", delta.income),
                    ("total_expenses", delta.expenses),
                ],
            )
            .await?;
        Ok(())
    }

    async fn upload_icon(&self, source: ImageSource) -> Result<FileHandle, LedgerError> {
        match source {
            ImageSource::Uploaded(handle) => Ok(handle),
            ImageSource::Local(path) => Ok(self.files.upload(&path, ICON_FOLDER).await?),
        }
    }
}

fn decode_wallet(doc: Document) -> Result<Wallet, LedgerError> {
    Ok(serde_json::from_value(doc.data).context("failed to decode wallet document")?)
}
