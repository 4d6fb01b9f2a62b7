use std::io::Write;

use anyhow::Result;

use crate::application::TransactionLedger;
use crate::domain::{WalletId, format_amount};
use crate::storage::{DocumentStore, FileHost};

/// Exporter for writing ledger data to CSV.
pub struct Exporter<'a, S, F> {
    ledger: &'a TransactionLedger<S, F>,
}

impl<'a, S: DocumentStore, F: FileHost> Exporter<'a, S, F> {
    pub fn new(ledger: &'a TransactionLedger<S, F>) -> Self {
        Self { ledger }
    }

    /// Export a wallet's transactions to CSV, most recent first. Returns
    /// the number of rows written.
    pub async fn export_wallet_csv<W: Write>(&self, wallet_id: WalletId, writer: W) -> Result<usize> {
        let transactions = self.ledger.list_for_wallet(wallet_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "kind",
            "amount",
            "category",
            "description",
            "receipt",
            "occurred_at",
            "created_at",
        ])?;

        let mut count = 0;
        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.kind.to_string(),
                format_amount(tx.amount),
                tx.category.clone().unwrap_or_default(),
                tx.description.clone().unwrap_or_default(),
                tx.receipt
                    .as_ref()
                    .map(|handle| handle.to_string())
                    .unwrap_or_default(),
                tx.occurred_at.to_rfc3339(),
                tx.created_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }
}
