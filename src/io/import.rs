use std::io::Read;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::application::TransactionLedger;
use crate::domain::{TransactionDraft, TransactionKind, WalletId, parse_amount};
use crate::storage::{DocumentStore, FileHost};

/// Result of an import run. Bad rows are reported, not fatal: every valid
/// row is recorded through the ledger so wallet aggregates stay consistent.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub imported: usize,
    pub issues: Vec<ImportIssue>,
}

/// A row that could not be imported, tagged with its line number.
#[derive(Debug, Clone)]
pub struct ImportIssue {
    pub line: usize,
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct Row {
    kind: String,
    amount: String,
    category: Option<String>,
    description: Option<String>,
    occurred_at: String,
}

/// Importer for loading transactions into a wallet from CSV with the
/// columns `kind,amount,category,description,occurred_at`.
pub struct Importer<'a, S, F> {
    ledger: &'a TransactionLedger<S, F>,
}

impl<'a, S: DocumentStore, F: FileHost> Importer<'a, S, F> {
    pub fn new(ledger: &'a TransactionLedger<S, F>) -> Self {
        Self { ledger }
    }

    pub async fn import_wallet_csv<R: Read>(
        &self,
        wallet_id: WalletId,
        owner: &str,
        reader: R,
    ) -> Result<ImportOutcome> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut outcome = ImportOutcome {
            imported: 0,
            issues: Vec::new(),
        };

        for (index, row) in csv_reader.deserialize::<Row>().enumerate() {
            // +2 accounts for the header line and zero-indexing.
            let line = index + 2;
            let issue = |error: String| ImportIssue { line, error };

            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    outcome.issues.push(issue(err.to_string()));
                    continue;
                }
            };

            let draft = match draft_from_row(wallet_id, owner, &row) {
                Ok(draft) => draft,
                Err(err) => {
                    outcome.issues.push(issue(err));
                    continue;
                }
            };

            match self.ledger.record_transaction(draft).await {
                Ok(_) => outcome.imported += 1,
                Err(err) => outcome.issues.push(issue(err.to_string())),
            }
        }

        Ok(outcome)
    }
}

fn draft_from_row(wallet_id: WalletId, owner: &str, row: &Row) -> Result<TransactionDraft, String> {
    let kind: TransactionKind = row.kind.parse().map_err(|err| format!("{err}"))?;
    let amount = parse_amount(&row.amount).map_err(|err| format!("{err}"))?;
    let occurred_at = parse_occurred(&row.occurred_at)
        .ok_or_else(|| format!("invalid date {:?}, expected RFC 3339 or YYYY-MM-DD", row.occurred_at))?;

    let mut draft = TransactionDraft::new(wallet_id, owner, kind, amount).occurred_at(occurred_at);
    if let Some(category) = &row.category {
        draft = draft.with_category(category.clone());
    }
    if let Some(description) = &row.description {
        draft = draft.with_description(description.clone());
    }
    Ok(draft)
}

fn parse_occurred(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}
