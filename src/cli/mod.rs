use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::application::{Envelope, LedgerError, TransactionLedger};
use crate::domain::{
    ImageSource, Transaction, TransactionDraft, TransactionId, TransactionKind, TransactionUpdate,
    Wallet, WalletDraft, WalletPatch, format_amount, parse_amount,
};
use crate::io::{Exporter, Importer};
use crate::storage::{DiskFileHost, JsonStore};

type LocalLedger = TransactionLedger<JsonStore, DiskFileHost>;

/// Billfold - wallet and transaction ledger
#[derive(Parser)]
#[command(name = "billfold")]
#[command(about = "Track wallets and transactions over a local document store")]
#[command(version)]
pub struct Cli {
    /// Store file path
    #[arg(short, long, default_value = "billfold.json")]
    pub database: String,

    /// Directory where uploaded icons and receipts are kept
    #[arg(long, default_value = "billfold-media")]
    pub media_dir: String,

    /// Acting user recorded on wallets and transactions
    #[arg(short, long, default_value = "local")]
    pub user: String,

    /// Print results as JSON envelopes instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Transaction commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Export a wallet's transactions to CSV
    Export {
        /// Wallet name
        wallet: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import transactions from CSV into a wallet
    Import {
        /// Wallet name
        wallet: String,

        /// Input CSV file with columns kind,amount,category,description,occurred_at
        #[arg(short, long)]
        input: String,
    },
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Wallet name
        name: String,

        /// Icon image to upload
        #[arg(long)]
        icon: Option<PathBuf>,
    },

    /// List your wallets, newest first
    List,

    /// Show detailed wallet information
    Show {
        /// Wallet name
        name: String,
    },

    /// Update wallet fields; anything not passed keeps its value
    Update {
        /// Wallet name
        name: String,

        /// New wallet name
        #[arg(long)]
        rename: Option<String>,

        /// New icon image to upload
        #[arg(long)]
        icon: Option<PathBuf>,
    },

    /// Delete a wallet and every transaction referencing it
    Delete {
        /// Wallet name
        name: String,

        /// Leave the cascade running in the background instead of waiting
        #[arg(long)]
        detach: bool,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record a transaction against a wallet
    Add {
        /// Wallet name
        wallet: String,

        /// Transaction kind: income or expense
        kind: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Category (required for expenses)
        #[arg(short, long)]
        category: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Date of the transaction (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Receipt image to upload
        #[arg(long)]
        receipt: Option<PathBuf>,
    },

    /// Edit a transaction; anything not passed keeps its stored value
    Edit {
        /// Transaction id
        id: String,

        #[arg(long)]
        kind: Option<String>,

        #[arg(long)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Date of the transaction (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Receipt image to upload
        #[arg(long)]
        receipt: Option<PathBuf>,

        /// Remove the stored receipt
        #[arg(long, conflicts_with = "receipt")]
        clear_receipt: bool,
    },

    /// Delete a transaction and reverse its wallet contribution
    Delete {
        /// Transaction id
        id: String,
    },

    /// List a wallet's transactions, most recent first
    List {
        /// Wallet name
        wallet: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let store = Arc::new(JsonStore::open(&self.database)?);
        let files = Arc::new(DiskFileHost::new(&self.media_dir));
        let ledger = TransactionLedger::new(store, files);

        match self.command {
            Commands::Wallet(cmd) => run_wallet_command(&ledger, &self.user, self.json, cmd).await,

            Commands::Tx(cmd) => run_tx_command(&ledger, &self.user, self.json, cmd).await,

            Commands::Export { wallet, output } => {
                let target = wallet_by_name(&ledger, &self.user, &wallet).await?;
                let exporter = Exporter::new(&ledger);
                let count = match output {
                    Some(path) => {
                        let file = File::create(&path)
                            .with_context(|| format!("failed to create {path}"))?;
                        exporter.export_wallet_csv(target.id, file).await?
                    }
                    None => exporter.export_wallet_csv(target.id, std::io::stdout()).await?,
                };
                eprintln!("Exported {count} transactions");
                Ok(())
            }

            Commands::Import { wallet, input } => {
                let target = wallet_by_name(&ledger, &self.user, &wallet).await?;
                let file =
                    File::open(&input).with_context(|| format!("failed to open {input}"))?;
                let outcome = Importer::new(&ledger)
                    .import_wallet_csv(target.id, &self.user, file)
                    .await?;
                println!("Imported {} transactions into {}", outcome.imported, target.name);
                for issue in &outcome.issues {
                    println!("  line {}: {}", issue.line, issue.error);
                }
                Ok(())
            }
        }
    }
}

async fn run_wallet_command(
    ledger: &LocalLedger,
    user: &str,
    json: bool,
    cmd: WalletCommands,
) -> Result<()> {
    match cmd {
        WalletCommands::Create { name, icon } => {
            let mut draft = WalletDraft::new(user, name);
            if let Some(path) = icon {
                draft = draft.with_icon(ImageSource::Local(path));
            }
            let result = ledger.wallets().create_wallet(draft).await;
            emit(json, result, |wallet| {
                println!("Created wallet {:?} ({})", wallet.name, wallet.id);
            })
        }

        WalletCommands::List => {
            let result = ledger.wallets().list_wallets(user).await;
            emit(json, result, |wallets| {
                if wallets.is_empty() {
                    println!("No wallets found.");
                    return;
                }
                println!("{:<20} {:>12} {:>12} {:>12}", "NAME", "BALANCE", "INCOME", "EXPENSES");
                println!("{}", "-".repeat(60));
                for wallet in wallets {
                    println!(
                        "{:<20} {:>12} {:>12} {:>12}",
                        wallet.name,
                        format_amount(wallet.amount),
                        format_amount(wallet.total_income),
                        format_amount(wallet.total_expenses),
                    );
                }
            })
        }

        WalletCommands::Show { name } => {
            let result = wallet_by_name(ledger, user, &name).await;
            emit(json, result, print_wallet)
        }

        WalletCommands::Update { name, rename, icon } => {
            let result = async {
                let wallet = wallet_by_name(ledger, user, &name).await?;
                let patch = WalletPatch {
                    name: rename,
                    icon: icon.map(ImageSource::Local),
                };
                ledger.wallets().update_wallet(wallet.id, patch).await
            }
            .await;
            emit(json, result, |wallet| {
                println!("Updated wallet {:?}", wallet.name);
            })
        }

        WalletCommands::Delete { name, detach } => {
            let result = async {
                let wallet = wallet_by_name(ledger, user, &name).await?;
                let cascade = ledger.wallets().delete_wallet(wallet.id).await?;
                if detach {
                    cascade.detach();
                    Ok(None)
                } else {
                    cascade.join().await.map(Some)
                }
            }
            .await;
            emit(json, result, |outcome| match outcome {
                Some(outcome) => println!(
                    "Deleted wallet {:?} and {} transactions in {} batches",
                    name, outcome.deleted, outcome.batches
                ),
                None => println!("Deleted wallet {name:?}; cascade left running"),
            })
        }
    }
}

async fn run_tx_command(
    ledger: &LocalLedger,
    user: &str,
    json: bool,
    cmd: TxCommands,
) -> Result<()> {
    match cmd {
        TxCommands::Add {
            wallet,
            kind,
            amount,
            category,
            description,
            date,
            receipt,
        } => {
            let result = async {
                let target = wallet_by_name(ledger, user, &wallet).await?;
                let kind = parse_kind(&kind)?;
                let amount = parse_amount(&amount)
                    .map_err(|err| LedgerError::Validation(err.to_string()))?;
                let mut draft = TransactionDraft::new(target.id, user, kind, amount);
                if let Some(raw) = &date {
                    draft = draft.occurred_at(parse_date(raw)?);
                }
                if let Some(category) = category {
                    draft = draft.with_category(category);
                }
                if let Some(description) = description {
                    draft = draft.with_description(description);
                }
                if let Some(path) = receipt {
                    draft = draft.with_receipt(ImageSource::Local(path));
                }
                ledger.record_transaction(draft).await
            }
            .await;
            emit(json, result, |tx| {
                println!("Recorded {} of {} ({})", tx.kind, format_amount(tx.amount), tx.id);
            })
        }

        TxCommands::Edit {
            id,
            kind,
            amount,
            category,
            description,
            date,
            receipt,
            clear_receipt,
        } => {
            let result = async {
                let id = parse_tx_id(&id)?;
                let current = ledger
                    .get_transaction(id)
                    .await?
                    .ok_or(LedgerError::TransactionNotFound(id))?;

                let mut update = TransactionUpdate::from(&current);
                if let Some(kind) = kind {
                    update.kind = parse_kind(&kind)?;
                }
                if let Some(amount) = amount {
                    update.amount = parse_amount(&amount)
                        .map_err(|err| LedgerError::Validation(err.to_string()))?;
                }
                if let Some(category) = category {
                    update.category = Some(category);
                }
                if let Some(description) = description {
                    update.description = Some(description);
                }
                if let Some(raw) = &date {
                    update.occurred_at = parse_date(raw)?;
                }
                if clear_receipt {
                    update.receipt = None;
                } else if let Some(path) = receipt {
                    update.receipt = Some(ImageSource::Local(path));
                }
                ledger.update_transaction(id, update).await
            }
            .await;
            emit(json, result, |tx| {
                println!("Updated {} of {} ({})", tx.kind, format_amount(tx.amount), tx.id);
            })
        }

        TxCommands::Delete { id } => {
            let result = async {
                let id = parse_tx_id(&id)?;
                ledger.delete_transaction(id, None).await
            }
            .await;
            emit(json, result, |_| println!("Transaction deleted"))
        }

        TxCommands::List { wallet } => {
            let result = async {
                let target = wallet_by_name(ledger, user, &wallet).await?;
                ledger.list_for_wallet(target.id).await
            }
            .await;
            emit(json, result, print_transactions)
        }
    }
}

async fn wallet_by_name(
    ledger: &LocalLedger,
    owner: &str,
    name: &str,
) -> Result<Wallet, LedgerError> {
    ledger
        .wallets()
        .find_by_name(owner, name)
        .await?
        .ok_or_else(|| LedgerError::Validation(format!("no wallet named {name:?}")))
}

fn parse_kind(raw: &str) -> Result<TransactionKind, LedgerError> {
    raw.parse()
        .map_err(|err: crate::domain::ParseKindError| LedgerError::Validation(err.to_string()))
}

fn parse_tx_id(raw: &str) -> Result<TransactionId, LedgerError> {
    Uuid::parse_str(raw).map_err(|_| LedgerError::Validation(format!("invalid transaction id {raw:?}")))
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| LedgerError::Validation(format!("invalid date {raw:?}, expected YYYY-MM-DD")))
}

/// Print the result the human way, or as a JSON envelope in `--json` mode.
/// Envelopes never fail the process: the failure is the payload.
fn emit<T: Serialize>(
    json: bool,
    result: Result<T, LedgerError>,
    render: impl FnOnce(&T),
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&Envelope::from(result))?);
        return Ok(());
    }
    let value = result?;
    render(&value);
    Ok(())
}

fn print_wallet(wallet: &Wallet) {
    println!("Wallet: {}", wallet.name);
    println!("  id:         {}", wallet.id);
    println!("  balance:    {}", format_amount(wallet.amount));
    println!("  income:     {}", format_amount(wallet.total_income));
    println!("  expenses:   {}", format_amount(wallet.total_expenses));
    if let Some(icon) = &wallet.icon {
        println!("  icon:       {icon}");
    }
    println!("  created:    {}", wallet.created_at.format("%Y-%m-%d %H:%M"));
}

fn print_transactions(transactions: &Vec<Transaction>) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }
    println!(
        "{:<12} {:<8} {:>12} {:<16} {}",
        "DATE", "KIND", "AMOUNT", "CATEGORY", "ID"
    );
    println!("{}", "-".repeat(88));
    for tx in transactions {
        println!(
            "{:<12} {:<8} {:>12} {:<16} {}",
            tx.occurred_at.format("%Y-%m-%d").to_string(),
            tx.kind.to_string(),
            format_amount(tx.amount),
            tx.category.as_deref().unwrap_or("-"),
            tx.id,
        );
    }
}
