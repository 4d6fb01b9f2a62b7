use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Cents, FileHandle, ImageSource, UserId, WalletId};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering the wallet.
    Income,
    /// Money leaving the wallet. Requires a category.
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind {0:?}, expected income or expense")]
pub struct ParseKindError(String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// A single income or expense event tied to one wallet.
///
/// The wallet binding is immutable: moving a transaction to another wallet
/// is modeled as delete + create. Edits replace the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    pub owner: UserId,
    pub kind: TransactionKind,
    /// Always positive; the sign of the balance effect comes from `kind`.
    pub amount: Cents,
    /// Present for expenses, `None` for income.
    pub category: Option<String>,
    pub description: Option<String>,
    pub receipt: Option<FileHandle>,
    /// When the transaction happened in the real world.
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The signed effect this transaction has on its wallet's aggregates.
    pub fn contribution(&self) -> AggregateDelta {
        AggregateDelta::contribution(self.kind, self.amount)
    }
}

/// Signed change to a wallet's cached aggregate fields caused by one
/// transaction write.
///
/// Every transition is expressed as "reverse the old contribution, apply the
/// new one": an update combines a reversal with a fresh contribution, and a
/// delete is the special case where the new contribution is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateDelta {
    pub amount: Cents,
    pub income: Cents,
    pub expenses: Cents,
}

impl AggregateDelta {
    pub const ZERO: Self = Self {
        amount: 0,
        income: 0,
        expenses: 0,
    };

    /// The contribution a committed transaction of `kind`/`amount` makes.
    pub fn contribution(kind: TransactionKind, amount: Cents) -> Self {
        match kind {
            TransactionKind::Income => Self {
                amount,
                income: amount,
                expenses: 0,
            },
            TransactionKind::Expense => Self {
                amount: -amount,
                income: 0,
                expenses: amount,
            },
        }
    }

    /// The delta that undoes this one.
    pub fn reversed(self) -> Self {
        Self {
            amount: -self.amount,
            income: -self.income,
            expenses: -self.expenses,
        }
    }

    /// Apply two deltas in sequence as a single adjustment.
    pub fn combine(self, other: Self) -> Self {
        Self {
            amount: self.amount + other.amount,
            income: self.income + other.income,
            expenses: self.expenses + other.expenses,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Input for recording a new transaction.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub wallet_id: WalletId,
    pub owner: UserId,
    pub kind: TransactionKind,
    pub amount: Cents,
    pub category: Option<String>,
    pub description: Option<String>,
    pub receipt: Option<ImageSource>,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionDraft {
    pub fn new(
        wallet_id: WalletId,
        owner: impl Into<UserId>,
        kind: TransactionKind,
        amount: Cents,
    ) -> Self {
        Self {
            wallet_id,
            owner: owner.into(),
            kind,
            amount,
            category: None,
            description: None,
            receipt: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_receipt(mut self, receipt: ImageSource) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn occurred_at(mut self, when: DateTime<Utc>) -> Self {
        self.occurred_at = when;
        self
    }
}

/// Full replacement for an existing transaction. The wallet binding, owner
/// and creation time are carried over from the stored document; everything
/// else is taken from here, so `receipt: None` clears a stored receipt.
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    pub kind: TransactionKind,
    pub amount: Cents,
    pub category: Option<String>,
    pub description: Option<String>,
    pub receipt: Option<ImageSource>,
    pub occurred_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionUpdate {
    /// Start an update from the stored values, ready for field overrides.
    fn from(tx: &Transaction) -> Self {
        Self {
            kind: tx.kind,
            amount: tx.amount,
            category: tx.category.clone(),
            description: tx.description.clone(),
            receipt: tx.receipt.clone().map(ImageSource::Uploaded),
            occurred_at: tx.occurred_at,
        }
    }
}

/// Prior contribution facts for deleting a transaction whose document may
/// already be gone.
#[derive(Debug, Clone, Copy)]
pub struct TransactionFacts {
    pub wallet_id: WalletId,
    pub kind: TransactionKind,
    pub amount: Cents,
}

impl From<&Transaction> for TransactionFacts {
    fn from(tx: &Transaction) -> Self {
        Self {
            wallet_id: tx.wallet_id,
            kind: tx.kind,
            amount: tx.amount,
        }
    }
}
