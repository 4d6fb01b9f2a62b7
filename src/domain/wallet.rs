use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, FileHandle, ImageSource};

pub type WalletId = Uuid;

/// Identifier of the acting user, assigned by whatever authentication sits
/// in front of the services.
pub type UserId = String;

/// A named money container with a running balance and lifetime totals.
///
/// The three aggregate fields are a cache maintained by the transaction
/// ledger: after every committed transaction write,
/// `amount == total_income - total_expenses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner: UserId,
    pub name: String,
    pub icon: Option<FileHandle>,
    /// Current balance. May go negative (overdraft is not an error).
    pub amount: Cents,
    pub total_income: Cents,
    pub total_expenses: Cents,
    /// Set once at creation, never mutated.
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a wallet with zeroed aggregates and a fresh creation time.
    /// These fields are always server-assigned; callers cannot supply them.
    pub fn new(owner: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            icon: None,
            amount: 0,
            total_income: 0,
            total_expenses: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_icon(mut self, icon: FileHandle) -> Self {
        self.icon = Some(icon);
        self
    }

    /// True when the cached balance matches the lifetime totals.
    pub fn is_balanced(&self) -> bool {
        self.amount == self.total_income - self.total_expenses
    }
}

/// Input for creating a wallet. Deliberately has no aggregate or timestamp
/// fields: those are assigned by [`Wallet::new`].
#[derive(Debug, Clone)]
pub struct WalletDraft {
    pub owner: UserId,
    pub name: String,
    pub icon: Option<ImageSource>,
}

impl WalletDraft {
    pub fn new(owner: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: ImageSource) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// Partial update for an existing wallet. `None` fields keep their prior
/// value; aggregates and `created_at` can never be patched.
#[derive(Debug, Clone, Default)]
pub struct WalletPatch {
    pub name: Option<String>,
    pub icon: Option<ImageSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_starts_with_zeroed_aggregates() {
        let wallet = Wallet::new("user-1".into(), "Checking");
        assert_eq!(wallet.amount, 0);
        assert_eq!(wallet.total_income, 0);
        assert_eq!(wallet.total_expenses, 0);
        assert!(wallet.icon.is_none());
        assert!(wallet.is_balanced());
    }

    #[test]
    fn balance_check_detects_drift() {
        let mut wallet = Wallet::new("user-1".into(), "Checking");
        wallet.total_income = 200;
        wallet.total_expenses = 50;
        wallet.amount = 150;
        assert!(wallet.is_balanced());

        wallet.amount = 100;
        assert!(!wallet.is_balanced());
    }

    #[test]
    fn wallet_serde_roundtrip() {
        let wallet = Wallet::new("user-1".into(), "Savings").with_icon(FileHandle::new("wallets/a.png"));
        let value = serde_json::to_value(&wallet).unwrap();
        assert_eq!(value["name"], "Savings");
        assert_eq!(value["icon"], "wallets/a.png");

        let back: Wallet = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, wallet.id);
        assert_eq!(back.icon, wallet.icon);
    }
}
