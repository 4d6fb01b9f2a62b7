mod common;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use billfold::application::LedgerError;
use billfold::domain::{FileHandle, ImageSource, WalletPatch};
use common::*;

#[tokio::test]
async fn new_wallets_start_with_server_assigned_zeroes() -> Result<()> {
    let (ledger, _store) = test_ledger();

    let wallet = ledger.wallets().create_wallet(wallet_draft("Checking")).await?;
    assert_eq!(wallet.amount, 0);
    assert_eq!(wallet.total_income, 0);
    assert_eq!(wallet.total_expenses, 0);
    assert!(wallet.is_balanced());

    let fetched = ledger.wallets().require_wallet(wallet.id).await?;
    assert_eq!(fetched.name, "Checking");
    assert_eq!(fetched.owner, OWNER);
    assert_eq!(fetched.amount, 0);
    Ok(())
}

#[tokio::test]
async fn blank_wallet_name_is_rejected() {
    let (ledger, _store) = test_ledger();
    let err = ledger
        .wallets()
        .create_wallet(wallet_draft("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn local_icon_is_uploaded_before_the_wallet_is_written() -> Result<()> {
    let (ledger, _store) = test_ledger();

    let draft = wallet_draft("Cash").with_icon(ImageSource::Local(PathBuf::from("icon.png")));
    let wallet = ledger.wallets().create_wallet(draft).await?;

    // The stub host mints "<folder>/<path>" handles.
    assert_eq!(wallet.icon, Some(FileHandle::new("wallets/icon.png")));
    let fetched = ledger.wallets().require_wallet(wallet.id).await?;
    assert_eq!(fetched.icon, wallet.icon);
    Ok(())
}

#[tokio::test]
async fn failed_icon_upload_commits_nothing() -> Result<()> {
    let (ledger, _store) = failing_upload_ledger();

    let draft = wallet_draft("Cash").with_icon(ImageSource::Local(PathBuf::from("icon.png")));
    let err = ledger.wallets().create_wallet(draft).await.unwrap_err();
    assert!(matches!(err, LedgerError::Upload(_)));

    assert!(ledger.wallets().list_wallets(OWNER).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_merges_only_supplied_fields() -> Result<()> {
    let (ledger, _store) = test_ledger();

    let draft = wallet_draft("Cash")
        .with_icon(ImageSource::Uploaded(FileHandle::new("wallets/orig.png")));
    let wallet = ledger.wallets().create_wallet(draft).await?;
    ledger.record_transaction(income(wallet.id, 10000)).await?;

    // Rename only: icon and aggregates keep their values.
    ledger
        .wallets()
        .update_wallet(
            wallet.id,
            WalletPatch {
                name: Some("Main".into()),
                icon: None,
            },
        )
        .await?;
    let fetched = ledger.wallets().require_wallet(wallet.id).await?;
    assert_eq!(fetched.name, "Main");
    assert_eq!(fetched.icon, Some(FileHandle::new("wallets/orig.png")));
    assert_eq!(fetched.amount, 10000);

    // Icon only: the rename sticks.
    ledger
        .wallets()
        .update_wallet(
            wallet.id,
            WalletPatch {
                name: None,
                icon: Some(ImageSource::Uploaded(FileHandle::new("wallets/new.png"))),
            },
        )
        .await?;
    let fetched = ledger.wallets().require_wallet(wallet.id).await?;
    assert_eq!(fetched.name, "Main");
    assert_eq!(fetched.icon, Some(FileHandle::new("wallets/new.png")));
    assert_eq!(fetched.total_income, 10000);
    Ok(())
}

#[tokio::test]
async fn updating_missing_wallet_fails() {
    let (ledger, _store) = test_ledger();
    let err = ledger
        .wallets()
        .update_wallet(
            uuid::Uuid::new_v4(),
            WalletPatch {
                name: Some("Ghost".into()),
                icon: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::WalletNotFound(_)));
}

#[tokio::test]
async fn failed_icon_upload_leaves_existing_wallet_untouched() -> Result<()> {
    let (ledger, store) = test_ledger();
    let wallet = ledger.wallets().create_wallet(wallet_draft("Cash")).await?;

    let failing = billfold::application::TransactionLedger::new(
        store,
        std::sync::Arc::new(StubFileHost { fail: true }),
    );
    let err = failing
        .wallets()
        .update_wallet(
            wallet.id,
            WalletPatch {
                name: Some("Renamed".into()),
                icon: Some(ImageSource::Local(PathBuf::from("icon.png"))),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Upload(_)));

    let fetched = ledger.wallets().require_wallet(wallet.id).await?;
    assert_eq!(fetched.name, "Cash");
    assert!(fetched.icon.is_none());
    Ok(())
}

#[tokio::test]
async fn wallets_list_newest_first_per_owner() -> Result<()> {
    let (ledger, _store) = test_ledger();

    for name in ["First", "Second", "Third"] {
        ledger.wallets().create_wallet(wallet_draft(name)).await?;
        // Creation times must differ for the ordering to be observable.
        std::thread::sleep(Duration::from_millis(2));
    }
    ledger
        .wallets()
        .create_wallet(billfold::domain::WalletDraft::new("someone-else", "Other"))
        .await?;

    let names: Vec<_> = ledger
        .wallets()
        .list_wallets(OWNER)
        .await?
        .into_iter()
        .map(|wallet| wallet.name)
        .collect();
    assert_eq!(names, ["Third", "Second", "First"]);
    Ok(())
}

#[tokio::test]
async fn find_by_name_scopes_to_owner() -> Result<()> {
    let (ledger, _store) = test_ledger();
    let wallet = ledger.wallets().create_wallet(wallet_draft("Cash")).await?;
    ledger
        .wallets()
        .create_wallet(billfold::domain::WalletDraft::new("someone-else", "Cash"))
        .await?;

    let found = ledger.wallets().find_by_name(OWNER, "Cash").await?.unwrap();
    assert_eq!(found.id, wallet.id);
    assert!(ledger.wallets().find_by_name(OWNER, "Savings").await?.is_none());
    Ok(())
}
