//! End-to-end transfer flow through the public API:
//! sign up → restore → submit → outcome, against the simulated chain.

use std::sync::Arc;

use tempfile::TempDir;

use tempo_fees::chain::{ChainError, MockChain};
use tempo_fees::session::{AccountManager, FileStore, LocalAuthenticator};
use tempo_fees::tokens::{FeeMode, TokenRegistry};
use tempo_fees::transfer::{
    TransferError, TransferOrchestrator, TransferOutcome, TransferPayload, TransferRequest,
    UnconfirmedReason, UserMessage, WaitConfig,
};

struct Flow {
    _dir: TempDir,
    chain: Arc<MockChain>,
    manager: AccountManager,
    orchestrator: TransferOrchestrator,
}

fn flow(wait: WaitConfig) -> Flow {
    let dir = TempDir::new().unwrap();
    let chain = Arc::new(MockChain::new());
    let manager = AccountManager::new(
        Arc::new(FileStore::new(dir.path().join("session.json"))),
        Arc::new(LocalAuthenticator::new()),
        chain.clone(),
        "localhost",
    );
    let orchestrator =
        TransferOrchestrator::new(chain.clone(), chain.clone(), TokenRegistry::moderato(), wait);
    Flow {
        _dir: dir,
        chain,
        manager,
        orchestrator,
    }
}

fn request(fee_mode: &FeeMode) -> TransferRequest {
    TransferRequest::build(
        &TokenRegistry::moderato(),
        "0x000000000000000000000000000000000000dEaD".parse().unwrap(),
        "alphaUSD",
        10_000_000,
        fee_mode,
    )
    .unwrap()
}

#[tokio::test]
async fn signed_up_account_transfer_confirms() {
    let f = flow(WaitConfig::from_millis(1_000, 5));
    f.chain.set_confirm_on_poll(2);

    f.manager.sign_up().await.unwrap();
    let account = f.manager.restore().expect("session restored");

    let req = request(&FeeMode::Token("betaUSD".to_string()));
    let outcome = f
        .orchestrator
        .submit(Some(&account), &req)
        .await
        .unwrap();

    assert!(matches!(outcome, TransferOutcome::Confirmed { .. }));
    assert_eq!(outcome.status_line(), "Transaction confirmed.");
    assert_eq!(f.orchestrator.outcome(), outcome);
    assert_eq!(f.chain.receipt_count(), 2);

    let submitted = f.chain.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].fee_token, TokenRegistry::moderato().resolve("betaUSD"));
}

#[tokio::test]
async fn signed_out_user_is_gated() {
    let f = flow(WaitConfig::from_millis(1_000, 5));
    f.manager.sign_up().await.unwrap();
    f.manager.sign_out().unwrap();

    let account = f.manager.restore();
    assert!(account.is_none());

    let req = request(&FeeMode::Native);
    assert_eq!(
        serde_json::to_value(TransferPayload::preview(account.as_ref().map(|_| &req))).unwrap(),
        serde_json::json!({ "status": "awaiting_input" })
    );

    let err = f
        .orchestrator
        .submit(account.as_ref(), &req)
        .await
        .unwrap_err();
    assert_eq!(err, TransferError::NotAuthenticated);
    assert_eq!(f.orchestrator.outcome(), TransferOutcome::Idle);
    assert_eq!(f.chain.submit_count(), 0);
}

#[tokio::test]
async fn rejected_submission_is_classified() {
    let f = flow(WaitConfig::from_millis(1_000, 5));
    let account = f.manager.sign_up().await.unwrap();
    f.chain
        .set_submit_failure(Some(ChainError::new("nonce too low: next nonce 7, tx nonce 6")));

    let outcome = f
        .orchestrator
        .submit(Some(&account), &request(&FeeMode::Native))
        .await
        .unwrap();

    match outcome {
        TransferOutcome::Failed {
            user_message,
            technical_detail,
        } => {
            assert_eq!(user_message, UserMessage::NonceConflict);
            assert_eq!(technical_detail, "nonce too low: next nonce 7, tx nonce 6");
        }
        other => panic!("expected failure, got {}", other),
    }
}

#[tokio::test]
async fn slow_confirmation_reports_unconfirmed_with_explorer_link() {
    let f = flow(WaitConfig::from_millis(60, 10));
    f.chain.set_never_confirm(true);
    let account = f.manager.sign_up().await.unwrap();

    let outcome = f
        .orchestrator
        .submit(Some(&account), &request(&FeeMode::Native))
        .await
        .unwrap();

    let tx_id = outcome.tx_id().cloned().expect("submitted tx id");
    assert_eq!(
        outcome,
        TransferOutcome::SubmittedUnconfirmed {
            tx_id: tx_id.clone(),
            reason: UnconfirmedReason::Timeout,
        }
    );
    assert_eq!(
        outcome.explorer_url("https://explore.tempo.xyz/tx/"),
        Some(format!("https://explore.tempo.xyz/tx/{}", tx_id))
    );
}

#[tokio::test]
async fn session_survives_new_manager() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let chain = Arc::new(MockChain::new());

    let first = AccountManager::new(
        Arc::new(FileStore::new(&path)),
        Arc::new(LocalAuthenticator::new()),
        chain.clone(),
        "localhost",
    );
    let account = first.sign_up().await.unwrap();

    let second = AccountManager::new(
        Arc::new(FileStore::new(&path)),
        Arc::new(LocalAuthenticator::new()),
        chain,
        "localhost",
    );
    assert_eq!(second.restore(), Some(account));
}
