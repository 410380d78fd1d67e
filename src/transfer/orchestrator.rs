//! Transfer Orchestrator
//!
//! Drives one transfer per cycle: precondition gate, submit, wait for
//! confirmation, classify failures. The observable outcome lives in a
//! `watch` channel tagged with the cycle that wrote it; a completion from a
//! superseded cycle is discarded instead of overwriting newer state.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::classify::{ClassifiedError, ErrorClassifier, RawError, SubstringClassifier};
use super::confirmation::{ConfirmationWaiter, WaitConfig};
use super::error::TransferError;
use super::state::{CycleId, TransferOutcome, TransferSnapshot, UnconfirmedReason};
use super::types::TransferRequest;
use crate::chain::{ReceiptSource, TransferGateway};
use crate::core_types::TxId;
use crate::session::Account;
use crate::tokens::TokenRegistry;

/// Transfer Orchestrator - owns the live outcome
pub struct TransferOrchestrator {
    gateway: Arc<dyn TransferGateway>,
    waiter: ConfirmationWaiter,
    classifier: Arc<dyn ErrorClassifier>,
    registry: TokenRegistry,
    state: watch::Sender<TransferSnapshot>,
}

impl TransferOrchestrator {
    pub fn new(
        gateway: Arc<dyn TransferGateway>,
        receipts: Arc<dyn ReceiptSource>,
        registry: TokenRegistry,
        wait: WaitConfig,
    ) -> Self {
        let (state, _) = watch::channel(TransferSnapshot::default());
        Self {
            gateway,
            waiter: ConfirmationWaiter::new(receipts, wait),
            classifier: Arc::new(SubstringClassifier::new()),
            registry,
            state,
        }
    }

    /// Replace the failure classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Observe every published transition
    pub fn subscribe(&self) -> watch::Receiver<TransferSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TransferSnapshot {
        self.state.borrow().clone()
    }

    pub fn outcome(&self) -> TransferOutcome {
        self.state.borrow().outcome.clone()
    }

    /// Supersede any in-flight cycle and return to `Idle`
    pub fn reset(&self) {
        self.state.send_modify(|snap| {
            snap.cycle += 1;
            snap.outcome = TransferOutcome::Idle;
        });
        debug!(cycle = self.state.borrow().cycle, "Transfer outcome reset");
    }

    /// Submit a transfer and wait for its outcome.
    ///
    /// `Err` only for the precondition failures, which leave the published
    /// state untouched. Every later failure is expressed as an outcome.
    /// The returned outcome belongs to this cycle even if a newer cycle
    /// has since taken over the published state.
    pub async fn submit(
        &self,
        account: Option<&Account>,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        let Some(account) = account else {
            warn!("Transfer rejected: no active account");
            return Err(TransferError::NotAuthenticated);
        };
        if let Err(e) = self.registry.validate(request) {
            warn!(error = %e, "Transfer rejected: invalid request");
            return Err(e.into());
        }

        let cycle = self.begin_cycle();
        info!(
            cycle,
            gateway = self.gateway.name(),
            token = %request.token,
            amount = %request.amount,
            to = %request.to,
            "Transfer submitting"
        );

        let tx_id = match self.send(account, request).await {
            Ok(tx_id) => tx_id,
            Err(classified) => {
                error!(
                    cycle,
                    code = classified.user_message().code(),
                    detail = classified.technical_detail(),
                    "Transfer submission failed"
                );
                let outcome = TransferOutcome::failed(&classified);
                self.commit(cycle, outcome.clone());
                return Ok(outcome);
            }
        };

        info!(cycle, tx_id = %tx_id, "Transfer submitted");
        self.commit(
            cycle,
            TransferOutcome::PendingConfirmation {
                tx_id: tx_id.clone(),
            },
        );

        let outcome = match self
            .waiter
            .wait_while(&tx_id, || self.is_current(cycle))
            .await
        {
            Ok(receipt) => {
                if !receipt.success {
                    warn!(cycle, tx_id = %tx_id, "Receipt reports execution failure");
                }
                info!(cycle, tx_id = %tx_id, block = ?receipt.block_number, "Transfer confirmed");
                TransferOutcome::Confirmed { tx_id }
            }
            Err(e) => Self::unconfirmed(cycle, tx_id, &e),
        };

        self.commit(cycle, outcome.clone());
        Ok(outcome)
    }

    async fn send(
        &self,
        account: &Account,
        request: &TransferRequest,
    ) -> Result<TxId, ClassifiedError> {
        self.gateway
            .submit_transfer(account, &request.call())
            .await
            .map_err(|e| self.classifier.classify(&RawError::from(&e)))
    }

    /// Outcome for a submitted transfer whose receipt never arrived.
    ///
    /// Only a deadline expiry is a timeout; a failed lookup or an abandoned
    /// wait leaves the status unknown.
    fn unconfirmed(cycle: CycleId, tx_id: TxId, error: &TransferError) -> TransferOutcome {
        let reason = match error {
            TransferError::ConfirmationTimeout { .. } => UnconfirmedReason::Timeout,
            _ => UnconfirmedReason::Unknown,
        };
        warn!(cycle, tx_id = %tx_id, reason = ?reason, error = %error, "Transfer unconfirmed");
        TransferOutcome::SubmittedUnconfirmed { tx_id, reason }
    }

    fn begin_cycle(&self) -> CycleId {
        let mut cycle = 0;
        self.state.send_modify(|snap| {
            snap.cycle += 1;
            snap.outcome = TransferOutcome::Submitting;
            cycle = snap.cycle;
        });
        cycle
    }

    fn is_current(&self, cycle: CycleId) -> bool {
        self.state.borrow().cycle == cycle
    }

    /// Publish `outcome` only while `cycle` is still the latest
    fn commit(&self, cycle: CycleId, outcome: TransferOutcome) -> bool {
        self.state.send_if_modified(|snap| {
            if snap.cycle != cycle {
                debug!(
                    cycle,
                    current = snap.cycle,
                    outcome = %outcome,
                    "Discarding stale transfer completion"
                );
                return false;
            }
            snap.outcome = outcome.clone();
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChain;
    use crate::session::{Account, Credential};

    fn account() -> Account {
        Account::from_credential(Credential {
            id: "cred-1".to_string(),
            public_key: format!("0x04{}", "22".repeat(64)),
        })
        .unwrap()
    }

    fn orchestrator(chain: Arc<MockChain>) -> TransferOrchestrator {
        TransferOrchestrator::new(
            chain.clone(),
            chain,
            TokenRegistry::moderato(),
            WaitConfig::from_millis(200, 5),
        )
    }

    fn request() -> TransferRequest {
        let registry = TokenRegistry::moderato();
        TransferRequest::new(
            "0x000000000000000000000000000000000000dEaD".parse().unwrap(),
            registry.resolve("alphaUSD").unwrap(),
            10_000_000,
            None,
        )
    }

    #[tokio::test]
    async fn test_cycle_counter_advances() {
        let chain = Arc::new(MockChain::new());
        let orch = orchestrator(chain);
        assert_eq!(orch.snapshot().cycle, 0);

        orch.submit(Some(&account()), &request()).await.unwrap();
        assert_eq!(orch.snapshot().cycle, 1);

        orch.reset();
        let snap = orch.snapshot();
        assert_eq!(snap.cycle, 2);
        assert_eq!(snap.outcome, TransferOutcome::Idle);
    }

    #[test]
    fn test_unconfirmed_reason() {
        let id = TxId::new("0xabc").unwrap();
        let timeout = TransferError::ConfirmationTimeout {
            tx_id: id.clone(),
            elapsed: std::time::Duration::from_secs(120),
        };
        let lookup = TransferError::ConfirmationLookupFailed {
            tx_id: id.clone(),
            reason: "request timed out".to_string(),
        };
        let abandoned = TransferError::ConfirmationAbandoned { tx_id: id.clone() };

        assert_eq!(
            TransferOrchestrator::unconfirmed(1, id.clone(), &timeout),
            TransferOutcome::SubmittedUnconfirmed {
                tx_id: id.clone(),
                reason: UnconfirmedReason::Timeout,
            }
        );
        for error in [lookup, abandoned] {
            assert_eq!(
                TransferOrchestrator::unconfirmed(1, id.clone(), &error),
                TransferOutcome::SubmittedUnconfirmed {
                    tx_id: id.clone(),
                    reason: UnconfirmedReason::Unknown,
                }
            );
        }
    }

    #[tokio::test]
    async fn test_stale_commit_rejected() {
        let chain = Arc::new(MockChain::new());
        let orch = orchestrator(chain);

        let first = orch.begin_cycle();
        let second = orch.begin_cycle();
        assert!(!orch.commit(first, TransferOutcome::Idle));
        assert_eq!(orch.outcome(), TransferOutcome::Submitting);
        assert!(orch.commit(second, TransferOutcome::Idle));
        assert_eq!(orch.outcome(), TransferOutcome::Idle);
    }
}
