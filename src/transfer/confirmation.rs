//! Confirmation Waiter
//!
//! Polls a [`ReceiptSource`] until a receipt appears or the deadline passes.
//!
//! - `Ok(Some(receipt))`: confirmed
//! - `Ok(None)`: still pending, sleep and poll again
//! - `Err(_)`: lookup failure, terminal for this wait
//!
//! The deadline also bounds an in-flight lookup, so a hung node cannot hold
//! the waiter past `timeout`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::error::TransferError;
use crate::chain::{Receipt, ReceiptSource};
use crate::core_types::TxId;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
        )
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Receipt poller
#[derive(Clone)]
pub struct ConfirmationWaiter {
    receipts: Arc<dyn ReceiptSource>,
    config: WaitConfig,
}

impl ConfirmationWaiter {
    pub fn new(receipts: Arc<dyn ReceiptSource>, config: WaitConfig) -> Self {
        Self { receipts, config }
    }

    /// Wait for a receipt with no external cancellation
    pub async fn wait_for_confirmation(&self, tx_id: &TxId) -> Result<Receipt, TransferError> {
        self.wait_while(tx_id, || true).await
    }

    /// Wait for a receipt, checking `keep_going` before every lookup.
    ///
    /// Returns `ConfirmationAbandoned` as soon as `keep_going` is false.
    pub async fn wait_while<F>(&self, tx_id: &TxId, keep_going: F) -> Result<Receipt, TransferError>
    where
        F: Fn() -> bool,
    {
        let started = Instant::now();
        let poll_interval = self.config.poll_interval.max(Duration::from_millis(1));
        let mut polls: u32 = 0;

        loop {
            if !keep_going() {
                debug!(tx_id = %tx_id, polls, "Confirmation wait abandoned");
                return Err(TransferError::ConfirmationAbandoned {
                    tx_id: tx_id.clone(),
                });
            }

            let remaining = self.config.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(self.timed_out(tx_id, started));
            }

            polls += 1;
            let lookup = tokio::time::timeout(remaining, self.receipts.get_receipt(tx_id)).await;

            match lookup {
                Err(_) => return Err(self.timed_out(tx_id, started)),
                Ok(Ok(Some(receipt))) => {
                    debug!(
                        tx_id = %tx_id,
                        polls,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Receipt found"
                    );
                    return Ok(receipt);
                }
                Ok(Ok(None)) => {
                    debug!(tx_id = %tx_id, polls, "Receipt pending");
                }
                Ok(Err(e)) => {
                    return Err(TransferError::ConfirmationLookupFailed {
                        tx_id: tx_id.clone(),
                        reason: e.text().to_string(),
                    });
                }
            }

            let remaining = self.config.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(self.timed_out(tx_id, started));
            }
            tokio::time::sleep(poll_interval.min(remaining)).await;
        }
    }

    fn timed_out(&self, tx_id: &TxId, started: Instant) -> TransferError {
        TransferError::ConfirmationTimeout {
            tx_id: tx_id.clone(),
            elapsed: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, MockChain};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn tx() -> TxId {
        TxId::new("0xabc").unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = WaitConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(120_000));
        assert_eq!(config.poll_interval, Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_never_confirms_times_out() {
        let chain = Arc::new(MockChain::new());
        chain.set_never_confirm(true);
        let waiter = ConfirmationWaiter::new(chain.clone(), WaitConfig::from_millis(50, 10));

        let started = Instant::now();
        let err = waiter.wait_for_confirmation(&tx()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, TransferError::ConfirmationTimeout { .. }));
        assert!(elapsed >= Duration::from_millis(50), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(150), "elapsed {:?}", elapsed);
        assert!(chain.receipt_count() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_on_paused_clock() {
        let chain = Arc::new(MockChain::new());
        chain.set_never_confirm(true);
        let waiter = ConfirmationWaiter::new(chain.clone(), WaitConfig::default());

        let started = Instant::now();
        let err = waiter.wait_for_confirmation(&tx()).await.unwrap_err();

        assert!(matches!(err, TransferError::ConfirmationTimeout { .. }));
        assert_eq!(started.elapsed(), DEFAULT_TIMEOUT);
        assert_eq!(chain.receipt_count(), 120);
    }

    #[tokio::test]
    async fn test_confirms_on_third_poll() {
        let chain = Arc::new(MockChain::new());
        chain.set_confirm_on_poll(3);
        let waiter = ConfirmationWaiter::new(chain.clone(), WaitConfig::from_millis(1_000, 5));

        let receipt = waiter.wait_for_confirmation(&tx()).await.unwrap();
        assert_eq!(receipt.tx_id, tx());
        assert_eq!(chain.receipt_count(), 3);
    }

    #[tokio::test]
    async fn test_lookup_error_is_terminal() {
        let chain = Arc::new(MockChain::new());
        chain.set_lookup_failure(Some(ChainError::new("connection refused")));
        let waiter = ConfirmationWaiter::new(chain.clone(), WaitConfig::from_millis(1_000, 5));

        let err = waiter.wait_for_confirmation(&tx()).await.unwrap_err();
        assert_eq!(
            err,
            TransferError::ConfirmationLookupFailed {
                tx_id: tx(),
                reason: "connection refused".to_string(),
            }
        );
        assert_eq!(chain.receipt_count(), 1);
    }

    #[tokio::test]
    async fn test_slow_lookup_bounded_by_deadline() {
        let chain = Arc::new(MockChain::new().with_latency(Duration::from_millis(500)));
        let waiter = ConfirmationWaiter::new(chain, WaitConfig::from_millis(40, 10));

        let started = Instant::now();
        let err = waiter.wait_for_confirmation(&tx()).await.unwrap_err();
        assert!(matches!(err, TransferError::ConfirmationTimeout { .. }));
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_abandoned_before_next_poll() {
        let chain = Arc::new(MockChain::new());
        chain.set_never_confirm(true);
        let waiter = ConfirmationWaiter::new(chain.clone(), WaitConfig::from_millis(1_000, 5));

        let id = tx();
        let live = AtomicBool::new(true);
        let wait = waiter.wait_while(&id, || live.load(Ordering::SeqCst));
        let stop = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            live.store(false, Ordering::SeqCst);
        };

        let (result, _) = tokio::join!(wait, stop);
        assert_eq!(
            result.unwrap_err(),
            TransferError::ConfirmationAbandoned { tx_id: id }
        );

        let polls = chain.receipt_count();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(chain.receipt_count(), polls);
    }
}
