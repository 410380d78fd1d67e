//! Mock Chain
//!
//! In-process simulated chain used by `--mock` runs and by tests. Behaviour
//! is scripted through setters; every call is counted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{ChainError, Faucet, Receipt, ReceiptSource, TransferCall, TransferGateway};
use crate::core_types::{Address, TxId};
use crate::session::Account;

/// Simulated chain implementing every chain collaborator
pub struct MockChain {
    latency: Duration,
    /// Receipt appears on this lookup (1-based) for each transaction
    confirm_on_poll: AtomicUsize,
    never_confirm: Mutex<bool>,
    submit_failure: Mutex<Option<ChainError>>,
    lookup_failure: Mutex<Option<ChainError>>,
    fund_failure: Mutex<Option<ChainError>>,
    polls: Mutex<HashMap<TxId, usize>>,
    submitted: Mutex<Vec<TransferCall>>,
    funded: Mutex<Vec<Address>>,
    submit_count: AtomicUsize,
    receipt_count: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            confirm_on_poll: AtomicUsize::new(1),
            never_confirm: Mutex::new(false),
            submit_failure: Mutex::new(None),
            lookup_failure: Mutex::new(None),
            fund_failure: Mutex::new(None),
            polls: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            funded: Mutex::new(Vec::new()),
            submit_count: AtomicUsize::new(0),
            receipt_count: AtomicUsize::new(0),
        }
    }

    /// Delay applied to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_confirm_on_poll(&self, poll: usize) {
        self.confirm_on_poll.store(poll.max(1), Ordering::SeqCst);
    }

    pub fn set_never_confirm(&self, never: bool) {
        *self.never_confirm.lock().unwrap_or_else(|e| e.into_inner()) = never;
    }

    pub fn set_submit_failure(&self, failure: Option<ChainError>) {
        *self.submit_failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    pub fn set_lookup_failure(&self, failure: Option<ChainError>) {
        *self.lookup_failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    pub fn set_fund_failure(&self, failure: Option<ChainError>) {
        *self.fund_failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn receipt_count(&self) -> usize {
        self.receipt_count.load(Ordering::SeqCst)
    }

    /// Calls accepted by `submit_transfer`, oldest first
    pub fn submitted(&self) -> Vec<TransferCall> {
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn funded(&self) -> Vec<Address> {
        self.funded.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn next_tx_id() -> Result<TxId, ChainError> {
        let hi = uuid::Uuid::new_v4();
        let lo = uuid::Uuid::new_v4();
        TxId::new(format!("0x{:x}{:x}", hi.simple(), lo.simple()))
            .map_err(|e| ChainError::new(e.to_string()))
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferGateway for MockChain {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn submit_transfer(
        &self,
        _account: &Account,
        call: &TransferCall,
    ) -> Result<TxId, ChainError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(failure) = self
            .submit_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(failure);
        }

        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.clone());
        let tx_id = Self::next_tx_id()?;
        debug!(tx_id = %tx_id, "Mock transfer accepted");
        Ok(tx_id)
    }
}

#[async_trait]
impl ReceiptSource for MockChain {
    async fn get_receipt(&self, tx_id: &TxId) -> Result<Option<Receipt>, ChainError> {
        self.receipt_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(failure) = self
            .lookup_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(failure);
        }

        let poll = {
            let mut polls = self.polls.lock().unwrap_or_else(|e| e.into_inner());
            let entry = polls.entry(tx_id.clone()).or_default();
            *entry += 1;
            *entry
        };

        if *self.never_confirm.lock().unwrap_or_else(|e| e.into_inner()) {
            return Ok(None);
        }
        if poll >= self.confirm_on_poll.load(Ordering::SeqCst) {
            Ok(Some(Receipt::new(tx_id.clone(), Some(poll as u64))))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl Faucet for MockChain {
    async fn fund(&self, address: &Address) -> Result<(), ChainError> {
        self.simulate_latency().await;
        if let Some(failure) = self
            .fund_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(failure);
        }
        self.funded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(*address);
        Ok(())
    }
}
