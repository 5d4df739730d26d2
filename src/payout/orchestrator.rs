//! Broadcast orchestrator
//!
//! Drives one batch through
//! `Idle → ValidatingWallet → SelectingUtxos → BuildingTx → Signing →
//! Broadcasting → Validating → Settled | Failed`. A failed run is never
//! resumed: the caller re-runs the whole batch, which re-selects fresh
//! UTXOs.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::PayoutConfig;
use crate::crypto::NonceStrategy;
use crate::rpc::{BroadcastOutcome, ElectrumApi, ElectrumClient};
use crate::transaction::{
    previous_output_script, select_with_fee, Recipient, SignedTransaction, SpendableOutput,
    TransactionBuilder,
};
use crate::utxo::{Utxo, UtxoSelector};
use crate::wallet::{Address, KeyMaterial};

use super::{PayoutBatch, PayoutError, PayoutFailure, PayoutState, Settlement, WalletLeases};

/// Pays batches out of one funding wallet
pub struct PayoutOrchestrator {
    rpc: Arc<dyn ElectrumApi>,
    key: KeyMaterial,
    leases: WalletLeases,
    selector: UtxoSelector,
    nonce: NonceStrategy,
    state: watch::Sender<PayoutState>,
}

impl std::fmt::Debug for PayoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayoutOrchestrator")
            .field("wallet", self.key.address())
            .field("selector", &self.selector)
            .field("nonce", &self.nonce)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

impl PayoutOrchestrator {
    /// The key must derive to `funding_address`. Orchestrators for the same
    /// wallet only exclude each other when built from clones of one
    /// `WalletLeases`; separate registries never see each other's leases.
    pub fn new(
        rpc: Arc<dyn ElectrumApi>,
        key: KeyMaterial,
        funding_address: &Address,
        leases: WalletLeases,
    ) -> Result<Self, PayoutError> {
        if key.address() != funding_address {
            return Err(PayoutError::InvalidInput(format!(
                "funding key derives to {}, configured address is {}",
                key.address(),
                funding_address
            )));
        }
        let (state, _) = watch::channel(PayoutState::Idle);
        Ok(Self {
            rpc,
            key,
            leases,
            selector: UtxoSelector::default(),
            nonce: NonceStrategy::default(),
            state,
        })
    }

    /// Electrum client from `config`, key from `wif`. Pass a clone of the
    /// process-wide `WalletLeases`, not a fresh one per call.
    pub fn from_config(
        config: &PayoutConfig,
        wif: &str,
        leases: WalletLeases,
    ) -> Result<Self, PayoutError> {
        let funding_address = config
            .funding_address()
            .map_err(|e| PayoutError::InvalidInput(e.to_string()))?;
        let key = KeyMaterial::from_wif(wif)?;
        let client = ElectrumClient::new(config.servers(), config.client_options());
        Self::new(Arc::new(client), key, &funding_address, leases)
    }

    pub fn with_selector(mut self, selector: UtxoSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_nonce_strategy(mut self, nonce: NonceStrategy) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn funding_address(&self) -> &Address {
        self.key.address()
    }

    pub fn state(&self) -> PayoutState {
        *self.state.borrow()
    }

    /// Observe stage transitions
    pub fn subscribe(&self) -> watch::Receiver<PayoutState> {
        self.state.subscribe()
    }

    fn enter(&self, state: PayoutState) {
        info!(wallet = %self.key.address(), state = %state, "payout state");
        self.state.send_replace(state);
    }

    fn fail(&self, error: PayoutError) -> PayoutFailure {
        let stage = self.state();
        warn!(wallet = %self.key.address(), stage = %stage, error = %error, "payout failed");
        self.state.send_replace(PayoutState::Failed);
        PayoutFailure { stage, error }
    }

    /// Run one batch to `Settled` or `Failed`
    pub async fn run(&self, batch: &PayoutBatch) -> Result<Settlement, PayoutFailure> {
        let wallet = self.key.address().to_string();
        let _lease = self.leases.try_acquire(&wallet).map_err(|e| PayoutFailure {
            stage: PayoutState::Idle,
            error: e,
        })?;

        self.enter(PayoutState::Idle);
        match self.pipeline(batch).await {
            Ok(settlement) => {
                self.enter(PayoutState::Settled);
                Ok(settlement)
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// [`run`](Self::run) under a deadline. On expiry the pipeline is
    /// dropped with any open connection and partial signatures, and the
    /// wallet lease is released.
    pub async fn run_with_deadline(
        &self,
        batch: &PayoutBatch,
        deadline: Duration,
    ) -> Result<Settlement, PayoutFailure> {
        match timeout(deadline, self.run(batch)).await {
            Ok(result) => result,
            Err(_) => Err(self.fail(PayoutError::DeadlineExceeded {
                timeout_ms: deadline.as_millis() as u64,
            })),
        }
    }

    async fn pipeline(&self, batch: &PayoutBatch) -> Result<Settlement, PayoutError> {
        let (recipients, total_amount) = batch.recipients()?;

        self.enter(PayoutState::ValidatingWallet);
        let utxos = self.validate_wallet(total_amount).await?;

        self.enter(PayoutState::SelectingUtxos);
        let funded = select_with_fee(&self.selector, &utxos, total_amount, recipients.len())?;
        info!(
            inputs = funded.selection.selected.len(),
            selected = funded.selection.total_value,
            fee = funded.fee,
            "inputs selected"
        );

        self.enter(PayoutState::BuildingTx);
        let inputs = self.resolve_inputs(&funded.selection.selected).await?;

        self.enter(PayoutState::Signing);
        let signed = self.sign(&inputs, &recipients, funded.fee)?;

        self.enter(PayoutState::Broadcasting);
        let outcome = self.rpc.broadcast(&signed.raw_hex).await?;

        self.enter(PayoutState::Validating);
        let txid = match outcome {
            BroadcastOutcome::Accepted(txid) => txid,
            BroadcastOutcome::Rejected { code, message } => {
                return Err(PayoutError::BroadcastRejected { code, message })
            }
            BroadcastOutcome::Malformed(raw) => return Err(PayoutError::InvalidBroadcastResponse(raw)),
        };
        if txid != signed.txid {
            warn!(returned = %txid, computed = %signed.txid, "server returned a different txid");
        }

        Ok(Settlement {
            txid,
            total_amount,
            fee: signed.fee,
            change_amount: signed.change_amount,
            inputs_used: signed.inputs_used,
            recipients_paid: recipients.len(),
        })
    }

    async fn validate_wallet(&self, total_amount: u64) -> Result<Vec<Utxo>, PayoutError> {
        let address = self.key.address();
        let balance = self.rpc.get_balance(address).await?;
        let utxos = self.rpc.list_unspent(address).await?;
        let available = crate::utxo::total_value(&utxos)
            .ok_or_else(|| PayoutError::InvalidInput("UTXO total overflows".into()))?;
        info!(
            wallet = %address,
            confirmed = balance.confirmed,
            unconfirmed = balance.unconfirmed,
            utxos = utxos.len(),
            available,
            "wallet state"
        );
        if utxos.is_empty() || available < total_amount {
            return Err(PayoutError::InsufficientFunds {
                needed: total_amount,
                available,
            });
        }
        Ok(utxos)
    }

    /// Fetch and verify the previous output behind every selected UTXO
    async fn resolve_inputs(&self, selected: &[Utxo]) -> Result<Vec<SpendableOutput>, PayoutError> {
        let mut inputs = Vec::with_capacity(selected.len());
        for utxo in selected {
            let outpoint = utxo.outpoint;
            let raw = self.rpc.get_transaction(&outpoint.txid).await?;
            let (script_pubkey, value) = previous_output_script(&raw, &outpoint.txid, outpoint.vout)?;
            if value != utxo.value {
                return Err(PayoutError::InvalidInput(format!(
                    "{} is worth {} on chain but {} in the UTXO list",
                    outpoint, value, utxo.value
                )));
            }
            inputs.push(SpendableOutput {
                outpoint,
                value,
                script_pubkey,
            });
        }
        Ok(inputs)
    }

    fn sign(
        &self,
        inputs: &[SpendableOutput],
        recipients: &[Recipient],
        fee: u64,
    ) -> Result<SignedTransaction, PayoutError> {
        let signed = TransactionBuilder::new(&self.key, unix_time())
            .with_nonce_strategy(self.nonce)
            .build(inputs, recipients, fee)?;
        Ok(signed)
    }
}
