//! One in-flight payout batch per funding wallet
//!
//! Two batches spending the same wallet would select the same UTXOs and
//! one broadcast would double-spend the other. A lease is an owned guard
//! on a per-address async mutex; dropping it (including by cancellation)
//! releases the wallet.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use super::PayoutError;

/// Registry of per-wallet locks, cheap to clone and share. Exclusion only
/// holds between holders of clones of the same registry.
#[derive(Debug, Clone, Default)]
pub struct WalletLeases {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Exclusive right to spend from one wallet
#[derive(Debug)]
pub struct WalletLease {
    wallet: String,
    _guard: OwnedMutexGuard<()>,
}

impl WalletLease {
    pub fn wallet(&self) -> &str {
        &self.wallet
    }
}

impl Drop for WalletLease {
    fn drop(&mut self) {
        debug!(wallet = %self.wallet, "wallet lease released");
    }
}

impl WalletLeases {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, wallet: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(wallet.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Take the lease now or fail with `WalletBusy`
    pub fn try_acquire(&self, wallet: &str) -> Result<WalletLease, PayoutError> {
        let guard = self
            .lock_for(wallet)
            .try_lock_owned()
            .map_err(|_| PayoutError::WalletBusy(wallet.to_string()))?;
        debug!(wallet, "wallet lease acquired");
        Ok(WalletLease {
            wallet: wallet.to_string(),
            _guard: guard,
        })
    }

    /// Wait until the wallet is free
    pub async fn acquire(&self, wallet: &str) -> WalletLease {
        let guard = self.lock_for(wallet).lock_owned().await;
        debug!(wallet, "wallet lease acquired");
        WalletLease {
            wallet: wallet.to_string(),
            _guard: guard,
        }
    }

    pub fn is_leased(&self, wallet: &str) -> bool {
        self.lock_for(wallet).try_lock().is_err()
    }
}
