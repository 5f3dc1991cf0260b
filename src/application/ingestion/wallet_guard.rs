//! Per-wallet single-flight guard.
//!
//! Ingestion for one wallet must never interleave with itself: the
//! dedup check reads stored hashes before inserting, so two concurrent
//! runs over the same wallet could race it. Different wallets share no
//! mutable state and may run concurrently.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Tracks which wallets currently have an ingestion run in flight
#[derive(Clone, Default)]
pub struct WalletGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl WalletGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a wallet for ingestion. Returns None when a run for the same
    /// wallet is already in flight. The claim is released when the permit
    /// drops.
    pub fn try_acquire(&self, wallet_id: &str) -> Option<WalletPermit> {
        let mut in_flight = self.in_flight.lock().expect("wallet guard poisoned");
        if !in_flight.insert(wallet_id.to_string()) {
            return None;
        }
        Some(WalletPermit {
            wallet_id: wallet_id.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }
}

/// RAII claim on a wallet's ingestion slot
pub struct WalletPermit {
    wallet_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for WalletPermit {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.wallet_id);
        }
    }
}
