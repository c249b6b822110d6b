use alloy_primitives::Address;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-wallet submission locks.
///
/// Relay nonces are fetched and consumed in separate round-trips, so every
/// submission from one wallet must hold that wallet's lock from nonce fetch
/// until the relay has accepted the transaction. Share one instance (behind an
/// `Arc`) between every client acting for the same wallet.
#[derive(Debug, Default)]
pub struct WalletLocks {
    locks: Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `wallet`
    pub async fn lock(&self, wallet: Address) -> OwnedMutexGuard<()> {
        let lock = self.locks.lock().entry(wallet).or_default().clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_same_wallet_is_exclusive() {
        let locks = WalletLocks::new();
        let wallet = Address::repeat_byte(1);

        let guard = locks.lock(wallet).await;
        assert_err!(timeout(Duration::from_millis(20), locks.lock(wallet)).await);

        drop(guard);
        assert_ok!(timeout(Duration::from_millis(20), locks.lock(wallet)).await);
    }

    #[tokio::test]
    async fn test_wallets_do_not_block_each_other() {
        let locks = WalletLocks::new();
        let _a = locks.lock(Address::repeat_byte(1)).await;
        assert_ok!(timeout(Duration::from_millis(20), locks.lock(Address::repeat_byte(2))).await);
    }
}
