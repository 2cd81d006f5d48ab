//! Per-connection subscription manager.
//!
//! Tracks which wallet IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::WalletId;

/// Manages the set of wallet subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed wallet IDs. If `subscribe_all` is true, this set is
    /// ignored.
    wallet_ids: HashSet<WalletId>,
    /// Whether the client subscribes to all wallets (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds wallet IDs to the subscription set. `"*"` enables the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[WalletId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for id in ids {
            self.wallet_ids.insert(*id);
        }
    }

    /// Removes wallet IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[WalletId]) {
        for id in ids {
            self.wallet_ids.remove(id);
        }
    }

    /// Returns `true` if the given wallet ID matches the subscription
    /// filter.
    #[must_use]
    pub fn matches(&self, wallet_id: WalletId) -> bool {
        self.subscribe_all || self.wallet_ids.contains(&wallet_id)
    }

    /// Returns the number of explicitly subscribed wallet IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.wallet_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(WalletId::new()));
    }

    #[test]
    fn subscribe_specific_wallet() {
        let mut mgr = SubscriptionManager::new();
        let id = WalletId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        assert!(!mgr.matches(WalletId::new()));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(WalletId::new()));
        assert!(mgr.matches(WalletId::new()));
    }

    #[test]
    fn unsubscribe_removes_wallet() {
        let mut mgr = SubscriptionManager::new();
        let id = WalletId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        mgr.unsubscribe(&[id]);
        assert!(!mgr.matches(id));
    }

    #[test]
    fn count_tracks_explicit() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.count(), 0);
        mgr.subscribe(&[WalletId::new(), WalletId::new()], false);
        assert_eq!(mgr.count(), 2);
    }
}
