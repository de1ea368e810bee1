//! Connectivity monitoring and online-transition edge detection
//!
//! Wraps the platform's network-status signal. Published state is the AND of
//! device connectivity and actual internet reachability; an unknown value on
//! either side counts as offline, so a drain is never started on ambiguous
//! state.

use std::sync::OnceLock;
use tokio::sync::{mpsc, watch};

/// Reason a drain was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainTrigger {
    /// Connectivity flipped from offline to online
    OnlineTransition,
    /// Explicit user action (e.g. pull-to-refresh)
    Manual,
}

/// Raw platform connectivity signals, as reported by the network stack.
///
/// `None` means the platform has not determined the value yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawConnectivity {
    pub device_connected: Option<bool>,
    pub internet_reachable: Option<bool>,
}

impl RawConnectivity {
    pub fn online() -> Self {
        Self {
            device_connected: Some(true),
            internet_reachable: Some(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            device_connected: Some(false),
            internet_reachable: Some(false),
        }
    }

    /// Both signals must be affirmatively true; unknown fails closed.
    pub fn is_online(&self) -> bool {
        self.device_connected == Some(true) && self.internet_reachable == Some(true)
    }
}

/// Observes connectivity events and fires on the offline → online edge.
///
/// Readers watch the published boolean via [`subscribe`](Self::subscribe);
/// the sync engine receives exactly one trigger per false→true transition,
/// never one per event while already online.
pub struct ConnectivityMonitor {
    online_tx: watch::Sender<bool>,
    on_online: OnceLock<mpsc::UnboundedSender<DrainTrigger>>,
}

impl ConnectivityMonitor {
    /// Create a monitor that starts offline until the first report says otherwise
    pub fn new() -> Self {
        let (online_tx, _) = watch::channel(false);
        Self {
            online_tx,
            on_online: OnceLock::new(),
        }
    }

    /// Register the online-transition callback channel.
    ///
    /// Idempotent: a second call keeps the first registration and warns, so
    /// a transition can never double-fire.
    pub fn initialize(&self, on_online: mpsc::UnboundedSender<DrainTrigger>) {
        if self.on_online.set(on_online).is_err() {
            tracing::warn!("Connectivity monitor already initialized; ignoring");
        }
    }

    /// Feed one platform connectivity event into the monitor.
    ///
    /// Recomputes the published state and fires the registered callback only
    /// on the false→true edge. All other transitions just update state.
    pub fn report(&self, raw: RawConnectivity) {
        let online = raw.is_online();
        let was_online = *self.online_tx.borrow();
        self.online_tx.send_replace(online);

        if online && !was_online {
            tracing::info!("Connectivity restored, requesting queue drain");
            if let Some(tx) = self.on_online.get() {
                // Receiver gone means the service shut down; nothing to drain.
                let _ = tx.send(DrainTrigger::OnlineTransition);
            }
        }
    }

    /// Current published online state
    pub fn is_online(&self) -> bool {
        *self.online_tx.borrow()
    }

    /// Watch the published online state
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_count(rx: &mut mpsc::UnboundedReceiver<DrainTrigger>) -> usize {
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_fires_once_per_online_edge() {
        let monitor = ConnectivityMonitor::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        monitor.initialize(tx);

        // offline, offline, online, online, offline, online => exactly 2 fires
        let events = [
            RawConnectivity::offline(),
            RawConnectivity::offline(),
            RawConnectivity::online(),
            RawConnectivity::online(),
            RawConnectivity::offline(),
            RawConnectivity::online(),
        ];
        for event in events {
            monitor.report(event);
        }

        assert_eq!(drain_count(&mut rx), 2);
        assert!(monitor.is_online());
    }

    #[test]
    fn test_unknown_signals_fail_closed() {
        let monitor = ConnectivityMonitor::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        monitor.initialize(tx);

        monitor.report(RawConnectivity {
            device_connected: Some(true),
            internet_reachable: None,
        });
        assert!(!monitor.is_online());

        monitor.report(RawConnectivity {
            device_connected: None,
            internet_reachable: Some(true),
        });
        assert!(!monitor.is_online());

        assert_eq!(drain_count(&mut rx), 0);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let monitor = ConnectivityMonitor::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        monitor.initialize(tx1);
        monitor.initialize(tx2);

        monitor.report(RawConnectivity::online());

        // Only the first registration receives the edge, exactly once.
        assert_eq!(drain_count(&mut rx1), 1);
        assert_eq!(drain_count(&mut rx2), 0);
    }

    #[test]
    fn test_state_published_without_callback() {
        let monitor = ConnectivityMonitor::new();
        let mut watched = monitor.subscribe();

        // No callback registered; published state still updates.
        monitor.report(RawConnectivity::online());
        assert!(*watched.borrow_and_update());

        monitor.report(RawConnectivity::offline());
        assert!(!*watched.borrow_and_update());
    }
}
