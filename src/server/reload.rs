// src/server/reload.rs

use tokio::sync::broadcast;
use tracing::{debug, trace};

/// What connected browsers should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadSignal {
    /// Full page reload.
    Page,
    /// Re-fetch stylesheets without reloading the page.
    Css,
}

impl ReloadSignal {
    /// Payload sent over the event stream.
    pub fn as_str(self) -> &'static str {
        match self {
            ReloadSignal::Page => "page",
            ReloadSignal::Css => "css",
        }
    }
}

/// Handle used by tasks to push reload signals to browsers.
///
/// Cloning is cheap; every clone feeds the same set of subscribers. Signals
/// sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<ReloadSignal>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn reload_page(&self) {
        self.send(ReloadSignal::Page);
    }

    pub fn reload_css(&self) {
        self.send(ReloadSignal::Css);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.tx.subscribe()
    }

    fn send(&self, signal: ReloadSignal) {
        match self.tx.send(signal) {
            Ok(receivers) => debug!(signal = signal.as_str(), receivers, "reload signal sent"),
            Err(_) => trace!(signal = signal.as_str(), "no browsers connected; reload dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_signals_in_order() {
        let reload = LiveReload::new();
        let mut rx = reload.subscribe();

        reload.reload_css();
        reload.clone().reload_page();

        assert_eq!(rx.recv().await.unwrap(), ReloadSignal::Css);
        assert_eq!(rx.recv().await.unwrap(), ReloadSignal::Page);
    }

    #[test]
    fn signals_without_subscribers_are_dropped() {
        let reload = LiveReload::new();
        reload.reload_page();

        let mut late = reload.subscribe();
        assert!(late.try_recv().is_err());
    }
}
