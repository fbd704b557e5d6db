//! Shutdown coordination for the relay.

use tokio::sync::broadcast;

/// Broadcast handle that stops a running [`RelayServer`](crate::http::RelayServer).
///
/// The server drains in-flight relays (streams included) before `run` returns.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to `RelayServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. No-op when nothing is running.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Servers still waiting on this handle.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::http::RelayServer;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_trigger_stops_server() {
        let shutdown = Shutdown::new();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = RelayServer::new(RelayConfig::default()).unwrap();
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

        assert_eq!(shutdown.receiver_count(), 1);
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop after trigger")
            .unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers() {
        Shutdown::default().trigger();
    }
}
