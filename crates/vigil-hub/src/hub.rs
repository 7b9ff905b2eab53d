// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The hub: client registry and broadcast coordinator.
//!
//! Register, unregister, and broadcast requests flow over channels into a
//! single coordinator loop; auxiliary readers (targeted broadcasts, counts)
//! take the read side of the registry lock. The hub never blocks on a
//! client: per-client enqueue is non-blocking and a full broadcast queue
//! drops the frame.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use vigil_metrics::recording;

use crate::client::Client;
use crate::message::WsMessage;

/// Capacity of the broadcast queue feeding the coordinator.
const BROADCAST_BUFFER: usize = 256;

#[derive(Default)]
struct Registry {
    clients: HashMap<Uuid, Arc<Client>>,
    user_clients: HashMap<Uuid, HashSet<Uuid>>,
}

struct Inbox {
    register_rx: mpsc::UnboundedReceiver<Arc<Client>>,
    unregister_rx: mpsc::UnboundedReceiver<Uuid>,
    broadcast_rx: mpsc::Receiver<Vec<u8>>,
}

/// Maintains the set of connected clients and fans messages out to them.
pub struct Hub {
    registry: RwLock<Registry>,
    register_tx: mpsc::UnboundedSender<Arc<Client>>,
    unregister_tx: mpsc::UnboundedSender<Uuid>,
    broadcast_tx: mpsc::Sender<Vec<u8>>,
    inbox: Mutex<Option<Inbox>>,
}

impl Hub {
    pub fn new() -> Self {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_BUFFER);

        Hub {
            registry: RwLock::new(Registry::default()),
            register_tx,
            unregister_tx,
            broadcast_tx,
            inbox: Mutex::new(Some(Inbox {
                register_rx,
                unregister_rx,
                broadcast_rx,
            })),
        }
    }

    /// The coordinator loop. Call once, from a dedicated task; runs until
    /// cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let Some(mut inbox) = self.inbox.lock().expect("hub lock poisoned").take() else {
            warn!("hub coordinator already running");
            return;
        };

        loop {
            tokio::select! {
                Some(client) = inbox.register_rx.recv() => self.register_client(client),
                Some(id) = inbox.unregister_rx.recv() => self.unregister_client(id),
                Some(frame) = inbox.broadcast_rx.recv() => self.broadcast_frame(&frame),
                _ = cancel.cancelled() => {
                    self.close_all();
                    return;
                }
            }
        }
    }

    fn register_client(&self, client: Arc<Client>) {
        let mut registry = self.registry.write().expect("hub lock poisoned");

        if let Some(user_id) = client.user_id() {
            registry
                .user_clients
                .entry(user_id)
                .or_default()
                .insert(client.id());
        }
        registry.clients.insert(client.id(), client);

        recording::record_ws_connection();
        recording::set_ws_active(registry.clients.len());
        info!(total_clients = registry.clients.len(), "websocket client connected");
    }

    fn unregister_client(&self, id: Uuid) {
        let mut registry = self.registry.write().expect("hub lock poisoned");

        let Some(client) = registry.clients.remove(&id) else {
            return;
        };
        if let Some(user_id) = client.user_id() {
            if let Some(ids) = registry.user_clients.get_mut(&user_id) {
                ids.remove(&id);
                if ids.is_empty() {
                    registry.user_clients.remove(&user_id);
                }
            }
        }
        client.close();

        recording::set_ws_active(registry.clients.len());
        info!(total_clients = registry.clients.len(), "websocket client disconnected");
    }

    fn broadcast_frame(&self, frame: &[u8]) {
        let registry = self.registry.read().expect("hub lock poisoned");
        for client in registry.clients.values() {
            client.send(frame);
        }
        recording::record_ws_messages_sent(registry.clients.len());
    }

    fn close_all(&self) {
        let registry = self.registry.read().expect("hub lock poisoned");
        for client in registry.clients.values() {
            client.close();
        }
    }

    /// Queue a client for registration with the coordinator.
    pub fn register(&self, client: Arc<Client>) {
        let _ = self.register_tx.send(client);
    }

    /// Queue a client for removal.
    pub fn unregister(&self, client_id: Uuid) {
        let _ = self.unregister_tx.send(client_id);
    }

    /// Broadcast to every client, via the coordinator.
    ///
    /// Serializes once; drops the frame (with a warning) when the
    /// coordinator queue is full.
    pub fn broadcast(&self, msg: &WsMessage) {
        let Ok(frame) = serde_json::to_vec(msg) else {
            warn!("failed to serialize broadcast message");
            return;
        };
        if self.broadcast_tx.try_send(frame).is_err() {
            warn!("broadcast queue full, dropping message");
        }
    }

    /// Send to every connection of one user.
    pub fn broadcast_to_user(&self, user_id: Uuid, msg: &WsMessage) {
        let Ok(frame) = serde_json::to_vec(msg) else {
            warn!("failed to serialize user message");
            return;
        };

        let registry = self.registry.read().expect("hub lock poisoned");
        let Some(ids) = registry.user_clients.get(&user_id) else {
            return;
        };
        let mut sent = 0;
        for id in ids {
            if let Some(client) = registry.clients.get(id) {
                client.send(&frame);
                sent += 1;
            }
        }
        recording::record_ws_messages_sent(sent);
    }

    /// Send to every client carrying the given role label.
    pub fn broadcast_to_role(&self, role: &str, msg: &WsMessage) {
        let Ok(frame) = serde_json::to_vec(msg) else {
            warn!("failed to serialize role message");
            return;
        };

        let registry = self.registry.read().expect("hub lock poisoned");
        let mut sent = 0;
        for client in registry.clients.values() {
            if client.role() == role {
                client.send(&frame);
                sent += 1;
            }
        }
        recording::record_ws_messages_sent(sent);
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.registry.read().expect("hub lock poisoned").clients.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SEND_BUFFER;
    use std::time::Duration;

    async fn started_hub() -> (Arc<Hub>, CancellationToken) {
        let hub = Arc::new(Hub::new());
        let cancel = CancellationToken::new();
        let run_hub = hub.clone();
        let run_cancel = cancel.clone();
        tokio::spawn(async move { run_hub.run(run_cancel).await });
        (hub, cancel)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn register_and_unregister_track_client_count() {
        let (hub, cancel) = started_hub().await;

        let (client, _rx) = Client::new(None, "viewer");
        let id = client.id();
        hub.register(client);
        settle().await;
        assert_eq!(hub.client_count(), 1);

        hub.unregister(id);
        settle().await;
        assert_eq!(hub.client_count(), 0);

        cancel.cancel();
    }

    #[tokio::test]
    async fn broadcast_reaches_every_client_in_order() {
        let (hub, cancel) = started_hub().await;

        let (a, mut rx_a) = Client::new(None, "viewer");
        let (b, mut rx_b) = Client::new(None, "viewer");
        hub.register(a);
        hub.register(b);
        settle().await;

        for i in 0..3 {
            hub.broadcast(&WsMessage::error(format!("m{i}")));
        }
        settle().await;

        for rx in [&mut rx_a, &mut rx_b] {
            for i in 0..3 {
                let frame = rx.outbound.try_recv().expect("missing frame");
                let msg: WsMessage = serde_json::from_slice(&frame).unwrap();
                assert_eq!(msg.payload.unwrap()["error"], format!("m{i}"));
            }
        }

        cancel.cancel();
    }

    #[tokio::test]
    async fn slow_client_is_dropped_and_others_still_receive() {
        let (hub, cancel) = started_hub().await;

        // `slow` never reads; `healthy` drains as we go.
        let (slow, slow_rx) = Client::new(None, "viewer");
        let (healthy, mut healthy_rx) = Client::new(None, "viewer");
        let slow_id = slow.id();
        let slow_handle = slow.clone();
        hub.register(slow);
        hub.register(healthy.clone());
        settle().await;

        let total = SEND_BUFFER + 1;
        let mut healthy_received = 0;
        for i in 0..total {
            hub.broadcast(&WsMessage::error(format!("m{i}")));
            // Drain the healthy client so its buffer never fills; also lets
            // the coordinator keep up with the bounded broadcast queue.
            tokio::task::yield_now().await;
            while healthy_rx.outbound.try_recv().is_ok() {
                healthy_received += 1;
            }
        }
        settle().await;
        while healthy_rx.outbound.try_recv().is_ok() {
            healthy_received += 1;
        }

        // The slow client was marked closed on the send past capacity.
        assert!(slow_handle.is_closed());
        assert!(slow_rx.shutdown.is_cancelled());
        assert_eq!(healthy_received, total);

        // The write pump observes the shutdown and unregisters.
        hub.unregister(slow_id);
        settle().await;
        assert_eq!(hub.client_count(), 1);

        cancel.cancel();
    }

    #[tokio::test]
    async fn targeted_broadcasts_filter_by_user_and_role() {
        let (hub, cancel) = started_hub().await;

        let user = Uuid::new_v4();
        let (mine, mut mine_rx) = Client::new(Some(user), "operator");
        let (other, mut other_rx) = Client::new(Some(Uuid::new_v4()), "viewer");
        let (anon, mut anon_rx) = Client::new(None, "viewer");
        hub.register(mine);
        hub.register(other);
        hub.register(anon);
        settle().await;

        hub.broadcast_to_user(user, &WsMessage::error("direct"));
        assert!(mine_rx.outbound.try_recv().is_ok());
        assert!(other_rx.outbound.try_recv().is_err());
        assert!(anon_rx.outbound.try_recv().is_err());

        hub.broadcast_to_role("viewer", &WsMessage::error("role"));
        assert!(other_rx.outbound.try_recv().is_ok());
        assert!(anon_rx.outbound.try_recv().is_ok());
        assert!(mine_rx.outbound.try_recv().is_err());

        cancel.cancel();
    }

    #[tokio::test]
    async fn unregistering_an_unknown_client_is_harmless() {
        let (hub, cancel) = started_hub().await;
        hub.unregister(Uuid::new_v4());
        settle().await;
        assert_eq!(hub.client_count(), 0);
        cancel.cancel();
    }
}
