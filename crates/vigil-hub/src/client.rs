// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A connected WebSocket client.
//!
//! Each client owns a bounded outbound buffer. Enqueueing never blocks: a
//! full buffer marks the client closed and signals its pumps to shut down,
//! so a slow client is dropped rather than stalling the hub.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Outbound buffer capacity per client.
pub const SEND_BUFFER: usize = 256;
/// Deadline for a single socket write.
pub const WRITE_WAIT: Duration = Duration::from_secs(10);
/// Window in which a pong must arrive.
pub const PONG_WAIT: Duration = Duration::from_secs(60);
/// Ping cadence, 9/10 of the pong window.
pub const PING_PERIOD: Duration = Duration::from_secs(54);
/// Largest accepted inbound frame, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Receiving half handed to the client's write pump.
pub struct ClientReceiver {
    pub outbound: mpsc::Receiver<Vec<u8>>,
    pub shutdown: CancellationToken,
}

/// Hub-side handle to one connection.
pub struct Client {
    id: Uuid,
    user_id: Option<Uuid>,
    role: String,
    outbound: mpsc::Sender<Vec<u8>>,
    shutdown: CancellationToken,
    closed: Mutex<bool>,
}

impl Client {
    /// Create a client and the receiver its write pump will consume.
    pub fn new(user_id: Option<Uuid>, role: impl Into<String>) -> (std::sync::Arc<Self>, ClientReceiver) {
        let (tx, rx) = mpsc::channel(SEND_BUFFER);
        let shutdown = CancellationToken::new();
        let client = std::sync::Arc::new(Client {
            id: Uuid::new_v4(),
            user_id,
            role: role.into(),
            outbound: tx,
            shutdown: shutdown.clone(),
            closed: Mutex::new(false),
        });
        (
            client,
            ClientReceiver {
                outbound: rx,
                shutdown,
            },
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Non-blocking enqueue.
    ///
    /// A full buffer (or a gone receiver) marks the client closed and
    /// cancels its pumps; the message is dropped.
    pub fn send(&self, message: &[u8]) {
        let mut closed = self.closed.lock().expect("client lock poisoned");
        if *closed {
            return;
        }

        if self.outbound.try_send(message.to_vec()).is_err() {
            *closed = true;
            self.shutdown.cancel();
        }
    }

    /// Idempotent close; signals the pumps to exit.
    pub fn close(&self) {
        let mut closed = self.closed.lock().expect("client lock poisoned");
        if *closed {
            return;
        }
        *closed = true;
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().expect("client lock poisoned")
    }

    /// Token cancelled when the client is closed.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
