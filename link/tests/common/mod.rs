#![allow(dead_code)]
//! Shared fakes for wallet-link integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use wallet_link::event_handlers::DisconnectReason;
use wallet_link::{
    Connector, Frame, FrameStream, Identity, NotificationSink, SessionStore, Toast,
    WalletLinkError, WalletSnapshot,
};

/// Let spawned tasks run until they are all waiting.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

pub fn wallet_update(wallet_id: u64, new_balance: &str) -> String {
    serde_json::json!({
        "type": "wallet_update",
        "payload": {
            "wallet_id": wallet_id,
            "new_balance": new_balance,
            "mutation_type": "credit",
            "amount": "50000"
        }
    })
    .to_string()
}

/// Session for alice (user 7, wallet 3, token t1).
pub fn alice_session() -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::new());
    session.set_session(
        "t1".to_string(),
        Identity::new(7, "alice"),
        Some(WalletSnapshot {
            id: 3,
            balance: "100.00".to_string(),
        }),
    );
    session
}

enum ServerEvent {
    Text(String),
    Close,
    Error(String),
}

/// In-process stand-in for the realtime endpoint.
#[derive(Default)]
pub struct FakeConnector {
    attempts: AtomicUsize,
    live: Arc<AtomicUsize>,
    fail_next: AtomicUsize,
    tokens: Mutex<Vec<Option<String>>>,
    servers: Mutex<Vec<mpsc::UnboundedSender<ServerEvent>>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `n` connection attempts fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Streams handed out and not yet closed.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().clone()
    }

    /// Push a text frame on the most recent connection.
    pub fn send_text(&self, text: impl Into<String>) {
        self.push(ServerEvent::Text(text.into()));
    }

    /// Server-side close of the most recent connection.
    pub fn close_latest(&self) {
        self.push(ServerEvent::Close);
    }

    pub fn error_latest(&self, message: &str) {
        self.push(ServerEvent::Error(message.to_string()));
    }

    fn push(&self, event: ServerEvent) {
        if let Some(tx) = self.servers.lock().last() {
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _url: &str,
        token: Option<&str>,
    ) -> wallet_link::Result<Box<dyn FrameStream>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().push(token.map(str::to_string));

        let pending_failures = self.fail_next.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.fail_next.store(pending_failures - 1, Ordering::SeqCst);
            return Err(WalletLinkError::WebSocketError("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.servers.lock().push(tx);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            rx,
            live: self.live.clone(),
            closed: false,
        }))
    }
}

struct FakeStream {
    rx: mpsc::UnboundedReceiver<ServerEvent>,
    live: Arc<AtomicUsize>,
    closed: bool,
}

impl FakeStream {
    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl FrameStream for FakeStream {
    async fn next_frame(&mut self) -> Option<wallet_link::Result<Frame>> {
        match self.rx.recv().await? {
            ServerEvent::Text(text) => Some(Ok(Frame::Text(text))),
            ServerEvent::Close => Some(Ok(Frame::Close(Some(DisconnectReason::with_code(
                "going away",
                1001,
            ))))),
            ServerEvent::Error(message) => Some(Err(WalletLinkError::WebSocketError(message))),
        }
    }

    async fn close(&mut self) {
        self.release();
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Notification sink that remembers everything it was given.
#[derive(Default)]
pub struct RecordingNotificationSink {
    pub native_granted: bool,
    pub natives: Mutex<Vec<(String, String)>>,
    pub toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn native_permission_granted(&self) -> bool {
        self.native_granted
    }

    fn native(&self, title: &str, body: &str) {
        self.natives.lock().push((title.to_string(), body.to_string()));
    }

    fn toast(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}
