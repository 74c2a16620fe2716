//! The realtime wallet channel: one live connection per context, fixed-delay
//! reconnect, and dispatch of inbound frames.
//!
//! Every connection attempt gets a generation number. Close signals and
//! reconnect timers carry the generation they were created for and are
//! ignored once a newer `connect()` or a `disconnect()` has bumped it, so a
//! torn-down connection can never trigger a reconnect.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::dispatch::EventDispatcher;
use super::transport::{Connector, Frame, FrameStream};
use crate::event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
use crate::models::ChannelOptions;
use crate::notify::NotificationSink;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

struct ConnectionHandle {
    generation: u64,
    shutdown_tx: oneshot::Sender<()>,
}

struct ChannelSlot {
    state: ChannelState,
    reconnect_eligible: bool,
    generation: u64,
    connection: Option<ConnectionHandle>,
    reconnect_timer: Option<JoinHandle<()>>,
    reconnect_attempts: u32,
}

struct ChannelInner {
    url: String,
    options: ChannelOptions,
    connector: Arc<dyn Connector>,
    session: Arc<SessionStore>,
    dispatcher: EventDispatcher,
    handlers: EventHandlers,
    // Never held across an await or while running handlers.
    slot: Mutex<ChannelSlot>,
}

/// Handle to the realtime channel. Clones share the same connection.
///
/// `connect`, and anything that may reconnect, must run inside a tokio
/// runtime.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<ChannelInner>,
}

/// Non-owning handle, used by session clear hooks.
#[derive(Clone)]
pub struct WeakRealtimeChannel {
    inner: Weak<ChannelInner>,
}

impl WeakRealtimeChannel {
    pub fn upgrade(&self) -> Option<RealtimeChannel> {
        self.inner.upgrade().map(|inner| RealtimeChannel { inner })
    }
}

impl RealtimeChannel {
    pub fn new(
        url: impl Into<String>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn NotificationSink>,
        connector: Arc<dyn Connector>,
        options: ChannelOptions,
        handlers: EventHandlers,
    ) -> Self {
        let dispatcher = EventDispatcher::new(session.clone(), notifier);
        Self {
            inner: Arc::new(ChannelInner {
                url: url.into(),
                options,
                connector,
                session,
                dispatcher,
                handlers,
                slot: Mutex::new(ChannelSlot {
                    state: ChannelState::Disconnected,
                    reconnect_eligible: false,
                    generation: 0,
                    connection: None,
                    reconnect_timer: None,
                    reconnect_attempts: 0,
                }),
            }),
        }
    }

    /// Open the connection, replacing any existing one.
    ///
    /// Returns immediately; the handshake runs on a background task and
    /// failures go through the reconnect path and `on_error`.
    pub fn connect(&self) {
        let mut slot = self.inner.slot.lock();
        slot.reconnect_eligible = true;
        slot.reconnect_attempts = 0;
        ChannelInner::open_locked(&self.inner, &mut slot);
    }

    /// Close the connection and cancel any pending reconnect.
    pub fn disconnect(&self) {
        let mut slot = self.inner.slot.lock();
        let was_active = slot.state != ChannelState::Disconnected || slot.reconnect_timer.is_some();
        slot.reconnect_eligible = false;
        if let Some(timer) = slot.reconnect_timer.take() {
            timer.abort();
        }
        ChannelInner::teardown_locked(&mut slot);
        slot.generation += 1;
        slot.state = ChannelState::Disconnected;
        slot.reconnect_attempts = 0;
        drop(slot);

        if was_active {
            log::info!("[REALTIME] Channel disconnected");
        }
    }

    /// Final teardown of the channel.
    pub fn dispose(&self) {
        self.disconnect();
        log::debug!("[REALTIME] Channel disposed");
    }

    pub fn state(&self) -> ChannelState {
        self.inner.slot.lock().state
    }

    /// Connected or in the middle of connecting.
    pub fn is_active(&self) -> bool {
        self.state() != ChannelState::Disconnected
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.inner.slot.lock().reconnect_timer.is_some()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.slot.lock().reconnect_attempts
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn downgrade(&self) -> WeakRealtimeChannel {
        WeakRealtimeChannel {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("RealtimeChannel")
            .field("url", &self.inner.url)
            .field("state", &slot.state)
            .field("generation", &slot.generation)
            .field("reconnect_eligible", &slot.reconnect_eligible)
            .finish()
    }
}

impl ChannelInner {
    fn open_locked(self: &Arc<Self>, slot: &mut ChannelSlot) {
        if let Some(timer) = slot.reconnect_timer.take() {
            timer.abort();
        }
        Self::teardown_locked(slot);

        slot.generation += 1;
        let generation = slot.generation;
        slot.state = ChannelState::Connecting;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        slot.connection = Some(ConnectionHandle {
            generation,
            shutdown_tx,
        });

        log::debug!("[REALTIME] Opening connection (generation {})", generation);
        tokio::spawn(Arc::clone(self).run_connection(generation, shutdown_rx));
    }

    fn teardown_locked(slot: &mut ChannelSlot) {
        if let Some(connection) = slot.connection.take() {
            log::debug!("[REALTIME] Tearing down connection (generation {})", connection.generation);
            let _ = connection.shutdown_tx.send(());
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        let slot = self.slot.lock();
        slot.generation == generation && slot.reconnect_eligible
    }

    async fn run_connection(self: Arc<Self>, generation: u64, mut shutdown_rx: oneshot::Receiver<()>) {
        if !self.is_current(generation) {
            return;
        }

        let Some(token) = self.session.token() else {
            log::debug!("[REALTIME] No session token, not connecting");
            let mut slot = self.slot.lock();
            if slot.generation == generation {
                slot.connection = None;
                slot.state = ChannelState::Disconnected;
            }
            return;
        };

        let connect = tokio::time::timeout(
            self.options.connect_timeout,
            self.connector.connect(&self.url, Some(&token)),
        );
        let mut stream: Box<dyn FrameStream> = tokio::select! {
            _ = &mut shutdown_rx => return,
            result = connect => match result {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    self.handle_closed(generation, None, Some(e.to_string()));
                    return;
                },
                Err(_) => {
                    self.handle_closed(generation, None, Some("Connection timed out".to_string()));
                    return;
                },
            },
        };

        if !self.mark_connected(generation) {
            stream.close().await;
            return;
        }
        log::info!("[REALTIME] Connected to {}", self.url);
        self.handlers.emit_connect();

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    stream.close().await;
                    self.handlers
                        .emit_disconnect(DisconnectReason::with_code("Closed by client", 1000));
                    return;
                },
                frame = stream.next_frame() => match frame {
                    Some(Ok(Frame::Text(text))) => {
                        self.handlers.emit_receive(&text);
                        if !self.is_current(generation) {
                            return;
                        }
                        self.dispatcher.dispatch(&text);
                    },
                    Some(Ok(Frame::Close(reason))) => {
                        let reason =
                            reason.unwrap_or_else(|| DisconnectReason::new("Server closed connection"));
                        self.handle_closed(generation, Some(reason), None);
                        return;
                    },
                    Some(Err(e)) => {
                        let message = e.to_string();
                        self.handle_closed(
                            generation,
                            Some(DisconnectReason::new(format!("WebSocket error: {}", message))),
                            Some(message),
                        );
                        return;
                    },
                    None => {
                        self.handle_closed(
                            generation,
                            Some(DisconnectReason::new("WebSocket stream ended")),
                            None,
                        );
                        return;
                    },
                },
            }
        }
    }

    fn mark_connected(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.generation != generation || !slot.reconnect_eligible {
            return false;
        }
        slot.state = ChannelState::Connected;
        slot.reconnect_attempts = 0;
        true
    }

    /// Close or failure of the connection of `generation`.
    fn handle_closed(
        self: &Arc<Self>,
        generation: u64,
        reason: Option<DisconnectReason>,
        error: Option<String>,
    ) {
        let reconnecting = {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                log::debug!("[REALTIME] Ignoring close of superseded generation {}", generation);
                return;
            }
            slot.connection = None;
            slot.state = ChannelState::Disconnected;

            let reconnecting = slot.reconnect_eligible
                && self.options.allows_reconnect(slot.reconnect_attempts);
            if reconnecting {
                slot.reconnect_attempts += 1;
                self.schedule_reconnect_locked(&mut slot, generation);
            }
            reconnecting
        };

        if let Some(message) = error {
            log::warn!("[REALTIME] Connection error: {}", message);
            self.handlers.emit_error(ConnectionError::new(message, reconnecting));
        }
        if let Some(reason) = reason {
            log::info!("[REALTIME] Connection closed: {}", reason);
            self.handlers.emit_disconnect(reason);
        }
        if reconnecting {
            log::info!("[REALTIME] Reconnecting in {:?}", self.options.reconnect_delay);
        }
    }

    fn schedule_reconnect_locked(self: &Arc<Self>, slot: &mut ChannelSlot, generation: u64) {
        if let Some(timer) = slot.reconnect_timer.take() {
            timer.abort();
        }
        let inner = Arc::clone(self);
        let delay = self.options.reconnect_delay;
        slot.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire_reconnect(generation);
        }));
    }

    fn fire_reconnect(self: &Arc<Self>, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            return;
        }
        slot.reconnect_timer = None;
        if !slot.reconnect_eligible || slot.connection.is_some() {
            return;
        }
        log::debug!("[REALTIME] Reconnect attempt {}", slot.reconnect_attempts);
        Self::open_locked(self, &mut slot);
    }
}
