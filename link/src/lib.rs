//! # wallet-link
//!
//! Client library for the wallet backend: a session store, a typed API
//! client and a realtime channel that keeps balances current.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wallet_link::{EventHandlers, WalletContext, WalletLinkClient};
//!
//! # async fn example() -> wallet_link::Result<()> {
//! let client = WalletLinkClient::builder()
//!     .base_url("http://localhost:8080/api")
//!     .ws_url("ws://localhost:8080/ws")
//!     .build()?;
//!
//! let context = WalletContext::builder()
//!     .client(client)
//!     .event_handlers(EventHandlers::new().on_connect(|| println!("live")))
//!     .build()?;
//! context.init();
//!
//! context.login("alice", "p1").await?;
//! let history = context.transactions(None, None).await?;
//! println!("{} transactions", history.total);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod context;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod notify;
pub mod realtime;
pub mod session;
pub mod timeouts;

pub use api::ApiClient;
pub use auth::AuthProvider;
pub use client::{WalletLinkClient, WalletLinkClientBuilder};
pub use context::{WalletContext, WalletContextBuilder};
pub use error::{Result, WalletLinkError, FALLBACK_ERROR_MESSAGE};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    ApiEnvelope, ChannelOptions, MutationType, ProfileWallet, Role, ServerMessage,
    TopUpRequest, TransactionListResponse, TransactionResponse, TransactionType, TransferRequest,
    UserProfile, UserResponse, WalletMutationListResponse, WalletResponse,
};
pub use notify::{format_idr, LogNotificationSink, NotificationSink, Toast, ToastLevel};
pub use realtime::{ChannelState, Connector, Frame, FrameStream, RealtimeChannel, WsConnector};
pub use session::{
    AuthState, FileSessionPersistence, Identity, MemorySessionPersistence, Session,
    SessionPersistence, SessionStore, WalletSnapshot,
};
pub use timeouts::{LinkTimeouts, LinkTimeoutsBuilder};
