//! Application context tying the session store, API client and realtime
//! channel together.
//!
//! One [`WalletContext`] corresponds to one browser tab in the web client:
//! it owns exactly one session and one realtime connection. Call
//! [`WalletContext::init`] after building and [`WalletContext::dispose`] at
//! teardown.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    client::WalletLinkClient,
    error::{Result, WalletLinkError},
    event_handlers::EventHandlers,
    models::{
        ChannelOptions, TopUpRequest, TransactionListResponse, TransactionResponse,
        TransferRequest, UserProfile, UserResponse, WalletMutationListResponse, WalletResponse,
    },
    notify::{LogNotificationSink, NotificationSink},
    realtime::{Connector, RealtimeChannel, WsConnector},
    session::{Identity, SessionPersistence, SessionStore},
};

/// Session, API client and realtime channel of one client instance.
///
/// # Example
///
/// ```rust,no_run
/// use wallet_link::{WalletContext, WalletLinkClient};
///
/// # async fn example() -> wallet_link::Result<()> {
/// let client = WalletLinkClient::builder()
///     .base_url("http://localhost:8080/api")
///     .ws_url("ws://localhost:8080/ws")
///     .build()?;
/// let context = WalletContext::builder().client(client).build()?;
/// context.init();
///
/// context.login("alice", "p1").await?;
/// let profile = context.load_profile().await?;
/// println!("balance: {:?}", profile.wallet);
///
/// context.logout().await;
/// context.dispose();
/// # Ok(())
/// # }
/// ```
pub struct WalletContext {
    client: WalletLinkClient,
    session: Arc<SessionStore>,
    channel: RealtimeChannel,
}

impl WalletContext {
    pub fn builder() -> WalletContextBuilder {
        WalletContextBuilder::new()
    }

    /// Restore a persisted session and reconnect the channel if one was found.
    ///
    /// Must run inside a tokio runtime.
    pub fn init(&self) -> bool {
        let restored = self.session.hydrate();
        if restored {
            log::info!("[SESSION] Restored session, connecting realtime channel");
            self.channel.connect();
        }
        restored
    }

    /// Disconnect the channel. The session is left as is.
    pub fn dispose(&self) {
        self.channel.dispose();
    }

    pub fn client(&self) -> &WalletLinkClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn channel(&self) -> &RealtimeChannel {
        &self.channel
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Log in, start the session and connect the channel.
    ///
    /// On failure any existing session is cleared and the backend's message
    /// is returned.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserResponse> {
        let result = self.client.login(username, password).await;
        self.start_session(result)
    }

    /// Register, start the session and connect the channel.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserResponse> {
        let result = self.client.register(username, password).await;
        self.start_session(result)
    }

    fn start_session(&self, result: Result<UserResponse>) -> Result<UserResponse> {
        match result {
            Ok(user) => {
                self.session.set_session(
                    user.token.clone(),
                    Identity::new(user.id, user.username.clone()),
                    None,
                );
                self.channel.connect();
                Ok(user)
            },
            Err(e) => {
                log::debug!("[SESSION] Authentication failed: {}", e);
                self.session.clear_session();
                Err(e)
            },
        }
    }

    /// Fetch `/users/me` into the session and make sure the channel is up.
    ///
    /// Any failure clears the session, unless the session changed while the
    /// request was in flight.
    pub async fn load_profile(&self) -> Result<UserProfile> {
        let token = self.session.token().ok_or(WalletLinkError::NotAuthenticated)?;

        match self.client.me(&token).await {
            Ok(profile) => {
                if !self.session.set_profile(&token, &profile) {
                    return Err(WalletLinkError::NotAuthenticated);
                }
                if !self.channel.is_active() {
                    self.channel.connect();
                }
                Ok(profile)
            },
            Err(e) => {
                if self.session.token().as_deref() == Some(token.as_str()) {
                    log::warn!("[SESSION] Profile fetch failed, clearing session: {}", e);
                    self.session.clear_session();
                }
                Err(e)
            },
        }
    }

    /// Log out on the backend, then disconnect and clear locally.
    ///
    /// A failing logout request is logged and otherwise ignored.
    pub async fn logout(&self) {
        if let Some(token) = self.session.token() {
            if let Err(e) = self.client.logout(&token).await {
                log::warn!("[SESSION] Logout request failed: {}", e);
            }
        }
        self.channel.disconnect();
        self.session.clear_session();
    }

    pub async fn wallet(&self) -> Result<WalletResponse> {
        let token = self.require_token()?;
        self.client.my_wallet(&token).await
    }

    pub async fn transfer(
        &self,
        to_user_id: u64,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransactionResponse> {
        let token = self.require_token()?;
        let request = TransferRequest {
            to_user_id,
            amount,
            description,
        };
        self.client.transfer(&token, &request).await
    }

    pub async fn top_up(
        &self,
        to_user_id: u64,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransactionResponse> {
        let token = self.require_token()?;
        let request = TopUpRequest {
            to_user_id,
            amount,
            description,
        };
        self.client.top_up(&token, &request).await
    }

    pub async fn transactions(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<TransactionListResponse> {
        let token = self.require_token()?;
        self.client.list_transactions(&token, page, limit).await
    }

    pub async fn wallet_mutations(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<WalletMutationListResponse> {
        let token = self.require_token()?;
        self.client.list_wallet_mutations(&token, page, limit).await
    }

    fn require_token(&self) -> Result<String> {
        self.session.token().ok_or(WalletLinkError::NotAuthenticated)
    }
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("client", &self.client)
            .field("session", &self.session)
            .field("channel", &self.channel)
            .finish()
    }
}

/// Builder for [`WalletContext`].
pub struct WalletContextBuilder {
    client: Option<WalletLinkClient>,
    ws_url: Option<String>,
    persistence: Option<Arc<dyn SessionPersistence>>,
    connector: Option<Arc<dyn Connector>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    channel_options: ChannelOptions,
    event_handlers: EventHandlers,
}

impl WalletContextBuilder {
    fn new() -> Self {
        Self {
            client: None,
            ws_url: None,
            persistence: None,
            connector: None,
            notifier: None,
            channel_options: ChannelOptions::default(),
            event_handlers: EventHandlers::default(),
        }
    }

    pub fn client(mut self, client: WalletLinkClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the client's WebSocket URL.
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    pub fn persistence(mut self, persistence: Arc<dyn SessionPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn channel_options(mut self, options: ChannelOptions) -> Self {
        self.channel_options = options;
        self
    }

    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    pub fn build(self) -> Result<WalletContext> {
        let client = self
            .client
            .ok_or_else(|| WalletLinkError::ConfigurationError("client is required".into()))?;
        let ws_url = self
            .ws_url
            .or_else(|| client.ws_url().map(str::to_string))
            .ok_or_else(|| WalletLinkError::ConfigurationError("ws_url is required".into()))?;

        let session = Arc::new(match self.persistence {
            Some(persistence) => SessionStore::with_persistence(persistence),
            None => SessionStore::new(),
        });
        let connector = self.connector.unwrap_or_else(|| Arc::new(WsConnector) as Arc<dyn Connector>);
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotificationSink) as Arc<dyn NotificationSink>);

        let channel = RealtimeChannel::new(
            ws_url,
            session.clone(),
            notifier,
            connector,
            self.channel_options,
            self.event_handlers,
        );

        // Clearing the session always takes the channel down with it.
        let weak_channel = channel.downgrade();
        session.on_clear(Arc::new(move || {
            if let Some(channel) = weak_channel.upgrade() {
                channel.disconnect();
            }
        }));

        Ok(WalletContext {
            client,
            session,
            channel,
        })
    }
}
