use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for the realtime wallet channel.
///
/// # Example
///
/// ```rust
/// use wallet_link::ChannelOptions;
/// use std::time::Duration;
///
/// let options = ChannelOptions::default()
///     .with_reconnect_delay(Duration::from_secs(2))
///     .with_max_reconnect_attempts(Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOptions {
    /// Fixed delay before reconnecting after an unexpected close.
    /// Default: 5 seconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: Duration,

    /// Maximum number of consecutive reconnection attempts.
    /// Default: None (unbounded). `Some(0)` disables reconnection.
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,

    /// Time allowed for the WebSocket handshake.
    /// Default: 10 seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: default_reconnect_delay(),
            max_reconnect_attempts: None,
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl ChannelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Pass None for unbounded retries, Some(0) to disable reconnection
    pub fn with_max_reconnect_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether another reconnect may be scheduled after `attempts` failures.
    pub fn allows_reconnect(&self, attempts: u32) -> bool {
        match self.max_reconnect_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }
}
