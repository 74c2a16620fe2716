//! Realtime wallet channel.

pub mod channel;
pub mod dispatch;
pub mod transport;

pub use channel::{ChannelState, RealtimeChannel, WeakRealtimeChannel};
pub use dispatch::{DispatchOutcome, EventDispatcher};
pub use transport::{build_ws_url, Connector, Frame, FrameStream, WsConnector};
