//! WebSocket transport behind the realtime channel.
//!
//! The channel only sees [`Connector`] and [`FrameStream`], so tests can
//! drive it without a socket.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{Result, WalletLinkError};
use crate::event_handlers::DisconnectReason;

/// Inbound frame as seen by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Server closed the socket
    Close(Option<DisconnectReason>),
}

/// An open, receive-only connection.
#[async_trait]
pub trait FrameStream: Send {
    /// Next frame. `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<Result<Frame>>;

    /// Close the connection. Errors are swallowed.
    async fn close(&mut self);
}

/// Opens connections to the realtime endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str, token: Option<&str>) -> Result<Box<dyn FrameStream>>;
}

/// Append the session token as the `token` query parameter.
pub fn build_ws_url(base: &str, token: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(base)?;
    match url.scheme() {
        "ws" | "wss" => {},
        "http" => {
            let _ = url.set_scheme("ws");
        },
        "https" => {
            let _ = url.set_scheme("wss");
        },
        other => {
            return Err(WalletLinkError::ConfigurationError(format!(
                "Unsupported WebSocket scheme '{}'",
                other
            )))
        },
    }
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

/// [`Connector`] backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str, token: Option<&str>) -> Result<Box<dyn FrameStream>> {
        let url = build_ws_url(url, token)?;
        let (ws_stream, response) = connect_async(url.as_str()).await?;
        log::debug!("[REALTIME] WebSocket handshake complete, status: {}", response.status());
        Ok(Box::new(WsFrameStream { ws_stream }))
    }
}

struct WsFrameStream {
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.ws_stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.to_string()))),
                Ok(Message::Close(frame)) => {
                    let reason = frame.map(|f| {
                        DisconnectReason::with_code(f.reason.to_string(), f.code.into())
                    });
                    return Some(Ok(Frame::Close(reason)));
                },
                Ok(Message::Binary(data)) => {
                    log::debug!("[REALTIME] Ignoring binary frame ({} bytes)", data.len());
                },
                // tungstenite answers pings on the next read
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {},
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws_stream.close(None).await {
            log::debug!("[REALTIME] Error while closing WebSocket: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_query_param() {
        let url = build_ws_url("ws://localhost:8080/ws", Some("t1")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/ws?token=t1");
    }

    #[test]
    fn test_no_token_leaves_url_untouched() {
        let url = build_ws_url("wss://wallet.example.com/ws", None).unwrap();
        assert_eq!(url.as_str(), "wss://wallet.example.com/ws");
        let url = build_ws_url("wss://wallet.example.com/ws", Some("")).unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_http_scheme_is_upgraded() {
        let url = build_ws_url("https://wallet.example.com/ws", Some("a b")).unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.query(), Some("token=a+b"));
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(build_ws_url("ftp://example.com/ws", None).is_err());
    }
}
