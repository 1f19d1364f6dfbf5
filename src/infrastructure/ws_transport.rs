// WebSocket adapter for the live position stream
use crate::application::tracking_connection::{LiveStream, StreamError, StreamTransport};
use crate::domain::session::SessionId;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

pub struct WsStreamTransport {
    ws_base_url: String,
}

impl WsStreamTransport {
    pub fn new(ws_base_url: String) -> Self {
        Self {
            ws_base_url: ws_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, session_id: SessionId) -> Result<Url, StreamError> {
        Url::parse(&format!("{}/tracking/ws/{session_id}", self.ws_base_url))
            .map_err(|e| StreamError::Connect(e.to_string()))
    }
}

#[async_trait]
impl StreamTransport for WsStreamTransport {
    async fn open(&self, session_id: SessionId) -> Result<Box<dyn LiveStream>, StreamError> {
        let url = self.endpoint(session_id)?;
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        Ok(Box::new(WsLiveStream { socket }))
    }
}

struct WsLiveStream {
    socket: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

#[async_trait]
impl LiveStream for WsLiveStream {
    async fn next_text(&mut self) -> Option<Result<String, StreamError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                // Protocol-level pings are answered here; they never reach
                // the message handler.
                Ok(Message::Ping(payload)) => {
                    let _ = self.socket.send(Message::Pong(payload)).await;
                }
                Ok(Message::Pong(_)) | Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(_)) => return None,
                Err(error) => return Some(Err(StreamError::Transport(error.to_string()))),
            }
        }
    }

    async fn send_keepalive(&mut self) -> Result<(), StreamError> {
        // The backend expects the literal text `ping` and answers `pong`.
        self.socket
            .send(Message::Text("ping".into()))
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.socket.close(None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_builds_stream_url_for_session() {
        let transport = WsStreamTransport::new("wss://fleet.example.com/api/".to_string());
        let url = transport.endpoint(SessionId(42)).unwrap();
        assert_eq!(url.as_str(), "wss://fleet.example.com/api/tracking/ws/42");
    }

    #[test]
    fn test_endpoint_rejects_unparseable_base() {
        let transport = WsStreamTransport::new("not a url".to_string());
        assert!(transport.endpoint(SessionId(1)).is_err());
    }
}
