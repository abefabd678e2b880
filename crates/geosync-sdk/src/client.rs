//! geosync client for publishing positions and watching broadcasts.

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use geosync_core::{ClientFrame, LocationBroadcast, LocationUpdate, ServerEvent};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const STREAM_PATH: &str = "/v1/stream";

/// Client for connecting to a geosync server.
pub struct GeoSyncClient {
    pub(crate) base_url: String,
    pub(crate) stream_token: Option<String>,
    pub(crate) client: reqwest::Client,
}

/// An open stream connection.
pub struct LocationStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl GeoSyncClient {
    /// Create a new client for `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stream_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Token presented when opening the stream, for servers that require one.
    pub fn set_stream_token(&mut self, token: Option<String>) {
        self.stream_token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true when the server answers its health check.
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Open the WebSocket stream.
    pub async fn connect(&self) -> Result<LocationStream> {
        let url = build_ws_url(&self.base_url, STREAM_PATH)?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = self.stream_token.as_deref() {
            request.headers_mut().insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        let (socket, _) = connect_async(request).await?;
        tracing::debug!("Connected to {}", url);
        Ok(LocationStream { socket })
    }
}

impl LocationStream {
    /// Publish a position signed with `token`.
    pub async fn send_update(&mut self, token: &str, latitude: f64, longitude: f64) -> Result<()> {
        let frame = ClientFrame::update_location(&LocationUpdate::new(token, latitude, longitude));
        self.send_frame(&frame).await
    }

    /// Send an arbitrary envelope.
    pub async fn send_frame(&mut self, frame: &ClientFrame) -> Result<()> {
        let text = serde_json::to_string(frame)?;
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Read the next server event (returns None on close).
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>> {
        while let Some(msg) = self.socket.next().await {
            match msg? {
                Message::Text(text) => {
                    let event = serde_json::from_str(&text)?;
                    return Ok(Some(event));
                }
                Message::Binary(data) => {
                    if let Ok(event) = serde_json::from_slice(&data) {
                        return Ok(Some(event));
                    }
                }
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Skip ahead to the next `userLocationUpdate`, returning its entries.
    pub async fn next_broadcast(&mut self) -> Result<Option<Vec<LocationBroadcast>>> {
        loop {
            match self.next_event().await? {
                Some(ServerEvent::UserLocationUpdate(entries)) => return Ok(Some(entries)),
                Some(ServerEvent::Error(payload)) => {
                    tracing::debug!("Skipping error event: {}", payload.message);
                }
                None => return Ok(None),
            }
        }
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await?;
        Ok(())
    }
}

fn build_ws_url(base: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => other,
    }
    .to_string();

    url.set_scheme(&scheme)
        .map_err(|_| anyhow::anyhow!("Invalid base URL scheme"))?;
    url.set_path(path);
    Ok(url)
}
