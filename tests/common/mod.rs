//! Common test utilities - ArenaTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use arenad::arena::Arena;
use arenad::config::ItemSeed;
use arenad::{Config, Server};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// How long to wait for any single message
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test harness that runs a real arenad server on a random port
pub struct ArenaTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl ArenaTest {
    /// Start a server whose pool holds "banana" +1 and "sword" +2
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start a server after adjusting the default test config
    pub async fn start_with(adjust: impl FnOnce(&mut Config)) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let mut config = Config {
            bind_addr: addr,
            room: "#test-arena".to_string(),
            seed: Some(1234),
            items: vec![
                ItemSeed::new("banana").with_bonus(1),
                ItemSeed::new("sword").with_bonus(2),
            ],
            ..Config::default()
        };
        adjust(&mut config);

        let server = Arc::new(Server::new(config)?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Direct access to the arena for assertions
    pub fn arena(&self) -> Arc<Mutex<Arena>> {
        self.server.arena()
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }

    /// Get the WebSocket URL for a nick
    pub fn ws_url(&self, nick: &str) -> String {
        format!("ws://{}/ws?nick={}", self.addr, nick)
    }

    /// Connect without reading anything
    pub async fn connect_raw(&self, nick: &str) -> Result<WsClient> {
        let (ws_stream, _) = connect_async(self.ws_url(nick)).await?;
        let (write, read) = ws_stream.split();
        Ok(WsClient {
            nick: nick.to_string(),
            write,
            read,
        })
    }

    /// Connect as `nick` and consume the welcome message
    pub async fn connect(&self, nick: &str) -> Result<WsClient> {
        let mut client = self.connect_raw(nick).await?;
        let welcome = client.recv_json_timeout(RECV_TIMEOUT).await?;
        if welcome["type"] != "welcome" {
            bail!("expected welcome, got {}", welcome);
        }
        Ok(client)
    }
}

/// WebSocket client for testing
pub struct WsClient {
    pub nick: String,
    write: futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        Message,
    >,
    read: futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
}

impl WsClient {
    /// Send a command line to the arena
    pub async fn action(&mut self, text: &str) -> Result<()> {
        let msg = serde_json::json!({
            "type": "action",
            "text": text
        });
        self.send_raw(&msg.to_string()).await
    }

    /// Send a ping message
    pub async fn send_ping(&mut self) -> Result<()> {
        self.send_raw(r#"{"type":"ping"}"#).await
    }

    /// Send an arbitrary text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.write.send(Message::Text(text.to_string().into())).await?;
        Ok(())
    }

    /// Receive the next message as JSON
    pub async fn recv_json(&mut self) -> Result<Value> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    bail!("WebSocket closed");
                }
                Some(Err(e)) => return Err(e.into()),
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive with timeout
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> Result<Value> {
        match tokio::time::timeout(timeout, self.recv_json()).await {
            Ok(result) => result,
            Err(_) => bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Wait for the next reply and return its text
    pub async fn expect_reply(&mut self) -> Result<String> {
        let msg = self.recv_json_timeout(RECV_TIMEOUT).await?;
        if msg["type"] != "reply" {
            bail!("expected reply, got {}", msg);
        }
        Ok(msg["text"].as_str().unwrap_or_default().to_string())
    }

    /// Send a command and wait for the reply to it
    pub async fn say(&mut self, text: &str) -> Result<String> {
        self.action(text).await?;
        self.expect_reply().await
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}

impl Drop for ArenaTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
