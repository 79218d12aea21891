//! WebSocket handler for the shared arena room
//!
//! Each connection is one nick. Every action a client sends is run
//! through the arena and the reply is broadcast to the whole room.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::AppState;
use crate::nick::validate_nick;

/// Outbound queue depth per session
const SESSION_QUEUE: usize = 32;

/// A connected player session
#[derive(Debug)]
pub struct PlayerSession {
    pub session_id: String,
    pub nick: String,
    pub sender: mpsc::Sender<ServerMessage>,
}

/// Session registration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("nick {0} is already connected")]
    NickInUse(String),
}

/// Connection manager for all active WebSocket connections, keyed by nick
#[derive(Default)]
pub struct ConnectionManager {
    sessions: RwLock<HashMap<String, PlayerSession>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session; a nick can only be connected once
    pub async fn register(&self, session: PlayerSession) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.nick) {
            return Err(SessionError::NickInUse(session.nick));
        }
        sessions.insert(session.nick.clone(), session);
        Ok(())
    }

    /// Remove a session, if it is still the one registered under `nick`
    pub async fn unregister(&self, nick: &str, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(nick)
            .is_some_and(|s| s.session_id == session_id)
        {
            sessions.remove(nick);
        }
    }

    /// Number of connected sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Send a message to everyone in the room except `author`, who gets
    /// it on their own socket.
    ///
    /// Never waits on a full queue; a reader that falls behind misses it.
    pub async fn broadcast_from(&self, author: &str, msg: ServerMessage) {
        let sessions = self.sessions.read().await;
        for session in sessions.values().filter(|s| s.nick != author) {
            if session.sender.try_send(msg.clone()).is_err() {
                warn!("Failed to broadcast to {}", session.nick);
            }
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once after the connection is accepted
    #[serde(rename = "welcome")]
    Welcome {
        session_id: String,
        nick: String,
        room: String,
        bot: String,
    },
    /// Arena reply to someone's command, seen by the whole room
    #[serde(rename = "reply")]
    Reply {
        bot: String,
        author: String,
        command: String,
        text: String,
        at: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A command line for the arena
    #[serde(rename = "action")]
    Action { text: String },
    /// Keep-alive, no response
    #[serde(rename = "ping")]
    Ping,
}

/// Query string of `/ws`
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub nick: String,
}

/// Handle WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    if let Err(e) = validate_nick(&params.nick) {
        warn!("Rejected nick {:?}: {}", params.nick, e);
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.nick))
}

/// Serialize and write one message straight to the socket
async fn send_direct(socket: &mut WebSocket, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode {:?}: {}", msg, e);
            false
        }
    }
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState, nick: String) {
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(SESSION_QUEUE);
    let session_id = uuid::Uuid::new_v4().to_string();

    let session = PlayerSession {
        session_id: session_id.clone(),
        nick: nick.clone(),
        sender: tx,
    };

    if let Err(e) = state.connections.register(session).await {
        warn!("Refused connection: {}", e);
        let error = ServerMessage::Error {
            message: e.to_string(),
        };
        send_direct(&mut socket, &error).await;
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    info!("{} connected to {} ({})", nick, state.room.name, session_id);

    let welcome = ServerMessage::Welcome {
        session_id: session_id.clone(),
        nick: nick.clone(),
        room: state.room.name.clone(),
        bot: state.room.bot_name.clone(),
    };
    if send_direct(&mut socket, &welcome).await {
        let mut shutdown = state.shutdown.clone();
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if !send_direct(&mut socket, &msg).await {
                        break;
                    }
                }
                result = socket.recv() => {
                    match result {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(client_msg) => {
                                    if let Some(reply) =
                                        handle_client_message(&state, &nick, client_msg).await
                                    {
                                        if !send_direct(&mut socket, &reply).await {
                                            break;
                                        }
                                    }
                                }
                                Err(e) => warn!("Ignoring bad frame from {}: {}", nick, e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        _ => {}
                    }
                }
                Ok(()) = shutdown.changed() => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    // The player stays in the arena; only the session goes away
    state.connections.unregister(&nick, &session_id).await;
    info!("{} disconnected ({})", nick, session_id);
}

/// Handle a message from the client. Returns the reply for the author's
/// own socket; the rest of the room gets it through their queues.
async fn handle_client_message(
    state: &AppState,
    nick: &str,
    msg: ClientMessage,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Action { text } => {
            debug!("{} command: {}", nick, text);

            let reply = {
                let mut arena = state.arena.lock();
                arena.parse(nick, &text)
            };
            if reply.is_empty() {
                return None;
            }

            let msg = ServerMessage::Reply {
                bot: state.room.bot_name.clone(),
                author: nick.to_string(),
                command: text,
                text: reply,
                at: chrono::Utc::now().to_rfc3339(),
            };
            state.connections.broadcast_from(nick, msg.clone()).await;
            Some(msg)
        }
        ClientMessage::Ping => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(nick: &str) -> (PlayerSession, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(4);
        let session = PlayerSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            nick: nick.to_string(),
            sender: tx,
        };
        (session, rx)
    }

    fn error(message: &str) -> ServerMessage {
        ServerMessage::Error {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_nick_registered_once() {
        let manager = ConnectionManager::new();
        let (first, _rx1) = session("alice");
        let (second, _rx2) = session("alice");

        manager.register(first).await.unwrap();
        assert_eq!(
            manager.register(second).await,
            Err(SessionError::NickInUse("alice".to_string()))
        );
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_checks_session() {
        let manager = ConnectionManager::new();
        let (alice, _rx) = session("alice");
        let id = alice.session_id.clone();
        manager.register(alice).await.unwrap();

        manager.unregister("alice", "some-other-session").await;
        assert_eq!(manager.count().await, 1);
        manager.unregister("alice", &id).await;
        assert_eq!(manager.count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let manager = ConnectionManager::new();
        let (alice, mut rx_a) = session("alice");
        let (bob, mut rx_b) = session("bob");
        manager.register(alice).await.unwrap();
        manager.register(bob).await.unwrap();

        manager.broadcast_from("carol", error("hello")).await;

        assert!(matches!(rx_a.recv().await, Some(ServerMessage::Error { message }) if message == "hello"));
        assert!(matches!(rx_b.recv().await, Some(ServerMessage::Error { message }) if message == "hello"));
    }

    #[tokio::test]
    async fn test_broadcast_skips_author() {
        let manager = ConnectionManager::new();
        let (alice, mut rx_a) = session("alice");
        let (bob, mut rx_b) = session("bob");
        manager.register(alice).await.unwrap();
        manager.register(bob).await.unwrap();

        manager.broadcast_from("alice", error("from alice")).await;

        assert!(matches!(rx_b.recv().await, Some(ServerMessage::Error { message }) if message == "from alice"));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_full_queue() {
        let manager = ConnectionManager::new();
        let (alice, mut rx) = session("alice");
        manager.register(alice).await.unwrap();

        for i in 0..6 {
            manager.broadcast_from("bob", error(&i.to_string())).await;
        }
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[test]
    fn test_message_format() {
        let json = serde_json::to_value(ServerMessage::Reply {
            bot: "RPGMutantes".to_string(),
            author: "alice".to_string(),
            command: "join".to_string(),
            text: "player alice joins the arena".to_string(),
            at: "2024-01-01T00:00:00+00:00".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "reply");
        assert_eq!(json["author"], "alice");
        assert_eq!(json["text"], "player alice joins the arena");

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"action","text":"attack bob"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Action { text } if text == "attack bob"));
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }
}
