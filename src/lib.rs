//! arenad - arena combat daemon
//!
//! Players in a shared chat room join the arena, attack one another and
//! level up. The combat engine lives in [`combat`] and [`arena`]; [`api`]
//! is the WebSocket room that feeds it.

pub mod api;
pub mod arena;
pub mod combat;
pub mod config;
pub mod nick;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::{AppState, ConnectionManager, Room};
use arena::Arena;
pub use config::Config;

/// The arenad server instance
pub struct Server {
    config: Config,
    arena: Arc<Mutex<Arena>>,
    connections: Arc<ConnectionManager>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a server with a freshly seeded arena
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut arena = match config.seed {
            Some(seed) => Arena::seeded(seed),
            None => Arena::new(),
        };
        for item in &config.items {
            arena.add_seed_item(item);
        }
        info!(
            "Arena for {} seeded with {} items",
            config.room,
            arena.items().len()
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            arena: Arc::new(Mutex::new(arena)),
            connections: Arc::new(ConnectionManager::new()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the arena handle
    pub fn arena(&self) -> Arc<Mutex<Arena>> {
        self.arena.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn state(&self) -> AppState {
        AppState {
            arena: self.arena.clone(),
            connections: self.connections.clone(),
            room: Arc::new(Room {
                name: self.config.room.clone(),
                bot_name: self.config.bot_name.clone(),
            }),
            shutdown: self.shutdown_rx.clone(),
        }
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(
            "arenad listening on {} as {} in {}",
            local_addr, self.config.bot_name, self.config.room
        );

        let router = api::router(self.state());
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("arenad shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
