//! Connection management for MongoDB
//!
//! This module provides connection management functionality including:
//! - Connection establishment and termination
//! - Reachability check via `ping`
//! - Database handles for the asset repository

use mongodb::bson::doc;
use mongodb::{Client, Database, options::ClientOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result, describe_mongodb_error};

/// Application name reported to the server
const APP_NAME: &str = "media-export";

/// MongoDB connection manager
pub struct ConnectionManager {
    /// MongoDB client instance
    client: Option<Client>,

    /// Connection configuration
    config: ConnectionConfig,

    /// Current connection state
    state: Arc<RwLock<ConnectionState>>,
}

/// Connection state information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,

    /// Currently connecting
    Connecting,

    /// Connected and ready
    Connected,

    /// Connection failed
    Failed(String),
}

impl ConnectionManager {
    /// Create a new connection manager
    ///
    /// # Arguments
    /// * `config` - Connection configuration
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            client: None,
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Establish connection to MongoDB
    ///
    /// The client connects lazily, so a ping is sent to surface an
    /// unreachable server before the export starts.
    ///
    /// # Returns
    /// * `Result<()>` - Success or connection error
    pub async fn connect(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;

        let options = match self.client_options().await {
            Ok(options) => options,
            Err(e) => {
                self.set_state(ConnectionState::Failed(e.to_string())).await;
                return Err(e);
            }
        };

        let client = match Client::with_options(options) {
            Ok(client) => client,
            Err(e) => {
                let message = describe_mongodb_error(&e);
                self.set_state(ConnectionState::Failed(message.clone())).await;
                return Err(ConnectionError::ConnectionFailed(message).into());
            }
        };

        self.client = Some(client);

        if let Err(e) = self.ping().await {
            self.client = None;
            self.set_state(ConnectionState::Failed(e.to_string())).await;
            return Err(e);
        }

        self.set_state(ConnectionState::Connected).await;
        info!("Connected to {}", crate::cli::sanitize_uri(&self.config.uri));
        Ok(())
    }

    /// Disconnect from MongoDB
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            debug!("MongoDB client shut down");
        }
        self.set_state(ConnectionState::Disconnected).await;
        Ok(())
    }

    /// Get a handle to the configured database
    pub fn database(&self) -> Result<Database> {
        self.get_database(&self.config.database)
    }

    /// Get a database handle
    ///
    /// # Arguments
    /// * `name` - Database name
    ///
    /// # Returns
    /// * `Result<Database>` - Database handle or error
    pub fn get_database(&self, name: &str) -> Result<Database> {
        Ok(self.get_client()?.database(name))
    }

    /// Get the MongoDB client
    ///
    /// # Returns
    /// * `Result<&Client>` - Reference to client or error
    pub fn get_client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }

    /// Get current connection state
    pub async fn get_state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    /// Check if currently connected
    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.read().await, ConnectionState::Connected)
    }

    /// Parse the connection URI and apply timeouts
    async fn client_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::parse(&self.config.uri)
            .await
            .map_err(|e| ConnectionError::InvalidUri(describe_mongodb_error(&e)))?;

        let timeout = Duration::from_secs(self.config.timeout);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }
        Ok(options)
    }

    async fn set_state(&self, new_state: ConnectionState) {
        *self.state.write().await = new_state;
    }

    /// Verify connection is alive by sending a ping
    async fn ping(&self) -> Result<()> {
        let client = self.get_client()?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ConnectionError::PingFailed(describe_mongodb_error(&e)))?;
        debug!("Ping succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaExportError;

    #[test]
    fn test_connection_state() {
        let state = ConnectionState::Disconnected;
        assert_eq!(state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_new_manager_is_disconnected() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        assert_eq!(manager.get_state().await, ConnectionState::Disconnected);
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_database_requires_connection() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        let err = manager.database().unwrap_err();
        assert!(matches!(
            err,
            MediaExportError::Connection(ConnectionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_invalid_uri_fails_connect() {
        let config = ConnectionConfig {
            uri: "not-a-mongodb-uri".to_string(),
            ..ConnectionConfig::default()
        };
        let mut manager = ConnectionManager::new(config);

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(
            err,
            MediaExportError::Connection(ConnectionError::InvalidUri(_))
        ));
        assert!(matches!(
            manager.get_state().await,
            ConnectionState::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_client_options_apply_timeout_and_app_name() {
        let config = ConnectionConfig {
            timeout: 5,
            ..ConnectionConfig::default()
        };
        let manager = ConnectionManager::new(config);

        let options = manager.client_options().await.unwrap();
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.app_name.as_deref(), Some(APP_NAME));
    }

    #[tokio::test]
    async fn test_disconnect_without_client() {
        let mut manager = ConnectionManager::new(ConnectionConfig::default());
        manager.disconnect().await.unwrap();
        assert_eq!(manager.get_state().await, ConnectionState::Disconnected);
    }
}
