//! Registered server connections
//!
//! Registration discovers the service root of a server once; every operation
//! then works on an `Arc<Connection>` snapshot resolved by identity, so no
//! lock is held across network calls.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::errors::{AdapterError, RegistryError};
use super::transport::Transport;
use crate::config::ConnectionConfig;
use crate::result_decoder::{DecodeError, ServerException};

/// Discovery document served at the REST service root.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceRoot {
    pub cypher: String,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub node_index: String,
    #[serde(default)]
    pub constraints: String,
    #[serde(default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Extensions {
    #[serde(rename = "SpatialPlugin")]
    pub spatial: Option<SpatialPlugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpatialPlugin {
    #[serde(rename = "addNodeToLayer")]
    pub add_node_to_layer: Option<String>,
}

impl ServiceRoot {
    /// URI of the spatial plugin's `addNodeToLayer` call, if installed.
    pub fn add_node_to_layer(&self) -> Option<&str> {
        self.extensions
            .spatial
            .as_ref()
            .and_then(|plugin| plugin.add_node_to_layer.as_deref())
    }

    /// URI of a node given its internal id.
    pub fn node_uri(&self, node_id: &str) -> String {
        format!("{}/{}", self.node.trim_end_matches('/'), node_id)
    }
}

/// A registered server.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub config: ConnectionConfig,
    pub service: ServiceRoot,
}

impl Connection {
    pub fn identity(&self) -> &str {
        &self.config.identity
    }
}

/// Store of registered connections keyed by identity.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers the service root at `config.endpoint()` and stores the
    /// connection under `config.identity`.
    pub async fn register<T: Transport + ?Sized>(
        &self,
        transport: &T,
        config: ConnectionConfig,
    ) -> Result<Arc<Connection>, AdapterError> {
        if config.identity.is_empty() {
            return Err(RegistryError::MissingIdentity.into());
        }
        if self.connections.read().await.contains_key(&config.identity) {
            return Err(RegistryError::AlreadyRegistered(config.identity).into());
        }

        let endpoint = config.endpoint();
        let body = transport.get_json(&endpoint).await?;
        if let Some(exception) = ServerException::from_body(&body) {
            return Err(exception.into());
        }
        let service: ServiceRoot = serde_json::from_value(body).map_err(DecodeError::from)?;

        let mut connections = self.connections.write().await;
        // A concurrent registration may have won while we were discovering
        if connections.contains_key(&config.identity) {
            return Err(RegistryError::AlreadyRegistered(config.identity).into());
        }

        let connection = Arc::new(Connection { config, service });
        connections.insert(connection.config.identity.clone(), connection.clone());
        log::info!(
            "Registered connection '{}' at {}",
            connection.identity(),
            endpoint
        );
        Ok(connection)
    }

    pub async fn resolve(&self, identity: &str) -> Result<Arc<Connection>, RegistryError> {
        self.connections
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(identity.to_string()))
    }

    /// Removes one connection, or all of them when `identity` is `None`.
    /// Removing an unknown identity is a no-op.
    pub async fn teardown(&self, identity: Option<&str>) {
        let mut connections = self.connections.write().await;
        match identity {
            Some(identity) => {
                if connections.remove(identity).is_some() {
                    log::info!("Tore down connection '{}'", identity);
                }
            }
            None => {
                log::info!("Tearing down {} connection(s)", connections.len());
                connections.clear();
            }
        }
    }

    pub async fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.connections.read().await.keys().cloned().collect();
        identities.sort();
        identities
    }
}
