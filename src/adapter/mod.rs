//! End-to-end adapter operations
//!
//! Every operation follows the same exchange:
//!
//! 1. compile the criteria into a statement (`query_builder`)
//! 2. POST `{query, params}` to the connection's `cypher` URI
//! 3. unwrap a server exception envelope into `AdapterError::Server`
//! 4. decode the rows (`result_decoder`)
//!
//! Create and update add a second exchange that registers the written node in
//! the spatial layer. The two exchanges are not atomic; a failure of the second
//! is reported as `AdapterError::SpatialRegistration` with the node already
//! written.

pub mod errors;
pub mod registry;
pub mod transport;

use serde_json::{json, Value};
use std::sync::Arc;

pub use errors::{AdapterError, RegistryError, TransportError};
pub use registry::{Connection, ConnectionRegistry, ServiceRoot};
pub use transport::{HttpTransport, Transport};

use crate::config::{ConnectionConfig, GeomConfig};
use crate::query_builder::statements::{
    compile_count, compile_create, compile_destroy, compile_find, compile_graph, compile_link,
    compile_nearby, compile_unlink, compile_update, SPATIAL_LAYER,
};
use crate::query_builder::{
    CompiledStatement, CountCriteria, CreateValues, DestroyCriteria, FindCriteria, GraphCriteria,
    LinkCriteria, NearbyCriteria, UnlinkCriteria, UpdateCriteria,
};
use crate::result_decoder::{
    decode_count, decode_graph, hydrate, CypherResponse, DecodeError, HydratedRecord,
    ServerException,
};

/// Cypher adapter over a `Transport`.
#[derive(Debug, Clone, Default)]
pub struct Adapter<T: Transport> {
    transport: T,
}

impl<T: Transport> Adapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Discovers the server behind `config` and stores it in `registry`.
    pub async fn register(
        &self,
        registry: &ConnectionRegistry,
        config: ConnectionConfig,
    ) -> Result<Arc<Connection>, AdapterError> {
        registry.register(&self.transport, config).await
    }

    pub async fn find(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &FindCriteria,
    ) -> Result<Vec<HydratedRecord>, AdapterError> {
        let response = self
            .execute(conn, "find", &compile_find(collection, criteria))
            .await?;
        Ok(hydrate(&response)?)
    }

    /// Creates one node and returns it with its assigned `id`.
    pub async fn create(
        &self,
        conn: &Connection,
        collection: &str,
        values: &CreateValues,
    ) -> Result<HydratedRecord, AdapterError> {
        let response = self
            .execute(conn, "create", &compile_create(collection, values))
            .await?;
        let record = hydrate(&response)?
            .into_iter()
            .next()
            .ok_or(DecodeError::NoRows)?;

        self.add_to_spatial_layer(conn, &record).await?;
        Ok(record)
    }

    /// Updates every matching node and returns the first one, if any matched.
    pub async fn update(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &UpdateCriteria,
    ) -> Result<Option<HydratedRecord>, AdapterError> {
        let response = self
            .execute(conn, "update", &compile_update(collection, criteria))
            .await?;
        let Some(record) = hydrate(&response)?.into_iter().next() else {
            return Ok(None);
        };

        self.add_to_spatial_layer(conn, &record).await?;
        Ok(Some(record))
    }

    pub async fn destroy(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &DestroyCriteria,
    ) -> Result<(), AdapterError> {
        self.execute(conn, "destroy", &compile_destroy(collection, criteria))
            .await?;
        Ok(())
    }

    pub async fn link(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &LinkCriteria,
    ) -> Result<(), AdapterError> {
        let statement = compile_link(collection, criteria, chrono::Utc::now());
        self.execute(conn, "link", &statement).await?;
        Ok(())
    }

    pub async fn unlink(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &UnlinkCriteria,
    ) -> Result<(), AdapterError> {
        self.execute(conn, "unlink", &compile_unlink(collection, criteria))
            .await?;
        Ok(())
    }

    /// Nodes within `criteria.anchor.dist` kilometers, each with its distance
    /// to the anchor.
    pub async fn nearby(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &NearbyCriteria,
    ) -> Result<Vec<HydratedRecord>, AdapterError> {
        let geom = spatial_fields(conn)?;
        let statement = compile_nearby(collection, criteria)?;
        let response = self.execute(conn, "nearby", &statement).await?;

        let point = criteria.anchor.point();
        let mut records = hydrate(&response)?;
        for record in &mut records {
            record.distance = record.distance_to(geom, point);
        }
        Ok(records)
    }

    /// `them` records, each with the relation graph towards the `me` anchor.
    pub async fn graph(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &GraphCriteria,
    ) -> Result<Vec<HydratedRecord>, AdapterError> {
        let geom = match criteria.nearby {
            Some(_) => Some(spatial_fields(conn)?),
            None => None,
        };
        let compiled = compile_graph(collection, criteria)?;
        let response = self.execute(conn, "graph", &compiled.statement).await?;

        let records = decode_graph(&response, &compiled.schema, |record| {
            let anchor = criteria.nearby.as_ref()?;
            record.distance_to(geom?, anchor.point())
        })?;
        Ok(records)
    }

    pub async fn count(
        &self,
        conn: &Connection,
        collection: &str,
        criteria: &CountCriteria,
    ) -> Result<u64, AdapterError> {
        let response = self
            .execute(conn, "count", &compile_count(collection, criteria))
            .await?;
        Ok(decode_count(&response)?)
    }

    async fn execute(
        &self,
        conn: &Connection,
        operation: &str,
        statement: &CompiledStatement,
    ) -> Result<CypherResponse, AdapterError> {
        if conn.config.debug {
            log::debug!("[{}] {}: {}", conn.identity(), operation, statement.statement);
        }
        log::trace!("[{}] {} params: {:?}", conn.identity(), operation, statement.bindings);

        let body = serde_json::to_value(statement).map_err(DecodeError::from)?;
        let response = self.post(&conn.service.cypher, &body).await?;
        Ok(serde_json::from_value(response).map_err(DecodeError::from)?)
    }

    /// POSTs `body` and turns an exception envelope into an error.
    async fn post(&self, uri: &str, body: &Value) -> Result<Value, AdapterError> {
        let response = self.transport.post_json(uri, body).await?;
        match ServerException::from_body(&response) {
            Some(exception) => {
                log::warn!("Server exception from {}: {}", uri, exception);
                Err(exception.into())
            }
            None => Ok(response),
        }
    }

    /// Adds a written node to the spatial layer when the connection has
    /// geometry fields, the server has the spatial plugin and the record
    /// carries both coordinates.
    async fn add_to_spatial_layer(
        &self,
        conn: &Connection,
        record: &HydratedRecord,
    ) -> Result<(), AdapterError> {
        let Some(geom) = conn.config.geom.as_ref() else {
            return Ok(());
        };
        if record.get(&geom.lat).is_none() || record.get(&geom.lon).is_none() {
            return Ok(());
        }
        let Some(uri) = conn.service.add_node_to_layer() else {
            log::warn!(
                "[{}] spatial plugin not installed, node not indexed",
                conn.identity()
            );
            return Ok(());
        };
        let Some(node_id) = record.id() else {
            log::warn!("[{}] written node has no id, not indexed", conn.identity());
            return Ok(());
        };

        let node_id = node_id.to_string();
        let body = json!({
            "layer": SPATIAL_LAYER,
            "node": conn.service.node_uri(&node_id),
        });
        if conn.config.debug {
            log::debug!("[{}] addNodeToLayer: {}", conn.identity(), body);
        }

        self.post(uri, &body)
            .await
            .map(|_| ())
            .map_err(|source| AdapterError::SpatialRegistration {
                node_id,
                source: Box::new(source),
            })
    }
}

fn spatial_fields(conn: &Connection) -> Result<&GeomConfig, RegistryError> {
    conn.config
        .geom
        .as_ref()
        .ok_or_else(|| RegistryError::SpatialNotConfigured(conn.identity().to_string()))
}
