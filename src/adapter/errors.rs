use thiserror::Error;

use crate::query_builder::QueryBuildError;
use crate::result_decoder::{DecodeError, ServerException};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response from {uri} is not JSON: {message}")]
    InvalidBody { uri: String, message: String },

    #[error("Cannot reach {uri}: {message}")]
    Unreachable { uri: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Connection is missing an identity")]
    MissingIdentity,

    #[error("Connection '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Connection '{0}' is not registered")]
    NotRegistered(String),

    #[error("Connection '{0}' has no geometry fields configured")]
    SpatialNotConfigured(String),
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Server exception: {0}")]
    Server(ServerException),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Cannot build query: {0}")]
    Build(#[from] QueryBuildError),

    #[error("Cannot decode response: {0}")]
    Decode(#[from] DecodeError),

    /// The node was written but adding it to the spatial layer failed.
    #[error("Node {node_id} was written but spatial registration failed: {source}")]
    SpatialRegistration {
        node_id: String,
        #[source]
        source: Box<AdapterError>,
    },
}

impl From<ServerException> for AdapterError {
    fn from(exception: ServerException) -> Self {
        AdapterError::Server(exception)
    }
}
