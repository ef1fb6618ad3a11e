//! Wire types of the Cypher HTTP endpoint.
//!
//! A response is a table of positional rows:
//!
//! ```text
//! {
//!   "columns": ["them", "me", "r1", "h1"],
//!   "data": [
//!     [ {node}, {node}, [ {relationship}, ... ], {path} | null ],
//!     ...
//!   ]
//! }
//! ```
//!
//! Nodes and relationships are REST representations identified by their
//! `self` URI; paths list node and relationship URIs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw tabular response of the Cypher endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CypherResponse {
    #[serde(default)]
    pub columns: Vec<String>,
    /// `null` or missing data reads as no rows
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Vec<Value>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Vec<Value>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Vec<Value>>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A node as returned by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeObject {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(rename = "self", default)]
    pub self_uri: String,
}

impl NodeObject {
    /// Internal node id, taken from the `self` URI.
    pub fn node_id(&self) -> &str {
        trailing_segment(&self.self_uri)
    }
}

/// A relationship as returned by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipObject {
    #[serde(rename = "type")]
    pub rel_type: String,
    /// URI of the start node
    pub start: String,
    /// URI of the end node
    pub end: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(rename = "self", default)]
    pub self_uri: String,
}

impl RelationshipObject {
    pub fn start_id(&self) -> &str {
        trailing_segment(&self.start)
    }

    pub fn end_id(&self) -> &str {
        trailing_segment(&self.end)
    }
}

/// A path: ordered node URIs from the start node to the end node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathObject {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub length: Option<u64>,
}

impl PathObject {
    /// Node ids the path passes through after its start node.
    pub fn hops(&self) -> Vec<String> {
        self.nodes
            .iter()
            .skip(1)
            .map(|uri| trailing_segment(uri).to_string())
            .collect()
    }
}

/// Exception reported by the server in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerException {
    pub exception: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
}

impl fmt::Display for ServerException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.exception, message),
            None => write!(f, "{}", self.exception),
        }
    }
}

impl ServerException {
    /// Unwraps the exception carried by a response body, if any.
    ///
    /// Looks at `cause.exception` first, then at a bare top-level `exception`
    /// on bodies that carry no `data`.
    pub fn from_body(body: &Value) -> Option<Self> {
        let object = body.as_object()?;

        if let Some(cause) = object.get("cause").filter(|c| c.get("exception").is_some()) {
            return serde_json::from_value(cause.clone()).ok();
        }

        if object.contains_key("exception") && !object.contains_key("data") {
            return serde_json::from_value(body.clone()).ok();
        }

        None
    }
}

/// Last `/`-separated segment of a resource URI (`.../node/42` -> `42`).
pub fn trailing_segment(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(index) => &uri[index + 1..],
        None => uri,
    }
}
