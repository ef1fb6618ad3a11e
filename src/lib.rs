//! Cypher-over-HTTP adapter
//!
//! Translates declarative record queries into parameterized Cypher statements
//! and decodes the endpoint's positional JSON rows back into records:
//! - Property normalization and parameterization
//! - One statement compiler per operation (find, create, update, destroy,
//!   link, unlink, nearby, graph, count)
//! - Hydration of result rows and schema-driven graph decoding
//! - Explicit connection registry over a pluggable HTTP transport

pub mod adapter;
pub mod config;
pub mod query_builder;
pub mod result_decoder;
pub mod utils;

pub use adapter::{Adapter, AdapterError, Connection, ConnectionRegistry, HttpTransport, Transport};
pub use config::{ConnectionConfig, GeomConfig};
