//! Cypher query compilation
//!
//! Translates the adapter's declarative criteria (property filters, paging,
//! links, proximity and graph traversals) into Cypher statements for the
//! server's HTTP endpoint.
//!
//! # Layers
//!
//! 1. **Normalizer** (`property_map::normalize`) - drops nulls, coerces `id`
//! 2. **Parameterizer** (`parameterize`) - pattern / SET / bindings triple
//! 3. **Statements** (`statements`) - one compiler per operation
//!
//! Statements are pure values; nothing here touches the network.

pub mod criteria;
pub mod errors;
pub mod parameterize;
pub mod property_map;
pub mod statements;

/// Parameter name -> JSON value, in insertion order.
pub type Bindings = serde_json::Map<String, serde_json::Value>;

pub use criteria::{
    CountCriteria, CreateValues, DestroyCriteria, FindCriteria, GeoPoint, GraphCriteria,
    LinkCriteria, NearbyCriteria, Operation, ProximityAnchor, RelationSpec, UnlinkCriteria,
    UpdateCriteria,
};
pub use errors::QueryBuildError;
pub use parameterize::{parameterize, ParameterizeOptions, ParameterizedFragment};
pub use property_map::{normalize, PropertyMapping, PropertyValue};
pub use statements::{CompiledGraph, CompiledStatement};
