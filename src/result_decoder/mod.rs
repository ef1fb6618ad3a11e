//! Decoding of Cypher endpoint responses
//!
//! - `models` - wire types (rows, nodes, relationships, paths, exceptions)
//! - `hydrator` - primary-node rows into `HydratedRecord`s
//! - `graph_decoder` - schema-driven decoding of graph traversal rows

pub mod errors;
pub mod graph_decoder;
pub mod hydrator;
pub mod models;

pub use errors::DecodeError;
pub use graph_decoder::{
    build_relation_graph, decode_graph, decode_row, DecodedRow, RelationGraph,
    RelationGraphEntry, RelationMatch, RowSchema, SlotKind,
};
pub use hydrator::{decode_count, hydrate, Distance, HydratedRecord};
pub use models::{CypherResponse, NodeObject, PathObject, RelationshipObject, ServerException};
