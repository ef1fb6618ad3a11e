//! Decoder for graph traversal results.
//!
//! A graph statement returns rows shaped by its RETURN list:
//!
//! ```text
//! RETURN DISTINCT them, me, r1, h1, r2, h2
//!
//! slot 0  them  node              the record being returned
//! slot 1  me    node              anchor, only used to resolve direction
//! slot 2  r1    [relationship]    hop 1 relationships (null if unmatched)
//! slot 3  h1    path | null       hop 1 shortest path
//! slot 4  r2    [relationship]
//! slot 5  h2    path | null
//! ```
//!
//! `RowSchema` is produced by the statement compiler from the same hop list
//! that generated the RETURN clause, and the decoder walks a row by zipping it
//! with `RowSchema::slots()`. Slot meaning never comes from index arithmetic.
//!
//! Each decoded row becomes a `RelationGraph` keyed by relationship type:
//! the matched relationship's properties, whether it points from `me` to
//! `them` (`isMine`), and the node ids of the shortest path after the anchor.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::errors::DecodeError;
use super::hydrator::{hydrate_node, node_from_slot, Distance, HydratedRecord};
use super::models::{CypherResponse, NodeObject, PathObject, RelationshipObject};
use crate::query_builder::RelationSpec;

pub const THEM_VAR: &str = "them";
pub const ME_VAR: &str = "me";

/// What a result slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Them,
    Me,
    /// Relationships of hop `hop` (1-based)
    Relationships { hop: usize },
    /// Shortest path of hop `hop` (1-based)
    Path { hop: usize },
}

impl SlotKind {
    fn describe(&self) -> &'static str {
        match self {
            SlotKind::Them | SlotKind::Me => "node",
            SlotKind::Relationships { .. } => "relationship list",
            SlotKind::Path { .. } => "path",
        }
    }
}

/// Layout of the rows of one compiled graph statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    has_me: bool,
    relations: Vec<RelationSpec>,
}

impl RowSchema {
    pub fn new(has_me: bool, relations: Vec<RelationSpec>) -> Self {
        Self { has_me, relations }
    }

    pub fn has_me(&self) -> bool {
        self.has_me
    }

    pub fn relations(&self) -> &[RelationSpec] {
        &self.relations
    }

    pub fn relationship_var(hop: usize) -> String {
        format!("r{}", hop)
    }

    pub fn path_var(hop: usize) -> String {
        format!("h{}", hop)
    }

    pub fn slots(&self) -> Vec<SlotKind> {
        let mut slots = vec![SlotKind::Them];
        if self.has_me {
            slots.push(SlotKind::Me);
        }
        for hop in 1..=self.relations.len() {
            slots.push(SlotKind::Relationships { hop });
            slots.push(SlotKind::Path { hop });
        }
        slots
    }

    pub fn width(&self) -> usize {
        1 + usize::from(self.has_me) + 2 * self.relations.len()
    }

    /// RETURN items, in slot order.
    pub fn return_items(&self) -> Vec<String> {
        self.slots()
            .iter()
            .map(|slot| match slot {
                SlotKind::Them => THEM_VAR.to_string(),
                SlotKind::Me => ME_VAR.to_string(),
                SlotKind::Relationships { hop } => Self::relationship_var(*hop),
                SlotKind::Path { hop } => Self::path_var(*hop),
            })
            .collect()
    }
}

/// Everything one hop matched in one row.
#[derive(Debug, Clone, PartialEq)]
pub struct HopResult {
    pub spec: RelationSpec,
    pub relationships: Vec<RelationshipObject>,
    pub path: Option<PathObject>,
}

impl HopResult {
    pub fn is_matched(&self) -> bool {
        !self.relationships.is_empty() || self.path.is_some()
    }
}

/// A row split into its typed slots.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow {
    pub them: NodeObject,
    pub me: Option<NodeObject>,
    pub hops: Vec<HopResult>,
}

/// Splits a positional row according to `schema`.
pub fn decode_row(row: &[Value], schema: &RowSchema) -> Result<DecodedRow, DecodeError> {
    let slots = schema.slots();
    if row.len() != slots.len() {
        return Err(DecodeError::RowShapeMismatch {
            expected: slots.len(),
            found: row.len(),
        });
    }

    let mut them = None;
    let mut me = None;
    let mut hops: Vec<HopResult> = schema
        .relations()
        .iter()
        .map(|spec| HopResult {
            spec: spec.clone(),
            relationships: Vec::new(),
            path: None,
        })
        .collect();

    for (index, (kind, value)) in slots.iter().zip(row).enumerate() {
        match kind {
            SlotKind::Them => them = Some(node_from_slot(value, index)?),
            SlotKind::Me => me = Some(node_from_slot(value, index)?),
            SlotKind::Relationships { hop } => {
                hops[hop - 1].relationships = relationships_from_slot(value, index, *kind)?
            }
            SlotKind::Path { hop } => hops[hop - 1].path = path_from_slot(value, index, *kind)?,
        }
    }

    Ok(DecodedRow {
        them: them.ok_or(DecodeError::EmptyRow)?,
        me,
        hops,
    })
}

fn invalid_slot(index: usize, kind: SlotKind) -> impl FnOnce(serde_json::Error) -> DecodeError {
    move |source| DecodeError::InvalidSlot {
        slot: index,
        expected: kind.describe(),
        source,
    }
}

/// Null reads as no relationships; a lone object as a single one.
fn relationships_from_slot(
    value: &Value,
    index: usize,
    kind: SlotKind,
) -> Result<Vec<RelationshipObject>, DecodeError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(_) => serde_json::from_value(value.clone())
            .map(|rel| vec![rel])
            .map_err(invalid_slot(index, kind)),
        _ => serde_json::from_value(value.clone()).map_err(invalid_slot(index, kind)),
    }
}

fn path_from_slot(
    value: &Value,
    index: usize,
    kind: SlotKind,
) -> Result<Option<PathObject>, DecodeError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(invalid_slot(index, kind))
}

/// One relationship of a type, as seen from the `me` anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationMatch {
    pub data: Map<String, Value>,
    #[serde(rename = "isMine")]
    pub is_mine: bool,
}

/// What is known about one relationship type between `me` and `them`.
///
/// `data` is the most recently matched relationship's properties and `matches`
/// keeps every relationship of the type, so parallel relationships are not lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationGraphEntry {
    pub data: Map<String, Value>,
    pub hops: Vec<String>,
    #[serde(rename = "isMine")]
    pub is_mine: bool,
    pub matches: Vec<RelationMatch>,
}

/// Relation-graph attribute attached to each graph result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationGraph {
    pub kilometers: Option<f64>,
    pub miles: Option<f64>,
    #[serde(flatten)]
    pub relations: BTreeMap<String, RelationGraphEntry>,
}

impl RelationGraph {
    pub fn get(&self, rel_type: &str) -> Option<&RelationGraphEntry> {
        self.relations.get(rel_type)
    }
}

/// Builds the relation graph of a decoded row.
///
/// A relationship counts for `data` when it connects the two anchors in either
/// orientation; only `me -> them` sets `is_mine`. Node identity is the id at
/// the end of each `self`/`start`/`end` URI.
pub fn build_relation_graph(row: &DecodedRow, distance: Option<Distance>) -> RelationGraph {
    let mut graph = RelationGraph {
        kilometers: distance.map(|d| d.kilometers),
        miles: distance.map(|d| d.miles),
        relations: BTreeMap::new(),
    };

    let them_id = row.them.node_id();
    let me_id = row.me.as_ref().map(NodeObject::node_id);

    for hop in row.hops.iter().filter(|hop| hop.is_matched()) {
        for rel in &hop.relationships {
            let entry = graph.relations.entry(rel.rel_type.clone()).or_default();
            let (start, end) = (rel.start_id(), rel.end_id());
            let is_mine = me_id == Some(start) && end == them_id;
            let is_theirs = start == them_id && me_id == Some(end);

            if is_mine || is_theirs {
                entry.data = rel.data.clone();
                entry.matches.push(RelationMatch {
                    data: rel.data.clone(),
                    is_mine,
                });
            }
            if is_mine {
                entry.is_mine = true;
            }
        }

        if let Some(path) = &hop.path {
            graph
                .relations
                .entry(hop.spec.rel_type.clone())
                .or_default()
                .hops = path.hops();
        }
    }

    graph
}

/// Decodes every row of a graph response into a hydrated `them` record with
/// its relation graph attached. `distance_of` computes the proximity pair for
/// a record, or `None` when the query had no proximity anchor.
pub fn decode_graph<F>(
    response: &CypherResponse,
    schema: &RowSchema,
    distance_of: F,
) -> Result<Vec<HydratedRecord>, DecodeError>
where
    F: Fn(&HydratedRecord) -> Option<Distance>,
{
    response
        .data
        .iter()
        .map(|row| {
            let decoded = decode_row(row, schema)?;
            let mut record = hydrate_node(&decoded.them)?;
            let distance = distance_of(&record);
            record.graph = Some(build_relation_graph(&decoded, distance));
            Ok(record)
        })
        .collect()
}
