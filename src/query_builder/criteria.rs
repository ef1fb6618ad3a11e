//! Per-operation criteria.
//!
//! Each operation gets its own struct so required and optional inputs are
//! fixed by the type rather than by presence checks at compile time of the
//! statement. `Operation` tags them for callers that dispatch dynamically.

use serde::Deserialize;

use super::property_map::PropertyMapping;

/// Relationship type used by link/unlink when none is given.
pub const DEFAULT_RELATION: &str = "link";

/// One traversal hop of a graph query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationSpec {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub required: bool,
}

impl RelationSpec {
    pub fn required(rel_type: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            required: true,
        }
    }

    pub fn optional(rel_type: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            required: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A point plus a search radius in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProximityAnchor {
    pub lat: f64,
    pub lon: f64,
    /// Radius in kilometers
    pub dist: f64,
}

impl ProximityAnchor {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Read criteria for `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindCriteria {
    /// Structured property filter
    pub filter: PropertyMapping,
    /// Raw Cypher condition over `n`, ANDed with the filter
    pub raw_where: Option<String>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl FindCriteria {
    pub fn new(filter: PropertyMapping) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn with_raw_where(mut self, clause: impl Into<String>) -> Self {
        self.raw_where = Some(clause.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// Field values of a node to create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateValues(pub PropertyMapping);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCriteria {
    pub filter: PropertyMapping,
    pub values: PropertyMapping,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestroyCriteria {
    pub filter: PropertyMapping,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountCriteria {
    pub filter: PropertyMapping,
}

/// Creates a relationship from every `start` match to every `end` match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkCriteria {
    pub start: PropertyMapping,
    pub end: PropertyMapping,
    /// Relationship properties; `createdAt`/`updatedAt` are filled in when missing
    pub values: PropertyMapping,
    /// Label of the end node, defaults to the collection
    pub end_label: Option<String>,
    /// Relationship type, defaults to `link`
    pub relation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlinkCriteria {
    pub start: PropertyMapping,
    pub end: PropertyMapping,
    /// Relationship property filter
    pub values: PropertyMapping,
    pub end_label: Option<String>,
    pub relation: Option<String>,
    /// Match the relationship in either direction instead of start -> end only
    pub bidirectional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyCriteria {
    pub anchor: ProximityAnchor,
    pub filter: PropertyMapping,
}

/// Criteria of a graph traversal between a `me` anchor and `them` candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphCriteria {
    /// Filter on the `them` anchor
    pub them: PropertyMapping,
    /// Filter on the `me` anchor; the anchor is only matched when present
    pub me: Option<PropertyMapping>,
    /// Restrict `them` to nodes within a radius
    pub nearby: Option<ProximityAnchor>,
    /// Hops in result-slot order
    pub relations: Vec<RelationSpec>,
}

/// Tagged criteria, one variant per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Find(FindCriteria),
    Create(CreateValues),
    Update(UpdateCriteria),
    Destroy(DestroyCriteria),
    Link(LinkCriteria),
    Unlink(UnlinkCriteria),
    Nearby(NearbyCriteria),
    Graph(GraphCriteria),
    Count(CountCriteria),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Find(_) => "find",
            Operation::Create(_) => "create",
            Operation::Update(_) => "update",
            Operation::Destroy(_) => "destroy",
            Operation::Link(_) => "link",
            Operation::Unlink(_) => "unlink",
            Operation::Nearby(_) => "nearby",
            Operation::Graph(_) => "graph",
            Operation::Count(_) => "count",
        }
    }
}
