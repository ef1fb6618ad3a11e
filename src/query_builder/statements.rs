//! Cypher statement compilation, one function per operation.
//!
//! Collection names and relationship types are schema-level identifiers and
//! are written into the statement verbatim. Everything coming from a property
//! mapping goes through [`parameterize`]. The only literals rendered into the
//! text are the adapter's own integers (SKIP/LIMIT) and validated coordinates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::criteria::{
    CountCriteria, CreateValues, DestroyCriteria, FindCriteria, GraphCriteria, LinkCriteria,
    NearbyCriteria, Operation, ProximityAnchor, UnlinkCriteria, UpdateCriteria, DEFAULT_RELATION,
};
use super::errors::QueryBuildError;
use super::parameterize::{
    merge_bindings, parameterize, ParameterizeOptions, ParameterizedFragment,
};
use super::property_map::{normalize, PropertyMapping};
use super::Bindings;
use crate::result_decoder::graph_decoder::{RowSchema, ME_VAR, THEM_VAR};

/// Name of the spatial layer nodes are registered in.
pub const SPATIAL_LAYER: &str = "geom";

/// Binding holding the property map of a node being created.
pub const CREATE_PROPS_PARAM: &str = "props";

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// A statement ready for the Cypher endpoint.
///
/// Serializes to the endpoint's request body, `{"query": ..., "params": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    #[serde(rename = "query")]
    pub statement: String,
    #[serde(rename = "params")]
    pub bindings: Bindings,
}

impl CompiledStatement {
    fn new(statement: String, bindings: Bindings) -> Self {
        Self {
            statement,
            bindings,
        }
    }
}

/// A graph statement together with the layout of the rows it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGraph {
    pub statement: CompiledStatement,
    pub schema: RowSchema,
}

impl Operation {
    /// Compiles any operation against `collection`. Graph operations lose their
    /// row schema here; use [`compile_graph`] when the rows will be decoded.
    pub fn compile(&self, collection: &str) -> Result<CompiledStatement, QueryBuildError> {
        Ok(match self {
            Operation::Find(c) => compile_find(collection, c),
            Operation::Create(c) => compile_create(collection, c),
            Operation::Update(c) => compile_update(collection, c),
            Operation::Destroy(c) => compile_destroy(collection, c),
            Operation::Link(c) => compile_link(collection, c, Utc::now()),
            Operation::Unlink(c) => compile_unlink(collection, c),
            Operation::Nearby(c) => compile_nearby(collection, c)?,
            Operation::Graph(c) => compile_graph(collection, c)?.statement,
            Operation::Count(c) => compile_count(collection, c),
        })
    }
}

fn filter_fragment(mapping: &PropertyMapping, prefix: &str) -> ParameterizedFragment {
    parameterize(Some(mapping), ParameterizeOptions::prefixed(prefix))
}

/// `START <var>=node:geom("withinDistance:[lat,lon,dist]")`
///
/// Coordinates are rendered with 13 decimals, the radius with 2.
pub fn within_distance_clause(
    var: &str,
    anchor: &ProximityAnchor,
) -> Result<String, QueryBuildError> {
    for (field, value) in [("lat", anchor.lat), ("lon", anchor.lon), ("dist", anchor.dist)] {
        if !value.is_finite() {
            return Err(QueryBuildError::InvalidCoordinate { field, value });
        }
    }

    Ok(format!(
        "START {}=node:{}(\"withinDistance:[{:.13},{:.13},{:.2}]\")",
        var, SPATIAL_LAYER, anchor.lat, anchor.lon, anchor.dist
    ))
}

pub fn compile_find(collection: &str, criteria: &FindCriteria) -> CompiledStatement {
    let filter = filter_fragment(&criteria.filter, "");

    let mut statement = format!("MATCH (n:{}{})", collection, filter.pattern);
    if let Some(raw) = criteria.raw_where.as_deref().filter(|raw| !raw.trim().is_empty()) {
        statement.push_str(&format!(" WHERE {}", raw));
    }
    statement.push_str(" RETURN n");
    if let Some(skip) = criteria.skip.filter(|s| *s > 0) {
        statement.push_str(&format!(" SKIP {}", skip));
    }
    if let Some(limit) = criteria.limit.filter(|l| *l > 0) {
        statement.push_str(&format!(" LIMIT {}", limit));
    }

    CompiledStatement::new(statement, filter.bindings)
}

pub fn compile_create(collection: &str, values: &CreateValues) -> CompiledStatement {
    let mut bindings = Bindings::new();
    bindings.insert(
        CREATE_PROPS_PARAM.to_string(),
        serde_json::Value::Object(normalize(&values.0).to_json_object()),
    );

    CompiledStatement::new(
        format!(
            "CREATE (n:{}{{{}}}) SET n.id = id(n) RETURN n",
            collection, CREATE_PROPS_PARAM
        ),
        bindings,
    )
}

pub fn compile_update(collection: &str, criteria: &UpdateCriteria) -> CompiledStatement {
    let filter = filter_fragment(&criteria.filter, "where_");
    let values = filter_fragment(&criteria.values, "vals_");

    let mut statement = format!("MATCH (n:{}{})", collection, filter.pattern);
    if !values.set_clause.is_empty() {
        statement.push_str(&format!(" SET {}", values.set_clause));
    }
    statement.push_str(" RETURN n");

    CompiledStatement::new(
        statement,
        merge_bindings([&filter.bindings, &values.bindings]),
    )
}

/// Deletes matched nodes together with every incident relationship.
pub fn compile_destroy(collection: &str, criteria: &DestroyCriteria) -> CompiledStatement {
    let filter = filter_fragment(&criteria.filter, "where_");

    CompiledStatement::new(
        format!(
            "MATCH (n:{}{}) OPTIONAL MATCH (n)-[r]-() DELETE n,r",
            collection, filter.pattern
        ),
        filter.bindings,
    )
}

/// `now` stamps `createdAt`/`updatedAt` when the caller left them out.
pub fn compile_link(
    collection: &str,
    criteria: &LinkCriteria,
    now: DateTime<Utc>,
) -> CompiledStatement {
    let mut values = normalize(&criteria.values);
    for field in [CREATED_AT, UPDATED_AT] {
        if !values.contains_key(field) {
            values.insert(field, now);
        }
    }

    let end_label = criteria.end_label.as_deref().unwrap_or(collection);
    let relation = criteria.relation.as_deref().unwrap_or(DEFAULT_RELATION);
    let start = filter_fragment(&criteria.start, "start_");
    let end = filter_fragment(&criteria.end, "end_");
    let link = filter_fragment(&values, "link_");

    CompiledStatement::new(
        format!(
            "MATCH (n:{}{}),(m:{}{}) CREATE (n)-[r:{}{}]->(m) RETURN r",
            collection, start.pattern, end_label, end.pattern, relation, link.pattern
        ),
        merge_bindings([&link.bindings, &start.bindings, &end.bindings]),
    )
}

pub fn compile_unlink(collection: &str, criteria: &UnlinkCriteria) -> CompiledStatement {
    let end_label = criteria.end_label.as_deref().unwrap_or(collection);
    let relation = criteria.relation.as_deref().unwrap_or(DEFAULT_RELATION);
    let start = filter_fragment(&criteria.start, "start_");
    let end = filter_fragment(&criteria.end, "end_");
    let link = filter_fragment(&criteria.values, "link_");
    let direction = if criteria.bidirectional { "-" } else { "->" };

    CompiledStatement::new(
        format!(
            "MATCH (n:{}{}),(m:{}{}),(n)-[r:{}{}]{}(m) DELETE r",
            collection,
            start.pattern,
            end_label,
            end.pattern,
            relation,
            link.pattern,
            direction
        ),
        merge_bindings([&link.bindings, &start.bindings, &end.bindings]),
    )
}

pub fn compile_nearby(
    collection: &str,
    criteria: &NearbyCriteria,
) -> Result<CompiledStatement, QueryBuildError> {
    let start = within_distance_clause("n", &criteria.anchor)?;
    let filter = filter_fragment(&criteria.filter, "");

    Ok(CompiledStatement::new(
        format!(
            "{} MATCH (n:{}{}) RETURN n",
            start, collection, filter.pattern
        ),
        filter.bindings,
    ))
}

pub fn compile_count(collection: &str, criteria: &CountCriteria) -> CompiledStatement {
    let filter = filter_fragment(&criteria.filter, "");

    CompiledStatement::new(
        format!("MATCH (n:{}{}) RETURN count(n)", collection, filter.pattern),
        filter.bindings,
    )
}

/// Compiles a graph traversal.
///
/// ```text
/// [START them=node:geom(...)]
/// MATCH (me:L{...}),(them:L{...}) [WHERE them.id <> me.id]
/// [OPTIONAL] MATCH h1=shortestPath((me)-[r1:T1]-(them)) ...
/// RETURN DISTINCT them,me,r1,h1,...
/// ```
///
/// The returned [`RowSchema`] describes the RETURN list and is what the graph
/// decoder reads the rows with.
pub fn compile_graph(
    collection: &str,
    criteria: &GraphCriteria,
) -> Result<CompiledGraph, QueryBuildError> {
    if criteria.me.is_none() && !criteria.relations.is_empty() {
        return Err(QueryBuildError::RelationsRequireAnchor(
            criteria.relations.len(),
        ));
    }

    let schema = RowSchema::new(criteria.me.is_some(), criteria.relations.clone());
    let them = filter_fragment(&criteria.them, "them_");
    let me = criteria.me.as_ref().map(|m| filter_fragment(m, "me_"));

    let mut clauses = Vec::new();
    if let Some(anchor) = &criteria.nearby {
        clauses.push(within_distance_clause(THEM_VAR, anchor)?);
    }

    let them_pattern = format!("({}:{}{})", THEM_VAR, collection, them.pattern);
    match &me {
        Some(me) => {
            clauses.push(format!(
                "MATCH ({}:{}{}),{}",
                ME_VAR, collection, me.pattern, them_pattern
            ));
            clauses.push(format!("WHERE {}.id <> {}.id", THEM_VAR, ME_VAR));
        }
        None => clauses.push(format!("MATCH {}", them_pattern)),
    }

    for (index, relation) in criteria.relations.iter().enumerate() {
        let hop = index + 1;
        clauses.push(format!(
            "{}MATCH {}=shortestPath(({})-[{}:{}]-({}))",
            if relation.required { "" } else { "OPTIONAL " },
            RowSchema::path_var(hop),
            ME_VAR,
            RowSchema::relationship_var(hop),
            relation.rel_type,
            THEM_VAR
        ));
    }

    clauses.push(format!("RETURN DISTINCT {}", schema.return_items().join(",")));

    let mut parts = Vec::new();
    if let Some(me) = &me {
        parts.push(&me.bindings);
    }
    parts.push(&them.bindings);

    Ok(CompiledGraph {
        statement: CompiledStatement::new(clauses.join(" "), merge_bindings(parts)),
        schema,
    })
}
