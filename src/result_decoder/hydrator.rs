//! Hydration of result rows into caller-facing records.
//!
//! Slot 0 of every row holds the primary node. Its property map becomes a
//! `HydratedRecord`: `createdAt`/`updatedAt` are parsed into timestamps and the
//! spatial plugin's `bbox`/`gtype` bookkeeping fields are dropped.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::DecodeError;
use super::graph_decoder::RelationGraph;
use super::models::{CypherResponse, NodeObject};
use crate::config::GeomConfig;
use crate::query_builder::statements::{CREATED_AT, UPDATED_AT};
use crate::query_builder::GeoPoint;
use crate::utils::geo::{distance_km, km_to_miles};

/// Fields the spatial plugin writes onto indexed nodes.
const SPATIAL_BOOKKEEPING: [&str; 2] = ["bbox", "gtype"];

/// Distance to a proximity anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distance {
    pub kilometers: f64,
    pub miles: f64,
}

impl Distance {
    pub fn from_km(kilometers: f64) -> Self {
        Self {
            kilometers,
            miles: km_to_miles(kilometers),
        }
    }
}

/// A record decoded from one result row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HydratedRecord {
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set by proximity searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    /// Set by graph queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<RelationGraph>,
}

impl HydratedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.properties.get(field)
    }

    /// The `id` property as an integer.
    pub fn id(&self) -> Option<i64> {
        match self.properties.get("id")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Numeric field, used for coordinates.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.properties.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coordinates of the record under the connection's geometry field names.
    pub fn location(&self, geom: &GeomConfig) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.number(&geom.lat)?,
            lon: self.number(&geom.lon)?,
        })
    }

    /// Distance from the record's location to `point`; `None` if the record
    /// has no usable coordinates.
    pub fn distance_to(&self, geom: &GeomConfig, point: GeoPoint) -> Option<Distance> {
        let here = self.location(geom)?;
        Some(Distance::from_km(distance_km(
            here.lat, here.lon, point.lat, point.lon,
        )))
    }

    /// Deserializes the record into a caller-defined model type.
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T, DecodeError> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

/// Hydrates slot 0 of every row. A response without data yields no records.
pub fn hydrate(response: &CypherResponse) -> Result<Vec<HydratedRecord>, DecodeError> {
    response
        .data
        .iter()
        .map(|row| {
            let slot = row.first().ok_or(DecodeError::EmptyRow)?;
            let node = node_from_slot(slot, 0)?;
            hydrate_node(&node)
        })
        .collect()
}

pub(crate) fn node_from_slot(slot: &Value, index: usize) -> Result<NodeObject, DecodeError> {
    if slot.is_null() {
        return Err(DecodeError::NullSlot {
            slot: index,
            expected: "node",
        });
    }
    serde_json::from_value(slot.clone()).map_err(|source| DecodeError::InvalidSlot {
        slot: index,
        expected: "node",
        source,
    })
}

pub fn hydrate_node(node: &NodeObject) -> Result<HydratedRecord, DecodeError> {
    let mut properties = node.data.clone();
    for field in SPATIAL_BOOKKEEPING {
        properties.shift_remove(field);
    }

    let created_at = take_timestamp(&mut properties, CREATED_AT)?;
    let updated_at = take_timestamp(&mut properties, UPDATED_AT)?;

    Ok(HydratedRecord {
        properties,
        created_at,
        updated_at,
        distance: None,
        graph: None,
    })
}

/// Removes `field` and parses it as an RFC 3339 string or epoch milliseconds.
fn take_timestamp(
    properties: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let invalid = |value: &Value| DecodeError::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    };

    match properties.shift_remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|_| invalid(&Value::String(s))),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| invalid(&Value::Number(n))),
        Some(other) => Err(invalid(&other)),
    }
}

/// Reads the single integer a `count` statement returns.
pub fn decode_count(response: &CypherResponse) -> Result<u64, DecodeError> {
    let cell = response.data.first().and_then(|row| row.first());
    cell.and_then(Value::as_u64)
        .ok_or_else(|| DecodeError::InvalidCount(format!("{:?}", cell)))
}
