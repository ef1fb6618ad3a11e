//! Turns a property mapping into the three Cypher fragments every statement is
//! built from.
//!
//! Only field names and `{placeholder}` references ever end up in the pattern
//! and SET text; values travel exclusively through the bindings map.
//!
//! ```text
//! mapping:  {name: "Alice", age: 31}, prefix "where_", alias "n"
//!
//! pattern:    {name:{where_name},age:{where_age}}
//! set_clause: n.name={where_name},n.age={where_age}
//! bindings:   {"where_name": "Alice", "where_age": 31}
//! ```

use super::property_map::{normalize, PropertyMapping};
use super::Bindings;

/// Prefix/alias configuration for one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterizeOptions<'a> {
    /// Prepended to every binding name
    pub prefix: &'a str,
    /// Pattern variable the SET clause assigns through
    pub alias: &'a str,
}

impl Default for ParameterizeOptions<'_> {
    fn default() -> Self {
        Self {
            prefix: "",
            alias: "n",
        }
    }
}

impl<'a> ParameterizeOptions<'a> {
    pub fn prefixed(prefix: &'a str) -> Self {
        Self {
            prefix,
            ..Default::default()
        }
    }
}

/// Pattern, SET clause and bindings derived from one mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterizedFragment {
    /// Inline node-pattern filter, e.g. `{name:{name}}`; empty for no filter
    pub pattern: String,
    /// Comma-joined `alias.key={prefix+key}` assignments
    pub set_clause: String,
    /// `prefix+key -> value`
    pub bindings: Bindings,
}

impl ParameterizedFragment {
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Builds the fragments for `mapping`. An absent or empty mapping yields empty
/// output, meaning "no filter" / "nothing to set".
pub fn parameterize(
    mapping: Option<&PropertyMapping>,
    options: ParameterizeOptions<'_>,
) -> ParameterizedFragment {
    let Some(mapping) = mapping else {
        return ParameterizedFragment::default();
    };

    let normalized = normalize(mapping);
    if normalized.is_empty() {
        return ParameterizedFragment::default();
    }

    let prefix = options.prefix;
    let pattern_items: Vec<String> = normalized
        .keys()
        .map(|key| format!("{}:{{{}{}}}", key, prefix, key))
        .collect();
    let set_items: Vec<String> = normalized
        .keys()
        .map(|key| format!("{}.{}={{{}{}}}", options.alias, key, prefix, key))
        .collect();
    let bindings: Bindings = normalized
        .iter()
        .map(|(key, value)| (format!("{}{}", prefix, key), value.to_json()))
        .collect();

    ParameterizedFragment {
        pattern: format!("{{{}}}", pattern_items.join(",")),
        set_clause: set_items.join(","),
        bindings,
    }
}

/// Merges several binding maps into one. Later maps win on a key clash, which
/// distinct prefixes rule out.
pub fn merge_bindings<'a>(parts: impl IntoIterator<Item = &'a Bindings>) -> Bindings {
    let mut merged = Bindings::new();
    for part in parts {
        for (key, value) in part {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
