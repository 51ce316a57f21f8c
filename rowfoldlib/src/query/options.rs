//! Options controlling how result rows are folded together.
//!
//! This module contains the configuration types consumed by the join
//! serializer: which column keys the groups, which composite fields to
//! assemble, and which merge mode to use.

use std::fmt;
use std::str::FromStr;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::RowfoldError;
use crate::Result;

/// A named sub-object assembled from a subset of columns.
///
/// For every row in a group the serializer projects `attributes` (sub-attribute
/// name to source column) into one object, and collects those objects, in row
/// order, into a list stored under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeField {
    /// Name the collected objects are stored under
    pub name: String,
    /// `(attribute, source column)` pairs, in output order
    pub attributes: Vec<(String, String)>,
}

impl CompositeField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder: add an attribute projected from `column`
    pub fn attribute(mut self, attribute: impl Into<String>, column: impl Into<String>) -> Self {
        self.attributes.push((attribute.into(), column.into()));
        self
    }

    /// Parse declarations written as JSON objects.
    ///
    /// Accepts either a single object or an array of objects, each mapping a
    /// field name to its `{attribute: column}` map:
    ///
    /// ```json
    /// [{ "publication": { "title": "pubtitle", "year": "pubyear" } }]
    /// ```
    ///
    /// Attribute order follows the document.
    pub fn list_from_json(json: &str) -> Result<Vec<CompositeField>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Declarations {
            Many(Vec<OrderedMap<OrderedMap<String>>>),
            One(OrderedMap<OrderedMap<String>>),
        }

        let parsed: Declarations = serde_json::from_str(json)?;
        let declarations = match parsed {
            Declarations::Many(many) => many,
            Declarations::One(one) => vec![one],
        };

        Ok(declarations
            .into_iter()
            .flat_map(|decl| decl.0)
            .map(|(name, attributes)| CompositeField {
                name,
                attributes: attributes.0,
            })
            .collect())
    }
}

impl FromStr for CompositeField {
    type Err = RowfoldError;

    /// Parse `name=attr:column,attr:column`. A bare `column` entry uses the
    /// column name as the attribute name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |message: &str| RowfoldError::InvalidComposite {
            spec: s.to_string(),
            message: message.to_string(),
        };

        let (name, body) = s
            .split_once('=')
            .ok_or_else(|| invalid("expected name=attribute:column,..."))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("field name is empty"));
        }

        let mut field = CompositeField::new(name);
        for entry in body.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(invalid("empty attribute entry"));
            }
            let (attribute, column) = match entry.split_once(':') {
                Some((attribute, column)) => (attribute.trim(), column.trim()),
                None => (entry, entry),
            };
            if attribute.is_empty() || column.is_empty() {
                return Err(invalid("attribute and column must both be named"));
            }
            field = field.attribute(attribute, column);
        }

        Ok(field)
    }
}

impl fmt::Display for CompositeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|(attribute, column)| format!("{}:{}", attribute, column))
            .collect();
        write!(f, "{}={}", self.name, attributes.join(","))
    }
}

/// JSON object read into a list so that key order survives.
struct OrderedMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = access.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(std::marker::PhantomData))
    }
}

/// How repeated values are merged within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinMode {
    /// Keep the key column, deduplicate list members, build composite fields
    #[default]
    Rich,
    /// Drop the key column, append every differing value, no composite fields
    Legacy,
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rich" | "default" => Ok(JoinMode::Rich),
            "legacy" => Ok(JoinMode::Legacy),
            _ => Err(format!("Unknown join mode: {}", s)),
        }
    }
}

/// Options for [`crate::query::serialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    /// Column whose value identifies a group
    pub key: String,
    /// Composite fields to assemble (rich mode only)
    pub composites: Vec<CompositeField>,
    /// Merge mode
    pub mode: JoinMode,
    /// Reject a key column that is not in the schema instead of degrading
    pub strict: bool,
}

impl JoinOptions {
    /// Rich-mode, permissive options keyed by `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            composites: Vec::new(),
            mode: JoinMode::Rich,
            strict: false,
        }
    }

    /// Builder: add a composite field
    pub fn composite(mut self, field: CompositeField) -> Self {
        self.composites.push(field);
        self
    }

    /// Builder: add several composite fields
    pub fn composites(mut self, fields: impl IntoIterator<Item = CompositeField>) -> Self {
        self.composites.extend(fields);
        self
    }

    /// Builder: set merge mode
    pub fn mode(mut self, mode: JoinMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: set strict key validation
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending (A-Z)
    #[default]
    Ascending,
    /// Descending (Z-A)
    Descending,
}

impl OrderDirection {
    pub fn reversed(self) -> Self {
        match self {
            OrderDirection::Ascending => OrderDirection::Descending,
            OrderDirection::Descending => OrderDirection::Ascending,
        }
    }
}
