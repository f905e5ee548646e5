//! Flat documents handed to a search index.
//!
//! An [`IndexableDocument`] is an ordered list of named scalar values. Adding
//! a field never replaces an existing one: a name added twice becomes a
//! multi-valued field, and it is left to the index client to decide what that
//! means for its schema.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// A single scalar value in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Must be finite to serialize; JSON has no NaN or infinity.
    Number(f64),
    /// Always stored in UTC.
    Date(OffsetDateTime),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<OffsetDateTime> for FieldValue {
    fn from(d: OffsetDateTime) -> Self {
        Self::Date(d.to_offset(UtcOffset::UTC))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) if !n.is_finite() => Err(S::Error::custom(format!(
                "non-finite number {n} cannot be indexed"
            ))),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Date(d) => {
                let formatted = d
                    .to_offset(UtcOffset::UTC)
                    .format(&Rfc3339)
                    .map_err(S::Error::custom)?;
                serializer.serialize_str(&formatted)
            }
        }
    }
}

/// A named value inside a document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
    pub name: String,
    pub value: FieldValue,
}

/// Document ready for submission to a search index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexableDocument {
    fields: Vec<IndexField>,
}

impl IndexableDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Existing fields with the same name are kept.
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push(IndexField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Number of field entries, counting every value of a multi-valued field.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First value added under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Every value added under `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| &f.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexField> {
        self.fields.iter()
    }

    /// Field names in insertion order, repeated for multi-valued fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Groups values by name, keeping the order in which names first appear.
    fn grouped(&self) -> Vec<(&str, Vec<&FieldValue>)> {
        let mut groups: Vec<(&str, Vec<&FieldValue>)> = Vec::new();
        for field in &self.fields {
            match groups.iter_mut().find(|(name, _)| *name == field.name) {
                Some((_, values)) => values.push(&field.value),
                None => groups.push((&field.name, vec![&field.value])),
            }
        }
        groups
    }
}

impl<'a> IntoIterator for &'a IndexableDocument {
    type Item = &'a IndexField;
    type IntoIter = std::slice::Iter<'a, IndexField>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for IndexableDocument {
    type Item = IndexField;
    type IntoIter = std::vec::IntoIter<IndexField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Serializes as a JSON object: single values as scalars, repeated names as
/// arrays (the Solr JSON update convention for multi-valued fields).
impl Serialize for IndexableDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups = self.grouped();
        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (name, values) in &groups {
            match values.as_slice() {
                [single] => map.serialize_entry(name, single)?,
                many => map.serialize_entry(name, many)?,
            }
        }
        map.end()
    }
}
