/*!
# Row Representations

- [`RowValue`]: the typed, validated form of one entity record. Values are
  either a single string or a list of strings; absent fields are simply not
  present in the map.
- [`CellMapping`]: the flat, string-only form of one CSV line, keyed by column
  header and kept in column order.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schemas::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for FieldValue {
    fn from(items: &[String]) -> Self {
        FieldValue::List(items.to_vec())
    }
}

/// One entity record. Built once, either through the `with*` builder methods
/// or by the decoder, and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowValue {
    entity: Entity,
    values: BTreeMap<String, FieldValue>,
}

impl RowValue {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// `None` leaves the field absent.
    pub fn with_opt<V: Into<FieldValue>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(field, value),
            None => self,
        }
    }

    pub fn with_list<I, S>(self, field: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        self.with(field, FieldValue::List(items))
    }

    pub(crate) fn from_parts(entity: Entity, values: BTreeMap<String, FieldValue>) -> Self {
        Self { entity, values }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn list(&self, field: &str) -> Option<&[String]> {
        self.get(field).and_then(FieldValue::as_list)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column-ordered `header -> cell` pairs for one CSV line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMapping {
    cells: Vec<(String, String)>,
}

impl CellMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a header row with one record. Cells past the end of a short record
    /// are treated as missing rather than shifting columns.
    pub fn from_record(headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        headers
            .iter()
            .zip(record.iter())
            .collect()
    }

    /// Replace the cell for `header`, or append a new column.
    pub fn insert(&mut self, header: impl Into<String>, cell: impl Into<String>) {
        let header = header.into();
        let cell = cell.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some((_, existing)) => *existing = cell,
            None => self.cells.push((header, cell)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, cell)| cell.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, c)| (h.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<H: Into<String>, C: Into<String>> FromIterator<(H, C)> for CellMapping {
    fn from_iter<T: IntoIterator<Item = (H, C)>>(iter: T) -> Self {
        let mut mapping = CellMapping::new();
        for (header, cell) in iter {
            mapping.insert(header, cell);
        }
        mapping
    }
}
