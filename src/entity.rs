//! Materialized entities and their field values.
//!
//! An [`Entity`] is a typed record produced from one feed entry: its type tag
//! plus an ordered map from field identity to [`Value`]. Nested complex values
//! and to-one associations are entities themselves; to-many associations are
//! lists of entities.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// A field value on an entity
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decimal kept in its lexical form to avoid rounding
    Decimal(String),
    String(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Entity(Box<Entity>),
    List(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Guid(_) => "guid",
            Value::Entity(_) => "entity",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Decimal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(&**e),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Entities held by a to-many list.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_entity)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Guid(g) => write!(f, "{}", g),
            Value::Entity(e) => write!(f, "{}({} fields)", e.type_name, e.len()),
            Value::List(l) => write!(f, "[{} items]", l.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Value::Entity(Box::new(e))
    }
}

/// One materialized record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Type tag the entity was constructed from
    #[serde(rename = "__type")]
    pub type_name: String,
    /// Id of the feed entry it came from
    #[serde(rename = "__id", skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(flatten)]
    fields: IndexMap<String, Value>,
}

impl Entity {
    /// A zero-initialized instance: no field is set.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            entry_id: None,
            fields: IndexMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Follow a dot-separated path through nested entities.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_entity()?.get(segment)?;
        }
        Some(current)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert entity to JSON, including the `__type` marker
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decode the fields into a typed struct.
    ///
    /// # Example
    ///
    /// ```
    /// use feedmat::Entity;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Customer {
    ///     name: String,
    /// }
    ///
    /// let mut entity = Entity::new("NS.Customer");
    /// entity.set("name", "Alice");
    ///
    /// let customer: Customer = entity.decode().unwrap();
    /// assert_eq!(customer.name, "Alice");
    /// ```
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let fields = serde_json::to_value(&self.fields)?;
        serde_json::from_value(fields)
    }
}
