//! Property assignment: text and values into typed entity fields.
//!
//! Coercion is driven by the property's declared [`EdmType`]; anything that
//! does not fit is an [`MaterializeError::Assignment`].

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::entity::{Entity, Value};
use crate::error::{MaterializeError, StructureError};
use crate::schema::{find_property, EdmType, EntityType, Metadata, Property};
use crate::xml::XmlElement;

/// Naive timestamp layouts accepted for `Edm.DateTime`.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
    })
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_int<T>(text: &str) -> Option<Value>
where
    T: std::str::FromStr + Into<i64>,
{
    text.trim().parse::<T>().ok().map(|i| Value::Int(i.into()))
}

fn null_for(property: &Property, path: &str) -> Result<Value, MaterializeError> {
    if property.nullable {
        Ok(Value::Null)
    } else {
        Err(MaterializeError::assignment(path, format!("non-null {}", property.edm_type), "null"))
    }
}

/// Convert element text to the property's scalar type.
pub fn coerce_text(text: &str, property: &Property, path: &str) -> Result<Value, MaterializeError> {
    let mismatch = || MaterializeError::assignment(path, property.edm_type.to_string(), text);
    let trimmed = text.trim();

    let value = match &property.edm_type {
        EdmType::String | EdmType::Time | EdmType::Binary => Some(Value::String(text.to_string())),
        EdmType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        EdmType::Byte => parse_int::<u8>(trimmed),
        EdmType::SByte => parse_int::<i8>(trimmed),
        EdmType::Int16 => parse_int::<i16>(trimmed),
        EdmType::Int32 => parse_int::<i32>(trimmed),
        EdmType::Int64 => parse_int::<i64>(trimmed),
        EdmType::Single | EdmType::Double => trimmed.parse::<f64>().ok().map(Value::Float),
        EdmType::Decimal => decimal_pattern()
            .is_match(trimmed)
            .then(|| Value::Decimal(trimmed.to_string())),
        EdmType::DateTime | EdmType::DateTimeOffset => parse_datetime(trimmed).map(Value::DateTime),
        EdmType::Guid => Uuid::parse_str(trimmed).ok().map(Value::Guid),
        EdmType::Complex(_) => None,
    };

    value.ok_or_else(mismatch)
}

/// Convert an already-extracted value to the property's type.
pub fn convert(value: Value, property: &Property, path: &str) -> Result<Value, MaterializeError> {
    match value {
        Value::Null => null_for(property, path),
        Value::String(text) => coerce_text(&text, property, path),
        Value::DateTime(dt) => match property.edm_type {
            EdmType::DateTime | EdmType::DateTimeOffset => Ok(Value::DateTime(dt)),
            EdmType::String => Ok(Value::String(dt.to_rfc3339())),
            _ => Err(MaterializeError::assignment(
                path,
                property.edm_type.to_string(),
                dt.to_rfc3339(),
            )),
        },
        Value::Entity(_) | Value::List(_) => Err(MaterializeError::assignment(
            path,
            property.edm_type.to_string(),
            value.kind(),
        )),
        other => coerce_text(&other.to_string(), property, path),
    }
}

/// Value of a property element from inline content.
///
/// Complex properties bind their child elements into a nested entity; any
/// failing child fails the whole complex value.
pub fn element_value(
    metadata: &Metadata,
    element: &XmlElement,
    property: &Property,
    path: &str,
) -> Result<Value, MaterializeError> {
    if element.is_null() {
        return null_for(property, path);
    }

    match &property.edm_type {
        EdmType::Complex(name) => {
            let complex = metadata
                .complex_type(name)
                .ok_or_else(|| StructureError::UnknownType(name.clone()))?;
            let mut nested = Entity::new(metadata.qualified_name(&complex.name));
            for child in element.children() {
                let child_property = complex
                    .property(child.local_name())
                    .ok_or_else(|| MaterializeError::property_lookup(&complex.name, child.local_name()))?;
                let child_path = format!("{}.{}", path, child_property.name);
                let value = element_value(metadata, child, child_property, &child_path)?;
                nested.set(child_property.field_name(), value);
            }
            Ok(Value::from(nested))
        }
        _ => coerce_text(&element.text_content(), property, path),
    }
}

/// Assign `value` through a dot-separated property path.
///
/// Every segment but the last must name a complex property; missing
/// intermediate values are created as empty nested entities. The whole path
/// is resolved and the value converted before anything is written, so a
/// failing assignment leaves the entity unchanged.
pub fn set_path(
    metadata: &Metadata,
    entity: &mut Entity,
    entity_type: &EntityType,
    path: &str,
    value: Value,
) -> Result<(), MaterializeError> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(MaterializeError::property_lookup(&entity_type.name, path));
    };
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MaterializeError::property_lookup(&entity_type.name, path));
    }

    // (field, qualified complex type name) for each intermediate segment
    let mut chain: Vec<(String, String)> = Vec::with_capacity(parents.len());
    let mut properties: &[Property] = &entity_type.properties;
    let mut owner: &str = &entity_type.name;

    for segment in parents {
        let property = find_property(properties, segment)
            .ok_or_else(|| MaterializeError::property_lookup(owner, *segment))?;
        let EdmType::Complex(complex_name) = &property.edm_type else {
            return Err(MaterializeError::assignment(path, "a complex property", *segment));
        };
        let complex = metadata
            .complex_type(complex_name)
            .ok_or_else(|| StructureError::UnknownType(complex_name.clone()))?;

        chain.push((property.field_name(), metadata.qualified_name(&complex.name)));
        properties = &complex.properties;
        owner = &complex.name;
    }

    let property = find_property(properties, last)
        .ok_or_else(|| MaterializeError::property_lookup(owner, *last))?;
    let value = convert(value, property, path)?;

    let mut target = entity;
    for (field, type_name) in chain {
        if target.get(&field).and_then(Value::as_entity).is_none() {
            target.set(field.clone(), Entity::new(type_name));
        }
        target = match target.get_mut(&field) {
            Some(Value::Entity(nested)) => &mut **nested,
            _ => return Err(MaterializeError::assignment(path, "a complex property", field)),
        };
    }
    target.set(property.field_name(), value);
    Ok(())
}
