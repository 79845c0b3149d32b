//! Schema metadata: entity types, properties, associations and custom mappings.
//!
//! Metadata is loaded once (from YAML or JSON) and is read-only while feeds are
//! parsed. Lookups accept either bare type names or names qualified with the
//! schema namespace.
//!
//! ```yaml
//! namespace: NS
//! entity_types:
//!   - name: Customer
//!     properties:
//!       - { name: Name, type: Edm.String }
//!       - { name: Address, type: NS.Address }
//!     navigation:
//!       - { name: Orders, type: NS.Order, multiplicity: "*" }
//! complex_types:
//!   - name: Address
//!     properties:
//!       - { name: City, type: Edm.String }
//! mappings:
//!   - { type: Customer, value_path: SyndicationTitle, property_path: Headline }
//! ```

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::LoadError;
use crate::loader::{self, Format};

/// Convert a human-readable name into a field identifier.
///
/// Characters other than letters, digits and `_` act as word breaks, the
/// result is snake_case, and a leading digit gets a `_` prefix.
///
/// ```
/// use feedmat::schema::normalize;
///
/// assert_eq!(normalize("Orders"), "orders");
/// assert_eq!(normalize("Order Details"), "order_details");
/// assert_eq!(normalize("ProductID"), "product_id");
/// ```
pub fn normalize(name: &str) -> String {
    let spaced: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    let snake = spaced.to_case(Case::Snake);
    match snake.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{}", snake),
        _ => snake,
    }
}

/// Scalar (or complex) type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdmType {
    #[default]
    String,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
    Binary,
    /// Name of a complex type declared in the same schema
    Complex(String),
}

impl EdmType {
    pub fn is_complex(&self) -> bool {
        matches!(self, EdmType::Complex(_))
    }
}

impl From<String> for EdmType {
    fn from(name: String) -> Self {
        let bare = name.strip_prefix("Edm.").unwrap_or(&name);
        match bare {
            "String" => EdmType::String,
            "Boolean" => EdmType::Boolean,
            "Byte" => EdmType::Byte,
            "SByte" => EdmType::SByte,
            "Int16" => EdmType::Int16,
            "Int32" => EdmType::Int32,
            "Int64" => EdmType::Int64,
            "Single" => EdmType::Single,
            "Double" => EdmType::Double,
            "Decimal" => EdmType::Decimal,
            "DateTime" => EdmType::DateTime,
            "DateTimeOffset" => EdmType::DateTimeOffset,
            "Time" => EdmType::Time,
            "Guid" => EdmType::Guid,
            "Binary" => EdmType::Binary,
            _ => EdmType::Complex(name),
        }
    }
}

impl From<EdmType> for String {
    fn from(edm: EdmType) -> Self {
        edm.to_string()
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdmType::Complex(name) => write!(f, "{}", name),
            other => write!(f, "Edm.{:?}", other),
        }
    }
}

/// A declared property of an entity or complex type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Field identity on the entity; defaults to the normalized name
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, rename = "type")]
    pub edm_type: EdmType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Property {
    pub fn new(name: impl Into<String>, edm_type: EdmType) -> Self {
        Self {
            name: name.into(),
            field: None,
            edm_type,
            nullable: true,
        }
    }

    pub fn field_name(&self) -> String {
        self.field.clone().unwrap_or_else(|| normalize(&self.name))
    }

    fn matches(&self, name: &str) -> bool {
        self.name == name || self.field_name() == normalize(name)
    }
}

/// How many entities sit at the far end of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "0..1", alias = "zero_or_one")]
    ZeroOrOne,
    #[serde(rename = "1", alias = "one")]
    One,
    #[serde(rename = "*", alias = "many")]
    Many,
}

impl Multiplicity {
    pub fn is_to_many(self) -> bool {
        self == Multiplicity::Many
    }
}

/// A navigation property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationEnd {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub multiplicity: Multiplicity,
}

impl AssociationEnd {
    pub fn new(name: impl Into<String>, target_type: impl Into<String>, multiplicity: Multiplicity) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            multiplicity,
        }
    }

    pub fn is_to_many(&self) -> bool {
        self.multiplicity.is_to_many()
    }

    pub fn field_name(&self) -> String {
        normalize(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub navigation: Vec<AssociationEnd>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            properties: Vec::new(),
            navigation: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_navigation(mut self, end: AssociationEnd) -> Self {
        self.navigation.push(end);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexType {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl ComplexType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }
}

// Exact schema names win over normalized matches.
pub(crate) fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties
        .iter()
        .find(|p| p.name == name)
        .or_else(|| properties.iter().find(|p| p.matches(name)))
}

/// A custom mapping from syndication metadata or inline content to a property path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Entity type the mapping applies to
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Syndication keyword, or node path when a namespace is declared
    pub value_path: String,
    /// Dot-separated destination on the entity
    pub property_path: String,
    #[serde(default)]
    pub ns_prefix: Option<String>,
    #[serde(default)]
    pub ns_uri: Option<String>,
}

impl Mapping {
    pub fn syndication(
        entity_type: impl Into<String>,
        keyword: impl Into<String>,
        property_path: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            value_path: keyword.into(),
            property_path: property_path.into(),
            ns_prefix: None,
            ns_uri: None,
        }
    }

    pub fn structured(
        entity_type: impl Into<String>,
        value_path: impl Into<String>,
        property_path: impl Into<String>,
        ns_uri: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            value_path: value_path.into(),
            property_path: property_path.into(),
            ns_prefix: None,
            ns_uri: Some(ns_uri.into()),
        }
    }

    /// No namespace declared: the value comes from syndication metadata.
    pub fn is_syndication(&self) -> bool {
        self.ns_prefix.is_none() && self.ns_uri.is_none()
    }
}

/// The schema of a data service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
    #[serde(default)]
    pub complex_types: Vec<ComplexType>,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

impl Metadata {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    pub fn with_complex_type(mut self, complex_type: ComplexType) -> Self {
        self.complex_types.push(complex_type);
        self
    }

    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, LoadError> {
        let metadata: Self = loader::from_str(contents, Format::Yaml)?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, LoadError> {
        let metadata: Self = loader::from_str(contents, Format::Json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Load metadata from a YAML or JSON file.
    ///
    /// # Errors
    /// Returns error if the file can't be read, doesn't parse, or declares
    /// inconsistent types
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let metadata: Self = loader::load_from_file(path)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// `Namespace.Name`, or the bare name when no namespace is declared.
    pub fn qualified_name(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        }
    }

    fn names_match(&self, declared: &str, tag: &str) -> bool {
        if declared == tag {
            return true;
        }
        match &self.namespace {
            Some(ns) => tag
                .strip_prefix(ns.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|rest| rest == declared),
            None => false,
        }
    }

    /// Entity type by bare or qualified name.
    pub fn entity_type(&self, tag: &str) -> Option<&EntityType> {
        self.entity_types.iter().find(|t| self.names_match(&t.name, tag))
    }

    pub fn complex_type(&self, tag: &str) -> Option<&ComplexType> {
        self.complex_types.iter().find(|t| self.names_match(&t.name, tag))
    }

    /// Whether a mapping's declared type is exactly this entity type.
    pub fn is_same_type(&self, tag: &str, entity_type: &EntityType) -> bool {
        self.names_match(&entity_type.name, tag)
    }

    pub fn property<'a>(&self, entity_type: &'a EntityType, name: &str) -> Option<&'a Property> {
        entity_type.property(name)
    }

    /// Navigation property whose normalized name matches.
    pub fn association<'a>(&self, entity_type: &'a EntityType, normalized: &str) -> Option<&'a AssociationEnd> {
        entity_type
            .navigation
            .iter()
            .find(|end| end.field_name() == normalized)
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Check that every referenced type is declared.
    pub fn validate(&self) -> Result<(), LoadError> {
        let mut seen = HashSet::new();
        for name in self
            .entity_types
            .iter()
            .map(|t| &t.name)
            .chain(self.complex_types.iter().map(|t| &t.name))
        {
            if !seen.insert(name.as_str()) {
                return Err(LoadError::Invalid(format!("type '{}' is declared twice", name)));
            }
        }

        let all_properties = self
            .entity_types
            .iter()
            .map(|t| (&t.name, &t.properties))
            .chain(self.complex_types.iter().map(|t| (&t.name, &t.properties)));
        for (owner, properties) in all_properties {
            for property in properties {
                if let EdmType::Complex(complex) = &property.edm_type {
                    if self.complex_type(complex).is_none() {
                        return Err(LoadError::Invalid(format!(
                            "property '{}.{}' has undeclared type '{}'",
                            owner, property.name, complex
                        )));
                    }
                }
            }
        }

        for entity_type in &self.entity_types {
            for end in &entity_type.navigation {
                if self.entity_type(&end.target_type).is_none() {
                    return Err(LoadError::Invalid(format!(
                        "navigation '{}.{}' targets undeclared type '{}'",
                        entity_type.name, end.name, end.target_type
                    )));
                }
            }
        }

        for mapping in &self.mappings {
            if self.entity_type(&mapping.entity_type).is_none() {
                return Err(LoadError::Invalid(format!(
                    "mapping to '{}' names undeclared type '{}'",
                    mapping.property_path, mapping.entity_type
                )));
            }
        }

        Ok(())
    }
}
