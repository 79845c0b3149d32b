//! Type registry: the binding table from type tags to entity constructors.
//!
//! Every entity type the materializer can produce is registered here by tag.
//! Tags come from the caller (the target type of a parse) or from the type
//! annotation carried by nested content; an unregistered tag is a typed
//! [`StructureError::UnknownType`], never a silent fallback.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::{MaterializeError, StructureError};
use crate::schema::{EntityType, Metadata};

/// Trait for entity constructors
///
/// A constructor produces a fresh, zero-initialized instance for the given
/// entity type, or refuses with a construction error.
pub trait Constructor: Send + Sync {
    fn construct(&self, entity_type: &EntityType) -> Result<Entity, MaterializeError>;
}

/// Simple function-based implementation of Constructor
impl<F> Constructor for F
where
    F: Fn(&EntityType) -> Result<Entity, MaterializeError> + Send + Sync,
{
    fn construct(&self, entity_type: &EntityType) -> Result<Entity, MaterializeError> {
        self(entity_type)
    }
}

/// Registered binding for one type tag.
struct Binding {
    /// Declared entity type name in the schema
    type_name: String,
    /// Canonical tag stamped on constructed entities
    canonical: String,
    constructor: Option<Box<dyn Constructor>>,
}

/// Registry for resolving type tags and constructing entities
#[derive(Default)]
pub struct TypeRegistry {
    bindings: HashMap<String, Binding>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Register a default constructor for every entity type in the schema.
    ///
    /// Each type is reachable by its bare and its qualified name. Abstract
    /// types are registered without a constructor.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut registry = Self::new();
        for entity_type in &metadata.entity_types {
            let canonical = metadata.qualified_name(&entity_type.name);
            let constructor: Option<Box<dyn Constructor>> = if entity_type.is_abstract {
                None
            } else {
                let tag = canonical.clone();
                Some(Box::new(move |_: &EntityType| -> Result<Entity, MaterializeError> {
                    Ok(Entity::new(tag.clone()))
                }))
            };
            registry.insert(&entity_type.name, &canonical, constructor);
        }
        registry
    }

    fn insert(&mut self, type_name: &str, canonical: &str, constructor: Option<Box<dyn Constructor>>) {
        // Both spellings share one constructor through the canonical entry.
        self.bindings.insert(
            type_name.to_string(),
            Binding {
                type_name: type_name.to_string(),
                canonical: canonical.to_string(),
                constructor: None,
            },
        );
        self.bindings.insert(
            canonical.to_string(),
            Binding {
                type_name: type_name.to_string(),
                canonical: canonical.to_string(),
                constructor,
            },
        );
    }

    /// Register a constructor for a tag, replacing any previous one.
    ///
    /// The tag is resolved to its canonical form first so that custom
    /// constructors apply whichever spelling the content uses.
    ///
    /// # Example
    ///
    /// ```
    /// use feedmat::{Entity, Metadata, TypeRegistry};
    /// use feedmat::schema::EntityType;
    /// use feedmat::MaterializeError;
    ///
    /// let metadata = Metadata::new("NS").with_entity_type(EntityType::new("Customer"));
    /// let mut registry = TypeRegistry::from_metadata(&metadata);
    /// registry.register("Customer", Box::new(|_: &EntityType| -> Result<Entity, MaterializeError> {
    ///     let mut entity = Entity::new("NS.Customer");
    ///     entity.set("active", true);
    ///     Ok(entity)
    /// }));
    /// ```
    pub fn register(&mut self, tag: impl Into<String>, constructor: Box<dyn Constructor>) {
        let tag = tag.into();
        let (type_name, canonical) = match self.bindings.get(&tag) {
            Some(binding) => (binding.type_name.clone(), binding.canonical.clone()),
            None => (tag.clone(), tag.clone()),
        };
        self.insert(&type_name, &canonical, Some(constructor));
    }

    /// Resolve a tag to the declared type name.
    pub fn resolve(&self, tag: &str) -> Result<&str, StructureError> {
        self.bindings
            .get(tag)
            .map(|b| b.type_name.as_str())
            .ok_or_else(|| StructureError::UnknownType(tag.to_string()))
    }

    /// Canonical tag for a registered type.
    pub fn canonical(&self, tag: &str) -> Option<&str> {
        self.bindings.get(tag).map(|b| b.canonical.as_str())
    }

    /// Construct a zero-initialized entity for a registered tag.
    pub fn construct(&self, tag: &str, entity_type: &EntityType) -> Result<Entity, MaterializeError> {
        let binding = self
            .bindings
            .get(tag)
            .ok_or_else(|| StructureError::UnknownType(tag.to_string()))?;
        let canonical = self
            .bindings
            .get(&binding.canonical)
            .ok_or_else(|| StructureError::UnknownType(binding.canonical.clone()))?;

        match &canonical.constructor {
            Some(constructor) => constructor.construct(entity_type),
            None => Err(MaterializeError::Construction {
                type_name: binding.canonical.clone(),
                reason: "type is abstract or has no registered constructor".to_string(),
            }),
        }
    }

    /// Get list of all registered tags
    pub fn list_types(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Value;

    fn metadata() -> Metadata {
        let mut employee = EntityType::new("Employee");
        employee.is_abstract = true;
        Metadata::new("NS")
            .with_entity_type(EntityType::new("Customer"))
            .with_entity_type(employee)
    }

    #[test]
    fn test_resolve_bare_and_qualified() {
        let registry = TypeRegistry::from_metadata(&metadata());

        assert_eq!(registry.resolve("Customer"), Ok("Customer"));
        assert_eq!(registry.resolve("NS.Customer"), Ok("Customer"));
        assert_eq!(registry.canonical("Customer"), Some("NS.Customer"));
        assert_eq!(
            registry.resolve("NS.Ghost"),
            Err(StructureError::UnknownType("NS.Ghost".to_string()))
        );
    }

    #[test]
    fn test_construct_stamps_canonical_tag() {
        let metadata = metadata();
        let registry = TypeRegistry::from_metadata(&metadata);
        let customer = metadata.entity_type("Customer").unwrap();

        let entity = registry.construct("Customer", customer).unwrap();
        assert_eq!(entity.type_name, "NS.Customer");
        assert!(entity.is_empty());
    }

    #[test]
    fn test_abstract_type_is_not_constructible() {
        let metadata = metadata();
        let registry = TypeRegistry::from_metadata(&metadata);
        let employee = metadata.entity_type("Employee").unwrap();

        let result = registry.construct("NS.Employee", employee);
        assert!(matches!(result, Err(MaterializeError::Construction { .. })));
    }

    #[test]
    fn test_custom_constructor_applies_to_both_spellings() {
        let metadata = metadata();
        let mut registry = TypeRegistry::from_metadata(&metadata);
        registry.register(
            "Customer",
            Box::new(|_: &EntityType| -> Result<Entity, MaterializeError> {
                let mut entity = Entity::new("NS.Customer");
                entity.set("active", true);
                Ok(entity)
            }),
        );

        let customer = metadata.entity_type("Customer").unwrap();
        for tag in ["Customer", "NS.Customer"] {
            let entity = registry.construct(tag, customer).unwrap();
            assert_eq!(entity.get("active"), Some(&Value::Bool(true)));
        }
    }

    #[test]
    fn test_failing_constructor() {
        let metadata = metadata();
        let mut registry = TypeRegistry::from_metadata(&metadata);
        registry.register(
            "NS.Customer",
            Box::new(|t: &EntityType| -> Result<Entity, MaterializeError> {
                Err(MaterializeError::Construction {
                    type_name: t.name.clone(),
                    reason: "access denied".to_string(),
                })
            }),
        );

        let customer = metadata.entity_type("Customer").unwrap();
        assert!(registry.construct("Customer", customer).is_err());
        assert_eq!(registry.list_types().len(), 4);
    }
}
