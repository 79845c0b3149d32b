//! Feed-to-entity materialization.
//!
//! A [`Materializer`] walks a feed entry by entry, constructs one entity per
//! entry and fills it from three schema-driven sources, always in this order:
//!
//! 1. inline content properties ([`content`])
//! 2. navigation links carrying nested feeds or entries ([`association`])
//! 3. custom mappings from syndication metadata or inline content ([`mapping`])
//!
//! Mappings run last, so they overwrite anything bound earlier. Failures are
//! reported to the [`Diagnostics`] sink at the smallest granularity (entry,
//! property, link, mapping) and never abort the parse.

pub mod assign;
pub mod association;
pub mod content;
pub mod mapping;

use crate::config::MaterializerConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::entity::Entity;
use crate::error::StructureError;
use crate::feed::{Entry, Feed};
use crate::registry::TypeRegistry;
use crate::schema::{EntityType, Metadata};

/// Ordered, single-pass sequence of materialized entities.
#[derive(Debug)]
pub struct Entities {
    inner: std::vec::IntoIter<Entity>,
}

impl Entities {
    fn new(entities: Vec<Entity>) -> Self {
        Self {
            inner: entities.into_iter(),
        }
    }
}

impl Iterator for Entities {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Entities {}

/// Parses feeds into entities against one schema.
pub struct Materializer<'a> {
    metadata: &'a Metadata,
    registry: TypeRegistry,
    config: MaterializerConfig,
}

impl<'a> Materializer<'a> {
    /// Create a materializer with default constructors for every schema type.
    pub fn new(metadata: &'a Metadata) -> Self {
        Self {
            metadata,
            registry: TypeRegistry::from_metadata(metadata),
            config: MaterializerConfig::default(),
        }
    }

    /// Replace the type registry, e.g. one with custom constructors.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: MaterializerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metadata(&self) -> &Metadata {
        self.metadata
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    /// Parse a feed into entities of `target_type`.
    ///
    /// When `target_type` is `None` it is taken from the feed's own entry type
    /// annotation. Returns `None` when no type can be determined or the type
    /// is unknown to the schema; otherwise one entity per entry whose
    /// construction succeeded, in feed order.
    pub fn parse(
        &self,
        feed: &Feed,
        target_type: Option<&str>,
        diagnostics: &mut dyn Diagnostics,
    ) -> Option<Entities> {
        let Some(tag) = target_type.or_else(|| feed.entry_type()) else {
            diagnostics.report(Diagnostic::warning(
                "Can't determine the target entity type",
                StructureError::MissingType("feed".to_string()).into(),
            ));
            return None;
        };

        let entity_type = match self.lookup(tag) {
            Ok(entity_type) => entity_type,
            Err(err) => {
                diagnostics.report(Diagnostic::warning(
                    format!("Can't resolve the target entity type {}", tag),
                    err.into(),
                ));
                return None;
            }
        };

        Some(Entities::new(self.materialize(
            &feed.entries,
            tag,
            entity_type,
            0,
            diagnostics,
        )))
    }

    /// Resolve a type tag through the registry to its schema declaration.
    fn lookup(&self, tag: &str) -> Result<&'a EntityType, StructureError> {
        let type_name = self.registry.resolve(tag)?;
        self.metadata
            .entity_type(type_name)
            .ok_or_else(|| StructureError::UnknownType(tag.to_string()))
    }

    /// The entry loop shared by top-level feeds and nested link payloads.
    fn materialize(
        &self,
        entries: &[Entry],
        tag: &str,
        entity_type: &EntityType,
        depth: usize,
        diagnostics: &mut dyn Diagnostics,
    ) -> Vec<Entity> {
        let mut list = Vec::with_capacity(entries.len());

        for entry in entries {
            let mut entity = match self.registry.construct(tag, entity_type) {
                Ok(entity) => entity,
                Err(err) => {
                    diagnostics.report(Diagnostic::warning(
                        format!("Can't instantiate an entity of type {}", tag),
                        err,
                    ));
                    continue;
                }
            };
            entity.entry_id = entry.id.clone();

            self.bind_content(&mut entity, entry.content.as_ref(), entity_type, diagnostics);

            for link in &entry.links {
                self.resolve_link(&mut entity, link, entity_type, depth, diagnostics);
            }

            for mapping in self.metadata.mappings() {
                self.resolve_mapping(&mut entity, mapping, entry, entity_type, diagnostics);
            }

            list.push(entity);
        }

        list
    }
}

/// Parse `feed` against `metadata`, tolerating absent inputs.
///
/// Returns `None` when the feed or metadata is absent or the target type
/// cannot be resolved. Never fails for problems inside individual entries.
///
/// # Example
///
/// ```
/// use feedmat::{parse, Collector, Entry, Feed, Metadata};
/// use feedmat::schema::{EdmType, EntityType, Property};
/// use feedmat::xml::XmlElement;
///
/// let metadata = Metadata::new("NS").with_entity_type(
///     EntityType::new("Customer").with_property(Property::new("Name", EdmType::String)),
/// );
/// let feed = Feed::new(vec![Entry::default().with_properties(
///     XmlElement::new("m:properties").with_child(XmlElement::new("d:Name").with_text("Alice")),
/// )]);
///
/// let mut diagnostics = Collector::new();
/// let customers: Vec<_> = parse(Some(&feed), Some("NS.Customer"), Some(&metadata), &mut diagnostics)
///     .unwrap()
///     .collect();
/// assert_eq!(customers[0].get("name").and_then(|v| v.as_str()), Some("Alice"));
/// ```
pub fn parse(
    feed: Option<&Feed>,
    target_type: Option<&str>,
    metadata: Option<&Metadata>,
    diagnostics: &mut dyn Diagnostics,
) -> Option<Entities> {
    let (feed, metadata) = (feed?, metadata?);
    Materializer::new(metadata).parse(feed, target_type, diagnostics)
}
