//! Navigation links carrying inline feeds or entries.

use std::slice;

use super::Materializer;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::entity::{Entity, Value};
use crate::error::{MaterializeError, StructureError};
use crate::feed::{declared_type, Inline, Link};
use crate::schema::{normalize, AssociationEnd, EntityType};

impl Materializer<'_> {
    /// Materialize an expanded link and assign the result to its association.
    ///
    /// Links without inline content or without a title, and titles that name
    /// no association of `entity_type`, are ignored.
    pub fn resolve_link(
        &self,
        entity: &mut Entity,
        link: &Link,
        entity_type: &EntityType,
        depth: usize,
        diagnostics: &mut dyn Diagnostics,
    ) {
        let (Some(inline), Some(title)) = (link.inline.as_ref(), link.title.as_deref()) else {
            return;
        };
        let name = normalize(title);
        if name.is_empty() {
            return;
        }
        let Some(association) = self.metadata.association(entity_type, &name) else {
            return;
        };

        match self.materialize_link(inline, association, depth, diagnostics) {
            Ok(value) => {
                entity.set(name, value);
            }
            Err(err) => diagnostics.report(Diagnostic::warning(
                format!("Can't retrieve associated property {}", name),
                err,
            )),
        }
    }

    fn materialize_link(
        &self,
        inline: &Inline,
        association: &AssociationEnd,
        depth: usize,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Value, MaterializeError> {
        if depth >= self.config.max_depth {
            return Err(StructureError::DepthExceeded {
                max_depth: self.config.max_depth,
            }
            .into());
        }

        let entries = match (inline, association.is_to_many()) {
            (Inline::Feed(feed), true) => feed.entries.as_slice(),
            (Inline::Entry(entry), false) => slice::from_ref(entry.as_ref()),
            (other, to_many) => {
                return Err(StructureError::PayloadMismatch {
                    association: association.name.clone(),
                    expected: if to_many { "a feed" } else { "an entry" },
                    actual: other.describe(),
                }
                .into())
            }
        };

        // The nested content's own annotation wins over the declared target.
        let tag = declared_type(entries).unwrap_or(&association.target_type);
        let target = self.lookup(tag)?;
        let mut entities = self.materialize(entries, tag, target, depth + 1, diagnostics);

        if association.is_to_many() {
            Ok(Value::List(entities.into_iter().map(Value::from).collect()))
        } else if entities.is_empty() {
            Err(StructureError::Empty(association.name.clone()).into())
        } else {
            Ok(Value::from(entities.swap_remove(0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaterializerConfig;
    use crate::diagnostics::{Collector, Severity};
    use crate::feed::{Entry, Feed};
    use crate::schema::{EdmType, Metadata, Multiplicity, Property};
    use crate::xml::XmlElement;

    fn metadata() -> Metadata {
        Metadata::new("NS")
            .with_entity_type(
                EntityType::new("Customer")
                    .with_property(Property::new("Name", EdmType::String))
                    .with_navigation(AssociationEnd::new("Orders", "NS.Order", Multiplicity::Many))
                    .with_navigation(AssociationEnd::new("Best Friend", "NS.Customer", Multiplicity::ZeroOrOne)),
            )
            .with_entity_type(
                EntityType::new("Order")
                    .with_property(Property::new("OrderID", EdmType::Int32))
                    .with_navigation(AssociationEnd::new("Customer", "NS.Customer", Multiplicity::One)),
            )
    }

    fn order(id: i64) -> Entry {
        Entry::default().with_type("NS.Order").with_properties(
            XmlElement::new("m:properties").with_child(XmlElement::new("d:OrderID").with_text(id.to_string())),
        )
    }

    fn customer(name: &str) -> Entry {
        Entry::default().with_type("NS.Customer").with_properties(
            XmlElement::new("m:properties").with_child(XmlElement::new("d:Name").with_text(name)),
        )
    }

    #[test]
    fn test_to_many_assigns_every_entry() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let link = Link::inline_feed("Orders", Feed::new(vec![order(1), order(2), order(3)]));
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        let orders = entity.get("orders").and_then(Value::as_list).unwrap();
        assert_eq!(orders.len(), 3);
        let ids: Vec<_> = entity
            .get("orders")
            .unwrap()
            .entities()
            .map(|o| o.get("order_id").and_then(Value::as_i64))
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_to_one_assigns_single_entity() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let link = Link::inline_entry("Best Friend", customer("Bob"));
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        let friend = entity.get("best_friend").and_then(Value::as_entity).unwrap();
        assert_eq!(friend.type_name, "NS.Customer");
        assert_eq!(friend.get("name"), Some(&Value::from("Bob")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_to_many_feed_yields_empty_list() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let link = Link::inline_feed("Orders", Feed::default());
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        assert_eq!(entity.get("orders"), Some(&Value::List(Vec::new())));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_ignored_links() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let unknown = Link::inline_feed("Invoices", Feed::new(vec![order(1)]));
        let deferred = Link {
            title: Some("Orders".to_string()),
            href: Some("Customers(1)/Orders".to_string()),
            ..Link::default()
        };
        let untitled = Link {
            inline: Some(Inline::Feed(Feed::new(vec![order(1)]))),
            ..Link::default()
        };
        for link in [unknown, deferred, untitled] {
            materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);
        }

        assert!(entity.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_payload_mismatch_is_reported() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let link = Link::inline_entry("Orders", order(1));
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        assert!(!entity.is_set("orders"));
        let reported = &diagnostics.diagnostics()[0];
        assert_eq!(reported.severity, Severity::Warning);
        assert!(matches!(
            reported.cause,
            Some(MaterializeError::Structure(StructureError::PayloadMismatch {
                expected: "a feed",
                actual: "an entry",
                ..
            }))
        ));
    }

    #[test]
    fn test_unknown_nested_type_is_reported() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let ghost = Entry::default().with_type("NS.Ghost");
        let link = Link::inline_feed("Orders", Feed::new(vec![ghost]));
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        assert!(!entity.is_set("orders"));
        assert_eq!(
            diagnostics.diagnostics()[0].cause,
            Some(StructureError::UnknownType("NS.Ghost".to_string()).into())
        );
    }

    #[test]
    fn test_untyped_entries_use_declared_target() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");
        let mut diagnostics = Collector::new();

        let untyped = Entry::default().with_properties(
            XmlElement::new("m:properties").with_child(XmlElement::new("d:OrderID").with_text("9")),
        );
        let link = Link::inline_feed("Orders", Feed::new(vec![untyped]));
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        let first = entity.get("orders").unwrap().entities().next().unwrap();
        assert_eq!(first.type_name, "NS.Order");
        assert_eq!(first.get("order_id"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_depth_limit_stops_recursion() {
        let metadata = metadata();
        let config = MaterializerConfig::default().with_max_depth(1);
        let materializer = Materializer::new(&metadata).with_config(config);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut diagnostics = Collector::new();

        // Customer -> Orders -> Customer: the second hop is one level too deep.
        let order = order(1).with_link(Link::inline_entry("Customer", customer("Carol")));
        let link = Link::inline_feed("Orders", Feed::new(vec![order]));
        let mut entity = Entity::new("NS.Customer");
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        let nested = entity.get("orders").unwrap().entities().next().unwrap();
        assert_eq!(nested.get("order_id"), Some(&Value::Int(1)));
        assert!(!nested.is_set("customer"));
        assert_eq!(
            diagnostics.diagnostics()[0].cause,
            Some(StructureError::DepthExceeded { max_depth: 1 }.into())
        );
    }

    #[test]
    fn test_empty_to_one_is_reported() {
        let metadata = metadata();
        let materializer = Materializer::new(&metadata);
        let customer_type = metadata.entity_type("Customer").unwrap();
        let mut entity = Entity::new("NS.Customer");

        let mut registry = crate::registry::TypeRegistry::from_metadata(&metadata);
        registry.register(
            "NS.Customer",
            Box::new(|_: &EntityType| -> Result<Entity, MaterializeError> {
                Err(MaterializeError::Construction {
                    type_name: "NS.Customer".to_string(),
                    reason: "disabled".to_string(),
                })
            }),
        );
        let failing = Materializer::new(&metadata).with_registry(registry);
        let mut diagnostics = Collector::new();

        let link = Link::inline_entry("Best Friend", customer("Bob"));
        failing.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);

        assert!(!entity.is_set("best_friend"));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.diagnostics()[1].cause,
            Some(StructureError::Empty("Best Friend".to_string()).into())
        );

        // the same link binds fine with default constructors
        let mut diagnostics = Collector::new();
        materializer.resolve_link(&mut entity, &link, customer_type, 0, &mut diagnostics);
        assert!(entity.is_set("best_friend"));
    }
}
