//! # Feedmat: Feed-to-Entity Materialization
//!
//! Feedmat turns syndication-style feeds (entries with inline property
//! content, navigation links and author/summary metadata) into typed entities
//! described by a schema of entity types, properties, associations and custom
//! mappings.
//!
//! ## Features
//!
//! - **Schema-driven binding**: inline content properties are coerced to their declared types
//! - **Nested associations**: expanded links become nested entities or lists of entities
//! - **Custom mappings**: syndication metadata or node paths into content feed property paths
//! - **Type registry**: explicit binding table from type tags to constructors
//! - **Diagnostics sink**: every absorbed failure is reported, none abort a parse
//!
//! ## Example: Schema
//!
//! ```yaml
//! namespace: NS
//! entity_types:
//!   - name: Customer
//!     properties:
//!       - { name: CustomerID, type: Edm.Int32, nullable: false }
//!       - { name: Name, type: Edm.String }
//!     navigation:
//!       - { name: Orders, type: NS.Order, multiplicity: "*" }
//!   - name: Order
//!     properties:
//!       - { name: OrderID, type: Edm.Int32 }
//! mappings:
//!   - { type: Customer, value_path: SyndicationTitle, property_path: Name }
//! ```
//!
//! ## Example: Parsing
//!
//! ```
//! use feedmat::{Collector, Entry, Feed, Materializer, Metadata};
//! use feedmat::feed::Link;
//! use feedmat::xml::XmlElement;
//!
//! let metadata = Metadata::from_yaml_str(r#"
//! namespace: NS
//! entity_types:
//!   - name: Customer
//!     properties: [{ name: Name, type: Edm.String }]
//!     navigation: [{ name: Orders, type: NS.Order, multiplicity: "*" }]
//!   - name: Order
//!     properties: [{ name: OrderID, type: Edm.Int32 }]
//! "#).unwrap();
//!
//! let order = |id: &str| Entry::default().with_type("NS.Order").with_properties(
//!     XmlElement::new("m:properties").with_child(XmlElement::new("d:OrderID").with_text(id)),
//! );
//! let customer = Entry::default()
//!     .with_type("NS.Customer")
//!     .with_properties(
//!         XmlElement::new("m:properties").with_child(XmlElement::new("d:Name").with_text("Alice")),
//!     )
//!     .with_link(Link::inline_feed("Orders", Feed::new(vec![order("1"), order("2")])));
//!
//! let mut diagnostics = Collector::new();
//! let entities: Vec<_> = Materializer::new(&metadata)
//!     .parse(&Feed::new(vec![customer]), None, &mut diagnostics)
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(entities.len(), 1);
//! assert_eq!(entities[0].get("orders").map(|o| o.entities().count()), Some(2));
//! assert!(diagnostics.is_empty());
//! ```

// Core modules
pub mod entity;
pub mod error;
pub mod registry;
pub mod xml;

// Input models
pub mod feed;
pub mod schema;

// Loading and options
pub mod config;
pub mod loader;

// Parsing
pub mod diagnostics;
pub mod materializer;

pub mod serialization;

// Re-export key types
pub use entity::{Entity, Value};
pub use error::{LoadError, MaterializeError, StructureError};
pub use registry::{Constructor, TypeRegistry};
pub use xml::{Extractor, NodePath, XmlElement};

pub use feed::{Entry, Feed, Inline, Link};
pub use schema::{EntityType, Metadata};

pub use config::MaterializerConfig;
pub use diagnostics::{Collector, Diagnostic, Diagnostics, Severity, TracingDiagnostics};
pub use materializer::{parse, Entities, Materializer};

pub use serialization::{write_entities, JsonArrayWriter, NdjsonWriter, OutputFormat, SerializationError};
