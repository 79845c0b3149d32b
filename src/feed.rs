//! Syndication feed model consumed by the materializer.
//!
//! These types mirror an Atom feed after XML parsing: entries with inline
//! content, navigation links that may carry a nested feed or entry, and the
//! usual author/summary/timestamp metadata. They are immutable input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LoadError;
use crate::loader::{self, Format};
use crate::xml::XmlElement;

/// Category scheme carrying the entity type annotation.
pub const TYPE_SCHEME: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme";

/// Ordered collection of entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<Text>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Feed {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// The entry type declared by the feed itself (its first entry's type tag).
    pub fn entry_type(&self) -> Option<&str> {
        declared_type(&self.entries)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, LoadError> {
        loader::from_str(contents, Format::Json)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, LoadError> {
        loader::from_str(contents, Format::Yaml)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        loader::load_from_file(path)
    }
}

/// Type tag of the first entry in a run of entries.
pub fn declared_type(entries: &[Entry]) -> Option<&str> {
    entries.first().and_then(Entry::type_tag)
}

/// One record of a feed; becomes one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<Text>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub rights: Option<Text>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub authors: Vec<Person>,
    #[serde(default)]
    pub contributors: Vec<Person>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub content: Option<Content>,
}

impl Entry {
    /// The entity type annotation carried by this entry.
    ///
    /// Prefers the category in the data services scheme, falling back to the
    /// first category.
    pub fn type_tag(&self) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.scheme.as_deref() == Some(TYPE_SCHEME))
            .or_else(|| self.categories.first())
            .map(|c| c.term.as_str())
    }

    pub fn with_type(mut self, term: impl Into<String>) -> Self {
        self.categories.push(Category {
            term: term.into(),
            scheme: Some(TYPE_SCHEME.to_string()),
        });
        self
    }

    pub fn with_properties(mut self, properties: XmlElement) -> Self {
        self.content = Some(Content {
            media_type: Some("application/xml".to_string()),
            inline: Some(properties),
        });
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Inline XML payload of the entry content, if any.
    pub fn inline_content(&self) -> Option<&XmlElement> {
        self.content.as_ref().and_then(|c| c.inline.as_ref())
    }

    pub fn author(&self) -> Option<&Person> {
        self.authors.first()
    }

    pub fn contributor(&self) -> Option<&Person> {
        self.contributors.first()
    }
}

/// Author or contributor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Human-readable text construct (title, rights).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: TextKind,
}

impl Text {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            kind: TextKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    #[default]
    Text,
    Html,
    Xhtml,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Category {
    pub term: String,
    #[serde(default)]
    pub scheme: Option<String>,
}

/// Entry content; `inline` holds the XML payload when present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub inline: Option<XmlElement>,
}

/// Navigation link. `title` names the association, `inline` carries the
/// expanded target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub inline: Option<Inline>,
}

impl Link {
    pub fn inline_feed(title: impl Into<String>, feed: Feed) -> Self {
        Self {
            title: Some(title.into()),
            inline: Some(Inline::Feed(feed)),
            ..Self::default()
        }
    }

    pub fn inline_entry(title: impl Into<String>, entry: Entry) -> Self {
        Self {
            title: Some(title.into()),
            inline: Some(Inline::Entry(Box::new(entry))),
            ..Self::default()
        }
    }
}

/// Expanded link payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inline {
    Feed(Feed),
    Entry(Box<Entry>),
}

impl Inline {
    pub fn describe(&self) -> &'static str {
        match self {
            Inline::Feed(_) => "a feed",
            Inline::Entry(_) => "an entry",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_prefers_data_services_scheme() {
        let mut entry = Entry::default();
        entry.categories.push(Category {
            term: "news".to_string(),
            scheme: Some("http://example.org/tags".to_string()),
        });
        entry = entry.with_type("NS.Customer");
        assert_eq!(entry.type_tag(), Some("NS.Customer"));

        let untyped = Entry {
            categories: vec![Category { term: "Order".to_string(), scheme: None }],
            ..Entry::default()
        };
        assert_eq!(untyped.type_tag(), Some("Order"));
        assert_eq!(Entry::default().type_tag(), None);
    }

    #[test]
    fn test_feed_entry_type_from_first_entry() {
        let feed = Feed::new(vec![
            Entry::default().with_type("NS.Order"),
            Entry::default().with_type("NS.Other"),
        ]);
        assert_eq!(feed.entry_type(), Some("NS.Order"));
        assert_eq!(Feed::default().entry_type(), None);
    }

    #[test]
    fn test_feed_from_json() {
        let feed = Feed::from_json_str(
            r#"{
                "entries": [{
                    "id": "http://host/svc/Customers(1)",
                    "title": {"content": "Alice"},
                    "updated": "2010-03-01T12:00:00Z",
                    "categories": [{"term": "NS.Customer"}],
                    "content": {"type": "application/xml", "inline": {
                        "name": "m:properties",
                        "children": [{"name": "d:Name", "text": "Alice"}]
                    }},
                    "links": [{"title": "Orders", "inline": {"feed": {"entries": []}}}]
                }]
            }"#,
        )
        .unwrap();

        let entry = &feed.entries[0];
        assert_eq!(entry.type_tag(), Some("NS.Customer"));
        assert_eq!(entry.title.as_ref().and_then(|t| t.content.as_deref()), Some("Alice"));
        assert!(entry.updated.is_some());
        assert!(matches!(entry.links[0].inline, Some(Inline::Feed(_))));
        assert_eq!(
            entry.inline_content().and_then(|c| c.child("Name")).map(|n| n.text_content()),
            Some("Alice".to_string())
        );
    }
}
