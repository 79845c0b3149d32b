//! Custom mappings from syndication metadata or inline content onto entity
//! property paths.

use std::str::FromStr;

use super::{assign, Materializer};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::entity::{Entity, Value};
use crate::feed::{Entry, Person};
use crate::schema::{EntityType, Mapping};
use crate::xml::NodePath;

/// Well-known entry fields addressable by a syndication mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyndicationField {
    AuthorEmail,
    AuthorName,
    AuthorUri,
    ContributorEmail,
    ContributorName,
    ContributorUri,
    Published,
    Rights,
    Summary,
    Title,
    Updated,
}

impl FromStr for SyndicationField {
    type Err = String;

    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        match keyword {
            "SyndicationAuthorEmail" => Ok(SyndicationField::AuthorEmail),
            "SyndicationAuthorName" => Ok(SyndicationField::AuthorName),
            "SyndicationAuthorUri" => Ok(SyndicationField::AuthorUri),
            "SyndicationContributorEmail" => Ok(SyndicationField::ContributorEmail),
            "SyndicationContributorName" => Ok(SyndicationField::ContributorName),
            "SyndicationContributorUri" => Ok(SyndicationField::ContributorUri),
            "SyndicationPublished" => Ok(SyndicationField::Published),
            "SyndicationRights" => Ok(SyndicationField::Rights),
            "SyndicationSummary" => Ok(SyndicationField::Summary),
            "SyndicationTitle" => Ok(SyndicationField::Title),
            "SyndicationUpdated" => Ok(SyndicationField::Updated),
            _ => Err(format!("unknown syndication keyword: {}", keyword)),
        }
    }
}

impl SyndicationField {
    /// Read the field from an entry; absent metadata yields `None`.
    pub fn extract(self, entry: &Entry) -> Option<Value> {
        match self {
            SyndicationField::AuthorEmail => person_field(entry.author(), |p| p.email.as_ref()),
            SyndicationField::AuthorName => person_field(entry.author(), |p| p.name.as_ref()),
            SyndicationField::AuthorUri => person_field(entry.author(), |p| p.uri.as_ref()),
            SyndicationField::ContributorEmail => person_field(entry.contributor(), |p| p.email.as_ref()),
            SyndicationField::ContributorName => person_field(entry.contributor(), |p| p.name.as_ref()),
            SyndicationField::ContributorUri => person_field(entry.contributor(), |p| p.uri.as_ref()),
            SyndicationField::Published => entry.published.map(Value::DateTime),
            SyndicationField::Rights => entry
                .rights
                .as_ref()
                .and_then(|t| t.content.clone())
                .map(Value::String),
            SyndicationField::Summary => entry.summary.clone().map(Value::String),
            SyndicationField::Title => entry
                .title
                .as_ref()
                .and_then(|t| t.content.clone())
                .map(Value::String),
            SyndicationField::Updated => entry.updated.map(Value::DateTime),
        }
    }
}

fn person_field(person: Option<&Person>, pick: fn(&Person) -> Option<&String>) -> Option<Value> {
    person.and_then(pick).map(|s| Value::String(s.clone()))
}

impl Materializer<'_> {
    /// Apply one schema mapping to an entity built from `entry`.
    ///
    /// Mappings declared for another type are skipped. A mapping that finds
    /// no source value leaves the entity untouched.
    pub fn resolve_mapping(
        &self,
        entity: &mut Entity,
        mapping: &Mapping,
        entry: &Entry,
        entity_type: &EntityType,
        diagnostics: &mut dyn Diagnostics,
    ) {
        if !self.metadata.is_same_type(&mapping.entity_type, entity_type) {
            return;
        }

        let value = if mapping.is_syndication() {
            match mapping.value_path.parse::<SyndicationField>() {
                Ok(field) => field.extract(entry),
                Err(reason) => {
                    diagnostics.report(Diagnostic::debug(reason));
                    None
                }
            }
        } else {
            let path = NodePath::parse(&mapping.value_path);
            entry
                .inline_content()
                .and_then(|content| content.select(&path))
                .map(Value::String)
        };

        let Some(value) = value else {
            return;
        };

        if let Err(err) = assign::set_path(self.metadata, entity, entity_type, &mapping.property_path, value) {
            diagnostics.report(Diagnostic::warning(
                format!(
                    "Can't set the mapped property {} of {}",
                    mapping.property_path, entity.type_name
                ),
                err,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Collector, Severity};
    use crate::error::MaterializeError;
    use crate::feed::Text;
    use crate::schema::{ComplexType, EdmType, Metadata, Property};
    use crate::xml::XmlElement;
    use chrono::{TimeZone, Utc};

    const NS_URI: &str = "http://example.org/custom";

    fn metadata(mappings: Vec<Mapping>) -> Metadata {
        let mut metadata = Metadata::new("NS")
            .with_entity_type(
                EntityType::new("Article")
                    .with_property(Property::new("Headline", EdmType::String))
                    .with_property(Property::new("Writer", EdmType::String))
                    .with_property(Property::new("Posted", EdmType::DateTime))
                    .with_property(Property::new("Rank", EdmType::Int32))
                    .with_property(Property::new("Source", EdmType::Complex("NS.Source".to_string()))),
            )
            .with_entity_type(EntityType::new("Comment").with_property(Property::new("Headline", EdmType::String)))
            .with_complex_type(
                ComplexType::new("Source")
                    .with_property(Property::new("City", EdmType::String))
                    .with_property(Property::new("Zip", EdmType::Int32)),
            );
        metadata.mappings = mappings;
        metadata
    }

    fn article() -> Entry {
        let mut entry = Entry::default().with_type("NS.Article");
        entry.title = Some(Text::plain("Hello"));
        entry.published = Some(Utc.with_ymd_and_hms(2010, 3, 1, 8, 0, 0).unwrap());
        entry.authors.push(Person {
            name: Some("Ann".to_string()),
            email: None,
            uri: None,
        });
        entry.with_properties(
            XmlElement::new("m:properties").with_child(
                XmlElement::new("c:extra")
                    .with_child(XmlElement::new("c:rank").with_text("7"))
                    .with_child(XmlElement::new("c:city").with_text("Oslo")),
            ),
        )
    }

    fn apply(metadata: &Metadata, entry: &Entry, diagnostics: &mut Collector) -> Entity {
        let materializer = Materializer::new(metadata);
        let article_type = metadata.entity_type("Article").unwrap();
        let mut entity = Entity::new("NS.Article");
        for mapping in metadata.mappings() {
            materializer.resolve_mapping(&mut entity, mapping, entry, article_type, diagnostics);
        }
        entity
    }

    #[test]
    fn test_syndication_keywords() {
        assert_eq!("SyndicationTitle".parse::<SyndicationField>(), Ok(SyndicationField::Title));
        assert_eq!("SyndicationContributorUri".parse::<SyndicationField>(), Ok(SyndicationField::ContributorUri));
        assert!("syndicationtitle".parse::<SyndicationField>().is_err());

        let entry = article();
        assert_eq!(SyndicationField::AuthorName.extract(&entry), Some(Value::from("Ann")));
        assert_eq!(SyndicationField::AuthorEmail.extract(&entry), None);
        assert_eq!(SyndicationField::ContributorName.extract(&entry), None);
        assert_eq!(SyndicationField::Rights.extract(&entry), None);
        assert!(matches!(SyndicationField::Published.extract(&entry), Some(Value::DateTime(_))));
    }

    #[test]
    fn test_syndication_title_to_headline() {
        let metadata = metadata(vec![Mapping::syndication("NS.Article", "SyndicationTitle", "Headline")]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert_eq!(entity.get("headline"), Some(&Value::from("Hello")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_syndication_timestamp_and_author() {
        let metadata = metadata(vec![
            Mapping::syndication("Article", "SyndicationPublished", "Posted"),
            Mapping::syndication("Article", "SyndicationAuthorName", "Writer"),
        ]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert_eq!(
            entity.get("posted"),
            Some(&Value::DateTime(Utc.with_ymd_and_hms(2010, 3, 1, 8, 0, 0).unwrap()))
        );
        assert_eq!(entity.get("writer"), Some(&Value::from("Ann")));
    }

    #[test]
    fn test_structured_mapping_reads_inline_content() {
        let metadata = metadata(vec![
            Mapping::structured("Article", "properties/extra/rank", "Rank", NS_URI),
            Mapping::structured("Article", "//city", "Source.City", NS_URI),
        ]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert_eq!(entity.get("rank"), Some(&Value::Int(7)));
        assert_eq!(entity.get_path("source.city"), Some(&Value::from("Oslo")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_mapping_for_other_type_is_skipped() {
        let metadata = metadata(vec![Mapping::syndication("Comment", "SyndicationTitle", "Headline")]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert!(entity.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_source_leaves_entity_untouched() {
        let metadata = metadata(vec![
            Mapping::syndication("Article", "SyndicationRights", "Headline"),
            Mapping::syndication("Article", "SyndicationBogus", "Headline"),
            Mapping::structured("Article", "properties/extra/missing", "Headline", NS_URI),
        ]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert!(entity.is_empty());
        assert_eq!(diagnostics.at_least(Severity::Warning).count(), 0);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_assignment_failures_are_reported() {
        let metadata = metadata(vec![
            Mapping::syndication("Article", "SyndicationTitle", "Rank"),
            Mapping::syndication("Article", "SyndicationTitle", "Nowhere"),
        ]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert!(entity.is_empty());
        let causes: Vec<_> = diagnostics
            .at_least(Severity::Warning)
            .filter_map(|d| d.cause.as_ref())
            .collect();
        assert!(matches!(causes[0], MaterializeError::Assignment { .. }));
        assert!(matches!(causes[1], MaterializeError::PropertyLookup { .. }));
    }

    #[test]
    fn test_unconvertible_nested_mapping_creates_no_complex_value() {
        let metadata = metadata(vec![Mapping::syndication("Article", "SyndicationTitle", "Source.Zip")]);
        let mut diagnostics = Collector::new();

        let entity = apply(&metadata, &article(), &mut diagnostics);

        assert!(!entity.is_set("source"));
        assert_eq!(diagnostics.at_least(Severity::Warning).count(), 1);
    }
}
