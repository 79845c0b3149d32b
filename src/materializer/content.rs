//! Binding inline content properties onto an entity.

use std::collections::HashSet;

use super::assign;
use super::Materializer;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::entity::{Entity, Value};
use crate::error::MaterializeError;
use crate::feed::Content;
use crate::schema::{normalize, EntityType};
use crate::xml::XmlElement;

impl Materializer<'_> {
    /// Assign each child of the content's `properties` container to the
    /// matching schema property.
    ///
    /// Each element is handled in isolation: a failing element is reported
    /// and the rest are still bound. A property name appearing twice is bound
    /// once; the repeat is reported.
    pub fn bind_content(
        &self,
        entity: &mut Entity,
        content: Option<&Content>,
        entity_type: &EntityType,
        diagnostics: &mut dyn Diagnostics,
    ) {
        let Some(inline) = content.and_then(|c| c.inline.as_ref()) else {
            return;
        };
        let Some(elements) = inline.properties() else {
            diagnostics.report(Diagnostic::debug(format!(
                "inline content <{}> has no properties container",
                inline.name
            )));
            return;
        };

        let mut bound = HashSet::new();
        for element in elements {
            if let Err(err) = self.bind_element(entity, element, entity_type, &mut bound) {
                diagnostics.report(Diagnostic::warning(
                    format!("Can't set the property {} of {}", element.local_name(), entity.type_name),
                    err,
                ));
            }
        }
    }

    /// Bind one element, refusing a field already recorded in `bound`.
    fn bind_element(
        &self,
        entity: &mut Entity,
        element: &XmlElement,
        entity_type: &EntityType,
        bound: &mut HashSet<String>,
    ) -> Result<(), MaterializeError> {
        let name = element.local_name();
        let property = self.metadata.property(entity_type, name);
        let field = match property {
            Some(property) => property.field_name(),
            None if self.config.bind_unknown_elements => normalize(name),
            None => return Err(MaterializeError::property_lookup(&entity_type.name, name)),
        };
        if !bound.insert(field.clone()) {
            return Err(MaterializeError::assignment(
                name,
                "a single occurrence",
                element.text_content(),
            ));
        }

        let value = match property {
            Some(property) => assign::element_value(self.metadata, element, property, &property.name)?,
            None => Value::String(element.text_content()),
        };
        entity.set(field, value);
        Ok(())
    }
}
