//! Flattening of catalog objects into the API's create/update field format.
//!
//! The API takes objects as bracket-path form fields rather than JSON:
//!
//! ```text
//! lang=en
//! name=Fido
//! parents[0][Objects][id]=7
//! objectsPropertiesValues[3][ObjectsPropertiesValues][property_id]=3
//! objectsPropertiesValues[3][ObjectsPropertiesValues][value]=brown
//! Links[3][url]=https://example.org
//! ```
//!
//! [`encode`] builds that field set from a [`CatalogObject`]. Only the fields
//! in [`ALLOWED_FIELDS`] are transmitted; anything else on the object is
//! dropped silently.

mod flatten;

use serde_json::{Map, Value, json};
use thiserror::Error;

pub use flatten::{FIELD_SEPARATOR, FlatFields, flatten_into};

use crate::models::{CatalogObject, EntityId, PropertyValue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Property {property_id} has type 'object' but its value carries no id")]
    MissingObjectReference { property_id: EntityId },
}

/// Object fields the API accepts, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedField {
    Lang,
    Name,
    Description,
    Aliases,
    Properties,
    Parents,
}

pub const ALLOWED_FIELDS: [AllowedField; 6] = [
    AllowedField::Lang,
    AllowedField::Name,
    AllowedField::Description,
    AllowedField::Aliases,
    AllowedField::Properties,
    AllowedField::Parents,
];

impl AllowedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllowedField::Lang => "lang",
            AllowedField::Name => "name",
            AllowedField::Description => "description",
            AllowedField::Aliases => "aliases",
            AllowedField::Properties => "properties",
            AllowedField::Parents => "parents",
        }
    }
}

pub const PROPERTY_VALUES_KEY: &str = "objectsPropertiesValues";
pub const LINKS_KEY: &str = "Links";

/// Flattens `object` into the field set for a create/update call.
///
/// # Errors
///
/// [`EncodeError::MissingObjectReference`] when a property of type `object`
/// has a value without an `id`.
pub fn encode(object: &CatalogObject) -> Result<FlatFields, EncodeError> {
    let mut fields = FlatFields::new();
    for (key, value) in document(object)? {
        fields.extend_flattened(key, &value);
    }
    Ok(fields)
}

/// [`encode`] followed by [`FlatFields::to_query_string`].
pub fn encode_query_string(object: &CatalogObject) -> Result<String, EncodeError> {
    Ok(encode(object)?.to_query_string())
}

/// The nested document for `object`, one entry per top-level key.
fn document(object: &CatalogObject) -> Result<Vec<(&'static str, Value)>, EncodeError> {
    let mut entries = Vec::new();

    for field in ALLOWED_FIELDS {
        match field {
            AllowedField::Lang => entries.push((field.as_str(), json!(object.lang))),
            AllowedField::Name => entries.push((field.as_str(), json!(object.name))),
            AllowedField::Description => {
                if let Some(description) = &object.description {
                    entries.push((field.as_str(), json!(description)));
                }
            },
            AllowedField::Aliases => entries.push((field.as_str(), json!(object.aliases))),
            AllowedField::Properties => {
                let (values, links) = property_documents(&object.properties)?;
                entries.push((PROPERTY_VALUES_KEY, Value::Object(values)));
                entries.push((LINKS_KEY, Value::Object(links)));
            },
            AllowedField::Parents => {
                let parents = object
                    .parents
                    .iter()
                    .map(|parent| json!({ "Objects": { "id": parent.id } }))
                    .collect();
                entries.push((field.as_str(), Value::Array(parents)));
            },
        }
    }

    Ok(entries)
}

/// Builds `objectsPropertiesValues` and the parallel `Links` map, both keyed
/// by property id. A repeated property id keeps the last occurrence.
fn property_documents(properties: &[PropertyValue]) -> Result<(Map<String, Value>, Map<String, Value>), EncodeError> {
    let mut values = Map::new();
    let mut links = Map::new();

    for property in properties {
        let id = property.property_id();

        let mut inner = Map::new();
        inner.insert("property_id".into(), json!(id));
        inner.insert("type".into(), json!(property.kind));
        inner.insert("value".into(), transmitted_value(property)?);
        if let Some(category) = &property.category {
            inner.insert("category_id".into(), json!(category.id));
        }
        if let Some(unit) = &property.unit {
            inner.insert("unit_id".into(), json!(unit.id));
        }
        if let Some(order_by) = &property.order_by {
            inner.insert("order_by".into(), json!(order_by));
        }

        values.insert(id.to_string(), json!({ "ObjectsPropertiesValues": inner }));

        if let Some(link) = property.link.as_deref().filter(|link| !link.is_empty()) {
            links.insert(id.to_string(), json!({ "url": link }));
        }
    }

    Ok((values, links))
}

fn transmitted_value(property: &PropertyValue) -> Result<Value, EncodeError> {
    if !property.is_object_reference() {
        return Ok(property.value.clone());
    }

    match property.value.get("id") {
        Some(id) if !id.is_null() => Ok(id.clone()),
        _ => Err(EncodeError::MissingObjectReference {
            property_id: property.property_id().clone(),
        }),
    }
}
