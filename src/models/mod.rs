//! Data model for catalog objects.
//!
//! A [`CatalogObject`] is a node in the catalog: a name in one language, some
//! aliases, links to parent objects, and a list of property values. These
//! types are what callers build before a create/update call and what a
//! fetched object deserializes into, so a fetched object can be edited and
//! sent back.
//!
//! # Key Types
//!
//! - [`CatalogObject`] - The object itself
//! - [`ParentRef`] - Link to a parent object; only the id is transmitted
//! - [`PropertyValue`] - One property value, optionally categorised, with a unit or link
//! - [`EntityId`] - Id that accepts both JSON strings and integers
//! - [`Expand`] - Related entities the API can embed in a response

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub mod entity_id;
pub use entity_id::EntityId;
pub mod expand;
pub use expand::Expand;

use entity_id::{optional_number, seq_or_map};

/// Property type whose value is a reference to another catalog object.
pub const OBJECT_PROPERTY_TYPE: &str = "object";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub lang: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "seq_or_map")]
    pub aliases: Vec<String>,
    #[serde(default, deserialize_with = "seq_or_map")]
    pub parents: Vec<ParentRef>,
    #[serde(default, deserialize_with = "seq_or_map")]
    pub properties: Vec<PropertyValue>,
    /// Every other field found on the input (images, timestamps, ...).
    /// Kept so a fetched object round-trips, but never transmitted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogObject {
    pub fn new(lang: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_parent(mut self, id: impl Into<EntityId>) -> Self {
        self.parents.push(ParentRef {
            id: id.into(),
            name: None,
        });
        self
    }

    pub fn with_property(mut self, property: PropertyValue) -> Self {
        self.properties.push(property);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Anything the API refers to by id alone (property names, categories, units).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: EntityId,
}

impl Reference {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Reference { id: id.into() }
    }
}

/// One property value attached to an object.
///
/// `name` identifies the property definition. When `kind` is
/// [`OBJECT_PROPERTY_TYPE`], `value` must be a reference carrying an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: Reference,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Reference>,
    /// Any JSON number; numeric strings are accepted when reading.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_number")]
    pub order_by: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl PropertyValue {
    pub fn new(property_id: impl Into<EntityId>, kind: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Reference::new(property_id),
            kind: kind.into(),
            value: value.into(),
            category: None,
            unit: None,
            order_by: None,
            link: None,
        }
    }

    /// A property whose value points at another catalog object.
    pub fn object_reference(property_id: impl Into<EntityId>, target: impl Into<EntityId>) -> Self {
        let target: EntityId = target.into();
        let target = serde_json::json!({ "id": target });
        Self::new(property_id, OBJECT_PROPERTY_TYPE, target)
    }

    pub fn property_id(&self) -> &EntityId {
        &self.name.id
    }

    pub fn is_object_reference(&self) -> bool {
        self.kind == OBJECT_PROPERTY_TYPE
    }

    pub fn with_category(mut self, id: impl Into<EntityId>) -> Self {
        self.category = Some(Reference::new(id));
        self
    }

    pub fn with_unit(mut self, id: impl Into<EntityId>) -> Self {
        self.unit = Some(Reference::new(id));
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<Number>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
