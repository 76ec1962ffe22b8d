use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use std::fmt;
use std::marker::PhantomData;

/// Identifier of a catalog entity (object, property, unit, category).
///
/// The API is inconsistent about ids: it returns integers but accepts
/// strings, so both deserialize into the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
                Ok(EntityId::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<EntityId, E> {
                Ok(EntityId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Deserializes a sequence from either a JSON array or a JSON object.
///
/// The API returns `parents` and `properties` as objects keyed by id. The
/// keys are dropped and the values kept in document order; `null` gives an
/// empty sequence.
pub(crate) fn seq_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct SeqOrMap<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for SeqOrMap<T> {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a sequence or a map")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<T>, A::Error> {
            let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(item) = seq.next_element()? {
                items.push(item);
            }
            Ok(items)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Vec<T>, A::Error> {
            let mut items = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((IgnoredAny, item)) = map.next_entry::<IgnoredAny, T>()? {
                items.push(item);
            }
            Ok(items)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Vec<T>, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Vec<T>, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(SeqOrMap(PhantomData))
}

/// Deserializes an optional number that may arrive as an integer, a float or
/// a numeric string. `null` and the empty string give `None`.
pub(crate) fn optional_number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberLike;

    impl<'de> Visitor<'de> for NumberLike {
        type Value = Option<Number>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Number::from(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(Number::from(v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Number::from_f64(v)
                .map(Some)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Float(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            if let Ok(int) = v.parse::<i64>() {
                return Ok(Some(Number::from(int)));
            }
            v.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Some)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(NumberLike)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "seq_or_map")]
        items: Vec<EntityId>,
    }

    #[test]
    fn test_entity_id_from_string_or_number() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"["7", 42]"#).unwrap();
        assert_eq!(ids, vec![EntityId::from("7"), EntityId::from(42u64)]);
        assert_eq!(ids[1].as_str(), "42");
        assert!(serde_json::from_str::<EntityId>("true").is_err());
    }

    #[test]
    fn test_seq_or_map() {
        let holder: Holder = serde_json::from_str(r#"{"items": ["1", "2"]}"#).unwrap();
        assert_eq!(holder.items.len(), 2);

        let holder: Holder = serde_json::from_str(r#"{"items": {"9": 9, "3": 3}}"#).unwrap();
        assert_eq!(holder.items, vec![EntityId::from("9"), EntityId::from("3")]);

        let holder: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(holder.items.is_empty());

        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(holder.items.is_empty());
    }

    #[derive(Debug, Deserialize)]
    struct Ordered {
        #[serde(default, deserialize_with = "optional_number")]
        order_by: Option<Number>,
    }

    #[test]
    fn test_optional_number_accepts_numeric_shapes() {
        let parse = |json: &str| serde_json::from_str::<Ordered>(json).unwrap().order_by;

        assert_eq!(parse(r#"{"order_by": 0}"#), Some(Number::from(0)));
        assert_eq!(parse(r#"{"order_by": -3}"#), Some(Number::from(-3)));
        assert_eq!(parse(r#"{"order_by": 1.5}"#), Number::from_f64(1.5));
        assert_eq!(parse(r#"{"order_by": "2"}"#), Some(Number::from(2)));
        assert_eq!(parse(r#"{"order_by": "2.25"}"#), Number::from_f64(2.25));
        assert_eq!(parse(r#"{"order_by": ""}"#), None);
        assert_eq!(parse(r#"{"order_by": null}"#), None);
        assert_eq!(parse("{}"), None);
        assert!(serde_json::from_str::<Ordered>(r#"{"order_by": "first"}"#).is_err());
    }
}
