use indexmap::IndexMap;
use serde_json::Value;
use url::form_urlencoded::byte_serialize;

/// Separator between `key=value` pairs in an encoded object body.
///
/// Values may legitimately contain `&` and `=`; they are percent-encoded, and
/// the newline makes each pair stand on its own line for the API.
pub const FIELD_SEPARATOR: &str = "\n&";

/// Flat, bracket-path keyed request fields (`outer[inner][id]` -> `value`).
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFields {
    pairs: IndexMap<String, String>,
}

impl FlatFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Flattens `value` under `prefix` and adds the resulting fields.
    pub fn extend_flattened(&mut self, prefix: &str, value: &Value) {
        flatten_into(prefix, value, self);
    }

    /// Form-encodes every pair and joins them with [`FIELD_SEPARATOR`].
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{}={}", form_encode(key), form_encode(value)))
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FlatFields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

fn form_encode(input: &str) -> String {
    byte_serialize(input.as_bytes()).collect()
}

/// Writes `value` into `out` using bracket paths rooted at `prefix`.
///
/// Objects and arrays recurse (`prefix[key]`, `prefix[index]`); strings are
/// kept verbatim, numbers printed in decimal, booleans become `1`/`0`, and
/// `null` as well as empty containers produce nothing.
pub fn flatten_into(prefix: &str, value: &Value, out: &mut FlatFields) {
    match value {
        Value::Null => {},
        Value::Bool(flag) => out.insert(prefix, if *flag { "1" } else { "0" }),
        Value::Number(number) => out.insert(prefix, number.to_string()),
        Value::String(text) => out.insert(prefix, text.as_str()),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}[{index}]"), item, out);
            }
        },
        Value::Object(entries) => {
            for (key, item) in entries {
                flatten_into(&format!("{prefix}[{key}]"), item, out);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_paths() {
        let mut fields = FlatFields::new();
        flatten_into(
            "parents",
            &json!([{"Objects": {"id": "7"}}, {"Objects": {"id": 8}}]),
            &mut fields,
        );

        assert_eq!(fields.get("parents[0][Objects][id]"), Some("7"));
        assert_eq!(fields.get("parents[1][Objects][id]"), Some("8"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_flatten_scalars() {
        let mut fields = FlatFields::new();
        fields.extend_flattened("flag", &json!(true));
        fields.extend_flattened("off", &json!(false));
        fields.extend_flattened("zero", &json!(0));
        fields.extend_flattened("gone", &Value::Null);
        fields.extend_flattened("empty", &json!([]));

        assert_eq!(fields.get("flag"), Some("1"));
        assert_eq!(fields.get("off"), Some("0"));
        assert_eq!(fields.get("zero"), Some("0"));
        assert!(!fields.contains_key("gone"));
        assert!(!fields.contains_key("empty"));
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut fields: FlatFields = [("a", "1"), ("b", "2")].into_iter().collect();
        fields.insert("a", "3");
        assert_eq!(fields.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_many_fields_keep_insertion_order() {
        let mut fields = FlatFields::new();
        for round in 0..3 {
            for i in 0..10_000 {
                fields.insert(format!("f{i}"), format!("{round}"));
            }
        }

        assert_eq!(fields.len(), 10_000);
        assert_eq!(fields.keys().next(), Some("f0"));
        assert_eq!(fields.keys().last(), Some("f9999"));
        assert!(fields.iter().all(|(_, value)| value == "2"));
    }

    #[test]
    fn test_query_string_escapes_and_uses_newline_separator() {
        let fields: FlatFields = [("name", "Cats & dogs"), ("parents[0][Objects][id]", "a=b")]
            .into_iter()
            .collect();

        assert_eq!(
            fields.to_query_string(),
            "name=Cats+%26+dogs\n&parents%5B0%5D%5BObjects%5D%5Bid%5D=a%3Db"
        );
    }
}
