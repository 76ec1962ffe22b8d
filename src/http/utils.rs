//! Helpers for turning an encoded query-string body back into fields.
//!
//! Bodies handed to the executor are `key=value` pairs joined by `&` (the
//! object encoder joins with `\n&`). Decoding follows form rules: `%XX`
//! escapes are resolved and `+` becomes a space.

use std::borrow::Cow;

use indexmap::IndexMap;

/// Percent-decodes `input` using form rules.
///
/// Invalid UTF-8 produced by stray escapes is replaced rather than rejected,
/// so decoding never fails.
pub fn url_decode(input: &str) -> String {
    let spaced: Cow<'_, str> = if input.contains('+') {
        Cow::Owned(input.replace('+', " "))
    } else {
        Cow::Borrowed(input)
    };
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Splits an encoded body into decoded `(key, value)` pairs.
///
/// Each `&`-separated piece is trimmed, then split on its first `=`. Empty
/// pieces are skipped, a piece without `=` yields an empty value, and a
/// repeated key keeps its first position but takes the last value.
pub fn parse_fields(encoded: &str) -> Vec<(String, String)> {
    let mut fields: IndexMap<String, String> = IndexMap::new();

    for piece in encoded.split('&').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
        fields.insert(url_decode(key), url_decode(value));
    }

    fields.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("a%5B0%5D"), "a[0]");
        assert_eq!(url_decode("Fido+the%20dog"), "Fido the dog");
        assert_eq!(url_decode("a%26b%3Dc"), "a&b=c");
        assert_eq!(url_decode("plain"), "plain");
    }

    #[test]
    fn test_parse_fields_trims_newline_separator() {
        let fields = parse_fields("lang=en\n&name=Fido\n&parents%5B0%5D%5BObjects%5D%5Bid%5D=7");
        assert_eq!(
            fields,
            vec![
                ("lang".to_string(), "en".to_string()),
                ("name".to_string(), "Fido".to_string()),
                ("parents[0][Objects][id]".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_fields_splits_on_first_equals_only() {
        let fields = parse_fields("q=a=b&flag&&x=%26");
        assert_eq!(
            fields,
            vec![
                ("q".to_string(), "a=b".to_string()),
                ("flag".to_string(), String::new()),
                ("x".to_string(), "&".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_fields_last_value_wins() {
        let fields = parse_fields("a=1&b=2&a=3");
        assert_eq!(
            fields,
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_parse_fields_many_repeated_keys() {
        let body = (0..20_000)
            .map(|i| format!("k{}={i}", i % 500))
            .collect::<Vec<_>>()
            .join("&");
        let fields = parse_fields(&body);

        assert_eq!(fields.len(), 500);
        assert_eq!(fields[0], ("k0".to_string(), "19500".to_string()));
        assert_eq!(fields[499], ("k499".to_string(), "19999".to_string()));
    }

    #[test]
    fn test_parse_fields_empty_body() {
        assert!(parse_fields("").is_empty());
        assert!(parse_fields("\n").is_empty());
    }
}
