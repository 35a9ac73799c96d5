//! Conversions between `jsonb` string maps and [`BTreeMap`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Encodes a string map as a JSON object.
pub fn to_string_map(map: &BTreeMap<String, String>) -> Value {
    let object = map
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect::<Map<_, _>>();
    Value::Object(object)
}

/// Decodes a JSON object into a string map.
///
/// Non-string scalar values are stringified; nested values and non-object
/// inputs are dropped.
pub fn from_string_map(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(object) = value else {
        return BTreeMap::new();
    };

    object
        .iter()
        .filter_map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((k.clone(), v))
        })
        .collect()
}

/// Character length of `value` as PostgreSQL renders it with `jsonb::TEXT`.
///
/// The rendering matches serde's compact form with a space after every `:`
/// and `,` separator.
pub fn jsonb_text_len(value: &Value) -> usize {
    fn separator_spaces(value: &Value) -> usize {
        match value {
            Value::Object(object) => {
                object.len() * 2 - usize::from(!object.is_empty())
                    + object.values().map(separator_spaces).sum::<usize>()
            }
            Value::Array(array) => {
                array.len().saturating_sub(1) + array.iter().map(separator_spaces).sum::<usize>()
            }
            _ => 0,
        }
    }

    value.to_string().chars().count() + separator_spaces(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn roundtrip() {
        let mut map = BTreeMap::new();
        map.insert("region".to_owned(), "eu-west-1".to_owned());
        map.insert("tier".to_owned(), "gold".to_owned());

        assert_eq!(from_string_map(&to_string_map(&map)), map);
    }

    #[test]
    fn lenient_decoding() {
        let value = json!({ "a": "x", "b": 1, "c": true, "d": { "nested": 1 }, "e": null });
        let map = from_string_map(&value);

        assert_eq!(map.len(), 3);
        assert_eq!(map["b"], "1");
        assert_eq!(map["c"], "true");
        assert!(from_string_map(&json!([1, 2])).is_empty());
    }

    #[test]
    fn jsonb_rendering_length() {
        assert_eq!(jsonb_text_len(&json!({})), 2);
        // {"a": "x", "b": "é"}
        assert_eq!(jsonb_text_len(&json!({ "a": "x", "b": "é" })), 20);
        // [1, [2, 3]]
        assert_eq!(jsonb_text_len(&json!([1, [2, 3]])), 11);
    }
}
