//! Field-name translation between Rust and wire conventions
//!
//! Callers write bodies and query parameters in `snake_case`; the Zscaler
//! APIs speak `camelCase`. [`to_wire_case`] and [`from_wire_case`] walk a
//! [`serde_json::Value`] tree and rename every object key, leaving values
//! untouched.
//!
//! An underscore that is not followed by a letter (`address_1`) is kept on
//! the way out, so every canonical snake key survives a round trip.

use serde_json::{Map, Value};

/// Convert a `snake_case` identifier to `camelCase`
///
/// ```
/// use zscaler_common::case::snake_to_camel;
///
/// assert_eq!(snake_to_camel("microtenant_id"), "microtenantId");
/// assert_eq!(snake_to_camel("alreadyCamel"), "alreadyCamel");
/// ```
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    let mut leading = true;

    while let Some(c) = chars.next() {
        if c == '_' && !leading {
            match chars.peek() {
                Some(next) if next.is_ascii_lowercase() => {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                }
                _ => out.push('_'),
            }
            continue;
        }
        leading = leading && c == '_';
        out.push(c);
    }
    out
}

/// Convert a `camelCase` identifier to `snake_case`
///
/// Acronym runs are kept together: `HTTPServer` becomes `http_server`.
pub fn camel_to_snake(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename every object key in `value` to `camelCase`, recursively
pub fn to_wire_case(value: &Value) -> Value {
    rename_keys(value, snake_to_camel)
}

/// Rename every object key in `value` to `snake_case`, recursively
pub fn from_wire_case(value: &Value) -> Value {
    rename_keys(value, camel_to_snake)
}

fn rename_keys(value: &Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let renamed: Map<String, Value> =
                map.iter().map(|(k, v)| (rename(k), rename_keys(v, rename))).collect();
            Value::Object(renamed)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| rename_keys(v, rename)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("page_size"), "pageSize");
        assert_eq!(snake_to_camel("ip_v4_address"), "ipV4Address");
        assert_eq!(snake_to_camel("address_1"), "address_1");
        assert_eq!(snake_to_camel("_private_key"), "_privateKey");
        assert_eq!(snake_to_camel("id"), "id");
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("totalPages"), "total_pages");
        assert_eq!(camel_to_snake("nextOffset"), "next_offset");
        assert_eq!(camel_to_snake("HTTPServer"), "http_server");
        assert_eq!(camel_to_snake("ipv4Address"), "ipv4_address");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
    }

    #[test]
    fn test_nested_translation() {
        let body = json!({
            "app_segment": {
                "server_groups": [{"group_id": 1, "is_enabled": true}],
                "domain_names": ["a_b.example.com"]
            }
        });

        let wire = to_wire_case(&body);
        assert_eq!(
            wire,
            json!({
                "appSegment": {
                    "serverGroups": [{"groupId": 1, "isEnabled": true}],
                    "domainNames": ["a_b.example.com"]
                }
            })
        );
    }

    /// Validates the wire translation round trip over nested objects and lists.
    ///
    /// Assertions:
    /// - Keys and values come back unchanged after `to_wire_case` then
    ///   `from_wire_case`.
    #[test]
    fn test_round_trip_restores_keys() {
        let body = json!({
            "microtenant_id": "123",
            "list": [
                {"total_pages": 3, "next_offset": null, "address_1": "x"},
                [{"deeply_nested_key": {"ipv4_address": "10.0.0.1"}}]
            ],
            "scalar_value": 7
        });

        assert_eq!(from_wire_case(&to_wire_case(&body)), body);
    }

    #[test]
    fn test_scalars_are_untouched() {
        assert_eq!(to_wire_case(&json!("snake_value")), json!("snake_value"));
        assert_eq!(from_wire_case(&json!(null)), json!(null));
    }
}
