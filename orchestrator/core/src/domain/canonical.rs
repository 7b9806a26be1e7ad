// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Canonical JSON
//!
//! Deterministic byte encoding of a [`serde_json::Value`] used as the input to
//! every signature and evidence digest in the network.
//!
//! ## Rules
//!
//! - Object keys are sorted lexicographically (by UTF-8 bytes) at every depth.
//! - No insignificant whitespace: separators are `,` and `:` only.
//! - Strings are escaped exactly as `serde_json` escapes them.
//! - Numbers use `serde_json`'s `Number` formatting (integers verbatim, floats
//!   through the shortest round-trip representation).
//!
//! The encoder walks the value itself instead of trusting the map's iteration
//! order, so it produces the same bytes whether or not `serde_json` was built
//! with `preserve_order`.

use serde_json::Value;

/// Encode `value` into its canonical JSON text.
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Encode `value` into canonical JSON bytes.
pub fn to_canonical_vec(value: &Value) -> Vec<u8> {
    to_canonical_string(value).into_bytes()
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map};

    #[test]
    fn test_keys_sorted_and_compact() {
        let value = json!({"b": 1, "a": {"d": [1, 2, {"z": null, "y": true}], "c": "x"}});
        assert_eq!(
            to_canonical_string(&value),
            r#"{"a":{"c":"x","d":[1,2,{"y":true,"z":null}]},"b":1}"#
        );
    }

    #[test]
    fn test_strings_are_escaped() {
        let value = json!({"msg": "line\n\"quoted\""});
        assert_eq!(to_canonical_string(&value), r#"{"msg":"line\n\"quoted\""}"#);
    }

    #[test]
    fn test_escaped_keys_and_values_parse_back() {
        let value = json!({"tab\tkey": "bell\u{7} é ✓", "nul": "\u{0}"});
        let text = to_canonical_string(&value);
        assert_eq!(text, r#"{"nul":"\u0000","tab\tkey":"bell\u0007 é ✓"}"#);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_numbers_are_stable() {
        let value = json!({"int": 42, "neg": -7, "float": 0.25});
        assert_eq!(to_canonical_string(&value), r#"{"float":0.25,"int":42,"neg":-7}"#);
    }

    #[test]
    fn test_canonicalisation_is_idempotent() {
        let value = json!({"k2": [3, 2, 1], "k1": {"b": "B", "a": "A"}});
        let once = to_canonical_string(&value);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        assert_eq!(to_canonical_string(&reparsed), once);
    }

    proptest! {
        #[test]
        fn prop_insertion_order_does_not_matter(
            entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12)
        ) {
            let mut forward = Map::new();
            for (k, v) in entries.iter() {
                forward.insert(k.clone(), json!(v));
            }
            let mut backward = Map::new();
            for (k, v) in entries.iter().rev() {
                backward.insert(k.clone(), json!(v));
            }
            prop_assert_eq!(
                to_canonical_vec(&Value::Object(forward)),
                to_canonical_vec(&Value::Object(backward))
            );
        }
    }
}
