//! Key case conversion for wire attribute names (`keyForAttribute`) and config column defaults.

use serde::{Deserialize, Serialize};

/// Casing applied to attribute keys when reading or writing JSON:API documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCase {
    /// Keys are passed through untouched.
    #[default]
    #[serde(rename = "identity")]
    Identity,
    #[serde(rename = "camelCase")]
    Camel,
    #[serde(rename = "CamelCase")]
    Pascal,
    #[serde(rename = "snake_case", alias = "underscore_case")]
    Snake,
    #[serde(rename = "dash-case", alias = "kebab-case", alias = "lisp-case", alias = "spinal-case")]
    Dash,
}

impl KeyCase {
    pub fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Identity => key.to_string(),
            KeyCase::Camel => to_camel_case(key),
            KeyCase::Pascal => {
                let camel = to_camel_case(key);
                let mut chars = camel.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => camel,
                }
            }
            KeyCase::Snake => separate_words(key, '_'),
            KeyCase::Dash => separate_words(key, '-'),
        }
    }
}

/// "user_id" -> "userId", "created-at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = !out.is_empty();
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// "userId" -> "user_id"
pub fn to_snake_case(s: &str) -> String {
    separate_words(s, '_')
}

fn separate_words(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c == '_' || c == '-' {
            out.push(sep);
        } else if c.is_uppercase() {
            if i > 0 && !out.ends_with(sep) {
                out.push(sep);
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_cases() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(KeyCase::Dash.apply("createdAt"), "created-at");
        assert_eq!(KeyCase::Dash.apply("created_at"), "created-at");
        assert_eq!(KeyCase::Pascal.apply("first_name"), "FirstName");
        assert_eq!(KeyCase::Camel.apply("first-name"), "firstName");
        assert_eq!(KeyCase::Identity.apply("first_Name"), "first_Name");
    }

    #[test]
    fn parses_serializer_case_names() {
        let k: KeyCase = serde_json::from_str("\"underscore_case\"").unwrap();
        assert_eq!(k, KeyCase::Snake);
        let k: KeyCase = serde_json::from_str("\"kebab-case\"").unwrap();
        assert_eq!(k, KeyCase::Dash);
    }
}
