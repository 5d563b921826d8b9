//! Attribute name → public field name conversion

use serde::{Deserialize, Serialize};

/// How declared attribute names become public field names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// `author_id` → `authorId`
    #[default]
    CamelCase,
    /// Names are used as declared
    Preserve,
}

impl FieldNaming {
    /// Public name for a declared attribute
    pub fn public_name(&self, attr_name: &str) -> String {
        match self {
            FieldNaming::CamelCase => snake_to_camel(attr_name),
            FieldNaming::Preserve => attr_name.to_string(),
        }
    }
}

/// Convert snake_case to camelCase
///
/// The first character is lowercased; every character following an
/// underscore is uppercased and the underscore dropped.
pub fn snake_to_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    if let Some(first) = chars.next() {
        result.extend(first.to_lowercase());
    }

    let mut upper_next = false;
    for ch in chars {
        if upper_next {
            result.extend(ch.to_uppercase());
            upper_next = false;
        } else if ch == '_' {
            upper_next = true;
        } else {
            result.push(ch);
        }
    }

    // trailing underscore is kept
    if upper_next {
        result.push('_');
    }

    result
}
