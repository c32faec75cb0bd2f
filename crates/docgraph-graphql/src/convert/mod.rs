//! Schema-to-type conversion.
//!
//! The pipeline: [`classify`] decides a field's category,
//! [`field::convert_field`] derives its GraphQL type (synthesizing nested
//! named types through the registry), [`model::convert_model`] assembles a
//! whole schema into one composite type, [`input`] and [`filter`] derive the
//! mutation and query argument shapes, and [`discriminator`] composes
//! polymorphic subtype groups.

pub mod classify;
pub mod discriminator;
pub mod field;
pub mod filter;
pub mod input;
pub mod model;

pub use classify::{ComplexTypeCategory, classify};
pub use discriminator::DiscriminatorGroup;

/// Capitalizes the first character of a string.
pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Lowercases the first character of a string.
pub(crate) fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Checks if a name is valid for GraphQL: `[_a-zA-Z][_a-zA-Z0-9]*`.
pub(crate) fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("name"), "Name");
        assert_eq!(capitalize_first("subDoc"), "SubDoc");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_lowercase_first() {
        assert_eq!(lowercase_first("User"), "user");
        assert_eq!(lowercase_first(""), "");
    }

    #[test]
    fn test_is_valid_graphql_name() {
        assert!(is_valid_graphql_name("User"));
        assert!(is_valid_graphql_name("_internal"));
        assert!(is_valid_graphql_name("Type123"));
        assert!(!is_valid_graphql_name("123Type"));
        assert!(!is_valid_graphql_name("a-b"));
        assert!(!is_valid_graphql_name(""));
    }
}
