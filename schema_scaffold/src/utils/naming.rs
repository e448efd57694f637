//! Naming utilities for schema_scaffold
//!
//! Identifier casing used by the templates. All transforms work on ASCII
//! bytes; callers reject non-ASCII names with [`validate_identifier`] first.

use crate::error::{Error, Result};

/// `user_profile` -> `UserProfile`
///
/// Uppercases the first letter and every letter following an underscore,
/// drops the underscores and passes every other byte through.
pub fn snake_to_pascal(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = true;
    for b in name.bytes() {
        if b == b'_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            result.push(b.to_ascii_uppercase() as char);
        } else {
            result.push(b as char);
        }
        upper_next = false;
    }
    result
}

/// `user_profile` -> `userProfile`
pub fn pascal_first_lower(name: &str) -> String {
    let pascal = snake_to_pascal(name);
    let mut bytes = pascal.into_bytes();
    if let Some(first) = bytes.first_mut() {
        first.make_ascii_lowercase();
    }
    bytes.into_iter().map(char::from).collect()
}

/// `UserProfile` -> `USER_PROFILE`
pub fn pascal_to_upper_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for (i, b) in name.bytes().enumerate() {
        if i > 0 && b.is_ascii_uppercase() {
            result.push('_');
        }
        result.push(b.to_ascii_uppercase() as char);
    }
    result
}

/// `UserProfile` -> `user_profile`, the inverse of [`snake_to_pascal`]
pub fn pascal_to_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for (i, b) in name.bytes().enumerate() {
        if b.is_ascii_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(b.to_ascii_lowercase() as char);
        } else {
            result.push(b as char);
        }
    }
    result
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super", "_"];

/// True when `name` is an ASCII identifier: a letter or underscore followed
/// by letters, digits and underscores
pub fn is_ascii_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {
            bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        _ => false,
    }
}

/// A column or table name usable as a Rust identifier
///
/// Keywords become raw identifiers (`type` -> `r#type`); the few that cannot
/// be raw get a trailing underscore.
pub fn rust_ident(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// File stem of a per-table module
///
/// Every layer keeps its registry in `mod.rs`, so a table named `mod` is
/// written to `mod_.rs` instead.
pub fn module_file_stem(name: &str) -> String {
    if name == "mod" {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Reject names the casing transforms would mangle
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_ascii_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user_profile", "UserProfile")]
    #[case("id", "Id")]
    #[case("created_at", "CreatedAt")]
    #[case("order2item", "Order2item")]
    #[case("user__name", "UserName")]
    #[case("already_Upper", "AlreadyUpper")]
    #[case("", "")]
    fn test_snake_to_pascal(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(snake_to_pascal(input), expected);
    }

    #[test]
    fn test_pascal_first_lower() {
        assert_eq!(pascal_first_lower("user_profile"), "userProfile");
        assert_eq!(pascal_first_lower("id"), "id");
        assert_eq!(pascal_first_lower(""), "");
    }

    #[test]
    fn test_pascal_to_upper_snake() {
        assert_eq!(pascal_to_upper_snake("UserProfile"), "USER_PROFILE");
        assert_eq!(pascal_to_upper_snake("Account"), "ACCOUNT");
        assert_eq!(pascal_to_upper_snake("ABc"), "A_BC");
    }

    #[rstest]
    #[case("account")]
    #[case("user_profile")]
    #[case("order_item_v2")]
    #[case("a_b_c")]
    fn test_casing_round_trip(#[case] name: &str) {
        assert_eq!(pascal_to_snake(&snake_to_pascal(name)), name);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("user_2").is_ok());
        assert!(validate_identifier("Account").is_ok());
        assert!(matches!(
            validate_identifier("usuário"),
            Err(Error::InvalidIdentifier(name)) if name == "usuário"
        ));
        assert!(validate_identifier("first name").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fa_codes").is_err());
    }

    #[test]
    fn test_rust_ident() {
        assert_eq!(rust_ident("account"), "account");
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("self"), "self_");
    }

    #[rstest]
    #[case("account", "account")]
    #[case("mod", "mod_")]
    #[case("type", "type")]
    #[case("module", "module")]
    fn test_module_file_stem(#[case] table: &str, #[case] expected: &str) {
        assert_eq!(module_file_stem(table), expected);
    }
}
