//! Splitting of single-line declaration strings into `(name, signature)`.
//!
//! Three shapes are understood:
//!
//! | Raw | Name | Signature |
//! |-----|------|-----------|
//! | `map : (a -> b) -> List a -> List b` | `map` | `(a -> b) -> List a -> List b` |
//! | `type Point = { x : Float, y : Float }` | `Point` | `{ x : Float, y : Float }` |
//! | `data Maybe a = Just a \| Nothing` | `Maybe a` | `Just a \| Nothing` |
//!
//! Only the first separator is consumed, so `type T = a = b` has the
//! signature `a = b`. Multi-line declarations are not supported.

use crate::error::DeclarationError;

const VALUE_SEPARATOR: &str = " : ";
const DEFINITION_SEPARATOR: &str = " = ";

/// Split `raw` on the separator its shape calls for.
fn split(raw: &str) -> Result<(&str, &str), DeclarationError> {
    let (body, separator) = match definition_body(raw) {
        Some(body) => (body, DEFINITION_SEPARATOR),
        None => (raw, VALUE_SEPARATOR),
    };

    body.split_once(separator)
        .map(|(name, signature)| (name.trim(), signature.trim()))
        .ok_or_else(|| DeclarationError::MalformedDeclaration {
            raw: raw.to_string(),
            separator,
        })
}

/// The part after the `type `/`data ` keyword, if `raw` is a definition form.
///
/// `type alias Name = ...` is treated like `type Name = ...`.
fn definition_body(raw: &str) -> Option<&str> {
    raw.strip_prefix("type alias ")
        .or_else(|| raw.strip_prefix("type "))
        .or_else(|| raw.strip_prefix("data "))
}

/// The declared name of a raw declaration.
pub fn extract_name(raw: &str) -> Result<String, DeclarationError> {
    split(raw).map(|(name, _)| name.to_string())
}

/// The type, definition or constructor list of a raw declaration.
pub fn extract_signature(raw: &str) -> Result<String, DeclarationError> {
    split(raw).map(|(_, signature)| signature.to_string())
}

/// Both halves at once.
pub fn split_declaration(raw: &str) -> Result<(String, String), DeclarationError> {
    split(raw).map(|(name, signature)| (name.to_string(), signature.to_string()))
}

/// The first word of a declared name: `Maybe a` becomes `Maybe`.
pub fn head_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}
