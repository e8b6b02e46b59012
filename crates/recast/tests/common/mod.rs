//! Shared helpers for conversion integration tests.
//!
//! Fixture classes are built fresh per call, and defined classes
//! compare by identity. Tests that need the same class in two places
//! must call a fixture once and clone the result.

use recast::{Class, ConvertError, Converter, TypeDesc, Value};

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

/// One-shot conversion through a standard converter.
///
/// # Example
/// ```
/// assert_eq!(convert(Value::str("5"), Class::I64), Ok(Value::I64(5)));
/// ```
pub fn convert(value: Value, target: impl Into<TypeDesc>) -> Result<Value, ConvertError> {
    Converter::standard().convert(value).to(target)
}

/// Assert that `source` converts to exactly `expected`.
pub fn assert_converts(source: Value, target: impl Into<TypeDesc>, expected: Value) {
    match convert(source.clone(), target) {
        Ok(got) => assert_eq!(got, expected, "converting {source:?}"),
        Err(e) => panic!("expected {expected:?} converting {source:?}, got error: {e}"),
    }
}

/// Three-constant enum used across the scalar and collection tests.
pub fn signal() -> Class {
    Class::enumeration("Signal", ["RED", "AMBER", "GREEN"])
}

/// Flat record with a string and a numeric field.
pub fn address() -> Class {
    Class::record("Address")
        .field("street", Class::Str)
        .field("number", Class::I32)
        .build()
}
