//! Scalar coercion matrix: identity, numbers, booleans, characters,
//! enums, the textual fallback, and default-value substitution.

mod common;

use common::{assert_converts, convert, signal};
use pretty_assertions::assert_eq;
use recast::{Class, ConvertError, Converter, TypeDesc, Value};
use rstest::rstest;

// ============================================================================
// Identity and widening
// ============================================================================

#[test]
fn same_class_passes_through() {
    assert_converts(Value::I32(5), Class::I32, Value::I32(5));
    assert_converts(Value::str("x"), Class::Str, Value::str("x"));

    let signal = signal();
    let green = signal.enum_value("GREEN").unwrap();
    assert_converts(green.clone(), signal, green);
}

#[test]
fn any_target_passes_everything_through() {
    assert_converts(Value::Bool(true), Class::Any, Value::Bool(true));
    let list = Value::list(vec![Value::I64(1)]);
    assert_converts(list.clone(), Class::Any, list);
}

#[rstest]
#[case(Value::I8(3), Class::I32, Value::I32(3))]
#[case(Value::I32(41), Class::I64, Value::I64(41))]
#[case(Value::I32(5), Class::F64, Value::F64(5.0))]
#[case(Value::F32(1.5), Class::F64, Value::F64(1.5))]
fn widening_is_lossless(#[case] source: Value, #[case] target: Class, #[case] expected: Value) {
    assert_converts(source, target, expected);
}

#[rstest]
#[case(Value::I64(300), Class::I8, Value::I8(44))]
#[case(Value::I64(i64::MAX), Class::I32, Value::I32(-1))]
#[case(Value::F64(3.9), Class::I32, Value::I32(3))]
#[case(Value::F64(-2.7), Class::I64, Value::I64(-2))]
#[case(Value::F64(0.25), Class::F32, Value::F32(0.25))]
fn narrowing_truncates_instead_of_failing(
    #[case] source: Value,
    #[case] target: Class,
    #[case] expected: Value,
) {
    assert_converts(source, target, expected);
}

// ============================================================================
// Textual sources
// ============================================================================

#[rstest]
#[case("42", Class::I64, Value::I64(42))]
#[case("-7", Class::I32, Value::I32(-7))]
#[case("0", Class::I16, Value::I16(0))]
#[case("1.5", Class::F64, Value::F64(1.5))]
#[case("1.5", Class::F32, Value::F32(1.5))]
#[case("-0.25", Class::F64, Value::F64(-0.25))]
fn strings_parse_into_numbers(#[case] text: &str, #[case] target: Class, #[case] expected: Value) {
    assert_converts(Value::str(text), target, expected);
}

#[rstest]
#[case("abc", Class::I64)]
#[case("3.7", Class::I32)]
#[case("", Class::F64)]
fn unparseable_strings_fail(#[case] text: &str, #[case] target: Class) {
    assert!(matches!(
        convert(Value::str(text), target),
        Err(ConvertError::CannotConvert { .. })
    ));
}

#[rstest]
#[case("true", true)]
#[case("TRUE", true)]
#[case("True", true)]
#[case("false", false)]
#[case("yes", false)]
#[case("1", false)]
#[case("", false)]
fn bool_from_string_never_fails(#[case] text: &str, #[case] expected: bool) {
    assert_converts(Value::str(text), Class::Bool, Value::Bool(expected));
}

#[test]
fn char_takes_the_first_character() {
    assert_converts(Value::str("hello"), Class::Char, Value::Char('h'));
    assert!(convert(Value::str(""), Class::Char).is_err());
}

// ============================================================================
// Cross-coercions between value scalars
// ============================================================================

#[rstest]
#[case(Value::Bool(true), Class::I64, Value::I64(1))]
#[case(Value::Bool(false), Class::I32, Value::I32(0))]
#[case(Value::Bool(true), Class::F64, Value::F64(1.0))]
#[case(Value::Char('A'), Class::I64, Value::I64(65))]
#[case(Value::Char('ψ'), Class::I32, Value::I32(968))]
fn scalars_become_numbers(#[case] source: Value, #[case] target: Class, #[case] expected: Value) {
    assert_converts(source, target, expected);
}

#[rstest]
#[case(Value::I64(0), false)]
#[case(Value::I64(2), true)]
#[case(Value::F64(0.0), false)]
#[case(Value::F64(0.5), true)]
#[case(Value::Char('\0'), false)]
#[case(Value::Char('x'), true)]
fn truthiness_of_value_scalars(#[case] source: Value, #[case] expected: bool) {
    assert_converts(source, Class::Bool, Value::Bool(expected));
}

#[test]
fn chars_from_numbers_are_code_points() {
    assert_converts(Value::I64(65), Class::Char, Value::Char('A'));
    assert_converts(Value::I32(968), Class::Char, Value::Char('ψ'));
    assert!(convert(Value::I64(-1), Class::Char).is_err());
}

#[test]
fn chars_from_booleans() {
    assert_converts(Value::Bool(true), Class::Char, Value::Char('\u{1}'));
    assert_converts(Value::Bool(false), Class::Char, Value::Char('\0'));
}

#[rstest]
#[case(Value::I64(42), "42")]
#[case(Value::Bool(true), "true")]
#[case(Value::F64(1.5), "1.5")]
#[case(Value::Char('c'), "c")]
fn scalars_stringify(#[case] source: Value, #[case] expected: &str) {
    assert_converts(source, Class::Str, Value::str(expected));
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn enum_from_name_prefers_exact_then_case_insensitive() {
    let signal = signal();
    assert_eq!(
        convert(Value::str("GREEN"), signal.clone()),
        Ok(signal.enum_value("GREEN").unwrap())
    );
    assert_eq!(
        convert(Value::str("amber"), signal.clone()),
        Ok(signal.enum_value("AMBER").unwrap())
    );
    assert!(convert(Value::str("PURPLE"), signal).is_err());
}

#[test]
fn enum_from_ordinal() {
    let signal = signal();
    assert_eq!(
        convert(Value::I32(0), signal.clone()),
        Ok(signal.enum_value_at(0).unwrap())
    );
    assert_eq!(
        convert(Value::I64(2), signal.clone()),
        Ok(signal.enum_value_at(2).unwrap())
    );
}

#[test]
fn enum_ordinal_out_of_range_is_a_hard_failure() {
    let signal = signal();
    assert!(matches!(
        convert(Value::I32(7), signal.clone()),
        Err(ConvertError::EnumIndexOutOfRange { .. })
    ));
    assert!(matches!(
        convert(Value::I32(-1), signal.clone()),
        Err(ConvertError::EnumIndexOutOfRange { .. })
    ));
    // hard failures are never replaced by the configured default
    let masked = Converter::standard()
        .convert(Value::I32(7))
        .default_value(signal.enum_value_at(0).unwrap())
        .to(signal);
    assert!(matches!(
        masked,
        Err(ConvertError::EnumIndexOutOfRange { .. })
    ));
}

#[test]
fn enums_round_out_as_ordinal_and_name() {
    let signal = signal();
    let amber = signal.enum_value("AMBER").unwrap();
    assert_converts(amber.clone(), Class::I32, Value::I32(1));
    assert_converts(amber, Class::Str, Value::str("AMBER"));
}

#[test]
fn enum_crosses_classes_by_constant_name() {
    let signal = signal();
    let hue = Class::enumeration("Hue", ["GREEN", "MAGENTA"]);
    let green = signal.enum_value("GREEN").unwrap();
    assert_eq!(
        convert(green, hue.clone()),
        Ok(hue.enum_value("GREEN").unwrap())
    );
}

// ============================================================================
// Null sources
// ============================================================================

#[rstest]
#[case(Class::Bool, Value::Bool(false))]
#[case(Class::Char, Value::Char('\0'))]
#[case(Class::I8, Value::I8(0))]
#[case(Class::I64, Value::I64(0))]
#[case(Class::F64, Value::F64(0.0))]
#[case(Class::Str, Value::Null)]
fn null_becomes_the_zero_of_value_scalars(#[case] target: Class, #[case] expected: Value) {
    assert_converts(Value::Null, target, expected);
}

#[test]
fn null_stays_null_for_structured_targets() {
    let signal = signal();
    assert_converts(Value::Null, signal, Value::Null);
    assert_converts(Value::Null, common::address(), Value::Null);
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn default_replaces_a_recoverable_failure() {
    let got = Converter::standard()
        .convert("nope")
        .default_value(17i64)
        .to(Class::I64);
    assert_eq!(got, Ok(Value::I64(17)));
}

#[test]
fn the_default_is_converted_to_the_target() {
    let got = Converter::standard()
        .convert("nope")
        .default_value("17")
        .to(Class::I64);
    assert_eq!(got, Ok(Value::I64(17)));
}

#[test]
fn default_is_ignored_on_success() {
    let got = Converter::standard()
        .convert("5")
        .default_value(17i64)
        .to(Class::I64);
    assert_eq!(got, Ok(Value::I64(5)));
}

#[test]
fn null_is_a_present_default() {
    // converts like any other default, so the scalar target takes its
    // zero value instead of erroring
    let got = Converter::standard()
        .convert("nope")
        .default_value(Value::Null)
        .to(Class::I64);
    assert_eq!(got, Ok(Value::I64(0)));
}

#[test]
fn default_replaces_an_invalid_code_point() {
    let got = Converter::standard()
        .convert(Value::I64(-1))
        .default_value('?')
        .to(Class::Char);
    assert_eq!(got, Ok(Value::Char('?')));
}

// ============================================================================
// Wildcards and variables
// ============================================================================

#[test]
fn upper_bounded_wildcards_convert_to_their_bound() {
    let target = TypeDesc::wildcard_extends(Class::I64);
    assert_eq!(convert(Value::str("17"), target), Ok(Value::I64(17)));
}

#[test]
fn lower_bounded_wildcards_are_rejected() {
    let target = TypeDesc::wildcard_super(Class::I64);
    assert_eq!(
        convert(Value::I64(1), target),
        Err(ConvertError::AmbiguousWildcard)
    );
}

#[test]
fn unresolved_variables_produce_null() {
    assert_converts(Value::I64(9), TypeDesc::var("T"), Value::Null);
}

// ============================================================================
// Properties
// ============================================================================

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Integer text always parses back to the same integer.
        #[test]
        fn i64_survives_a_text_round_trip(n in any::<i64>()) {
            let text = Value::str(n.to_string());
            prop_assert_eq!(convert(text, Class::I64), Ok(Value::I64(n)));
        }

        /// Width adjustment is total: any integer narrows without error.
        #[test]
        fn narrowing_never_fails(n in any::<i64>()) {
            prop_assert!(convert(Value::I64(n), Class::I8).is_ok());
        }

        /// Boolean coercion accepts any string at all.
        #[test]
        fn bool_from_string_is_total(s in ".*") {
            let expected = s.eq_ignore_ascii_case("true");
            prop_assert_eq!(
                convert(Value::str(s.as_str()), Class::Bool),
                Ok(Value::Bool(expected))
            );
        }

        /// Float display output parses back to the same float.
        #[test]
        fn f64_survives_a_text_round_trip(x in any::<f64>()) {
            let text = Value::str(x.to_string());
            prop_assert_eq!(convert(text, Class::F64), Ok(Value::F64(x)));
        }
    }
}
