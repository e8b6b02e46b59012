//! Sequence-shaped conversions: arrays, lists, deques, sets, the
//! entry view of map-like sources, the singleton wrap for scalars, and
//! container-to-scalar reduction.

mod common;

use common::{assert_converts, convert, signal};
use pretty_assertions::assert_eq;
use recast::{Class, Converter, SeqKind, TypeDesc, Value};
use rstest::rstest;

fn strings(items: &[&str]) -> Value {
    Value::list(items.iter().map(|s| Value::str(*s)).collect())
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn array_elements_convert_to_the_component_class() {
    assert_converts(
        strings(&["1", "2"]),
        TypeDesc::array_of(Class::I64),
        Value::array(Class::I64, vec![Value::I64(1), Value::I64(2)]),
    );
}

#[test]
fn string_splits_into_a_char_array() {
    assert_converts(
        Value::str("hi"),
        TypeDesc::array_of(Class::Char),
        Value::array(Class::Char, vec![Value::Char('h'), Value::Char('i')]),
    );
}

#[test]
fn char_array_joins_back_into_a_string() {
    let chars = Value::array(Class::Char, vec![Value::Char('h'), Value::Char('i')]);
    assert_converts(chars, Class::Str, Value::str("hi"));
}

#[test]
fn array_conversion_failure_yields_null() {
    assert_converts(
        strings(&["1", "x"]),
        TypeDesc::array_of(Class::I64),
        Value::Null,
    );
}

#[test]
fn scalars_wrap_into_a_singleton_array() {
    assert_converts(
        Value::I64(7),
        TypeDesc::array_of(Class::Str),
        Value::array(Class::Str, vec![Value::str("7")]),
    );
}

#[test]
fn arrays_convert_between_component_classes() {
    let ints = Value::array(Class::I64, vec![Value::I64(1), Value::I64(2)]);
    assert_converts(
        ints,
        TypeDesc::array_of(Class::Str),
        Value::array(Class::Str, vec![Value::str("1"), Value::str("2")]),
    );
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn list_elements_convert_to_the_type_argument() {
    let target = TypeDesc::parameterized(Class::List, [Class::I64.into()]);
    assert_converts(
        strings(&["5", "7"]),
        target,
        Value::list(vec![Value::I64(5), Value::I64(7)]),
    );
}

#[test]
fn unparameterized_targets_keep_elements_as_they_are() {
    let mixed = Value::list(vec![Value::str("a"), Value::I64(1)]);
    assert_converts(mixed.clone(), Class::List, mixed);
}

#[test]
fn list_to_set_drops_duplicates() {
    let got = convert(
        Value::list(vec![Value::I64(1), Value::I64(1), Value::I64(2)]),
        Class::Set,
    )
    .unwrap();
    assert_eq!(got, Value::set(vec![Value::I64(1), Value::I64(2)]));
}

#[test]
fn sorted_sets_iterate_in_order() {
    let target = TypeDesc::parameterized(Class::SortedSet, [Class::I64.into()]);
    let got = convert(strings(&["3", "1", "2"]), target).unwrap();
    let Value::Set(set) = got else {
        panic!("expected a set, got {got:?}");
    };
    assert!(set.is_sorted());
    assert_eq!(
        set.values(),
        vec![Value::I64(1), Value::I64(2), Value::I64(3)]
    );
}

#[test]
fn list_to_deque() {
    let got = convert(strings(&["a", "b"]), Class::Deque).unwrap();
    let Value::List(deque) = &got else {
        panic!("expected a deque, got {got:?}");
    };
    assert_eq!(deque.kind(), SeqKind::Deque);
    assert_eq!(deque.pop_front(), Some(Value::str("a")));
}

#[test]
fn set_to_list_keeps_insertion_order() {
    let set = Value::set(vec![Value::I64(2), Value::I64(1)]);
    assert_converts(set, Class::List, Value::list(vec![Value::I64(2), Value::I64(1)]));
}

#[test]
fn map_entries_feed_sequence_elements() {
    let map = Value::map(vec![
        (Value::str("a"), Value::I64(1)),
        (Value::str("b"), Value::I64(2)),
    ]);
    // each entry reduces to its matching half
    assert_converts(
        map.clone(),
        TypeDesc::parameterized(Class::List, [Class::I64.into()]),
        Value::list(vec![Value::I64(1), Value::I64(2)]),
    );
    assert_converts(
        map,
        TypeDesc::array_of(Class::Str),
        Value::array(Class::Str, vec![Value::str("a"), Value::str("b")]),
    );
}

#[test]
fn untyped_sequences_keep_map_entries_whole() {
    let map = Value::map(vec![
        (Value::str("a"), Value::I64(1)),
        (Value::str("b"), Value::I64(2)),
    ]);
    let got = convert(map, Class::List).unwrap();
    assert_eq!(
        got,
        Value::list(vec![
            Value::map(vec![(Value::str("a"), Value::I64(1))]),
            Value::map(vec![(Value::str("b"), Value::I64(2))]),
        ])
    );
}

#[test]
fn nested_type_arguments_convert_recursively() {
    let target = TypeDesc::parameterized(
        Class::List,
        [TypeDesc::parameterized(Class::List, [Class::I64.into()])],
    );
    let source = Value::list(vec![strings(&["1", "2"]), strings(&["3"])]);
    assert_converts(
        source,
        target,
        Value::list(vec![
            Value::list(vec![Value::I64(1), Value::I64(2)]),
            Value::list(vec![Value::I64(3)]),
        ]),
    );
}

#[test]
fn recoverable_element_failures_keep_the_original_element() {
    let target = TypeDesc::parameterized(Class::List, [Class::I64.into()]);
    assert_converts(
        strings(&["1", "x"]),
        target,
        Value::list(vec![Value::I64(1), Value::str("x")]),
    );
}

#[test]
fn element_failure_with_a_default_replaces_the_whole_result() {
    let target = TypeDesc::parameterized(Class::List, [Class::I64.into()]);
    let got = Converter::standard()
        .convert(strings(&["1", "x"]))
        .default_value(Value::list(Vec::new()))
        .to(target);
    assert_eq!(got, Ok(Value::list(Vec::new())));
}

#[test]
fn member_failures_inside_elements_are_absorbed() {
    let target = TypeDesc::parameterized(
        Class::List,
        [TypeDesc::parameterized(
            Class::Map,
            [Class::Str.into(), Class::I64.into()],
        )],
    );
    let bad = Value::map(vec![(Value::str("a"), Value::str("x"))]);

    // without a default the element stays as it came in
    let kept = Converter::standard()
        .convert(Value::list(vec![bad.clone()]))
        .to(target.clone());
    assert_eq!(kept, Ok(Value::list(vec![bad.clone()])));

    let got = Converter::standard()
        .convert(Value::list(vec![bad]))
        .default_value(Value::list(Vec::new()))
        .to(target);
    assert_eq!(got, Ok(Value::list(Vec::new())));
}

#[test]
fn null_becomes_an_empty_sequence() {
    assert_converts(Value::Null, Class::List, Value::list(Vec::new()));
    assert_converts(Value::Null, Class::Set, Value::set(Vec::new()));
    assert_converts(
        Value::Null,
        TypeDesc::array_of(Class::I8),
        Value::array(Class::I8, Vec::new()),
    );
}

// ============================================================================
// Container-to-scalar reduction
// ============================================================================

#[test]
fn first_element_feeds_a_scalar_target() {
    assert_converts(strings(&["true", "false"]), Class::Bool, Value::Bool(true));
    assert_converts(strings(&["17", "99"]), Class::I32, Value::I32(17));
}

#[test]
fn first_element_can_be_an_enum_form() {
    let signal = signal();
    let got = convert(strings(&["amber"]), signal.clone()).unwrap();
    assert_eq!(got, signal.enum_value("AMBER").unwrap());
}

#[test]
fn empty_containers_behave_like_null_sources() {
    assert_converts(Value::list(Vec::new()), Class::I64, Value::I64(0));
    assert_converts(Value::list(Vec::new()), Class::Str, Value::Null);
    assert_converts(Value::dict(Vec::new()), Class::Bool, Value::Bool(false));
}

#[rstest]
#[case(vec![(Value::I32(5), Value::str("x"))], Class::I32, Value::I32(5))]
#[case(vec![(Value::str("k"), Value::I32(9))], Class::I32, Value::I32(9))]
#[case(vec![(Value::str("7"), Value::str("8"))], Class::I32, Value::I32(7))]
#[case(vec![(Value::Bool(true), Value::Bool(false))], Class::Str, Value::str("true"))]
fn map_entries_pick_the_best_half_for_scalars(
    #[case] entries: Vec<(Value, Value)>,
    #[case] target: Class,
    #[case] expected: Value,
) {
    assert_converts(Value::map(entries), target, expected);
}
