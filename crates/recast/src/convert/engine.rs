//! Type-directed dispatch: every conversion funnels through [`run`].
//!
//! The order of play for a single conversion: resolve the target
//! descriptor, consult customization rules, then walk the built-in
//! steps from the most specific target shape to the textual fallback.
//! Failures classified as recoverable fall back to the configured
//! default, itself converted to the target; error handlers get the
//! last word either way.

use std::sync::Arc;

use indexmap::IndexMap;

use super::{Converter, Modifiers, RuleResult};
use crate::class::Class;
use crate::error::ConvertError;
use crate::facade::{self, MapLike};
use crate::names;
use crate::proxy::{self, NestedConvert};
use crate::types::{reify, TypeDesc};
use crate::value::{DictValue, ObjectValue, Value};
use crate::views::{Backing, ElemFn, ListRef, MapBacking, MapRef, SeqKind, SetRef};

pub(crate) fn run(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    target: &TypeDesc,
) -> Result<Value, ConvertError> {
    let resolved = target.resolve_wildcard()?;
    let attempt = (|| {
        for rule in cv.rules() {
            if let Some(result) = rule.try_apply(value, resolved) {
                match result? {
                    RuleResult::Handled(v) => return Ok(v),
                    RuleResult::CannotHandle => {}
                }
            }
        }
        standard(cv, mods, value, resolved)
    })();
    match attempt {
        Ok(v) => Ok(v),
        Err(err) => {
            if err.is_recoverable() {
                if let Some(default) = &mods.default_value {
                    return run(cv, &mods.for_default(), default, target);
                }
            }
            for handler in cv.error_handlers() {
                match handler(value, resolved)? {
                    RuleResult::Handled(v) => return Ok(v),
                    RuleResult::CannotHandle => {}
                }
            }
            Err(err)
        }
    }
}

fn standard(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    target: &TypeDesc,
) -> Result<Value, ConvertError> {
    if let TypeDesc::Var(_) = target {
        return Ok(Value::Null);
    }
    // A target-as override redirects the raw class; the descriptor's
    // type arguments still apply.
    let (raw, args) = match &mods.target_as {
        Some(class) => (class.clone(), target.args()),
        None => match target.raw() {
            Some(raw) => (raw, target.args()),
            None => return Ok(Value::Null),
        },
    };

    if value.is_null() {
        if let Some(default) = &mods.default_value {
            return run(cv, &mods.for_default(), default, target);
        }
        return Ok(null_value(&raw));
    }

    let source_class = mods.source_as.clone().unwrap_or_else(|| value.type_of());

    if !raw.is_copy_required() && raw.is_assignable_from(&source_class) {
        return Ok(value.clone());
    }

    if !is_container_value(value) {
        if let Some(result) = try_special(value, &raw)? {
            return Ok(result);
        }
    }

    if let Some(result) = try_marker(cv, mods, value, &raw, args, target)? {
        return Ok(result);
    }

    if let Class::Array(elem) = &raw {
        return to_array(cv, mods, value, elem, target);
    }
    if matches!(
        raw,
        Class::List | Class::Deque | Class::Set | Class::SortedSet
    ) {
        return to_collection(cv, mods, value, &raw, target);
    }

    if let Value::Str(s) = value {
        if let Some(factory) = raw.def().and_then(|d| d.string_factory()) {
            return match factory(s.as_ref()) {
                Some(v) => Ok(v),
                None => Err(cannot(value, &raw)),
            };
        }
    }

    if is_map_like_target(&raw, mods) {
        return to_map_like(cv, mods, value, &raw, args);
    }

    if is_container_value(value) {
        return reduce_to_scalar(cv, mods, value, &raw, target);
    }

    if raw == Class::Str {
        return Ok(Value::str(value.to_string()));
    }

    Err(cannot(value, &raw))
}

/// What a null source becomes: zero for value-like scalars, an empty
/// container for sequence targets, null for everything else.
fn null_value(raw: &Class) -> Value {
    match raw {
        Class::Array(elem) => Value::array((**elem).clone(), Vec::new()),
        Class::List => Value::list(Vec::new()),
        Class::Deque => Value::deque(Vec::new()),
        Class::Set => Value::set(Vec::new()),
        Class::SortedSet => Value::sorted_set(Vec::new()),
        other => other.zero_value(),
    }
}

fn is_container_value(value: &Value) -> bool {
    matches!(
        value,
        Value::Array(_) | Value::List(_) | Value::Set(_) | Value::Map(_) | Value::Dict(_)
    )
}

fn cannot(value: &Value, raw: &Class) -> ConvertError {
    ConvertError::CannotConvert {
        value: value.to_string(),
        target: raw.display_name(),
    }
}

fn member_failed(key: impl Into<String>, error: ConvertError) -> ConvertError {
    ConvertError::MemberConversion {
        key: key.into(),
        error: Box::new(error),
    }
}

/// Scalar cross-coercions. `None` means the pair is not special-cased
/// and dispatch continues.
/// Marker annotations travel through their single-entry map form. A
/// marker source substitutes `{derived-key: true}` and converts that
/// instead; a marker target demands that entry in the source's map
/// rendering and materializes an empty proxy.
fn try_marker(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    raw: &Class,
    args: &[TypeDesc],
    target: &TypeDesc,
) -> Result<Option<Value>, ConvertError> {
    if let Value::Iface(i) = value {
        if i.class().is_marker() {
            let synthetic = Value::map(vec![(
                Value::str(facade::marker_key(i.class())),
                Value::Bool(true),
            )]);
            let inner = Modifiers {
                target_as: mods.target_as.clone(),
                ..Modifiers::default()
            };
            return run(cv, &inner, &synthetic, target).map(Some);
        }
    }
    if raw.is_marker() {
        let rep_desc = TypeDesc::parameterized(
            Class::Map,
            [TypeDesc::Class(Class::Str), TypeDesc::Class(Class::Bool)],
        );
        let rep = standard(
            &Converter::default(),
            &Modifiers::default(),
            value,
            &rep_desc,
        )?;
        let wanted = Value::str(facade::marker_key(raw));
        let present = match &rep {
            Value::Map(m) => m
                .entries()
                .into_iter()
                .any(|(k, v)| k == wanted && v == Value::Bool(true)),
            _ => false,
        };
        if !present {
            return Err(cannot(value, raw));
        }
        let empty = MapLike::Map(MapRef::owned_ordered(Vec::new()));
        return Ok(Some(proxy::materialize(
            raw,
            args,
            &empty,
            mods.keys_ignore_case,
            nested_fn(cv, mods),
        )));
    }
    Ok(None)
}

fn try_special(value: &Value, raw: &Class) -> Result<Option<Value>, ConvertError> {
    match raw {
        Class::Bool => Ok(special_bool(value)),
        Class::Char => special_char(value),
        c if c.is_numeric() => special_number(value, c),
        c if c.is_enum() => special_enum(value, c).map(Some),
        _ => Ok(None),
    }
}

fn special_bool(value: &Value) -> Option<Value> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::Char(c) => *c != '\0',
        Value::Str(s) => s.eq_ignore_ascii_case("true"),
        _ => match num_of(value)? {
            Num::Int(i) => i != 0,
            Num::Float(f) => f != 0.0,
        },
    };
    Some(Value::Bool(b))
}

fn special_char(value: &Value) -> Result<Option<Value>, ConvertError> {
    match value {
        Value::Bool(b) => Ok(Some(Value::Char(if *b { '\u{1}' } else { '\0' }))),
        Value::Str(s) => match s.chars().next() {
            Some(c) => Ok(Some(Value::Char(c))),
            None => Err(cannot(value, &Class::Char)),
        },
        _ => match num_of(value) {
            Some(n) => {
                let i = n.as_i64();
                let c = u32::try_from(i).ok().and_then(char::from_u32);
                match c {
                    Some(c) => Ok(Some(Value::Char(c))),
                    None => Err(cannot(value, &Class::Char)),
                }
            }
            None => Ok(None),
        },
    }
}

fn special_number(value: &Value, raw: &Class) -> Result<Option<Value>, ConvertError> {
    match value {
        Value::Bool(b) => Ok(cast(raw, Num::Int(*b as i64))),
        Value::Char(c) => Ok(cast(raw, Num::Int(*c as i64))),
        Value::Enum(e) => Ok(cast(raw, Num::Int(e.ordinal() as i64))),
        Value::Str(s) => {
            let parsed = match raw {
                Class::F32 | Class::F64 => s.parse::<f64>().ok().map(Num::Float),
                _ => s.parse::<i64>().ok().map(Num::Int),
            };
            match parsed {
                Some(n) => Ok(cast(raw, n)),
                None => Err(cannot(value, raw)),
            }
        }
        _ => Ok(num_of(value).and_then(|n| cast(raw, n))),
    }
}

fn special_enum(value: &Value, class: &Class) -> Result<Value, ConvertError> {
    if let Some(n) = num_of(value) {
        let index = n.as_i64();
        let count = class.enum_constants().len();
        if index < 0 || index as usize >= count {
            return Err(ConvertError::EnumIndexOutOfRange {
                class: class.display_name(),
                index,
                count,
            });
        }
        return class
            .enum_value_at(index as usize)
            .ok_or_else(|| cannot(value, class));
    }
    let form = value.to_string();
    if let Some(v) = class.enum_value(&form) {
        return Ok(v);
    }
    let constants = class.enum_constants();
    if let Some(i) = constants.iter().position(|c| c.eq_ignore_ascii_case(&form)) {
        return class.enum_value_at(i).ok_or_else(|| cannot(value, class));
    }
    Err(cannot(value, class))
}

enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_i64(&self) -> i64 {
        match self {
            Num::Int(i) => *i,
            Num::Float(f) => *f as i64,
        }
    }
}

fn num_of(value: &Value) -> Option<Num> {
    match value {
        Value::I8(v) => Some(Num::Int(*v as i64)),
        Value::I16(v) => Some(Num::Int(*v as i64)),
        Value::I32(v) => Some(Num::Int(*v as i64)),
        Value::I64(v) => Some(Num::Int(*v)),
        Value::F32(v) => Some(Num::Float(*v as f64)),
        Value::F64(v) => Some(Num::Float(*v)),
        _ => None,
    }
}

/// Width adjustment truncates, never rounds or fails.
fn cast(raw: &Class, n: Num) -> Option<Value> {
    let v = match (raw, n) {
        (Class::I8, Num::Int(i)) => Value::I8(i as i8),
        (Class::I16, Num::Int(i)) => Value::I16(i as i16),
        (Class::I32, Num::Int(i)) => Value::I32(i as i32),
        (Class::I64, Num::Int(i)) => Value::I64(i),
        (Class::F32, Num::Int(i)) => Value::F32(i as f32),
        (Class::F64, Num::Int(i)) => Value::F64(i as f64),
        (Class::I8, Num::Float(f)) => Value::I8(f as i8),
        (Class::I16, Num::Float(f)) => Value::I16(f as i16),
        (Class::I32, Num::Float(f)) => Value::I32(f as i32),
        (Class::I64, Num::Float(f)) => Value::I64(f as i64),
        (Class::F32, Num::Float(f)) => Value::F32(f as f32),
        (Class::F64, Num::Float(f)) => Value::F64(f),
        _ => return None,
    };
    Some(v)
}

fn elem_fn(cv: &Converter, mods: &Modifiers, target: &TypeDesc) -> ElemFn {
    let cv = cv.clone();
    let mods = mods.nested();
    let target = target.clone();
    Arc::new(move |v| run(&cv, &mods, v, &target))
}

fn nested_fn(cv: &Converter, mods: &Modifiers) -> NestedConvert {
    let cv = cv.clone();
    let mods = mods.nested();
    Arc::new(move |v, t| run(&cv, &mods, v, t))
}

/// Elements a sequence-shaped conversion reads. Non-iterable sources
/// contribute themselves as a single element.
/// The element view of a source. Sequences iterate as themselves and a
/// map-like source contributes one single-entry map per entry; anything
/// else stands as its own single element.
fn source_items(value: &Value, treat_bean: bool) -> Result<Vec<Value>, ConvertError> {
    match value {
        Value::Array(a) => Ok(a.values()),
        Value::List(l) => Ok(l.values()),
        Value::Set(s) => Ok(s.values()),
        Value::Map(_) | Value::Dict(_) | Value::Object(_) | Value::Iface(_) => {
            match facade::map_like(value, treat_bean) {
                Ok(like) => Ok(like
                    .entries()?
                    .into_iter()
                    .map(|(k, v)| Value::map(vec![(k, v)]))
                    .collect()),
                Err(_) => Ok(vec![value.clone()]),
            }
        }
        other => Ok(vec![other.clone()]),
    }
}

fn seq_backing(value: &Value) -> Option<Backing> {
    match value {
        Value::Array(a) => Some(Backing::Array(a.clone())),
        Value::List(l) => Some(Backing::List(l.clone())),
        Value::Set(s) => Some(Backing::Set(s.clone())),
        _ => None,
    }
}

fn to_array(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    elem: &Class,
    target: &TypeDesc,
) -> Result<Value, ConvertError> {
    if let (Value::Str(s), Class::Char) = (value, elem) {
        let items = s.chars().map(Value::Char).collect();
        return Ok(Value::array(elem.clone(), items));
    }
    let elem_desc = target
        .component()
        .unwrap_or_else(|| TypeDesc::Class(elem.clone()));
    let items = source_items(value, mods.source_as_bean)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match run(cv, &mods.nested(), &item, &elem_desc) {
            Ok(v) => out.push(v),
            Err(_) => return Ok(Value::Null),
        }
    }
    Ok(Value::array(elem.clone(), out))
}

fn to_collection(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    raw: &Class,
    target: &TypeDesc,
) -> Result<Value, ConvertError> {
    let elem_desc = target
        .args()
        .first()
        .cloned()
        .unwrap_or(TypeDesc::Class(Class::Any));
    if mods.live_view {
        if let Some(backing) = seq_backing(value) {
            let f = elem_fn(cv, mods, &elem_desc);
            match raw {
                Class::List => return Ok(Value::List(ListRef::view(SeqKind::List, backing, f))),
                Class::Set => return Ok(Value::Set(SetRef::view(backing, f))),
                _ => {}
            }
        }
    }
    let mut out = Vec::new();
    for item in source_items(value, mods.source_as_bean)? {
        match run(cv, &mods.nested(), &item, &elem_desc) {
            Ok(v) => out.push(v),
            Err(e) if e.is_element_recoverable() => match &mods.default_value {
                Some(default) => return run(cv, &mods.for_default(), default, target),
                None => out.push(item),
            },
            Err(e) => return Err(e),
        }
    }
    Ok(match raw {
        Class::Deque => Value::deque(out),
        Class::Set => Value::set(out),
        Class::SortedSet => Value::sorted_set(out),
        _ => Value::list(out),
    })
}

fn is_map_like_target(raw: &Class, mods: &Modifiers) -> bool {
    match raw {
        Class::Map | Class::SortedMap | Class::Dict => true,
        Class::Defined(_) => {
            raw.is_record()
                || raw.is_interface()
                || (raw.is_bean() && (mods.target_as_bean || mods.target_as_record))
        }
        _ => false,
    }
}

fn map_backing(like: &MapLike) -> MapBacking {
    match like {
        MapLike::Map(m) => MapBacking::Map(m.clone()),
        MapLike::Dict(d) => MapBacking::Dict(d.clone()),
        MapLike::Bag(b) => MapBacking::Bag(b.clone()),
    }
}

fn to_map_like(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    raw: &Class,
    args: &[TypeDesc],
) -> Result<Value, ConvertError> {
    let like = facade::map_like(value, mods.source_as_bean)?;
    match raw {
        Class::Map | Class::SortedMap => {
            let key_desc = args
                .first()
                .cloned()
                .unwrap_or(TypeDesc::Class(Class::Any));
            let val_desc = args
                .get(1)
                .cloned()
                .unwrap_or(TypeDesc::Class(Class::Any));
            if mods.live_view && *raw == Class::Map {
                return Ok(Value::Map(MapRef::view(
                    map_backing(&like),
                    elem_fn(cv, mods, &key_desc),
                    elem_fn(cv, mods, &val_desc),
                )));
            }
            let mut entries = Vec::new();
            for (k, v) in like.entries()? {
                let key = run(cv, &mods.nested(), &k, &key_desc)
                    .map_err(|e| member_failed(k.to_string(), e))?;
                let val = run(cv, &mods.nested(), &v, &val_desc)
                    .map_err(|e| member_failed(k.to_string(), e))?;
                entries.push((key, val));
            }
            Ok(if *raw == Class::SortedMap {
                Value::sorted_map(entries)
            } else {
                Value::map(entries)
            })
        }
        Class::Dict => {
            let mut out = IndexMap::new();
            for (k, v) in like.entries()? {
                let key = run(cv, &mods.nested(), &k, &TypeDesc::Class(Class::Str))
                    .map_err(|e| member_failed(k.to_string(), e))?;
                out.insert(key.to_string(), v);
            }
            Ok(Value::Dict(DictValue::new(out)))
        }
        class if class.is_interface() => Ok(proxy::materialize(
            class,
            args,
            &like,
            mods.keys_ignore_case,
            nested_fn(cv, mods),
        )),
        class => populate_object(cv, mods, class, args, &like),
    }
}

/// Fill a record or bean instance from entries. Members with no
/// matching key keep their zero value.
fn populate_object(
    cv: &Converter,
    mods: &Modifiers,
    class: &Class,
    args: &[TypeDesc],
    like: &MapLike,
) -> Result<Value, ConvertError> {
    let obj = ObjectValue::new(class);
    let prefix = class.prefix();
    let mut members: Vec<(String, String, TypeDesc)> = Vec::new();
    for f in class.field_chain() {
        let key = names::prefixed(prefix.as_deref(), &names::unmangle(&f.name));
        members.push((key, f.name, f.ty));
    }
    for p in class.props() {
        members.push((p.name.clone(), p.name, p.ty));
    }
    for (key, member, ty) in members {
        if let Some(found) = like.lookup(&key, mods.keys_ignore_case)? {
            let reified = reify(&ty, class, args);
            let converted = run(cv, &mods.nested(), &found, &reified)
                .map_err(|e| member_failed(key, e))?;
            obj.set(member, converted);
        }
    }
    Ok(Value::Object(obj))
}

/// Container sources reduce to their first element (or first entry)
/// when the target is scalar-shaped; an empty container behaves like a
/// null source.
fn reduce_to_scalar(
    cv: &Converter,
    mods: &Modifiers,
    value: &Value,
    raw: &Class,
    target: &TypeDesc,
) -> Result<Value, ConvertError> {
    if let (Value::Array(a), Class::Str) = (value, raw) {
        if *a.elem() == Class::Char {
            let s: String = a
                .values()
                .iter()
                .filter_map(|v| match v {
                    Value::Char(c) => Some(*c),
                    _ => None,
                })
                .collect();
            return Ok(Value::str(s));
        }
    }
    match value {
        Value::Array(_) | Value::List(_) | Value::Set(_) => {
            match source_items(value, mods.source_as_bean)?.into_iter().next() {
                Some(first) => standard(cv, mods, &first, target),
                None => Ok(null_value(raw)),
            }
        }
        Value::Map(_) | Value::Dict(_) => {
            let like = facade::map_like(value, mods.source_as_bean)?;
            match like.entries()?.into_iter().next() {
                Some((k, v)) => entry_to_scalar(cv, mods, &k, &v, raw, target),
                None => Ok(null_value(raw)),
            }
        }
        _ => Err(cannot(value, raw)),
    }
}

/// Which half of a map entry feeds a scalar conversion: the exact-class
/// half first, then the assignable half, then whichever half is a
/// string, then the stringified key.
fn entry_to_scalar(
    cv: &Converter,
    mods: &Modifiers,
    key: &Value,
    val: &Value,
    raw: &Class,
    target: &TypeDesc,
) -> Result<Value, ConvertError> {
    if key.type_of() == *raw {
        return Ok(key.clone());
    }
    if val.type_of() == *raw {
        return Ok(val.clone());
    }
    if raw.is_assignable_from(&key.type_of()) {
        return Ok(key.clone());
    }
    if raw.is_assignable_from(&val.type_of()) {
        return Ok(val.clone());
    }
    if matches!(key, Value::Str(_)) {
        return standard(cv, mods, key, target);
    }
    if matches!(val, Value::Str(_)) {
        return standard(cv, mods, val, target);
    }
    let stringified = Value::str(key.to_string());
    standard(cv, mods, &stringified, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Converter;

    fn to(value: Value, target: impl Into<TypeDesc>) -> Result<Value, ConvertError> {
        Converter::standard().convert(value).to(target)
    }

    #[test]
    fn narrowing_truncates() {
        assert_eq!(to(Value::I64(300), Class::I8), Ok(Value::I8(44)));
        assert_eq!(to(Value::F64(3.9), Class::I32), Ok(Value::I32(3)));
    }

    #[test]
    fn null_scalars_and_sequences() {
        assert_eq!(to(Value::Null, Class::I32), Ok(Value::I32(0)));
        assert_eq!(to(Value::Null, Class::Str), Ok(Value::Null));
        assert_eq!(to(Value::Null, Class::List), Ok(Value::list(vec![])));
    }

    #[test]
    fn lower_bounded_wildcards_are_rejected() {
        let target = TypeDesc::wildcard_super(Class::I64);
        assert_eq!(
            to(Value::I64(1), target),
            Err(ConvertError::AmbiguousWildcard)
        );
    }

    #[test]
    fn enum_from_ordinal_and_name() {
        let count = Class::enumeration("Count", ["ONE", "TWO", "THREE"]);
        assert_eq!(
            to(Value::I32(1), count.clone()),
            Ok(count.enum_value_at(1).unwrap())
        );
        assert_eq!(
            to(Value::str("two"), count.clone()),
            Ok(count.enum_value_at(1).unwrap())
        );
        assert!(matches!(
            to(Value::I32(7), count),
            Err(ConvertError::EnumIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn singleton_rule_wraps_scalars() {
        let target = TypeDesc::parameterized(Class::List, [TypeDesc::Class(Class::I64)]);
        assert_eq!(
            to(Value::I32(7), target),
            Ok(Value::list(vec![Value::I64(7)]))
        );
    }

    #[test]
    fn first_element_feeds_scalar_targets() {
        let l = Value::list(vec![Value::str("17"), Value::str("99")]);
        assert_eq!(to(l, Class::I32), Ok(Value::I32(17)));
        assert_eq!(to(Value::list(vec![]), Class::I32), Ok(Value::I32(0)));
    }
}
