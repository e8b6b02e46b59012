//! Materializing interface and annotation instances from map-like
//! sources.
//!
//! The produced instance keeps reading through to the source it was
//! materialized from: each method resolves its value on call, so a
//! property that cannot be resolved only fails when somebody asks for
//! it. Resolution order per call is the source entry, then the
//! declared default, then the single call argument. The result of
//! every hit is converted to the method's declared return type,
//! reified against the target's type arguments.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::class::Class;
use crate::error::ConvertError;
use crate::facade::{interface_key_mapping, MapLike};
use crate::types::{reify, TypeDesc};
use crate::value::{IfaceValue, PropertyFn, Value};

/// Conversion callback handed in by the engine, carrying the active
/// customization context.
pub(crate) type NestedConvert =
    Arc<dyn Fn(&Value, &TypeDesc) -> Result<Value, ConvertError> + Send + Sync>;

/// Build an instance of the interface `class` (with type arguments
/// `args`) over `source`.
pub(crate) fn materialize(
    class: &Class,
    args: &[TypeDesc],
    source: &MapLike,
    keys_ignore_case: bool,
    convert: NestedConvert,
) -> Value {
    let mut props: IndexMap<String, PropertyFn> = IndexMap::new();
    for (key, method) in interface_key_mapping(class) {
        let ret = reify(&method.ret, class, args);
        let source = source.clone();
        let convert = Arc::clone(&convert);
        let class_name = class.display_name();
        let default = method.default.clone();
        let prop: PropertyFn = Arc::new(move |arg| {
            match source.lookup(&key, keys_ignore_case)? {
                Some(found) if !found.is_null() => return convert(&found, &ret),
                _ => {}
            }
            if let Some(default) = &default {
                return convert(default, &ret);
            }
            if let Some(arg) = arg {
                return convert(arg, &ret);
            }
            Err(ConvertError::MissingProperty {
                class: class_name.clone(),
                property: key.clone(),
            })
        });
        props.insert(method.name, prop);
    }
    Value::Iface(IfaceValue::from_parts(class.clone(), props))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::map_like;
    use crate::views::MapRef;

    fn passthrough() -> NestedConvert {
        Arc::new(|v, _| Ok(v.clone()))
    }

    fn source_of(entries: Vec<(Value, Value)>) -> MapLike {
        let m = Value::Map(MapRef::owned_ordered(entries));
        map_like(&m, false).unwrap()
    }

    #[test]
    fn methods_read_through_to_the_source() {
        let cls = Class::interface("Config")
            .method("ping", Class::Str)
            .build();
        let src = source_of(vec![(Value::str("ping"), Value::str("pong"))]);
        let Value::Iface(proxy) = materialize(&cls, &[], &src, false, passthrough()) else {
            unreachable!()
        };
        assert_eq!(proxy.call("ping", None), Ok(Value::str("pong")));
    }

    #[test]
    fn call_argument_fills_a_missing_entry() {
        let cls = Class::interface("Config")
            .method("bar", Class::I64)
            .build();
        let src = source_of(vec![]);
        let Value::Iface(proxy) = materialize(&cls, &[], &src, false, passthrough()) else {
            unreachable!()
        };
        let arg = Value::str("999");
        assert_eq!(proxy.call("bar", Some(&arg)), Ok(Value::str("999")));
    }

    #[test]
    fn declared_default_beats_the_call_argument() {
        let cls = Class::annotation("Sized")
            .method_with_default("width", Class::I64, Value::I64(80))
            .method("height", Class::I64)
            .build();
        let src = source_of(vec![]);
        let Value::Iface(proxy) = materialize(&cls, &[], &src, false, passthrough()) else {
            unreachable!()
        };
        let arg = Value::I64(5);
        assert_eq!(proxy.call("width", Some(&arg)), Ok(Value::I64(80)));
        assert_eq!(proxy.call("width", None), Ok(Value::I64(80)));
        assert!(matches!(
            proxy.call("height", None),
            Err(ConvertError::MissingProperty { .. })
        ));
    }

    #[test]
    fn null_entries_count_as_missing() {
        let cls = Class::annotation("Sized")
            .method_with_default("width", Class::I64, Value::I64(80))
            .build();
        let src = source_of(vec![(Value::str("width"), Value::Null)]);
        let Value::Iface(proxy) = materialize(&cls, &[], &src, false, passthrough()) else {
            unreachable!()
        };
        assert_eq!(proxy.call("width", None), Ok(Value::I64(80)));
    }
}
