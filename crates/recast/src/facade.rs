//! Uniform reading facade over everything map-shaped.
//!
//! The engine never walks records, beans or interface instances
//! directly. Anything it needs to read entry-wise is first classified
//! into a [`MapLike`]: a real map, a dictionary, or a [`PropertyBag`]
//! derived from a structured instance. Bag keys are resolved once at
//! construction; values are fetched lazily on each read.

use std::sync::Arc;

use crate::class::Class;
use crate::error::ConvertError;
use crate::names;
use crate::value::{IfaceValue, ObjectValue, Value};
use crate::views::MapRef;

/// Key set plus lazy per-key value access.
#[derive(Clone)]
pub(crate) struct PropertyBag {
    keys: Arc<Vec<String>>,
    getter: Arc<dyn Fn(&str) -> Result<Value, ConvertError> + Send + Sync>,
}

impl PropertyBag {
    pub(crate) fn new(
        keys: Vec<String>,
        getter: impl Fn(&str) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        PropertyBag {
            keys: Arc::new(keys),
            getter: Arc::new(getter),
        }
    }

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn get(&self, key: &str) -> Result<Value, ConvertError> {
        (self.getter)(key)
    }

    /// Keys derived from a record's fields or a bean's properties, with
    /// the instance behind them.
    pub(crate) fn from_object(obj: &ObjectValue) -> PropertyBag {
        let class = obj.class().clone();
        let prefix = class.prefix();
        // key in map space -> declared member name
        let mut mapping: Vec<(String, String)> = Vec::new();
        if class.is_record() {
            for f in class.field_chain() {
                let key = names::prefixed(prefix.as_deref(), &names::unmangle(&f.name));
                mapping.push((key, f.name));
            }
        } else {
            for p in class.props() {
                if p.name == "properties" {
                    continue;
                }
                mapping.push((p.name.clone(), p.name));
            }
        }
        let keys = mapping.iter().map(|(k, _)| k.clone()).collect();
        let obj = obj.clone();
        PropertyBag::new(keys, move |key| {
            mapping
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, member)| obj.get(member))
                .ok_or_else(|| ConvertError::MissingProperty {
                    class: obj.class().display_name(),
                    property: key.to_string(),
                })
        })
    }

    /// Keys derived from an interface's methods. Marker annotations
    /// yield their derived key mapped to `true`; a missing method value
    /// falls back to the declared default before failing.
    pub(crate) fn from_iface(iface: &IfaceValue) -> PropertyBag {
        let class = iface.class().clone();
        if class.is_marker() {
            let key = marker_key(&class);
            return PropertyBag::new(vec![key], |_| Ok(Value::Bool(true)));
        }
        let mapping: Vec<_> = interface_key_mapping(&class)
            .into_iter()
            .filter(|(_, m)| m.name != "properties")
            .collect();
        let keys = mapping.iter().map(|(k, _)| k.clone()).collect();
        let iface = iface.clone();
        PropertyBag::new(keys, move |key| {
            let Some((_, method)) = mapping.iter().find(|(k, _)| k == key) else {
                return Err(ConvertError::MissingProperty {
                    class: iface.class().display_name(),
                    property: key.to_string(),
                });
            };
            let result = iface.call(&method.name, None);
            match (result, &method.default) {
                (Err(ConvertError::MissingProperty { .. }), Some(default)) => {
                    Ok(default.clone())
                }
                (result, _) => result,
            }
        })
    }
}

pub(crate) fn marker_key(class: &Class) -> String {
    let name = class
        .def()
        .map(|d| d.name().to_string())
        .unwrap_or_default();
    names::prefixed(class.prefix().as_deref(), &names::single_element_key(&name))
}

/// Map-space key for every method of an interface class, in
/// declaration order. The `value` element of a single-element
/// annotation maps to the key derived from the class name.
pub(crate) fn interface_key_mapping(class: &Class) -> Vec<(String, crate::class::MethodDef)> {
    let prefix = class.prefix();
    let single_key = class.single_element_key();
    class
        .methods()
        .into_iter()
        .map(|m| {
            let key = match (&single_key, m.name.as_str()) {
                (Some(single), "value") => names::prefixed(prefix.as_deref(), single),
                _ => names::prefixed(prefix.as_deref(), &names::unmangle(&m.name)),
            };
            (key, m)
        })
        .collect()
}

/// A value viewed entry-wise.
#[derive(Clone)]
pub(crate) enum MapLike {
    Map(MapRef),
    Dict(crate::value::DictValue),
    Bag(PropertyBag),
}

impl MapLike {
    pub(crate) fn len(&self) -> usize {
        match self {
            MapLike::Map(m) => m.len(),
            MapLike::Dict(d) => d.len(),
            MapLike::Bag(b) => b.len(),
        }
    }

    /// Entry snapshot. Fetching a bag value may fail, and that failure
    /// surfaces here, at copy time.
    pub(crate) fn entries(&self) -> Result<Vec<(Value, Value)>, ConvertError> {
        match self {
            MapLike::Map(m) => Ok(m.entries()),
            MapLike::Dict(d) => Ok(d
                .entries()
                .into_iter()
                .map(|(k, v)| (Value::str(k), v))
                .collect()),
            MapLike::Bag(b) => {
                let mut out = Vec::with_capacity(b.len());
                for key in b.keys() {
                    let value = b.get(key)?;
                    out.push((Value::str(key.as_str()), value));
                }
                Ok(out)
            }
        }
    }

    /// Find a value by string key. Exact match wins; the
    /// case-insensitive pass only runs when requested and only after
    /// every exact candidate missed.
    pub(crate) fn lookup(
        &self,
        key: &str,
        ignore_case: bool,
    ) -> Result<Option<Value>, ConvertError> {
        match self {
            MapLike::Map(m) => {
                let entries = m.entries();
                if let Some((_, v)) = entries.iter().find(|(k, _)| k.to_string() == key) {
                    return Ok(Some(v.clone()));
                }
                if ignore_case {
                    if let Some((_, v)) = entries
                        .iter()
                        .find(|(k, _)| k.to_string().eq_ignore_ascii_case(key))
                    {
                        return Ok(Some(v.clone()));
                    }
                }
                Ok(None)
            }
            MapLike::Dict(d) => {
                if let Some(v) = d.get(key) {
                    return Ok(Some(v));
                }
                if ignore_case {
                    for (k, v) in d.entries() {
                        if k.eq_ignore_ascii_case(key) {
                            return Ok(Some(v));
                        }
                    }
                }
                Ok(None)
            }
            MapLike::Bag(b) => {
                let mut found = b.keys().iter().find(|k| k.as_str() == key);
                if found.is_none() && ignore_case {
                    found = b.keys().iter().find(|k| k.eq_ignore_ascii_case(key));
                }
                match found {
                    Some(k) => b.get(k).map(Some),
                    None => Ok(None),
                }
            }
        }
    }
}

/// Classify a value for entry-wise reading.
///
/// Maps, dictionaries, records and interface instances qualify on
/// their own. Beans qualify only when the caller opted in. An
/// instance exposing a `properties` accessor that yields a dictionary
/// or map contributes that payload instead of its own members.
pub(crate) fn map_like(value: &Value, treat_bean: bool) -> Result<MapLike, ConvertError> {
    match value {
        Value::Map(m) => Ok(MapLike::Map(m.clone())),
        Value::Dict(d) => Ok(MapLike::Dict(d.clone())),
        Value::Object(o) if o.class().is_record() => Ok(MapLike::Bag(PropertyBag::from_object(o))),
        Value::Object(o) if o.class().is_bean() => {
            // A populated properties accessor stands on its own; plain
            // bean enumeration still needs the opt-in.
            if o.class().props().iter().any(|p| p.name == "properties") {
                if let Some(payload) = o.get("properties").and_then(as_map_payload) {
                    return Ok(payload);
                }
            }
            if !treat_bean {
                return Err(ConvertError::NotMapLike {
                    class: o.class().display_name(),
                });
            }
            Ok(MapLike::Bag(PropertyBag::from_object(o)))
        }
        Value::Iface(i) => {
            if i.class().methods().iter().any(|m| m.name == "properties") {
                if let Some(payload) = i.call("properties", None).ok().and_then(as_map_payload) {
                    return Ok(payload);
                }
            }
            Ok(MapLike::Bag(PropertyBag::from_iface(i)))
        }
        other => Err(ConvertError::NotMapLike {
            class: other.type_of().display_name(),
        }),
    }
}

fn as_map_payload(value: Value) -> Option<MapLike> {
    match value {
        Value::Map(m) => Some(MapLike::Map(m)),
        Value::Dict(d) => Some(MapLike::Dict(d)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDesc;

    #[test]
    fn record_bag_applies_prefix_and_unmangling() {
        let cls = Class::record("Config")
            .prefix("org.foo.")
            .field("sharp__harp", Class::Str)
            .field("za_za", Class::I64)
            .build();
        let obj = ObjectValue::new(&cls);
        obj.set("sharp__harp", Value::str("yes"));
        let bag = PropertyBag::from_object(&obj);
        assert_eq!(bag.keys(), ["org.foo.sharp_harp", "org.foo.za.za"]);
        assert_eq!(bag.get("org.foo.sharp_harp"), Ok(Value::str("yes")));
        assert_eq!(bag.get("org.foo.za.za"), Ok(Value::I64(0)));
    }

    #[test]
    fn beans_require_the_opt_in() {
        let cls = Class::bean("MyBean").property("getMe", Class::Str).build();
        let obj = Value::Object(ObjectValue::new(&cls));
        assert!(matches!(
            map_like(&obj, false),
            Err(ConvertError::NotMapLike { .. })
        ));
        assert!(map_like(&obj, true).is_ok());
    }

    #[test]
    fn bean_properties_payload_needs_no_opt_in() {
        let cls = Class::bean("Service")
            .property("getProperties", Class::Dict)
            .property("getName", Class::Str)
            .build();
        let obj = ObjectValue::new(&cls);
        obj.set(
            "properties",
            Value::dict(vec![("ws.echo", Value::Bool(true))]),
        );
        let like = map_like(&Value::Object(obj), false).unwrap();
        let entries = like.entries().unwrap();
        assert_eq!(entries, vec![(Value::str("ws.echo"), Value::Bool(true))]);
    }

    #[test]
    fn iface_bag_falls_back_to_declared_defaults() {
        let cls = Class::annotation("MyAnn")
            .method_with_default("width", Class::I64, Value::I64(80))
            .method("height", Class::I64)
            .build();
        let instance = IfaceValue::builder(cls)
            .supply("height", || Value::I64(virtual_height()))
            .build();
        let Value::Iface(i) = &instance else {
            unreachable!()
        };
        let bag = PropertyBag::from_iface(i);
        assert_eq!(bag.get("width"), Ok(Value::I64(80)));
        assert_eq!(bag.get("height"), Ok(Value::I64(15)));
    }

    fn virtual_height() -> i64 {
        15
    }

    #[test]
    fn marker_annotation_reads_as_its_derived_key() {
        let cls = Class::annotation("MarkerAnnotation").build();
        let instance = IfaceValue::builder(cls).build();
        let Value::Iface(i) = &instance else {
            unreachable!()
        };
        let bag = PropertyBag::from_iface(i);
        assert_eq!(bag.keys(), ["marker.annotation"]);
        assert_eq!(bag.get("marker.annotation"), Ok(Value::Bool(true)));
    }

    #[test]
    fn properties_accessor_payload_replaces_member_enumeration() {
        let cls = Class::interface("WithProps")
            .method("properties", Class::Dict)
            .method("other", Class::Str)
            .build();
        let payload = Value::dict(vec![("top", Value::str("classic"))]);
        let instance = IfaceValue::builder(cls)
            .supply("properties", move || payload.clone())
            .supply("other", || Value::str("not seen"))
            .build();
        let like = map_like(&instance, false).unwrap();
        let entries = like.entries().unwrap();
        assert_eq!(entries, vec![(Value::str("top"), Value::str("classic"))]);
    }

    #[test]
    fn lookup_prefers_exact_over_case_insensitive() {
        let m = MapLike::Map(MapRef::owned_ordered(vec![
            (Value::str("KEY"), Value::I64(1)),
            (Value::str("key"), Value::I64(2)),
        ]));
        assert_eq!(m.lookup("key", true), Ok(Some(Value::I64(2))));
        assert_eq!(m.lookup("KeY", true), Ok(Some(Value::I64(1))));
        assert_eq!(m.lookup("KeY", false), Ok(None));
    }

    #[test]
    fn single_element_annotation_key_substitution() {
        let cls = Class::annotation("SingleElementAnnotation")
            .method("value", TypeDesc::Class(Class::Str))
            .build();
        let instance = IfaceValue::builder(cls)
            .supply("value", || Value::str("hello"))
            .build();
        let Value::Iface(i) = &instance else {
            unreachable!()
        };
        let bag = PropertyBag::from_iface(i);
        assert_eq!(bag.keys(), ["single.element.annotation"]);
    }
}
