//! Bridging engine values to and from JSON.
//!
//! JSON objects come in as dictionaries, so a decoded document can be
//! fed straight into record, interface or map conversions:
//!
//! ```
//! use recast::{json_value, Class, Converter};
//!
//! let parsed: serde_json::Value = serde_json::from_str(r#"{"pong": "42"}"#)?;
//! let dto = Class::record("MyDto").field("pong", Class::I64).build();
//! let obj = Converter::standard()
//!     .convert(json_value::from_json(&parsed))
//!     .to(dto)?;
//! assert_eq!(obj.to_string(), "MyDto{pong=42}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde_json::{Map, Number};

use crate::facade::PropertyBag;
use crate::value::Value;

/// Decode a JSON tree into an engine value.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else {
                Value::F64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::str(s.as_str()),
        serde_json::Value::Array(items) => Value::list(items.iter().map(from_json).collect()),
        serde_json::Value::Object(fields) => {
            let entries = fields
                .iter()
                .map(|(k, v)| (k.as_str(), from_json(v)))
                .collect();
            Value::dict(entries)
        }
    }
}

/// Encode an engine value as a JSON tree. Enum constants encode as
/// their names, structured instances as objects keyed the same way the
/// map conversion keys them. Values with no JSON shape of their own
/// encode as their string form.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I8(v) => serde_json::Value::Number((*v as i64).into()),
        Value::I16(v) => serde_json::Value::Number((*v as i64).into()),
        Value::I32(v) => serde_json::Value::Number((*v as i64).into()),
        Value::I64(v) => serde_json::Value::Number((*v).into()),
        Value::F32(v) => float_json(*v as f64),
        Value::F64(v) => float_json(*v),
        Value::Char(c) => serde_json::Value::String(c.to_string()),
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Enum(e) => serde_json::Value::String(e.name().to_string()),
        Value::Array(a) => serde_json::Value::Array(a.values().iter().map(to_json).collect()),
        Value::List(l) => serde_json::Value::Array(l.values().iter().map(to_json).collect()),
        Value::Set(s) => serde_json::Value::Array(s.values().iter().map(to_json).collect()),
        Value::Map(m) => {
            let mut out = Map::new();
            for (k, v) in m.entries() {
                out.insert(k.to_string(), to_json(&v));
            }
            serde_json::Value::Object(out)
        }
        Value::Dict(d) => {
            let mut out = Map::new();
            for (k, v) in d.entries() {
                out.insert(k, to_json(&v));
            }
            serde_json::Value::Object(out)
        }
        Value::Object(o) => bag_json(&PropertyBag::from_object(o)),
        Value::Iface(i) => bag_json(&PropertyBag::from_iface(i)),
    }
}

fn bag_json(bag: &PropertyBag) -> serde_json::Value {
    let mut out = Map::new();
    for key in bag.keys() {
        let value = bag.get(key).unwrap_or(Value::Null);
        out.insert(key.clone(), to_json(&value));
    }
    serde_json::Value::Object(out)
}

fn float_json(f: f64) -> serde_json::Value {
    Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
