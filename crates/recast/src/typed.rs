//! Bridging engine values into host types.
//!
//! [`FromValue`] names the engine target a host type corresponds to
//! and maps the converted value back out. It powers
//! [`Converting::to_typed`](crate::Converting::to_typed):
//!
//! ```
//! use recast::Converter;
//!
//! let numbers: Vec<i64> = Converter::standard()
//!     .convert(recast::Value::list(vec!["5".into(), "7".into()]))
//!     .to_typed()?;
//! assert_eq!(numbers, [5, 7]);
//! # Ok::<(), recast::ConvertError>(())
//! ```

use std::collections::HashMap;

use crate::class::Class;
use crate::error::ConvertError;
use crate::types::TypeDesc;
use crate::value::Value;

/// Host types that carry into the engine.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl<T: Into<Value>> IntoValue for T {
    fn into_value(self) -> Value {
        self.into()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::list(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(entries: HashMap<String, T>) -> Value {
        Value::map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::from(k), v.into()))
                .collect(),
        )
    }
}

/// Host types the engine can produce.
pub trait FromValue: Sized {
    /// Engine target to convert to before mapping out.
    fn type_desc() -> TypeDesc;

    fn from_value(value: &Value) -> Result<Self, ConvertError>;
}

fn mismatch(value: &Value, target: &str) -> ConvertError {
    ConvertError::CannotConvert {
        value: value.to_string(),
        target: target.to_string(),
    }
}

macro_rules! scalar_from_value {
    ($ty:ty, $class:expr, $variant:path) => {
        impl FromValue for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Class($class)
            }

            fn from_value(value: &Value) -> Result<Self, ConvertError> {
                match value {
                    $variant(v) => Ok(v.clone()),
                    other => Err(mismatch(other, stringify!($ty))),
                }
            }
        }
    };
}

scalar_from_value!(bool, Class::Bool, Value::Bool);
scalar_from_value!(char, Class::Char, Value::Char);
scalar_from_value!(i8, Class::I8, Value::I8);
scalar_from_value!(i16, Class::I16, Value::I16);
scalar_from_value!(i32, Class::I32, Value::I32);
scalar_from_value!(i64, Class::I64, Value::I64);
scalar_from_value!(f32, Class::F32, Value::F32);
scalar_from_value!(f64, Class::F64, Value::F64);

impl FromValue for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::Class(Class::Str)
    }

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(mismatch(other, "String")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::parameterized(Class::List, [T::type_desc()])
    }

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::List(l) => l.values().iter().map(T::from_value).collect(),
            other => Err(mismatch(other, "Vec")),
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::parameterized(Class::Map, [TypeDesc::Class(Class::Str), T::type_desc()])
    }

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        let Value::Map(m) = value else {
            return Err(mismatch(value, "HashMap"));
        };
        let mut out = HashMap::new();
        for (k, v) in m.entries() {
            let Value::Str(key) = &k else {
                return Err(mismatch(&k, "String"));
            };
            out.insert(key.to_string(), T::from_value(&v)?);
        }
        Ok(out)
    }
}
