//! Recast - Dynamic value conversion engine
//!
//! This library converts dynamically typed values between scalar,
//! container and structured shapes:
//! - Scalar coercions, including enums and textual forms
//! - Array, collection and map materialization with generic targets
//! - Record, bean and interface population from map-like sources
//! - Live views that stay aliased to their source until first mutation
//! - Customization through ordered rules and error handlers
//!
//! ```
//! use recast::{Class, Converter, Value};
//!
//! let converter = Converter::standard();
//! let dto = Class::record("MyDto")
//!     .field("ping", Class::Str)
//!     .field("pong", Class::I64)
//!     .build();
//! let source = Value::dict(vec![("ping", "lalala".into()), ("pong", "41".into())]);
//! let obj = converter.convert(source).to(dto)?;
//! assert_eq!(obj.to_string(), "MyDto{ping=lalala, pong=41}");
//! # Ok::<(), recast::ConvertError>(())
//! ```

/// Recast library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod class;
pub mod convert;
pub mod error;
pub mod json_value;
pub mod names;
pub mod typed;
pub mod types;
pub mod value;

mod facade;
mod proxy;
mod views;

// Re-export commonly used types
pub use class::{
    BeanBuilder, Class, ClassDef, ClassKind, DisplayFn, FieldDef, InterfaceBuilder, MethodDef,
    PropDef, RecordBuilder, StringFactory,
};
pub use convert::{Converter, ConverterBuilder, Converting, Rule, RuleFn, RuleResult};
pub use error::ConvertError;
pub use typed::{FromValue, IntoValue};
pub use types::{reify, TypeDesc};
pub use value::{
    ArrayValue, DictValue, EnumValue, IfaceBuilder, IfaceValue, ObjectValue, PropertyFn, Shared,
    Value,
};
pub use views::{ListRef, MapRef, SeqKind, SetRef};
