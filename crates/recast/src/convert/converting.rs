//! One in-flight conversion and its customization switches.

use super::{engine, Converter};
use crate::class::Class;
use crate::error::ConvertError;
use crate::typed::FromValue;
use crate::types::TypeDesc;
use crate::value::Value;

/// Customization switches accompanying one conversion.
#[derive(Clone, Default)]
pub(crate) struct Modifiers {
    pub source_as: Option<Class>,
    pub source_as_record: bool,
    pub source_as_bean: bool,
    pub target_as: Option<Class>,
    pub target_as_record: bool,
    pub target_as_bean: bool,
    /// `Some(Value::Null)` is a present null default.
    pub default_value: Option<Value>,
    pub live_view: bool,
    pub keys_ignore_case: bool,
}

impl Modifiers {
    /// Switches inherited by element and member conversions: key
    /// matching and source treatment carry over, the default value and
    /// target shaping do not.
    pub(crate) fn nested(&self) -> Modifiers {
        Modifiers {
            keys_ignore_case: self.keys_ignore_case,
            source_as_record: self.source_as_record,
            source_as_bean: self.source_as_bean,
            ..Modifiers::default()
        }
    }

    /// Switches that apply when the configured default itself is
    /// converted: the as-annotations carry over, the default value does
    /// not, so the fallback conversion cannot recurse.
    pub(crate) fn for_default(&self) -> Modifiers {
        Modifiers {
            source_as: self.source_as.clone(),
            source_as_record: self.source_as_record,
            source_as_bean: self.source_as_bean,
            target_as: self.target_as.clone(),
            target_as_record: self.target_as_record,
            target_as_bean: self.target_as_bean,
            ..Modifiers::default()
        }
    }
}

/// A conversion in progress. Obtained from [`Converter::convert`],
/// consumed by [`Converting::to`].
pub struct Converting {
    converter: Converter,
    value: Value,
    mods: Modifiers,
}

impl Converting {
    pub(crate) fn new(converter: Converter, value: Value) -> Converting {
        Converting {
            converter,
            value,
            mods: Modifiers::default(),
        }
    }

    /// Fallback for recoverable failures and null sources. The fallback
    /// is itself converted to the target type.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.mods.default_value = Some(value.into());
        self
    }

    /// Match string keys case-insensitively when populating records,
    /// beans and interfaces. Exact matches still win.
    pub fn keys_ignore_case(mut self) -> Self {
        self.mods.keys_ignore_case = true;
        self
    }

    /// Treat the source as an instance of `class`.
    pub fn source_as(mut self, class: Class) -> Self {
        self.mods.source_as = Some(class);
        self
    }

    /// Treat the source's declared members as record fields.
    pub fn source_as_record(mut self) -> Self {
        self.mods.source_as_record = true;
        self
    }

    /// Opt in to reading the source as a bean.
    pub fn source_as_bean(mut self) -> Self {
        self.mods.source_as_bean = true;
        self
    }

    /// Dispatch on `class` instead of the declared target class.
    pub fn target_as(mut self, class: Class) -> Self {
        self.mods.target_as = Some(class);
        self
    }

    /// Populate the target's declared members as record fields.
    pub fn target_as_record(mut self) -> Self {
        self.mods.target_as_record = true;
        self
    }

    /// Opt in to populating the target as a bean.
    pub fn target_as_bean(mut self) -> Self {
        self.mods.target_as_bean = true;
        self
    }

    /// Produce a live view over the source instead of a detached copy,
    /// when the target is the plain list, set or map interface. The
    /// view stays aliased to the source until its first mutation.
    pub fn view(mut self) -> Self {
        self.mods.live_view = true;
        self
    }

    /// Run the conversion.
    pub fn to(self, target: impl Into<TypeDesc>) -> Result<Value, ConvertError> {
        engine::run(&self.converter, &self.mods, &self.value, &target.into())
    }

    /// Run the conversion and map the result into a host type.
    pub fn to_typed<T: FromValue>(self) -> Result<T, ConvertError> {
        let value = self.to(T::type_desc())?;
        T::from_value(&value)
    }
}
