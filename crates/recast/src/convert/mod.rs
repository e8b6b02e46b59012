//! The converter facade: entry point, customization rules and error
//! handlers.
//!
//! A [`Converter`] is a cheap-to-clone, thread-safe handle over an
//! immutable rule list. [`Converter::standard`] carries no rules and
//! applies only the built-in dispatch; [`Converter::builder`] derives a
//! customized converter that consults user rules first and falls back
//! to the standard behavior.
//!
//! ```
//! use recast::{Converter, Value};
//!
//! let converter = Converter::standard();
//! let n = converter.convert("42").to(recast::Class::I64)?;
//! assert_eq!(n, Value::I64(42));
//! # Ok::<(), recast::ConvertError>(())
//! ```

mod converting;
mod engine;

pub use converting::Converting;
pub(crate) use converting::Modifiers;

use std::sync::Arc;

use crate::class::Class;
use crate::error::ConvertError;
use crate::typed::IntoValue;
use crate::types::TypeDesc;
use crate::value::Value;

/// What a rule or error handler did with a conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleResult {
    /// The rule produced the converted value.
    Handled(Value),
    /// Not this rule's pair; try the next one.
    CannotHandle,
}

/// Custom conversion function: sees the source value and the resolved
/// target descriptor.
pub type RuleFn =
    Arc<dyn Fn(&Value, &TypeDesc) -> Result<RuleResult, ConvertError> + Send + Sync>;

/// A customization rule, optionally gated on a source/target class
/// pair.
#[derive(Clone)]
pub struct Rule {
    source: Option<Class>,
    target: Option<Class>,
    apply: RuleFn,
}

impl Rule {
    /// Rule that only runs when the source value is an instance of
    /// `source` and the target's raw class is exactly `target`.
    pub fn between(
        source: Class,
        target: Class,
        f: impl Fn(&Value, &TypeDesc) -> Result<RuleResult, ConvertError> + Send + Sync + 'static,
    ) -> Rule {
        Rule {
            source: Some(source),
            target: Some(target),
            apply: Arc::new(f),
        }
    }

    /// Rule consulted for every conversion.
    pub fn any(
        f: impl Fn(&Value, &TypeDesc) -> Result<RuleResult, ConvertError> + Send + Sync + 'static,
    ) -> Rule {
        Rule {
            source: None,
            target: None,
            apply: Arc::new(f),
        }
    }

    fn matches(&self, value: &Value, target: &TypeDesc) -> bool {
        if let Some(source) = &self.source {
            if !source.is_assignable_from(&value.type_of()) {
                return false;
            }
        }
        if let Some(expected) = &self.target {
            if target.raw().as_ref() != Some(expected) {
                return false;
            }
        }
        true
    }

    pub(crate) fn try_apply(
        &self,
        value: &Value,
        target: &TypeDesc,
    ) -> Option<Result<RuleResult, ConvertError>> {
        if self.matches(value, target) {
            Some((self.apply)(value, target))
        } else {
            None
        }
    }
}

/// Conversion entry point.
#[derive(Clone, Default)]
pub struct Converter {
    rules: Arc<Vec<Rule>>,
    error_handlers: Arc<Vec<RuleFn>>,
}

impl Converter {
    /// Converter with the built-in behavior and no customization.
    pub fn standard() -> Converter {
        Converter::default()
    }

    /// Start a conversion of `value`.
    pub fn convert(&self, value: impl IntoValue) -> Converting {
        Converting::new(self.clone(), value.into_value())
    }

    /// Derive a customized converter seeded with this converter's
    /// rules.
    pub fn builder(&self) -> ConverterBuilder {
        ConverterBuilder {
            rules: (*self.rules).clone(),
            error_handlers: (*self.error_handlers).clone(),
        }
    }

    pub(crate) fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn error_handlers(&self) -> &[RuleFn] {
        &self.error_handlers
    }
}

/// Accumulates rules for a customized [`Converter`].
pub struct ConverterBuilder {
    rules: Vec<Rule>,
    error_handlers: Vec<RuleFn>,
}

impl ConverterBuilder {
    /// Append a rule. Rules are consulted in registration order.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append an error handler, consulted in registration order when a
    /// conversion fails. A handler may substitute a result or pass.
    pub fn error_handler(
        mut self,
        f: impl Fn(&Value, &TypeDesc) -> Result<RuleResult, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        self.error_handlers.push(Arc::new(f));
        self
    }

    pub fn build(self) -> Converter {
        Converter {
            rules: Arc::new(self.rules),
            error_handlers: Arc::new(self.error_handlers),
        }
    }
}
