//! Conversion failure taxonomy.
//!
//! Every failure the engine can produce is a [`ConvertError`]. The
//! distinction that matters operationally is [`ConvertError::is_recoverable`]:
//! recoverable errors are the ones a configured default value may stand
//! in for. Element position is more forgiving: a failed collection
//! element also absorbs missing-property and member failures. Error
//! handlers are consulted for every failure.

use thiserror::Error;

/// Error raised by [`Converting::to`](crate::Converting::to) and friends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The target type descriptor contained a lower-bounded wildcard.
    /// The requested type is ambiguous, so this is never defaulted.
    #[error("cannot convert to a lower-bounded wildcard target")]
    AmbiguousWildcard,

    /// No dispatch branch and no textual factory produced a result.
    #[error("cannot convert {value} to {target}")]
    CannotConvert { value: String, target: String },

    /// A numeric source indexed past the end of an enum's constant list.
    /// Hard failure: a configured default never stands in for it.
    #[error("no constant at index {index} in enum {class} ({count} constants)")]
    EnumIndexOutOfRange {
        class: String,
        index: i64,
        count: usize,
    },

    /// A member conversion failed while populating a map-like target.
    /// The configured default does not stand in for these.
    #[error("cannot convert member {key}: {error}")]
    MemberConversion {
        key: String,
        error: Box<ConvertError>,
    },

    /// An interface property had no backing value, no annotation default
    /// and no caller-supplied fallback.
    #[error("no value for property {property} of {class}")]
    MissingProperty { class: String, property: String },

    /// A map-like target was requested from a source that has no map view.
    #[error("{class} is not a map-like source")]
    NotMapLike { class: String },
}

impl ConvertError {
    /// Whether a configured default value may stand in for this failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConvertError::CannotConvert { .. })
    }

    /// Whether a failing collection element may absorb this failure
    /// instead of failing the whole conversion. Wider than
    /// [`ConvertError::is_recoverable`]: missing properties and member
    /// failures are rescued in element position.
    pub(crate) fn is_element_recoverable(&self) -> bool {
        matches!(
            self,
            ConvertError::CannotConvert { .. }
                | ConvertError::MemberConversion { .. }
                | ConvertError::MissingProperty { .. }
        )
    }
}
