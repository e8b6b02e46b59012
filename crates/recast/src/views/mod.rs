//! Live collection and map views with copy-on-write detachment.
//!
//! A view starts in the *aliased* state: reads go through to the
//! backing value and convert each element on the way out, so changes in
//! the backing are visible through the view. The first mutating call
//! moves the view to the *owned* state by materializing a converted
//! copy; from then on the view is an independent collection. The
//! transition is one-way. Reads never trigger it, and `clear()` takes
//! the shortcut of owning an empty collection without copying first.
//!
//! Handles produced by plain (non-view) conversions start life directly
//! in the owned state.

mod list;
mod map;
mod set;

pub use list::{ListRef, SeqKind};
pub use map::MapRef;
pub use set::SetRef;

pub(crate) use map::MapBacking;

use std::sync::Arc;

use crate::error::ConvertError;
use crate::value::{ArrayValue, Value};

/// Per-element conversion applied on read-through and on the owning
/// copy.
pub(crate) type ElemFn = Arc<dyn Fn(&Value) -> Result<Value, ConvertError> + Send + Sync>;

/// An element whose lazy conversion fails reads as null rather than
/// poisoning the whole view.
pub(crate) fn convert_or_null(f: &ElemFn, v: &Value) -> Value {
    f(v).unwrap_or(Value::Null)
}

pub(crate) fn identity_elem() -> ElemFn {
    Arc::new(|v| Ok(v.clone()))
}

/// Sequence-shaped backings a list or set view can alias.
#[derive(Clone)]
pub(crate) enum Backing {
    Array(ArrayValue),
    List(ListRef),
    Set(SetRef),
}

impl Backing {
    pub(crate) fn len(&self) -> usize {
        match self {
            Backing::Array(a) => a.len(),
            Backing::List(l) => l.len(),
            Backing::Set(s) => s.len(),
        }
    }

    /// Current backing content, unconverted.
    pub(crate) fn snapshot(&self) -> Vec<Value> {
        match self {
            Backing::Array(a) => a.values(),
            Backing::List(l) => l.values(),
            Backing::Set(s) => s.values(),
        }
    }
}
