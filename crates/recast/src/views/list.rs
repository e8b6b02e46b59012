//! Sequence handle: vector-backed list or deque, owned or aliased.

use super::{convert_or_null, Backing, ElemFn};
use crate::value::{Shared, Value};

/// Flavor of a sequence handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqKind {
    List,
    Deque,
}

enum ListInner {
    Owned(Vec<Value>),
    View(ViewState),
}

struct ViewState {
    backing: Backing,
    convert: ElemFn,
}

impl ViewState {
    fn values(&self) -> Vec<Value> {
        self.backing
            .snapshot()
            .iter()
            .map(|v| convert_or_null(&self.convert, v))
            .collect()
    }
}

/// Shared handle to a sequence. Clones alias the same sequence.
#[derive(Clone)]
pub struct ListRef {
    kind: SeqKind,
    inner: Shared<ListInner>,
}

impl ListRef {
    pub fn owned(kind: SeqKind, items: Vec<Value>) -> Self {
        ListRef {
            kind,
            inner: Shared::new(ListInner::Owned(items)),
        }
    }

    pub(crate) fn view(kind: SeqKind, backing: Backing, convert: ElemFn) -> Self {
        ListRef {
            kind,
            inner: Shared::new(ListInner::View(ViewState { backing, convert })),
        }
    }

    pub fn kind(&self) -> SeqKind {
        self.kind
    }

    /// Still reading through to a backing value.
    pub fn is_aliased(&self) -> bool {
        self.inner.with(|i| matches!(i, ListInner::View(_)))
    }

    pub fn len(&self) -> usize {
        self.inner.with(|i| match i {
            ListInner::Owned(items) => items.len(),
            ListInner::View(state) => state.backing.len(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.with(|i| match i {
            ListInner::Owned(items) => items.get(index).cloned(),
            ListInner::View(state) => state
                .backing
                .snapshot()
                .get(index)
                .map(|v| convert_or_null(&state.convert, v)),
        })
    }

    /// Current content. Aliased handles re-derive from the backing on
    /// every call.
    pub fn values(&self) -> Vec<Value> {
        self.inner.with(|i| match i {
            ListInner::Owned(items) => items.clone(),
            ListInner::View(state) => state.values(),
        })
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values().contains(value)
    }

    pub fn content_eq(&self, other: &ListRef) -> bool {
        self.inner.ptr_eq(&other.inner) || self.values() == other.values()
    }

    fn with_owned<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        self.inner.with_mut(|inner| {
            let mut items = match std::mem::replace(inner, ListInner::Owned(Vec::new())) {
                ListInner::Owned(items) => items,
                ListInner::View(state) => state.values(),
            };
            let out = f(&mut items);
            *inner = ListInner::Owned(items);
            out
        })
    }

    pub fn push(&self, value: Value) {
        self.with_owned(|items| items.push(value));
    }

    pub fn push_front(&self, value: Value) {
        self.with_owned(|items| items.insert(0, value));
    }

    pub fn insert(&self, index: usize, value: Value) {
        self.with_owned(|items| {
            let at = index.min(items.len());
            items.insert(at, value);
        });
    }

    /// Replace the element at `index`, returning the previous element.
    pub fn set(&self, index: usize, value: Value) -> Option<Value> {
        self.with_owned(|items| {
            let slot = items.get_mut(index)?;
            Some(std::mem::replace(slot, value))
        })
    }

    pub fn remove_at(&self, index: usize) -> Option<Value> {
        self.with_owned(|items| {
            if index < items.len() {
                Some(items.remove(index))
            } else {
                None
            }
        })
    }

    /// Remove the first occurrence of `value`. Owns the content even
    /// when the element is absent.
    pub fn remove_value(&self, value: &Value) -> bool {
        self.with_owned(|items| {
            if let Some(pos) = items.iter().position(|v| v == value) {
                items.remove(pos);
                true
            } else {
                false
            }
        })
    }

    pub fn pop_front(&self) -> Option<Value> {
        self.with_owned(|items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    pub fn pop_back(&self) -> Option<Value> {
        self.with_owned(|items| items.pop())
    }

    /// Owns an empty sequence without materializing a converted copy
    /// first.
    pub fn clear(&self) {
        self.inner
            .with_mut(|inner| *inner = ListInner::Owned(Vec::new()));
    }
}
