//! Set handle: insertion-ordered or sorted storage, owned or aliased.

use std::collections::BTreeSet;

use indexmap::IndexSet;

use super::{convert_or_null, Backing, ElemFn};
use crate::value::{Shared, Value};

enum SetInner {
    Owned(SetStore),
    View(ViewState),
}

enum SetStore {
    Ordered(IndexSet<Value>),
    Sorted(BTreeSet<Value>),
}

impl SetStore {
    fn len(&self) -> usize {
        match self {
            SetStore::Ordered(s) => s.len(),
            SetStore::Sorted(s) => s.len(),
        }
    }

    fn contains(&self, value: &Value) -> bool {
        match self {
            SetStore::Ordered(s) => s.contains(value),
            SetStore::Sorted(s) => s.contains(value),
        }
    }

    fn values(&self) -> Vec<Value> {
        match self {
            SetStore::Ordered(s) => s.iter().cloned().collect(),
            SetStore::Sorted(s) => s.iter().cloned().collect(),
        }
    }

    fn insert(&mut self, value: Value) -> bool {
        match self {
            SetStore::Ordered(s) => s.insert(value),
            SetStore::Sorted(s) => s.insert(value),
        }
    }

    fn remove(&mut self, value: &Value) -> bool {
        match self {
            SetStore::Ordered(s) => s.shift_remove(value),
            SetStore::Sorted(s) => s.remove(value),
        }
    }
}

struct ViewState {
    backing: Backing,
    convert: ElemFn,
}

impl ViewState {
    /// Converted backing elements, first occurrence wins.
    fn converted(&self) -> IndexSet<Value> {
        self.backing
            .snapshot()
            .iter()
            .map(|v| convert_or_null(&self.convert, v))
            .collect()
    }
}

/// Shared handle to a set. Clones alias the same set.
#[derive(Clone)]
pub struct SetRef {
    sorted: bool,
    inner: Shared<SetInner>,
}

impl SetRef {
    pub fn owned_ordered(items: Vec<Value>) -> Self {
        SetRef {
            sorted: false,
            inner: Shared::new(SetInner::Owned(SetStore::Ordered(
                items.into_iter().collect(),
            ))),
        }
    }

    pub fn owned_sorted(items: Vec<Value>) -> Self {
        SetRef {
            sorted: true,
            inner: Shared::new(SetInner::Owned(SetStore::Sorted(
                items.into_iter().collect(),
            ))),
        }
    }

    pub(crate) fn view(backing: Backing, convert: ElemFn) -> Self {
        SetRef {
            sorted: false,
            inner: Shared::new(SetInner::View(ViewState { backing, convert })),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn is_aliased(&self) -> bool {
        self.inner.with(|i| matches!(i, SetInner::View(_)))
    }

    pub fn len(&self) -> usize {
        self.inner.with(|i| match i {
            SetInner::Owned(store) => store.len(),
            SetInner::View(state) => state.converted().len(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts the backing elements before comparing when aliased.
    pub fn contains(&self, value: &Value) -> bool {
        self.inner.with(|i| match i {
            SetInner::Owned(store) => store.contains(value),
            SetInner::View(state) => state.converted().contains(value),
        })
    }

    pub fn values(&self) -> Vec<Value> {
        self.inner.with(|i| match i {
            SetInner::Owned(store) => store.values(),
            SetInner::View(state) => state.converted().into_iter().collect(),
        })
    }

    pub fn content_eq(&self, other: &SetRef) -> bool {
        if self.inner.ptr_eq(&other.inner) {
            return true;
        }
        let a = self.values();
        let b = other.values();
        a.len() == b.len() && a.iter().all(|v| b.contains(v))
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut SetStore) -> R) -> R {
        self.inner.with_mut(|inner| {
            let placeholder = SetInner::Owned(SetStore::Ordered(IndexSet::new()));
            let mut store = match std::mem::replace(inner, placeholder) {
                SetInner::Owned(store) => store,
                SetInner::View(state) => SetStore::Ordered(state.converted()),
            };
            let out = f(&mut store);
            *inner = SetInner::Owned(store);
            out
        })
    }

    pub fn insert(&self, value: Value) -> bool {
        self.with_store(|store| store.insert(value))
    }

    /// Owns the content even when the element is absent.
    pub fn remove(&self, value: &Value) -> bool {
        self.with_store(|store| store.remove(value))
    }

    /// Owns an empty set without materializing a converted copy first.
    pub fn clear(&self) {
        self.inner.with_mut(|inner| {
            let empty = if self.sorted {
                SetStore::Sorted(BTreeSet::new())
            } else {
                SetStore::Ordered(IndexSet::new())
            };
            *inner = SetInner::Owned(empty);
        });
    }
}
