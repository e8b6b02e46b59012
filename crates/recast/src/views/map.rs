//! Map handle: insertion-ordered or sorted storage, owned or aliased.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::{convert_or_null, ElemFn};
use crate::facade::PropertyBag;
use crate::value::{DictValue, Shared, Value};

/// Map-shaped backings a map view can alias.
#[derive(Clone)]
pub(crate) enum MapBacking {
    Map(MapRef),
    Dict(DictValue),
    Bag(PropertyBag),
}

impl MapBacking {
    fn len(&self) -> usize {
        match self {
            MapBacking::Map(m) => m.len(),
            MapBacking::Dict(d) => d.len(),
            MapBacking::Bag(b) => b.len(),
        }
    }

    /// Current backing entries, unconverted. Bag properties that fail
    /// to produce a value read as null.
    fn raw_entries(&self) -> Vec<(Value, Value)> {
        match self {
            MapBacking::Map(m) => m.entries(),
            MapBacking::Dict(d) => d
                .entries()
                .into_iter()
                .map(|(k, v)| (Value::str(k), v))
                .collect(),
            MapBacking::Bag(b) => b
                .keys()
                .iter()
                .map(|k| {
                    let v = b.get(k).unwrap_or(Value::Null);
                    (Value::str(k.as_str()), v)
                })
                .collect(),
        }
    }
}

struct MapViewState {
    backing: MapBacking,
    convert_key: ElemFn,
    convert_val: ElemFn,
}

impl MapViewState {
    fn entries(&self) -> Vec<(Value, Value)> {
        self.backing
            .raw_entries()
            .iter()
            .map(|(k, v)| {
                (
                    convert_or_null(&self.convert_key, k),
                    convert_or_null(&self.convert_val, v),
                )
            })
            .collect()
    }

    /// Converted entries as a map, later duplicate keys winning.
    fn materialized(&self) -> IndexMap<Value, Value> {
        self.entries().into_iter().collect()
    }
}

enum MapInner {
    Owned(MapStore),
    View(MapViewState),
}

enum MapStore {
    Ordered(IndexMap<Value, Value>),
    Sorted(BTreeMap<Value, Value>),
}

impl MapStore {
    fn len(&self) -> usize {
        match self {
            MapStore::Ordered(m) => m.len(),
            MapStore::Sorted(m) => m.len(),
        }
    }

    fn get(&self, key: &Value) -> Option<Value> {
        match self {
            MapStore::Ordered(m) => m.get(key).cloned(),
            MapStore::Sorted(m) => m.get(key).cloned(),
        }
    }

    fn entries(&self) -> Vec<(Value, Value)> {
        match self {
            MapStore::Ordered(m) => m.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            MapStore::Sorted(m) => m.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self {
            MapStore::Ordered(m) => m.insert(key, value),
            MapStore::Sorted(m) => m.insert(key, value),
        }
    }

    fn remove(&mut self, key: &Value) -> Option<Value> {
        match self {
            MapStore::Ordered(m) => m.shift_remove(key),
            MapStore::Sorted(m) => m.remove(key),
        }
    }
}

/// Shared handle to a map. Clones alias the same map.
#[derive(Clone)]
pub struct MapRef {
    sorted: bool,
    inner: Shared<MapInner>,
}

impl MapRef {
    pub fn owned_ordered(entries: Vec<(Value, Value)>) -> Self {
        MapRef {
            sorted: false,
            inner: Shared::new(MapInner::Owned(MapStore::Ordered(
                entries.into_iter().collect(),
            ))),
        }
    }

    pub fn owned_sorted(entries: Vec<(Value, Value)>) -> Self {
        MapRef {
            sorted: true,
            inner: Shared::new(MapInner::Owned(MapStore::Sorted(
                entries.into_iter().collect(),
            ))),
        }
    }

    pub(crate) fn view(backing: MapBacking, convert_key: ElemFn, convert_val: ElemFn) -> Self {
        MapRef {
            sorted: false,
            inner: Shared::new(MapInner::View(MapViewState {
                backing,
                convert_key,
                convert_val,
            })),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn is_aliased(&self) -> bool {
        self.inner.with(|i| matches!(i, MapInner::View(_)))
    }

    /// Aliased handles report the backing's size, before key
    /// conversion collapses duplicates.
    pub fn len(&self) -> usize {
        self.inner.with(|i| match i {
            MapInner::Owned(store) => store.len(),
            MapInner::View(state) => state.backing.len(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.inner.with(|i| match i {
            MapInner::Owned(store) => store.get(key),
            MapInner::View(state) => state
                .entries()
                .into_iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
        })
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.inner.with(|i| match i {
            MapInner::Owned(store) => store.entries(),
            MapInner::View(state) => state.entries(),
        })
    }

    pub fn content_eq(&self, other: &MapRef) -> bool {
        if self.inner.ptr_eq(&other.inner) {
            return true;
        }
        let a = self.entries();
        let b = other.entries();
        a.len() == b.len()
            && a.iter()
                .all(|(k, v)| b.iter().any(|(bk, bv)| bk == k && bv == v))
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut MapStore) -> R) -> R {
        self.inner.with_mut(|inner| {
            let placeholder = MapInner::Owned(MapStore::Ordered(IndexMap::new()));
            let mut store = match std::mem::replace(inner, placeholder) {
                MapInner::Owned(store) => store,
                MapInner::View(state) => MapStore::Ordered(state.materialized()),
            };
            let out = f(&mut store);
            *inner = MapInner::Owned(store);
            out
        })
    }

    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        self.with_store(|store| store.insert(key, value))
    }

    /// Owns the content even when the key is absent.
    pub fn remove(&self, key: &Value) -> Option<Value> {
        self.with_store(|store| store.remove(key))
    }

    /// Owns an empty map without materializing a converted copy first.
    pub fn clear(&self) {
        self.inner.with_mut(|inner| {
            let empty = if self.sorted {
                MapStore::Sorted(BTreeMap::new())
            } else {
                MapStore::Ordered(IndexMap::new())
            };
            *inner = MapInner::Owned(empty);
        });
    }
}
