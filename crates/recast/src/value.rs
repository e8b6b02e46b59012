//! The dynamic value universe the engine converts between.
//!
//! Every source and target of a conversion is a [`Value`]. Scalars are
//! carried inline; containers and structured instances hold shared
//! handles, so clones of a `Value` alias the same underlying storage
//! (conversion itself is what produces detached copies).
//!
//! ```
//! use recast::{Class, Value};
//!
//! let v = Value::list(vec![Value::I64(1), Value::I64(2)]);
//! assert_eq!(v.to_string(), "[1, 2]");
//! assert_eq!(v.type_of(), Class::List);
//! ```
//!
//! # Equality
//!
//! `PartialEq` is content-based for scalars, strings, enums, arrays,
//! collections, maps and records, and identity-based for interface
//! instances. Numeric values compare equal only at the same width
//! (`I32(1) != I64(1)`), and floats use total equality so `F64(NAN)`
//! equals itself. Sets and maps compare without regard to iteration
//! order. Self-referential containers are not supported.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::class::{Class, ClassKind};
use crate::error::ConvertError;
use crate::views::{ListRef, MapRef, SeqKind, SetRef};

/// Shared mutable cell. Clones alias the same storage.
pub struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared(Arc::new(Mutex::new(value)))
    }

    /// Run `f` with a read borrow of the contents.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with a mutable borrow of the contents.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|v| write!(f, "{v:?}"))
    }
}

/// Property accessor backing one interface method. The argument is the
/// single call argument, if the caller passed one.
pub type PropertyFn = Arc<dyn Fn(Option<&Value>) -> Result<Value, ConvertError> + Send + Sync>;

/// A dynamically typed value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    Enum(EnumValue),
    Array(ArrayValue),
    List(ListRef),
    Set(SetRef),
    Map(MapRef),
    Dict(DictValue),
    Object(ObjectValue),
    Iface(IfaceValue),
}

/// One constant of a defined enum class.
#[derive(Clone)]
pub struct EnumValue {
    class: Class,
    ordinal: usize,
}

impl EnumValue {
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        match self.class.def().map(|d| d.kind()) {
            Some(ClassKind::Enum { constants }) => constants
                .get(self.ordinal)
                .map(String::as_str)
                .unwrap_or(""),
            _ => "",
        }
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.ordinal == other.ordinal
    }
}

/// Fixed-component-class sequence with shared storage.
#[derive(Clone)]
pub struct ArrayValue {
    elem: Class,
    items: Shared<Vec<Value>>,
}

impl ArrayValue {
    pub fn new(elem: Class, items: Vec<Value>) -> Self {
        ArrayValue {
            elem,
            items: Shared::new(items),
        }
    }

    pub fn elem(&self) -> &Class {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.items.with(|v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.with(|v| v.get(index).cloned())
    }

    pub fn set(&self, index: usize, value: Value) {
        self.items.with_mut(|v| {
            if let Some(slot) = v.get_mut(index) {
                *slot = value;
            }
        });
    }

    pub fn values(&self) -> Vec<Value> {
        self.items.with(|v| v.clone())
    }
}

/// String-keyed attribute dictionary.
#[derive(Clone)]
pub struct DictValue {
    entries: Shared<IndexMap<String, Value>>,
}

impl DictValue {
    pub fn new(entries: IndexMap<String, Value>) -> Self {
        DictValue {
            entries: Shared::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.with(|m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.with(|m| m.get(key).cloned())
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.with_mut(|m| {
            m.insert(key.into(), value);
        });
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.with_mut(|m| m.shift_remove(key))
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.entries
            .with(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Instance of a record or bean class: named fields over shared storage.
#[derive(Clone)]
pub struct ObjectValue {
    class: Class,
    fields: Shared<IndexMap<String, Value>>,
}

impl ObjectValue {
    /// Construct an instance with every declared field at its zero
    /// value.
    pub fn new(class: &Class) -> Self {
        let mut fields = IndexMap::new();
        for f in class.field_chain() {
            let zero = f.ty.raw().map(|c| c.zero_value()).unwrap_or(Value::Null);
            fields.insert(f.name, zero);
        }
        for p in class.props() {
            let zero = p.ty.raw().map(|c| c.zero_value()).unwrap_or(Value::Null);
            fields.insert(p.name, zero);
        }
        ObjectValue {
            class: class.clone(),
            fields: Shared::new(fields),
        }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.with(|m| m.get(name).cloned())
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.fields.with_mut(|m| {
            m.insert(name.into(), value);
        });
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.fields
            .with(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Instance of an interface class, backed by per-method accessors.
///
/// Interface instances carry behavior, not data, so equality and
/// hashing are by identity.
#[derive(Clone)]
pub struct IfaceValue {
    class: Class,
    props: Arc<IndexMap<String, PropertyFn>>,
}

impl IfaceValue {
    pub fn builder(class: Class) -> IfaceBuilder {
        IfaceBuilder {
            class,
            props: IndexMap::new(),
        }
    }

    pub(crate) fn from_parts(class: Class, props: IndexMap<String, PropertyFn>) -> Self {
        IfaceValue {
            class,
            props: Arc::new(props),
        }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Invoke the accessor behind `name`, passing through the optional
    /// call argument.
    pub fn call(&self, name: &str, arg: Option<&Value>) -> Result<Value, ConvertError> {
        match self.props.get(name) {
            Some(f) => f(arg),
            None => Err(ConvertError::MissingProperty {
                class: self.class.display_name(),
                property: name.to_string(),
            }),
        }
    }
}

/// Builder for interface instances used as conversion sources.
pub struct IfaceBuilder {
    class: Class,
    props: IndexMap<String, PropertyFn>,
}

impl IfaceBuilder {
    /// Back `name` with an infallible supplier.
    pub fn supply(
        mut self,
        name: impl Into<String>,
        f: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.props.insert(name.into(), Arc::new(move |_| Ok(f())));
        self
    }

    /// Back `name` with a full accessor that sees the call argument and
    /// may fail.
    pub fn supply_with(
        mut self,
        name: impl Into<String>,
        f: impl Fn(Option<&Value>) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        self.props.insert(name.into(), Arc::new(f));
        self
    }

    pub fn build(self) -> Value {
        Value::Iface(IfaceValue::from_parts(self.class, self.props))
    }
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn array(elem: Class, items: Vec<Value>) -> Value {
        Value::Array(ArrayValue::new(elem, items))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(ListRef::owned(SeqKind::List, items))
    }

    pub fn deque(items: Vec<Value>) -> Value {
        Value::List(ListRef::owned(SeqKind::Deque, items))
    }

    pub fn set(items: Vec<Value>) -> Value {
        Value::Set(SetRef::owned_ordered(items))
    }

    pub fn sorted_set(items: Vec<Value>) -> Value {
        Value::Set(SetRef::owned_sorted(items))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(MapRef::owned_ordered(entries))
    }

    pub fn sorted_map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(MapRef::owned_sorted(entries))
    }

    pub fn dict(entries: Vec<(&str, Value)>) -> Value {
        let mut map = IndexMap::new();
        for (k, v) in entries {
            map.insert(k.to_string(), v);
        }
        Value::Dict(DictValue::new(map))
    }

    /// Constant `ordinal` of the enum `class`.
    pub fn enum_constant(class: Class, ordinal: usize) -> Value {
        Value::Enum(EnumValue { class, ordinal })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime class of this value.
    pub fn type_of(&self) -> Class {
        match self {
            Value::Null => Class::Any,
            Value::Bool(_) => Class::Bool,
            Value::Char(_) => Class::Char,
            Value::I8(_) => Class::I8,
            Value::I16(_) => Class::I16,
            Value::I32(_) => Class::I32,
            Value::I64(_) => Class::I64,
            Value::F32(_) => Class::F32,
            Value::F64(_) => Class::F64,
            Value::Str(_) => Class::Str,
            Value::Enum(e) => e.class.clone(),
            Value::Array(a) => Class::Array(Box::new(a.elem.clone())),
            Value::List(l) => match l.kind() {
                SeqKind::List => Class::List,
                SeqKind::Deque => Class::Deque,
            },
            Value::Set(s) => {
                if s.is_sorted() {
                    Class::SortedSet
                } else {
                    Class::Set
                }
            }
            Value::Map(m) => {
                if m.is_sorted() {
                    Class::SortedMap
                } else {
                    Class::Map
                }
            }
            Value::Dict(_) => Class::Dict,
            Value::Object(o) => o.class.clone(),
            Value::Iface(i) => i.class.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (F32(a), F32(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (F64(a), F64(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Str(a), Str(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            (Array(a), Array(b)) => {
                a.elem == b.elem
                    && (a.items.ptr_eq(&b.items)
                        || a.items.with(|x| b.items.with(|y| x == y)))
            }
            (List(a), List(b)) => a.content_eq(b),
            (Set(a), Set(b)) => a.content_eq(b),
            (Map(a), Map(b)) => a.content_eq(b),
            (Dict(a), Dict(b)) => {
                a.entries.ptr_eq(&b.entries)
                    || a.entries.with(|x| b.entries.with(|y| x == y))
            }
            (Object(a), Object(b)) => {
                a.class == b.class
                    && (a.fields.ptr_eq(&b.fields)
                        || a.fields.with(|x| b.fields.with(|y| x == y)))
            }
            (Iface(a), Iface(b)) => Arc::ptr_eq(&a.props, &b.props),
            _ => false,
        }
    }
}

impl Eq for Value {}

fn content_hash(v: &Value) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

/// Order-independent combination, for sets and maps whose equality
/// ignores iteration order.
fn unordered_hash(parts: impl Iterator<Item = u64>) -> u64 {
    parts.fold(0u64, |acc, h| acc.wrapping_add(h))
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::F32(v) => OrderedFloat(*v).hash(state),
            Value::F64(v) => OrderedFloat(*v).hash(state),
            Value::Str(v) => v.hash(state),
            Value::Enum(e) => {
                e.class.hash(state);
                e.ordinal.hash(state);
            }
            Value::Array(a) => {
                a.elem.hash(state);
                a.items.with(|items| {
                    for item in items {
                        item.hash(state);
                    }
                });
            }
            Value::List(l) => {
                for item in l.values() {
                    item.hash(state);
                }
            }
            Value::Set(s) => {
                unordered_hash(s.values().iter().map(content_hash)).hash(state);
            }
            Value::Map(m) => {
                unordered_hash(m.entries().iter().map(|(k, v)| {
                    content_hash(k).wrapping_mul(31).wrapping_add(content_hash(v))
                }))
                .hash(state);
            }
            Value::Dict(d) => {
                unordered_hash(d.entries().iter().map(|(k, v)| {
                    let mut h = DefaultHasher::new();
                    k.hash(&mut h);
                    h.finish().wrapping_mul(31).wrapping_add(content_hash(v))
                }))
                .hash(state);
            }
            Value::Object(o) => {
                o.class.hash(state);
                unordered_hash(o.entries().iter().map(|(k, v)| {
                    let mut h = DefaultHasher::new();
                    k.hash(&mut h);
                    h.finish().wrapping_mul(31).wrapping_add(content_hash(v))
                }))
                .hash(state);
            }
            Value::Iface(i) => (Arc::as_ptr(&i.props) as *const () as usize).hash(state),
        }
    }
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Char(_) => 2,
            Value::I8(_) => 3,
            Value::I16(_) => 4,
            Value::I32(_) => 5,
            Value::I64(_) => 6,
            Value::F32(_) => 7,
            Value::F64(_) => 8,
            Value::Str(_) => 9,
            Value::Enum(_) => 10,
            Value::Array(_) => 11,
            Value::List(_) => 12,
            Value::Set(_) => 13,
            Value::Map(_) => 14,
            Value::Dict(_) => 15,
            Value::Object(_) => 16,
            Value::Iface(_) => 17,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order for sorted containers: by kind, then by content. Equal
/// values always compare `Equal`, and floats use their total order.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use Value::*;
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Char(a), Char(b)) => a.cmp(b),
            (I8(a), I8(b)) => a.cmp(b),
            (I16(a), I16(b)) => a.cmp(b),
            (I32(a), I32(b)) => a.cmp(b),
            (I64(a), I64(b)) => a.cmp(b),
            (F32(a), F32(b)) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (F64(a), F64(b)) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (Str(a), Str(b)) => a.cmp(b),
            (Enum(a), Enum(b)) => a
                .class
                .display_name()
                .cmp(&b.class.display_name())
                .then(a.ordinal.cmp(&b.ordinal))
                .then(class_ptr(&a.class).cmp(&class_ptr(&b.class))),
            (Array(a), Array(b)) => {
                if a.items.ptr_eq(&b.items) && a.elem == b.elem {
                    return Ordering::Equal;
                }
                a.elem
                    .display_name()
                    .cmp(&b.elem.display_name())
                    .then_with(|| a.values().cmp(&b.values()))
                    .then(class_ptr(&a.elem).cmp(&class_ptr(&b.elem)))
            }
            (List(a), List(b)) => a.values().cmp(&b.values()),
            (Set(a), Set(b)) => sorted(a.values()).cmp(&sorted(b.values())),
            (Map(a), Map(b)) => sorted(a.entries()).cmp(&sorted(b.entries())),
            (Dict(a), Dict(b)) => sorted(a.entries()).cmp(&sorted(b.entries())),
            (Object(a), Object(b)) => a
                .class
                .display_name()
                .cmp(&b.class.display_name())
                .then_with(|| sorted(a.entries()).cmp(&sorted(b.entries())))
                .then(class_ptr(&a.class).cmp(&class_ptr(&b.class))),
            (Iface(a), Iface(b)) => {
                (Arc::as_ptr(&a.props) as *const () as usize)
                    .cmp(&(Arc::as_ptr(&b.props) as *const () as usize))
            }
            _ => Ordering::Equal,
        }
    }
}

fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}

fn class_ptr(class: &Class) -> usize {
    class.def().map(|d| Arc::as_ptr(d) as usize).unwrap_or(0)
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Enum(e) => write!(f, "{}", e.name()),
            Value::Array(a) => fmt_seq(f, &a.values()),
            Value::List(l) => fmt_seq(f, &l.values()),
            Value::Set(s) => fmt_seq(f, &s.values()),
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
            Value::Dict(d) => {
                write!(f, "{{")?;
                for (i, (k, v)) in d.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => {
                if let Some(hook) = o.class.def().and_then(|d| d.display_hook().cloned()) {
                    return write!(f, "{}", hook(o));
                }
                write!(f, "{}{{", o.class.display_name())?;
                for (i, (k, v)) in o.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
            Value::Iface(i) => write!(f, "{}[proxy]", i.class.display_name()),
        }
    }
}

fn fmt_seq(f: &mut std::fmt::Formatter<'_>, items: &[Value]) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Char(v) => write!(f, "{v:?}"),
            Value::Enum(e) => write!(f, "{}::{}", e.class.display_name(), e.name()),
            Value::Object(o) => {
                write!(f, "{}{{", o.class.display_name())?;
                for (i, (k, v)) in o.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v:?}")?;
                }
                write!(f, "}}")
            }
            other => write!(f, "{other}"),
        }
    }
}
