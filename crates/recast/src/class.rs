//! Runtime class tokens and user-defined class shapes.
//!
//! The engine never inspects host-language types; it dispatches on
//! [`Class`] tokens. Built-in tokens cover the scalar, container and
//! array universe, and [`Class::Defined`] wraps a [`ClassDef`] built at
//! runtime through the builder API:
//!
//! ```
//! use recast::{Class, TypeDesc, Value};
//!
//! let count = Class::enumeration("Count", ["ONE", "TWO", "THREE"]);
//! let dto = Class::record("MyDto")
//!     .field("ping", Class::Str)
//!     .field("pong", Class::I64)
//!     .field("count", count.clone())
//!     .build();
//! assert_eq!(dto.display_name(), "MyDto");
//! assert!(dto.is_record());
//! ```
//!
//! Two separately built definitions are distinct classes even when their
//! names collide: `Class` equality for defined classes is identity.

use std::sync::Arc;

use crate::names;
use crate::types::TypeDesc;
use crate::value::{ObjectValue, Value};

/// Factory invoked for textual coercion into a user class.
pub type StringFactory = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Hook overriding the string form of a record/bean instance.
pub type DisplayFn = Arc<dyn Fn(&ObjectValue) -> String + Send + Sync>;

/// A runtime class token.
#[derive(Clone)]
pub enum Class {
    /// Accepts any value; conversion target equivalent of "no opinion".
    Any,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    /// Sequence interface; materializes vector-backed.
    List,
    /// Double-ended queue interface (also stands in for plain queues).
    Deque,
    /// Set interface; materializes insertion-ordered.
    Set,
    /// Sorted set interface; materializes tree-ordered.
    SortedSet,
    /// Map interface; materializes insertion-ordered.
    Map,
    /// Sorted map interface; materializes tree-ordered.
    SortedMap,
    /// Attribute-dictionary flavor of a map.
    Dict,
    Array(Box<Class>),
    Defined(Arc<ClassDef>),
}

/// Shape of a user-defined class.
pub enum ClassKind {
    Enum { constants: Vec<String> },
    Record { fields: Vec<FieldDef> },
    Interface { methods: Vec<MethodDef>, annotation: bool },
    Bean { props: Vec<PropDef> },
}

/// A record field: declared name (mangled form) and declared type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeDesc,
}

/// An interface property method.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub ret: TypeDesc,
    /// Annotation-style declared default.
    pub default: Option<Value>,
}

/// A bean property derived from its accessor name.
#[derive(Debug, Clone)]
pub struct PropDef {
    /// Derived property name (`getMe` → `me`).
    pub name: String,
    pub ty: TypeDesc,
}

/// Definition backing a [`Class::Defined`] token.
pub struct ClassDef {
    name: String,
    kind: ClassKind,
    type_params: Vec<String>,
    extends: Option<TypeDesc>,
    prefix: Option<String>,
    string_factory: Option<StringFactory>,
    display: Option<DisplayFn>,
}

impl ClassDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    pub fn extends(&self) -> Option<&TypeDesc> {
        self.extends.as_ref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn string_factory(&self) -> Option<&StringFactory> {
        self.string_factory.as_ref()
    }

    pub fn display_hook(&self) -> Option<&DisplayFn> {
        self.display.as_ref()
    }
}

impl Class {
    /// Start a record (public-field structured type) definition.
    pub fn record(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            name: name.into(),
            type_params: Vec::new(),
            extends: None,
            prefix: None,
            fields: Vec::new(),
            string_factory: None,
            display: None,
        }
    }

    /// Start an interface definition.
    pub fn interface(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            name: name.into(),
            annotation: false,
            type_params: Vec::new(),
            prefix: None,
            methods: Vec::new(),
        }
    }

    /// Start an annotation-shaped interface definition.
    pub fn annotation(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            annotation: true,
            ..Class::interface(name)
        }
    }

    /// Start a bean (accessor/setter property) definition.
    pub fn bean(name: impl Into<String>) -> BeanBuilder {
        BeanBuilder {
            name: name.into(),
            props: Vec::new(),
        }
    }

    /// Define an enum with constants in declaration order.
    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        constants: impl IntoIterator<Item = S>,
    ) -> Class {
        Class::Defined(Arc::new(ClassDef {
            name: name.into(),
            kind: ClassKind::Enum {
                constants: constants.into_iter().map(Into::into).collect(),
            },
            type_params: Vec::new(),
            extends: None,
            prefix: None,
            string_factory: None,
            display: None,
        }))
    }

    pub fn def(&self) -> Option<&Arc<ClassDef>> {
        match self {
            Class::Defined(def) => Some(def),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Class::Any => "any".into(),
            Class::Bool => "bool".into(),
            Class::Char => "char".into(),
            Class::I8 => "i8".into(),
            Class::I16 => "i16".into(),
            Class::I32 => "i32".into(),
            Class::I64 => "i64".into(),
            Class::F32 => "f32".into(),
            Class::F64 => "f64".into(),
            Class::Str => "str".into(),
            Class::List => "list".into(),
            Class::Deque => "deque".into(),
            Class::Set => "set".into(),
            Class::SortedSet => "sorted-set".into(),
            Class::Map => "map".into(),
            Class::SortedMap => "sorted-map".into(),
            Class::Dict => "dict".into(),
            Class::Array(c) => format!("{}[]", c.display_name()),
            Class::Defined(def) => def.name.clone(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Class::I8 | Class::I16 | Class::I32 | Class::I64 | Class::F32 | Class::F64
        )
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.def().map(|d| d.kind()), Some(ClassKind::Enum { .. }))
    }

    pub fn is_record(&self) -> bool {
        matches!(self.def().map(|d| d.kind()), Some(ClassKind::Record { .. }))
    }

    pub fn is_bean(&self) -> bool {
        matches!(self.def().map(|d| d.kind()), Some(ClassKind::Bean { .. }))
    }

    pub fn is_interface(&self) -> bool {
        matches!(
            self.def().map(|d| d.kind()),
            Some(ClassKind::Interface { .. })
        )
    }

    pub fn is_annotation(&self) -> bool {
        matches!(
            self.def().map(|d| d.kind()),
            Some(ClassKind::Interface {
                annotation: true,
                ..
            })
        )
    }

    /// Annotation-shaped interface with no methods of its own.
    pub fn is_marker(&self) -> bool {
        matches!(
            self.def().map(|d| d.kind()),
            Some(ClassKind::Interface {
                annotation: true,
                methods,
            }) if methods.is_empty()
        )
    }

    /// Key for the `value` element, when this is a single-element
    /// annotation.
    pub fn single_element_key(&self) -> Option<String> {
        let def = self.def()?;
        match def.kind() {
            ClassKind::Interface {
                annotation: true,
                methods,
            } if methods.iter().any(|m| m.name == "value") => {
                Some(names::single_element_key(&def.name))
            }
            _ => None,
        }
    }

    pub fn prefix(&self) -> Option<String> {
        self.def().and_then(|d| d.prefix.clone())
    }

    /// Collection and map targets, arrays, records and beans all require
    /// a fresh instance on conversion; everything else may pass through
    /// the identity short-circuit.
    pub fn is_copy_required(&self) -> bool {
        match self {
            Class::Array(_)
            | Class::List
            | Class::Deque
            | Class::Set
            | Class::SortedSet
            | Class::Map
            | Class::SortedMap
            | Class::Dict => true,
            Class::Defined(_) => self.is_record() || self.is_bean(),
            _ => false,
        }
    }

    /// Whether a value of class `other` is acceptable where `self` is
    /// expected: exact class, `any`, or a declared superclass.
    pub fn is_assignable_from(&self, other: &Class) -> bool {
        if self == other || matches!(self, Class::Any) {
            return true;
        }
        let mut cur = other.clone();
        while let Some(sup) = cur.def().and_then(|d| d.extends()).and_then(|t| t.raw()) {
            if &sup == self {
                return true;
            }
            cur = sup;
        }
        false
    }

    /// Field value a freshly constructed instance starts out with.
    pub fn zero_value(&self) -> Value {
        match self {
            Class::Bool => Value::Bool(false),
            Class::Char => Value::Char('\0'),
            Class::I8 => Value::I8(0),
            Class::I16 => Value::I16(0),
            Class::I32 => Value::I32(0),
            Class::I64 => Value::I64(0),
            Class::F32 => Value::F32(0.0),
            Class::F64 => Value::F64(0.0),
            _ => Value::Null,
        }
    }

    /// Declared record fields, nearest declaration first: a subclass
    /// field shadows a superclass field of the same name.
    pub fn field_chain(&self) -> Vec<FieldDef> {
        let mut out: Vec<FieldDef> = Vec::new();
        let mut cur = Some(self.clone());
        while let Some(c) = cur {
            let Some(def) = c.def() else { break };
            if let ClassKind::Record { fields } = def.kind() {
                for f in fields {
                    if !out.iter().any(|seen| seen.name == f.name) {
                        out.push(f.clone());
                    }
                }
            }
            cur = def.extends().and_then(|t| t.raw());
        }
        out
    }

    pub fn methods(&self) -> Vec<MethodDef> {
        match self.def().map(|d| d.kind()) {
            Some(ClassKind::Interface { methods, .. }) => methods.clone(),
            _ => Vec::new(),
        }
    }

    pub fn props(&self) -> Vec<PropDef> {
        match self.def().map(|d| d.kind()) {
            Some(ClassKind::Bean { props }) => props.clone(),
            _ => Vec::new(),
        }
    }

    pub fn enum_constants(&self) -> Vec<String> {
        match self.def().map(|d| d.kind()) {
            Some(ClassKind::Enum { constants }) => constants.clone(),
            _ => Vec::new(),
        }
    }

    /// Enum constant by declaration-order index.
    pub fn enum_value_at(&self, index: usize) -> Option<Value> {
        match self.def()?.kind() {
            ClassKind::Enum { constants } if index < constants.len() => {
                Some(Value::enum_constant(self.clone(), index))
            }
            _ => None,
        }
    }

    /// Enum constant by exact name.
    pub fn enum_value(&self, name: &str) -> Option<Value> {
        match self.def()?.kind() {
            ClassKind::Enum { constants } => constants
                .iter()
                .position(|c| c == name)
                .map(|i| Value::enum_constant(self.clone(), i)),
            _ => None,
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Class::Array(a), Class::Array(b)) => a == b,
            (Class::Defined(a), Class::Defined(b)) => Arc::ptr_eq(a, b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for Class {}

impl std::hash::Hash for Class {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Class::Array(c) => c.hash(state),
            Class::Defined(def) => (Arc::as_ptr(def) as usize).hash(state),
            _ => {}
        }
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Builder for record classes.
pub struct RecordBuilder {
    name: String,
    type_params: Vec<String>,
    extends: Option<TypeDesc>,
    prefix: Option<String>,
    fields: Vec<FieldDef>,
    string_factory: Option<StringFactory>,
    display: Option<DisplayFn>,
}

impl RecordBuilder {
    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn extends(mut self, sup: impl Into<TypeDesc>) -> Self {
        self.extends = Some(sup.into());
        self
    }

    /// Key prefix prepended to every derived field key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeDesc>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Textual-coercion factory for this class (the `valueOf` role).
    pub fn string_factory(
        mut self,
        f: impl Fn(&str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.string_factory = Some(Arc::new(f));
        self
    }

    /// Override the string form of instances.
    pub fn display_with(
        mut self,
        f: impl Fn(&ObjectValue) -> String + Send + Sync + 'static,
    ) -> Self {
        self.display = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Class {
        Class::Defined(Arc::new(ClassDef {
            name: self.name,
            kind: ClassKind::Record {
                fields: self.fields,
            },
            type_params: self.type_params,
            extends: self.extends,
            prefix: self.prefix,
            string_factory: self.string_factory,
            display: self.display,
        }))
    }
}

/// Builder for interface and annotation classes.
pub struct InterfaceBuilder {
    name: String,
    annotation: bool,
    type_params: Vec<String>,
    prefix: Option<String>,
    methods: Vec<MethodDef>,
}

impl InterfaceBuilder {
    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn method(mut self, name: impl Into<String>, ret: impl Into<TypeDesc>) -> Self {
        self.methods.push(MethodDef {
            name: name.into(),
            ret: ret.into(),
            default: None,
        });
        self
    }

    /// Method with an annotation-style declared default.
    pub fn method_with_default(
        mut self,
        name: impl Into<String>,
        ret: impl Into<TypeDesc>,
        default: Value,
    ) -> Self {
        self.methods.push(MethodDef {
            name: name.into(),
            ret: ret.into(),
            default: Some(default),
        });
        self
    }

    pub fn build(self) -> Class {
        Class::Defined(Arc::new(ClassDef {
            name: self.name,
            kind: ClassKind::Interface {
                methods: self.methods,
                annotation: self.annotation,
            },
            type_params: self.type_params,
            extends: None,
            prefix: self.prefix,
            string_factory: None,
            display: None,
        }))
    }
}

/// Builder for bean classes. Bean keys are the plain accessor-derived
/// property names; prefixes apply to records and interfaces only.
pub struct BeanBuilder {
    name: String,
    props: Vec<PropDef>,
}

impl BeanBuilder {
    /// Declare a property by its accessor method name.
    ///
    /// # Panics
    ///
    /// Panics when `accessor` is not a `getFoo`/`isFoo` shaped name.
    pub fn property(mut self, accessor: &str, ty: impl Into<TypeDesc>) -> Self {
        let Some(name) = names::accessor_property(accessor) else {
            panic!("not a bean accessor name: {accessor}");
        };
        self.props.push(PropDef {
            name,
            ty: ty.into(),
        });
        self
    }

    pub fn build(self) -> Class {
        Class::Defined(Arc::new(ClassDef {
            name: self.name,
            kind: ClassKind::Bean { props: self.props },
            type_params: Vec::new(),
            extends: None,
            prefix: None,
            string_factory: None,
            display: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_classes_compare_by_identity() {
        let a = Class::record("Same").build();
        let b = Class::record("Same").build();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn assignability_walks_the_chain() {
        let base = Class::record("Base").build();
        let sub = Class::record("Sub").extends(base.clone()).build();
        assert!(base.is_assignable_from(&sub));
        assert!(!sub.is_assignable_from(&base));
        assert!(Class::Any.is_assignable_from(&sub));
        assert!(Class::I64.is_assignable_from(&Class::I64));
        assert!(!Class::I64.is_assignable_from(&Class::I32));
    }

    #[test]
    fn field_shadowing_prefers_the_subclass() {
        let base = Class::record("Base")
            .field("memo", Class::Str)
            .field("pong", Class::I64)
            .build();
        let sub = Class::record("Sub")
            .extends(base)
            .field("pong", Class::I32)
            .build();
        let fields = sub.field_chain();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "pong");
        assert_eq!(fields[0].ty, TypeDesc::Class(Class::I32));
        assert_eq!(fields[1].name, "memo");
    }

    #[test]
    fn marker_and_single_element_detection() {
        let marker = Class::annotation("MyMarker").build();
        assert!(marker.is_marker());
        assert_eq!(marker.single_element_key(), None);

        let single = Class::annotation("SingleElementAnnotation")
            .method("value", TypeDesc::array_of(Class::Str))
            .method_with_default("somethingElse", Class::I64, Value::I64(-87))
            .build();
        assert!(!single.is_marker());
        assert_eq!(
            single.single_element_key().as_deref(),
            Some("single.element.annotation")
        );
    }

    #[test]
    fn enum_lookup() {
        let count = Class::enumeration("Count", ["ONE", "TWO", "THREE"]);
        let two = count.enum_value("TWO").unwrap();
        assert_eq!(count.enum_value_at(1), Some(two));
        assert_eq!(count.enum_value_at(7), None);
        assert_eq!(count.enum_value("two"), None);
    }

    #[test]
    fn copy_required_partition() {
        assert!(Class::Map.is_copy_required());
        assert!(Class::Array(Box::new(Class::I8)).is_copy_required());
        assert!(Class::record("R").build().is_copy_required());
        assert!(!Class::Str.is_copy_required());
        assert!(!Class::interface("I").build().is_copy_required());
        assert!(!Class::enumeration("E", ["A"]).is_copy_required());
    }
}
