//! Target type descriptors.
//!
//! A [`TypeDesc`] is what callers hand to [`Converting::to`](crate::Converting::to):
//! a plain class, a generic class applied to actual arguments, an array, a
//! bounded wildcard or a named type variable. [`reify`] resolves variables
//! against a concrete owner, which is how a record field declared as `T`
//! becomes `str` when the record is read as `Foo<str>`.
//!
//! # Examples
//!
//! ```
//! use recast::{Class, TypeDesc};
//!
//! let target = TypeDesc::parameterized(Class::Map, [Class::Str.into(), Class::I64.into()]);
//! assert_eq!(target.to_string(), "map<str, i64>");
//! ```

use crate::class::Class;
use crate::error::ConvertError;

/// Description of a conversion target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// A plain runtime class.
    Class(Class),
    /// A generic class applied to actual type arguments.
    Parameterized { raw: Class, args: Vec<TypeDesc> },
    /// An array with a generic component descriptor.
    Array(Box<TypeDesc>),
    /// A bounded wildcard. A present lower bound cannot be converted to.
    Wildcard {
        upper: Box<TypeDesc>,
        lower: Option<Box<TypeDesc>>,
    },
    /// A named type variable, resolved by [`reify`].
    Var(String),
}

impl TypeDesc {
    pub fn parameterized(raw: Class, args: impl IntoIterator<Item = TypeDesc>) -> TypeDesc {
        TypeDesc::Parameterized {
            raw,
            args: args.into_iter().collect(),
        }
    }

    pub fn array_of(component: impl Into<TypeDesc>) -> TypeDesc {
        TypeDesc::Array(Box::new(component.into()))
    }

    /// `? extends upper`.
    pub fn wildcard_extends(upper: impl Into<TypeDesc>) -> TypeDesc {
        TypeDesc::Wildcard {
            upper: Box::new(upper.into()),
            lower: None,
        }
    }

    /// `? super lower`. Always rejected at dispatch time.
    pub fn wildcard_super(lower: impl Into<TypeDesc>) -> TypeDesc {
        TypeDesc::Wildcard {
            upper: Box::new(TypeDesc::Class(Class::Any)),
            lower: Some(Box::new(lower.into())),
        }
    }

    pub fn var(name: impl Into<String>) -> TypeDesc {
        TypeDesc::Var(name.into())
    }

    /// Strip wildcard layers down to the upper bound. A lower-bounded
    /// wildcard is the ambiguous-wildcard hard failure.
    pub fn resolve_wildcard(&self) -> Result<&TypeDesc, ConvertError> {
        let mut ty = self;
        while let TypeDesc::Wildcard { upper, lower } = ty {
            if lower.is_some() {
                return Err(ConvertError::AmbiguousWildcard);
            }
            ty = upper;
        }
        Ok(ty)
    }

    /// The raw class this descriptor converts to, or `None` for an
    /// unresolved type variable.
    pub fn raw(&self) -> Option<Class> {
        match self {
            TypeDesc::Class(c) => Some(c.clone()),
            TypeDesc::Parameterized { raw, .. } => Some(raw.clone()),
            TypeDesc::Array(component) => Some(Class::Array(Box::new(component.raw()?))),
            TypeDesc::Wildcard { .. } => self.resolve_wildcard().ok()?.raw(),
            TypeDesc::Var(_) => None,
        }
    }

    /// Actual type arguments, when parameterized.
    pub fn args(&self) -> &[TypeDesc] {
        match self {
            TypeDesc::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    /// Component descriptor for array targets, whether expressed as a
    /// generic array descriptor or an array class.
    pub fn component(&self) -> Option<TypeDesc> {
        match self {
            TypeDesc::Array(component) => Some((**component).clone()),
            TypeDesc::Class(Class::Array(component)) => {
                Some(TypeDesc::Class((**component).clone()))
            }
            _ => None,
        }
    }
}

impl From<Class> for TypeDesc {
    fn from(c: Class) -> TypeDesc {
        TypeDesc::Class(c)
    }
}

impl std::fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDesc::Class(c) => write!(f, "{}", c.display_name()),
            TypeDesc::Parameterized { raw, args } => {
                write!(f, "{}<", raw.display_name())?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ">")
            }
            TypeDesc::Array(component) => write!(f, "{component}[]"),
            TypeDesc::Wildcard { upper, lower } => match lower {
                Some(l) => write!(f, "? super {l}"),
                None => write!(f, "? extends {upper}"),
            },
            TypeDesc::Var(name) => write!(f, "{name}"),
        }
    }
}

/// Resolve `ty` against a concrete owner class and its actual type
/// arguments.
///
/// Type variables are matched by name against the owner's declared
/// parameters; unmatched variables retry up the owner's generic
/// superclass chain (with that superclass's arguments themselves
/// resolved first), and come back unchanged when nothing matches.
/// Parameterized and array descriptors reallocate only when a nested
/// argument actually changed.
pub fn reify(ty: &TypeDesc, owner: &Class, owner_args: &[TypeDesc]) -> TypeDesc {
    match ty {
        TypeDesc::Var(name) => {
            if let Some(def) = owner.def() {
                if let Some(i) = def.type_params().iter().position(|p| p == name) {
                    if let Some(actual) = owner_args.get(i) {
                        return actual.clone();
                    }
                }
                if let Some(sup) = def.extends() {
                    if let Some(sup_raw) = sup.raw() {
                        let sup_args: Vec<TypeDesc> = sup
                            .args()
                            .iter()
                            .map(|a| reify(a, owner, owner_args))
                            .collect();
                        return reify(ty, &sup_raw, &sup_args);
                    }
                }
            }
            ty.clone()
        }
        TypeDesc::Parameterized { raw, args } => {
            let mut changed = false;
            let reified: Vec<TypeDesc> = args
                .iter()
                .map(|a| {
                    let r = reify(a, owner, owner_args);
                    if &r != a {
                        changed = true;
                    }
                    r
                })
                .collect();
            if changed {
                TypeDesc::Parameterized {
                    raw: raw.clone(),
                    args: reified,
                }
            } else {
                ty.clone()
            }
        }
        TypeDesc::Array(component) => {
            let r = reify(component, owner, owner_args);
            if &r != component.as_ref() {
                TypeDesc::Array(Box::new(r))
            } else {
                ty.clone()
            }
        }
        _ => ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_resolution() {
        let ok = TypeDesc::wildcard_extends(Class::I64);
        assert_eq!(ok.resolve_wildcard().unwrap(), &TypeDesc::Class(Class::I64));

        let bad = TypeDesc::wildcard_super(Class::I64);
        assert_eq!(
            bad.resolve_wildcard().unwrap_err(),
            ConvertError::AmbiguousWildcard
        );
    }

    #[test]
    fn raw_classes() {
        assert_eq!(TypeDesc::Class(Class::Str).raw(), Some(Class::Str));
        let arr = TypeDesc::array_of(Class::I32);
        assert_eq!(arr.raw(), Some(Class::Array(Box::new(Class::I32))));
        assert_eq!(TypeDesc::var("T").raw(), None);
    }

    #[test]
    fn reify_direct_parameter() {
        let holder = Class::record("Holder")
            .type_param("T")
            .field("item", TypeDesc::var("T"))
            .build();
        let out = reify(&TypeDesc::var("T"), &holder, &[Class::Str.into()]);
        assert_eq!(out, TypeDesc::Class(Class::Str));
    }

    #[test]
    fn reify_through_superclass_chain() {
        let base = Class::record("Base")
            .type_param("T")
            .field("memo", TypeDesc::var("T"))
            .build();
        let mid = Class::record("Mid")
            .type_param("U")
            .extends(TypeDesc::parameterized(
                base.clone(),
                [TypeDesc::var("U")],
            ))
            .build();
        let leaf = Class::record("Leaf")
            .extends(TypeDesc::parameterized(mid, [Class::I64.into()]))
            .build();

        // T is declared two levels up; U forwards the leaf's binding.
        let out = reify(&TypeDesc::var("T"), &leaf, &[]);
        assert_eq!(out, TypeDesc::Class(Class::I64));
    }

    #[test]
    fn reify_unresolved_variable_survives() {
        let plain = Class::record("Plain").build();
        let out = reify(&TypeDesc::var("Q"), &plain, &[]);
        assert_eq!(out, TypeDesc::var("Q"));
    }

    #[test]
    fn reify_is_identity_preserving() {
        let holder = Class::record("Holder").type_param("T").build();
        let unchanged = TypeDesc::parameterized(Class::List, [Class::Str.into()]);
        assert_eq!(reify(&unchanged, &holder, &[Class::I64.into()]), unchanged);

        let nested = TypeDesc::parameterized(Class::List, [TypeDesc::var("T")]);
        assert_eq!(
            reify(&nested, &holder, &[Class::Str.into()]),
            TypeDesc::parameterized(Class::List, [Class::Str.into()])
        );

        let arr = TypeDesc::array_of(TypeDesc::var("T"));
        assert_eq!(
            reify(&arr, &holder, &[Class::I8.into()]),
            TypeDesc::array_of(Class::I8)
        );
    }
}
