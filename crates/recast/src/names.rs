//! Property-name derivation.
//!
//! Declared member names (record fields, interface methods) carry an
//! escaping scheme so that keys containing `.`, `-`, `_` or `$` can be
//! expressed as identifiers. [`unmangle`] decodes a declared name into its
//! external key. Bean accessors use plain `get`/`is`/`set` prefix stripping
//! instead, and single-element annotations derive their key from the class
//! name itself.

/// Decode a declared member name into its external map key.
///
/// Escapes, longest match first: `$$` → `$`, `$_$` → `-`, a lone `$` is
/// dropped, `__` → `_`, and a lone `_` → `.`.
///
/// # Examples
///
/// ```
/// use recast::names::unmangle;
///
/// assert_eq!(unmangle("worker_pool_size"), "worker.pool.size");
/// assert_eq!(unmangle("my$$prop"), "my$prop");
/// assert_eq!(unmangle("six$_$middle"), "six-middle");
/// ```
pub fn unmangle(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '$' => {
                if chars.get(i + 1) == Some(&'$') {
                    out.push('$');
                    i += 2;
                } else if chars.get(i + 1) == Some(&'_') && chars.get(i + 2) == Some(&'$') {
                    out.push('-');
                    i += 3;
                } else {
                    // lone escape character, dropped
                    i += 1;
                }
            }
            '_' => {
                if chars.get(i + 1) == Some(&'_') {
                    out.push('_');
                    i += 2;
                } else {
                    out.push('.');
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Prepend a class's declared key prefix, when it has one.
pub fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) => format!("{p}{key}"),
        None => key.to_string(),
    }
}

/// Property name exposed by a bean accessor, or `None` when the method
/// name does not follow the `getFoo`/`isFoo` shape.
pub fn accessor_property(method: &str) -> Option<String> {
    let rest = method
        .strip_prefix("get")
        .or_else(|| method.strip_prefix("is"))?;
    decapitalize_leading(rest)
}

/// Property name targeted by a bean setter (`setFoo` → `foo`).
pub fn setter_property(method: &str) -> Option<String> {
    decapitalize_leading(method.strip_prefix("set")?)
}

fn decapitalize_leading(rest: &str) -> Option<String> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    let mut prop = String::with_capacity(rest.len());
    prop.extend(first.to_lowercase());
    prop.push_str(chars.as_str());
    Some(prop)
}

/// Key used for the `value` element of a single-element annotation,
/// derived from the class's simple name: a dot is inserted at every
/// lower-to-upper camel boundary and the whole name is lowercased
/// (`SomethingLong` → `something.long`).
pub fn single_element_key(simple_name: &str) -> String {
    let mut out = String::with_capacity(simple_name.len());
    let mut capital_seen = true;
    for c in simple_name.chars() {
        if capital_seen {
            if c.is_lowercase() {
                capital_seen = false;
            }
        } else if c.is_uppercase() {
            capital_seen = true;
            out.push('.');
        }
        out.extend(c.to_lowercase());
    }
    out
}
