//! The dynamic value representation consumed by the operator runtime
//! library and the expression-tree compiler's constant folding.
//!
//! Design Notes section 9 re-architects the source's dynamic-binder
//! protocol (built for a runtime with `object`/reflection) as a tagged
//! variant over a closed set of kinds. Operators dispatch on the tag;
//! member/index access goes through a small per-kind v-table instead of
//! a reflective binder (see `operators::method_call`).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A type reference used by `-is`/`-isnot`/`-as`/`[T]` conversions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The synthetic "custom object" type used by `-is` to test whether a
    /// value is a wrapped dynamic object (see spec.md section 4.1, Is/IsNot/As).
    pub fn is_custom_object_marker(&self) -> bool {
        self.name.eq_ignore_ascii_case("PSCustomObject")
    }

    /// The wrapper type, which matches any wrapped value regardless of its
    /// underlying shape.
    pub fn is_wrapper_marker(&self) -> bool {
        self.name.eq_ignore_ascii_case("PSObject")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered key/value map, used for hashtable literals. `[ordered]` casts
/// preserve insertion order (backed by `indexmap`); unordered hashtable
/// literals still use `IndexMap` for simplicity but the compiler marks
/// them as "current-culture case-insensitive" in the lowering, not here.
pub type OrderedMap = IndexMap<String, Value>;

/// The tagged dynamic value. `Wrapped` carries an opaque payload supplied
/// by an external collaborator (e.g. a .NET-object stand-in, a custom
/// type instance) that the core never inspects directly — it only knows
/// how to route operators and member access to it.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Decimal(i128),
    Char(char),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Map(Rc<BTreeMap<String, Value>>),
    Ordered(Rc<OrderedMap>),
    ScriptBlock(Rc<str>),
    TypeRef(Rc<TypeRef>),
    Wrapped(Rc<dyn std::any::Any>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Rc::from(s.into().into_boxed_str()))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Rc::new(values))
    }

    /// PowerShell-style truthiness: `$null`, `0`, `0.0`, empty string,
    /// empty array/map, and `$false` are falsy; everything else is truthy.
    /// A non-empty array's truthiness is the truthiness of its last
    /// element when singular rules don't directly apply; we use the
    /// simpler and more common "non-empty array is truthy" rule here,
    /// matching `pipeline_result_to_bool` in spec.md section 6.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Double(d) => *d != 0.0,
            Value::Decimal(d) => *d != 0,
            Value::Char(c) => *c != '\0',
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Ordered(m) => !m.is_empty(),
            Value::ScriptBlock(_) | Value::TypeRef(_) | Value::Wrapped(_) => true,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Double(_) => "Double",
            Value::Decimal(_) => "Decimal",
            Value::Char(_) => "Char",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Ordered(_) => "Ordered",
            Value::ScriptBlock(_) => "ScriptBlock",
            Value::TypeRef(_) => "TypeRef",
            Value::Wrapped(_) => "Wrapped",
        }
    }

    /// True if this value, enumerated, yields elements (arrays) rather
    /// than being treated as a scalar by the operator runtime library.
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_elements(&self) -> Vec<Value> {
        match self {
            Value::Array(a) => a.as_ref().clone(),
            other => vec![other.clone()],
        }
    }

    /// Coerce to a string the way the format/join/split operators need:
    /// invariant-culture-ish `ToString()`. Collections are not coerced
    /// here (callers must iterate and coerce each element).
    pub fn to_coerced_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => if *b { "True".to_string() } else { "False".to_string() },
            Value::Int(i) => i.to_string(),
            Value::Double(d) => format!("{}", d),
            Value::Decimal(d) => d.to_string(),
            Value::Char(c) => c.to_string(),
            Value::String(s) => s.to_string(),
            Value::Array(a) => a
                .iter()
                .map(Value::to_coerced_string)
                .collect::<Vec<_>>()
                .join(" "),
            Value::Map(_) | Value::Ordered(_) => "System.Collections.Hashtable".to_string(),
            Value::ScriptBlock(s) => s.to_string(),
            Value::TypeRef(t) => t.to_string(),
            Value::Wrapped(_) => "<wrapped>".to_string(),
        }
    }

    /// Best-effort numeric coercion, used by arithmetic when the operand
    /// is not already a primitive numeric type.
    pub fn to_numeric(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            Value::Decimal(d) => Some(*d as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Char(c) => Some(*c as u32 as f64),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null => Some(0.0),
            _ => None,
        }
    }

    /// `IComparable`-style fallback ordering used by the comparison
    /// operators (§4.1) when neither side is a string or number pair.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (a, b) if a.to_numeric().is_some() && b.to_numeric().is_some() => {
                a.to_numeric().unwrap().partial_cmp(&b.to_numeric().unwrap())
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::ScriptBlock(a), Value::ScriptBlock(b)) => a == b,
            (Value::TypeRef(a), Value::TypeRef(b)) => a == b,
            _ if self.to_numeric().is_some() && other.to_numeric().is_some() => {
                self.to_numeric() == other.to_numeric()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_values() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn truthy_values() {
        assert!(Value::Int(1).is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(Value::array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn numeric_coercion_from_string() {
        assert_eq!(Value::string(" 42 ").to_numeric(), Some(42.0));
        assert_eq!(Value::string("abc").to_numeric(), None);
    }

    #[test]
    fn cross_type_numeric_equality() {
        assert_eq!(Value::Int(1), Value::Double(1.0));
    }

    #[test]
    fn array_join_coercion() {
        let v = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(v.to_coerced_string(), "1 2 3");
    }
}
