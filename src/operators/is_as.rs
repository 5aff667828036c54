//! `-is`/`-isnot`/`-as` (spec.md section 4.1). The right operand must
//! resolve to a type descriptor; special cases for the synthetic "custom
//! object" type and the "wrapper" type that matches any wrapped value.

use crate::errors::RuntimeError;
use crate::extent::SourceExtent;
use crate::value::{TypeRef, Value};

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "Null",
        Value::Bool(_) => "System.Boolean",
        Value::Int(_) => "System.Int64",
        Value::Double(_) => "System.Double",
        Value::Decimal(_) => "System.Decimal",
        Value::Char(_) => "System.Char",
        Value::String(_) => "System.String",
        Value::Array(_) => "System.Object[]",
        Value::Map(_) => "System.Collections.Hashtable",
        Value::Ordered(_) => "System.Collections.Specialized.OrderedDictionary",
        Value::ScriptBlock(_) => "System.Management.Automation.ScriptBlock",
        Value::TypeRef(_) => "System.Type",
        Value::Wrapped(_) => "System.Management.Automation.PSObject",
    }
}

/// `left -is [TypeName]`. `right` must already have been resolved to a
/// `TypeRef` by the compiler/checker; if it wasn't, that's a runtime error
/// ("right operand must be a type"), not a silent `false`.
pub fn is_type(left: &Value, right: &Value, extent: &SourceExtent) -> Result<bool, RuntimeError> {
    let ty = as_type_ref(right, extent)?;
    if ty.is_wrapper_marker() {
        return Ok(matches!(left, Value::Wrapped(_)));
    }
    if ty.is_custom_object_marker() {
        return Ok(matches!(left, Value::Wrapped(_)));
    }
    Ok(value_type_name(left).eq_ignore_ascii_case(&ty.name))
}

pub fn is_not_type(left: &Value, right: &Value, extent: &SourceExtent) -> Result<bool, RuntimeError> {
    is_type(left, right, extent).map(|b| !b)
}

fn as_type_ref<'a>(v: &'a Value, extent: &SourceExtent) -> Result<&'a TypeRef, RuntimeError> {
    match v {
        Value::TypeRef(t) => Ok(t),
        _ => Err(RuntimeError::new(
            "InvalidCastParseTypeNotDefined",
            "right operand must be a type",
            extent.clone(),
        )),
    }
}

/// `left -as [TypeName]`: a best-effort conversion, always lowered to this
/// runtime helper (never a direct instruction — spec.md section 4.6).
/// Returns `Value::Null` on failed conversion rather than erroring, per the
/// operator's documented "best effort, no throw" contract.
pub fn as_type(left: &Value, right: &Value, extent: &SourceExtent) -> Result<Value, RuntimeError> {
    let ty = as_type_ref(right, extent)?;
    let name = ty.name.to_ascii_lowercase();
    Ok(match name.as_str() {
        "int" | "int32" | "int64" | "system.int64" | "system.int32" => {
            left.to_numeric().map(|n| Value::Int(n as i64)).unwrap_or(Value::Null)
        }
        "double" | "system.double" => left.to_numeric().map(Value::Double).unwrap_or(Value::Null),
        "string" | "system.string" => Value::string(left.to_coerced_string()),
        "bool" | "boolean" | "system.boolean" => Value::Bool(left.is_truthy()),
        "char" | "system.char" => left.to_coerced_string().chars().next().map(Value::Char).unwrap_or(Value::Null),
        _ => Value::Null,
    })
}
