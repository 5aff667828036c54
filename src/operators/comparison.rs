//! Comparison operators (spec.md section 4.1): `eq/ne/ge/gt/le/lt`, each
//! with an "ignore case" variant. If the left operand is enumerable, the
//! comparison maps across it and returns the filtered sequence; otherwise
//! it returns a boolean.

use std::cmp::Ordering;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

fn scalar_compare(op: CompareOp, left: &Value, right: &Value, ignore_case: bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        let ord = if ignore_case {
            a.to_lowercase().cmp(&b.to_lowercase())
        } else {
            a.as_ref().cmp(b.as_ref())
        };
        return match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Ge => ord != Ordering::Less,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Lt => ord == Ordering::Less,
        };
    }
    match op {
        CompareOp::Eq => left == right,
        CompareOp::Ne => left != right,
        _ => match left.partial_compare(right) {
            Some(ord) => match op {
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            },
            // `IComparable`-style fallback: incomparable types are never
            // ordered-equal under `gt`/`lt`/etc, matching the source's
            // behavior of throwing only for `[Is]`-style casts, not plain
            // comparisons — here we simply report "false".
            None => false,
        },
    }
}

/// `eq/ne/ge/gt/le/lt` with the configured case-sensitivity. If `left` is
/// enumerable, returns the filtered sub-sequence of elements that satisfy
/// the comparison against `right`; otherwise returns a boolean.
pub fn compare(op: CompareOp, left: &Value, right: &Value, ignore_case: bool) -> Value {
    if left.is_enumerable() {
        let filtered: Vec<Value> = left
            .as_elements()
            .into_iter()
            .filter(|elem| scalar_compare(op, elem, right, ignore_case))
            .collect();
        return Value::array(filtered);
    }
    Value::Bool(scalar_compare(op, left, right, ignore_case))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_string_equality_is_case_sensitive_by_default_flag() {
        let a = Value::string("ABC");
        let b = Value::string("abc");
        assert_eq!(compare(CompareOp::Eq, &a, &b, false), Value::Bool(false));
        assert_eq!(compare(CompareOp::Eq, &a, &b, true), Value::Bool(true));
    }

    #[test]
    fn numeric_ordering() {
        assert_eq!(compare(CompareOp::Lt, &Value::Int(1), &Value::Int(2), true), Value::Bool(true));
        assert_eq!(compare(CompareOp::Gt, &Value::Int(1), &Value::Int(2), true), Value::Bool(false));
    }

    #[test]
    fn enumerable_left_operand_maps_and_filters() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = compare(CompareOp::Gt, &arr, &Value::Int(1), true);
        assert_eq!(result, Value::array(vec![Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn incomparable_types_report_false_for_ordering_ops() {
        let result = compare(CompareOp::Gt, &Value::string("x"), &Value::array(vec![]), true);
        assert_eq!(result, Value::Bool(false));
    }
}
