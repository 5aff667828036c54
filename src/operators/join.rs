//! `-join` (spec.md section 4.1). Enumerable left operand coerced to
//! strings and concatenated with the separator; unary join uses an empty
//! separator.

use crate::value::Value;

pub fn join(left: &Value, separator: &str) -> Value {
    let joined = left
        .as_elements()
        .iter()
        .map(Value::to_coerced_string)
        .collect::<Vec<_>>()
        .join(separator);
    Value::string(joined)
}

pub fn join_unary(left: &Value) -> Value {
    join(left, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_separator() {
        let v = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(join(&v, ","), Value::string("1,2,3"));
    }

    #[test]
    fn scalar_left_operand_is_just_its_string_form() {
        assert_eq!(join(&Value::Int(5), ","), Value::string("5"));
    }

    #[test]
    fn unary_join_uses_empty_separator() {
        let v = Value::array(vec![Value::string("a"), Value::string("b")]);
        assert_eq!(join_unary(&v), Value::string("ab"));
    }

    #[test]
    fn round_trips_with_split_when_separator_matches_nowhere_else() {
        let original = Value::string("a,b,c");
        let parts = crate::operators::split::split_pattern(
            &original,
            ",",
            crate::operators::split::SplitOptions::default(),
            -1,
            &crate::extent::SourceExtent::empty(),
        )
        .unwrap();
        assert_eq!(join(&parts, ","), original);
    }
}
