//! `-like`/`-notlike` (spec.md section 4.1). Right operand coerced to a
//! wildcard pattern; returns boolean for scalar left, filtered enumerable
//! otherwise; `notlike` negates the per-element test.

use crate::operators::cache::compile_cached;
use crate::operators::wildcard::wildcard_to_regex;
use crate::value::Value;

pub fn like(left: &Value, pattern: &str, ignore_case: bool, negate: bool) -> Value {
    let regex_pattern = wildcard_to_regex(pattern);
    let re = compile_cached(&regex_pattern, ignore_case).expect("wildcard-derived pattern is always valid regex");
    let test = |v: &Value| {
        let matched = re.is_match(&v.to_coerced_string());
        if negate {
            !matched
        } else {
            matched
        }
    };
    if left.is_enumerable() {
        Value::array(left.as_elements().into_iter().filter(|v| test(v)).collect())
    } else {
        Value::Bool(test(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_like_returns_bool() {
        assert_eq!(like(&Value::string("hello"), "h*o", true, false), Value::Bool(true));
        assert_eq!(like(&Value::string("hello"), "x*o", true, false), Value::Bool(false));
    }

    #[test]
    fn notlike_negates() {
        assert_eq!(like(&Value::string("hello"), "h*o", true, true), Value::Bool(false));
    }

    #[test]
    fn enumerable_left_filters() {
        let arr = Value::array(vec![Value::string("cat"), Value::string("car"), Value::string("dog")]);
        let result = like(&arr, "ca*", true, false);
        assert_eq!(result, Value::array(vec![Value::string("cat"), Value::string("car")]));
    }
}
