//! `-replace` (spec.md section 4.1). Right operand is either a
//! regex+replacement pair, a single pattern (empty replacement), or a
//! precompiled regex.

use crate::errors::RuntimeError;
use crate::extent::SourceExtent;
use crate::operators::cache::compile_cached;
use crate::value::Value;

/// The right-hand-side tuple: `-replace "pattern"` or
/// `-replace "pattern","replacement"`. A longer tuple is a static mistake
/// the parser would have caught; reaching this function with one means the
/// evaluator built the AST wrong, so it fails loudly rather than silently
/// truncating.
pub fn replace(left: &Value, pattern: &str, replacement: Option<&str>, ignore_case: bool, extent: &SourceExtent) -> Result<Value, RuntimeError> {
    let re = compile_cached(pattern, ignore_case)
        .map_err(|e| RuntimeError::new("InvalidReplacePattern", format!("invalid replace pattern: {e}"), extent.clone()))?;
    let replacement = replacement.unwrap_or("");
    let replace_one = |s: &str| re.replace_all(s, translate_dotnet_replacement(replacement).as_str()).into_owned();

    if left.is_enumerable() {
        let out: Vec<Value> = left
            .as_elements()
            .iter()
            .map(|elem| Value::string(replace_one(&elem.to_coerced_string())))
            .collect();
        Ok(Value::array(out))
    } else {
        Ok(Value::string(replace_one(&left.to_coerced_string())))
    }
}

/// Translate `$1`-style .NET replacement group references to the `regex`
/// crate family's `${1}` syntax, leaving everything else untouched.
fn translate_dotnet_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
            let mut digits = String::new();
            while matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
                digits.push(chars.next().unwrap());
            }
            out.push_str(&format!("${{{digits}}}"));
        } else {
            out.push(c);
        }
    }
    out
}
