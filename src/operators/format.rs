//! `-f` (format, spec.md section 4.1). Applies a .NET-style `{index}`
//! format string to a string left operand and an enumerable right operand.

use crate::errors::RuntimeError;
use crate::extent::SourceExtent;
use crate::value::Value;

pub fn format(template: &str, args: &Value, extent: &SourceExtent) -> Result<Value, RuntimeError> {
    let args = args.as_elements();
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some('{')) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some('}')) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut spec = String::new();
                let mut closed = false;
                for c2 in chars.by_ref() {
                    if c2 == '}' {
                        closed = true;
                        break;
                    }
                    spec.push(c2);
                }
                if !closed {
                    return Err(RuntimeError::new("FormatError", "unclosed format item", extent.clone()));
                }
                let index_str = spec.split(',').next().unwrap_or(&spec).split(':').next().unwrap_or(&spec);
                let index: usize = index_str
                    .trim()
                    .parse()
                    .map_err(|_| RuntimeError::new("FormatError", format!("invalid format index '{index_str}'"), extent.clone()))?;
                let value = args
                    .get(index)
                    .ok_or_else(|| RuntimeError::new("FormatError", format!("index {index} out of range of the arguments"), extent.clone()))?;
                out.push_str(&value.to_coerced_string());
            }
            '}' => {
                return Err(RuntimeError::new("FormatError", "unmatched '}' in format string", extent.clone()));
            }
            _ => out.push(c),
        }
    }
    Ok(Value::string(out))
}
