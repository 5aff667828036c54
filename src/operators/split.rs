//! `-split` (spec.md section 4.1). The most parameter-heavy operator in the
//! runtime library: simple-vs-regex matching, a predicate mode, a limit,
//! and a handful of regex option flags.

use crate::errors::RuntimeError;
use crate::extent::SourceExtent;
use crate::operators::cache::compile_cached;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOptions {
    pub simple_match: bool,
    pub regex_match: bool,
    pub ignore_pattern_whitespace: bool,
    pub multiline: bool,
    pub singleline: bool,
    pub ignore_case: bool,
    pub explicit_capture: bool,
}

impl SplitOptions {
    /// Validates the flag-combination rules from spec.md section 4.1,
    /// reported as `ParseError`s (flag combinations are a static mistake,
    /// not a runtime one).
    pub fn validate(&self, extent: &SourceExtent) -> Result<(), crate::errors::ParseError> {
        if self.simple_match && self.regex_match {
            return Err(crate::errors::ParseError::new(
                "'simplematch' and 'regexmatch' cannot both be specified",
                extent.clone(),
            ));
        }
        if self.simple_match && (self.ignore_pattern_whitespace || self.multiline || self.singleline || self.explicit_capture) {
            return Err(crate::errors::ParseError::new(
                "only 'ignorecase' may be combined with 'simplematch'",
                extent.clone(),
            ));
        }
        if self.multiline && self.singleline {
            return Err(crate::errors::ParseError::new(
                "'multiline' and 'singleline' cannot both be specified",
                extent.clone(),
            ));
        }
        Ok(())
    }
}

fn build_pattern(pattern: &str, opts: &SplitOptions) -> String {
    let mut prefix = String::new();
    if opts.ignore_pattern_whitespace {
        prefix.push('x');
    }
    if opts.multiline {
        prefix.push('m');
    }
    if opts.singleline {
        prefix.push('s');
    }
    let body = if opts.simple_match { regex_lite::escape(pattern) } else { pattern.to_string() };
    if prefix.is_empty() {
        body
    } else {
        format!("(?{prefix}){body}")
    }
}

fn split_one(s: &str, pattern: &str, opts: &SplitOptions, limit: i64, extent: &SourceExtent) -> Result<Vec<Value>, RuntimeError> {
    let full_pattern = build_pattern(pattern, opts);
    let re = compile_cached(&full_pattern, opts.ignore_case)
        .map_err(|e| RuntimeError::new("InvalidSplitPattern", format!("invalid split pattern: {e}"), extent.clone()))?;
    let effective_limit = if limit <= 0 { usize::MAX } else { limit as usize };
    if effective_limit == 0 {
        return Ok(vec![]);
    }
    let parts: Vec<&str> = re.splitn(s, effective_limit).collect();
    Ok(parts.into_iter().map(Value::string).collect())
}

/// Split with a pattern (string or precompiled). A limit ≤ 0 means "no
/// limit". Fails with a runtime-error-kind on invalid regex.
pub fn split_pattern(left: &Value, pattern: &str, opts: SplitOptions, limit: i64, extent: &SourceExtent) -> Result<Value, RuntimeError> {
    opts.validate(extent).map_err(|e| RuntimeError::new("ParseError", e.message, e.extent))?;
    let mut out = vec![];
    for elem in left.as_elements() {
        let s = elem.to_coerced_string();
        out.extend(split_one(&s, pattern, &opts, limit, extent)?);
    }
    Ok(Value::array(out))
}

/// Split using a character predicate: iterate characters, accumulate into a
/// buffer, split when the predicate returns true; enforce `limit` by
/// emitting a final tail once one slot remains.
pub fn split_predicate(s: &str, limit: i64, predicate: impl Fn(char) -> bool) -> Vec<String> {
    let effective_limit = if limit <= 0 { usize::MAX } else { limit as usize };
    if effective_limit == 0 {
        return vec![];
    }
    let mut out = vec![];
    let mut buf = String::new();
    for c in s.chars() {
        if out.len() + 1 >= effective_limit {
            buf.push(c);
            continue;
        }
        if predicate(c) {
            out.push(std::mem::take(&mut buf));
        } else {
            buf.push(c);
        }
    }
    out.push(buf);
    out
}

/// Unary `-split $x`: splits on `\s+` and trims element whitespace.
pub fn split_unary(left: &Value) -> Value {
    let mut out = vec![];
    for elem in left.as_elements() {
        let s = elem.to_coerced_string();
        for part in s.split_whitespace() {
            out.push(Value::string(part));
        }
    }
    Value::array(out)
}
