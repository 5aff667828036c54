//! `-match`/`-notmatch` (spec.md section 4.1). Right operand is a regex
//! (precompiled or compiled from string). For a scalar left, sets the
//! process-visible `$matches` hashtable on success; for an enumerable left,
//! filters and does not set `$matches`. Checks pipeline cancellation every
//! 1000 iterations.

use crate::context::{MatchesSink, PipelineCancellation};
use crate::errors::RuntimeError;
use crate::extent::SourceExtent;
use crate::flow::FlowSignal;
use crate::operators::cache::compile_cached;
use crate::value::{OrderedMap, Value};

const CANCELLATION_CHECK_INTERVAL: usize = 1000;

fn captures_to_map(caps: &regex_lite::Captures, pattern_names: &[Option<String>]) -> OrderedMap {
    let mut map = OrderedMap::new();
    for (i, m) in caps.iter().enumerate() {
        if let Some(m) = m {
            map.insert(i.to_string(), Value::string(m.as_str()));
        }
    }
    for name in pattern_names.iter().flatten() {
        if let Some(m) = caps.name(name) {
            map.insert(name.clone(), Value::string(m.as_str()));
        }
    }
    map
}

fn named_groups(pattern: &str) -> Vec<Option<String>> {
    // regex-lite doesn't expose capture-name introspection cheaply up
    // front; we re-derive named groups from the pattern text itself,
    // matching only the `(?P<name>` / `(?<name>` forms the rest of this
    // crate emits.
    let mut names = vec![];
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'(' && i + 2 < bytes.len() && bytes[i + 1] == b'?' {
            let rest = &pattern[i + 2..];
            let rest = rest.strip_prefix('P').unwrap_or(rest);
            if let Some(r) = rest.strip_prefix('<') {
                if let Some(end) = r.find('>') {
                    names.push(Some(r[..end].to_string()));
                }
            }
        }
        i += 1;
    }
    names
}

pub fn match_op(
    ctx: &mut (impl PipelineCancellation + MatchesSink),
    left: &Value,
    pattern: &str,
    ignore_case: bool,
    negate: bool,
    extent: &SourceExtent,
) -> Result<Value, RuntimeError> {
    let re = compile_cached(pattern, ignore_case)
        .map_err(|e| RuntimeError::new("InvalidMatchPattern", format!("invalid match pattern: {e}"), extent.clone()))?;
    let names = named_groups(pattern);

    if left.is_enumerable() {
        let mut out = vec![];
        for (i, elem) in left.as_elements().into_iter().enumerate() {
            if i % CANCELLATION_CHECK_INTERVAL == 0 && ctx.is_pipeline_stopping() {
                return Err(RuntimeError::new(
                    "PipelineStopped",
                    FlowSignal::PipelineStopped.to_string(),
                    extent.clone(),
                ));
            }
            let matched = re.is_match(&elem.to_coerced_string());
            if matched != negate {
                out.push(elem);
            }
        }
        return Ok(Value::array(out));
    }

    let s = left.to_coerced_string();
    match re.captures(&s) {
        Some(caps) => {
            if !negate {
                ctx.set_matches(captures_to_map(&caps, &names));
            }
            Ok(Value::Bool(!negate))
        }
        None => Ok(Value::Bool(negate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;

    fn ext() -> SourceExtent {
        SourceExtent::empty()
    }

    #[test]
    fn scalar_match_sets_matches_variable() {
        let mut ctx = ExecutionContext::new();
        let result = match_op(&mut ctx, &Value::string("abc123"), r"(\d+)", true, false, &ext()).unwrap();
        assert_eq!(result, Value::Bool(true));
        assert!(ctx.get_variable("matches").is_some());
    }

    #[test]
    fn notmatch_negates_and_does_not_set_matches() {
        let mut ctx = ExecutionContext::new();
        let result = match_op(&mut ctx, &Value::string("abc"), r"\d+", true, true, &ext()).unwrap();
        assert_eq!(result, Value::Bool(true));
        assert!(ctx.get_variable("matches").is_none());
    }

    #[test]
    fn enumerable_left_filters_without_setting_matches() {
        let mut ctx = ExecutionContext::new();
        let arr = Value::array(vec![Value::string("a1"), Value::string("bb")]);
        let result = match_op(&mut ctx, &arr, r"\d", true, false, &ext()).unwrap();
        assert_eq!(result, Value::array(vec![Value::string("a1")]));
        assert!(ctx.get_variable("matches").is_none());
    }

    #[test]
    fn pipeline_stopping_raises_during_enumerable_match() {
        let mut ctx = ExecutionContext::new();
        ctx.current_pipeline_stopping = true;
        let arr = Value::array(vec![Value::string("a")]);
        let result = match_op(&mut ctx, &arr, "a", true, false, &ext());
        assert!(result.is_err());
    }
}
