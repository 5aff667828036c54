//! Enumeration helpers (spec.md section 4.1): `move_next`/`current` wrap
//! underlying iterator calls, re-raising flow-control and pipeline-stopped
//! signals unchanged and wrapping everything else into a "bad enumeration"
//! runtime error.

use crate::context::PipelineCancellation;
use crate::errors::{EngineError, RuntimeError};
use crate::extent::SourceExtent;
use crate::flow::FlowSignal;
use crate::value::Value;

/// A minimal enumerator abstraction: whatever the lowered `foreach`/`for`
/// loop iterates (a range, an array, a dynamic enumerable returned by a
/// method invocation). Real enumerables live behind binders in the
/// compiler/evaluator; this trait is the seam the enumeration helpers below
/// operate through.
pub trait Enumerator {
    /// Advance to the next element. `Ok(false)` means the sequence is
    /// exhausted.
    fn advance(&mut self) -> Result<bool, EngineError>;
    fn current(&self) -> Value;
}

/// `move_next(ctx, extent, iter)`. Checks `ctx.is_pipeline_stopping()` on
/// every call and raises `PipelineStopped` if set; re-raises flow-control
/// and pipeline-stopped errors from the underlying call unchanged (as
/// themselves, via `EngineError`); wraps everything else as a
/// `BadEnumeration` runtime error with the original as its message.
pub fn move_next(ctx: &impl PipelineCancellation, extent: &SourceExtent, iter: &mut dyn Enumerator) -> Result<bool, EngineError> {
    if ctx.is_pipeline_stopping() {
        return Err(FlowSignal::PipelineStopped.into());
    }
    iter.advance().map_err(|e| wrap_enumeration_error(e, extent))
}

pub fn current(extent: &SourceExtent, iter: &dyn Enumerator) -> Value {
    let _ = extent;
    iter.current()
}

/// Only flow-control and pipeline-stopped signals pass through unchanged
/// here; a plain `RuntimeError` from the underlying enumerator still gets
/// re-wrapped as `BadEnumeration` with the original as cause (spec.md
/// section 4.1 names exactly these two kinds as the pass-through set for
/// this helper, narrower than the operator library's general contract).
fn wrap_enumeration_error(e: EngineError, extent: &SourceExtent) -> EngineError {
    match e {
        EngineError::Flow(_) | EngineError::PipelineStopped(_) => e,
        other => RuntimeError::new("BadEnumeration", format!("bad enumeration: {other}"), extent.clone()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;

    struct VecEnumerator {
        items: Vec<Value>,
        index: usize,
        started: bool,
    }

    impl Enumerator for VecEnumerator {
        fn advance(&mut self) -> Result<bool, EngineError> {
            if self.started {
                self.index += 1;
            }
            self.started = true;
            Ok(self.index < self.items.len())
        }
        fn current(&self) -> Value {
            self.items[self.index].clone()
        }
    }

    struct FailingEnumerator;
    impl Enumerator for FailingEnumerator {
        fn advance(&mut self) -> Result<bool, EngineError> {
            Err(crate::errors::RuntimeError::new("X", "boom", SourceExtent::empty()).into())
        }
        fn current(&self) -> Value {
            Value::Null
        }
    }

    struct BreakingEnumerator;
    impl Enumerator for BreakingEnumerator {
        fn advance(&mut self) -> Result<bool, EngineError> {
            Err(FlowSignal::Break { label: None }.into())
        }
        fn current(&self) -> Value {
            Value::Null
        }
    }

    #[test]
    fn move_next_walks_the_whole_sequence() {
        let ctx = ExecutionContext::new();
        let mut it = VecEnumerator { items: vec![Value::Int(1), Value::Int(2)], index: 0, started: false };
        let ext = SourceExtent::empty();
        assert!(move_next(&ctx, &ext, &mut it).unwrap());
        assert_eq!(current(&ext, &it), Value::Int(1));
        assert!(move_next(&ctx, &ext, &mut it).unwrap());
        assert_eq!(current(&ext, &it), Value::Int(2));
        assert!(!move_next(&ctx, &ext, &mut it).unwrap());
    }

    #[test]
    fn move_next_raises_pipeline_stopped_when_flagged() {
        let mut ctx = ExecutionContext::new();
        ctx.current_pipeline_stopping = true;
        let mut it = VecEnumerator { items: vec![], index: 0, started: false };
        let ext = SourceExtent::empty();
        assert!(matches!(
            move_next(&ctx, &ext, &mut it),
            Err(EngineError::Flow(FlowSignal::PipelineStopped))
        ));
    }

    #[test]
    fn underlying_failure_is_wrapped_as_bad_enumeration() {
        let ctx = ExecutionContext::new();
        let mut it = FailingEnumerator;
        let ext = SourceExtent::empty();
        match move_next(&ctx, &ext, &mut it) {
            Err(EngineError::Runtime(r)) => assert_eq!(r.error_id, "BadEnumeration"),
            other => panic!("expected wrapped runtime error, got {other:?}"),
        }
    }

    #[test]
    fn flow_control_from_the_enumerator_passes_through_unchanged() {
        let ctx = ExecutionContext::new();
        let mut it = BreakingEnumerator;
        let ext = SourceExtent::empty();
        assert!(matches!(move_next(&ctx, &ext, &mut it), Err(EngineError::Flow(f)) if f.is_break()));
    }
}
