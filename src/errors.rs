//! Error taxonomy (spec.md section 7).
//!
//! Mirrors the teacher's `interpreter/errors.rs` shape — one struct per
//! error kind, folded into a unified enum via `thiserror` + `From` impls —
//! but swaps the teacher's hand-written `Display`/`Error` impls for
//! `thiserror::Error` derives, matching the idiom the pack's other
//! `thiserror`-using crate (`lisp-llm-sandbox`) already uses.

use thiserror::Error;

use crate::extent::SourceExtent;

/// A dynamic failure during evaluation. Carries message, error-id, and the
/// offending extent; `target_object` is opaque to the core.
#[derive(Debug, Clone, Error)]
#[error("{error_id}: {message}")]
pub struct RuntimeError {
    pub message: String,
    pub error_id: String,
    pub extent: SourceExtent,
}

impl RuntimeError {
    pub fn new(error_id: impl Into<String>, message: impl Into<String>, extent: SourceExtent) -> Self {
        Self {
            message: message.into(),
            error_id: error_id.into(),
            extent,
        }
    }
}

/// A sub-kind of `RuntimeError` used for wrapping method-body exceptions,
/// per the method-call contract in spec.md section 4.1.
#[derive(Debug, Clone, Error)]
#[error("MethodInvocationException: {inner}")]
pub struct MethodInvocationError {
    pub inner: Box<RuntimeError>,
}

/// Thrown by the evaluator when the call stack grows past its limit;
/// the core only re-raises it, never constructs or inspects it further.
#[derive(Debug, Clone, Error)]
#[error("script call depth exceeded")]
pub struct ScriptCallDepthError;

/// A user source-level mistake caught statically. Never unwinds; it is
/// accumulated into the parser's diagnostic bag (see `diagnostics`).
#[derive(Debug, Clone, Error)]
#[error("parse error at {extent}: {message}")]
pub struct ParseError {
    pub message: String,
    pub extent: SourceExtent,
    /// A parse error sub-kind: the input is syntactically unfinished
    /// (e.g. an unterminated string or unclosed brace at EOF).
    pub incomplete: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>, extent: SourceExtent) -> Self {
        Self {
            message: message.into(),
            extent,
            incomplete: false,
        }
    }

    pub fn incomplete(message: impl Into<String>, extent: SourceExtent) -> Self {
        Self {
            message: message.into(),
            extent,
            incomplete: true,
        }
    }
}

/// Cancellation signal re-raised wherever the execution context's
/// `current_pipeline_stopping` flag is observed set.
#[derive(Debug, Clone, Copy, Error)]
#[error("pipeline stopped")]
pub struct PipelineStoppedError;

/// The unified error enum consumed by code outside the operator-runtime
/// and compiler layers (e.g. tests exercising end-to-end behavior).
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    MethodInvocation(#[from] MethodInvocationError),
    #[error(transparent)]
    ScriptCallDepth(#[from] ScriptCallDepthError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    PipelineStopped(#[from] PipelineStoppedError),
    #[error(transparent)]
    Flow(#[from] crate::flow::FlowSignal),
}

impl EngineError {
    /// Flow-control, pipeline-stopped, call-depth, and runtime-error kinds
    /// pass through unmodified wherever the operator runtime library
    /// catches a downstream failure (spec.md section 4.1/7); everything
    /// else gets wrapped with the call-site extent as the new cause.
    pub fn passes_through_unwrapped(&self) -> bool {
        matches!(
            self,
            EngineError::Flow(_)
                | EngineError::PipelineStopped(_)
                | EngineError::ScriptCallDepth(_)
                | EngineError::Runtime(_)
        )
    }

    /// Wrap an arbitrary error into a `RuntimeError` with the given id and
    /// call-site extent, unless it already passes through unwrapped.
    pub fn wrap_or_pass(self, error_id: &str, extent: SourceExtent) -> EngineError {
        if self.passes_through_unwrapped() {
            self
        } else {
            EngineError::Runtime(RuntimeError::new(error_id, self.to_string(), extent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowSignal;

    #[test]
    fn flow_passes_through_unwrapped() {
        let e: EngineError = FlowSignal::Break { label: None }.into();
        assert!(e.passes_through_unwrapped());
    }

    #[test]
    fn runtime_error_passes_through_unwrapped() {
        let e: EngineError = RuntimeError::new("X", "boom", SourceExtent::empty()).into();
        assert!(e.passes_through_unwrapped());
    }

    #[test]
    fn parse_error_display_includes_message() {
        let e = ParseError::new("unexpected token", SourceExtent::empty());
        assert!(e.to_string().contains("unexpected token"));
    }
}
