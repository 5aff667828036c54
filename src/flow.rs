//! Flow-control signals (spec.md section 4.2).
//!
//! A closed variant set, NOT normal errors — they must be distinguishable
//! at the type level from every other error kind because the compiler
//! (see `compiler::stmt`) generates catch clauses that rethrow them
//! unchanged. Modeled the way the teacher models `BreakError`/`ContinueError`/
//! `ReturnError`/`ExitError` in `interpreter/errors.rs`, folded into one
//! enum instead of the teacher's separate structs since every arm here
//! really does need to be matched as one closed family by callers (the
//! teacher's split exists because its arms have different unrelated
//! payloads; the spec explicitly calls this a single family).

use thiserror::Error;

use crate::value::Value;

/// The requesting processor identity for `StopUpstream`, opaque to the
/// core — it is only ever compared for identity by an external collaborator.
pub type ProcessorId = u64;

#[derive(Debug, Clone, Error)]
pub enum FlowSignal {
    #[error("break{}", label_suffix(.label))]
    Break { label: Option<String> },

    #[error("continue{}", label_suffix(.label))]
    Continue { label: Option<String> },

    #[error("return")]
    Return { value: Value },

    #[error("exit")]
    Exit { value: Value },

    /// Produced by external collaborators (the pipeline host); the core
    /// only propagates it, never constructs it from within the checker
    /// or compiler.
    #[error("pipeline stopped")]
    PipelineStopped,

    /// Produced by external collaborators; propagated unchanged.
    #[error("terminate")]
    Terminate,

    /// Produced by external collaborators; propagated unchanged.
    #[error("stop upstream")]
    StopUpstream { requesting_processor: ProcessorId },
}

fn label_suffix(label: &Option<String>) -> String {
    match label {
        Some(l) => format!(" :{}", l),
        None => String::new(),
    }
}

impl FlowSignal {
    /// Label matching per spec.md section 4.2: a label-less break/continue
    /// matches the innermost loop; a labelled signal matches the nearest
    /// enclosing loop whose label equals it case-insensitively.
    pub fn matches_loop_label(signal_label: &Option<String>, loop_label: Option<&str>) -> bool {
        match signal_label {
            None => true,
            Some(sig) => loop_label.map_or(false, |l| l.eq_ignore_ascii_case(sig)),
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, FlowSignal::Break { .. })
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, FlowSignal::Continue { .. })
    }

    /// True for every member of this family — used by the compiler to
    /// decide whether a generated catch clause must rethrow unconditionally
    /// rather than hand the exception to `check_action_preference`.
    pub fn is_flow_control(&self) -> bool {
        true
    }
}
