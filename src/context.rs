//! External-interface stubs (spec.md section 6). The core consumes these
//! through small traits rather than owning them — the real execution
//! context, debugger, and pipeline host live in the evaluator/host process,
//! both explicitly out of scope (spec.md section 1). What's here is just
//! enough surface for the operator runtime library and compiler to compile
//! and be testable against a fake.

use std::collections::HashMap;

use crate::flow::FlowSignal;
use crate::value::{OrderedMap, Value};

/// Consulted by every `move_next`/loop-body iteration and every 1000
/// elements during `-match` filtering (spec.md sections 4.1, 5).
pub trait PipelineCancellation {
    fn is_pipeline_stopping(&self) -> bool;

    fn check_for_interrupts(&self) -> Result<(), FlowSignal> {
        if self.is_pipeline_stopping() {
            Err(FlowSignal::PipelineStopped)
        } else {
            Ok(())
        }
    }
}

/// Where `-match`/`-notmatch` write the process-visible `$matches`
/// hashtable on a successful scalar match (spec.md section 4.1).
pub trait MatchesSink {
    fn set_matches(&mut self, matches: OrderedMap);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMode {
    FullLanguage,
    RestrictedLanguage,
    ConstrainedLanguage,
    NoLanguage,
}

/// Holds language-mode, debugger handle, current pipe, `$?`, and
/// exception-being-handled (spec.md section 3, "Execution context
/// (external)"). The core consumes it through `PipelineCancellation` and
/// `MatchesSink`; it does not own it — a real host's execution context
/// would carry far more (session state, type table, engine intrinsics)
/// that the core never touches directly.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub language_mode: LanguageMode,
    pub debugging_mode: bool,
    pub current_pipeline_stopping: bool,
    pub current_exception_being_handled: Option<Value>,
    pub question_mark_variable_value: bool,
    variables: HashMap<String, Value>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            language_mode: LanguageMode::FullLanguage,
            debugging_mode: false,
            current_pipeline_stopping: false,
            current_exception_being_handled: None,
            question_mark_variable_value: true,
            variables: HashMap::new(),
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Save/restore the language mode, used by the `data` statement's
    /// lowering (spec.md section 4.6.1) to enter "restricted" for the
    /// duration of the body and restore it in a `finally`.
    pub fn enter_language_mode(&mut self, mode: LanguageMode) -> LanguageMode {
        std::mem::replace(&mut self.language_mode, mode)
    }

    pub fn restore_language_mode(&mut self, saved: LanguageMode) {
        self.language_mode = saved;
    }

    pub fn on_sequence_point_hit(&self, _function_context: &FunctionContext) {
        // A real host forwards this to `debugger.on_sequence_point_hit`
        // only when `debugging_mode` is set; there is no debugger here.
    }
}

impl PipelineCancellation for ExecutionContext {
    fn is_pipeline_stopping(&self) -> bool {
        self.current_pipeline_stopping
    }
}

impl MatchesSink for ExecutionContext {
    fn set_matches(&mut self, matches: OrderedMap) {
        self.variables.insert("matches".to_string(), Value::Ordered(std::rc::Rc::new(matches)));
    }
}

/// `add(obj)`, `set_variable_list_for_temporary_pipe`, `null_pipe?`
/// (spec.md section 6).
#[derive(Debug, Clone, Default)]
pub struct Pipe {
    items: Vec<Value>,
    pub null_pipe: bool,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn null() -> Self {
        Self { items: Vec::new(), null_pipe: true }
    }

    pub fn add(&mut self, obj: Value) {
        if !self.null_pipe {
            self.items.push(obj);
        }
    }

    pub fn set_variable_list_for_temporary_pipe(&mut self, other: &Pipe) {
        self.items = other.items.clone();
    }

    pub fn take(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.items)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

/// Per-invocation record threaded through every compiled entry point
/// (spec.md section 3, "Function context").
#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub file: Option<String>,
    pub sequence_points: Vec<crate::extent::SourceExtent>,
    pub current_sequence_point_index: usize,
    pub output_pipe: Pipe,
    pub locals: crate::variable::LocalTuple,
    pub trap_stack: Vec<TrapFrame>,
    pub function_name: String,
}

/// One entry of the trap stack pushed by a statement block on entry and
/// popped on exit (spec.md section 4.6.1, Trap lowering).
#[derive(Debug, Clone)]
pub struct TrapFrame {
    pub trap_types: Vec<Option<String>>,
}

impl FunctionContext {
    pub fn new(function_name: impl Into<String>, locals: crate::variable::LocalTuple) -> Self {
        Self {
            file: None,
            sequence_points: Vec::new(),
            current_sequence_point_index: 0,
            output_pipe: Pipe::new(),
            locals,
            trap_stack: Vec::new(),
            function_name: function_name.into(),
        }
    }

    pub fn advance_sequence_point(&mut self, index: usize) {
        self.current_sequence_point_index = index;
    }

    pub fn push_trap_frame(&mut self, frame: TrapFrame) {
        self.trap_stack.push(frame);
    }

    pub fn pop_trap_frame(&mut self) -> Option<TrapFrame> {
        self.trap_stack.pop()
    }
}

/// Dynamic call-site binders (spec.md section 6). Each binder resolves an
/// operation's implementation for a given operand shape once and is
/// expected to be cached by the call site that owns it (the inline-cache
/// behavior lives in `compiler::callsite`, not here) — this trait is the
/// seam the compiler's lowered IR calls through at evaluation time.
pub trait Binder {
    /// A short, stable string identifying this binder's operation kind and
    /// parameters — used as the inline-cache key.
    fn site_key(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_stopping_raises_pipeline_stopped() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.check_for_interrupts().is_ok());
        ctx.current_pipeline_stopping = true;
        assert!(matches!(ctx.check_for_interrupts(), Err(FlowSignal::PipelineStopped)));
    }

    #[test]
    fn set_matches_is_readable_back_as_a_variable() {
        let mut ctx = ExecutionContext::new();
        let mut map = OrderedMap::new();
        map.insert("0".to_string(), Value::string("hi"));
        ctx.set_matches(map);
        assert!(matches!(ctx.get_variable("matches"), Some(Value::Ordered(_))));
    }

    #[test]
    fn language_mode_save_restore() {
        let mut ctx = ExecutionContext::new();
        let saved = ctx.enter_language_mode(LanguageMode::RestrictedLanguage);
        assert_eq!(ctx.language_mode, LanguageMode::RestrictedLanguage);
        ctx.restore_language_mode(saved);
        assert_eq!(ctx.language_mode, LanguageMode::FullLanguage);
    }

    #[test]
    fn null_pipe_discards_writes() {
        let mut pipe = Pipe::null();
        pipe.add(Value::Int(1));
        assert!(pipe.as_slice().is_empty());
    }
}
