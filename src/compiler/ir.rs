//! The lowered intermediate representation the expression-tree compiler
//! (spec.md section 4.6) produces: `Lowered` for expressions, `LoweredStmt`/
//! `LoweredBlock` for statement lists, and `CompiledScriptBlock` for the
//! whole script-block's `dynamic_param`/`begin`/`process`/`end` entry
//! points. This is the "executable intermediate form suitable for a light
//! interpreter or JIT" spec.md section 2 describes; the interpreter/JIT
//! itself is the external evaluator collaborator (spec.md section 1) and
//! is not implemented here — this module only shapes what it would walk.

use crate::ast::token::TokenKind;
use crate::extent::SourceExtent;
use crate::operators::CompareOp;
use crate::parameters::ParameterDescriptor;
use crate::value::Value;
use crate::variable::{TupleLayout, VariablePath};

use super::callsite::CallSiteId;

/// The "assignable value" protocol (spec.md section 4.6.1): every
/// assignment target lowers to one of these rather than a plain `Lowered`
/// expression, so the statement lowering can produce a matched get/set
/// pair without re-deriving the target's shape.
#[derive(Debug, Clone)]
pub enum Assignable {
    Local(usize),
    DynamicVariable(VariablePath),
    /// `target.name = rhs` — a dynamic set-member call site.
    Member { target: Box<Lowered>, name: Box<Lowered>, site: CallSiteId },
    /// `target[index] = rhs` — a dynamic set-index call site.
    Index { target: Box<Lowered>, index: Box<Lowered>, site: CallSiteId },
    /// Nested multiple-assignment target, `(a, b) = ...`.
    Tuple(Vec<Assignable>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    While,
    DoWhile,
    DoUntil,
}

/// One entry of the compiler's nesting stack of break/continue-catching
/// constructs (spec.md section 4.2: label matching walks "the nearest
/// enclosing loop"; spec.md section 4.6.1, Switch: a plain `break` also
/// exits the nearest enclosing `switch`). A `Switch` scope never yields a
/// direct goto target — PowerShell's switch has no loop-style continuation
/// point of its own, so `break` out of one always lowers to `BreakThrow`
/// and `continue` passes transparently through it to the next enclosing
/// loop.
#[derive(Debug, Clone)]
pub enum BreakableScope {
    Loop(LoopTarget),
    Switch(Option<String>),
}

/// A per-loop marker recording whether the generated gotos have a
/// compile-time-resolvable target (spec.md section 4.6.1, Break/continue:
/// "If the label is a compile-time string and a matching loop target is in
/// the current generator's target stack, emit a direct goto").
#[derive(Debug, Clone)]
pub struct LoopTarget {
    pub label: Option<String>,
    pub continue_target: usize,
    pub break_target: usize,
}

#[derive(Debug, Clone)]
pub enum Lowered {
    Constant(Value),

    /// A direct tuple-slot read/write — the fast path variable analysis
    /// produces when a variable is not "forced dynamic" (spec.md section 3).
    LocalGet(usize),
    LocalSet(usize, Box<Lowered>),

    /// The slow path: lookup through the runtime variable table, used for
    /// forced-dynamic locals and any scope-qualified path (`$script:x`,
    /// `$global:x`, `$env:x`, ...).
    DynamicVariableGet(VariablePath),
    DynamicVariableSet(VariablePath, Box<Lowered>),

    /// Primitive floating-point arithmetic lowers to a direct instruction
    /// node rather than a call site (spec.md section 4.6: "Arithmetic on
    /// primitive floating-point types uses direct instruction nodes").
    DirectArithmetic { op: TokenKind, left: Box<Lowered>, right: Box<Lowered>, extent: SourceExtent },

    /// Everything else routes through a dynamic-binary-operation call site
    /// "whose binder encapsulates the operator and culture/case-sensitivity
    /// flags" (spec.md section 4.6).
    DynamicBinaryOp { site: CallSiteId, op: TokenKind, left: Box<Lowered>, right: Box<Lowered>, extent: SourceExtent },

    ShortCircuitAnd(Box<Lowered>, Box<Lowered>),
    ShortCircuitOr(Box<Lowered>, Box<Lowered>),

    /// `eq/ne/ge/gt/le/lt` (and their `i`/`c` variants) lower to a direct
    /// comparison-helper call, not a call site — the comparison operators
    /// aren't overloadable per spec.md section 4.1/4.6, only culture/case
    /// parametrized.
    Compare { op: CompareOp, ignore_case: bool, left: Box<Lowered>, right: Box<Lowered> },

    RangeConstruct { lo: Box<Lowered>, hi: Box<Lowered> },

    /// `-is`/`-isnot` against a constant type name lower directly; a
    /// non-constant right side needs the runtime helper instead (spec.md
    /// section 4.6: "lower to direct type-test nodes when the right side
    /// is a constant type; otherwise to a runtime helper").
    TypeTestDirect { operand: Box<Lowered>, type_name: String, negate: bool },
    TypeTestDynamic { operand: Box<Lowered>, right: Box<Lowered>, negate: bool },

    /// `-as` always lowers to the runtime helper (spec.md section 4.6).
    ConvertAs { operand: Box<Lowered>, right: Box<Lowered>, extent: SourceExtent },
    /// `[T]$x` conversion, including `[ordered]` and `[ref]` handling at
    /// the semantic-checker level; here it is just the target type name.
    StaticConvert { type_name: String, operand: Box<Lowered>, extent: SourceExtent },

    LikeCall { left: Box<Lowered>, pattern: Box<Lowered>, ignore_case: bool, negate: bool },
    MatchCall { left: Box<Lowered>, pattern: Box<Lowered>, ignore_case: bool, negate: bool, extent: SourceExtent },
    ReplaceCall { left: Box<Lowered>, pattern: Box<Lowered>, replacement: Option<Box<Lowered>>, ignore_case: bool, extent: SourceExtent },
    SplitCall { left: Box<Lowered>, pattern: Option<Box<Lowered>>, options: crate::operators::SplitOptions, limit: Box<Lowered>, extent: SourceExtent },
    JoinCall { left: Box<Lowered>, separator: Option<Box<Lowered>> },
    ContainsCall { left: Box<Lowered>, right: Box<Lowered>, ignore_case: bool, negate: bool },
    InCall { left: Box<Lowered>, right: Box<Lowered>, ignore_case: bool, negate: bool },
    FormatCall { template: Box<Lowered>, args: Box<Lowered>, extent: SourceExtent },

    /// Unary `++`/`--` decomposes the operand into a getter/setter pair via
    /// the assignable-value protocol (spec.md section 4.6).
    IncrementDecrement { target: Box<Assignable>, is_increment: bool, is_postfix: bool, extent: SourceExtent },

    Not(Box<Lowered>),
    BNot(Box<Lowered>),
    UnaryPlus(Box<Lowered>),
    UnaryMinus(Box<Lowered>),

    /// A statically resolvable field/property access — the fast path
    /// (spec.md section 4.6: "Member access on a statically resolvable
    /// type with a unique field or readable property lowers to a direct
    /// field/property access").
    MemberAccessDirect { target: Box<Lowered>, member: String },
    /// The dynamic `get-member` call site, used whenever static resolution
    /// is not available (a non-constant member name, or a type the
    /// compiler has no static knowledge of).
    MemberAccessDynamic { target: Box<Lowered>, member_name: Box<Lowered>, site: CallSiteId, is_static: bool },

    /// The dynamic `invoke-member` call site.
    InvokeMemberDynamic { target: Box<Lowered>, method_name: Box<Lowered>, arguments: Vec<Lowered>, site: CallSiteId, is_static: bool },

    BaseCtorInvoke { arguments: Vec<Lowered> },

    /// The dynamic `get-index` binder. `is_multi_index` disambiguates a
    /// single index from a comma-separated multi-index (spec.md section
    /// 4.6: "disambiguated by whether the argument is an array-literal
    /// with >= 2 elements").
    IndexGetDynamic { target: Box<Lowered>, index: Box<Lowered>, site: CallSiteId, is_multi_index: bool },

    /// `@(...)`: a single pure inner expression preserves the inner array;
    /// zero statements yields an empty object-array; otherwise the
    /// captured statement-list output is coerced to an object-array via a
    /// dynamic coercion binder (spec.md section 4.6).
    ArrayExpr(ArrayExprShape),
    ArrayLiteral(Vec<Lowered>),

    /// `[ordered]`-prefixed hashtables construct an ordered map; plain
    /// hashtable literals still construct a case-insensitive-current-culture
    /// dictionary (spec.md section 4.6).
    HashtableConstruct { entries: Vec<(Lowered, Lowered)>, ordered: bool, extent: SourceExtent },

    /// `$(...)` / `(...)`: the enclosed statement list's output is
    /// captured. `preserve_partial_on_exception` models the per-site flag
    /// spec.md section 4.6 describes: "preserve partial output on
    /// exception only when referenced as a value, not when used in a
    /// property-access chain".
    SubExpressionCapture { body: Box<LoweredBlock>, preserve_partial_on_exception: bool },
    ParenCapture { inner: Box<Lowered> },

    /// Returns a fresh bound clone of the script-block over the current
    /// execution context when evaluated (spec.md section 4.6).
    /// `entry_point_index` is the AST node id of the nested script block's
    /// root, not a slot in this script block's own entry-point table — the
    /// evaluator compiles that subtree (with its own variable-analysis
    /// pass) the first time the wrapper is invoked.
    ScriptBlockWrapper { entry_point_index: usize },

    /// A bare command invocation (spec.md section 3: "a bare command
    /// invocation... the command-binding subsystem that resolves it is out
    /// of scope"). Carries just enough to hand to the external
    /// `invoke_pipeline` collaborator (spec.md section 6); this core does
    /// not perform command discovery or parameter binding itself.
    CommandInvocation { name: String, arguments: Vec<Lowered> },
    /// One `-Name value`-shaped command argument, passed through to the
    /// same external pipeline-ops interface.
    CommandParameter { name: String, value: Option<Box<Lowered>> },

    /// A using-expression's inner value, substituted from the invoking
    /// session's captured variable at evaluation time; the core only
    /// validates its shape (semantic checker) and lowers it to a plain
    /// read of whatever the inner expression resolves to.
    UsingCapture(Box<Lowered>),

    /// A statement lowered in value position (every statement contributes
    /// to the surrounding pipeline's output, so `CompilingVisitor::compile_stmt`
    /// returns the same `Lowered` type `compile_expr` does, wrapping the
    /// richer `LoweredStmt` shape rather than duplicating it as a second
    /// top-level IR type).
    Stmt(Box<LoweredStmt>),

    Error,
}

#[derive(Debug, Clone)]
pub enum ArrayExprShape {
    PreserveInner(Box<Lowered>),
    Empty,
    CoerceCapturedOutput(Box<LoweredBlock>),
}

/// One entry of a `try`'s typed-catch dispatch table (spec.md section
/// 4.6.1): the ordered array of type names resolved lazily and cached by
/// the evaluator, paired with the handler body's index into `handlers`.
#[derive(Debug, Clone)]
pub struct CatchDispatchEntry {
    pub type_names: Vec<String>,
    pub handler: LoweredBlock,
}

#[derive(Debug, Clone)]
pub struct LoweredRedirection {
    pub from_stream: crate::ast::stmt::RedirectionStream,
    pub kind: LoweredRedirectionKind,
}

#[derive(Debug, Clone)]
pub enum LoweredRedirectionKind {
    ToFile { append: bool, target: Lowered },
    Merge { to_stream: crate::ast::stmt::RedirectionStream },
}

#[derive(Debug, Clone)]
pub enum LoweredStmt {
    Expression(Lowered),

    /// A single assignment; compound operators have already been desugared
    /// to `lhs = get lhs <op> rhs` by the time this node exists (spec.md
    /// section 4.6.1).
    Assign { target: Assignable, rhs: Lowered },
    /// `x, y = rhs`: the RHS is coerced to a list and each element assigned
    /// in order (spec.md section 4.6.1).
    MultiAssign { targets: Vec<Assignable>, rhs: Lowered },

    /// Right-to-left fold of `if`/`elseif`/`else` into a cond ? body : else
    /// chain; represented here as the ordered branch list the fold
    /// produces rather than literally nesting ternaries, since the
    /// dispatch-index interpreter walks it the same way either shape is
    /// expressed (spec.md section 4.6.1).
    If { branches: Vec<(Lowered, LoweredBlock)>, else_body: Option<LoweredBlock> },

    Switch {
        condition: Lowered,
        clauses: Vec<SwitchClauseLowered>,
        default: Option<LoweredBlock>,
        flags: crate::ast::stmt::SwitchFlags,
        label: Option<String>,
    },

    Loop {
        kind: LoopKind,
        init: Option<Box<LoweredStmt>>,
        condition: Option<Lowered>,
        increment: Option<Lowered>,
        body: LoweredBlock,
        target: LoopTarget,
    },

    Foreach {
        variable: Assignable,
        collection: Lowered,
        body: LoweredBlock,
        target: LoopTarget,
    },

    TryCatchFinally {
        body: LoweredBlock,
        catch_all: Option<LoweredBlock>,
        typed_catches: Vec<CatchDispatchEntry>,
        finally: Option<LoweredBlock>,
    },

    /// A trap compiles into a separate entry point; this node just records
    /// which one, so the enclosing block's trap-stack push/pop references
    /// it (spec.md section 4.6.1).
    TrapPush { entry_point_index: usize, type_name: Option<String> },
    TrapPop,

    /// A compile-time-resolvable label with a matching target in scope
    /// becomes a direct goto (spec.md section 4.6.1); both arms carry the
    /// same payload shape, differing only in whether a loop target was
    /// statically found at compile time.
    BreakGoto(usize),
    ContinueGoto(usize),
    BreakThrow(Option<String>),
    ContinueThrow(Option<String>),

    /// Inside a trap, `return` throws `ReturnException`; otherwise it goes
    /// to the function's return label after writing the value to the
    /// output pipe (spec.md section 4.6.1).
    Return { value: Option<Lowered>, inside_trap: bool },
    Exit(Option<Lowered>),
    Throw(Option<Lowered>),

    Data { variable: Option<Assignable>, body: LoweredBlock },

    Block(LoweredBlock),

    Redirected { redirections: Vec<LoweredRedirection>, body: LoweredBlock },

    /// A nested function definition. Its body is compiled eagerly, with a
    /// fresh (empty) tuple layout standing in for the per-scope
    /// variable-analysis pass that a real host would run on this nested
    /// scope before handing it to the compiler (spec.md section 6, Variable
    /// analysis is a consumer-side interface; this core does not implement
    /// it). Registering `name` into the enclosing scope is the evaluator's
    /// job — command discovery is out of scope (spec.md section 1, Non-goals).
    FunctionDef { name: String, compiled: Box<CompiledScriptBlock> },

    /// A type/class definition. Type definition and emission are out of
    /// scope (spec.md section 1, Non-goals); this node only preserves the
    /// declaration's position and name in the statement list.
    TypeDef { name: String },
}

#[derive(Debug, Clone)]
pub struct SwitchClauseLowered {
    /// `Some(node_id)` only when the clause condition is a
    /// compile-time-constant script-block, naming its AST root so the
    /// evaluator can invoke it per element instead of comparing against
    /// `condition` (spec.md section 4.6.1).
    pub constant_script_block: Option<usize>,
    pub condition: Lowered,
    pub body: LoweredBlock,
}

/// A statement-list with its sequence points and, implicitly, its computed-
/// goto dispatch shape (spec.md section 4.6.2): "a single try/catch per
/// block regardless of statement count". `sequence_points[i]` is the
/// extent for `statements[i]`; `dispatch_target_count()` is `N + 1` (the
/// trailing end label).
#[derive(Debug, Clone, Default)]
pub struct LoweredBlock {
    pub statements: Vec<LoweredStmt>,
    pub sequence_points: Vec<SourceExtent>,
}

impl LoweredBlock {
    pub fn new(statements: Vec<LoweredStmt>, sequence_points: Vec<SourceExtent>) -> Self {
        debug_assert_eq!(statements.len(), sequence_points.len());
        Self { statements, sequence_points }
    }

    /// Testable property 6: an N-statement block produces exactly N
    /// dispatch targets plus one end label.
    pub fn dispatch_target_count(&self) -> usize {
        self.statements.len() + 1
    }

    pub fn total_statement_count(&self) -> usize {
        self.statements.iter().map(LoweredStmt::statement_count).sum::<usize>() + self.statements.len()
    }
}

impl LoweredStmt {
    /// Recursively counts nested statements for the "never JIT above 300
    /// statements" policy (spec.md section 4.6.4) — a `for` loop's body
    /// counts, an `if`'s branches count, etc.
    fn statement_count(&self) -> usize {
        match self {
            LoweredStmt::If { branches, else_body } => {
                branches.iter().map(|(_, b)| b.total_statement_count()).sum::<usize>()
                    + else_body.as_ref().map(LoweredBlock::total_statement_count).unwrap_or(0)
            }
            LoweredStmt::Switch { clauses, default, .. } => {
                clauses.iter().map(|c| c.body.total_statement_count()).sum::<usize>()
                    + default.as_ref().map(LoweredBlock::total_statement_count).unwrap_or(0)
            }
            LoweredStmt::Loop { body, init, .. } => body.total_statement_count() + init.as_ref().map(|s| s.statement_count() + 1).unwrap_or(0),
            LoweredStmt::Foreach { body, .. } => body.total_statement_count(),
            LoweredStmt::TryCatchFinally { body, catch_all, typed_catches, finally } => {
                body.total_statement_count()
                    + catch_all.as_ref().map(LoweredBlock::total_statement_count).unwrap_or(0)
                    + typed_catches.iter().map(|c| c.handler.total_statement_count()).sum::<usize>()
                    + finally.as_ref().map(LoweredBlock::total_statement_count).unwrap_or(0)
            }
            LoweredStmt::Data { body, .. } | LoweredStmt::Block(body) => body.total_statement_count(),
            LoweredStmt::Redirected { body, .. } => body.total_statement_count(),
            _ => 0,
        }
    }
}

/// The four possible entry points of a compiled script block, each `fn
/// (function_context) -> ()` shaped as a `LoweredBlock` (spec.md section
/// 4.6). `traps` holds every trap body compiled as its own separate entry
/// point (spec.md section 4.6.1, Trap lowering).
#[derive(Debug, Clone, Default)]
pub struct CompiledScriptBlock {
    pub dynamic_param: Option<LoweredBlock>,
    pub begin: Option<LoweredBlock>,
    pub process: Option<LoweredBlock>,
    pub end: Option<LoweredBlock>,
    pub traps: Vec<LoweredBlock>,
    pub parameters: Vec<ParameterDescriptor>,
    pub tuple_layout: TupleLayout,
    /// The compile-vs-interpret policy's static decision (spec.md section
    /// 4.6.4): true when the function's total statement count exceeds 300.
    pub never_jit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_target_count_is_statement_count_plus_one() {
        let block = LoweredBlock::new(
            vec![LoweredStmt::Expression(Lowered::Constant(Value::Int(1))), LoweredStmt::Expression(Lowered::Constant(Value::Int(2)))],
            vec![SourceExtent::empty(), SourceExtent::empty()],
        );
        assert_eq!(block.dispatch_target_count(), 3);
    }

    #[test]
    fn nested_if_branches_count_toward_total_statements() {
        let inner = LoweredBlock::new(vec![LoweredStmt::Expression(Lowered::Constant(Value::Int(1)))], vec![SourceExtent::empty()]);
        let outer = LoweredBlock::new(
            vec![LoweredStmt::If { branches: vec![(Lowered::Constant(Value::Bool(true)), inner)], else_body: None }],
            vec![SourceExtent::empty()],
        );
        assert_eq!(outer.total_statement_count(), 2);
    }
}
