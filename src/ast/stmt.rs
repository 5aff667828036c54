//! Statement node kinds (spec.md section 3).

use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectionStream {
    Success,
    Error,
    Warning,
    Verbose,
    Debug,
    Information,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Redirection {
    ToFile {
        from_stream: RedirectionStream,
        append: bool,
        target: NodeId,
    },
    Merge {
        from_stream: RedirectionStream,
        to_stream: RedirectionStream,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipeElement {
    pub command: NodeId,
    pub redirections: Vec<Redirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Empty = catch-all; otherwise the ordered list of caught type names.
    pub types: Vec<String>,
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchClause {
    pub condition: NodeId,
    pub body: Vec<NodeId>,
}

/// Switch statement modifier flags (spec.md section 3). Plain bool fields
/// rather than a bitflags crate — there are only five and they are never
/// combined via set algebra, just read individually by the checker/compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchFlags {
    pub regex: bool,
    pub wildcard: bool,
    pub case_sensitive: bool,
    pub file: bool,
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForeachFlags {
    pub parallel: bool,
    pub has_throttle_limit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAst {
    pub name: String,
    pub type_constraint: Option<String>,
    pub attributes: Vec<NodeId>,
    pub default_value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamBlockAst {
    pub attributes: Vec<NodeId>,
    pub parameters: Vec<ParameterAst>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedBlockKind {
    Begin,
    Process,
    End,
    DynamicParam,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedBlockAst {
    pub kind: NamedBlockKind,
    pub body: Vec<NodeId>,
    /// True when the source had an unnamed top-level block (implicitly an
    /// `end` block) rather than an explicit `end { ... }`.
    pub unnamed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrapAst {
    pub type_name: Option<String>,
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptBlockAst {
    pub param_block: Option<ParamBlockAst>,
    pub named_blocks: Vec<NamedBlockAst>,
    pub using_statements: Vec<NodeId>,
    pub traps: Vec<TrapAst>,
    pub is_filter: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMemberAst {
    pub name: String,
    pub is_static: bool,
    pub is_constructor: bool,
    pub return_type: Option<String>,
    pub parameters: Vec<ParameterAst>,
    pub body: Vec<NodeId>,
    pub attributes: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMemberAst {
    pub name: String,
    pub is_static: bool,
    pub type_constraint: Option<String>,
    pub attributes: Vec<NodeId>,
    pub default_value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMemberAst {
    Function(FunctionMemberAst),
    Property(PropertyMemberAst),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Pipeline {
        elements: Vec<PipeElement>,
        background: bool,
    },
    /// A bare command invocation (name + argument expressions); the
    /// command-binding subsystem that resolves it is out of scope.
    Command {
        name: String,
        arguments: Vec<NodeId>,
    },
    CommandExpression(NodeId),
    CommandParameter {
        name: String,
        value: Option<NodeId>,
    },
    Assignment {
        target: NodeId,
        operator: crate::ast::token::TokenKind,
        value: NodeId,
    },
    If {
        /// `(condition, body)` pairs in source order: the first is the
        /// `if`, the rest are `elseif`s.
        branches: Vec<(NodeId, Vec<NodeId>)>,
        else_body: Option<Vec<NodeId>>,
    },
    Switch {
        condition: NodeId,
        clauses: Vec<SwitchClause>,
        default: Option<Vec<NodeId>>,
        flags: SwitchFlags,
        label: Option<String>,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: Vec<NodeId>,
        label: Option<String>,
    },
    Foreach {
        variable: NodeId,
        collection: NodeId,
        body: Vec<NodeId>,
        flags: ForeachFlags,
        label: Option<String>,
    },
    While {
        condition: NodeId,
        body: Vec<NodeId>,
        label: Option<String>,
    },
    DoWhile {
        condition: NodeId,
        body: Vec<NodeId>,
        label: Option<String>,
    },
    DoUntil {
        condition: NodeId,
        body: Vec<NodeId>,
        label: Option<String>,
    },
    Try {
        body: Vec<NodeId>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<NodeId>>,
    },
    Trap(TrapAst),
    Throw(Option<NodeId>),
    Return(Option<NodeId>),
    Exit(Option<NodeId>),
    Break(Option<NodeId>),
    Continue(Option<NodeId>),
    Data {
        variable_name: Option<String>,
        supported_commands: Vec<String>,
        body: Vec<NodeId>,
    },
    Block(Vec<NodeId>),
    FunctionDefinition {
        name: String,
        param_block: Option<ParamBlockAst>,
        parameter_list: Vec<ParameterAst>,
        body: Box<ScriptBlockAst>,
        is_filter: bool,
    },
    TypeDefinition {
        name: String,
        base_types: Vec<String>,
        members: Vec<TypeMemberAst>,
        attributes: Vec<NodeId>,
        is_enum: bool,
    },
    ScriptBlock(ScriptBlockAst),
}
