//! Core of a dynamic shell scripting language's execution engine: the path
//! from a parsed AST to an executable, evaluable program.
//!
//! This crate covers the AST data model and visitor protocol, the
//! semantic-analysis pass, and the expression-tree compiler. The lexer,
//! host process, cmdlet-binding subsystem, debugger UI, and remoting layer
//! are named collaborators consumed through the `context` module's
//! interfaces, not implemented here.

pub mod ast;
pub mod compiler;
pub mod context;
pub mod diagnostics;
pub mod errors;
pub mod extent;
pub mod flow;
pub mod operators;
pub mod parameters;
pub mod semantic;
pub mod value;
pub mod variable;

pub use ast::{Ast, ExprKind, Node, NodeId, NodeKind, StmtKind, TokenKind};
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticId};
pub use errors::EngineError;
pub use extent::SourceExtent;
pub use flow::FlowSignal;
pub use value::Value;
