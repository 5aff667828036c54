//! Expression node kinds (spec.md section 3). Every variant holds `NodeId`s
//! into the owning `Ast` arena for child nodes rather than owning them
//! directly — see `ast::mod` for why (Design Notes section 9: parent links
//! as non-owning back-references, "weak indexes into an arena").

use crate::ast::token::TokenKind;
use crate::value::Value;
use crate::variable::VariablePath;
use crate::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct HashtableEntry {
    pub key: NodeId,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
    Not,
    BNot,
    Plus,
    Minus,
    Join,
    Split,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant(Value),
    StringConstant(String),
    /// A format string plus its nested expressions, e.g. `"a$($x)b"`.
    ExpandableString { format: String, parts: Vec<NodeId> },
    ArrayLiteral(Vec<NodeId>),
    /// Ordered list of key/value expression pairs; `is_ordered` reflects an
    /// enclosing `[ordered]` cast applied at the convert-expression level,
    /// not stored redundantly here.
    Hashtable(Vec<HashtableEntry>),
    ScriptBlockExpr(NodeId),
    /// `$(...)`: a statement list producing values.
    SubExpression(Vec<NodeId>),
    /// `(...)`: wraps a single inner expression.
    Paren(NodeId),
    Variable(VariablePath),
    TypeExpr { name: String, array_rank: usize },
    MemberAccess {
        target: NodeId,
        member_name: NodeId,
        is_static: bool,
    },
    Index {
        target: NodeId,
        index: NodeId,
    },
    InvokeMember {
        target: NodeId,
        method_name: NodeId,
        arguments: Vec<NodeId>,
        is_static: bool,
    },
    BaseCtorInvoke { arguments: Vec<NodeId> },
    Binary {
        left: NodeId,
        operator: TokenKind,
        right: NodeId,
        /// Position to attach to a runtime error if this operator fails;
        /// distinct from the node's own extent (spec.md section 3).
        error_position_is_right: bool,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Convert {
        type_name: String,
        child: NodeId,
    },
    Attributed {
        attribute: NodeId,
        child: NodeId,
    },
    /// `$using:name` — only variable, member-on-constant-name, or
    /// indexed-with-constant-index children are legal (semantic checker).
    Using(NodeId),
    /// An already-diagnosed malformed expression; parses to a placeholder
    /// so a single bad expression does not abort the rest of the tree.
    Error,

    // --- Attribute/parameter AST leaves that appear in expression position ---
    Attribute {
        type_name: String,
        positional_args: Vec<NodeId>,
        named_args: Vec<(String, NodeId)>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unary_op_variants_are_distinct() {
        assert_ne!(UnaryOp::PrefixIncrement, UnaryOp::PostfixIncrement);
    }
}
