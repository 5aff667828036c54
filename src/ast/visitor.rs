//! The visitor protocol (spec.md section 4.3): a pre-order visitor
//! returning `Continue | SkipChildren | StopVisit`, plus a `post_visit`
//! hook fired after all children have been visited, and a
//! value-returning `CompilingVisitor` used by the expression-tree
//! compiler.
//!
//! Children are visited in the order they appear in source — left-to-right,
//! top-to-bottom — which is also the order `children_of` below enumerates
//! them in.

use crate::ast::expr::ExprKind;
use crate::ast::stmt::StmtKind;
use crate::ast::{Ast, Node, NodeId, NodeKind};

/// Control returned by each `Visitor` callback, mirroring a standard
/// pre-order AST walker's three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    SkipChildren,
    StopVisit,
}

/// Enumerate `id`'s direct children, in source order. This is the single
/// place that knows the shape of every node kind; `Ast::children_of` and
/// the generic `walk` driver both go through it so traversal order never
/// drifts between the two.
pub fn children_of(ast: &Ast, id: NodeId) -> Vec<NodeId> {
    match &ast.get(id).kind {
        NodeKind::Expr(e) => expr_children(e),
        NodeKind::Stmt(s) => stmt_children(s),
    }
}

fn expr_children(e: &ExprKind) -> Vec<NodeId> {
    match e {
        ExprKind::Constant(_) | ExprKind::StringConstant(_) | ExprKind::Error | ExprKind::TypeExpr { .. } => vec![],
        ExprKind::ExpandableString { parts, .. } => parts.clone(),
        ExprKind::ArrayLiteral(items) => items.clone(),
        ExprKind::Hashtable(entries) => entries.iter().flat_map(|e| [e.key, e.value]).collect(),
        ExprKind::ScriptBlockExpr(sb) => vec![*sb],
        ExprKind::SubExpression(stmts) => stmts.clone(),
        ExprKind::Paren(inner) => vec![*inner],
        ExprKind::Variable(_) => vec![],
        ExprKind::MemberAccess { target, member_name, .. } => vec![*target, *member_name],
        ExprKind::Index { target, index } => vec![*target, *index],
        ExprKind::InvokeMember { target, method_name, arguments, .. } => {
            let mut v = vec![*target, *method_name];
            v.extend(arguments.iter().copied());
            v
        }
        ExprKind::BaseCtorInvoke { arguments } => arguments.clone(),
        ExprKind::Binary { left, right, .. } => vec![*left, *right],
        ExprKind::Unary { operand, .. } => vec![*operand],
        ExprKind::Convert { child, .. } => vec![*child],
        ExprKind::Attributed { attribute, child } => vec![*attribute, *child],
        ExprKind::Using(inner) => vec![*inner],
        ExprKind::Attribute { positional_args, named_args, .. } => {
            let mut v = positional_args.clone();
            v.extend(named_args.iter().map(|(_, id)| *id));
            v
        }
    }
}

fn stmt_children(s: &StmtKind) -> Vec<NodeId> {
    match s {
        StmtKind::Pipeline { elements, .. } => elements
            .iter()
            .flat_map(|pe| {
                let mut v = vec![pe.command];
                v.extend(pe.redirections.iter().filter_map(|r| match r {
                    crate::ast::stmt::Redirection::ToFile { target, .. } => Some(*target),
                    crate::ast::stmt::Redirection::Merge { .. } => None,
                }));
                v
            })
            .collect(),
        StmtKind::Command { arguments, .. } => arguments.clone(),
        StmtKind::CommandExpression(e) => vec![*e],
        StmtKind::CommandParameter { value, .. } => value.iter().copied().collect(),
        StmtKind::Assignment { target, value, .. } => vec![*target, *value],
        StmtKind::If { branches, else_body } => {
            let mut v = vec![];
            for (cond, body) in branches {
                v.push(*cond);
                v.extend(body.iter().copied());
            }
            if let Some(e) = else_body {
                v.extend(e.iter().copied());
            }
            v
        }
        StmtKind::Switch { condition, clauses, default, .. } => {
            let mut v = vec![*condition];
            for c in clauses {
                v.push(c.condition);
                v.extend(c.body.iter().copied());
            }
            if let Some(d) = default {
                v.extend(d.iter().copied());
            }
            v
        }
        StmtKind::For { init, condition, increment, body, .. } => {
            let mut v = vec![];
            v.extend(init.iter().copied());
            v.extend(condition.iter().copied());
            v.extend(increment.iter().copied());
            v.extend(body.iter().copied());
            v
        }
        StmtKind::Foreach { variable, collection, body, .. } => {
            let mut v = vec![*variable, *collection];
            v.extend(body.iter().copied());
            v
        }
        StmtKind::While { condition, body, .. }
        | StmtKind::DoWhile { condition, body, .. }
        | StmtKind::DoUntil { condition, body, .. } => {
            let mut v = vec![*condition];
            v.extend(body.iter().copied());
            v
        }
        StmtKind::Try { body, catches, finally } => {
            let mut v = body.clone();
            for c in catches {
                v.extend(c.body.iter().copied());
            }
            if let Some(f) = finally {
                v.extend(f.iter().copied());
            }
            v
        }
        StmtKind::Trap(t) => t.body.clone(),
        StmtKind::Throw(e) | StmtKind::Return(e) | StmtKind::Exit(e) | StmtKind::Break(e) | StmtKind::Continue(e) => {
            e.iter().copied().collect()
        }
        StmtKind::Data { body, .. } => body.clone(),
        StmtKind::Block(body) => body.clone(),
        StmtKind::FunctionDefinition { body, .. } => script_block_children(body),
        StmtKind::TypeDefinition { members, attributes, .. } => {
            let mut v = attributes.clone();
            for m in members {
                match m {
                    crate::ast::stmt::TypeMemberAst::Function(f) => {
                        v.extend(f.attributes.iter().copied());
                        v.extend(f.parameters.iter().flat_map(param_children));
                        v.extend(f.body.iter().copied());
                    }
                    crate::ast::stmt::TypeMemberAst::Property(p) => {
                        v.extend(p.attributes.iter().copied());
                        v.extend(p.default_value.iter().copied());
                    }
                }
            }
            v
        }
        StmtKind::ScriptBlock(sb) => script_block_children(sb),
    }
}

fn param_children(p: &crate::ast::stmt::ParameterAst) -> Vec<NodeId> {
    let mut v = p.attributes.clone();
    v.extend(p.default_value.iter().copied());
    v
}

fn script_block_children(sb: &crate::ast::stmt::ScriptBlockAst) -> Vec<NodeId> {
    let mut v = vec![];
    if let Some(pb) = &sb.param_block {
        v.extend(pb.attributes.iter().copied());
        v.extend(pb.parameters.iter().flat_map(param_children));
    }
    v.extend(sb.using_statements.iter().copied());
    for t in &sb.traps {
        v.extend(t.body.iter().copied());
    }
    for nb in &sb.named_blocks {
        v.extend(nb.body.iter().copied());
    }
    v
}

/// The pre-order visitor. Every method has a default body that simply
/// continues (so implementers override only the node kinds they care
/// about), except `post_visit`, which defaults to doing nothing.
pub trait Visitor {
    fn visit_node(&mut self, ast: &Ast, id: NodeId, node: &Node) -> VisitAction {
        let _ = (ast, id, node);
        VisitAction::Continue
    }

    /// Fired after all of `id`'s children have been visited (and only if
    /// `visit_node` did not return `StopVisit`/`SkipChildren` in a way that
    /// skipped them) — used by the semantic checker to pop
    /// `member_scope_stack`/`scope_stack` entries pushed on entry.
    fn post_visit(&mut self, ast: &Ast, id: NodeId, node: &Node) {
        let _ = (ast, id, node);
    }
}

/// Drive `visitor` over the subtree rooted at `id`, in the order spec.md
/// section 4.3 mandates: pre-order, `post_visit` after children. Returns
/// `false` if the walk was aborted early by `VisitAction::StopVisit`.
pub fn walk<V: Visitor>(ast: &Ast, visitor: &mut V, id: NodeId) -> bool {
    let node = ast.get(id).clone();
    match visitor.visit_node(ast, id, &node) {
        VisitAction::StopVisit => return false,
        VisitAction::SkipChildren => {
            visitor.post_visit(ast, id, &node);
            return true;
        }
        VisitAction::Continue => {}
    }
    for child in children_of(ast, id) {
        if !walk(ast, visitor, child) {
            return false;
        }
    }
    visitor.post_visit(ast, id, &node);
    true
}

/// The compiling visitor (spec.md section 4.3): returns a lowered value per
/// node kind instead of a control-flow action. `T` is the compiler's
/// intermediate-representation type (`compiler::ir::Lowered`); kept generic
/// here so the AST layer has no dependency on the compiler.
pub trait CompilingVisitor<T> {
    fn compile_expr(&mut self, ast: &Ast, id: NodeId, kind: &ExprKind) -> T;
    fn compile_stmt(&mut self, ast: &Ast, id: NodeId, kind: &StmtKind) -> T;

    fn compile_node(&mut self, ast: &Ast, id: NodeId) -> T {
        match &ast.get(id).kind {
            NodeKind::Expr(e) => self.compile_expr(ast, id, e),
            NodeKind::Stmt(s) => self.compile_stmt(ast, id, s),
        }
    }
}
