//! The restricted-language checker (spec.md section 4.4.1): the allowlist
//! enforced over a `data { ... }` section's body. Runs as a second,
//! independent pass over just that subtree — a `data` statement's body is
//! otherwise perfectly ordinary script and goes through `SemanticChecker`
//! like anything else.

use crate::ast::expr::ExprKind;
use crate::ast::stmt::StmtKind;
use crate::ast::{Ast, NodeId};
use crate::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticId};
use crate::variable::{VariablePath, VariableScope};

/// The restricted-language variable allowlist (spec.md section 4.4.1):
/// disjoint from the automatic-variable tuple slots (`variable.rs`'s
/// `AUTOMATIC_VARIABLES`) — `$_`/`$this`/`$matches`/etc. are ordinary
/// script constructs and have no special standing inside a `data` section.
pub const RESTRICTED_VARIABLE_ALLOWLIST: &[&str] = &["PSCulture", "PSUICulture", "true", "false", "null"];

/// Whether `path` may be referenced inside a restricted-language body.
/// `$env:...` is allowed only when the enclosing `data` statement opted in
/// (spec.md section 4.4.1: "optionally plus `$env:…`").
pub fn is_restricted_allowed_variable(path: &VariablePath, allow_env: bool) -> bool {
    if path.scope == VariableScope::Env {
        return allow_env;
    }
    path.is_unqualified() && RESTRICTED_VARIABLE_ALLOWLIST.iter().any(|n| n.eq_ignore_ascii_case(&path.name))
}

/// Checks one `data` statement's body against the restricted-language
/// allowlist: literals, array/hashtable construction, `if`, binary/unary
/// operators on those, and bare command invocations whose name appears in
/// `supported_commands` — nothing else (no variable reads beyond
/// `RESTRICTED_VARIABLE_ALLOWLIST`, no arbitrary command calls, no
/// assignment). `allow_env` mirrors the `data` statement's own opt-in for
/// `$env:` references.
pub fn check_restricted_body(ast: &Ast, body: &[NodeId], supported_commands: &[String], allow_env: bool, diagnostics: &mut DiagnosticBag) {
    for &id in body {
        check_stmt(ast, id, supported_commands, allow_env, diagnostics);
    }
}

fn check_stmt(ast: &Ast, id: NodeId, supported: &[String], allow_env: bool, diagnostics: &mut DiagnosticBag) {
    let node = ast.get(id);
    match &node.kind {
        crate::ast::NodeKind::Stmt(StmtKind::CommandExpression(e)) => check_expr(ast, *e, supported, allow_env, diagnostics),
        crate::ast::NodeKind::Stmt(StmtKind::Command { name, arguments }) => {
            if !supported.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                diagnostics.report(Diagnostic::error(
                    DiagnosticId::NonConstantCommandNotSupportedInDataSection,
                    format!("command '{name}' is not in the data section's -supportedcommand list"),
                    node.extent.clone(),
                ));
            }
            for a in arguments {
                check_expr(ast, *a, supported, allow_env, diagnostics);
            }
        }
        crate::ast::NodeKind::Stmt(StmtKind::If { branches, else_body }) => {
            for (cond, body) in branches {
                check_expr(ast, *cond, supported, allow_env, diagnostics);
                check_restricted_body(ast, body, supported, allow_env, diagnostics);
            }
            if let Some(e) = else_body {
                check_restricted_body(ast, e, supported, allow_env, diagnostics);
            }
        }
        crate::ast::NodeKind::Stmt(StmtKind::Pipeline { elements, .. }) => {
            for pe in elements {
                check_stmt(ast, pe.command, supported, allow_env, diagnostics);
            }
        }
        _ => {
            diagnostics.report(Diagnostic::error(
                DiagnosticId::DisallowedConstructInDataSection,
                "this statement form is not allowed inside a data section",
                node.extent.clone(),
            ));
        }
    }
}

fn check_expr(ast: &Ast, id: NodeId, supported: &[String], allow_env: bool, diagnostics: &mut DiagnosticBag) {
    let node = ast.get(id);
    match &node.kind {
        crate::ast::NodeKind::Expr(ExprKind::Constant(_))
        | crate::ast::NodeKind::Expr(ExprKind::StringConstant(_))
        | crate::ast::NodeKind::Expr(ExprKind::Error) => {}
        crate::ast::NodeKind::Expr(ExprKind::ArrayLiteral(items)) => {
            for i in items {
                check_expr(ast, *i, supported, allow_env, diagnostics);
            }
        }
        crate::ast::NodeKind::Expr(ExprKind::Hashtable(entries)) => {
            for e in entries {
                check_expr(ast, e.key, supported, allow_env, diagnostics);
                check_expr(ast, e.value, supported, allow_env, diagnostics);
            }
        }
        crate::ast::NodeKind::Expr(ExprKind::Paren(inner)) => check_expr(ast, *inner, supported, allow_env, diagnostics),
        crate::ast::NodeKind::Expr(ExprKind::Binary { left, right, .. }) => {
            check_expr(ast, *left, supported, allow_env, diagnostics);
            check_expr(ast, *right, supported, allow_env, diagnostics);
        }
        crate::ast::NodeKind::Expr(ExprKind::Unary { operand, .. }) => check_expr(ast, *operand, supported, allow_env, diagnostics),
        crate::ast::NodeKind::Expr(ExprKind::Convert { child, .. }) => check_expr(ast, *child, supported, allow_env, diagnostics),
        crate::ast::NodeKind::Expr(ExprKind::Variable(path)) => {
            if !is_restricted_allowed_variable(path, allow_env) {
                diagnostics.report(Diagnostic::error(
                    DiagnosticId::VariableReferenceNotSupportedInDataSection,
                    format!("variable '${}' is not supported inside a data section", path.name),
                    node.extent.clone(),
                ));
            }
        }
        crate::ast::NodeKind::Expr(ExprKind::InvokeMember { .. }) | crate::ast::NodeKind::Expr(ExprKind::MemberAccess { .. }) => {
            diagnostics.report(Diagnostic::error(
                DiagnosticId::DisallowedConstructInDataSection,
                "member access/invocation is not allowed inside a data section",
                node.extent.clone(),
            ));
        }
        _ => {
            diagnostics.report(Diagnostic::error(
                DiagnosticId::DisallowedConstructInDataSection,
                "this expression form is not allowed inside a data section",
                node.extent.clone(),
            ));
        }
    }
}
