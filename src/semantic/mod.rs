//! Semantic analysis (spec.md section 4.4): the main checker plus the
//! restricted-language checker for `data{}` sections.

pub mod checker;
pub mod restricted;

use crate::ast::stmt::StmtKind;
use crate::ast::{Ast, NodeId};
use crate::diagnostics::DiagnosticBag;

pub use checker::{mark_suspicious_content, CheckerOptions, SemanticChecker};
pub use restricted::check_restricted_body;

/// Run every static check this crate knows about the way a host would
/// before compiling: mark suspicious content, then the main checker, then
/// the restricted-language checker over every `data` statement found.
/// Returns a single bag combining all three passes' diagnostics.
pub fn analyze(ast: &mut Ast, root: NodeId, options: CheckerOptions) -> DiagnosticBag {
    mark_suspicious_content(ast);
    let mut diagnostics = SemanticChecker::check(ast, root, options);
    for id in 0..ast.len() {
        if let crate::ast::NodeKind::Stmt(StmtKind::Data { supported_commands, body, .. }) = &ast.get(id).kind {
            // `StmtKind::Data` carries no `$env:`-opt-in flag of its own, so
            // every data section is checked with `allow_env = false` here.
            check_restricted_body(ast, body, supported_commands, false, &mut diagnostics);
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, NodeKind};
    use crate::diagnostics::DiagnosticId;
    use crate::extent::SourceExtent;

    #[test]
    fn analyze_flags_disallowed_variable_inside_a_data_statement() {
        let mut ast = Ast::new();
        let var = ast.push(
            SourceExtent::empty(),
            NodeKind::Expr(ExprKind::Variable(crate::variable::VariablePath::unqualified("env"))),
        );
        let cmd_expr = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::CommandExpression(var)));
        ast.set_parent(var, cmd_expr);
        let data = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Data { variable_name: None, supported_commands: vec![], body: vec![cmd_expr] }),
        );
        ast.set_parent(cmd_expr, data);
        ast.set_root(data);
        let diags = analyze(&mut ast, data, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::VariableReferenceNotSupportedInDataSection));
    }
}
