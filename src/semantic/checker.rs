//! The main semantic checker (spec.md section 4.4): a single pre-order
//! traversal with a `post_visit` hook, enforcing the rule table in that
//! section. Errors accumulate in a `DiagnosticBag`; visitation continues
//! after each one so a single pass surfaces every violation (spec.md
//! section 7's propagation policy for the checker).
//!
//! `TypeDefinition` and `Try` get custom recursion in `visit_node` instead
//! of the default `children_of`-driven fan-out: both need per-sub-scope
//! context (which member a body belongs to, whether we're inside the
//! `finally` list) that the flat child list can't express.

use std::collections::HashSet;

use crate::ast::expr::{ExprKind, UnaryOp};
use crate::ast::stmt::{StmtKind, TypeMemberAst};
use crate::ast::token::TokenKind;
use crate::ast::visitor::{walk, VisitAction, Visitor};
use crate::ast::{Ast, Node, NodeId};
use crate::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticId};
use crate::extent::SourceExtent;

#[derive(Debug, Clone)]
struct MemberScope {
    return_type: Option<String>,
}

#[derive(Debug, Clone)]
struct LoopScope {
    label: Option<String>,
}

/// Whether the checker is currently inside a `workflow` body. The core
/// never constructs a real workflow context (translation is out of scope,
/// spec.md section 1); callers exercising workflow-only constructs set
/// this explicitly for testing. Production callers leave it `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckerOptions {
    pub in_workflow: bool,
}

pub struct SemanticChecker {
    pub diagnostics: DiagnosticBag,
    member_scope_stack: Vec<Option<MemberScope>>,
    loop_stack: Vec<LoopScope>,
    finally_depth: usize,
    instance_member_depth: usize,
    options: CheckerOptions,
}

impl SemanticChecker {
    pub fn new(options: CheckerOptions) -> Self {
        Self {
            diagnostics: DiagnosticBag::new(),
            member_scope_stack: Vec::new(),
            loop_stack: Vec::new(),
            finally_depth: 0,
            instance_member_depth: 0,
            options,
        }
    }

    pub fn check(ast: &Ast, root: NodeId, options: CheckerOptions) -> DiagnosticBag {
        let mut checker = Self::new(options);
        walk(ast, &mut checker, root);
        checker.diagnostics
    }

    fn error(&mut self, id: DiagnosticId, message: impl Into<String>, extent: &SourceExtent) {
        self.diagnostics.report(Diagnostic::error(id, message, extent.clone()));
    }

    fn is_assignable_target(&self, ast: &Ast, id: NodeId, allow_array_literal: bool) -> bool {
        match &ast.get(id).kind {
            crate::ast::NodeKind::Expr(e) => match e {
                ExprKind::Variable(_) | ExprKind::MemberAccess { .. } | ExprKind::Index { .. } => true,
                ExprKind::ArrayLiteral(items) => {
                    allow_array_literal && items.iter().all(|i| self.is_assignable_target(ast, *i, false))
                }
                ExprKind::Attributed { child, .. } => self.is_assignable_target(ast, *child, allow_array_literal),
                ExprKind::Paren(inner) => self.is_assignable_target(ast, *inner, allow_array_literal),
                ExprKind::Convert { type_name, child } if type_name.eq_ignore_ascii_case("ref") => {
                    self.is_assignable_target(ast, *child, allow_array_literal)
                }
                _ => false,
            },
            crate::ast::NodeKind::Stmt(_) => false,
        }
    }

    /// Walk down through any leading `[ref]` casts on an assignment target;
    /// a second one, or any other cast wrapping one, is the violation.
    fn check_ref_cast_placement(&mut self, ast: &Ast, id: NodeId, extent: &SourceExtent) {
        let mut current = id;
        let mut ref_count = 0;
        loop {
            match &ast.get(current).kind {
                crate::ast::NodeKind::Expr(ExprKind::Convert { type_name, child }) => {
                    if type_name.eq_ignore_ascii_case("ref") {
                        ref_count += 1;
                        current = *child;
                    } else if ref_count > 0 {
                        self.error(
                            DiagnosticId::ReferenceNeedsToBeByItselfInTypeConstraint,
                            "[ref] must be the outermost and only cast on an assignment target",
                            extent,
                        );
                        return;
                    } else {
                        current = *child;
                    }
                }
                _ => break,
            }
        }
        if ref_count > 1 {
            self.error(
                DiagnosticId::ReferenceNeedsToBeByItselfInTypeConstraint,
                "only one [ref] cast is allowed on an assignment target",
                extent,
            );
        }
    }

    fn check_duplicate_parameters(&mut self, params: &[crate::ast::stmt::ParameterAst], extent: &SourceExtent) {
        let mut seen = HashSet::new();
        for p in params {
            if !seen.insert(p.name.to_ascii_lowercase()) {
                self.error(
                    DiagnosticId::DuplicateParameterName,
                    format!("duplicate parameter name '{}'", p.name),
                    extent,
                );
            }
            if p.type_constraint.as_deref().map(|t| t.eq_ignore_ascii_case("void")).unwrap_or(false) {
                self.error(DiagnosticId::VoidParameterType, "a parameter cannot have type [void]", extent);
            }
        }
    }

    fn check_hashtable_duplicate_keys(&mut self, ast: &Ast, entries: &[crate::ast::expr::HashtableEntry], extent: &SourceExtent) {
        let mut seen = HashSet::new();
        for entry in entries {
            if let crate::ast::NodeKind::Expr(ExprKind::StringConstant(s)) = &ast.get(entry.key).kind {
                if !seen.insert(s.to_ascii_lowercase()) {
                    self.error(DiagnosticId::DuplicateKey, format!("duplicate hashtable key '{s}'"), extent);
                }
            }
        }
    }

    fn check_attribute(&mut self, ast: &Ast, id: NodeId, extent: &SourceExtent) {
        if let crate::ast::NodeKind::Expr(ExprKind::Attribute { named_args, positional_args, .. }) = &ast.get(id).kind {
            let mut seen = HashSet::new();
            for (name, _) in named_args {
                if !seen.insert(name.to_ascii_lowercase()) {
                    self.error(DiagnosticId::DuplicateNamedArgument, format!("duplicate named argument '{name}'"), extent);
                }
            }
            for arg in positional_args.iter().chain(named_args.iter().map(|(_, v)| v)) {
                if !self.is_constant_expr(ast, *arg) {
                    self.error(DiagnosticId::AttributeArgumentNotConstant, "attribute arguments must be constant expressions", extent);
                }
            }
        }
    }

    fn is_constant_expr(&self, ast: &Ast, id: NodeId) -> bool {
        match &ast.get(id).kind {
            crate::ast::NodeKind::Expr(ExprKind::Constant(_)) | crate::ast::NodeKind::Expr(ExprKind::StringConstant(_)) => true,
            crate::ast::NodeKind::Expr(ExprKind::ArrayLiteral(items)) => items.iter().all(|i| self.is_constant_expr(ast, *i)),
            crate::ast::NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Minus, operand }) => self.is_constant_expr(ast, *operand),
            _ => false,
        }
    }

    fn find_loop_target(&self, label: Option<&str>) -> Option<usize> {
        match label {
            None => self.loop_stack.len().checked_sub(1),
            Some(l) => self.loop_stack.iter().rposition(|s| s.label.as_deref().map(|sl| sl.eq_ignore_ascii_case(l)).unwrap_or(false)),
        }
    }

    fn check_break_continue_label(&mut self, ast: &Ast, label_expr: Option<NodeId>, extent: &SourceExtent) {
        let label = label_expr.and_then(|id| match &ast.get(id).kind {
            crate::ast::NodeKind::Expr(ExprKind::StringConstant(s)) => Some(s.clone()),
            _ => None,
        });
        if self.finally_depth > 0 {
            self.error(DiagnosticId::ControlLeavingFinally, "break/continue cannot leave a finally block", extent);
            return;
        }
        if label.is_some() && self.find_loop_target(label.as_deref()).is_none() {
            self.error(DiagnosticId::LabelNotFound, format!("no enclosing loop labelled '{}'", label.unwrap()), extent);
        }
    }

    fn check_catch_clause_ordering(&mut self, catches: &[crate::ast::stmt::CatchClause], extent: &SourceExtent) {
        let mut seen_catch_all = false;
        let mut seen_types: Vec<String> = vec![];
        for clause in catches {
            if seen_catch_all {
                self.error(DiagnosticId::CatchAllNotLast, "a catch-all clause must be the last catch clause", extent);
            }
            if clause.types.is_empty() {
                seen_catch_all = true;
            } else {
                for t in &clause.types {
                    if seen_types.iter().any(|prev| prev.eq_ignore_ascii_case(t)) {
                        self.error(
                            DiagnosticId::ExceptionTypeAlreadyCaught,
                            format!("exception type '{t}' is already caught by a previous clause"),
                            extent,
                        );
                    }
                    seen_types.push(t.clone());
                }
            }
        }
    }

    fn check_dsc_type(&mut self, ast: &Ast, attributes: &[NodeId], members: &[TypeMemberAst], extent: &SourceExtent) {
        let is_dsc = attributes.iter().any(|a| {
            matches!(&ast.get(*a).kind, crate::ast::NodeKind::Expr(ExprKind::Attribute { type_name, .. }) if type_name.eq_ignore_ascii_case("DscResource"))
        });
        if !is_dsc {
            return;
        }
        let has = |name: &str| members.iter().any(|m| matches!(m, TypeMemberAst::Function(f) if f.name.eq_ignore_ascii_case(name)));
        if !has("Get") || !has("Set") || !has("Test") {
            self.error(DiagnosticId::DscTypeMissingMethod, "a DSC resource must define Get/Set/Test methods", extent);
        }
        if !members.iter().any(|m| matches!(m, TypeMemberAst::Property(_))) {
            self.error(DiagnosticId::DscTypeMissingKeyProperty, "a DSC resource must declare at least one Key property", extent);
        }
        let has_non_default_ctor = members
            .iter()
            .any(|m| matches!(m, TypeMemberAst::Function(f) if f.is_constructor && !f.parameters.is_empty()));
        let has_default_ctor = members
            .iter()
            .any(|m| matches!(m, TypeMemberAst::Function(f) if f.is_constructor && f.parameters.is_empty()));
        if has_non_default_ctor && !has_default_ctor {
            self.error(
                DiagnosticId::DscTypeMissingDefaultConstructor,
                "a DSC resource with a non-default constructor must also declare a default constructor",
                extent,
            );
        }
    }

    fn is_valid_using_content(&self, ast: &Ast, id: NodeId) -> bool {
        match &ast.get(id).kind {
            crate::ast::NodeKind::Expr(ExprKind::Variable(_)) => true,
            crate::ast::NodeKind::Expr(ExprKind::MemberAccess { member_name, .. }) => {
                matches!(&ast.get(*member_name).kind, crate::ast::NodeKind::Expr(ExprKind::StringConstant(_)))
            }
            crate::ast::NodeKind::Expr(ExprKind::Index { index, .. }) => self.is_constant_expr(ast, *index),
            _ => false,
        }
    }

    /// Visit one `TypeDefinition` member body with its own return-type and
    /// instance-member context, rather than relying on `children_of`'s flat
    /// fan-out (which cannot tell which body belongs to which member).
    fn visit_type_member(&mut self, ast: &Ast, m: &TypeMemberAst, extent: &SourceExtent) {
        match m {
            TypeMemberAst::Function(f) => {
                if f.is_constructor && f.return_type.is_some() {
                    self.error(DiagnosticId::ConstructorHasReturnType, "a constructor cannot declare a return type", extent);
                }
                self.check_duplicate_parameters(&f.parameters, extent);
                if let Some(rt) = &f.return_type {
                    if !rt.eq_ignore_ascii_case("void") && !ends_in_return(ast, &f.body) {
                        self.error(
                            DiagnosticId::MethodHasCodePathNotReturn,
                            format!("method '{}' does not return a value on all code paths", f.name),
                            extent,
                        );
                    }
                }
                for a in &f.attributes {
                    walk(ast, self, *a);
                }
                for p in &f.parameters {
                    for a in &p.attributes {
                        walk(ast, self, *a);
                    }
                    if let Some(d) = p.default_value {
                        walk(ast, self, d);
                    }
                }
                self.member_scope_stack.push(Some(MemberScope { return_type: f.return_type.clone() }));
                if !f.is_static {
                    self.instance_member_depth += 1;
                }
                for c in &f.body {
                    walk(ast, self, *c);
                }
                if !f.is_static {
                    self.instance_member_depth -= 1;
                }
                self.member_scope_stack.pop();
            }
            TypeMemberAst::Property(p) => {
                for a in &p.attributes {
                    walk(ast, self, *a);
                }
                if let Some(d) = p.default_value {
                    walk(ast, self, d);
                }
            }
        }
    }
}

impl Visitor for SemanticChecker {
    fn visit_node(&mut self, ast: &Ast, id: NodeId, node: &Node) -> VisitAction {
        match &node.kind {
            crate::ast::NodeKind::Stmt(StmtKind::Try { body, catches, finally }) => {
                self.check_catch_clause_ordering(catches, &node.extent);
                for c in body {
                    walk(ast, self, *c);
                }
                for clause in catches {
                    for c in &clause.body {
                        walk(ast, self, *c);
                    }
                }
                if let Some(f) = finally {
                    self.finally_depth += 1;
                    for c in f {
                        walk(ast, self, *c);
                    }
                    self.finally_depth -= 1;
                }
                VisitAction::SkipChildren
            }
            crate::ast::NodeKind::Stmt(StmtKind::TypeDefinition { members, attributes, .. }) => {
                self.check_dsc_type(ast, attributes, members, &node.extent);
                for a in attributes {
                    walk(ast, self, *a);
                }
                for m in members {
                    self.visit_type_member(ast, m, &node.extent);
                }
                VisitAction::SkipChildren
            }
            crate::ast::NodeKind::Stmt(stmt) => {
                self.visit_stmt(ast, id, stmt, &node.extent);
                VisitAction::Continue
            }
            crate::ast::NodeKind::Expr(expr) => {
                self.visit_expr(ast, id, expr, &node.extent);
                VisitAction::Continue
            }
        }
    }

    fn post_visit(&mut self, _ast: &Ast, _id: NodeId, node: &Node) {
        match &node.kind {
            crate::ast::NodeKind::Stmt(StmtKind::FunctionDefinition { .. }) => {
                self.member_scope_stack.pop();
            }
            crate::ast::NodeKind::Stmt(StmtKind::For { .. })
            | crate::ast::NodeKind::Stmt(StmtKind::Foreach { .. })
            | crate::ast::NodeKind::Stmt(StmtKind::While { .. })
            | crate::ast::NodeKind::Stmt(StmtKind::DoWhile { .. })
            | crate::ast::NodeKind::Stmt(StmtKind::DoUntil { .. })
            | crate::ast::NodeKind::Stmt(StmtKind::Switch { .. }) => {
                self.loop_stack.pop();
            }
            _ => {}
        }
    }
}

impl SemanticChecker {
    fn visit_stmt(&mut self, ast: &Ast, _id: NodeId, stmt: &StmtKind, extent: &SourceExtent) {
        match stmt {
            StmtKind::ScriptBlock(sb) => {
                if let Some(pb) = &sb.param_block {
                    self.check_duplicate_parameters(&pb.parameters, extent);
                }
            }
            StmtKind::FunctionDefinition { param_block, parameter_list, .. } => {
                if param_block.is_some() && !parameter_list.is_empty() {
                    self.error(
                        DiagnosticId::ParamBlockAndParameterList,
                        "a function cannot declare both a param block and a parameter list",
                        extent,
                    );
                }
                if let Some(pb) = param_block {
                    self.check_duplicate_parameters(&pb.parameters, extent);
                }
                self.check_duplicate_parameters(parameter_list, extent);
                self.member_scope_stack.push(None);
            }
            StmtKind::Break(label) => self.check_break_continue_label(ast, *label, extent),
            StmtKind::Continue(label) => self.check_break_continue_label(ast, *label, extent),
            StmtKind::Return(value) => {
                if self.finally_depth > 0 {
                    self.error(DiagnosticId::ReturnOutOfFinally, "return cannot leave a finally block", extent);
                }
                if let Some(Some(scope)) = self.member_scope_stack.last() {
                    let wants_value = scope.return_type.as_deref().map(|t| !t.eq_ignore_ascii_case("void")).unwrap_or(true);
                    if wants_value && value.is_none() {
                        self.error(DiagnosticId::ReturnRequiresValue, "return requires a value in this method", extent);
                    }
                    if !wants_value && value.is_some() {
                        self.error(DiagnosticId::ReturnMustNotHaveValue, "a void method cannot return a value", extent);
                    }
                }
            }
            StmtKind::For { label, .. } => self.loop_stack.push(LoopScope { label: label.clone() }),
            StmtKind::Foreach { label, flags, .. } => {
                self.loop_stack.push(LoopScope { label: label.clone() });
                if flags.parallel && !self.options.in_workflow {
                    self.error(DiagnosticId::ParallelRequiresWorkflow, "-parallel is only valid inside a workflow", extent);
                }
                if flags.has_throttle_limit && !flags.parallel {
                    self.error(DiagnosticId::ThrottleLimitRequiresParallel, "-throttlelimit requires -parallel", extent);
                }
            }
            StmtKind::While { label, .. } | StmtKind::DoWhile { label, .. } | StmtKind::DoUntil { label, .. } => {
                self.loop_stack.push(LoopScope { label: label.clone() })
            }
            StmtKind::Switch { label, flags, .. } => {
                self.loop_stack.push(LoopScope { label: label.clone() });
                if flags.parallel && !self.options.in_workflow {
                    self.error(DiagnosticId::ParallelRequiresWorkflow, "-parallel is only valid inside a workflow", extent);
                }
            }
            StmtKind::Block(_) => {
                if !self.options.in_workflow {
                    self.error(DiagnosticId::UnexpectedKeyword, "'parallel'/'sequence' blocks are only valid inside a workflow", extent);
                }
            }
            StmtKind::Assignment { target, operator, .. } => {
                let allow_array = *operator == TokenKind::Equals;
                if !self.is_assignable_target(ast, *target, allow_array) {
                    self.error(DiagnosticId::InvalidAssignmentTarget, "invalid assignment target", extent);
                } else if !allow_array && matches!(&ast.get(*target).kind, crate::ast::NodeKind::Expr(ExprKind::ArrayLiteral(_))) {
                    self.error(
                        DiagnosticId::ArrayLiteralLhsRequiresAssign,
                        "a multiple-assignment target is only valid with '='",
                        extent,
                    );
                }
                self.check_ref_cast_placement(ast, *target, extent);
            }
            _ => {}
        }
    }

    fn visit_expr(&mut self, ast: &Ast, id: NodeId, expr: &ExprKind, extent: &SourceExtent) {
        match expr {
            ExprKind::Attribute { .. } => self.check_attribute(ast, id, extent),
            ExprKind::Hashtable(entries) => self.check_hashtable_duplicate_keys(ast, entries, extent),
            ExprKind::Unary {
                op: UnaryOp::PrefixIncrement | UnaryOp::PrefixDecrement | UnaryOp::PostfixIncrement | UnaryOp::PostfixDecrement,
                operand,
            } => {
                if !self.is_assignable_target(ast, *operand, false) {
                    self.error(
                        DiagnosticId::OperatorRequiresVariableOrProperty,
                        "increment/decrement requires a variable or property operand",
                        extent,
                    );
                }
            }
            ExprKind::Convert { type_name, child } => {
                if type_name.eq_ignore_ascii_case("ordered") && !matches!(&ast.get(*child).kind, crate::ast::NodeKind::Expr(ExprKind::Hashtable(_))) {
                    self.error(DiagnosticId::OrderedOnlyOnHashtable, "[ordered] is only valid on a hashtable literal", extent);
                }
                if type_name.eq_ignore_ascii_case("void") {
                    if let Some(parent) = ast.parent_of(id) {
                        if matches!(&ast.get(parent).kind, crate::ast::NodeKind::Stmt(StmtKind::TypeDefinition { .. })) {
                            self.error(DiagnosticId::VoidNotAllowedHere, "[void] is not allowed on a property or parameter", extent);
                        }
                    }
                }
            }
            ExprKind::Using(inner) => {
                if !self.is_valid_using_content(ast, *inner) {
                    self.error(
                        DiagnosticId::UsingExpressionInvalidContent,
                        "$using: only supports a variable, a member access on a constant name, or an index with a constant index",
                        extent,
                    );
                }
            }
            ExprKind::Variable(path) => {
                if path.name.eq_ignore_ascii_case("this") && self.instance_member_depth == 0 {
                    self.error(DiagnosticId::ThisOutsideInstanceMember, "$this is only valid inside an instance member", extent);
                }
            }
            ExprKind::TypeExpr { array_rank, .. } => {
                if *array_rank > 200 {
                    self.error(DiagnosticId::ScriptTooComplicated, "array type nesting exceeds the maximum supported depth", extent);
                }
            }
            _ => {}
        }
    }
}

/// A separate mutable pass marking every node whose content is "suspicious"
/// (a `[Type]` meta-type conversion, or a member access whose name isn't a
/// compile-time constant) and every ancestor up to the root — spec.md
/// section 4.4's Type-constraint row. Kept apart from `SemanticChecker`
/// because `Visitor` only hands out `&Ast`; run this once over a mutable
/// `Ast` before constructing the checker, not during its walk.
pub fn mark_suspicious_content(ast: &mut Ast) {
    let mut flagged = Vec::new();
    for id in 0..ast.len() {
        let suspicious = match &ast.get(id).kind {
            crate::ast::NodeKind::Expr(ExprKind::Convert { type_name, .. }) => type_name.eq_ignore_ascii_case("type"),
            crate::ast::NodeKind::Expr(ExprKind::MemberAccess { member_name, .. }) => {
                !matches!(&ast.get(*member_name).kind, crate::ast::NodeKind::Expr(ExprKind::StringConstant(_)))
            }
            _ => false,
        };
        if suspicious {
            flagged.push(id);
        }
    }
    for id in flagged {
        ast.mark_suspicious_chain(id);
    }
}

fn ends_in_return(ast: &Ast, body: &[NodeId]) -> bool {
    match body.last() {
        Some(last) => matches!(&ast.get(*last).kind, crate::ast::NodeKind::Stmt(StmtKind::Return(Some(_)))),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, NodeKind};
    use crate::value::Value;

    fn push_var(ast: &mut Ast, name: &str) -> NodeId {
        ast.push(
            SourceExtent::empty(),
            NodeKind::Expr(ExprKind::Variable(crate::variable::VariablePath::unqualified(name))),
        )
    }

    #[test]
    fn duplicate_parameter_names_are_reported() {
        let mut ast = Ast::new();
        let params = vec![
            crate::ast::stmt::ParameterAst { name: "x".into(), type_constraint: None, attributes: vec![], default_value: None },
            crate::ast::stmt::ParameterAst { name: "X".into(), type_constraint: None, attributes: vec![], default_value: None },
        ];
        let sb = crate::ast::stmt::ScriptBlockAst {
            param_block: Some(crate::ast::stmt::ParamBlockAst { attributes: vec![], parameters: params }),
            ..Default::default()
        };
        let root = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::ScriptBlock(sb)));
        ast.set_root(root);
        let diags = SemanticChecker::check(&ast, root, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::DuplicateParameterName));
    }

    #[test]
    fn assignment_to_a_variable_is_valid() {
        let mut ast = Ast::new();
        let target = push_var(&mut ast, "x");
        let value = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(1))));
        let assign = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Assignment { target, operator: TokenKind::Equals, value }),
        );
        ast.set_parent(target, assign);
        ast.set_parent(value, assign);
        ast.set_root(assign);
        let diags = SemanticChecker::check(&ast, assign, CheckerOptions::default());
        assert!(!diags.iter().any(|d| d.id == DiagnosticId::InvalidAssignmentTarget));
    }

    #[test]
    fn assignment_to_a_constant_is_invalid() {
        let mut ast = Ast::new();
        let target = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(1))));
        let value = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(2))));
        let assign = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Assignment { target, operator: TokenKind::Equals, value }),
        );
        ast.set_parent(target, assign);
        ast.set_parent(value, assign);
        ast.set_root(assign);
        let diags = SemanticChecker::check(&ast, assign, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::InvalidAssignmentTarget));
    }

    #[test]
    fn break_with_unresolvable_label_reports_label_not_found() {
        let mut ast = Ast::new();
        let label = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::StringConstant("outer".into())));
        let brk = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::Break(Some(label))));
        ast.set_parent(label, brk);
        ast.set_root(brk);
        let diags = SemanticChecker::check(&ast, brk, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::LabelNotFound));
    }

    #[test]
    fn duplicate_hashtable_keys_are_reported() {
        let mut ast = Ast::new();
        let k1 = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::StringConstant("a".into())));
        let v1 = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(1))));
        let k2 = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::StringConstant("a".into())));
        let v2 = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(2))));
        let ht = ast.push(
            SourceExtent::empty(),
            NodeKind::Expr(ExprKind::Hashtable(vec![
                crate::ast::expr::HashtableEntry { key: k1, value: v1 },
                crate::ast::expr::HashtableEntry { key: k2, value: v2 },
            ])),
        );
        for c in [k1, v1, k2, v2] {
            ast.set_parent(c, ht);
        }
        ast.set_root(ht);
        let diags = SemanticChecker::check(&ast, ht, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::DuplicateKey));
    }

    #[test]
    fn foreach_parallel_outside_workflow_is_rejected() {
        let mut ast = Ast::new();
        let var = push_var(&mut ast, "_");
        let coll = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::ArrayLiteral(vec![])));
        let fe = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Foreach {
                variable: var,
                collection: coll,
                body: vec![],
                flags: crate::ast::stmt::ForeachFlags { parallel: true, has_throttle_limit: false },
                label: None,
            }),
        );
        ast.set_parent(var, fe);
        ast.set_parent(coll, fe);
        ast.set_root(fe);
        let diags = SemanticChecker::check(&ast, fe, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::ParallelRequiresWorkflow));
    }

    #[test]
    fn catch_all_before_typed_clause_is_rejected() {
        let mut ast = Ast::new();
        let try_stmt = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Try {
                body: vec![],
                catches: vec![
                    crate::ast::stmt::CatchClause { types: vec![], body: vec![] },
                    crate::ast::stmt::CatchClause { types: vec!["IOException".into()], body: vec![] },
                ],
                finally: None,
            }),
        );
        ast.set_root(try_stmt);
        let diags = SemanticChecker::check(&ast, try_stmt, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::CatchAllNotLast));
    }

    #[test]
    fn break_inside_finally_is_rejected() {
        let mut ast = Ast::new();
        let brk = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::Break(None)));
        let try_stmt = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Try { body: vec![], catches: vec![], finally: Some(vec![brk]) }),
        );
        ast.set_parent(brk, try_stmt);
        ast.set_root(try_stmt);
        let diags = SemanticChecker::check(&ast, try_stmt, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::ControlLeavingFinally));
    }

    #[test]
    fn break_after_finally_in_a_loop_is_fine() {
        // The try/finally is itself the loop body; finally_depth must not
        // leak out to statements outside the finally list.
        let mut ast = Ast::new();
        let inner_brk = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::Break(None)));
        let noop_finally = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::Block(vec![])));
        let try_stmt = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Try { body: vec![], catches: vec![], finally: Some(vec![noop_finally]) }),
        );
        ast.set_parent(noop_finally, try_stmt);
        let for_stmt = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::For { init: None, condition: None, increment: None, body: vec![try_stmt, inner_brk], label: None }),
        );
        ast.set_parent(try_stmt, for_stmt);
        ast.set_parent(inner_brk, for_stmt);
        ast.set_root(for_stmt);
        let diags = SemanticChecker::check(&ast, for_stmt, CheckerOptions::default());
        assert!(!diags.iter().any(|d| d.id == DiagnosticId::ControlLeavingFinally));
    }

    #[test]
    fn this_outside_instance_member_is_rejected() {
        let mut ast = Ast::new();
        let this_ref = push_var(&mut ast, "this");
        ast.set_root(this_ref);
        let diags = SemanticChecker::check(&ast, this_ref, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::ThisOutsideInstanceMember));
    }

    #[test]
    fn this_inside_instance_method_body_is_allowed() {
        let mut ast = Ast::new();
        let this_ref = push_var(&mut ast, "this");
        let method = crate::ast::stmt::FunctionMemberAst {
            name: "DoIt".into(),
            is_static: false,
            is_constructor: false,
            return_type: None,
            parameters: vec![],
            body: vec![this_ref],
            attributes: vec![],
        };
        let type_def = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::TypeDefinition {
                name: "Widget".into(),
                base_types: vec![],
                members: vec![TypeMemberAst::Function(method)],
                attributes: vec![],
                is_enum: false,
            }),
        );
        ast.set_parent(this_ref, type_def);
        ast.set_root(type_def);
        let diags = SemanticChecker::check(&ast, type_def, CheckerOptions::default());
        assert!(!diags.iter().any(|d| d.id == DiagnosticId::ThisOutsideInstanceMember));
    }

    #[test]
    fn typed_method_missing_return_on_a_path_is_reported() {
        let mut ast = Ast::new();
        let method = crate::ast::stmt::FunctionMemberAst {
            name: "Compute".into(),
            is_static: false,
            is_constructor: false,
            return_type: Some("int".into()),
            parameters: vec![],
            body: vec![],
            attributes: vec![],
        };
        let type_def = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::TypeDefinition {
                name: "Widget".into(),
                base_types: vec![],
                members: vec![TypeMemberAst::Function(method)],
                attributes: vec![],
                is_enum: false,
            }),
        );
        ast.set_root(type_def);
        let diags = SemanticChecker::check(&ast, type_def, CheckerOptions::default());
        assert!(diags.iter().any(|d| d.id == DiagnosticId::MethodHasCodePathNotReturn));
    }

    #[test]
    fn mark_suspicious_content_flags_type_conversion_and_ancestors() {
        let mut ast = Ast::new();
        let name = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::StringConstant("x".into())));
        let convert = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Convert { type_name: "type".into(), child: name }));
        let wrapper = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Paren(convert)));
        ast.set_parent(name, convert);
        ast.set_parent(convert, wrapper);
        ast.set_root(wrapper);
        mark_suspicious_content(&mut ast);
        assert!(ast.get(convert).has_suspicious_content);
        assert!(ast.get(wrapper).has_suspicious_content);
    }
}
