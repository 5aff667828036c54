//! Statement lowering (spec.md section 4.6.1/4.6.2): turns one `StmtKind`
//! node into `LoweredStmt`, and a statement list into a `LoweredBlock` with
//! its sequence points. Continues `compiler::expr`'s `Compiler` via a second
//! inherent `impl` block so both files share the one struct.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::expr::{ExprKind, UnaryOp};
use crate::ast::stmt::{
    CatchClause, ForeachFlags, NamedBlockKind, ParameterAst, PipeElement, Redirection,
    ScriptBlockAst, SwitchClause, SwitchFlags, TrapAst,
};
use crate::ast::token::TokenKind;
use crate::ast::visitor::CompilingVisitor;
use crate::ast::{Ast, NodeId, NodeKind, StmtKind};
use crate::extent::SourceExtent;
use crate::flow::FlowSignal;
use crate::parameters::{self, LazyDefault, ParameterDescriptor};
use crate::value::Value;
use crate::variable::{TupleLayout, VariablePath};

use super::callsite::{intern_binary_site, BinarySiteKey};
use super::expr::Compiler;
use super::ir::{
    Assignable, BreakableScope, CatchDispatchEntry, CompiledScriptBlock, Lowered, LoopKind,
    LoopTarget, LoweredBlock, LoweredStmt, SwitchClauseLowered,
};
use super::policy;
use super::redirection;

impl<'a> Compiler<'a> {
    /// Lower a statement list into a `LoweredBlock`, one sequence point per
    /// source statement (spec.md section 4.6.2). A `trap` statement found in
    /// the list does not become its own entry — it is compiled as a separate
    /// entry point and spliced in as a `TrapPush` at its declared position
    /// with a matching `TrapPop` appended at the block's end, since a trap's
    /// scope is the remainder of the block it appears in.
    pub(super) fn lower_block(&mut self, ast: &Ast, stmt_ids: &[NodeId]) -> LoweredBlock {
        let mut statements = Vec::with_capacity(stmt_ids.len());
        let mut sequence_points = Vec::with_capacity(stmt_ids.len());
        let mut traps_pushed = 0;
        for &id in stmt_ids {
            let extent = ast.get(id).extent.clone();
            if let NodeKind::Stmt(StmtKind::Trap(trap)) = &ast.get(id).kind {
                let trap = trap.clone();
                let entry_point_index = self.compile_trap(ast, &trap);
                statements.push(LoweredStmt::TrapPush { entry_point_index, type_name: trap.type_name });
                sequence_points.push(extent);
                traps_pushed += 1;
                continue;
            }
            statements.push(self.lower_stmt_node(ast, id));
            sequence_points.push(extent);
        }
        for _ in 0..traps_pushed {
            statements.push(LoweredStmt::TrapPop);
            sequence_points.push(SourceExtent::empty());
        }
        LoweredBlock::new(statements, sequence_points)
    }

    fn lower_stmt_node(&mut self, ast: &Ast, id: NodeId) -> LoweredStmt {
        let kind = ast.get(id).kind.clone();
        match kind {
            NodeKind::Stmt(s) => self.lower_stmt(ast, id, &s),
            NodeKind::Expr(e) => LoweredStmt::Expression(self.lower_expr(ast, id, &e)),
        }
    }

    fn lower_exprs(&mut self, ast: &Ast, ids: &[NodeId]) -> Vec<Lowered> {
        ids.iter().map(|id| self.compile_child(ast, *id)).collect()
    }

    pub(super) fn lower_stmt(&mut self, ast: &Ast, id: NodeId, kind: &StmtKind) -> LoweredStmt {
        let _ = id;
        match kind {
            StmtKind::Pipeline { elements, background } => self.lower_pipeline(ast, elements, *background),
            StmtKind::Command { name, arguments } => {
                LoweredStmt::Expression(Lowered::CommandInvocation { name: name.clone(), arguments: self.lower_exprs(ast, arguments) })
            }
            StmtKind::CommandExpression(e) => LoweredStmt::Expression(self.compile_child(ast, *e)),
            StmtKind::CommandParameter { name, value } => LoweredStmt::Expression(Lowered::CommandParameter {
                name: name.clone(),
                value: (*value).map(|v| Box::new(self.compile_child(ast, v))),
            }),
            StmtKind::Assignment { target, operator, value } => self.lower_assignment(ast, *target, *operator, *value),
            StmtKind::If { branches, else_body } => self.lower_if(ast, branches, else_body.as_deref()),
            StmtKind::Switch { condition, clauses, default, flags, label } => {
                self.lower_switch(ast, *condition, clauses, default.as_deref(), *flags, label.clone())
            }
            StmtKind::For { init, condition, increment, body, label } => {
                self.lower_for(ast, *init, *condition, *increment, body, label.clone())
            }
            StmtKind::Foreach { variable, collection, body, flags, label } => {
                self.lower_foreach(ast, *variable, *collection, body, *flags, label.clone())
            }
            StmtKind::While { condition, body, label } => self.lower_while_like(LoopKind::While, ast, *condition, body, label.clone()),
            StmtKind::DoWhile { condition, body, label } => self.lower_while_like(LoopKind::DoWhile, ast, *condition, body, label.clone()),
            StmtKind::DoUntil { condition, body, label } => self.lower_while_like(LoopKind::DoUntil, ast, *condition, body, label.clone()),
            StmtKind::Try { body, catches, finally } => self.lower_try(ast, body, catches, finally.as_deref()),
            StmtKind::Trap(_) => {
                // Standalone trap statements are consumed directly by
                // `lower_block`, which splices the push/pop around the
                // block itself; reaching this arm only happens via a direct
                // `CompilingVisitor::compile_stmt` call on a bare trap node,
                // which has no enclosing block to attach a pop to.
                LoweredStmt::Block(LoweredBlock::default())
            }
            StmtKind::Throw(value) => LoweredStmt::Throw((*value).map(|v| self.compile_child(ast, v))),
            StmtKind::Return(value) => {
                let value = (*value).map(|v| self.compile_child(ast, v));
                LoweredStmt::Return { value, inside_trap: self.in_trap_depth > 0 }
            }
            StmtKind::Exit(value) => LoweredStmt::Exit((*value).map(|v| self.compile_child(ast, v))),
            StmtKind::Break(label_expr) => {
                let label = self.literal_label(ast, *label_expr);
                self.resolve_break(label)
            }
            StmtKind::Continue(label_expr) => {
                let label = self.literal_label(ast, *label_expr);
                self.resolve_continue(label)
            }
            StmtKind::Data { variable_name, supported_commands, body } => {
                // The restricted-command allow-list is enforced ahead of
                // time by `semantic::restricted`; lowering only needs the
                // binding target.
                let _ = supported_commands;
                let variable = variable_name.as_ref().map(|name| Assignable::DynamicVariable(VariablePath::unqualified(name.clone())));
                LoweredStmt::Data { variable, body: self.lower_block(ast, body) }
            }
            StmtKind::Block(body) => LoweredStmt::Block(self.lower_block(ast, body)),
            StmtKind::FunctionDefinition { name, parameter_list, body, .. } => {
                let compiled = compile_nested(ast, body, parameter_list);
                LoweredStmt::FunctionDef { name: name.clone(), compiled: Box::new(compiled) }
            }
            StmtKind::TypeDefinition { name, .. } => LoweredStmt::TypeDef { name: name.clone() },
            StmtKind::ScriptBlock(sb) => {
                // A bare `{ ... }` script-block in statement position is
                // otherwise indistinguishable from a named function body;
                // the empty name tells the evaluator this is a
                // value-producing closure literal, not a declaration to
                // register (spec.md section 1, command discovery is out of
                // scope for this core).
                let compiled = compile_nested(ast, sb, &[]);
                LoweredStmt::FunctionDef { name: String::new(), compiled: Box::new(compiled) }
            }
        }
    }

    fn lower_pipeline(&mut self, ast: &Ast, elements: &[PipeElement], background: bool) -> LoweredStmt {
        // Background execution (`cmd &`) is a pipeline-host scheduling
        // concern (spec.md section 6); the core only lowers the expression
        // tree each element evaluates.
        let _ = background;
        let mut per_element = Vec::with_capacity(elements.len());
        for element in elements {
            let command_lowered = self.compile_child(ast, element.command);
            let redirection_targets: Vec<(Redirection, Option<Lowered>)> = element
                .redirections
                .iter()
                .map(|r| match r {
                    Redirection::ToFile { target, .. } => (r.clone(), Some(self.compile_child(ast, *target))),
                    Redirection::Merge { .. } => (r.clone(), None),
                })
                .collect();
            let body = LoweredBlock::new(vec![LoweredStmt::Expression(command_lowered)], vec![ast.get(element.command).extent.clone()]);
            per_element.push(redirection::lower_redirected_body(redirection_targets, body));
        }
        if per_element.len() == 1 {
            per_element.into_iter().next().unwrap()
        } else {
            let sequence_points = elements.iter().map(|e| ast.get(e.command).extent.clone()).collect();
            LoweredStmt::Block(LoweredBlock::new(per_element, sequence_points))
        }
    }

    fn lower_assignment(&mut self, ast: &Ast, target: NodeId, operator: TokenKind, value: NodeId) -> LoweredStmt {
        let assignable = self.lower_assignable(ast, target);
        if let Assignable::Tuple(targets) = assignable {
            let rhs = self.compile_child(ast, value);
            return LoweredStmt::MultiAssign { targets, rhs };
        }
        if let Some(arith_op) = operator.underlying_arithmetic() {
            // `x += y` desugars to `x = x + y` (spec.md section 4.6.1).
            let current = self.read_assignable(&assignable);
            let rhs_operand = self.compile_child(ast, value);
            let site = intern_binary_site(BinarySiteKey { operator: arith_op, ignore_case: false, scalar_compare: false });
            let extent = ast.get(target).extent.clone();
            let rhs = Lowered::DynamicBinaryOp { site, op: arith_op, left: Box::new(current), right: Box::new(rhs_operand), extent };
            return LoweredStmt::Assign { target: assignable, rhs };
        }
        let rhs = self.compile_child(ast, value);
        LoweredStmt::Assign { target: assignable, rhs }
    }

    /// Read back an assignable target as a value-producing `Lowered`, used
    /// only to desugar compound assignment. `(a, b) += x` is not a shape the
    /// grammar produces, so `Tuple` falls back to `Error` rather than
    /// panicking.
    fn read_assignable(&mut self, assignable: &Assignable) -> Lowered {
        match assignable {
            Assignable::Local(slot) => Lowered::LocalGet(*slot),
            Assignable::DynamicVariable(path) => Lowered::DynamicVariableGet(path.clone()),
            Assignable::Member { target, name, site } => {
                Lowered::MemberAccessDynamic { target: target.clone(), member_name: name.clone(), site: *site, is_static: false }
            }
            Assignable::Index { target, index, site } => {
                Lowered::IndexGetDynamic { target: target.clone(), index: index.clone(), site: *site, is_multi_index: false }
            }
            Assignable::Tuple(_) => Lowered::Error,
        }
    }

    fn lower_if(&mut self, ast: &Ast, branches: &[(NodeId, Vec<NodeId>)], else_body: Option<&[NodeId]>) -> LoweredStmt {
        let branches = branches.iter().map(|(cond, body)| (self.compile_child(ast, *cond), self.lower_block(ast, body))).collect();
        let else_body = else_body.map(|b| self.lower_block(ast, b));
        LoweredStmt::If { branches, else_body }
    }

    fn lower_switch(
        &mut self,
        ast: &Ast,
        condition: NodeId,
        clauses: &[SwitchClause],
        default: Option<&[NodeId]>,
        flags: SwitchFlags,
        label: Option<String>,
    ) -> LoweredStmt {
        let condition = self.compile_child(ast, condition);
        self.scopes.push(BreakableScope::Switch(label.clone()));
        let clauses = clauses
            .iter()
            .map(|c| {
                let constant_script_block = constant_script_block_root(ast, c.condition);
                let clause_condition = self.compile_child(ast, c.condition);
                let body = self.lower_block(ast, &c.body);
                SwitchClauseLowered { constant_script_block, condition: clause_condition, body }
            })
            .collect();
        let default = default.map(|b| self.lower_block(ast, b));
        self.scopes.pop();
        LoweredStmt::Switch { condition, clauses, default, flags, label }
    }

    fn lower_for(
        &mut self,
        ast: &Ast,
        init: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: &[NodeId],
        label: Option<String>,
    ) -> LoweredStmt {
        let init = init.map(|i| Box::new(self.lower_stmt_node(ast, i)));
        let condition = condition.map(|c| self.compile_child(ast, c));
        let increment = increment.map(|i| self.compile_child(ast, i));
        let target = self.push_loop(label);
        let body = self.lower_block(ast, body);
        self.scopes.pop();
        LoweredStmt::Loop { kind: LoopKind::For, init, condition, increment, body, target }
    }

    fn lower_while_like(&mut self, kind: LoopKind, ast: &Ast, condition: NodeId, body: &[NodeId], label: Option<String>) -> LoweredStmt {
        let condition = self.compile_child(ast, condition);
        let target = self.push_loop(label);
        let body = self.lower_block(ast, body);
        self.scopes.pop();
        LoweredStmt::Loop { kind, init: None, condition: Some(condition), increment: None, body, target }
    }

    fn lower_foreach(&mut self, ast: &Ast, variable: NodeId, collection: NodeId, body: &[NodeId], flags: ForeachFlags, label: Option<String>) -> LoweredStmt {
        // `-Parallel`/`-ThrottleLimit` are pipeline-host concurrency
        // concerns (spec.md Non-goals); the core only lowers the loop shape.
        let _ = flags;
        let variable = self.lower_assignable(ast, variable);
        let collection = self.compile_child(ast, collection);
        let target = self.push_loop(label);
        let body = self.lower_block(ast, body);
        self.scopes.pop();
        LoweredStmt::Foreach { variable, collection, body, target }
    }

    fn push_loop(&mut self, label: Option<String>) -> LoopTarget {
        let continue_target = self.next_label_id;
        self.next_label_id += 1;
        let break_target = self.next_label_id;
        self.next_label_id += 1;
        let target = LoopTarget { label, continue_target, break_target };
        self.scopes.push(BreakableScope::Loop(target.clone()));
        target
    }

    fn lower_try(&mut self, ast: &Ast, body: &[NodeId], catches: &[CatchClause], finally: Option<&[NodeId]>) -> LoweredStmt {
        let body = self.lower_block(ast, body);
        let mut catch_all = None;
        let mut typed_catches = Vec::new();
        for c in catches {
            let handler = self.lower_block(ast, &c.body);
            if c.types.is_empty() {
                catch_all = Some(handler);
            } else {
                typed_catches.push(CatchDispatchEntry { type_names: c.types.clone(), handler });
            }
        }
        let finally = finally.map(|f| self.lower_block(ast, f));
        LoweredStmt::TryCatchFinally { body, catch_all, typed_catches, finally }
    }

    fn compile_trap(&mut self, ast: &Ast, trap: &TrapAst) -> usize {
        self.in_trap_depth += 1;
        let body = self.lower_block(ast, &trap.body);
        self.in_trap_depth -= 1;
        let index = self.traps.len();
        self.traps.push(body);
        index
    }

    /// A break/continue label is always a compile-time string in the
    /// grammar; anything else reaching here was already rejected by the
    /// semantic checker, so it is treated as unlabelled rather than panicking.
    fn literal_label(&mut self, ast: &Ast, label_expr: Option<NodeId>) -> Option<String> {
        let id = label_expr?;
        match &ast.get(id).kind {
            NodeKind::Expr(ExprKind::StringConstant(s)) => Some(s.clone()),
            NodeKind::Expr(ExprKind::Constant(Value::String(s))) => Some(s.to_string()),
            _ => None,
        }
    }

    /// Resolve a `break`'s target against the nesting stack (spec.md section
    /// 4.6.1): a matching loop becomes a direct goto; a matching switch (no
    /// loop-style continuation point of its own) always throws.
    fn resolve_break(&mut self, label: Option<String>) -> LoweredStmt {
        for scope in self.scopes.iter().rev() {
            match scope {
                BreakableScope::Loop(target) if FlowSignal::matches_loop_label(&label, target.label.as_deref()) => {
                    return LoweredStmt::BreakGoto(target.break_target);
                }
                BreakableScope::Switch(switch_label) if FlowSignal::matches_loop_label(&label, switch_label.as_deref()) => {
                    return LoweredStmt::BreakThrow(label);
                }
                _ => {}
            }
        }
        LoweredStmt::BreakThrow(label)
    }

    /// `continue` passes transparently through any enclosing `switch` scope
    /// to the next enclosing loop (spec.md section 4.6.1) — a switch has no
    /// continuation point for `continue` to target.
    fn resolve_continue(&mut self, label: Option<String>) -> LoweredStmt {
        for scope in self.scopes.iter().rev() {
            if let BreakableScope::Loop(target) = scope {
                if FlowSignal::matches_loop_label(&label, target.label.as_deref()) {
                    return LoweredStmt::ContinueGoto(target.continue_target);
                }
            }
        }
        LoweredStmt::ContinueThrow(label)
    }

    /// Compile a script block's four entry points using `self`'s existing
    /// `tuple_layout`, populated ahead of time by an external
    /// variable-analysis pass (spec.md section 3). Returns everything
    /// `CompiledScriptBlock` needs except the layout itself, which the
    /// caller already owns.
    pub(super) fn compile_inner(&mut self, ast: &Ast, sb: &ScriptBlockAst, explicit_parameters: &[ParameterAst]) -> CompiledScriptBlock {
        let mut compiled = CompiledScriptBlock::default();

        let param_asts: &[ParameterAst] = sb.param_block.as_ref().map(|pb| pb.parameters.as_slice()).unwrap_or(explicit_parameters);
        compiled.parameters = param_asts
            .iter()
            .map(|p| parameters::materialize_parameter(ast, p, &|a, i| fold_constant(a, i), &make_lazy_default))
            .collect::<Vec<ParameterDescriptor>>();

        let trap_entries: Vec<(usize, Option<String>)> = sb
            .traps
            .iter()
            .map(|t| {
                let index = self.compile_trap(ast, t);
                (index, t.type_name.clone())
            })
            .collect();

        for nb in &sb.named_blocks {
            let body = self.lower_block(ast, &nb.body);
            let wrapped = wrap_with_traps(body, &trap_entries);
            match nb.kind {
                NamedBlockKind::DynamicParam => compiled.dynamic_param = Some(wrapped),
                NamedBlockKind::Begin => compiled.begin = Some(wrapped),
                NamedBlockKind::Process => compiled.process = Some(wrapped),
                NamedBlockKind::End => compiled.end = Some(wrapped),
            }
        }
        compiled.traps = std::mem::take(&mut self.traps);

        let total: usize = [&compiled.dynamic_param, &compiled.begin, &compiled.process, &compiled.end]
            .into_iter()
            .filter_map(|b| b.as_ref())
            .map(LoweredBlock::total_statement_count)
            .sum();
        compiled.never_jit = policy::should_never_jit(total);
        compiled
    }
}

impl<'a> CompilingVisitor<Lowered> for Compiler<'a> {
    fn compile_expr(&mut self, ast: &Ast, id: NodeId, kind: &ExprKind) -> Lowered {
        self.lower_expr(ast, id, kind)
    }

    fn compile_stmt(&mut self, ast: &Ast, id: NodeId, kind: &StmtKind) -> Lowered {
        Lowered::Stmt(Box::new(self.lower_stmt(ast, id, kind)))
    }
}

fn constant_script_block_root(ast: &Ast, id: NodeId) -> Option<usize> {
    match &ast.get(id).kind {
        NodeKind::Expr(ExprKind::ScriptBlockExpr(root)) => Some(*root),
        _ => None,
    }
}

/// Prepend/append the `TrapPush`/`TrapPop` pair for each of a script block's
/// own traps around one already-lowered entry point (spec.md section
/// 4.6.1). Each of `dynamic_param`/`begin`/`process`/`end` gets the same
/// wrapping rather than recompiling the trap body once per entry point.
fn wrap_with_traps(body: LoweredBlock, traps: &[(usize, Option<String>)]) -> LoweredBlock {
    if traps.is_empty() {
        return body;
    }
    let mut statements = Vec::with_capacity(body.statements.len() + traps.len() * 2);
    let mut sequence_points = Vec::with_capacity(body.sequence_points.len() + traps.len() * 2);
    for (entry_point_index, type_name) in traps {
        statements.push(LoweredStmt::TrapPush { entry_point_index: *entry_point_index, type_name: type_name.clone() });
        sequence_points.push(SourceExtent::empty());
    }
    statements.extend(body.statements);
    sequence_points.extend(body.sequence_points);
    for _ in traps {
        statements.push(LoweredStmt::TrapPop);
        sequence_points.push(SourceExtent::empty());
    }
    LoweredBlock::new(statements, sequence_points)
}

/// Compile a nested function/script-block definition eagerly, standing a
/// fresh (empty) tuple layout in for the per-scope variable-analysis pass a
/// real host would run on this nested scope before handing it to the
/// compiler (spec.md section 6: variable analysis is a consumer-side
/// interface this core does not implement). Registering the resulting name
/// into the enclosing scope is the evaluator's job.
fn compile_nested(ast: &Ast, sb: &ScriptBlockAst, explicit_parameters: &[ParameterAst]) -> CompiledScriptBlock {
    let tuple_layout = TupleLayout::new();
    let mut compiler = Compiler::new(&tuple_layout);
    let mut compiled = compiler.compile_inner(ast, sb, explicit_parameters);
    compiled.tuple_layout = tuple_layout.clone();
    compiled
}

/// Best-effort constant folding for attribute arguments and parameter
/// defaults (spec.md section 4.5). Anything not reducible to a literal
/// shape folds to `Null` — the semantic checker's constant-argument rule
/// already rejected those inputs before they could reach this stage for the
/// positions that require a true constant.
fn fold_constant(ast: &Ast, id: NodeId) -> Value {
    match &ast.get(id).kind {
        NodeKind::Expr(ExprKind::Constant(v)) => v.clone(),
        NodeKind::Expr(ExprKind::StringConstant(s)) => Value::string(s.clone()),
        NodeKind::Expr(ExprKind::ArrayLiteral(items)) => Value::array(items.iter().map(|i| fold_constant(ast, *i)).collect()),
        NodeKind::Expr(ExprKind::Hashtable(entries)) => {
            let map: IndexMap<String, Value> = entries.iter().map(|e| (fold_constant(ast, e.key).to_coerced_string(), fold_constant(ast, e.value))).collect();
            Value::Ordered(Rc::new(map))
        }
        NodeKind::Expr(ExprKind::Paren(inner)) => fold_constant(ast, *inner),
        NodeKind::Expr(ExprKind::Unary { op, operand }) => negate_constant(op, fold_constant(ast, *operand)),
        _ => Value::Null,
    }
}

fn negate_constant(op: &UnaryOp, value: Value) -> Value {
    match (op, value) {
        (UnaryOp::Minus, Value::Int(i)) => Value::Int(-i),
        (UnaryOp::Minus, Value::Double(d)) => Value::Double(-d),
        (UnaryOp::Not, v) => Value::Bool(!v.is_truthy()),
        (_, v) => v,
    }
}

/// A lazily-evaluated default needs the live function context (variable
/// table, current script-block) that only the evaluator holds at call time;
/// the compiler can only mark where the hook attaches (spec.md section 6,
/// the evaluator is a named external collaborator), not execute it.
fn make_lazy_default(_id: NodeId) -> LazyDefault {
    Rc::new(|| Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::stmt::{ParamBlockAst, PipeElement};
    use crate::variable::TupleLayout;

    fn pipeline_ast(command_value: Value) -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let constant = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(command_value)));
        let cmd_expr = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::CommandExpression(constant)));
        ast.set_parent(constant, cmd_expr);
        let pipeline = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Pipeline { elements: vec![PipeElement { command: cmd_expr, redirections: vec![] }], background: false }),
        );
        ast.set_parent(cmd_expr, pipeline);
        ast.set_root(pipeline);
        (ast, pipeline)
    }

    #[test]
    fn single_element_pipeline_lowers_without_a_block_wrapper() {
        let (ast, pipeline) = pipeline_ast(Value::Int(1));
        let layout = TupleLayout::new();
        let mut compiler = Compiler::new(&layout);
        let lowered = compiler.compile_child(&ast, pipeline);
        assert!(matches!(lowered, Lowered::Stmt(stmt) if matches!(*stmt, LoweredStmt::Expression(_))));
    }

    #[test]
    fn break_inside_a_loop_lowers_to_a_direct_goto() {
        let mut ast = Ast::new();
        let condition = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Bool(true))));
        let brk = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::Break(None)));
        let while_stmt = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::While { condition, body: vec![brk], label: None }),
        );
        ast.set_parent(condition, while_stmt);
        ast.set_parent(brk, while_stmt);
        ast.set_root(while_stmt);
        let layout = TupleLayout::new();
        let mut compiler = Compiler::new(&layout);
        let lowered = compiler.compile_child(&ast, while_stmt);
        match lowered {
            Lowered::Stmt(stmt) => match *stmt {
                LoweredStmt::Loop { body, .. } => {
                    assert!(matches!(body.statements[0], LoweredStmt::BreakGoto(_)));
                }
                other => panic!("expected a Loop statement, got {other:?}"),
            },
            other => panic!("expected a Stmt wrapper, got {other:?}"),
        }
    }

    #[test]
    fn break_inside_a_switch_lowers_to_a_throw() {
        let mut ast = Ast::new();
        let condition = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(1))));
        let clause_cond = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(1))));
        let brk = ast.push(SourceExtent::empty(), NodeKind::Stmt(StmtKind::Break(None)));
        let switch_stmt = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Switch {
                condition,
                clauses: vec![SwitchClause { condition: clause_cond, body: vec![brk] }],
                default: None,
                flags: SwitchFlags::default(),
                label: None,
            }),
        );
        ast.set_parent(condition, switch_stmt);
        ast.set_parent(clause_cond, switch_stmt);
        ast.set_parent(brk, switch_stmt);
        ast.set_root(switch_stmt);
        let layout = TupleLayout::new();
        let mut compiler = Compiler::new(&layout);
        let lowered = compiler.compile_child(&ast, switch_stmt);
        match lowered {
            Lowered::Stmt(stmt) => match *stmt {
                LoweredStmt::Switch { clauses, .. } => {
                    assert!(matches!(clauses[0].body.statements[0], LoweredStmt::BreakThrow(None)));
                }
                other => panic!("expected a Switch statement, got {other:?}"),
            },
            other => panic!("expected a Stmt wrapper, got {other:?}"),
        }
    }

    #[test]
    fn compound_assignment_desugars_to_a_dynamic_binary_op() {
        let mut ast = Ast::new();
        let target = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Variable(VariablePath::unqualified("x"))));
        let rhs = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(1))));
        let assign = ast.push(
            SourceExtent::empty(),
            NodeKind::Stmt(StmtKind::Assignment { target, operator: TokenKind::PlusEquals, value: rhs }),
        );
        ast.set_parent(target, assign);
        ast.set_parent(rhs, assign);
        ast.set_root(assign);
        let layout = TupleLayout::new();
        let mut compiler = Compiler::new(&layout);
        let lowered = compiler.compile_child(&ast, assign);
        match lowered {
            Lowered::Stmt(stmt) => match *stmt {
                LoweredStmt::Assign { rhs, .. } => assert!(matches!(rhs, Lowered::DynamicBinaryOp { op: TokenKind::Plus, .. })),
                other => panic!("expected an Assign statement, got {other:?}"),
            },
            other => panic!("expected a Stmt wrapper, got {other:?}"),
        }
    }

    #[test]
    fn empty_named_blocks_produce_an_empty_compiled_script_block() {
        let ast = Ast::new();
        let sb = ScriptBlockAst { param_block: Some(ParamBlockAst::default()), named_blocks: vec![], using_statements: vec![], traps: vec![], is_filter: false };
        let compiled = compile_nested(&ast, &sb, &[]);
        assert!(compiled.dynamic_param.is_none());
        assert!(compiled.begin.is_none());
        assert!(!compiled.never_jit);
    }
}
