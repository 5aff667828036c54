//! The expression-tree compiler (spec.md section 4.6): lowers a checked AST
//! into `ir::Lowered`/`ir::LoweredStmt`, the "executable intermediate form
//! suitable for a light interpreter or JIT" (spec.md section 2). Submodules
//! mirror the lowering rules' own groupings: `expr` for expressions,
//! `stmt` for statements and script-block assembly, `ir` for the IR shapes
//! both produce, `callsite` for the dynamic inline-cache allocator,
//! `policy` for the compile-vs-interpret decision, `redirection` for the
//! file/merge-redirection lowering helper.

mod callsite;
mod expr;
mod ir;
mod policy;
mod redirection;
mod stmt;

pub use callsite::{binary_site_key, intern_binary_site, BinarySiteKey, CallSite, CallSiteId, MonomorphicCache};
pub use expr::Compiler;
pub use ir::{
    ArrayExprShape, Assignable, BreakableScope, CatchDispatchEntry, CompiledScriptBlock, Lowered, LoopKind, LoopTarget,
    LoweredBlock, LoweredRedirection, LoweredRedirectionKind, LoweredStmt, SwitchClauseLowered,
};
pub use policy::{LoopCounter, LOOP_JIT_ITERATION_THRESHOLD, NEVER_JIT_STATEMENT_THRESHOLD};
pub use redirection::{expand_all_stream, order_bind_before_merge};

use crate::ast::stmt::{ParameterAst, ScriptBlockAst};
use crate::ast::Ast;
use crate::variable::TupleLayout;

/// Compile one script block's four entry points (spec.md section 4.6),
/// given the `tuple_layout` an external variable-analysis pass already
/// populated for it (spec.md section 3) and the declared-but-not-`param`-
/// blocked parameter list a `function Name($a, $b) { }` carries (empty for
/// every other script-block shape, which instead declares parameters via
/// its own `param` block).
pub fn compile_script_block(ast: &Ast, script_block: &ScriptBlockAst, tuple_layout: &TupleLayout, explicit_parameters: &[ParameterAst]) -> CompiledScriptBlock {
    let mut compiler = Compiler::new(tuple_layout);
    let mut compiled = compiler.compile_inner(ast, script_block, explicit_parameters);
    compiled.tuple_layout = tuple_layout.clone();
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::stmt::{NamedBlockAst, NamedBlockKind, ParamBlockAst};

    #[test]
    fn compiling_an_empty_end_block_produces_one_entry_point() {
        let mut ast = Ast::new();
        let constant = ast.push(crate::extent::SourceExtent::empty(), crate::ast::NodeKind::Expr(crate::ast::ExprKind::Constant(crate::value::Value::Int(1))));
        let cmd = ast.push(crate::extent::SourceExtent::empty(), crate::ast::NodeKind::Stmt(crate::ast::StmtKind::CommandExpression(constant)));
        ast.set_parent(constant, cmd);
        let sb = ScriptBlockAst {
            param_block: Some(ParamBlockAst::default()),
            named_blocks: vec![NamedBlockAst { kind: NamedBlockKind::End, body: vec![cmd], unnamed: true }],
            using_statements: vec![],
            traps: vec![],
            is_filter: false,
        };
        let layout = TupleLayout::new();
        let compiled = compile_script_block(&ast, &sb, &layout, &[]);
        assert!(compiled.dynamic_param.is_none());
        assert!(compiled.begin.is_none());
        assert!(compiled.process.is_none());
        assert_eq!(compiled.end.unwrap().statements.len(), 1);
    }
}
