//! Parameter and attribute materialization (spec.md section 4.5): turning
//! a `ParameterAst`/attribute list into the runtime descriptors the binder
//! consumes, and resolving default values ahead of a call where they are
//! compile-time constants.
//!
//! The host's real attribute set (`CmdletBinding`, `Parameter`,
//! `OutputType`, ...) is reflection-backed there; here it is a small closed
//! enum with a fast construction path, falling back to a generic
//! `Custom` record for anything else — matching Design Notes section 9's
//! "small per-object-kind v-table" approach applied to attributes instead
//! of methods.

use std::rc::Rc;

use crate::ast::expr::ExprKind;
use crate::ast::stmt::ParameterAst;
use crate::ast::{Ast, NodeId};
use crate::value::Value;

/// A materialized attribute. Built-in kinds get a dedicated variant so the
/// binder/compiler can match on them directly instead of string-comparing
/// a type name on every lookup; everything else falls into `Custom`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    CmdletBinding { positional_binding: bool, default_parameter_set_name: Option<String> },
    Parameter { mandatory: bool, position: Option<i32>, value_from_pipeline: bool, parameter_set_name: Option<String> },
    OutputType { types: Vec<String> },
    Alias { names: Vec<String> },
    ValidateSet { values: Vec<String>, ignore_case: bool },
    ValidateNotNull,
    ValidateNotNullOrEmpty,
    DebuggerHidden,
    Custom { type_name: String, positional_args: Vec<Value>, named_args: Vec<(String, Value)> },
}

impl AttributeValue {
    pub fn type_name(&self) -> &str {
        match self {
            AttributeValue::CmdletBinding { .. } => "CmdletBinding",
            AttributeValue::Parameter { .. } => "Parameter",
            AttributeValue::OutputType { .. } => "OutputType",
            AttributeValue::Alias { .. } => "Alias",
            AttributeValue::ValidateSet { .. } => "ValidateSet",
            AttributeValue::ValidateNotNull => "ValidateNotNull",
            AttributeValue::ValidateNotNullOrEmpty => "ValidateNotNullOrEmpty",
            AttributeValue::DebuggerHidden => "DebuggerHidden",
            AttributeValue::Custom { type_name, .. } => type_name,
        }
    }
}

/// Build an `AttributeValue` from an `ExprKind::Attribute` node, taking the
/// fast built-in path when the type name is recognized and constant-folding
/// its arguments (they must already have passed the semantic checker's
/// constant-argument rule). Falls back to `Custom` for unknown attribute
/// types, which a real host would construct reflectively.
pub fn materialize_attribute(ast: &Ast, id: NodeId, fold: &impl Fn(&Ast, NodeId) -> Value) -> AttributeValue {
    let (type_name, positional_args, named_args) = match &ast.get(id).kind {
        crate::ast::NodeKind::Expr(ExprKind::Attribute { type_name, positional_args, named_args }) => {
            (type_name.clone(), positional_args.clone(), named_args.clone())
        }
        _ => return AttributeValue::Custom { type_name: String::new(), positional_args: vec![], named_args: vec![] },
    };

    let named: Vec<(String, Value)> = named_args.iter().map(|(n, v)| (n.clone(), fold(ast, *v))).collect();
    let named_str = |name: &str| named.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.to_coerced_string());
    let named_bool = |name: &str| named.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.is_truthy()).unwrap_or(false);
    let named_int = |name: &str| named.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).and_then(|(_, v)| match v {
        Value::Int(i) => Some(*i as i32),
        _ => None,
    });

    match type_name.as_str() {
        t if t.eq_ignore_ascii_case("CmdletBinding") => AttributeValue::CmdletBinding {
            positional_binding: named.iter().find(|(n, _)| n.eq_ignore_ascii_case("PositionalBinding")).map(|(_, v)| v.is_truthy()).unwrap_or(true),
            default_parameter_set_name: named_str("DefaultParameterSetName"),
        },
        t if t.eq_ignore_ascii_case("Parameter") => AttributeValue::Parameter {
            mandatory: named_bool("Mandatory"),
            position: named_int("Position"),
            value_from_pipeline: named_bool("ValueFromPipeline"),
            parameter_set_name: named_str("ParameterSetName"),
        },
        t if t.eq_ignore_ascii_case("OutputType") => AttributeValue::OutputType {
            types: positional_args.iter().map(|a| fold(ast, *a).to_coerced_string()).collect(),
        },
        t if t.eq_ignore_ascii_case("Alias") => AttributeValue::Alias {
            names: positional_args.iter().map(|a| fold(ast, *a).to_coerced_string()).collect(),
        },
        t if t.eq_ignore_ascii_case("ValidateSet") => AttributeValue::ValidateSet {
            values: positional_args.iter().map(|a| fold(ast, *a).to_coerced_string()).collect(),
            ignore_case: named.iter().find(|(n, _)| n.eq_ignore_ascii_case("IgnoreCase")).map(|(_, v)| v.is_truthy()).unwrap_or(true),
        },
        t if t.eq_ignore_ascii_case("ValidateNotNull") => AttributeValue::ValidateNotNull,
        t if t.eq_ignore_ascii_case("ValidateNotNullOrEmpty") => AttributeValue::ValidateNotNullOrEmpty,
        t if t.eq_ignore_ascii_case("DebuggerHidden") => AttributeValue::DebuggerHidden,
        other => AttributeValue::Custom {
            type_name: other.to_string(),
            positional_args: positional_args.iter().map(|a| fold(ast, *a)).collect(),
            named_args: named,
        },
    }
}

/// The default value for a parameter whose source declared none, keyed by
/// its static type (spec.md section 4.5, "default value by type"). Used
/// only when `ParameterAst::default_value` is absent.
pub fn default_value_for_type(type_name: Option<&str>) -> Value {
    match type_name {
        Some(t) if t.eq_ignore_ascii_case("int") || t.eq_ignore_ascii_case("long") => Value::Int(0),
        Some(t) if t.eq_ignore_ascii_case("double") || t.eq_ignore_ascii_case("float") => Value::Double(0.0),
        Some(t) if t.eq_ignore_ascii_case("bool") || t.eq_ignore_ascii_case("switch") => Value::Bool(false),
        Some(t) if t.eq_ignore_ascii_case("string") => Value::string(""),
        Some(t) if t.ends_with("[]") => Value::array(vec![]),
        _ => Value::Null,
    }
}

/// Whether `expr` is simple enough to fold into a constant `Value` ahead of
/// time rather than needing a lazy wrapper evaluated per-call (spec.md
/// section 4.5, "compile-time-constant default value"). Mirrors the
/// semantic checker's `is_constant_expr`, kept separate since this module
/// doesn't depend on `semantic` — the checker already validated attribute
/// arguments against the same rule; this one is used for parameter
/// defaults, which allow a slightly wider shape (nested arrays/hashtables
/// of constants).
pub fn is_constant_default(ast: &Ast, id: NodeId) -> bool {
    match &ast.get(id).kind {
        crate::ast::NodeKind::Expr(ExprKind::Constant(_)) | crate::ast::NodeKind::Expr(ExprKind::StringConstant(_)) => true,
        crate::ast::NodeKind::Expr(ExprKind::ArrayLiteral(items)) => items.iter().all(|i| is_constant_default(ast, *i)),
        crate::ast::NodeKind::Expr(ExprKind::Hashtable(entries)) => {
            entries.iter().all(|e| is_constant_default(ast, e.key) && is_constant_default(ast, e.value))
        }
        crate::ast::NodeKind::Expr(ExprKind::Unary { operand, .. }) => is_constant_default(ast, *operand),
        _ => false,
    }
}

/// A lazily-evaluated default: the expression is re-evaluated on every
/// call, captured behind a closure the caller supplies (typically closing
/// over the compiler's expression-evaluation entry point). Opaque to this
/// module; it only decides which shape applies.
pub type LazyDefault = Rc<dyn Fn() -> Value>;

#[derive(Clone)]
pub enum DefaultValueSource {
    None,
    Constant(Value),
    Lazy(LazyDefault),
}

impl std::fmt::Debug for DefaultValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValueSource::None => write!(f, "None"),
            DefaultValueSource::Constant(v) => write!(f, "Constant({v:?})"),
            DefaultValueSource::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

/// The runtime parameter descriptor materialized from `ParameterAst` plus
/// its resolved default-value source and attribute list (spec.md section
/// 4.5).
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub static_type: Option<String>,
    pub attributes: Vec<AttributeValue>,
    pub default_value: DefaultValueSource,
    pub position: Option<i32>,
    pub is_switch: bool,
}

impl ParameterDescriptor {
    pub fn is_mandatory(&self) -> bool {
        self.attributes.iter().any(|a| matches!(a, AttributeValue::Parameter { mandatory: true, .. }))
    }

    /// Whether any `[Parameter(...)]` attribute with a custom property was
    /// given, which implies this function was cmdlet-bound (spec.md
    /// section 4.5, "cmdlet-binding implication").
    pub fn implies_cmdlet_binding(&self) -> bool {
        self.attributes.iter().any(|a| matches!(a, AttributeValue::Parameter { .. }))
    }
}

/// Materialize one `ParameterAst` into its runtime descriptor. `fold`
/// resolves an expression node to a constant `Value` for both attribute
/// arguments and compile-time-constant defaults; `make_lazy` wraps a
/// non-constant default expression into a `DefaultValueSource::Lazy` (the
/// caller supplies this since only the compiler knows how to re-evaluate
/// an expression node at call time).
pub fn materialize_parameter(
    ast: &Ast,
    param: &ParameterAst,
    fold: &impl Fn(&Ast, NodeId) -> Value,
    make_lazy: &impl Fn(NodeId) -> LazyDefault,
) -> ParameterDescriptor {
    let attributes: Vec<AttributeValue> = param.attributes.iter().map(|a| materialize_attribute(ast, *a, fold)).collect();
    let is_switch = param.type_constraint.as_deref().map(|t| t.eq_ignore_ascii_case("switch")).unwrap_or(false);

    let default_value = match param.default_value {
        None => {
            if is_switch {
                DefaultValueSource::Constant(Value::Bool(false))
            } else {
                DefaultValueSource::None
            }
        }
        Some(expr) if is_constant_default(ast, expr) => DefaultValueSource::Constant(fold(ast, expr)),
        Some(expr) => DefaultValueSource::Lazy(make_lazy(expr)),
    };

    let position = attributes.iter().find_map(|a| match a {
        AttributeValue::Parameter { position: Some(p), .. } => Some(*p),
        _ => None,
    });

    ParameterDescriptor {
        name: param.name.clone(),
        static_type: param.type_constraint.clone(),
        attributes,
        default_value,
        position,
        is_switch,
    }
}

/// Assign automatic positional numbers to parameters that declared no
/// explicit `-Position` (spec.md section 4.5, "automatic positional
/// parameter assignment"), in declaration order, skipping parameters
/// already given an explicit position or marked `ValueFromPipeline`-only.
/// Returns the updated positions as `(parameter_index, position)` pairs.
pub fn assign_automatic_positions(parameters: &[ParameterDescriptor]) -> Vec<(usize, i32)> {
    let mut next_position = 0;
    let mut assigned = Vec::new();
    for (i, p) in parameters.iter().enumerate() {
        if p.position.is_some() {
            continue;
        }
        if p.is_switch {
            continue;
        }
        assigned.push((i, next_position));
        next_position += 1;
    }
    assigned
}

/// True if more than one distinct `ParameterSetName` appears across a
/// function's parameters — this function uses custom parameter sets
/// (spec.md section 4.5, "customParameterSet detection") and so must
/// disambiguate bound arguments against each set independently.
pub fn has_custom_parameter_sets(parameters: &[ParameterDescriptor]) -> bool {
    let mut names = std::collections::HashSet::new();
    for p in parameters {
        for a in &p.attributes {
            if let AttributeValue::Parameter { parameter_set_name: Some(name), .. } = a {
                names.insert(name.to_ascii_lowercase());
            }
        }
    }
    names.len() > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, NodeKind};
    use crate::extent::SourceExtent;

    fn fold(ast: &Ast, id: NodeId) -> Value {
        match &ast.get(id).kind {
            crate::ast::NodeKind::Expr(ExprKind::Constant(v)) => v.clone(),
            crate::ast::NodeKind::Expr(ExprKind::StringConstant(s)) => Value::string(s.clone()),
            _ => Value::Null,
        }
    }

    #[test]
    fn switch_parameter_defaults_to_false_when_absent() {
        let ast = Ast::new();
        let param = ParameterAst { name: "Force".into(), type_constraint: Some("switch".into()), attributes: vec![], default_value: None };
        let descriptor = materialize_parameter(&ast, &param, &fold, &|_| Rc::new(|| Value::Null));
        assert!(matches!(descriptor.default_value, DefaultValueSource::Constant(Value::Bool(false))));
        assert!(descriptor.is_switch);
    }

    #[test]
    fn constant_default_is_folded_eagerly() {
        let mut ast = Ast::new();
        let default = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Int(42))));
        let param = ParameterAst { name: "Count".into(), type_constraint: Some("int".into()), attributes: vec![], default_value: Some(default) };
        let descriptor = materialize_parameter(&ast, &param, &fold, &|_| Rc::new(|| Value::Null));
        assert!(matches!(descriptor.default_value, DefaultValueSource::Constant(Value::Int(42))));
    }

    #[test]
    fn builtin_parameter_attribute_is_materialized() {
        let mut ast = Ast::new();
        let mandatory_value = ast.push(SourceExtent::empty(), NodeKind::Expr(ExprKind::Constant(Value::Bool(true))));
        let attr = ast.push(
            SourceExtent::empty(),
            NodeKind::Expr(ExprKind::Attribute {
                type_name: "Parameter".into(),
                positional_args: vec![],
                named_args: vec![("Mandatory".into(), mandatory_value)],
            }),
        );
        let param = ParameterAst { name: "Name".into(), type_constraint: Some("string".into()), attributes: vec![attr], default_value: None };
        let descriptor = materialize_parameter(&ast, &param, &fold, &|_| Rc::new(|| Value::Null));
        assert!(descriptor.is_mandatory());
        assert!(descriptor.implies_cmdlet_binding());
    }

    #[test]
    fn unknown_attribute_falls_back_to_custom() {
        let mut ast = Ast::new();
        let attr = ast.push(
            SourceExtent::empty(),
            NodeKind::Expr(ExprKind::Attribute { type_name: "MyCustomAttr".into(), positional_args: vec![], named_args: vec![] }),
        );
        let value = materialize_attribute(&ast, attr, &fold);
        assert_eq!(value.type_name(), "MyCustomAttr");
        assert!(matches!(value, AttributeValue::Custom { .. }));
    }

    #[test]
    fn automatic_positions_skip_explicit_and_switch_parameters() {
        let explicit = ParameterDescriptor {
            name: "Path".into(),
            static_type: None,
            attributes: vec![],
            default_value: DefaultValueSource::None,
            position: Some(5),
            is_switch: false,
        };
        let auto_a = ParameterDescriptor {
            name: "A".into(),
            static_type: None,
            attributes: vec![],
            default_value: DefaultValueSource::None,
            position: None,
            is_switch: false,
        };
        let switch = ParameterDescriptor {
            name: "Force".into(),
            static_type: Some("switch".into()),
            attributes: vec![],
            default_value: DefaultValueSource::Constant(Value::Bool(false)),
            position: None,
            is_switch: true,
        };
        let auto_b = ParameterDescriptor {
            name: "B".into(),
            static_type: None,
            attributes: vec![],
            default_value: DefaultValueSource::None,
            position: None,
            is_switch: false,
        };
        let assigned = assign_automatic_positions(&[explicit, auto_a, switch, auto_b]);
        assert_eq!(assigned, vec![(1, 0), (3, 1)]);
    }

    #[test]
    fn multiple_parameter_set_names_are_detected() {
        let set_a = AttributeValue::Parameter { mandatory: true, position: None, value_from_pipeline: false, parameter_set_name: Some("A".into()) };
        let set_b = AttributeValue::Parameter { mandatory: true, position: None, value_from_pipeline: false, parameter_set_name: Some("B".into()) };
        let p1 = ParameterDescriptor {
            name: "X".into(),
            static_type: None,
            attributes: vec![set_a],
            default_value: DefaultValueSource::None,
            position: None,
            is_switch: false,
        };
        let p2 = ParameterDescriptor {
            name: "Y".into(),
            static_type: None,
            attributes: vec![set_b],
            default_value: DefaultValueSource::None,
            position: None,
            is_switch: false,
        };
        assert!(has_custom_parameter_sets(&[p1, p2]));
    }
}
