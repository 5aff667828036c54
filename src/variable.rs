//! Variable paths, scopes, automatic variables, and the local-variable
//! tuple layout (spec.md section 3).

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableScope {
    Unqualified,
    Local,
    Script,
    Global,
    Private,
    Env,
    Drive(String),
}

/// `{scope, name, original_text}`. The unqualified path is just `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePath {
    pub scope: VariableScope,
    pub name: String,
    pub original_text: String,
}

impl VariablePath {
    pub fn new(scope: VariableScope, name: impl Into<String>, original_text: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
            original_text: original_text.into(),
        }
    }

    pub fn unqualified(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            scope: VariableScope::Unqualified,
            original_text: name.clone(),
            name,
        }
    }

    pub fn is_unqualified(&self) -> bool {
        self.scope == VariableScope::Unqualified
    }
}

lazy_static! {
    /// The fixed ordered list of automatic variable names that appear as
    /// slots in the local-variable tuple (spec.md section 3). Index into
    /// this list is the variable's tuple-slot number unless variable
    /// analysis marks it "forced dynamic".
    pub static ref AUTOMATIC_VARIABLES: Vec<&'static str> = vec![
        "_",
        "this",
        "input",
        "PSCmdlet",
        "PSBoundParameters",
        "args",
        "switch",
        "foreach",
        "MyInvocation",
        "PSScriptRoot",
        "PSCommandPath",
        "ErrorActionPreference",
        "?",
        "matches",
    ];
}

pub fn automatic_variable_slot(name: &str) -> Option<usize> {
    AUTOMATIC_VARIABLES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
}

pub fn is_automatic_variable(name: &str) -> bool {
    automatic_variable_slot(name).is_some()
}

/// The documented static type an automatic variable's declared cast must
/// match when it is the target of an assignment (semantic checker rule,
/// spec.md section 4.4, Assignment target row).
pub fn automatic_variable_declared_type(name: &str) -> Option<&'static str> {
    match name {
        "PSCmdlet" => Some("System.Management.Automation.PSCmdlet"),
        "args" => Some("System.Object[]"),
        "input" => Some("System.Collections.IEnumerator"),
        "?" => Some("System.Boolean"),
        "matches" => Some("System.Collections.Hashtable"),
        _ => None,
    }
}

/// A field in the local-variable tuple: a type and a "was-set" bit.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleField {
    pub name: String,
    pub declared_type: Option<String>,
    pub was_set: bool,
}

/// A fixed-layout record whose fields are indexed by analysis; variables
/// not assigned a slot are "forced dynamic" and looked up through the
/// runtime variable table instead.
#[derive(Debug, Clone, Default)]
pub struct TupleLayout {
    fields: Vec<TupleField>,
    slot_by_name: HashMap<String, usize>,
}

impl TupleLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot for `name`, returning its index. Re-allocating the
    /// same name returns the existing slot (tuple layout is stable across
    /// repeated analysis of the same script-block).
    pub fn allocate(&mut self, name: impl Into<String>, declared_type: Option<String>) -> usize {
        let name = name.into();
        if let Some(&slot) = self.slot_by_name.get(&name) {
            return slot;
        }
        let slot = self.fields.len();
        self.fields.push(TupleField {
            name: name.clone(),
            declared_type,
            was_set: false,
        });
        self.slot_by_name.insert(name, slot);
        slot
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slot_by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, slot: usize) -> Option<&TupleField> {
        self.fields.get(slot)
    }

    pub fn mark_set(&mut self, slot: usize) {
        if let Some(field) = self.fields.get_mut(slot) {
            field.was_set = true;
        }
    }
}

/// A concrete instance of a `TupleLayout`: one `Value` slot per field,
/// created per function-context invocation (spec.md section 3, Function
/// context).
#[derive(Debug, Clone)]
pub struct LocalTuple {
    pub values: Vec<Value>,
}

impl LocalTuple {
    pub fn for_layout(layout: &TupleLayout) -> Self {
        Self {
            values: vec![Value::Null; layout.len()],
        }
    }

    pub fn get(&self, slot: usize) -> &Value {
        self.values.get(slot).unwrap_or(&Value::Null)
    }

    pub fn set(&mut self, slot: usize, value: Value) {
        if slot >= self.values.len() {
            self.values.resize(slot + 1, Value::Null);
        }
        self.values[slot] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_variables_are_indexed() {
        assert_eq!(automatic_variable_slot("_"), Some(0));
        assert!(is_automatic_variable("this"));
        assert!(!is_automatic_variable("myVar"));
    }

    #[test]
    fn automatic_variable_lookup_is_case_insensitive() {
        assert_eq!(automatic_variable_slot("THIS"), automatic_variable_slot("this"));
    }

    #[test]
    fn tuple_layout_allocates_stable_slots() {
        let mut layout = TupleLayout::new();
        let a = layout.allocate("x", None);
        let b = layout.allocate("y", None);
        let a_again = layout.allocate("x", None);
        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(layout.len(), 2);
    }

    #[test]
    fn local_tuple_roundtrips_values() {
        let mut layout = TupleLayout::new();
        let slot = layout.allocate("x", None);
        let mut tuple = LocalTuple::for_layout(&layout);
        tuple.set(slot, Value::Int(42));
        assert_eq!(tuple.get(slot), &Value::Int(42));
    }
}
