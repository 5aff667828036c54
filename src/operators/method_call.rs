//! Method call dispatch (spec.md section 4.1, "Method call"). The real
//! source resolves members through a reflective binder over the host's
//! type system; here that's replaced by a small per-object-kind v-table
//! (Design Notes section 9) — a `MemberTable` the caller supplies, built
//! once per target kind by an external collaborator (the type-adapter
//! layer, out of scope) and handed to `call_method`.

use std::rc::Rc;

use crate::errors::{EngineError, MethodInvocationError, RuntimeError};
use crate::extent::SourceExtent;
use crate::value::Value;

pub type NativeMethod = Rc<dyn Fn(&[Value]) -> Result<Value, EngineError>>;

#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub invoke: NativeMethod,
}

#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub get: Rc<dyn Fn() -> Value>,
    /// `None` for a read-only property — used to distinguish
    /// `MethodNotFound` from `ParameterizedPropertyAssignmentFailed`.
    pub set: Option<Rc<dyn Fn(Value)>>,
}

/// The per-object-kind v-table: one function pointer per operation,
/// resolved once per object kind by an external collaborator and looked up
/// here by name. `is_static` selects the type-level table instead of the
/// instance-member table.
pub trait MemberTable {
    fn find_method(&self, name: &str, is_static: bool) -> Option<MethodDescriptor>;
    fn find_property(&self, name: &str, is_static: bool) -> Option<PropertyDescriptor>;
}

/// `call_method(extent, target, name, constraints, args, static?, value_to_set?)`.
/// `constraints` (the invocation-constraints encoding target/argument static
/// types for overload selection) lives at the compiler's call-site level,
/// not here — this function only needs the resolved `MemberTable`.
pub fn call_method(
    extent: &SourceExtent,
    target: Option<&Value>,
    name: &str,
    members: &dyn MemberTable,
    args: &[Value],
    is_static: bool,
    value_to_set: Option<Value>,
) -> Result<Value, EngineError> {
    if target.is_none() && !is_static {
        return Err(RuntimeError::new("InvokeMethodOnNull", format!("cannot call method '{name}' on a null-valued expression"), extent.clone()).into());
    }

    if let Some(value) = value_to_set {
        return match members.find_property(name, is_static) {
            Some(prop) if prop.set.is_some() => {
                (prop.set.unwrap())(value.clone());
                Ok(value)
            }
            Some(_) => Err(RuntimeError::new(
                "ParameterizedPropertyAssignmentFailed",
                format!("property '{name}' is read-only"),
                extent.clone(),
            )
            .into()),
            None => Err(RuntimeError::new("MethodNotFound", format!("member '{name}' not found"), extent.clone()).into()),
        };
    }

    let method = members
        .find_method(name, is_static)
        .ok_or_else(|| RuntimeError::new("MethodNotFound", format!("method '{name}' not found"), extent.clone()))?;

    (method.invoke)(args).map_err(|e| wrap_invocation_error(e, extent))
}

/// Wrap thrown errors into `MethodInvocationException` unless they are
/// flow-control, pipeline-stopped, call-depth, or already-runtime-error
/// kinds, which pass through (spec.md section 4.1).
fn wrap_invocation_error(e: EngineError, extent: &SourceExtent) -> EngineError {
    match e {
        EngineError::Flow(_) | EngineError::PipelineStopped(_) | EngineError::ScriptCallDepth(_) | EngineError::Runtime(_) => e,
        other => MethodInvocationError {
            inner: Box::new(RuntimeError::new("MethodInvocationException", other.to_string(), extent.clone())),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowSignal;
    use std::cell::RefCell;

    struct FakeTable {
        methods: Vec<MethodDescriptor>,
        properties: Vec<PropertyDescriptor>,
    }

    impl MemberTable for FakeTable {
        fn find_method(&self, name: &str, _is_static: bool) -> Option<MethodDescriptor> {
            self.methods.iter().find(|m| m.name == name).cloned()
        }
        fn find_property(&self, name: &str, _is_static: bool) -> Option<PropertyDescriptor> {
            self.properties.iter().find(|p| p.name == name).cloned()
        }
    }

    fn ext() -> SourceExtent {
        SourceExtent::empty()
    }

    #[test]
    fn null_target_fails_invoke_on_null() {
        let table = FakeTable { methods: vec![], properties: vec![] };
        let err = call_method(&ext(), None, "Foo", &table, &[], false, None).unwrap_err();
        assert!(matches!(err, EngineError::Runtime(r) if r.error_id == "InvokeMethodOnNull"));
    }

    #[test]
    fn missing_method_fails_method_not_found() {
        let table = FakeTable { methods: vec![], properties: vec![] };
        let target = Value::Int(1);
        let err = call_method(&ext(), Some(&target), "Foo", &table, &[], false, None).unwrap_err();
        assert!(matches!(err, EngineError::Runtime(r) if r.error_id == "MethodNotFound"));
    }

    #[test]
    fn successful_call_returns_method_result() {
        let table = FakeTable {
            methods: vec![MethodDescriptor {
                name: "ToUpper".into(),
                invoke: Rc::new(|_args| Ok(Value::string("X"))),
            }],
            properties: vec![],
        };
        let target = Value::string("x");
        let result = call_method(&ext(), Some(&target), "ToUpper", &table, &[], false, None).unwrap();
        assert_eq!(result, Value::string("X"));
    }

    #[test]
    fn thrown_error_is_wrapped_as_method_invocation_exception() {
        let table = FakeTable {
            methods: vec![MethodDescriptor {
                name: "Boom".into(),
                invoke: Rc::new(|_| Err(RuntimeError::new("X", "custom", SourceExtent::empty()).into())),
            }],
            properties: vec![],
        };
        let target = Value::Int(1);
        // A RuntimeError passes through unwrapped per the contract.
        let err = call_method(&ext(), Some(&target), "Boom", &table, &[], false, None).unwrap_err();
        assert!(matches!(err, EngineError::Runtime(r) if r.error_id == "X"));
    }

    #[test]
    fn flow_control_passes_through_invocation_unwrapped() {
        let table = FakeTable {
            methods: vec![MethodDescriptor {
                name: "Loop".into(),
                invoke: Rc::new(|_| Err(FlowSignal::Break { label: None }.into())),
            }],
            properties: vec![],
        };
        let target = Value::Int(1);
        let err = call_method(&ext(), Some(&target), "Loop", &table, &[], false, None).unwrap_err();
        assert!(matches!(err, EngineError::Flow(f) if f.is_break()));
    }

    #[test]
    fn setting_a_readonly_property_fails() {
        let table = FakeTable {
            methods: vec![],
            properties: vec![PropertyDescriptor {
                name: "Length".into(),
                get: Rc::new(|| Value::Int(0)),
                set: None,
            }],
        };
        let target = Value::Int(1);
        let err = call_method(&ext(), Some(&target), "Length", &table, &[], false, Some(Value::Int(5))).unwrap_err();
        assert!(matches!(err, EngineError::Runtime(r) if r.error_id == "ParameterizedPropertyAssignmentFailed"));
    }

    #[test]
    fn setting_a_settable_property_invokes_the_setter() {
        let seen = Rc::new(RefCell::new(None));
        let seen2 = seen.clone();
        let table = FakeTable {
            methods: vec![],
            properties: vec![PropertyDescriptor {
                name: "Name".into(),
                get: Rc::new(|| Value::Null),
                set: Some(Rc::new(move |v| *seen2.borrow_mut() = Some(v))),
            }],
        };
        let target = Value::Int(1);
        call_method(&ext(), Some(&target), "Name", &table, &[], false, Some(Value::string("x"))).unwrap();
        assert_eq!(*seen.borrow(), Some(Value::string("x")));
    }
}
