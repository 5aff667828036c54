//! Diagnostic bag: accumulates parse/semantic errors with position,
//! message-id, and arguments, the way the teacher's parser accumulates
//! `ParseException`s instead of failing on the first one.

use std::fmt;

use crate::extent::SourceExtent;

/// A single accumulated diagnostic. `id` is a stable, localizable message
/// id (shown in code/tests as `err:<id>`); `arguments` are the formatted
/// values substituted into the id's message template.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub message: String,
    pub extent: SourceExtent,
    pub arguments: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(id: DiagnosticId, message: impl Into<String>, extent: SourceExtent) -> Self {
        Self {
            id,
            message: message.into(),
            extent,
            arguments: Vec::new(),
            severity: Severity::Error,
        }
    }

    pub fn warning(id: DiagnosticId, message: impl Into<String>, extent: SourceExtent) -> Self {
        Self {
            id,
            message: message.into(),
            extent,
            arguments: Vec::new(),
            severity: Severity::Warning,
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.extent, self.message, self.id)
    }
}

/// Every unique error-id the semantic checker (and restricted checker) can
/// report. Each variant corresponds to a single localizable message per
/// spec.md section 4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticId {
    DuplicateParameterName,
    VoidParameterType,
    AttributeTargetMismatch,
    AttributeNamedArgumentNotSettable,
    DuplicateNamedArgument,
    AttributeArgumentNotConstant,
    AttributeArgumentScriptBlockOnClass,
    ScriptTooComplicated,
    MemberBodyDeclaresParamBlock,
    ConstructorHasReturnType,
    MethodHasCodePathNotReturn,
    ParamBlockAndParameterList,
    CatchAllNotLast,
    ExceptionTypeAlreadyCaught,
    LabelNotFound,
    ControlLeavingFinally,
    ReturnOutOfFinally,
    ReturnRequiresValue,
    ReturnMustNotHaveValue,
    InvalidAssignmentTarget,
    ArrayLiteralLhsRequiresAssign,
    ReferenceNeedsToBeByItselfInTypeConstraint,
    AutomaticVariableTypeMismatch,
    InvalidEndOfLineConstruct,
    OperatorRequiresVariableOrProperty,
    OrderedOnlyOnHashtable,
    VoidNotAllowedHere,
    UsingExpressionInvalidContent,
    SplatOutsideCommandArgument,
    ForcedDynamicVariableRead,
    ThisOutsideInstanceMember,
    DuplicateKey,
    UnexpectedKeyword,
    ParallelRequiresWorkflow,
    ThrottleLimitRequiresParallel,
    DscTypeMissingMethod,
    DscTypeMissingKeyProperty,
    DscTypeMissingDefaultConstructor,
    ExceptionConstructingAttribute,
    ReadOnlyProperty,
    MethodNotFound,
    InvokeMethodOnNull,
    ParameterizedPropertyAssignmentFailed,
    MethodInvocationException,
    RightOperandMustBeType,
    BadEnumeration,
    VariableReferenceNotSupportedInDataSection,
    NonConstantCommandNotSupportedInDataSection,
    DisallowedConstructInDataSection,
    RethrowWithNoCurrentException,
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Accumulates diagnostics across a single semantic-check pass. Visitation
/// continues after an error is recorded so multiple errors surface from one
/// pass, matching spec.md section 7's propagation policy for the checker.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bag_has_no_errors() {
        let bag = DiagnosticBag::new();
        assert!(bag.is_empty());
        assert!(!bag.has_errors());
    }

    #[test]
    fn reporting_accumulates_without_stopping() {
        let mut bag = DiagnosticBag::new();
        bag.report(Diagnostic::error(
            DiagnosticId::LabelNotFound,
            "label not found",
            SourceExtent::empty(),
        ));
        bag.report(Diagnostic::error(
            DiagnosticId::DuplicateKey,
            "duplicate key",
            SourceExtent::empty(),
        ));
        assert_eq!(bag.len(), 2);
        assert!(bag.has_errors());
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut bag = DiagnosticBag::new();
        bag.report(Diagnostic::warning(
            DiagnosticId::ForcedDynamicVariableRead,
            "reads through the variable table",
            SourceExtent::empty(),
        ));
        assert!(!bag.has_errors());
        assert_eq!(bag.len(), 1);
    }
}
