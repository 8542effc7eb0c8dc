//! Code generation errors.
//!
//! Every failure aborts the enclosing compilation unit. Errors carry the
//! span of the offending node and the printed names a user needs to find
//! it; [`CodegenError::to_diagnostic`] turns them into reportable
//! diagnostics.

use brisk_diagnostic::{Diagnostic, ErrorCode};
use brisk_ir::Span;
use thiserror::Error;

/// Result alias used by every generator.
pub type CodegenResult<T> = Result<T, CodegenError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A node kind with no registered generator.
    #[error("unsupported syntax: {kind}")]
    UnsupportedSyntax { kind: String, span: Span },

    /// An operator or conversion not defined for the operand type.
    #[error("unsupported operation `{op}` on type `{ty}`")]
    UnsupportedOperation { op: String, ty: String, span: Span },

    /// A member the built-in object does not provide.
    #[error("`{object}` has no supported member `{member}`")]
    UnsupportedBuiltIn {
        object: String,
        member: String,
        span: Span,
    },

    /// An omitted argument whose parameter has no default.
    #[error("missing argument for parameter `{param}` of `{function}`")]
    MissingArgument {
        function: String,
        param: String,
        span: Span,
    },

    /// A literal not representable in its static type.
    #[error("invalid {ty} literal `{text}`")]
    InvalidLiteral { text: String, ty: String, span: Span },

    /// The typed tree broke an invariant the front end guarantees.
    #[error("internal code generation error: {message}")]
    Internal { message: String, span: Span },
}

impl CodegenError {
    pub fn unsupported_operation(op: impl Into<String>, ty: impl Into<String>, span: Span) -> Self {
        CodegenError::UnsupportedOperation {
            op: op.into(),
            ty: ty.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        CodegenError::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            CodegenError::UnsupportedSyntax { span, .. }
            | CodegenError::UnsupportedOperation { span, .. }
            | CodegenError::UnsupportedBuiltIn { span, .. }
            | CodegenError::MissingArgument { span, .. }
            | CodegenError::InvalidLiteral { span, .. }
            | CodegenError::Internal { span, .. } => *span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CodegenError::UnsupportedSyntax { .. } => ErrorCode::E4001,
            CodegenError::UnsupportedOperation { .. } => ErrorCode::E4002,
            CodegenError::UnsupportedBuiltIn { .. } => ErrorCode::E4003,
            CodegenError::MissingArgument { .. } => ErrorCode::E4004,
            CodegenError::InvalidLiteral { .. } => ErrorCode::E4005,
            CodegenError::Internal { .. } => ErrorCode::E9001,
        }
    }

    /// Convert to a diagnostic with a primary label on the span.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (label, note) = match self {
            CodegenError::UnsupportedSyntax { .. } => (
                "not supported by the compiled subset",
                Some("remove or rewrite this construct"),
            ),
            CodegenError::UnsupportedOperation { .. } => (
                "operation not defined for this type",
                Some("narrowing conversions need an explicit cast"),
            ),
            CodegenError::UnsupportedBuiltIn { .. } => ("unknown member", None),
            CodegenError::MissingArgument { .. } => (
                "argument missing here",
                Some("pass the argument or give the parameter a default value"),
            ),
            CodegenError::InvalidLiteral { .. } => ("literal out of range for its type", None),
            CodegenError::Internal { .. } => (
                "while generating this node",
                Some("this is a compiler bug"),
            ),
        };
        let diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(self.span(), label);
        match note {
            Some(note) => diag.with_note(note),
            None => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_name_the_offending_parts() {
        let err = CodegenError::UnsupportedBuiltIn {
            object: "Math".into(),
            member: "frobnicate".into(),
            span: Span::new(4, 19),
        };
        assert_eq!(err.to_string(), "`Math` has no supported member `frobnicate`");

        let err = CodegenError::unsupported_operation("&", "number", Span::DUMMY);
        assert_eq!(err.to_string(), "unsupported operation `&` on type `number`");
    }

    #[test]
    fn diagnostic_carries_code_and_primary_span() {
        let err = CodegenError::InvalidLiteral {
            text: "3000000000".into(),
            ty: "int".into(),
            span: Span::new(10, 20),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E4005);
        assert_eq!(diag.primary_span(), Some(Span::new(10, 20)));
        assert_eq!(diag.message, "invalid int literal `3000000000`");
    }

    #[test]
    fn internal_errors_use_internal_code() {
        let diag = CodegenError::internal("bad payload", Span::DUMMY).to_diagnostic();
        assert!(diag.code.is_internal());
        assert_eq!(diag.notes, vec!["this is a compiler bug".to_string()]);
    }
}
