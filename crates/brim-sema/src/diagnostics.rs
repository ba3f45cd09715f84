// src/diagnostics.rs
//
// Positioned diagnostics returned by the semantic core. The core never
// prints; hosts render these through miette.

#![allow(unused_assignments)] // False positives from thiserror derive

use brim_identity::{FileId, Span};
use miette::Diagnostic;
use thiserror::Error;

use crate::errors::{InternalError, SemanticError, SemanticHint, SemanticWarning};

/// Either a user-facing error or a compiler defect.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Semantic(SemanticError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Internal(InternalError),
}

/// Distinguishes user errors from compiler defects in tests and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compiler,
    Internal,
}

/// A fatal diagnostic with its position.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub error: SemaError,
    pub span: Span,
    /// Filled in by the analyzer when the error leaves a file-level pass.
    pub file: Option<FileId>,
}

impl CompileError {
    pub fn semantic(error: SemanticError, span: Span) -> Self {
        Self {
            error: SemaError::Semantic(error),
            span,
            file: None,
        }
    }

    pub fn internal(error: InternalError, span: Span) -> Self {
        Self {
            error: SemaError::Internal(error),
            span,
            file: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.error {
            SemaError::Semantic(_) => ErrorKind::Compiler,
            SemaError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Attach the file unless an inner layer already did.
    pub fn in_file(mut self, file: FileId) -> Self {
        if self.file.is_none() {
            self.file = Some(file);
        }
        self
    }

    /// The semantic error, if this is not an internal one.
    pub fn as_semantic(&self) -> Option<&SemanticError> {
        match &self.error {
            SemaError::Semantic(e) => Some(e),
            SemaError::Internal(_) => None,
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}:{}", self.error, self.span.line, self.span.column)
    }
}

impl std::error::Error for CompileError {}

pub type SemaResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone)]
pub struct CompileWarning {
    pub warning: SemanticWarning,
    pub span: Span,
    pub file: FileId,
}

#[derive(Debug, Clone)]
pub struct CompileHint {
    pub hint: SemanticHint,
    pub span: Span,
    pub file: FileId,
}

/// Build a semantic error at `span`, filling the miette label from the same span.
macro_rules! sema_err {
    ($span:expr, $variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {{
        let span: brim_identity::Span = $span;
        $crate::diagnostics::CompileError::semantic(
            $crate::errors::SemanticError::$variant {
                $($field $(: $value)?,)*
                span: span.into(),
            },
            span,
        )
    }};
}

/// Build an internal error at `span`.
macro_rules! internal_err {
    ($span:expr, $variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {{
        let span: brim_identity::Span = $span;
        $crate::diagnostics::CompileError::internal(
            $crate::errors::InternalError::$variant {
                $($field $(: $value)?,)*
                span: span.into(),
            },
            span,
        )
    }};
}

pub(crate) use internal_err;
pub(crate) use sema_err;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_distinguishes_internal_errors() {
        let user = sema_err!(Span::default(), NotAnLvalue {});
        let defect = internal_err!(
            Span::default(),
            ImpossibleState {
                detail: "test".to_string()
            }
        );
        assert_eq!(user.kind(), ErrorKind::Compiler);
        assert_eq!(defect.kind(), ErrorKind::Internal);
    }

    #[test]
    fn in_file_keeps_inner_file() {
        let err = sema_err!(Span::default(), InvalidBreak {})
            .in_file(FileId::new(1))
            .in_file(FileId::new(2));
        assert_eq!(err.file, Some(FileId::new(1)));
    }
}
