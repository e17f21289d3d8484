//! Unified error taxonomy with stable error codes for the design-document
//! studio backend.
//!
//! Every [`StudioError`] carries an [`ErrorKind`] (the HTTP-status-bearing
//! family), a machine-readable `code`, a human-readable `description`, an
//! optional `solution` hint, optional structured `detail`, and an optional
//! cause chain. Use the builder returned by [`StudioError::new`] to construct
//! errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Broad family an error belongs to, with a fixed HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request payload or arguments failed validation.
    ValidationError,
    /// The referenced resource does not exist.
    NotFound,
    /// The operation conflicts with existing state (e.g. duplicate term).
    Conflict,
    /// Caller identity is missing or invalid.
    Unauthorized,
    /// Caller is identified but lacks permission for the operation.
    Forbidden,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// The HTTP status code this kind maps to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    /// Default machine-readable code for this kind, used when a call site
    /// doesn't supply a more specific one.
    #[must_use]
    pub fn default_code(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Default human-readable description for this kind.
    #[must_use]
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::ValidationError => "request validation failed",
            Self::NotFound => "resource not found",
            Self::Conflict => "resource conflict",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal server error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// StudioError
// ---------------------------------------------------------------------------

/// Unified studio backend error.
///
/// Carries an [`ErrorKind`], a stable machine-readable `code`, a
/// human-readable `description`, an optional `solution` hint, optional
/// structured `detail`, and an optional source error for cause-chaining.
///
/// # Builder usage
///
/// ```
/// use studio_error::{ErrorKind, StudioError};
///
/// let err = StudioError::new(ErrorKind::NotFound, "project 42 not found")
///     .with_code("PROJECT_NOT_FOUND")
///     .with_solution("check the project id is correct");
/// ```
#[derive(thiserror::Error)]
#[error("[{code}] {description}")]
pub struct StudioError {
    /// Broad error family (determines HTTP status).
    pub kind: ErrorKind,
    /// Machine-readable, stable error code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Optional suggested remedy, surfaced to API clients.
    pub solution: Option<String>,
    /// Optional structured detail (e.g. the failing field, the conflicting
    /// term).
    pub detail: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StudioError {
    /// Create a new error of the given kind, using the kind's default code
    /// and description as a starting point.
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            code: kind.default_code().to_string(),
            description: description.into(),
            kind,
            solution: None,
            detail: None,
            cause: None,
        }
    }

    /// Override the machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Attach a suggested remedy.
    #[must_use]
    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }

    /// Attach structured detail, serialising the given value.
    ///
    /// If serialisation fails, the detail is silently skipped.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(detail) {
            self.detail = Some(v);
        }
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Shorthand for a [`ErrorKind::ValidationError`].
    pub fn validation(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, description)
    }

    /// Shorthand for a [`ErrorKind::NotFound`].
    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, description)
    }

    /// Shorthand for a [`ErrorKind::Conflict`].
    pub fn conflict(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, description)
    }

    /// Shorthand for a [`ErrorKind::Unauthorized`].
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, description)
    }

    /// Shorthand for a [`ErrorKind::Forbidden`].
    pub fn forbidden(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, description)
    }

    /// Shorthand for a [`ErrorKind::Internal`].
    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, description)
    }

    /// The HTTP status code this error maps to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

impl fmt::Debug for StudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("StudioError");
        d.field("kind", &self.kind);
        d.field("code", &self.code);
        d.field("description", &self.description);
        if let Some(ref solution) = self.solution {
            d.field("solution", solution);
        }
        if let Some(ref detail) = self.detail {
            d.field("detail", detail);
        }
        if let Some(ref cause) = self.cause {
            d.field("cause", &cause.to_string());
        }
        d.finish()
    }
}

// ---------------------------------------------------------------------------
// Wire representation
// ---------------------------------------------------------------------------

/// Wire-format body for an error response: `{code, description, solution?,
/// detail?}`, mirroring the shape clients are expected to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudioErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Suggested remedy, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// Structured detail, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl From<&StudioError> for StudioErrorBody {
    fn from(err: &StudioError) -> Self {
        Self {
            code: err.code.clone(),
            description: err.description.clone(),
            solution: err.solution.clone(),
            detail: err.detail.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
