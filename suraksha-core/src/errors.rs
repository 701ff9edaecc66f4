//! # Errors
//!
//! Structured, transport-agnostic errors in the Feathers shape
//! (`name`, `message`, `code`, `className`, `data`, `errors`).
//!
//! Domain crates keep their own `thiserror` enums and convert into
//! [`AppError`] at the service boundary. An `AppError` can ride inside an
//! `anyhow::Error`, so handlers only ever return `anyhow::Result`, and the
//! transport layer digs the structured error back out of the chain.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};

/// Result alias used by service-level APIs.
pub type AppResult<T> = std::result::Result<T, AnyError>;

/// Error classes exposed to clients, with their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
    Unavailable,      // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::Unavailable => 503,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    /// Whether the status is a client (4xx) error.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find an `AppError` anywhere in an `anyhow` chain.
    pub fn find_in(err: &AnyError) -> Option<&AppError> {
        err.chain().find_map(|e| e.downcast_ref::<AppError>())
    }

    /// Turn any error into an `AppError`:
    /// - an `AppError` is kept as-is
    /// - anything else becomes a `GeneralError` carrying the original as source
    pub fn normalize(err: AnyError) -> AppError {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    /// Copy suitable for clients: drops the inner `source`.
    pub fn sanitize_for_client(&self) -> AppError {
        AppError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Return early with an `AppError` built from one of its constructors.
#[macro_export]
macro_rules! bail_app {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::AppError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::AppError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}
