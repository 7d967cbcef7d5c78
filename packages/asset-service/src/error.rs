use std::fmt;

use common::storage::StorageError;
use sea_orm::DbErr;

/// Status code carried by every failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    /// The metadata row exists but its blob is gone.
    DataLoss,
    Cancelled,
    Internal,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::DataLoss => "DATA_LOSS",
            Code::Cancelled => "CANCELLED",
            Code::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level error type.
///
/// Each variant maps to exactly one [`Code`]. Internal details are logged
/// when converted into a [`Status`] and never reach the caller.
#[derive(Debug)]
pub enum AppError {
    InvalidArgument(String),
    NotFound(String),
    Conflict(String),
    /// An asset row points at a blob that no longer exists.
    MissingBlob(String),
    /// The inbound stream failed or was closed by the transport.
    Cancelled(String),
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> Code {
        match self {
            AppError::InvalidArgument(_) => Code::InvalidArgument,
            AppError::NotFound(_) => Code::NotFound,
            AppError::Conflict(_) => Code::AlreadyExists,
            AppError::MissingBlob(_) => Code::DataLoss,
            AppError::Cancelled(_) => Code::Cancelled,
            AppError::Internal(_) => Code::Internal,
        }
    }

    /// Turn the error into the status returned to the caller.
    pub fn into_status(self) -> Status {
        let code = self.code();
        let message = match self {
            AppError::InvalidArgument(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Cancelled(msg) => msg,
            AppError::MissingBlob(detail) => {
                tracing::error!("Dangling asset row: {}", detail);
                "Asset content is missing from storage".into()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An unexpected error occurred".into()
            }
        };
        Status { code, message }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::Conflict(msg) => write!(f, "already exists: {msg}"),
            AppError::MissingBlob(msg) => write!(f, "missing blob: {msg}"),
            AppError::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidArgument(msg),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::InvalidArgument(format!("File exceeds maximum size of {limit} bytes"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Outcome of a failed call as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.into_status()
    }
}
