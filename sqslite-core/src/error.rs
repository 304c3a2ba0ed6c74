//! User-facing error taxonomy
//!
//! Every failure the router reports to a client is an [`ApiError`]: a kind that
//! fixes the HTTP status, plus a single human-readable message. The active wire
//! codec decides how the message is rendered.

use thiserror::Error;

/// Message used for every malformed or incomplete request body.
pub const INVALID_REQUEST_BODY: &str = "invalid request body";

/// Message used when an operation addresses a queue that is not live.
pub const QUEUE_DOES_NOT_EXIST: &str = "The specified queue does not exist.";

/// Message used when a receipt handle matches no message in the queue.
pub const RECEIPT_HANDLE_IS_INVALID: &str = "The specified receipt handle isn't valid.";

/// Message used for actions present in the dispatch table without a handler.
pub const ACTION_NOT_IMPLEMENTED: &str = "action not implemented";

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing request fields or headers
    Validation,
    /// The addressed queue does not exist
    QueueDoesNotExist,
    /// The receipt handle matched no message
    ReceiptHandleIsInvalid,
    /// Recognized action with no implementation
    UnsupportedAction,
    /// Request protocol is recognized but never served
    ProtocolRejected,
    /// No browsable page lives at the requested path
    RouteNotFound,
    /// Browsable pages only answer GET
    MethodNotAllowed,
    /// Response could not be produced
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::QueueDoesNotExist => "QueueDoesNotExist",
            Self::ReceiptHandleIsInvalid => "ReceiptHandleIsInvalid",
            Self::UnsupportedAction => "UnsupportedOperation",
            Self::ProtocolRejected => "ProtocolRejected",
            Self::RouteNotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::Internal => "InternalError",
        }
    }

    /// Missing queues are a 400, matching the emulated service.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation | Self::QueueDoesNotExist | Self::ReceiptHandleIsInvalid => 400,
            Self::RouteNotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::UnsupportedAction | Self::ProtocolRejected => 501,
            Self::Internal => 500,
        }
    }
}

/// Error reported to a client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", kind.as_str())]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_body() -> Self {
        Self::new(ErrorKind::Validation, INVALID_REQUEST_BODY)
    }

    /// A required header was absent or carried an unknown value.
    pub fn missing_header(name: &str) -> Self {
        Self::new(ErrorKind::Validation, format!("{name} header not found"))
    }

    pub fn queue_does_not_exist() -> Self {
        Self::new(ErrorKind::QueueDoesNotExist, QUEUE_DOES_NOT_EXIST)
    }

    pub fn receipt_handle_is_invalid() -> Self {
        Self::new(ErrorKind::ReceiptHandleIsInvalid, RECEIPT_HANDLE_IS_INVALID)
    }

    pub fn not_implemented() -> Self {
        Self::new(ErrorKind::UnsupportedAction, ACTION_NOT_IMPLEMENTED)
    }

    pub fn protocol_rejected(protocol: &str) -> Self {
        Self::new(
            ErrorKind::ProtocolRejected,
            format!("{protocol} protocol is not supported"),
        )
    }

    pub fn route_not_found(path: &str) -> Self {
        Self::new(ErrorKind::RouteNotFound, format!("no page at {path}"))
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed,
            format!("method {method} is not allowed here"),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}
