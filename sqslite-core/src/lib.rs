//! Core types for sqslite
//!
//! Error taxonomy and request identifiers used by the action router.

pub mod error;
pub mod request_id;

pub use error::{ApiError, ErrorKind};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
