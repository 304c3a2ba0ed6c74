//! Wire codecs
//!
//! Two codecs share one contract: JSON for the SQS action protocol and HTML for
//! the browsable pages. The router picks exactly one per request from the
//! negotiated [`Protocol`].

pub mod html;
pub mod json;

use thiserror::Error;

use crate::protocol::{Action, Input, Output, Protocol};

pub use html::HtmlCodec;
pub use json::JsonCodec;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerdeError {
    /// Body was not valid JSON, not an object, or failed field validation
    #[error("invalid request body")]
    InvalidBody,
    #[error("{0} is not implemented")]
    NotImplemented(String),
    #[error("failed to encode response: {0}")]
    Encode(String),
}

/// Converts typed requests and responses to and from bytes
pub trait WireCodec {
    fn content_type(&self) -> &'static str;

    fn serialize(&self, output: &Output) -> Result<String, SerdeError>;

    fn deserialize(&self, action: Action, body: &[u8]) -> Result<Input, SerdeError>;
}

#[derive(Debug, Clone, Copy)]
pub enum Codec {
    Json(JsonCodec),
    Html(HtmlCodec),
}

impl Codec {
    /// The codec serving a protocol; the query protocol has none.
    pub fn for_protocol(protocol: Protocol) -> Option<Self> {
        match protocol {
            Protocol::AwsJson1_0 => Some(Self::Json(JsonCodec)),
            Protocol::TextHtml => Some(Self::Html(HtmlCodec)),
            Protocol::AwsQuery => None,
        }
    }
}

impl WireCodec for Codec {
    fn content_type(&self) -> &'static str {
        match self {
            Self::Json(codec) => codec.content_type(),
            Self::Html(codec) => codec.content_type(),
        }
    }

    fn serialize(&self, output: &Output) -> Result<String, SerdeError> {
        match self {
            Self::Json(codec) => codec.serialize(output),
            Self::Html(codec) => codec.serialize(output),
        }
    }

    fn deserialize(&self, action: Action, body: &[u8]) -> Result<Input, SerdeError> {
        match self {
            Self::Json(codec) => codec.deserialize(action, body),
            Self::Html(codec) => codec.deserialize(action, body),
        }
    }
}
