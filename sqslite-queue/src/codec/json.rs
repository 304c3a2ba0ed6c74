//! JSON codec for the `application/x-amz-json-1.0` action protocol

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use super::{SerdeError, WireCodec};
use crate::model::QueueSummary;
use crate::protocol::{Action, Input, Output, Validate};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl WireCodec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize(&self, output: &Output) -> Result<String, SerdeError> {
        match output {
            Output::CreateQueue(res) => encode(res),
            Output::ListQueues(res) => encode(res),
            Output::GetQueueUrl(res) => encode(res),
            Output::ListQueueTags(res) => encode(res),
            Output::SendMessage(res) => encode(res),
            Output::ReceiveMessage(res) => encode(res),
            Output::GetQueueAttributes(res) => encode(res),
            Output::Error(err) => encode(err),
            Output::Empty => Ok(String::new()),
            Output::FullQueueData(_) => Err(SerdeError::NotImplemented(
                "FullQueueData over JSON".to_string(),
            )),
        }
    }

    fn deserialize(&self, action: Action, body: &[u8]) -> Result<Input, SerdeError> {
        match action {
            Action::CreateQueue => decode(body).map(Input::CreateQueue),
            Action::DeleteQueue => decode(body).map(Input::DeleteQueue),
            Action::ListQueues => decode_or_default(body).map(Input::ListQueues),
            Action::GetQueueUrl => decode(body).map(Input::GetQueueUrl),
            Action::TagQueue => decode(body).map(Input::TagQueue),
            Action::ListQueueTags => decode(body).map(Input::ListQueueTags),
            Action::UntagQueue => decode(body).map(Input::UntagQueue),
            Action::SendMessage => decode(body).map(Input::SendMessage),
            Action::ReceiveMessage => decode(body).map(Input::ReceiveMessage),
            Action::DeleteMessage => decode(body).map(Input::DeleteMessage),
            Action::PurgeQueue => decode(body).map(Input::PurgeQueue),
            Action::GetQueueAttributes => decode(body).map(Input::GetQueueAttributes),
            other => Err(SerdeError::NotImplemented(format!("{other:?}"))),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, SerdeError> {
    serde_json::to_string(value).map_err(|e| SerdeError::Encode(e.to_string()))
}

/// Decode an object body into a typed input, failing closed on any fault.
fn decode<T: DeserializeOwned + Validate>(body: &[u8]) -> Result<T, SerdeError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Malformed JSON body");
        SerdeError::InvalidBody
    })?;
    if !value.is_object() {
        return Err(SerdeError::InvalidBody);
    }

    let input: T = serde_json::from_value(value).map_err(|e| {
        debug!(error = %e, "Request body failed validation");
        SerdeError::InvalidBody
    })?;
    if input.is_valid() {
        Ok(input)
    } else {
        Err(SerdeError::InvalidBody)
    }
}

/// Like [`decode`], but a blank body stands for `{}`.
fn decode_or_default<T: DeserializeOwned + Validate + Default>(
    body: &[u8],
) -> Result<T, SerdeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode(body)
}

/// A required string: absent, null, non-string and `""` are all rejected.
pub(crate) fn non_empty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(de::Error::invalid_length(0, &"a non-empty string"));
    }
    Ok(value)
}

/// An optional string where `""` counts as absent.
pub(crate) fn optional_non_empty_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// The wire listing only carries URLs.
pub(crate) fn queue_urls<S>(queues: &[QueueSummary], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(queues.iter().map(|q| q.url.as_str()))
}
