//! Wire protocols, actions, and the typed request/response records

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::model::{Message, QueueData, QueueSummary};

pub const AWS_JSON_PROTOCOL_1_0: &str = "application/x-amz-json-1.0";
pub const AWS_QUERY_PROTOCOL: &str = "text/xml";
pub const AWS_TARGET: &str = "x-amz-target";
pub const AWS_TRACE_ID: &str = "x-amzn-trace-id";
/// Carries the queue name of a browsable route into dispatch
pub const QUEUE_NAME: &str = "x-queue-name";

pub const MAX_RECEIVE_BATCH: i64 = 10;
const MAX_DELAY_SECONDS: i64 = 900;
const MAX_VISIBILITY_TIMEOUT: i64 = 43_200;
const MAX_WAIT_TIME_SECONDS: i64 = 20;

/// Protocol negotiated from the Content-Type header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    AwsJson1_0,
    AwsQuery,
    TextHtml,
}

impl Protocol {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or_default();

        if media_type.eq_ignore_ascii_case(AWS_JSON_PROTOCOL_1_0) {
            Self::AwsJson1_0
        } else if media_type.eq_ignore_ascii_case(AWS_QUERY_PROTOCOL) {
            Self::AwsQuery
        } else {
            Self::TextHtml
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsJson1_0 => "AWSJsonProtocol1.0",
            Self::AwsQuery => "AWSQueryProtocol",
            Self::TextHtml => "TextHtml",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddPermission,
    ChangeMessageVisibility,
    ChangeMessageVisibilityBatch,
    CreateQueue,
    DeleteMessage,
    DeleteMessageBatch,
    DeleteQueue,
    GetQueueAttributes,
    GetQueueUrl,
    ListDeadLetterSourceQueues,
    ListQueueTags,
    ListQueues,
    PurgeQueue,
    ReceiveMessage,
    RemovePermission,
    SendMessage,
    SendMessageBatch,
    SetQueueAttributes,
    TagQueue,
    UntagQueue,
    /// Browsable queue detail page, not part of the wire API
    FullQueueData,
}

static SQS_ACTIONS: Lazy<HashMap<&'static str, Action>> = Lazy::new(|| {
    HashMap::from([
        ("AmazonSQS.AddPermission", Action::AddPermission),
        ("AmazonSQS.ChangeMessageVisibility", Action::ChangeMessageVisibility),
        (
            "AmazonSQS.ChangeMessageVisibilityBatch",
            Action::ChangeMessageVisibilityBatch,
        ),
        ("AmazonSQS.CreateQueue", Action::CreateQueue),
        ("AmazonSQS.DeleteMessage", Action::DeleteMessage),
        ("AmazonSQS.DeleteMessageBatch", Action::DeleteMessageBatch),
        ("AmazonSQS.DeleteQueue", Action::DeleteQueue),
        ("AmazonSQS.GetQueueAttributes", Action::GetQueueAttributes),
        ("AmazonSQS.GetQueueUrl", Action::GetQueueUrl),
        (
            "AmazonSQS.ListDeadLetterSourceQueues",
            Action::ListDeadLetterSourceQueues,
        ),
        ("AmazonSQS.ListQueueTags", Action::ListQueueTags),
        ("AmazonSQS.ListQueues", Action::ListQueues),
        ("AmazonSQS.PurgeQueue", Action::PurgeQueue),
        ("AmazonSQS.ReceiveMessage", Action::ReceiveMessage),
        ("AmazonSQS.RemovePermission", Action::RemovePermission),
        ("AmazonSQS.SendMessage", Action::SendMessage),
        ("AmazonSQS.SendMessageBatch", Action::SendMessageBatch),
        ("AmazonSQS.SetQueueAttributes", Action::SetQueueAttributes),
        ("AmazonSQS.TagQueue", Action::TagQueue),
        ("AmazonSQS.UntagQueue", Action::UntagQueue),
    ])
});

impl Action {
    /// Look up an `x-amz-target` value such as `AmazonSQS.CreateQueue`.
    pub fn from_target(target: &str) -> Option<Self> {
        SQS_ACTIONS.get(target).copied()
    }
}

/// Range checks applied after a body has been decoded
pub trait Validate {
    fn is_valid(&self) -> bool {
        true
    }
}

fn in_range(value: Option<i64>, min: i64, max: i64) -> bool {
    value.map_or(true, |v| (min..=max).contains(&v))
}

// === Requests ===

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateQueueInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Validate for CreateQueueInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteQueueInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
}

impl Validate for DeleteQueueInput {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueuesInput {
    #[serde(default, deserialize_with = "crate::codec::json::optional_non_empty_string")]
    pub queue_name_prefix: Option<String>,
}

impl Validate for ListQueuesInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueUrlInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_name: String,
}

impl Validate for GetQueueUrlInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagQueueInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
    pub tags: BTreeMap<String, String>,
}

impl Validate for TagQueueInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueueTagsInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
}

impl Validate for ListQueueTagsInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UntagQueueInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
    pub tag_keys: Vec<String>,
}

impl Validate for UntagQueueInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub message_body: String,
    #[serde(default)]
    pub delay_seconds: Option<i64>,
    #[serde(default, deserialize_with = "crate::codec::json::optional_non_empty_string")]
    pub message_deduplication_id: Option<String>,
}

impl Validate for SendMessageInput {
    fn is_valid(&self) -> bool {
        in_range(self.delay_seconds, 0, MAX_DELAY_SECONDS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
    #[serde(default)]
    pub max_number_of_messages: Option<i64>,
    #[serde(default)]
    pub visibility_timeout: Option<i64>,
    #[serde(default)]
    pub wait_time_seconds: Option<i64>,
    #[serde(default, deserialize_with = "crate::codec::json::optional_non_empty_string")]
    pub receive_request_attempt_id: Option<String>,
}

impl ReceiveMessageInput {
    /// Requested batch size, defaulting to one message.
    pub fn max_messages(&self) -> usize {
        self.max_number_of_messages
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(1)
    }
}

impl Validate for ReceiveMessageInput {
    fn is_valid(&self) -> bool {
        in_range(self.max_number_of_messages, 1, MAX_RECEIVE_BATCH)
            && in_range(self.visibility_timeout, 0, MAX_VISIBILITY_TIMEOUT)
            && in_range(self.wait_time_seconds, 0, MAX_WAIT_TIME_SECONDS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub receipt_handle: String,
}

impl Validate for DeleteMessageInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PurgeQueueInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
}

impl Validate for PurgeQueueInput {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueAttributesInput {
    #[serde(deserialize_with = "crate::codec::json::non_empty_string")]
    pub queue_url: String,
    #[serde(default)]
    pub attribute_names: Option<Vec<String>>,
}

impl Validate for GetQueueAttributesInput {}

/// Browsable detail page; the name comes from the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullQueueDataInput {
    pub queue_name: String,
}

/// Browsable purge; the name comes from the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeQueueByNameInput {
    pub queue_name: String,
}

/// A decoded request, one variant per implemented action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    CreateQueue(CreateQueueInput),
    DeleteQueue(DeleteQueueInput),
    ListQueues(ListQueuesInput),
    GetQueueUrl(GetQueueUrlInput),
    TagQueue(TagQueueInput),
    ListQueueTags(ListQueueTagsInput),
    UntagQueue(UntagQueueInput),
    SendMessage(SendMessageInput),
    ReceiveMessage(ReceiveMessageInput),
    DeleteMessage(DeleteMessageInput),
    PurgeQueue(PurgeQueueInput),
    GetQueueAttributes(GetQueueAttributesInput),
    FullQueueData(FullQueueDataInput),
    PurgeQueueByName(PurgeQueueByNameInput),
}

// === Responses ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateQueueResponse {
    pub queue_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQueuesResponse {
    #[serde(rename = "QueueUrls", serialize_with = "crate::codec::json::queue_urls")]
    pub queues: Vec<QueueSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueUrlResponse {
    pub queue_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueueTagsResponse {
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageResponse {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "MD5OfMessageBody")]
    pub md5_of_message_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedMessage {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handle: String,
    #[serde(rename = "MD5OfBody")]
    pub md5_of_body: String,
    #[serde(rename = "Body")]
    pub body: String,
}

impl From<Message> for ReceivedMessage {
    fn from(message: Message) -> Self {
        Self {
            receipt_handle: message.message_id.clone(),
            message_id: message.message_id,
            md5_of_body: message.md5_of_body,
            body: message.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageResponse {
    pub messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueAttributesResponse {
    pub attributes: BTreeMap<String, String>,
}

/// Queue detail page contents; rendered only by the HTML codec
#[derive(Debug, Clone)]
pub struct FullQueueDataResponse {
    pub queue: QueueData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub message: String,
}

/// A typed result ready for serialization
#[derive(Debug, Clone)]
pub enum Output {
    CreateQueue(CreateQueueResponse),
    ListQueues(ListQueuesResponse),
    GetQueueUrl(GetQueueUrlResponse),
    ListQueueTags(ListQueueTagsResponse),
    SendMessage(SendMessageResponse),
    ReceiveMessage(ReceiveMessageResponse),
    GetQueueAttributes(GetQueueAttributesResponse),
    FullQueueData(FullQueueDataResponse),
    /// Success with no body
    Empty,
    Error(ErrorResponse),
}
