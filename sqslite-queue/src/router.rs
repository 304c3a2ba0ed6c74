//! Action router
//!
//! Classifies each request by protocol, resolves the action (from the
//! `x-amz-target` header for JSON, from the path for the browsable pages),
//! decodes the input with the matching codec, calls the engine and encodes the
//! outcome. Engine failures become [`ApiError`]s here and nowhere else.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::Response,
};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use sqslite_core::{ApiError, RequestId, REQUEST_ID_HEADER};
use tracing::{error, info, warn};

use crate::codec::{Codec, HtmlCodec, JsonCodec, SerdeError, WireCodec};
use crate::engine::{QueueEngine, QueueError};
use crate::protocol::{
    Action, CreateQueueResponse, ErrorResponse, FullQueueDataInput, FullQueueDataResponse,
    GetQueueAttributesResponse, GetQueueUrlResponse, Input, ListQueueTagsResponse,
    ListQueuesInput, ListQueuesResponse, Output, Protocol, PurgeQueueByNameInput,
    ReceiveMessageResponse, ReceivedMessage, SendMessageResponse, AWS_QUERY_PROTOCOL,
    AWS_TARGET, AWS_TRACE_ID, QUEUE_NAME,
};

const ALL_ATTRIBUTES: &str = "All";

/// Shared handler state
#[derive(Debug)]
pub struct SqsState {
    pub engine: QueueEngine,
}

impl SqsState {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            engine: QueueEngine::new(endpoint),
        }
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::QueueNotFound(_) => ApiError::queue_does_not_exist(),
            QueueError::ReceiptHandleNotMatched(_) => ApiError::receipt_handle_is_invalid(),
        }
    }
}

impl From<SerdeError> for ApiError {
    fn from(err: SerdeError) -> Self {
        match err {
            SerdeError::InvalidBody => ApiError::invalid_body(),
            SerdeError::NotImplemented(_) => ApiError::not_implemented(),
            SerdeError::Encode(msg) => ApiError::internal(msg),
        }
    }
}

/// Transport-neutral response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: String,
    /// Set for redirects
    pub location: Option<String>,
}

impl Reply {
    fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
            location: Some(location.into()),
        }
    }

    fn plain(err: &ApiError) -> Self {
        Self {
            status: status_of(err),
            content_type: Some("text/plain"),
            body: err.message.clone(),
            location: None,
        }
    }

    fn into_response(self, request_id: &RequestId) -> Response {
        let mut builder = Response::builder()
            .status(self.status)
            .header(REQUEST_ID_HEADER, request_id.as_str());
        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(location) = self.location {
            builder = builder.header(header::LOCATION, location);
        }

        builder.body(Body::from(self.body)).unwrap_or_else(|e| {
            error!(error = %e, "Failed to build response");
            let mut response = Response::new(Body::from("internal error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
    }
}

fn status_of(err: &ApiError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serve every path from one handler; the router does its own path resolution.
pub fn routes() -> axum::Router<Arc<SqsState>> {
    axum::Router::new().fallback(handle_request)
}

/// Axum entry point
pub async fn handle_request(
    State(state): State<Arc<SqsState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = RequestId::new();
    route(&state.engine, &method, uri.path(), &headers, &body).into_response(&request_id)
}

/// Route one request against the engine.
pub fn route(
    engine: &QueueEngine,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Reply {
    let protocol = extract_protocol(headers);
    info!(
        method = %method,
        path = %path,
        protocol = protocol.as_str(),
        trace_id = extract_trace_id(headers).unwrap_or("-"),
        "SQS request"
    );

    match protocol {
        Protocol::AwsJson1_0 => dispatch_json(engine, headers, body),
        Protocol::TextHtml => dispatch_html(engine, method, path),
        Protocol::AwsQuery => {
            warn!(path = %path, "Rejected query protocol request");
            Reply::plain(&ApiError::protocol_rejected(AWS_QUERY_PROTOCOL))
        }
    }
}

pub fn extract_protocol(headers: &HeaderMap) -> Protocol {
    Protocol::from_content_type(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    )
}

/// The action named by `x-amz-target`; unknown values count as absent.
pub fn extract_action(headers: &HeaderMap) -> Option<Action> {
    headers
        .get(AWS_TARGET)
        .and_then(|v| v.to_str().ok())
        .and_then(Action::from_target)
}

pub fn extract_trace_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(AWS_TRACE_ID).and_then(|v| v.to_str().ok())
}

/// Percent-decoded queue name carried by the browsable-route pseudo-header
pub fn extract_queue_name(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(QUEUE_NAME)?.to_str().ok()?;
    let name = percent_decode_str(raw).decode_utf8().ok()?;
    (!name.is_empty()).then(|| name.into_owned())
}

fn respond(codec: Codec, result: Result<Output, ApiError>) -> Reply {
    let (status, output) = match result {
        Ok(output) => (StatusCode::OK, output),
        Err(err) => {
            warn!(kind = err.kind.as_str(), message = %err.message, "Request failed");
            let status = status_of(&err);
            (
                status,
                Output::Error(ErrorResponse {
                    message: err.message,
                }),
            )
        }
    };

    match codec.serialize(&output) {
        Ok(body) => Reply {
            status,
            content_type: Some(codec.content_type()),
            body,
            location: None,
        },
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            Reply::plain(&ApiError::from(e))
        }
    }
}

fn dispatch_json(engine: &QueueEngine, headers: &HeaderMap, body: &[u8]) -> Reply {
    let codec = Codec::Json(JsonCodec);
    let result = extract_action(headers)
        .ok_or_else(|| ApiError::missing_header(AWS_TARGET))
        .and_then(|action| codec.deserialize(action, body).map_err(ApiError::from))
        .and_then(|input| invoke(engine, input));
    respond(codec, result)
}

/// A browsable path resolved to what it does
#[derive(Debug)]
enum Page {
    Redirect(&'static str),
    /// Action plus the pseudo-headers standing in for a request body
    Action(Action, HeaderMap),
}

fn resolve_page(path: &str) -> Option<Page> {
    match path {
        "/" => return Some(Page::Redirect("/queues")),
        "/queues" | "/queues/" => {
            return Some(Page::Action(Action::ListQueues, HeaderMap::new()))
        }
        _ => {}
    }

    let rest = path.strip_prefix("/queues/")?;
    let segments: Vec<&str> = rest.split('/').collect();
    let (action, raw_name) = match segments.as_slice() {
        [name] if !name.is_empty() => (Action::FullQueueData, *name),
        [name, "purge"] if !name.is_empty() => (Action::PurgeQueue, *name),
        _ => return None,
    };

    let mut pseudo = HeaderMap::new();
    pseudo.insert(QUEUE_NAME, HeaderValue::from_str(raw_name).ok()?);
    Some(Page::Action(action, pseudo))
}

/// Build the typed input for a browsable action from its pseudo-headers.
fn page_input(action: Action, pseudo: &HeaderMap) -> Result<Input, ApiError> {
    let queue_name = || extract_queue_name(pseudo).ok_or_else(ApiError::queue_does_not_exist);
    match action {
        Action::ListQueues => Ok(Input::ListQueues(ListQueuesInput::default())),
        Action::FullQueueData => Ok(Input::FullQueueData(FullQueueDataInput {
            queue_name: queue_name()?,
        })),
        Action::PurgeQueue => Ok(Input::PurgeQueueByName(PurgeQueueByNameInput {
            queue_name: queue_name()?,
        })),
        _ => Err(ApiError::not_implemented()),
    }
}

fn dispatch_html(engine: &QueueEngine, method: &Method, path: &str) -> Reply {
    let codec = Codec::Html(HtmlCodec);
    if method != Method::GET {
        return respond(codec, Err(ApiError::method_not_allowed(method.as_str())));
    }

    let (action, pseudo) = match resolve_page(path) {
        Some(Page::Redirect(location)) => {
            return Reply::redirect(StatusCode::MOVED_PERMANENTLY, location)
        }
        Some(Page::Action(action, pseudo)) => (action, pseudo),
        None => return respond(codec, Err(ApiError::route_not_found(path))),
    };

    let result = page_input(action, &pseudo).and_then(|input| invoke(engine, input));
    match (action, result) {
        (Action::PurgeQueue, Ok(_)) => {
            let raw_name = pseudo
                .get(QUEUE_NAME)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            Reply::redirect(StatusCode::FOUND, format!("/queues/{raw_name}"))
        }
        (_, result) => respond(codec, result),
    }
}

/// Run a decoded input against the engine.
pub fn invoke(engine: &QueueEngine, input: Input) -> Result<Output, ApiError> {
    let output = match input {
        Input::CreateQueue(req) => Output::CreateQueue(CreateQueueResponse {
            queue_url: engine.create_queue(&req.queue_name, req.attributes),
        }),
        Input::DeleteQueue(req) => {
            engine.delete_queue(&req.queue_url)?;
            Output::Empty
        }
        Input::ListQueues(req) => Output::ListQueues(ListQueuesResponse {
            queues: engine.list_queues(req.queue_name_prefix.as_deref()),
        }),
        Input::GetQueueUrl(req) => Output::GetQueueUrl(GetQueueUrlResponse {
            queue_url: engine.get_queue_url(&req.queue_name)?,
        }),
        Input::TagQueue(req) => {
            engine.tag_queue(&req.queue_url, req.tags)?;
            Output::Empty
        }
        Input::ListQueueTags(req) => Output::ListQueueTags(ListQueueTagsResponse {
            tags: engine.get_queue_tags(&req.queue_url)?,
        }),
        Input::UntagQueue(req) => {
            engine.untag_queue(&req.queue_url, &req.tag_keys)?;
            Output::Empty
        }
        Input::SendMessage(req) => {
            let sent = engine.send_message(
                &req.queue_url,
                req.message_body,
                req.delay_seconds,
                req.message_deduplication_id.as_deref(),
            )?;
            Output::SendMessage(SendMessageResponse {
                message_id: sent.message_id,
                md5_of_message_body: sent.md5_of_body,
            })
        }
        Input::ReceiveMessage(req) => {
            let messages = engine.receive(&req.queue_url, req.max_messages())?;
            Output::ReceiveMessage(ReceiveMessageResponse {
                messages: messages.into_iter().map(ReceivedMessage::from).collect(),
            })
        }
        Input::DeleteMessage(req) => {
            engine.delete_message(&req.queue_url, &req.receipt_handle)?;
            Output::Empty
        }
        Input::PurgeQueue(req) => {
            engine.purge_queue(&req.queue_url)?;
            Output::Empty
        }
        Input::GetQueueAttributes(req) => {
            let attributes = engine.get_queue_attributes(&req.queue_url)?;
            Output::GetQueueAttributes(GetQueueAttributesResponse {
                attributes: select_attributes(attributes, req.attribute_names.as_deref()),
            })
        }
        Input::FullQueueData(req) => Output::FullQueueData(FullQueueDataResponse {
            queue: engine.get_full_queue_data(&req.queue_name)?,
        }),
        Input::PurgeQueueByName(req) => {
            engine.purge_queue_by_name(&req.queue_name)?;
            Output::Empty
        }
    };
    Ok(output)
}

/// Absent names, or a list containing `All`, select every attribute.
fn select_attributes(
    attributes: BTreeMap<String, String>,
    names: Option<&[String]>,
) -> BTreeMap<String, String> {
    match names {
        Some(names) if !names.iter().any(|n| n == ALL_ATTRIBUTES) => attributes
            .into_iter()
            .filter(|(key, _)| names.contains(key))
            .collect(),
        _ => attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AWS_JSON_PROTOCOL_1_0;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ENDPOINT: &str = "http://localhost:8080/000000000000";

    fn engine() -> QueueEngine {
        QueueEngine::new(ENDPOINT)
    }

    fn json_headers(target: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(AWS_JSON_PROTOCOL_1_0),
        );
        headers.insert(AWS_TARGET, HeaderValue::from_str(target).unwrap());
        headers
    }

    fn call(engine: &QueueEngine, target: &str, body: Value) -> (StatusCode, String) {
        let reply = route(
            engine,
            &Method::POST,
            "/",
            &json_headers(target),
            body.to_string().as_bytes(),
        );
        (reply.status, reply.body)
    }

    fn get_page(engine: &QueueEngine, path: &str) -> Reply {
        route(engine, &Method::GET, path, &HeaderMap::new(), b"")
    }

    #[test]
    fn test_extract_protocol() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_protocol(&headers), Protocol::TextHtml);

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        assert_eq!(extract_protocol(&headers), Protocol::AwsQuery);

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(AWS_JSON_PROTOCOL_1_0),
        );
        assert_eq!(extract_protocol(&headers), Protocol::AwsJson1_0);
    }

    #[test]
    fn test_extract_action_and_trace_id() {
        let mut headers = json_headers("AmazonSQS.SendMessage");
        assert_eq!(extract_action(&headers), Some(Action::SendMessage));
        assert_eq!(extract_trace_id(&headers), None);

        headers.insert(AWS_TRACE_ID, HeaderValue::from_static("Root=1-abc"));
        assert_eq!(extract_trace_id(&headers), Some("Root=1-abc"));

        headers.insert(AWS_TARGET, HeaderValue::from_static("AmazonSQS.Nope"));
        assert_eq!(extract_action(&headers), None);
    }

    #[test]
    fn test_extract_queue_name_decodes() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_queue_name(&headers), None);

        headers.insert(QUEUE_NAME, HeaderValue::from_static("my%20queue"));
        assert_eq!(extract_queue_name(&headers).as_deref(), Some("my queue"));

        headers.insert(QUEUE_NAME, HeaderValue::from_static(""));
        assert_eq!(extract_queue_name(&headers), None);
    }

    #[test]
    fn test_create_and_get_queue_url() {
        let engine = engine();
        let (status, body) = call(
            &engine,
            "AmazonSQS.CreateQueue",
            json!({"QueueName": "orders"}),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!(r#"{{"QueueUrl":"{ENDPOINT}/orders"}}"#));

        let (status, body) = call(
            &engine,
            "AmazonSQS.GetQueueUrl",
            json!({"QueueName": "orders"}),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!(r#"{{"QueueUrl":"{ENDPOINT}/orders"}}"#));
    }

    #[test]
    fn test_missing_target_header() {
        let engine = engine();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(AWS_JSON_PROTOCOL_1_0),
        );
        let reply = route(&engine, &Method::POST, "/", &headers, b"{}");
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, r#"{"Message":"x-amz-target header not found"}"#);

        let (status, body) = call(&engine, "AmazonSQS.Bogus", json!({}));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"Message":"x-amz-target header not found"}"#);
    }

    #[test]
    fn test_unimplemented_action() {
        let (status, body) = call(&engine(), "AmazonSQS.SendMessageBatch", json!({}));
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body, r#"{"Message":"action not implemented"}"#);
    }

    #[test]
    fn test_invalid_body() {
        let engine = engine();
        let (status, body) = call(&engine, "AmazonSQS.CreateQueue", json!({"QueueName": ""}));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"Message":"invalid request body"}"#);

        let reply = route(
            &engine,
            &Method::POST,
            "/",
            &json_headers("AmazonSQS.CreateQueue"),
            b"{not json",
        );
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(engine.queue_count(), 0);
    }

    #[test]
    fn test_queue_does_not_exist() {
        let engine = engine();
        for (target, body) in [
            ("AmazonSQS.DeleteQueue", json!({"QueueUrl": "nope"})),
            ("AmazonSQS.GetQueueUrl", json!({"QueueName": "nope"})),
            ("AmazonSQS.PurgeQueue", json!({"QueueUrl": "nope"})),
            (
                "AmazonSQS.SendMessage",
                json!({"QueueUrl": "nope", "MessageBody": "hi"}),
            ),
            ("AmazonSQS.ReceiveMessage", json!({"QueueUrl": "nope"})),
            ("AmazonSQS.ListQueueTags", json!({"QueueUrl": "nope"})),
        ] {
            let (status, body) = call(&engine, target, body);
            assert_eq!(status, StatusCode::BAD_REQUEST, "{target}");
            assert_eq!(body, r#"{"Message":"The specified queue does not exist."}"#);
        }
    }

    #[test]
    fn test_message_lifecycle() {
        let engine = engine();
        let url = engine.create_queue("q", BTreeMap::new());

        let (status, body) = call(
            &engine,
            "AmazonSQS.SendMessage",
            json!({"QueueUrl": url, "MessageBody": "hello"}),
        );
        assert_eq!(status, StatusCode::OK);
        let sent: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["MD5OfMessageBody"], "5d41402abc4b2a76b9719d911017c592");

        let (status, body) = call(
            &engine,
            "AmazonSQS.ReceiveMessage",
            json!({"QueueUrl": url, "MaxNumberOfMessages": 10}),
        );
        assert_eq!(status, StatusCode::OK);
        let received: Value = serde_json::from_str(&body).unwrap();
        let messages = received["Messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["Body"], "hello");
        assert_eq!(messages[0]["MessageId"], sent["MessageId"]);
        let handle = messages[0]["ReceiptHandle"].as_str().unwrap().to_string();

        let (_, body) = call(&engine, "AmazonSQS.ReceiveMessage", json!({"QueueUrl": url}));
        assert_eq!(body, r#"{"Messages":[]}"#);

        let (status, body) = call(
            &engine,
            "AmazonSQS.DeleteMessage",
            json!({"QueueUrl": url, "ReceiptHandle": handle}),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");

        let (status, body) = call(
            &engine,
            "AmazonSQS.DeleteMessage",
            json!({"QueueUrl": url, "ReceiptHandle": handle}),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            r#"{"Message":"The specified receipt handle isn't valid."}"#
        );
    }

    #[test]
    fn test_tags_round_trip() {
        let engine = engine();
        let url = engine.create_queue("q", BTreeMap::new());

        call(&engine, "AmazonSQS.TagQueue", json!({"QueueUrl": url, "Tags": {"a": "1"}}));
        call(&engine, "AmazonSQS.TagQueue", json!({"QueueUrl": url, "Tags": {"b": "2"}}));
        call(&engine, "AmazonSQS.UntagQueue", json!({"QueueUrl": url, "TagKeys": ["zzz"]}));

        let (status, body) = call(&engine, "AmazonSQS.ListQueueTags", json!({"QueueUrl": url}));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"Tags":{"a":"1","b":"2"}}"#);
    }

    #[test]
    fn test_list_queues_with_prefix() {
        let engine = engine();
        engine.create_queue("orders", BTreeMap::new());
        engine.create_queue("orders-dlq", BTreeMap::new());
        engine.create_queue("payments", BTreeMap::new());

        let reply = route(
            &engine,
            &Method::POST,
            "/",
            &json_headers("AmazonSQS.ListQueues"),
            b"",
        );
        let all: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(all["QueueUrls"].as_array().unwrap().len(), 3);

        let (_, body) = call(
            &engine,
            "AmazonSQS.ListQueues",
            json!({"QueueNamePrefix": "orders"}),
        );
        assert_eq!(
            body,
            format!(r#"{{"QueueUrls":["{ENDPOINT}/orders","{ENDPOINT}/orders-dlq"]}}"#)
        );
    }

    #[test]
    fn test_get_queue_attributes_selection() {
        let engine = engine();
        let attributes = BTreeMap::from([("DelaySeconds".to_string(), "5".to_string())]);
        let url = engine.create_queue("q", attributes);
        engine.send_message(&url, "m".to_string(), None, None).unwrap();

        let (_, body) = call(&engine, "AmazonSQS.GetQueueAttributes", json!({"QueueUrl": url}));
        let all: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(all["Attributes"]["DelaySeconds"], "5");
        assert_eq!(all["Attributes"]["ApproximateNumberOfMessages"], "1");
        assert_eq!(all["Attributes"]["ApproximateNumberOfMessagesNotVisible"], "0");
        assert!(all["Attributes"]["CreatedTimestamp"].is_string());

        let (_, body) = call(
            &engine,
            "AmazonSQS.GetQueueAttributes",
            json!({"QueueUrl": url, "AttributeNames": ["ApproximateNumberOfMessages"]}),
        );
        assert_eq!(body, r#"{"Attributes":{"ApproximateNumberOfMessages":"1"}}"#);

        let (_, body) = call(
            &engine,
            "AmazonSQS.GetQueueAttributes",
            json!({"QueueUrl": url, "AttributeNames": ["All"]}),
        );
        let all: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(all["Attributes"].as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_query_protocol_rejected() {
        let engine = engine();
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        let reply = route(
            &engine,
            &Method::POST,
            "/",
            &headers,
            b"Action=CreateQueue&QueueName=q",
        );
        assert_eq!(reply.status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(reply.content_type, Some("text/plain"));
        assert_eq!(engine.queue_count(), 0);
    }

    #[test]
    fn test_html_root_redirects() {
        let reply = get_page(&engine(), "/");
        assert_eq!(reply.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(reply.location.as_deref(), Some("/queues"));
    }

    #[test]
    fn test_html_pages() {
        let engine = engine();
        let url = engine.create_queue("my queue", BTreeMap::new());
        engine.send_message(&url, "payload".to_string(), None, None).unwrap();

        let reply = get_page(&engine, "/queues");
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.content_type, Some("text/html"));
        assert!(reply.body.contains(r#"href="/queues/my%20queue""#));

        let reply = get_page(&engine, "/queues/my%20queue");
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Queue Details"));
        assert!(reply.body.contains("payload"));

        let reply = get_page(&engine, "/queues/my%20queue/purge");
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some("/queues/my%20queue"));
        assert_eq!(engine.get_message_count(&url), Ok(0));
    }

    #[test]
    fn test_html_errors() {
        let engine = engine();

        let reply = get_page(&engine, "/queues/missing");
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body.contains("The specified queue does not exist."));

        let reply = get_page(&engine, "/queues/missing/purge");
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.location.is_none());

        let reply = get_page(&engine, "/favicon.ico");
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.content_type, Some("text/html"));

        let reply = get_page(&engine, "/queues/a/b/c");
        assert_eq!(reply.status, StatusCode::NOT_FOUND);

        let reply = route(&engine, &Method::POST, "/queues", &HeaderMap::new(), b"");
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_select_attributes() {
        let attributes = BTreeMap::from([
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "2".to_string()),
        ]);
        assert_eq!(select_attributes(attributes.clone(), None), attributes);
        assert!(select_attributes(attributes.clone(), Some(&[][..])).is_empty());
        assert_eq!(
            select_attributes(attributes.clone(), Some(&["B".to_string()][..])).len(),
            1
        );
        assert_eq!(
            select_attributes(attributes.clone(), Some(&["All".to_string()][..])),
            attributes
        );
    }

    #[test]
    fn test_reply_into_response_headers() {
        let reply = Reply::redirect(StatusCode::FOUND, "/queues/q");
        let response = reply.into_response(&RequestId::with_id("req-123"));

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
        assert_eq!(response.headers()[header::LOCATION], "/queues/q");
        assert!(!response.headers().contains_key(header::CONTENT_TYPE));

        let reply = Reply::plain(&ApiError::protocol_rejected(AWS_QUERY_PROTOCOL));
        let response = reply.into_response(&RequestId::with_id("req-456"));
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-456");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn test_service_sets_request_id() {
        let state = Arc::new(SqsState::new(ENDPOINT));
        let app = routes().with_state(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, AWS_JSON_PROTOCOL_1_0)
                    .header(AWS_TARGET, "AmazonSQS.CreateQueue")
                    .body(Body::from(r#"{"QueueName":"svc"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], format!(r#"{{"QueueUrl":"{ENDPOINT}/svc"}}"#).as_bytes());
        assert_eq!(state.engine.queue_count(), 1);
    }

    #[tokio::test]
    async fn test_service_redirect() {
        let app = routes().with_state(Arc::new(SqsState::new(ENDPOINT)));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/queues");
    }
}
