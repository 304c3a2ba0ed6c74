//! HTML codec for the browsable queue pages

use std::fmt::Write as _;

use chrono::DateTime;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{SerdeError, WireCodec};
use crate::model::{QueueData, QueueSummary};
use crate::protocol::{Action, Input, Output};

const STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/bulma@0.9.4/css/bulma.min.css";

/// Characters escaped when a queue name becomes a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlCodec;

impl WireCodec for HtmlCodec {
    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn serialize(&self, output: &Output) -> Result<String, SerdeError> {
        match output {
            Output::ListQueues(res) => Ok(queue_list_page(&res.queues)),
            Output::FullQueueData(res) => Ok(queue_detail_page(&res.queue)),
            Output::Error(err) => Ok(error_page(&err.message)),
            Output::Empty => Ok(String::new()),
            _ => Err(SerdeError::NotImplemented("HTML rendering".to_string())),
        }
    }

    /// Browsable routes carry no body; their inputs are built from the path.
    fn deserialize(&self, action: Action, _body: &[u8]) -> Result<Input, SerdeError> {
        Err(SerdeError::NotImplemented(format!("{action:?} over HTML")))
    }
}

/// Escape text for element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn queue_path(name: &str) -> String {
    format!("/queues/{}", utf8_percent_encode(name, PATH_SEGMENT))
}

fn page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{STYLESHEET}">
</head>
<body>
<section class="section">
<div class="container">
{content}
</div>
</section>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn queue_list_page(queues: &[QueueSummary]) -> String {
    let mut rows = String::new();
    for queue in queues {
        let _ = writeln!(
            rows,
            r#"<tr><td><a href="{href}">{name}</a></td><td>{url}</td><td>{count}</td></tr>"#,
            href = escape_html(&queue_path(&queue.name)),
            name = escape_html(&queue.name),
            url = escape_html(&queue.url),
            count = queue.message_count,
        );
    }

    let content = format!(
        r#"<h1 class="title">Queues</h1>
<table class="table is-fullwidth is-striped">
<thead><tr><th>Queue Name</th><th>Queue URL</th><th>Message Count</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    );
    page("Queues", &content)
}

fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

fn queue_detail_page(queue: &QueueData) -> String {
    let mut attributes = String::new();
    let _ = writeln!(
        attributes,
        "<tr><th>Name</th><td>{}</td></tr>",
        escape_html(&queue.name)
    );
    let _ = writeln!(
        attributes,
        "<tr><th>URL</th><td>{}</td></tr>",
        escape_html(&queue.url)
    );
    let _ = writeln!(
        attributes,
        "<tr><th>Message Count</th><td>{}</td></tr>",
        queue.messages.len()
    );
    for (key, value) in &queue.attributes {
        let _ = writeln!(
            attributes,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape_html(key),
            escape_html(value)
        );
    }

    let mut tags = String::new();
    for (key, value) in &queue.tags {
        let _ = write!(
            tags,
            r#"<span class="tag">{}:{}</span> "#,
            escape_html(key),
            escape_html(value)
        );
    }
    let _ = writeln!(attributes, "<tr><th>Tags</th><td>{}</td></tr>", tags.trim_end());

    let mut messages = String::new();
    for message in &queue.messages {
        let _ = writeln!(
            messages,
            "<tr><td>{}</td><td><pre>{}</pre></td><td>{}</td><td>{}</td></tr>",
            escape_html(&message.message_id),
            escape_html(&message.body),
            message.receive_count,
            format_timestamp(message.sent_timestamp),
        );
    }

    let content = format!(
        r#"<nav class="breadcrumb"><ul><li><a href="/queues">Queues</a></li><li class="is-active"><a href="{href}">{name}</a></li></ul></nav>
<h1 class="title">Queue Details</h1>
<h2 class="subtitle">Actions</h2>
<div class="buttons">
<a class="button is-danger" href="{href}/purge">Purge</a>
</div>
<h2 class="subtitle">Attributes</h2>
<table class="table is-fullwidth">
<tbody>
{attributes}</tbody>
</table>
<h2 class="subtitle">Messages</h2>
<table class="table is-fullwidth is-striped">
<thead><tr><th>Message ID</th><th>Body</th><th>Receive Count</th><th>Sent</th></tr></thead>
<tbody>
{messages}</tbody>
</table>"#,
        href = escape_html(&queue_path(&queue.name)),
        name = escape_html(&queue.name),
    );
    page(&queue.name, &content)
}

fn error_page(message: &str) -> String {
    let content = format!(
        r#"<h1 class="title">Error</h1>
<div class="notification is-danger">{}</div>
<a href="/queues">Back to queues</a>"#,
        escape_html(message)
    );
    page("Error", &content)
}
