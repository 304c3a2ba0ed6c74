//! Queue and message records owned by the engine

use std::collections::{BTreeMap, VecDeque};

use md5::{Digest, Md5};
use uuid::Uuid;

/// Seconds a received message stays hidden from later receives.
pub const VISIBILITY_TIMEOUT_SECS: i64 = 30;

/// A queue, keyed in the engine by its URL
#[derive(Debug, Clone)]
pub struct Queue {
    pub name: String,
    pub url: String,
    /// Opaque creation attributes, replaced wholesale on create
    pub attributes: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    /// Insertion ordered
    pub messages: VecDeque<Message>,
    pub created_timestamp: i64,
}

impl Queue {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        attributes: BTreeMap<String, String>,
        now: i64,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            attributes,
            tags: BTreeMap::new(),
            messages: VecDeque::new(),
            created_timestamp: now,
        }
    }

    /// Number of messages a receive at `now` could select
    pub fn visible_count(&self, now: i64) -> usize {
        self.messages.iter().filter(|m| m.is_visible(now)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    pub body: String,
    pub md5_of_body: String,
    /// Unix seconds; 0 means visible immediately
    pub visible_at: i64,
    pub sent_timestamp: i64,
    pub receive_count: u32,
}

impl Message {
    pub fn new(body: String, now: i64) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            md5_of_body: md5_hex(body.as_bytes()),
            body,
            visible_at: 0,
            sent_timestamp: now,
            receive_count: 0,
        }
    }

    /// The receipt handle is the message id, stable across receives.
    pub fn receipt_handle(&self) -> &str {
        &self.message_id
    }

    pub fn is_visible(&self, now: i64) -> bool {
        self.visible_at <= now
    }
}

/// Row of the queue listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSummary {
    pub name: String,
    pub url: String,
    pub message_count: usize,
}

/// Everything the queue detail page shows, captured in one snapshot
#[derive(Debug, Clone)]
pub struct QueueData {
    pub name: String,
    pub url: String,
    pub attributes: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub messages: Vec<Message>,
}

/// Lowercase hex MD5 digest
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
