//! SQS in-memory queue engine
//!
//! All queue state lives behind one engine-wide mutex. Every operation, reads
//! included, takes the lock for its whole duration, so concurrent requests are
//! fully serialized and never observe a queue mid-mutation.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Message, Queue, QueueData, QueueSummary, VISIBILITY_TIMEOUT_SECS};

/// Attribute names computed on read rather than stored
pub const APPROXIMATE_NUMBER_OF_MESSAGES: &str = "ApproximateNumberOfMessages";
pub const APPROXIMATE_NUMBER_OF_MESSAGES_NOT_VISIBLE: &str =
    "ApproximateNumberOfMessagesNotVisible";
pub const CREATED_TIMESTAMP: &str = "CreatedTimestamp";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue does not exist: {0}")]
    QueueNotFound(String),
    #[error("Receipt handle matches no message: {0}")]
    ReceiptHandleNotMatched(String),
}

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: String,
    pub md5_of_body: String,
}

#[derive(Debug)]
pub struct QueueEngine {
    endpoint: String,
    /// Queues indexed by URL
    queues: Mutex<BTreeMap<String, Queue>>,
}

impl QueueEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            queues: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Derive the URL a queue with this name has (or would have).
    pub fn queue_url(&self, name: &str) -> String {
        format!("{}/{}", self.endpoint, name)
    }

    /// Create a queue. An existing queue with the same name is replaced.
    pub fn create_queue(&self, name: &str, attributes: BTreeMap<String, String>) -> String {
        let url = self.queue_url(name);
        let queue = Queue::new(name, url.clone(), attributes, now());

        let mut queues = self.queues.lock();
        if queues.insert(url.clone(), queue).is_some() {
            info!(name = %name, url = %url, "Replaced existing queue");
        } else {
            info!(name = %name, url = %url, "Created queue");
        }
        url
    }

    pub fn delete_queue(&self, url: &str) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        queues
            .remove(url)
            .ok_or_else(|| QueueError::QueueNotFound(url.to_string()))?;

        info!(url = %url, "Deleted queue");
        Ok(())
    }

    pub fn list_queue_urls(&self) -> Vec<String> {
        self.queues.lock().keys().cloned().collect()
    }

    /// Snapshot of every live queue whose name starts with `prefix`
    pub fn list_queues(&self, prefix: Option<&str>) -> Vec<QueueSummary> {
        self.queues
            .lock()
            .values()
            .filter(|q| prefix.map_or(true, |p| q.name.starts_with(p)))
            .map(|q| QueueSummary {
                name: q.name.clone(),
                url: q.url.clone(),
                message_count: q.messages.len(),
            })
            .collect()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.lock().len()
    }

    pub fn get_queue_url(&self, name: &str) -> Result<String, QueueError> {
        let url = self.queue_url(name);
        if self.queues.lock().contains_key(&url) {
            Ok(url)
        } else {
            Err(QueueError::QueueNotFound(url))
        }
    }

    /// Merge tags into the queue's existing tags.
    pub fn tag_queue(&self, url: &str, tags: BTreeMap<String, String>) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        let queue = get_mut(&mut queues, url)?;

        info!(url = %url, count = tags.len(), "Tagged queue");
        queue.tags.extend(tags);
        Ok(())
    }

    pub fn get_queue_tags(&self, url: &str) -> Result<BTreeMap<String, String>, QueueError> {
        let queues = self.queues.lock();
        let queue = get(&queues, url)?;
        Ok(queue.tags.clone())
    }

    /// Remove tag keys; keys that are not present are ignored.
    pub fn untag_queue(&self, url: &str, keys: &[String]) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        let queue = get_mut(&mut queues, url)?;

        for key in keys {
            queue.tags.remove(key);
        }
        info!(url = %url, count = keys.len(), "Untagged queue");
        Ok(())
    }

    /// Append a message. Delay and deduplication id are accepted but not enforced.
    pub fn send_message(
        &self,
        url: &str,
        body: String,
        delay_seconds: Option<i64>,
        deduplication_id: Option<&str>,
    ) -> Result<SentMessage, QueueError> {
        let mut queues = self.queues.lock();
        let queue = get_mut(&mut queues, url)?;

        let message = Message::new(body, now());
        let sent = SentMessage {
            message_id: message.message_id.clone(),
            md5_of_body: message.md5_of_body.clone(),
        };
        queue.messages.push_back(message);

        info!(
            url = %url,
            message_id = %sent.message_id,
            delay_seconds = ?delay_seconds,
            deduplication_id = ?deduplication_id,
            "Sent message"
        );
        Ok(sent)
    }

    /// Receive up to `max` visible messages, hiding each for the visibility timeout.
    pub fn receive(&self, url: &str, max: usize) -> Result<Vec<Message>, QueueError> {
        self.receive_at(url, max, now())
    }

    /// Receive as of the given unix time in seconds.
    ///
    /// Scans the queue in insertion order; every message whose deadline has
    /// passed is selected, re-hidden until `now + 30`, and copied into the
    /// result, stopping once `max` are selected. Never waits.
    pub fn receive_at(&self, url: &str, max: usize, now: i64) -> Result<Vec<Message>, QueueError> {
        let mut queues = self.queues.lock();
        let queue = get_mut(&mut queues, url)?;

        let mut received = Vec::new();
        for message in queue.messages.iter_mut() {
            if received.len() >= max {
                break;
            }
            if message.is_visible(now) {
                message.visible_at = now + VISIBILITY_TIMEOUT_SECS;
                message.receive_count += 1;
                received.push(message.clone());
            }
        }

        debug!(url = %url, count = received.len(), "Received messages");
        Ok(received)
    }

    /// Delete the message whose id equals the receipt handle.
    pub fn delete_message(&self, url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        let queue = get_mut(&mut queues, url)?;

        let position = queue
            .messages
            .iter()
            .position(|m| m.receipt_handle() == receipt_handle)
            .ok_or_else(|| QueueError::ReceiptHandleNotMatched(receipt_handle.to_string()))?;
        queue.messages.remove(position);

        info!(url = %url, receipt = %receipt_handle, "Deleted message");
        Ok(())
    }

    /// Drop every message; attributes and tags are kept.
    pub fn purge_queue(&self, url: &str) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        purge(get_mut(&mut queues, url)?);
        Ok(())
    }

    /// Purge a queue looked up by name, resolving and purging under one lock.
    pub fn purge_queue_by_name(&self, name: &str) -> Result<String, QueueError> {
        let url = self.queue_url(name);
        let mut queues = self.queues.lock();
        purge(get_mut(&mut queues, &url)?);
        Ok(url)
    }

    pub fn get_message_count(&self, url: &str) -> Result<usize, QueueError> {
        let queues = self.queues.lock();
        Ok(get(&queues, url)?.messages.len())
    }

    /// Stored creation attributes plus the computed counters.
    pub fn get_queue_attributes(&self, url: &str) -> Result<BTreeMap<String, String>, QueueError> {
        let now = now();
        let queues = self.queues.lock();
        let queue = get(&queues, url)?;

        let visible = queue.visible_count(now);
        let mut attributes = queue.attributes.clone();
        attributes.insert(APPROXIMATE_NUMBER_OF_MESSAGES.to_string(), visible.to_string());
        attributes.insert(
            APPROXIMATE_NUMBER_OF_MESSAGES_NOT_VISIBLE.to_string(),
            (queue.messages.len() - visible).to_string(),
        );
        attributes.insert(
            CREATED_TIMESTAMP.to_string(),
            queue.created_timestamp.to_string(),
        );
        Ok(attributes)
    }

    /// Attributes, tags and messages of a queue, looked up by name.
    pub fn get_full_queue_data(&self, name: &str) -> Result<QueueData, QueueError> {
        let url = self.queue_url(name);
        let queues = self.queues.lock();
        let queue = get(&queues, &url)?;

        Ok(QueueData {
            name: queue.name.clone(),
            url: queue.url.clone(),
            attributes: queue.attributes.clone(),
            tags: queue.tags.clone(),
            messages: queue.messages.iter().cloned().collect(),
        })
    }
}

fn get<'a>(queues: &'a BTreeMap<String, Queue>, url: &str) -> Result<&'a Queue, QueueError> {
    queues
        .get(url)
        .ok_or_else(|| QueueError::QueueNotFound(url.to_string()))
}

fn get_mut<'a>(
    queues: &'a mut BTreeMap<String, Queue>,
    url: &str,
) -> Result<&'a mut Queue, QueueError> {
    queues
        .get_mut(url)
        .ok_or_else(|| QueueError::QueueNotFound(url.to_string()))
}

fn purge(queue: &mut Queue) {
    let purged = queue.messages.len();
    queue.messages.clear();
    info!(url = %queue.url, purged, "Purged queue");
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
