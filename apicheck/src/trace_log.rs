use crate::util;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub status_code: u16,
    pub body: Value,
    pub headers: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Request(RequestRecord),
    Response(ResponseRecord),
}

impl LogEntry {
    pub fn label(&self) -> &'static str {
        match self {
            LogEntry::Request(_) => "REQUEST DETAILS",
            LogEntry::Response(_) => "RESPONSE DETAILS",
        }
    }

    pub fn render(&self) -> String {
        let data = match self {
            LogEntry::Request(record) => util::pretty_json(record),
            LogEntry::Response(record) => util::pretty_json(record),
        };

        format!("---------{}---------\n{}", self.label(), data)
    }
}

#[derive(Debug, Default)]
struct Entries {
    entries: VecDeque<LogEntry>,
    capacity: Option<usize>,
}

impl Entries {
    fn push(&mut self, entry: LogEntry) {
        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(entry);
    }
}

/// Append-only record of the requests and responses of one test session.
///
/// `TraceLog` is a handle: clones share the same entries, which is how the
/// request builder and the assertions see one history. The log is unbounded
/// unless created with [`TraceLog::with_capacity_limit`], in which case it
/// keeps only the most recent entries and drops the oldest first.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    inner: Arc<Mutex<Entries>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `capacity` entries (at least one).
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                entries: VecDeque::with_capacity(capacity.max(1)),
                capacity: Some(capacity.max(1)),
            })),
        }
    }

    pub fn log_request<S1: Into<String>, S2: Into<String>>(
        &self,
        method: S1,
        url: S2,
        headers: &BTreeMap<String, String>,
        body: &Value,
    ) {
        let record = RequestRecord {
            method: method.into(),
            url: url.into(),
            headers: headers.clone(),
            body: body.clone(),
            timestamp: Utc::now(),
        };
        tracing::debug!(method = %record.method, url = %record.url, "request logged");

        self.inner.lock().push(LogEntry::Request(record));
    }

    pub fn log_response(
        &self,
        status_code: u16,
        body: &Value,
        headers: &BTreeMap<String, String>,
    ) {
        tracing::debug!(status_code, "response logged");

        self.inner.lock().push(LogEntry::Response(ResponseRecord {
            status_code,
            body: body.clone(),
            headers: headers.clone(),
            timestamp: Utc::now(),
        }));
    }

    /// Renders the transcript: one labelled block per entry, oldest first.
    pub fn recent_logs(&self) -> String {
        self.inner
            .lock()
            .entries
            .iter()
            .map(LogEntry::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
