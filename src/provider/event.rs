use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::dispatcher::Outstanding;
use crate::request::{Request, RequestId, TIMESTAMP_FORMAT};
use crate::scheduler::Priority;

/// Emitted once for every request a provider finishes
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedEvent {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub request_id: RequestId,
    pub priority: Priority,
    pub received_at: DateTime<Utc>,
}

impl ProcessedEvent {
    pub fn new(provider: &str, request: &Request) -> Self {
        Self {
            timestamp: Utc::now(),
            provider: provider.to_owned(),
            request_id: request.id(),
            priority: request.priority(),
            received_at: request.received_at(),
        }
    }
}

impl Display for ProcessedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} processing Request(id={}, priority={})",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.provider,
            self.request_id,
            self.priority
        )
    }
}

pub type EventStream = mpsc::UnboundedReceiver<ProcessedEvent>;

/// Where providers report finished work
#[derive(Debug, Clone)]
pub struct EventSink {
    events: mpsc::UnboundedSender<ProcessedEvent>,
    outstanding: Arc<Outstanding>,
}

impl EventSink {
    pub fn new(outstanding: Arc<Outstanding>) -> (Self, EventStream) {
        let (events, stream) = mpsc::unbounded_channel();
        (Self { events, outstanding }, stream)
    }

    /// Publishes the event and marks its request as done. Nobody listening
    /// is not a reason to stop processing.
    pub fn record(&self, event: ProcessedEvent) {
        if let Err(err) = self.events.send(event) {
            warn!("Dropped event for request {}, stream is closed", err.0.request_id);
        }
        self.outstanding.complete();
    }
}
