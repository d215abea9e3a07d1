use std::fmt::Display;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scheduler::Priority;

/// Handed out by whoever generates requests, never reused
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize)]
pub struct RequestId(pub u64);

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work waiting to be picked up by a provider. Nothing about it
/// changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    id: RequestId,
    priority: Priority,
    /// monotonic, this is what ordering looks at
    arrival: Instant,
    /// wall clock, only used for display
    received_at: DateTime<Utc>,
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl Request {
    pub fn new(id: RequestId, priority: Priority) -> Self {
        Self::with_arrival(id, priority, Instant::now())
    }

    pub fn with_arrival(id: RequestId, priority: Priority, arrival: Instant) -> Self {
        Self {
            id,
            priority,
            arrival,
            received_at: Utc::now(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn arrival(&self) -> Instant {
        self.arrival
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request(id={}, priority={}, received={})",
            self.id,
            self.priority,
            self.received_at.format(TIMESTAMP_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Request, RequestId};
    use crate::scheduler::Priority;

    #[test]
    fn displays_id_priority_and_receive_time() {
        let request = Request::new(RequestId(7), Priority::URGENT);
        let shown = request.to_string();
        assert!(shown.starts_with("Request(id=7, priority=3, received="));
        assert!(shown.ends_with(')'));
    }

    #[test]
    fn later_requests_arrive_later() {
        let first = Request::new(RequestId(1), Priority::LOW);
        let second = Request::new(RequestId(2), Priority::LOW);
        assert!(first.arrival() <= second.arrival());
    }
}
