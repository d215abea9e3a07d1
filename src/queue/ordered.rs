use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::request::Request;
use crate::scheduler::{Cancelled, ShutdownSignal};

/// Heap slot. `BinaryHeap` is a max-heap so "greater" here means
/// "dispatched sooner": higher priority, then older arrival, then lower
/// sequence number for arrivals that share an instant.
#[derive(Debug)]
struct Entry {
    request: Request,
    sequence: u64,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.request
            .priority()
            .cmp(&other.request.priority())
            .then_with(|| other.request.arrival().cmp(&self.request.arrival()))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

#[derive(Debug, Default)]
struct Pending {
    heap: BinaryHeap<Entry>,
    next_sequence: u64,
}

/// Unbounded pending-request queue shared by every provider.
///
/// All mutation happens under one lock. Poppers that find it empty park on
/// `available` and re-check once woken, so spurious wakeups are harmless.
#[derive(Debug, Default)]
pub struct OrderedQueue {
    pending: Mutex<Pending>,
    available: Notify,
}

impl OrderedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, request: Request) {
        {
            let mut pending = self.pending.lock();
            let sequence = pending.next_sequence;
            pending.next_sequence += 1;
            debug!("Queued {} (depth {})", request, pending.heap.len() + 1);
            pending.heap.push(Entry { request, sequence });
        }
        self.available.notify_one();
    }

    /// Removes the most urgent request without waiting
    pub fn try_pop(&self) -> Option<Request> {
        self.pending.lock().heap.pop().map(|entry| entry.request)
    }

    /// Removes the most urgent request, parking until one shows up if the
    /// queue is empty. Returns `Cancelled` instead once shutdown starts.
    pub async fn pop(&self, shutdown: &ShutdownSignal) -> Result<Request, Cancelled> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // register before looking so a push landing in between still wakes us
            notified.as_mut().enable();

            if shutdown.is_triggered() {
                return Err(Cancelled);
            }
            if let Some(request) = self.try_pop() {
                return Ok(request);
            }
            tokio::select! {
                biased;
                _ = shutdown.triggered() => return Err(Cancelled),
                _ = &mut notified => {}
            }
        }
    }

    /// Racy snapshot, only good for heuristics
    pub fn len(&self) -> usize {
        self.pending.lock().heap.len()
    }

    /// Racy snapshot, only good for heuristics
    pub fn is_empty(&self) -> bool {
        self.pending.lock().heap.is_empty()
    }
}
