use std::sync::Arc;

use log::{debug, info};
use strum_macros::Display;
use tokio::sync::watch;

use crate::queue::OrderedQueue;
use crate::scheduler::{ConfigurationError, RateLimiter, ShutdownSignal};

use super::event::{EventSink, ProcessedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderState {
    Idle,
    WaitingForSlot,
    WaitingForRequest,
    Processing,
    Stopped,
}

/// What a provider leaves behind once it stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    pub name: String,
    pub processed: u64,
}

/// A rate limited consumer of the shared queue. Every iteration waits for a
/// slot first and only then pops, so a provider never outpaces its rate even
/// when the queue is never empty.
pub struct Provider {
    name: String,
    limiter: RateLimiter,
    queue: Arc<OrderedQueue>,
    state: watch::Sender<ProviderState>,
}

impl Provider {
    pub fn new(
        name: impl Into<String>,
        rate_per_second: f64,
        queue: Arc<OrderedQueue>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let limiter =
            RateLimiter::per_second(rate_per_second).map_err(|err| err.for_provider(&name))?;
        let (state, _) = watch::channel(ProviderState::Idle);
        Ok(Self {
            name,
            limiter,
            queue,
            state,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn watch_state(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }

    fn transition(&self, next: ProviderState) {
        let previous = self.state.send_replace(next);
        debug!("{}: {} -> {}", self.name, previous, next);
    }

    /// Runs until shutdown. Work already popped is always finished, shutdown
    /// only stops the next iteration from starting.
    pub async fn run(self, sink: EventSink, shutdown: ShutdownSignal) -> ProviderReport {
        info!(
            "{} started, one request every {:?}",
            self.name,
            self.limiter.min_interval()
        );
        let mut processed = 0u64;
        loop {
            self.transition(ProviderState::WaitingForSlot);
            if self.limiter.wait_for_slot(&shutdown).await.is_err() {
                break;
            }
            self.transition(ProviderState::WaitingForRequest);
            let request = match self.queue.pop(&shutdown).await {
                Ok(request) => request,
                Err(_) => break,
            };
            self.transition(ProviderState::Processing);
            sink.record(ProcessedEvent::new(&self.name, &request));
            processed += 1;
        }
        self.transition(ProviderState::Stopped);
        info!("{} stopped after {} requests", self.name, processed);
        ProviderReport {
            name: self.name,
            processed,
        }
    }
}
