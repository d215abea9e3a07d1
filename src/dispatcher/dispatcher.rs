use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{error, info};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::provider::{EventSink, EventStream, Provider, ProviderReport, ProviderState};
use crate::queue::OrderedQueue;
use crate::request::{Request, RequestId};
use crate::scheduler::{ConfigurationError, Priority, Shutdown};

use super::outstanding::Outstanding;

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub rate_per_second: f64,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, rate_per_second: f64) -> Self {
        Self {
            name: name.into(),
            rate_per_second,
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("gave up waiting for providers to drain, {outstanding} requests still outstanding")]
    DrainTimeout { outstanding: usize },
    #[error("provider {name} crashed before shutting down")]
    ProviderCrashed { name: String },
}

/// Cheap handle for pushing requests in from any task
#[derive(Debug, Clone)]
pub struct Submitter {
    queue: Arc<OrderedQueue>,
    outstanding: Arc<Outstanding>,
}

impl Submitter {
    /// Arrival time is taken right here
    pub fn submit_request(&self, id: RequestId, priority: Priority) {
        self.submit(Request::new(id, priority));
    }

    pub fn submit(&self, request: Request) {
        // counted before the push so a fast provider can't complete it first
        self.outstanding.add(1);
        self.queue.push(request);
    }

    pub fn submit_all<I>(&self, requests: I) -> usize
    where
        I: IntoIterator<Item = (RequestId, Priority)>,
    {
        requests
            .into_iter()
            .map(|(id, priority)| self.submit_request(id, priority))
            .count()
    }
}

struct RunningProvider {
    name: String,
    state: watch::Receiver<ProviderState>,
    handle: JoinHandle<ProviderReport>,
}

/// Wires one shared queue to a set of providers. Dropping it without calling
/// `shutdown` still stops every provider, it just doesn't wait for them.
pub struct Dispatcher {
    submitter: Submitter,
    shutdown: Shutdown,
    providers: Vec<RunningProvider>,
}

impl Dispatcher {
    /// Every provider is validated before any of them is spawned. Must be
    /// called from within a Tokio runtime.
    pub fn start(configs: &[ProviderConfig]) -> Result<(Self, EventStream), ConfigurationError> {
        if configs.is_empty() {
            return Err(ConfigurationError::NoProviders);
        }
        let queue = Arc::new(OrderedQueue::new());
        let providers = configs
            .iter()
            .map(|config| {
                Provider::new(
                    config.name.clone(),
                    config.rate_per_second,
                    Arc::clone(&queue),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outstanding = Arc::new(Outstanding::default());
        let (sink, events) = EventSink::new(Arc::clone(&outstanding));
        let (shutdown, signal) = Shutdown::new();

        let providers = providers
            .into_iter()
            .map(|provider| RunningProvider {
                name: provider.name().to_owned(),
                state: provider.watch_state(),
                handle: tokio::spawn(provider.run(sink.clone(), signal.clone())),
            })
            .collect::<Vec<_>>();
        info!("Started {} providers", providers.len());

        let dispatcher = Self {
            submitter: Submitter { queue, outstanding },
            shutdown,
            providers,
        };
        Ok((dispatcher, events))
    }

    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    pub fn submit_request(&self, id: RequestId, priority: Priority) {
        self.submitter.submit_request(id, priority)
    }

    pub fn submit_all<I>(&self, requests: I) -> usize
    where
        I: IntoIterator<Item = (RequestId, Priority)>,
    {
        self.submitter.submit_all(requests)
    }

    pub fn queue(&self) -> &Arc<OrderedQueue> {
        &self.submitter.queue
    }

    /// Submitted minus processed
    pub fn outstanding(&self) -> usize {
        self.submitter.outstanding.count()
    }

    pub fn provider_states(&self) -> Vec<(String, ProviderState)> {
        self.providers
            .iter()
            .map(|p| (p.name.clone(), *p.state.borrow()))
            .collect()
    }

    /// Waits for everything submitted so far to be processed, up to `timeout`
    pub async fn drain(&self, timeout: Duration) -> Result<(), DispatchError> {
        let outstanding = &self.submitter.outstanding;
        tokio::time::timeout(timeout, outstanding.drained())
            .await
            .map_err(|_| DispatchError::DrainTimeout {
                outstanding: outstanding.count(),
            })
    }

    /// Stops every provider and waits for their loops to exit
    pub async fn shutdown(self) -> Result<Vec<ProviderReport>, DispatchError> {
        info!("Shutting down {} providers", self.providers.len());
        self.shutdown.trigger();
        let (names, handles): (Vec<_>, Vec<_>) = self
            .providers
            .into_iter()
            .map(|p| (p.name, p.handle))
            .unzip();
        let mut reports = vec![];
        let mut crashed = None;
        for (name, result) in names.into_iter().zip(join_all(handles).await) {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!("Provider {} did not exit cleanly: {:?}", name, err);
                    crashed.get_or_insert(name);
                }
            }
        }
        match crashed {
            Some(name) => Err(DispatchError::ProviderCrashed { name }),
            None => Ok(reports),
        }
    }
}
