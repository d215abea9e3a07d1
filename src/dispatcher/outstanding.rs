use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;
use tokio::sync::Notify;

/// Count of requests that were submitted but not processed yet
#[derive(Debug, Default)]
pub struct Outstanding {
    count: AtomicUsize,
    drained: Notify,
}

impl Outstanding {
    pub fn add(&self, amount: usize) {
        self.count.fetch_add(amount, Ordering::AcqRel);
    }

    pub fn complete(&self) {
        match self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => self.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => warn!("A request was completed that was never submitted"),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Resolves the next time nothing is outstanding
    pub async fn drained(&self) {
        loop {
            // created before the check so a completion in between isn't missed
            let notified = self.drained.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}
