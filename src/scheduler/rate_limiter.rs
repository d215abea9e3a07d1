use governor::{
    clock::{Clock, QuantaClock, ReasonablyRealtime, Reference},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota,
};
use nonzero_ext::nonzero;
use parking_lot::Mutex;
use std::time::Duration;
use thiserror::Error;

use super::shutdown::{Cancelled, ShutdownSignal};

/// A single-owner limiter, nothing is keyed since every provider gets its own
pub type UnscopedLimiter<C = QuantaClock> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// governor keeps instants as u64 nanoseconds and adds the interval to them
/// unchecked, so intervals past half of that range are refused up front
const MAX_INTERVAL: Duration = Duration::from_nanos(u64::MAX / 2);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("rate must be a positive number of requests per second, got {0}")]
    NonPositiveRate(f64),
    #[error("rate of {0} requests per second can't be turned into a dispatch interval")]
    UnrepresentableRate(f64),
    #[error("at least one provider is required")]
    NoProviders,
    #[error("provider {name} is misconfigured: {source}")]
    Provider {
        name: String,
        #[source]
        source: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    pub fn for_provider(self, name: &str) -> Self {
        ConfigurationError::Provider {
            name: name.to_owned(),
            source: Box::new(self),
        }
    }
}

/// Paces one provider so that consecutive slots are at least `1 / rate`
/// seconds apart. The very first slot is granted immediately.
///
/// governor alone lets a cell through early after an idle stretch (its
/// tolerance is a whole interval), so the last granted instant is kept here
/// as well and nothing is handed out before `min_interval` has passed since.
pub struct RateLimiter<C: Clock = QuantaClock> {
    limiter: UnscopedLimiter<C>,
    clock: C,
    last_slot: Mutex<Option<C::Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn per_second(rate: f64) -> Result<Self, ConfigurationError> {
        Self::per_second_with_clock(rate, &QuantaClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn per_second_with_clock(rate: f64, clock: &C) -> Result<Self, ConfigurationError> {
        // also catches NaN
        if !(rate > 0f64) {
            return Err(ConfigurationError::NonPositiveRate(rate));
        }
        let min_interval = Duration::try_from_secs_f64(1f64 / rate)
            .ok()
            .filter(|interval| *interval <= MAX_INTERVAL)
            .ok_or(ConfigurationError::UnrepresentableRate(rate))?;
        // with_period refuses a zero interval, which is what an infinite rate rounds to
        let quota = Quota::with_period(min_interval)
            .ok_or(ConfigurationError::UnrepresentableRate(rate))?
            .allow_burst(nonzero!(1u32));
        Ok(Self {
            limiter: governor::RateLimiter::direct_with_clock(quota, clock),
            clock: clock.clone(),
            last_slot: Mutex::new(None),
            min_interval,
        })
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Takes a slot only if one is available right now
    pub fn try_acquire(&self) -> bool {
        let mut last_slot = self.last_slot.lock();
        let now = self.clock.now();
        if !self.spacing_left(*last_slot, now).is_zero() || self.limiter.check().is_err() {
            return false;
        }
        *last_slot = Some(now);
        true
    }

    /// Time still to wait before `now` is far enough from the last slot
    fn spacing_left(&self, last_slot: Option<C::Instant>, now: C::Instant) -> Duration {
        match last_slot {
            Some(last) => self
                .min_interval
                .saturating_sub(now.duration_since(last).into()),
            None => Duration::ZERO,
        }
    }
}

impl<C: ReasonablyRealtime> RateLimiter<C> {
    /// Waits for the next slot. A cancelled wait does not use up a slot.
    pub async fn wait_for_slot(&self, shutdown: &ShutdownSignal) -> Result<(), Cancelled> {
        if shutdown.is_triggered() {
            return Err(Cancelled);
        }
        // tokio's timer and governor's clock drift apart slightly, so re-check
        // after every sleep instead of trusting a single one
        loop {
            let left = self.spacing_left(*self.last_slot.lock(), self.clock.now());
            if left.is_zero() {
                break;
            }
            tokio::select! {
                biased;
                _ = shutdown.triggered() => return Err(Cancelled),
                _ = tokio::time::sleep(left) => {}
            }
        }
        tokio::select! {
            biased;
            _ = shutdown.triggered() => return Err(Cancelled),
            _ = self.limiter.until_ready() => {}
        }
        *self.last_slot.lock() = Some(self.clock.now());
        Ok(())
    }
}
