use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::request::RequestId;
use crate::scheduler::Priority;

/// Sequential ids starting at 1 with a uniformly random priority each.
/// Anything else yielding `(RequestId, Priority)` can be submitted instead.
pub struct RandomRequests {
    next_id: u64,
    remaining: u64,
    rng: StdRng,
}

impl RandomRequests {
    pub fn new(count: u64) -> Self {
        Self::with_rng(count, StdRng::from_entropy())
    }

    /// Same seed, same priorities
    pub fn seeded(count: u64, seed: u64) -> Self {
        Self::with_rng(count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(count: u64, rng: StdRng) -> Self {
        Self {
            next_id: 1,
            remaining: count,
            rng,
        }
    }
}

impl Iterator for RandomRequests {
    type Item = (RequestId, Priority);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let id = RequestId(self.next_id);
        self.next_id += 1;
        let priority = Priority::ALL[self.rng.gen_range(0..Priority::ALL.len())];
        Some((id, priority))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::RandomRequests;
    use crate::request::RequestId;

    #[test]
    fn ids_are_sequential_from_one() {
        let ids = RandomRequests::new(4).map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(ids, (1..=4).map(RequestId).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_generators_agree() {
        let first = RandomRequests::seeded(50, 7).collect::<Vec<_>>();
        let second = RandomRequests::seeded(50, 7).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn covers_every_priority_eventually() {
        let mut levels = RandomRequests::seeded(300, 1)
            .map(|(_, p)| p.level())
            .collect::<Vec<_>>();
        levels.sort_unstable();
        levels.dedup();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn priorities_are_roughly_uniform() {
        let mut counts = [0u32; 3];
        for (_, priority) in RandomRequests::seeded(3000, 11) {
            counts[priority.level() as usize - 1] += 1;
        }
        assert!(counts.iter().all(|&n| n > 800 && n < 1200), "{:?}", counts);
    }
}
