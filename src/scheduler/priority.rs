use std::convert::TryFrom;
use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} is not a valid priority (expected {}..={})", MIN_LEVEL, MAX_LEVEL)]
pub struct InvalidPriority(pub u8);

/// Urgency of a request. Higher levels are dispatched first.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize)]
pub struct Priority(u8);

const MIN_LEVEL: u8 = 1;
const MAX_LEVEL: u8 = 3;

impl Priority {
    pub const LOW: Priority = Priority(MIN_LEVEL);
    pub const NORMAL: Priority = Priority(2);
    pub const URGENT: Priority = Priority(MAX_LEVEL);
    /// Every valid priority, least urgent first
    pub const ALL: [Priority; 3] = [Priority::LOW, Priority::NORMAL, Priority::URGENT];

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;
    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if level < MIN_LEVEL || level > MAX_LEVEL {
            return Err(InvalidPriority(level));
        };
        Ok(Self(level))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::{InvalidPriority, Priority};

    #[test]
    fn accepts_levels_in_range() {
        let levels = Priority::ALL.iter().map(|p| p.level()).collect::<Vec<_>>();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(Priority::try_from(3), Ok(Priority::URGENT));
    }

    #[test]
    fn rejects_levels_out_of_range() {
        assert_eq!(Priority::try_from(0), Err(InvalidPriority(0)));
        assert_eq!(Priority::try_from(4), Err(InvalidPriority(4)));
    }

    #[test]
    fn urgent_outranks_low() {
        assert!(Priority::URGENT > Priority::NORMAL);
        assert!(Priority::NORMAL > Priority::LOW);
    }
}
