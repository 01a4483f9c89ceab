//! Cycle clock: maps timestamps to accounting cycles.
//!
//! `cycle(now) = (now - initial_time) / cycle_duration`. Cycles are indexed
//! from zero and the pool only accepts activity up to and including
//! `max_cycle`.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

/// Immutable `(initial_time, cycle_duration, max_cycle)` horizon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleClock {
    initial_time: u64,
    cycle_duration: u64,
    max_cycle: u64,
}

impl CycleClock {
    /// Create a clock. `cycle_duration` and `max_cycle` must be positive.
    pub fn new(initial_time: u64, cycle_duration: u64, max_cycle: u64) -> Result<Self, ConfigError> {
        if cycle_duration == 0 {
            return Err(ConfigError::ZeroCycleDuration);
        }
        if max_cycle == 0 {
            return Err(ConfigError::ZeroMaxCycle);
        }
        Ok(Self {
            initial_time,
            cycle_duration,
            max_cycle,
        })
    }

    pub fn initial_time(&self) -> u64 {
        self.initial_time
    }

    pub fn cycle_duration(&self) -> u64 {
        self.cycle_duration
    }

    pub fn max_cycle(&self) -> u64 {
        self.max_cycle
    }

    /// The cycle containing `now`, without the horizon check.
    ///
    /// Timestamps before `initial_time` have no cycle.
    pub fn cycle_at(&self, now: u64) -> Result<u64, ValidationError> {
        let elapsed = now
            .checked_sub(self.initial_time)
            .ok_or(ValidationError::BeforeStart {
                now,
                initial_time: self.initial_time,
            })?;
        Ok(elapsed / self.cycle_duration)
    }

    /// The cycle containing `now`, rejected with `InvalidCycle` past `max_cycle`.
    pub fn active_cycle(&self, now: u64) -> Result<u64, ValidationError> {
        let cycle = self.cycle_at(now)?;
        if cycle > self.max_cycle {
            return Err(ValidationError::InvalidCycle {
                cycle,
                max_cycle: self.max_cycle,
            });
        }
        Ok(cycle)
    }

    /// Half-open `[start, end)` timestamp window of `cycle`. Saturates at `u64::MAX`.
    pub fn cycle_window(&self, cycle: u64) -> (u64, u64) {
        let start = cycle
            .saturating_mul(self.cycle_duration)
            .saturating_add(self.initial_time);
        (start, start.saturating_add(self.cycle_duration))
    }
}
