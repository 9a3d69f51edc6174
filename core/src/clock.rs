//! Simulation clock — owns simulated time, the driver state machine,
//! and the host pacing hint.

use crate::types::{Day, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    /// Number of integrated ticks since the last reset.
    pub tick: Tick,
    pub current_day: Day,
    pub horizon_days: Day,
    pub state: DriverState,
    pub steps_per_second: u32,
}

impl SimClock {
    pub fn new(horizon_days: Day, steps_per_second: u32) -> Self {
        Self {
            tick: 0,
            current_day: 0.0,
            horizon_days,
            state: DriverState::Idle,
            steps_per_second: steps_per_second.max(1),
        }
    }

    /// Advance simulated time by `dt`.
    ///
    /// Returns the new (tick, day), or None once the day passes the
    /// horizon; the clock is then Completed and the tick counter is
    /// left at the last integrated tick. The day is derived from the
    /// tick count, so it never accumulates rounding drift.
    pub fn advance(&mut self, dt: f64) -> Option<(Tick, Day)> {
        self.current_day = (self.tick + 1) as f64 * dt;
        if self.current_day > self.horizon_days {
            self.state = DriverState::Completed;
            return None;
        }
        self.tick += 1;
        Some((self.tick, self.current_day))
    }

    /// Zero time and drop back to Idle. Pacing is kept.
    pub fn reset(&mut self) {
        self.tick = 0;
        self.current_day = 0.0;
        self.state = DriverState::Idle;
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn set_speed(&mut self, steps_per_second: u32) {
        self.steps_per_second = steps_per_second.max(1);
    }

    /// Wall-clock milliseconds between ticks for a paced host.
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / u64::from(self.steps_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_stops_past_horizon() {
        let mut clock = SimClock::new(1.0, 5);
        clock.state = DriverState::Running;
        assert_eq!(clock.advance(0.5), Some((1, 0.5)));
        assert_eq!(clock.advance(0.5), Some((2, 1.0)));
        assert_eq!(clock.advance(0.5), None);
        assert_eq!(clock.state, DriverState::Completed);
        assert_eq!(clock.tick, 2);
    }

    #[test]
    fn small_steps_land_on_whole_days() {
        let mut clock = SimClock::new(120.0, 5);
        clock.state = DriverState::Running;
        let mut last = None;
        while let Some((tick, day)) = clock.advance(0.1) {
            if tick == 30 {
                assert_eq!(day, 3.0);
            }
            last = Some((tick, day));
        }
        assert_eq!(last, Some((1_200, 120.0)));
        assert_eq!(clock.state, DriverState::Completed);
    }

    #[test]
    fn speed_maps_to_interval() {
        let mut clock = SimClock::new(120.0, 5);
        assert_eq!(clock.tick_interval_ms(), 200);
        clock.set_speed(0);
        assert_eq!(clock.tick_interval_ms(), 1000);
        clock.set_speed(20);
        assert_eq!(clock.tick_interval_ms(), 50);
    }
}
