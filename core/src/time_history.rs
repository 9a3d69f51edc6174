//! Pre-step aggregate history used by the integral cross-check.
//!
//! One sample per tick, recorded AFTER activation and BEFORE
//! integration. Append-only; cleared only on reset. At dt = 0.5 over
//! a 120-day horizon this is 240 samples, so it is kept unbounded.

use crate::{
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    types::Day,
    world::SimWorld,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeHistorySample {
    pub t: Day,
    pub s_total_active: f64,
    pub i_total_active: f64,
    pub i_initial_active: f64,
    pub n_active: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TimeHistory {
    samples: Vec<TimeHistorySample>,
}

impl TimeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: TimeHistorySample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[TimeHistorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Snapshots active-zone aggregates into the time history.
#[derive(Debug, Default)]
pub struct HistoryRecorder;

impl HistoryRecorder {
    pub fn new() -> Self {
        Self
    }

    pub fn sample(world: &SimWorld, t: Day) -> TimeHistorySample {
        let active = world.active_totals();
        TimeHistorySample {
            t,
            s_total_active: active.s,
            i_total_active: active.i,
            i_initial_active: world.active_initial_infected(),
            n_active: world.active_population(),
        }
    }
}

impl SimSubsystem for HistoryRecorder {
    fn name(&self) -> &'static str { "history_recorder" }

    fn update(
        &mut self,
        ctx: &SimContext,
        world: &mut SimWorld,
        _events_in: &[SimEvent],
    ) -> SimResult<Vec<SimEvent>> {
        let sample = Self::sample(world, ctx.day);
        world.time_history.push(sample);
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneSpec;

    #[test]
    fn sample_counts_only_active_zones() {
        let mut world = SimWorld::new(ZoneSpec::santa_cruz_preset());
        world.zones[0].activate(); // Centro: N=450000, I0=500

        let sample = HistoryRecorder::sample(&world, 0.5);
        assert_eq!(sample.t, 0.5);
        assert_eq!(sample.s_total_active, 449_500.0);
        assert_eq!(sample.i_total_active, 500.0);
        assert_eq!(sample.i_initial_active, 500.0);
        assert_eq!(sample.n_active, 450_000.0);
    }

    #[test]
    fn empty_world_samples_zero_population() {
        let world = SimWorld::new(ZoneSpec::santa_cruz_preset());
        let sample = HistoryRecorder::sample(&world, 0.5);
        assert_eq!(sample.n_active, 0.0);
        assert_eq!(sample.i_total_active, 0.0);
    }
}
