//! Subsystem trait and the per-tick context.
//!
//! RULE: Every per-tick step implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, every tick.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    config::EpidemicParams,
    error::SimResult,
    event::SimEvent,
    types::{Day, Tick},
    world::SimWorld,
};
use std::any::Any;

/// Everything a subsystem may read about the current tick.
/// Built fresh by the engine each tick; parameters changed mid-run
/// show up in the next context, never retroactively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimContext {
    pub tick: Tick,
    pub day: Day,
    pub beta: f64,
    pub gamma: f64,
    pub dt: f64,
    pub conservation_tolerance: f64,
}

impl SimContext {
    pub fn new(tick: Tick, day: Day, params: &EpidemicParams, conservation_tolerance: f64) -> Self {
        Self {
            tick,
            day,
            beta: params.beta,
            gamma: params.gamma,
            dt: params.dt,
            conservation_tolerance,
        }
    }
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    ///
    /// - `ctx`:       the current tick, day and parameters
    /// - `world`:     zones and time history
    /// - `events_in`: events emitted by earlier subsystems this tick
    ///
    /// Returns a vec of new events to add to the tick's event log.
    fn update(
        &mut self,
        ctx: &SimContext,
        world: &mut SimWorld,
        events_in: &[SimEvent],
    ) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in tests and tooling only.
    /// Production sim code never uses this.
    fn as_any(&self) -> &dyn Any;
}
