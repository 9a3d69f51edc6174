//! Activation scheduler — flips dormant zones to active once simulated
//! time reaches their start day.
//!
//! Runs FIRST every tick so a zone activating exactly on the tick
//! boundary is integrated that same tick with fully seeded state.

use crate::{
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    world::SimWorld,
    zone::Zone,
};

#[derive(Debug, Default)]
pub struct ActivationScheduler;

impl ActivationScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Activate `zone` if it is dormant and `day >= day_start`.
    /// Idempotent: returns false for zones already active or not yet due.
    pub fn try_activate(zone: &mut Zone, day: f64) -> bool {
        !zone.active && day >= zone.spec.day_start && zone.activate()
    }
}

impl SimSubsystem for ActivationScheduler {
    fn name(&self) -> &'static str { "activation" }

    fn update(
        &mut self,
        ctx: &SimContext,
        world: &mut SimWorld,
        _events_in: &[SimEvent],
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        for zone in &mut world.zones {
            if Self::try_activate(zone, ctx.day) {
                log::info!(
                    "Day {}: activated zone {} with {} initial infected",
                    ctx.day,
                    zone.name(),
                    zone.spec.initial_infected
                );
                events.push(SimEvent::ZoneActivated {
                    tick: ctx.tick,
                    day: ctx.day,
                    zone: zone.spec.name.clone(),
                    initial_infected: zone.spec.initial_infected,
                });
            }
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
