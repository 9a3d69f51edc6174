//! Explicit Euler integrator for the per-zone SIR equations:
//!
//!   dS/dt = -β·S·I/N
//!   dI/dt =  β·S·I/N - γ·I
//!   dR/dt =  γ·I
//!
//! Every compartment is hard-clamped to [0, N] after the step. Clamping
//! is not followed by renormalization, so S + I + R may drift from N
//! under large steps; drift beyond the configured tolerance is reported
//! as a ConservationViolated event, never as an error.

use crate::{
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    world::SimWorld,
    zone::Zone,
};

/// Flows computed for one zone in one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepFlows {
    pub new_infections: f64,
    pub new_recoveries: f64,
}

#[derive(Debug, Default)]
pub struct SirIntegrator;

impl SirIntegrator {
    pub fn new() -> Self {
        Self
    }

    /// Advance one active zone by `dt`. Dormant and empty zones are
    /// untouched and return None.
    pub fn euler_step(zone: &mut Zone, beta: f64, gamma: f64, dt: f64) -> Option<StepFlows> {
        let n = zone.n();
        if !zone.active || n <= 0.0 {
            return None;
        }
        let (s, i, r) = (zone.s, zone.i, zone.r);

        let new_infections = (beta * s * i / n) * dt;
        let new_recoveries = (gamma * i) * dt;

        zone.s = (s - new_infections).clamp(0.0, n);
        zone.i = (i + new_infections - new_recoveries).clamp(0.0, n);
        zone.r = (r + new_recoveries).clamp(0.0, n);

        Some(StepFlows { new_infections, new_recoveries })
    }
}

impl SimSubsystem for SirIntegrator {
    fn name(&self) -> &'static str { "sir_integrator" }

    fn update(
        &mut self,
        ctx: &SimContext,
        world: &mut SimWorld,
        _events_in: &[SimEvent],
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        for zone in &mut world.zones {
            let Some(flows) = Self::euler_step(zone, ctx.beta, ctx.gamma, ctx.dt) else {
                continue;
            };

            log::debug!(
                "tick={} day={} zone={}: +inf={:.2} +rec={:.2} S={:.1} I={:.1} R={:.1}",
                ctx.tick,
                ctx.day,
                zone.name(),
                flows.new_infections,
                flows.new_recoveries,
                zone.s,
                zone.i,
                zone.r
            );

            if zone.conservation_error() > ctx.conservation_tolerance {
                log::warn!(
                    "Zone {}: conservation violated. Total={:.0}, N={}",
                    zone.name(),
                    zone.total(),
                    zone.spec.population
                );
                events.push(SimEvent::ConservationViolated {
                    tick: ctx.tick,
                    day: ctx.day,
                    zone: zone.spec.name.clone(),
                    total: zone.total(),
                    population: zone.spec.population,
                });
            }
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{GeoPoint, ZoneSpec};

    fn active_zone(n: u64, i0: u64) -> Zone {
        let mut z = Zone::new(ZoneSpec::new("Z", GeoPoint { lat: 0.0, lng: 0.0 }, n, i0, 0.0));
        z.activate();
        z
    }

    #[test]
    fn dormant_zone_is_skipped() {
        let mut z = Zone::new(ZoneSpec::new("Z", GeoPoint { lat: 0.0, lng: 0.0 }, 1_000, 10, 5.0));
        let before = z.clone();
        assert!(SirIntegrator::euler_step(&mut z, 0.3, 0.14, 0.5).is_none());
        assert_eq!(z, before);
    }

    #[test]
    fn empty_zone_never_turns_nan() {
        let mut z = Zone::new(ZoneSpec::new("Empty", GeoPoint { lat: 0.0, lng: 0.0 }, 0, 0, 0.0));
        z.active = true;
        assert!(SirIntegrator::euler_step(&mut z, 0.3, 0.14, 0.5).is_none());
        assert_eq!((z.s, z.i, z.r), (0.0, 0.0, 0.0));
    }

    #[test]
    fn one_step_matches_hand_arithmetic() {
        let mut z = active_zone(1_000, 100);
        let flows = SirIntegrator::euler_step(&mut z, 0.5, 0.2, 1.0).unwrap();
        // 0.5 * 900 * 100 / 1000 = 45 ; 0.2 * 100 = 20
        assert!((flows.new_infections - 45.0).abs() < 1e-12);
        assert!((flows.new_recoveries - 20.0).abs() < 1e-12);
        assert!((z.s - 855.0).abs() < 1e-12);
        assert!((z.i - 125.0).abs() < 1e-12);
        assert!((z.r - 20.0).abs() < 1e-12);
    }

    #[test]
    fn oversized_step_is_clamped() {
        // beta*dt large enough that S would go negative.
        let mut z = active_zone(1_000, 500);
        SirIntegrator::euler_step(&mut z, 10.0, 5.0, 1.0);
        assert_eq!(z.s, 0.0);
        assert!(z.i >= 0.0 && z.i <= 1_000.0);
        assert!(z.r >= 0.0 && z.r <= 1_000.0);
    }

    #[test]
    fn conservation_drift_is_reported_not_fatal() {
        let mut world = SimWorld::new(vec![ZoneSpec::new(
            "Drift",
            GeoPoint { lat: 0.0, lng: 0.0 },
            1_000,
            500,
            0.0,
        )]);
        world.zones[0].activate();
        let ctx = SimContext {
            tick: 1,
            day: 1.0,
            beta: 10.0,
            gamma: 5.0,
            dt: 1.0,
            conservation_tolerance: 10.0,
        };
        let events = SirIntegrator::new().update(&ctx, &mut world, &[]).unwrap();
        assert!(
            matches!(events.as_slice(), [SimEvent::ConservationViolated { zone, .. }] if zone == "Drift"),
            "expected one violation, got {events:?}"
        );
    }
}
