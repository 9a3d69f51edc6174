//! What the engine hands to the presentation layer: one TickReport per
//! emission and a RunSummary when the horizon is reached.

use crate::{
    config::EpidemicParams,
    history::PeakTracker,
    integral_validator::{Agreement, IntegralComparison},
    types::{Day, Tick, ZoneName},
    world::{Compartments, SimWorld},
    zone::Zone,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneReport {
    pub name: ZoneName,
    pub s: f64,
    pub i: f64,
    pub r: f64,
    pub active: bool,
    pub prevalence: f64,
}

impl From<&Zone> for ZoneReport {
    fn from(z: &Zone) -> Self {
        Self {
            name: z.spec.name.clone(),
            s: z.s,
            i: z.i,
            r: z.r,
            active: z.active,
            prevalence: z.prevalence(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Growing,
    Declining,
    Flat,
}

/// Instantaneous SIR rates over the active aggregate, people/day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Derivatives {
    pub ds_dt: f64,
    pub di_dt: f64,
    pub dr_dt: f64,
}

impl Derivatives {
    pub fn of(active: &Compartments, n_active: f64, params: &EpidemicParams) -> Self {
        if n_active <= 0.0 {
            return Self::default();
        }
        let infection = params.beta * active.s * active.i / n_active;
        let recovery = params.gamma * active.i;
        Self {
            ds_dt: -infection,
            di_dt: infection - recovery,
            dr_dt: recovery,
        }
    }

    pub fn trend(&self) -> Trend {
        if self.di_dt > 0.0 {
            Trend::Growing
        } else if self.di_dt < 0.0 {
            Trend::Declining
        } else {
            Trend::Flat
        }
    }
}

/// Per-emission output. Tick 0 is the state right after a reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickReport {
    pub tick: Tick,
    pub day: Day,
    pub zones: Vec<ZoneReport>,
    pub totals: Compartments,
    pub integral_estimate: f64,
    pub relative_error_pct: f64,
    pub agreement: Agreement,
    pub peak_infected: f64,
    pub peak_day: Day,
    pub peak_tick: Tick,
    pub r0: f64,
    pub derivatives: Derivatives,
    pub trend: Trend,
}

impl TickReport {
    pub(crate) fn build(
        tick: Tick,
        day: Day,
        world: &SimWorld,
        params: &EpidemicParams,
        comparison: &IntegralComparison,
        peak: &PeakTracker,
    ) -> Self {
        let derivatives = Derivatives::of(&world.active_totals(), world.active_population(), params);
        Self {
            tick,
            day,
            zones: world.zones.iter().map(ZoneReport::from).collect(),
            totals: world.totals(),
            integral_estimate: comparison.integral_estimate,
            relative_error_pct: comparison.relative_error_pct,
            agreement: comparison.agreement(),
            peak_infected: peak.infected,
            peak_day: peak.day,
            peak_tick: peak.tick,
            r0: params.r0(),
            derivatives,
            trend: derivatives.trend(),
        }
    }

    pub fn zone(&self, name: &str) -> Option<&ZoneReport> {
        self.zones.iter().find(|z| z.name == name)
    }
}

/// Final statistics, emitted when the clock passes the horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub ticks: Tick,
    pub final_day: Day,
    pub population: u64,
    pub totals: Compartments,
    pub susceptible_pct: f64,
    pub infected_pct: f64,
    pub recovered_pct: f64,
    pub peak_infected: f64,
    pub peak_day: Day,
}

impl RunSummary {
    pub(crate) fn build(
        ticks: Tick,
        final_day: Day,
        world: &SimWorld,
        peak: &PeakTracker,
    ) -> Self {
        let totals = world.totals();
        let population = world.population_total();
        let pct = |x: f64| {
            if population == 0 {
                0.0
            } else {
                100.0 * x / population as f64
            }
        };
        Self {
            ticks,
            final_day,
            population,
            totals,
            susceptible_pct: pct(totals.s),
            infected_pct: pct(totals.i),
            recovered_pct: pct(totals.r),
            peak_infected: peak.infected,
            peak_day: peak.day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivatives_follow_sir_rates() {
        let params = EpidemicParams::default();
        let active = Compartments { s: 900.0, i: 100.0, r: 0.0 };
        let d = Derivatives::of(&active, 1_000.0, &params);
        assert!((d.ds_dt + 27.0).abs() < 1e-12);
        assert!((d.di_dt - 13.0).abs() < 1e-12);
        assert!((d.dr_dt - 14.0).abs() < 1e-12);
        assert_eq!(d.trend(), Trend::Growing);
    }

    #[test]
    fn no_active_population_means_flat() {
        let d = Derivatives::of(&Compartments::default(), 0.0, &EpidemicParams::default());
        assert_eq!(d, Derivatives::default());
        assert_eq!(d.trend(), Trend::Flat);
    }
}
