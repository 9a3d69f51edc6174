//! The mutable state every subsystem works on: the zones of the run
//! and the pre-step time history used by the integral check.

use crate::{
    time_history::TimeHistory,
    zone::{Zone, ZoneSpec},
};
use serde::{Deserialize, Serialize};

/// An S/I/R triple.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Compartments {
    pub s: f64,
    pub i: f64,
    pub r: f64,
}

impl Compartments {
    pub fn total(&self) -> f64 {
        self.s + self.i + self.r
    }
}

pub struct SimWorld {
    pub zones: Vec<Zone>,
    pub time_history: TimeHistory,
}

impl SimWorld {
    pub fn new(specs: Vec<ZoneSpec>) -> Self {
        Self {
            zones: specs.into_iter().map(Zone::new).collect(),
            time_history: TimeHistory::new(),
        }
    }

    /// Every zone back to dormant, history cleared.
    pub fn reset(&mut self) {
        for zone in &mut self.zones {
            zone.reset();
        }
        self.time_history.clear();
    }

    /// Sums over every zone, dormant ones included.
    pub fn totals(&self) -> Compartments {
        self.zones.iter().fold(Compartments::default(), |acc, z| Compartments {
            s: acc.s + z.s,
            i: acc.i + z.i,
            r: acc.r + z.r,
        })
    }

    /// Sums over active zones only.
    pub fn active_totals(&self) -> Compartments {
        self.zones
            .iter()
            .filter(|z| z.active)
            .fold(Compartments::default(), |acc, z| Compartments {
                s: acc.s + z.s,
                i: acc.i + z.i,
                r: acc.r + z.r,
            })
    }

    /// Σ N over active zones.
    pub fn active_population(&self) -> f64 {
        self.zones.iter().filter(|z| z.active).map(Zone::n).sum()
    }

    /// Σ I0 over active zones.
    pub fn active_initial_infected(&self) -> f64 {
        self.zones.iter().filter(|z| z.active).map(Zone::i0).sum()
    }

    pub fn population_total(&self) -> u64 {
        self.zones.iter().map(|z| z.spec.population).sum()
    }

    pub fn specs(&self) -> Vec<ZoneSpec> {
        self.zones.iter().map(|z| z.spec.clone()).collect()
    }
}
