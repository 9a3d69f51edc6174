//! Zones — the geographic compartments the epidemic spreads across.
//!
//! A `ZoneSpec` is the immutable definition (who, where, how many, when).
//! A `Zone` is a spec plus live S/I/R state. Zones are created dormant and
//! are never destroyed during a run; reset puts them back to dormant.

use crate::types::{Day, ZoneName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneSpec {
    pub name: ZoneName,
    pub position: GeoPoint,
    /// N, total population, fixed for the run.
    pub population: u64,
    /// I0, infected count seeded at activation.
    pub initial_infected: u64,
    /// Simulated day at which the zone activates.
    pub day_start: Day,
}

impl ZoneSpec {
    pub fn new(
        name: impl Into<ZoneName>,
        position: GeoPoint,
        population: u64,
        initial_infected: u64,
        day_start: Day,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            population,
            initial_infected,
            day_start,
        }
    }

    /// The fixed six-district Santa Cruz scenario. Populations sum to
    /// the metropolitan total used by the generator.
    pub fn santa_cruz_preset() -> Vec<ZoneSpec> {
        let at = |lat, lng| GeoPoint { lat, lng };
        vec![
            Self::new("Centro", at(-17.7863, -63.1786), 450_000, 500, 0.0),
            Self::new("Plan 3000", at(-17.8200, -63.1300), 680_000, 300, 3.0),
            Self::new("Barrio Equipetrol", at(-17.7650, -63.1650), 320_000, 250, 5.0),
            Self::new("Pampa de la Isla", at(-17.8050, -63.1900), 580_000, 200, 7.0),
            Self::new("Las Palmas", at(-17.7400, -63.1500), 410_000, 150, 9.0),
            Self::new("Villa 1ro de Mayo", at(-17.7950, -63.1450), 682_605, 180, 11.0),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub spec: ZoneSpec,
    pub active: bool,
    pub s: f64,
    pub i: f64,
    pub r: f64,
}

impl Zone {
    /// A dormant zone: S = N - I0, I = 0, R = 0.
    pub fn new(spec: ZoneSpec) -> Self {
        let mut zone = Self {
            spec,
            active: false,
            s: 0.0,
            i: 0.0,
            r: 0.0,
        };
        zone.reset();
        zone
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// N as a float, for the rate equations.
    pub fn n(&self) -> f64 {
        self.spec.population as f64
    }

    pub fn i0(&self) -> f64 {
        self.spec.initial_infected as f64
    }

    /// Back to the pre-activation state.
    pub fn reset(&mut self) {
        self.active = false;
        self.s = self.n() - self.i0();
        self.i = 0.0;
        self.r = 0.0;
    }

    /// Seed the infection. Returns false if the zone was already active.
    pub fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.i = self.i0();
        self.s = self.n() - self.i0();
        self.r = 0.0;
        true
    }

    pub fn total(&self) -> f64 {
        self.s + self.i + self.r
    }

    /// |S + I + R - N|
    pub fn conservation_error(&self) -> f64 {
        (self.total() - self.n()).abs()
    }

    /// I / N
    pub fn prevalence(&self) -> f64 {
        if self.spec.population == 0 {
            0.0
        } else {
            self.i / self.n()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centro() -> Zone {
        Zone::new(ZoneSpec::santa_cruz_preset().remove(0))
    }

    #[test]
    fn new_zone_is_dormant() {
        let z = centro();
        assert!(!z.active);
        assert_eq!(z.s, 449_500.0);
        assert_eq!(z.i, 0.0);
        assert_eq!(z.r, 0.0);
    }

    #[test]
    fn activation_happens_once() {
        let mut z = centro();
        assert!(z.activate());
        assert_eq!(z.i, 500.0);
        z.i = 1234.0;
        assert!(!z.activate(), "second activation must be a no-op");
        assert_eq!(z.i, 1234.0);
    }

    #[test]
    fn reset_restores_dormant_state() {
        let mut z = centro();
        z.activate();
        z.s = 1.0;
        z.r = 7.0;
        z.reset();
        assert_eq!(z, centro());
    }

    #[test]
    fn preset_population_matches_metropolitan_total() {
        let total: u64 = ZoneSpec::santa_cruz_preset().iter().map(|z| z.population).sum();
        assert_eq!(total, 3_122_605);
    }
}
