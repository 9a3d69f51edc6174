use crate::{
    error::{SimError, SimResult},
    types::Day,
    zone::ZoneSpec,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Global epidemiological parameters. `beta` and `gamma` may change
/// mid-run through the engine; `dt` is fixed for the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EpidemicParams {
    /// Transmission rate.
    pub beta: f64,
    /// Recovery rate (1/gamma = mean infectious period in days).
    pub gamma: f64,
    /// Euler step in days.
    pub dt: f64,
}

impl Default for EpidemicParams {
    fn default() -> Self {
        Self {
            beta: 0.3,
            gamma: 0.14,
            dt: 0.5,
        }
    }
}

impl EpidemicParams {
    /// Basic reproduction number, always derived, never stored.
    pub fn r0(&self) -> f64 {
        self.beta / self.gamma
    }

    pub fn infectious_period_days(&self) -> f64 {
        1.0 / self.gamma
    }

    pub fn validate(&self) -> SimResult<()> {
        check_positive("params.beta", self.beta)?;
        check_positive("params.gamma", self.gamma)?;
        check_positive("params.dt", self.dt)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Santa Cruz de la Sierra metropolitan area.
    pub fn santa_cruz() -> Self {
        Self {
            min_lat: -17.85,
            max_lat: -17.70,
            min_lng: -63.25,
            max_lng: -63.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Σ N_i of every generated zone set.
    pub population_total: u64,
    pub min_zones: usize,
    pub max_zones: usize,
    /// ± fraction around the average zone population.
    pub population_variation: f64,
    pub infected_rate_min: f64,
    pub infected_rate_max: f64,
    /// Floor on I0 so no zone starts without infection.
    pub min_initial_infected: u64,
    /// Activation days are drawn from [0, max_start_day].
    pub max_start_day: u64,
    pub bounds: GeoBounds,
    /// Empty means the built-in Santa Cruz district list.
    #[serde(default)]
    pub name_pool: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            population_total: 3_122_605,
            min_zones: 3,
            max_zones: 7,
            population_variation: 0.4,
            infected_rate_min: 0.0005,
            infected_rate_max: 0.002,
            min_initial_infected: 10,
            max_start_day: 14,
            bounds: GeoBounds::santa_cruz(),
            name_pool: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.population_total == 0 {
            return Err(SimError::config("generator.population_total", "must be > 0"));
        }
        if self.min_zones == 0 || self.min_zones > self.max_zones {
            return Err(SimError::config(
                "generator.min_zones",
                format!("must be in [1, max_zones={}]", self.max_zones),
            ));
        }
        if !(0.0..1.0).contains(&self.population_variation) {
            return Err(SimError::config(
                "generator.population_variation",
                "must be in [0, 1)",
            ));
        }
        if !(self.infected_rate_min >= 0.0 && self.infected_rate_min <= self.infected_rate_max)
            || self.infected_rate_max > 1.0
        {
            return Err(SimError::config(
                "generator.infected_rate_min",
                "must satisfy 0 <= min <= max <= 1",
            ));
        }
        let b = &self.bounds;
        if !(b.min_lat <= b.max_lat && b.min_lng <= b.max_lng) {
            return Err(SimError::config("generator.bounds", "min must not exceed max"));
        }
        let pool_len = if self.name_pool.is_empty() {
            crate::zone_generator::ZoneGenerator::santa_cruz_names().len()
        } else {
            let unique: HashSet<&String> = self.name_pool.iter().collect();
            if unique.len() != self.name_pool.len() {
                return Err(SimError::config("generator.name_pool", "names must be unique"));
            }
            self.name_pool.len()
        };
        if pool_len < self.max_zones {
            return Err(SimError::config(
                "generator.name_pool",
                format!("has {pool_len} names, need at least max_zones={}", self.max_zones),
            ));
        }
        // Every zone must be able to hold the infected floor.
        let floor = self.min_initial_infected.max(1);
        if self.population_total / (self.max_zones as u64) < floor * 2 {
            return Err(SimError::config(
                "generator.population_total",
                "too small for the zone count and infected floor",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// The run completes once the clock passes this day.
    pub horizon_days: Day,
    /// Max |S + I + R - N| before a conservation warning is raised.
    pub conservation_tolerance: f64,
    /// Host pacing only. Never changes results.
    pub steps_per_second: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            horizon_days: 120.0,
            conservation_tolerance: 10.0,
            steps_per_second: 5,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> SimResult<()> {
        check_positive("run.horizon_days", self.horizon_days)?;
        if !(self.conservation_tolerance.is_finite() && self.conservation_tolerance >= 0.0) {
            return Err(SimError::config("run.conservation_tolerance", "must be >= 0"));
        }
        if self.steps_per_second == 0 {
            return Err(SimError::config("run.steps_per_second", "must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub params: EpidemicParams,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub run: RunConfig,
    /// Fixed zone set. `None` means zones are generated from the seed.
    #[serde(default)]
    pub zones: Option<Vec<ZoneSpec>>,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/sim_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus the fixed Santa Cruz preset, so tests don't
    /// depend on generated zone layouts.
    pub fn default_test() -> Self {
        Self {
            zones: Some(ZoneSpec::santa_cruz_preset()),
            ..Self::default()
        }
    }

    /// A config holding exactly the given zones.
    pub fn with_zones(zones: Vec<ZoneSpec>) -> Self {
        Self {
            zones: Some(zones),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        self.params.validate()?;
        self.run.validate()?;
        self.generator.validate()?;
        if let Some(zones) = &self.zones {
            validate_zones(zones)?;
        }
        Ok(())
    }
}

/// Fail fast on zone definitions the integrator can't handle.
pub fn validate_zones(zones: &[ZoneSpec]) -> SimResult<()> {
    if zones.is_empty() {
        return Err(SimError::config("zones", "must contain at least one zone"));
    }
    let mut seen = HashSet::new();
    for z in zones {
        if !seen.insert(z.name.as_str()) {
            return Err(SimError::zone(&z.name, "duplicate zone name"));
        }
        if z.population == 0 {
            return Err(SimError::zone(&z.name, "population must be > 0"));
        }
        if z.initial_infected == 0 {
            return Err(SimError::zone(&z.name, "initial infected must be > 0"));
        }
        if z.initial_infected > z.population {
            return Err(SimError::zone(
                &z.name,
                format!(
                    "initial infected {} exceeds population {}",
                    z.initial_infected, z.population
                ),
            ));
        }
        if !(z.day_start.is_finite() && z.day_start >= 0.0) {
            return Err(SimError::zone(&z.name, "day_start must be a non-negative day"));
        }
    }
    Ok(())
}

fn check_positive(field: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(field, format!("must be > 0, got {value}")))
    }
}
