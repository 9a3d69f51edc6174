//! Deterministic zone generation from a curated district list.
//!
//! Produces a randomized zone set whose populations always sum to the
//! configured metropolitan total. All generation is deterministic
//! (same RNG seed = same zones).

use crate::{
    config::GeneratorConfig,
    rng::SimRng,
    zone::{GeoPoint, ZoneSpec},
};

/// Deterministic zone generator.
pub struct ZoneGenerator;

impl ZoneGenerator {
    /// Generate a zone set sorted by activation day.
    ///
    /// Invariant: Σ population == `config.population_total`.
    pub fn generate(config: &GeneratorConfig, rng: &mut SimRng) -> Vec<ZoneSpec> {
        log::debug!("Drawing zones from stream '{}'", rng.name);
        let zone_count = rng.range_inclusive(config.min_zones as u64, config.max_zones as u64);
        let names = Self::draw_names(config, zone_count as usize, rng);
        let populations = Self::apportion_population(config, names.len(), rng);

        let mut zones: Vec<ZoneSpec> = names
            .into_iter()
            .zip(populations)
            .map(|(name, population)| {
                let position = Self::random_position(config, rng);
                let initial_infected = Self::initial_infected(config, population, rng);
                let day_start = rng.range_inclusive(0, config.max_start_day) as f64;
                ZoneSpec::new(name, position, population, initial_infected, day_start)
            })
            .collect();

        zones.sort_by(|a, b| a.day_start.total_cmp(&b.day_start));

        log::info!("Generated {} zones:", zones.len());
        for z in &zones {
            log::info!(
                "  - {}: N={}, I0={}, day={}",
                z.name,
                z.population,
                z.initial_infected,
                z.day_start
            );
        }
        log::info!(
            "  Total population: {}",
            zones.iter().map(|z| z.population).sum::<u64>()
        );

        zones
    }

    /// Draw `count` unique names without replacement.
    fn draw_names(config: &GeneratorConfig, count: usize, rng: &mut SimRng) -> Vec<String> {
        let mut available: Vec<String> = if config.name_pool.is_empty() {
            Self::santa_cruz_names().iter().map(|n| n.to_string()).collect()
        } else {
            config.name_pool.clone()
        };
        let mut names = Vec::with_capacity(count);
        while names.len() < count && !available.is_empty() {
            let index = rng.next_u64_below(available.len() as u64) as usize;
            names.push(available.swap_remove(index));
        }
        names
    }

    /// Every zone but the last gets avg * (1 ± variation); the last zone
    /// absorbs the remainder so the total is exact.
    ///
    /// Each draw is capped so the zones still to come can each get at
    /// least `zone_floor` people, which keeps every zone able to hold
    /// the infected floor.
    fn apportion_population(config: &GeneratorConfig, count: usize, rng: &mut SimRng) -> Vec<u64> {
        if count == 0 {
            return Vec::new();
        }
        let avg = config.population_total as f64 / count as f64;
        let min_pop = avg * (1.0 - config.population_variation);
        let max_pop = avg * (1.0 + config.population_variation);
        let zone_floor = (min_pop.floor() as u64).max(config.min_initial_infected.max(1));

        let mut remaining = config.population_total;
        let mut populations = Vec::with_capacity(count);
        for index in 0..count - 1 {
            let zones_after = (count - 1 - index) as u64;
            let cap = remaining.saturating_sub(zones_after * zone_floor);
            let population = (rng.uniform(min_pop, max_pop).round() as u64).min(cap);
            remaining -= population;
            populations.push(population);
        }
        populations.push(remaining);
        populations
    }

    fn random_position(config: &GeneratorConfig, rng: &mut SimRng) -> GeoPoint {
        let b = &config.bounds;
        GeoPoint {
            lat: rng.uniform(b.min_lat, b.max_lat),
            lng: rng.uniform(b.min_lng, b.max_lng),
        }
    }

    /// max(floor, round(N * r)), never above N.
    fn initial_infected(config: &GeneratorConfig, population: u64, rng: &mut SimRng) -> u64 {
        let rate = rng.uniform(config.infected_rate_min, config.infected_rate_max);
        let seeded = (population as f64 * rate).round() as u64;
        seeded.max(config.min_initial_infected).min(population)
    }

    /// Real district names of Santa Cruz de la Sierra.
    pub fn santa_cruz_names() -> &'static [&'static str] {
        &[
            "Centro Histórico", "Plan 3000", "Equipetrol", "Pampa de la Isla", "Las Palmas",
            "Villa 1ro de Mayo", "Urbarí", "Los Lotes", "Montero Hoyos", "La Cuchilla",
            "Villa Busch", "Cristo Rey", "Santos Dumont", "San Aurelio", "Mutualista",
            "La Morita", "San Martin", "Villa Olimpica", "El Bajio", "Sirari",
            "Palmasola", "La Guardia", "Warnes", "Cotoca", "Porongo",
        ]
    }
}
