//! The simulation engine — drives a multi-zone SIR run.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Clock advances by dt   (past the horizon → Completed)
//!   1. Activation scheduler
//!   2. History recorder       (pre-step active aggregates)
//!   3. SIR integrator         (explicit Euler, clamped)
//!   4. Integral validator     (diagnostic only)
//!   5. Emission               (peak, run history, TickReport)
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - Parameters are read once per tick into a SimContext.
//!   - All randomness flows through the RngBank.
//!   - All state changes are recorded in the event log.
//!   - The engine never paces itself; hosts call tick() at their own cadence.

use crate::{
    activation::ActivationScheduler,
    clock::{DriverState, SimClock},
    command::SimCommand,
    config::{validate_zones, EpidemicParams, SimConfig},
    error::{SimError, SimResult},
    event::{EventLog, SimEvent},
    history::{PeakTracker, RunHistory},
    integral_validator::{IntegralComparison, IntegralValidator},
    report::{RunSummary, TickReport},
    rng::RngBank,
    sir_integrator::SirIntegrator,
    subsystem::{SimContext, SimSubsystem},
    time_history::{HistoryRecorder, TimeHistory},
    types::{Day, RunId, Tick},
    world::SimWorld,
    zone::Zone,
    zone_generator::ZoneGenerator,
};
use std::time::Duration;

/// What a single tick() produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Advanced(TickReport),
    Completed(RunSummary),
}

pub struct SimEngine {
    pub run_id:        RunId,
    pub clock:         SimClock,
    params:            EpidemicParams,
    config:            SimConfig,
    rng_bank:          RngBank,
    generation:        u64,
    simulation_number: u32,
    world:             SimWorld,
    subsystems:        Vec<Box<dyn SimSubsystem>>,
    peak:              PeakTracker,
    history:           RunHistory,
    event_log:         EventLog,
    last_report:       Option<TickReport>,
    summary:           Option<RunSummary>,
}

impl SimEngine {
    /// Validate the config and lay out the zones, with no subsystems
    /// registered. Most callers want build().
    pub fn new(run_id: RunId, seed: u64, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let rng_bank = RngBank::new(seed);
        let specs = match &config.zones {
            Some(zones) => zones.clone(),
            None => ZoneGenerator::generate(&config.generator, &mut rng_bank.for_generation(0)),
        };
        validate_zones(&specs)?;
        let world = SimWorld::new(specs);

        Ok(Self {
            clock: SimClock::new(config.run.horizon_days, config.run.steps_per_second),
            params: config.params,
            history: RunHistory::for_zones(&world.zones),
            config,
            rng_bank,
            generation: 0,
            simulation_number: 1,
            world,
            subsystems: Vec::new(),
            peak: PeakTracker::default(),
            event_log: EventLog::new(),
            last_report: None,
            summary: None,
            run_id,
        })
    }

    /// Build a fully wired engine with all subsystems registered and
    /// the tick-0 state emitted.
    pub fn build(run_id: RunId, seed: u64, config: SimConfig) -> SimResult<Self> {
        let mut engine = SimEngine::new(run_id, seed, config)?;

        // EXECUTION ORDER — fixed, documented, never reordered.
        engine.register(Box::new(ActivationScheduler::new()));
        engine.register(Box::new(HistoryRecorder::new()));
        engine.register(Box::new(SirIntegrator::new()));
        engine.register(Box::new(IntegralValidator::new()));

        engine.announce()?;
        engine.reset()?;
        Ok(engine)
    }

    /// Fully wired engine over the fixed Santa Cruz preset.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build(run_id, seed, SimConfig::default_test())
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push(subsystem);
    }

    // ── Commands ─────────────────────────────────────────────

    pub fn apply(&mut self, command: SimCommand) -> SimResult<()> {
        match command {
            SimCommand::GenerateZones => self.generate_zones().map(|_| ()),
            SimCommand::Reset => self.reset().map(|_| ()),
            SimCommand::Start => self.start(),
            SimCommand::Pause => self.pause(),
            SimCommand::Resume => self.resume(),
            SimCommand::SetBeta { value } => self.set_beta(value),
            SimCommand::SetGamma { value } => self.set_gamma(value),
            SimCommand::SetSpeed { steps_per_second } => {
                self.set_speed(steps_per_second);
                Ok(())
            }
        }
    }

    pub fn start(&mut self) -> SimResult<()> {
        self.transition("start", DriverState::Idle, DriverState::Running)
    }

    pub fn pause(&mut self) -> SimResult<()> {
        self.transition("pause", DriverState::Running, DriverState::Paused)
    }

    pub fn resume(&mut self) -> SimResult<()> {
        self.transition("resume", DriverState::Paused, DriverState::Running)
    }

    /// Back to idle: time, peak and both histories zeroed, every zone
    /// dormant again. Emits and returns the tick-0 report.
    pub fn reset(&mut self) -> SimResult<TickReport> {
        let from = self.clock.state;
        self.clock.reset();
        self.world.reset();
        self.peak = PeakTracker::default();
        self.history = RunHistory::for_zones(&self.world.zones);
        self.summary = None;

        self.event_log.append(0, "engine", &SimEvent::RunReset {
            run_id: self.run_id.clone(),
        })?;
        if from != DriverState::Idle {
            self.event_log.append(0, "engine", &SimEvent::StateChanged {
                tick: 0,
                from,
                to: DriverState::Idle,
            })?;
        }
        log::info!("Simulation reset (initial state emitted)");

        let comparison = IntegralComparison::new(self.world.totals().i, 0.0);
        self.emit(0, 0.0, comparison)
    }

    /// Draw a fresh zone set from the next generation stream, then reset.
    pub fn generate_zones(&mut self) -> SimResult<TickReport> {
        self.generation += 1;
        let mut rng = self.rng_bank.for_generation(self.generation);
        let specs = ZoneGenerator::generate(&self.config.generator, &mut rng);
        validate_zones(&specs)?;
        self.world = SimWorld::new(specs);
        self.simulation_number += 1;

        self.event_log.append(self.clock.tick, "engine", &SimEvent::ZonesGenerated {
            generation: self.generation,
            zone_count: self.world.zones.len(),
            population_total: self.world.population_total(),
        })?;
        self.announce()?;
        self.reset()
    }

    /// Takes effect from the next tick. History is never recomputed.
    pub fn set_beta(&mut self, beta: f64) -> SimResult<()> {
        let params = EpidemicParams { beta, ..self.params };
        params.validate()?;
        self.params = params;
        log::info!("beta updated: {:.2}, R0: {:.2}", beta, params.r0());
        self.parameters_changed()
    }

    /// Takes effect from the next tick. History is never recomputed.
    pub fn set_gamma(&mut self, gamma: f64) -> SimResult<()> {
        let params = EpidemicParams { gamma, ..self.params };
        params.validate()?;
        self.params = params;
        log::info!(
            "gamma updated: {:.2}, infectious period: {:.1} days, R0: {:.2}",
            gamma,
            params.infectious_period_days(),
            params.r0()
        );
        self.parameters_changed()
    }

    pub fn set_speed(&mut self, steps_per_second: u32) {
        self.clock.set_speed(steps_per_second);
        log::info!(
            "Speed: {}x ({}ms/step)",
            self.clock.steps_per_second,
            self.clock.tick_interval_ms()
        );
    }

    // ── Stepping ─────────────────────────────────────────────

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<TickOutcome> {
        if !self.clock.is_running() {
            return Err(SimError::NotRunning { state: self.clock.state });
        }

        let Some((tick, day)) = self.clock.advance(self.params.dt) else {
            return self.complete().map(TickOutcome::Completed);
        };

        let ctx = SimContext::new(tick, day, &self.params, self.config.run.conservation_tolerance);
        let mut tick_events: Vec<SimEvent> = vec![SimEvent::TickStarted { tick, day }];

        // Each subsystem sees all events emitted so far this tick.
        for subsystem in &mut self.subsystems {
            let new_events = subsystem.update(&ctx, &mut self.world, &tick_events)?;
            for event in &new_events {
                self.event_log.append(tick, subsystem.name(), event)?;
            }
            tick_events.extend(new_events);
        }

        let comparison = tick_events
            .iter()
            .rev()
            .find_map(|event| match event {
                SimEvent::IntegralEvaluated {
                    euler_infected,
                    integral_estimate,
                    relative_error_pct,
                    ..
                } => Some(IntegralComparison {
                    euler_infected: *euler_infected,
                    integral_estimate: *integral_estimate,
                    relative_error_pct: *relative_error_pct,
                }),
                _ => None,
            })
            .unwrap_or_else(|| IntegralComparison::new(self.world.totals().i, 0.0));

        self.emit(tick, day, comparison).map(TickOutcome::Advanced)
    }

    /// Run up to n ticks, then pause. Returns the summary if the
    /// horizon was reached on the way.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<Option<RunSummary>> {
        if !self.ensure_running("run_ticks")? {
            return Ok(self.summary.clone());
        }
        for _ in 0..n {
            if let TickOutcome::Completed(summary) = self.tick()? {
                return Ok(Some(summary));
            }
        }
        self.pause()?;
        Ok(None)
    }

    /// Tick until the horizon is passed.
    pub fn run_to_completion(&mut self) -> SimResult<RunSummary> {
        if !self.ensure_running("run_to_completion")? {
            return self.summary.clone().ok_or(SimError::InvalidTransition {
                command: "run_to_completion",
                state: DriverState::Completed,
            });
        }
        loop {
            if let TickOutcome::Completed(summary) = self.tick()? {
                return Ok(summary);
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn state(&self) -> DriverState {
        self.clock.state
    }

    pub fn current_day(&self) -> Day {
        self.clock.current_day
    }

    pub fn params(&self) -> &EpidemicParams {
        &self.params
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn simulation_number(&self) -> u32 {
        self.simulation_number
    }

    pub fn zones(&self) -> &[Zone] {
        &self.world.zones
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.world.zones.iter().find(|z| z.name() == name)
    }

    pub fn time_history(&self) -> &TimeHistory {
        &self.world.time_history
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    pub fn peak(&self) -> &PeakTracker {
        &self.peak
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Wall-clock pause between ticks for a paced host.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.clock.tick_interval_ms())
    }

    /// Names of registered subsystems, in execution order.
    pub fn subsystem_names(&self) -> Vec<&'static str> {
        self.subsystems.iter().map(|s| s.name()).collect()
    }

    /// Downcast a registered subsystem. Used by tests and tooling.
    pub fn subsystem<T: 'static>(&self) -> Option<&T> {
        self.subsystems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    // ── Internals ────────────────────────────────────────────

    fn transition(
        &mut self,
        command: &'static str,
        from: DriverState,
        to: DriverState,
    ) -> SimResult<()> {
        if self.clock.state != from {
            return Err(SimError::InvalidTransition { command, state: self.clock.state });
        }
        self.clock.state = to;
        log::info!("Simulation {command} at day {}: {from} -> {to}", self.clock.current_day);
        self.event_log.append(self.clock.tick, "engine", &SimEvent::StateChanged {
            tick: self.clock.tick,
            from,
            to,
        })
    }

    /// Get into Running from wherever a headless driver may find us.
    /// Returns false if the run is already complete.
    fn ensure_running(&mut self, command: &'static str) -> SimResult<bool> {
        match self.clock.state {
            DriverState::Idle => self.start()?,
            DriverState::Paused => self.resume()?,
            DriverState::Running => {}
            DriverState::Completed => {
                log::debug!("{command}: run already completed");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn emit(&mut self, tick: Tick, day: Day, comparison: IntegralComparison) -> SimResult<TickReport> {
        let total_i = self.world.totals().i;
        if self.peak.observe(tick, day, total_i) {
            self.event_log.append(tick, "engine", &SimEvent::PeakUpdated {
                tick,
                day,
                peak_infected: total_i,
            })?;
        }

        let report = TickReport::build(tick, day, &self.world, &self.params, &comparison, &self.peak);
        self.history.record(&report);
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn complete(&mut self) -> SimResult<RunSummary> {
        let tick = self.clock.tick;
        let final_day = self.history.days.last().copied().unwrap_or(0.0);
        let summary = RunSummary::build(tick, final_day, &self.world, &self.peak);

        log::info!("=== Simulation finished ({} days) ===", self.clock.horizon_days);
        log::info!(
            "Total susceptible: {:.0} ({:.1}%)",
            summary.totals.s,
            summary.susceptible_pct
        );
        log::info!("Total infected: {:.0} ({:.2}%)", summary.totals.i, summary.infected_pct);
        log::info!("Total recovered: {:.0} ({:.1}%)", summary.totals.r, summary.recovered_pct);
        log::info!(
            "Peak infected: {:.0} on day {}",
            summary.peak_infected,
            summary.peak_day
        );

        self.event_log.append(tick, "engine", &SimEvent::StateChanged {
            tick,
            from: DriverState::Running,
            to: DriverState::Completed,
        })?;
        self.event_log.append(tick, "engine", &SimEvent::RunCompleted {
            tick,
            day: final_day,
            peak_infected: summary.peak_infected,
            peak_day: summary.peak_day,
        })?;

        self.summary = Some(summary.clone());
        Ok(summary)
    }

    fn announce(&mut self) -> SimResult<()> {
        let population_total = self.world.population_total();
        log::info!("=== Simulation initialized ===");
        log::info!("Simulation #{}", self.simulation_number);
        log::info!("Zones: {}", self.world.zones.len());
        log::info!("Total population: {population_total}");
        self.event_log.append(self.clock.tick, "engine", &SimEvent::RunInitialized {
            run_id: self.run_id.clone(),
            seed: self.seed(),
            simulation_number: self.simulation_number,
            zone_count: self.world.zones.len(),
            population_total,
        })
    }

    fn parameters_changed(&mut self) -> SimResult<()> {
        self.event_log.append(self.clock.tick, "engine", &SimEvent::ParametersChanged {
            tick: self.clock.tick,
            beta: self.params.beta,
            gamma: self.params.gamma,
            r0: self.params.r0(),
        })
    }
}
