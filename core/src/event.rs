//! The event bus — all inter-subsystem communication.
//!
//! RULE: Subsystems communicate ONLY through events and the shared
//! world they are handed. A subsystem never calls another subsystem.

use crate::{
    clock::DriverState,
    error::SimResult,
    types::{Day, RunId, Tick, ZoneName},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
        day: Day,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
        simulation_number: u32,
        zone_count: usize,
        population_total: u64,
    },
    RunReset {
        run_id: RunId,
    },
    StateChanged {
        tick: Tick,
        from: DriverState,
        to: DriverState,
    },
    ParametersChanged {
        tick: Tick,
        beta: f64,
        gamma: f64,
        r0: f64,
    },
    ZonesGenerated {
        generation: u64,
        zone_count: usize,
        population_total: u64,
    },
    RunCompleted {
        tick: Tick,
        day: Day,
        peak_infected: f64,
        peak_day: Day,
    },

    // ── Zone lifecycle ─────────────────────────────
    ZoneActivated {
        tick: Tick,
        day: Day,
        zone: ZoneName,
        initial_infected: u64,
    },

    // ── Integration diagnostics ────────────────────
    ConservationViolated {
        tick: Tick,
        day: Day,
        zone: ZoneName,
        total: f64,
        population: u64,
    },
    IntegralEvaluated {
        tick: Tick,
        day: Day,
        euler_infected: f64,
        integral_estimate: f64,
        relative_error_pct: f64,
    },
    PeakUpdated {
        tick: Tick,
        day: Day,
        peak_infected: f64,
    },
}

impl SimEvent {
    /// Stable string name of the variant.
    /// Used for the event_type field of the log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }          => "tick_started",
            Self::RunInitialized { .. }       => "run_initialized",
            Self::RunReset { .. }             => "run_reset",
            Self::StateChanged { .. }         => "state_changed",
            Self::ParametersChanged { .. }    => "parameters_changed",
            Self::ZonesGenerated { .. }       => "zones_generated",
            Self::RunCompleted { .. }         => "run_completed",
            Self::ZoneActivated { .. }        => "zone_activated",
            Self::ConservationViolated { .. } => "conservation_violated",
            Self::IntegralEvaluated { .. }    => "integral_evaluated",
            Self::PeakUpdated { .. }          => "peak_updated",
        }
    }
}

/// One entry of the event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLogEntry {
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}

/// In-memory, append-only log of everything that happened in a session.
/// Survives resets so a host sees the whole session.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, tick: Tick, subsystem: &str, event: &SimEvent) -> SimResult<()> {
        self.entries.push(EventLogEntry {
            tick,
            subsystem: subsystem.to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a EventLogEntry> {
        self.entries.iter().filter(move |e| e.event_type == event_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_tagged_json() {
        let mut log = EventLog::new();
        let event = SimEvent::ZoneActivated {
            tick: 3,
            day: 1.5,
            zone: "Centro".into(),
            initial_infected: 500,
        };
        log.append(3, "activation", &event).unwrap();

        let entry = &log.entries()[0];
        assert_eq!(entry.event_type, "zone_activated");
        assert!(entry.payload.contains(r#""type":"zone_activated""#), "{}", entry.payload);
        let back: SimEvent = serde_json::from_str(&entry.payload).unwrap();
        assert_eq!(back, event);
    }
}
