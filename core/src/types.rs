//! Shared primitive types used across the entire simulation.

use uuid::Uuid;

/// A simulation tick. One tick = one `dt` step of simulated time.
pub type Tick = u64;

/// Simulated time in days. Advances by `dt` every tick.
pub type Day = f64;

/// The canonical run identifier.
pub type RunId = String;

/// Zone names are unique within a run.
pub type ZoneName = String;

/// Fresh run identifier for hosts that don't bring their own.
/// Never used inside the simulation itself.
pub fn new_run_id() -> RunId {
    format!("run-{}", Uuid::new_v4())
}
