use serde::{Deserialize, Serialize};

/// Every command a host may send to the engine.
/// Variants are appended — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SimCommand {
    // ── Lifecycle ─────────────────────────────────
    GenerateZones,
    Reset,
    Start,
    Pause,
    Resume,

    // ── Parameters (apply from the next tick) ─────
    SetBeta { value: f64 },
    SetGamma { value: f64 },

    // ── Host pacing ───────────────────────────────
    SetSpeed { steps_per_second: u32 },
}
