//! Multi-zone SIR epidemic simulation core.
//!
//! Zones activate on staggered days, each active zone is advanced by an
//! explicit Euler step, and the aggregate infected trajectory is checked
//! every tick against the closed-form integral equation. Rendering and
//! pacing belong to the host; see `engine` for the per-tick order.

pub mod activation;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod history;
pub mod integral_validator;
pub mod report;
pub mod rng;
pub mod sir_integrator;
pub mod subsystem;
pub mod time_history;
pub mod types;
pub mod world;
pub mod zone;
pub mod zone_generator;
