use crate::clock::DriverState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Invalid zone '{zone}': {reason}")]
    InvalidZone { zone: String, reason: String },

    #[error("Cannot {command} while simulation is {state}")]
    InvalidTransition {
        command: &'static str,
        state: DriverState,
    },

    #[error("tick() called while simulation is {state}")]
    NotRunning { state: DriverState },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn zone(zone: &str, reason: impl Into<String>) -> Self {
        Self::InvalidZone {
            zone: zone.to_string(),
            reason: reason.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
