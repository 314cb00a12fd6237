use thiserror::Error;

use crate::arena::layout::LayoutError;
use crate::core::types::ProximityKey;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Freeze/unfreeze is not supported in training mode")]
    FreezeInTraining,

    #[error("Could not find a safe spawn position after {attempts} attempts")]
    SpawnExhausted { attempts: u32 },

    #[error("No node registered for proximity key {0}")]
    UnknownProximityKey(ProximityKey),

    #[error("Field has no nodes to spawn near")]
    EmptyField,

    #[error("Match still running at t={clock:.2}s when the wall limit passed")]
    MatchUnfinished { clock: f64 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
