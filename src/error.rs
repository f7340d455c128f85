//! Error type shared across the crate

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::{AppointmentId, Perk};

/// Everything that can go wrong when driving the game
#[derive(Debug, Error)]
pub enum GameError {
    #[error("failed to read settings from {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("not enough cash: need {needed}, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },

    #[error("not enough skill points: need {needed}, have {available}")]
    InsufficientSkillPoints { needed: u32, available: u32 },

    #[error("not enough energy: need {needed}, have {available}")]
    InsufficientEnergy { needed: u32, available: u32 },

    #[error("perk {0:?} is already unlocked")]
    PerkAlreadyUnlocked(Perk),

    #[error("no appointment with id {0}")]
    UnknownAppointment(AppointmentId),

    #[error("appointment {0} overlaps an already accepted appointment")]
    ScheduleConflict(AppointmentId),

    #[error("appointment {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: AppointmentId,
        from: &'static str,
        to: &'static str,
    },

    #[error("another session is already in progress")]
    Busy,
}

pub type Result<T> = std::result::Result<T, GameError>;
