//! Deterministic simulation module
//!
//! Day-to-day bookkeeping of the coaching business lives here. It must stay
//! pure and deterministic:
//! - Game time advances only through `TimeSystem`
//! - Seeded RNG only
//! - Stable iteration order (by id / start time)
//! - No rendering or platform dependencies

pub mod appointment;
pub mod handover;
pub mod progression;
pub mod time;

pub use appointment::{
    AppointmentData, AppointmentId, AppointmentManager, AppointmentStatus, DaySummary, TimeWindow,
};
pub use handover::{
    ClientState, HandoverEvent, HandoverInput, HandoverPhase, HandoverSequence, TraineeState,
};
pub use progression::{
    Discipline, Perk, PerkSet, PlayerStats, Progression, SkillData, SpecialistField,
};
pub use time::{DayPhase, GameDateTime, TimeEvent, TimeSystem, Weekday};
