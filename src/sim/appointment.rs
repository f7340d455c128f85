//! Appointment booking
//!
//! Each morning a fresh batch of appointments is offered. Accepted
//! appointments become ready when the player is at the booked location inside
//! the time window; ones that slip past their window are marked missed.

use std::fmt;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::progression::Discipline;
use super::time::GameDateTime;
use crate::consts::MINUTES_PER_HOUR;
use crate::error::{GameError, Result};
use crate::settings::{AppointmentSettings, TimeSettings};

pub type AppointmentId = u32;

const CLIENT_NAMES: &[&str] = &[
    "Mrs. Alvarez", "Mr. Okafor", "Priya", "Jonas", "Ms. Whitfield", "Dr. Chen", "Tomasz", "Greta",
];
const DOG_NAMES: &[&str] = &["Biscuit", "Pepper", "Moose", "Luna", "Waffles", "Ziggy", "Rocket", "Mochi"];
const STUDENT_NAMES: &[&str] = &["Ada", "Felix", "Noor", "Theo", "Ines", "Kai", "Maren", "Sol"];

/// Window sizes are rounded to this many minutes
const SLOT_MINUTES: u32 = 15;

/// Lifecycle of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Available,
    Accepted,
    InProgress,
    Completed,
    Missed,
    Failed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Available => "available",
            AppointmentStatus::Accepted => "accepted",
            AppointmentStatus::InProgress => "in progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Missed => "missed",
            AppointmentStatus::Failed => "failed",
        }
    }
}

/// Half-open span `[start, end)` of game time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: GameDateTime,
    pub end: GameDateTime,
}

impl TimeWindow {
    pub fn new(start: GameDateTime, minutes: u32) -> Self {
        Self {
            start,
            end: start.add_minutes(minutes),
        }
    }

    pub fn contains(&self, t: GameDateTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn minutes(&self) -> u32 {
        self.end.total_minutes() - self.start.total_minutes()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start.hour, self.start.minute, self.end.hour, self.end.minute
        )
    }
}

/// A booked or bookable coaching session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentData {
    pub id: AppointmentId,
    pub client: String,
    /// The dog or tennis student being coached
    pub trainee: String,
    pub discipline: Discipline,
    pub location: String,
    pub window: TimeWindow,
    pub reward_cash: u32,
    pub reward_xp: u32,
    pub status: AppointmentStatus,
}

/// Tally of how a day went, produced at rollover
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: u32,
    pub completed: u32,
    pub missed: u32,
    pub failed: u32,
    /// Listed rewards of completed sessions, before performance scaling
    pub cash_earned: u32,
}

/// Offers, bookings and the day's history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentManager {
    available: Vec<AppointmentData>,
    accepted: Vec<AppointmentData>,
    history: Vec<AppointmentData>,
    next_id: AppointmentId,
}

impl AppointmentManager {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn available(&self) -> &[AppointmentData] {
        &self.available
    }

    /// Accepted and in-progress appointments, sorted by start time
    pub fn accepted(&self) -> &[AppointmentData] {
        &self.accepted
    }

    pub fn history(&self) -> &[AppointmentData] {
        &self.history
    }

    pub fn get(&self, id: AppointmentId) -> Option<&AppointmentData> {
        self.available
            .iter()
            .chain(&self.accepted)
            .chain(&self.history)
            .find(|a| a.id == id)
    }

    fn next_appointment_id(&mut self) -> AppointmentId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Replace today's offers with a fresh batch
    pub fn generate_for_day(
        &mut self,
        day: u32,
        rng: &mut Pcg32,
        reputation_factor: f32,
        settings: &AppointmentSettings,
        time: &TimeSettings,
    ) {
        self.available.clear();

        let open = time.day_start_hour * MINUTES_PER_HOUR;
        let close = time.day_end_hour * MINUTES_PER_HOUR;

        for _ in 0..settings.appointments_per_day {
            let slots = (settings.max_window_minutes - settings.min_window_minutes) / SLOT_MINUTES;
            let length = settings.min_window_minutes + rng.random_range(0..=slots) * SLOT_MINUTES;
            let length = length.min(close.saturating_sub(open)).max(SLOT_MINUTES);

            let latest_start = close.saturating_sub(length).max(open);
            let start_slots = (latest_start - open) / SLOT_MINUTES;
            let start = open + rng.random_range(0..=start_slots) * SLOT_MINUTES;
            let window = TimeWindow::new(
                GameDateTime::new(day, start / MINUTES_PER_HOUR, start % MINUTES_PER_HOUR),
                length,
            );

            let discipline = if rng.random_bool(0.5) {
                Discipline::Dog
            } else {
                Discipline::Tennis
            };
            let trainees = match discipline {
                Discipline::Dog => DOG_NAMES,
                Discipline::Tennis => STUDENT_NAMES,
            };

            let hours = length as f32 / MINUTES_PER_HOUR as f32;
            let reputation_bonus = 1.0 + reputation_factor;
            let reward_cash = (settings.base_reward_cash as f32 * hours * reputation_bonus).round() as u32;
            let reward_xp = (settings.base_reward_xp as f32 * hours).round() as u32;

            let id = self.next_appointment_id();
            self.available.push(AppointmentData {
                id,
                client: CLIENT_NAMES[rng.random_range(0..CLIENT_NAMES.len())].to_string(),
                trainee: trainees[rng.random_range(0..trainees.len())].to_string(),
                discipline,
                location: settings.locations[rng.random_range(0..settings.locations.len())].clone(),
                window,
                reward_cash,
                reward_xp,
                status: AppointmentStatus::Available,
            });
        }

        self.available.sort_by_key(|a| (a.window.start, a.id));
        log::info!("Day {}: {} appointments on offer", day, self.available.len());
    }

    /// Book an offered appointment
    pub fn accept(&mut self, id: AppointmentId) -> Result<&AppointmentData> {
        let idx = self
            .available
            .iter()
            .position(|a| a.id == id)
            .ok_or(GameError::UnknownAppointment(id))?;

        let window = self.available[idx].window;
        if self.accepted.iter().any(|a| a.window.overlaps(&window)) {
            return Err(GameError::ScheduleConflict(id));
        }

        let mut appt = self.available.remove(idx);
        appt.status = AppointmentStatus::Accepted;
        log::info!(
            "Accepted #{}: {} with {} at {} ({})",
            appt.id,
            appt.client,
            appt.trainee,
            appt.location,
            appt.window
        );
        self.accepted.push(appt);
        self.accepted.sort_by_key(|a| (a.window.start, a.id));
        self.accepted
            .iter()
            .find(|a| a.id == id)
            .ok_or(GameError::UnknownAppointment(id))
    }

    /// Turn down an offer
    pub fn decline(&mut self, id: AppointmentId) -> Result<AppointmentData> {
        let idx = self
            .available
            .iter()
            .position(|a| a.id == id)
            .ok_or(GameError::UnknownAppointment(id))?;
        Ok(self.available.remove(idx))
    }

    /// The booked appointment the player can start right now, if any
    pub fn find_ready(&self, location: &str, now: GameDateTime, grace_minutes: u32) -> Option<&AppointmentData> {
        self.accepted.iter().find(|a| {
            a.status == AppointmentStatus::Accepted
                && a.location == location
                && a.window.start <= now
                && now < a.window.end.add_minutes(grace_minutes)
        })
    }

    /// Mark an accepted appointment as underway
    pub fn begin(&mut self, id: AppointmentId) -> Result<()> {
        let appt = self.accepted_mut(id)?;
        if appt.status != AppointmentStatus::Accepted {
            return Err(GameError::InvalidTransition {
                id,
                from: appt.status.as_str(),
                to: AppointmentStatus::InProgress.as_str(),
            });
        }
        appt.status = AppointmentStatus::InProgress;
        Ok(())
    }

    /// Finish an in-progress appointment successfully
    pub fn complete(&mut self, id: AppointmentId) -> Result<AppointmentData> {
        self.finish(id, AppointmentStatus::Completed)
    }

    /// Finish an in-progress appointment unsuccessfully
    pub fn fail(&mut self, id: AppointmentId) -> Result<AppointmentData> {
        self.finish(id, AppointmentStatus::Failed)
    }

    /// Put an in-progress appointment back to accepted (e.g. cancelled hand-off)
    pub fn revert(&mut self, id: AppointmentId) -> Result<()> {
        let appt = self.accepted_mut(id)?;
        if appt.status == AppointmentStatus::InProgress {
            appt.status = AppointmentStatus::Accepted;
        }
        Ok(())
    }

    fn accepted_mut(&mut self, id: AppointmentId) -> Result<&mut AppointmentData> {
        self.accepted
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(GameError::UnknownAppointment(id))
    }

    fn finish(&mut self, id: AppointmentId, status: AppointmentStatus) -> Result<AppointmentData> {
        let idx = self
            .accepted
            .iter()
            .position(|a| a.id == id)
            .ok_or(GameError::UnknownAppointment(id))?;
        let current = self.accepted[idx].status;
        if current != AppointmentStatus::InProgress {
            return Err(GameError::InvalidTransition {
                id,
                from: current.as_str(),
                to: status.as_str(),
            });
        }
        let mut appt = self.accepted.remove(idx);
        appt.status = status;
        self.history.push(appt.clone());
        Ok(appt)
    }

    /// React to the clock: returns appointments that were just missed
    pub fn on_time(&mut self, now: GameDateTime, grace_minutes: u32) -> Vec<AppointmentData> {
        let before = self.available.len();
        self.available.retain(|a| a.window.start >= now);
        let withdrawn = before - self.available.len();
        if withdrawn > 0 {
            log::debug!("{} offers withdrawn at {}", withdrawn, now);
        }

        let mut missed = Vec::new();
        let mut i = 0;
        while i < self.accepted.len() {
            let appt = &self.accepted[i];
            let overdue = now >= appt.window.end.add_minutes(grace_minutes);
            if appt.status == AppointmentStatus::Accepted && overdue {
                let mut appt = self.accepted.remove(i);
                appt.status = AppointmentStatus::Missed;
                log::warn!("Missed #{} with {} at {}", appt.id, appt.client, appt.location);
                self.history.push(appt.clone());
                missed.push(appt);
            } else {
                i += 1;
            }
        }
        missed
    }

    /// Close out the finished day
    pub fn on_new_day(&mut self, finished_day: u32) -> DaySummary {
        let mut summary = DaySummary {
            day: finished_day,
            ..Default::default()
        };
        for appt in self.history.drain(..) {
            match appt.status {
                AppointmentStatus::Completed => {
                    summary.completed += 1;
                    summary.cash_earned += appt.reward_cash;
                }
                AppointmentStatus::Missed => summary.missed += 1,
                AppointmentStatus::Failed => summary.failed += 1,
                _ => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generate(manager: &mut AppointmentManager, seed: u64) {
        let mut rng = Pcg32::seed_from_u64(seed);
        manager.generate_for_day(
            1,
            &mut rng,
            0.2,
            &AppointmentSettings::default(),
            &TimeSettings::default(),
        );
    }

    /// Manager with two hand-made, non-overlapping offers
    fn manual() -> AppointmentManager {
        let mut manager = AppointmentManager::new();
        for (hour, location) in [(9, "Riverside Park"), (13, "Hillside Courts")] {
            let id = manager.next_appointment_id();
            manager.available.push(AppointmentData {
                id,
                client: "Greta".to_string(),
                trainee: "Moose".to_string(),
                discipline: Discipline::Dog,
                location: location.to_string(),
                window: TimeWindow::new(GameDateTime::new(1, hour, 0), 60),
                reward_cash: 50,
                reward_xp: 30,
                status: AppointmentStatus::Available,
            });
        }
        manager
    }

    #[test]
    fn test_generation_within_working_hours() {
        let mut manager = AppointmentManager::new();
        generate(&mut manager, 7);
        let time = TimeSettings::default();
        assert_eq!(manager.available().len(), 4);
        for appt in manager.available() {
            assert!(appt.window.start.hour >= time.day_start_hour);
            assert!(appt.window.end.minute_of_day() <= time.day_end_hour * MINUTES_PER_HOUR);
            assert!((60..=120).contains(&appt.window.minutes()));
            assert!(appt.reward_cash > 0);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut a = AppointmentManager::new();
        let mut b = AppointmentManager::new();
        generate(&mut a, 42);
        generate(&mut b, 42);
        let names = |m: &AppointmentManager| {
            m.available()
                .iter()
                .map(|x| (x.client.clone(), x.window))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_accept_removes_from_available() {
        let mut manager = manual();
        manager.accept(1).unwrap();
        assert!(manager.available().iter().all(|a| a.id != 1));
        assert_eq!(manager.accepted()[0].status, AppointmentStatus::Accepted);
        assert!(matches!(manager.accept(1), Err(GameError::UnknownAppointment(1))));
    }

    #[test]
    fn test_accept_rejects_overlap() {
        let mut manager = manual();
        manager.available[1].window = TimeWindow::new(GameDateTime::new(1, 9, 30), 60);
        manager.accept(1).unwrap();
        assert!(matches!(manager.accept(2), Err(GameError::ScheduleConflict(2))));
        assert_eq!(manager.available().len(), 1);
    }

    #[test]
    fn test_find_ready_needs_location_and_window() {
        let mut manager = manual();
        manager.accept(1).unwrap();
        let early = GameDateTime::new(1, 8, 59);
        let on_time = GameDateTime::new(1, 9, 30);
        let late = GameDateTime::new(1, 10, 5);
        assert!(manager.find_ready("Riverside Park", early, 0).is_none());
        assert!(manager.find_ready("Town Square", on_time, 0).is_none());
        assert_eq!(manager.find_ready("Riverside Park", on_time, 0).map(|a| a.id), Some(1));
        assert!(manager.find_ready("Riverside Park", late, 0).is_none());
        assert!(manager.find_ready("Riverside Park", late, 20).is_some());
    }

    #[test]
    fn test_lifecycle() {
        let mut manager = manual();
        manager.accept(1).unwrap();
        assert!(manager.complete(1).is_err());
        manager.begin(1).unwrap();
        assert!(manager.begin(1).is_err());
        let done = manager.complete(1).unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);
        assert!(manager.accepted().is_empty());
        assert_eq!(manager.get(1).map(|a| a.status), Some(AppointmentStatus::Completed));
    }

    #[test]
    fn test_on_time_marks_missed_and_withdraws() {
        let mut manager = manual();
        manager.accept(1).unwrap();
        let missed = manager.on_time(GameDateTime::new(1, 10, 0), 0);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].status, AppointmentStatus::Missed);
        assert_eq!(manager.available().len(), 1);

        let missed = manager.on_time(GameDateTime::new(1, 13, 1), 0);
        assert!(missed.is_empty());
        assert!(manager.available().is_empty());
    }

    #[test]
    fn test_in_progress_is_never_missed() {
        let mut manager = manual();
        manager.accept(1).unwrap();
        manager.begin(1).unwrap();
        assert!(manager.on_time(GameDateTime::new(1, 12, 0), 0).is_empty());
        manager.revert(1).unwrap();
        assert_eq!(manager.on_time(GameDateTime::new(1, 12, 0), 0).len(), 1);
    }

    #[test]
    fn test_day_summary() {
        let mut manager = manual();
        manager.accept(1).unwrap();
        manager.accept(2).unwrap();
        manager.begin(1).unwrap();
        manager.complete(1).unwrap();
        manager.on_time(GameDateTime::new(1, 15, 0), 0);
        let summary = manager.on_new_day(1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.cash_earned, 50);
        assert!(manager.history().is_empty());
    }
}
