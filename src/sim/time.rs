//! In-game clock
//!
//! Converts real elapsed seconds into discrete in-game minutes and reports
//! every minute, hour and day boundary it crosses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::TimeSettings;

/// Day of the week (day 1 is a Monday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

/// Coarse part of the day, used for the day/night cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayPhase {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// A point in game time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameDateTime {
    /// 1-based day counter
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl GameDateTime {
    pub fn new(day: u32, hour: u32, minute: u32) -> Self {
        Self::from_total_minutes(
            day.saturating_sub(1) * MINUTES_PER_DAY + hour * MINUTES_PER_HOUR + minute,
        )
    }

    /// Minutes since day 1, 00:00
    pub fn total_minutes(&self) -> u32 {
        (self.day - 1) * MINUTES_PER_DAY + self.hour * MINUTES_PER_HOUR + self.minute
    }

    pub fn from_total_minutes(total: u32) -> Self {
        Self {
            day: total / MINUTES_PER_DAY + 1,
            hour: (total % MINUTES_PER_DAY) / MINUTES_PER_HOUR,
            minute: total % MINUTES_PER_HOUR,
        }
    }

    pub fn add_minutes(&self, minutes: u32) -> Self {
        Self::from_total_minutes(self.total_minutes() + minutes)
    }

    /// Minutes since midnight of the current day
    pub fn minute_of_day(&self) -> u32 {
        self.hour * MINUTES_PER_HOUR + self.minute
    }

    pub fn weekday(&self) -> Weekday {
        Weekday::ALL[((self.day - 1) % 7) as usize]
    }

    pub fn day_phase(&self) -> DayPhase {
        match self.hour {
            6..=11 => DayPhase::Morning,
            12..=17 => DayPhase::Afternoon,
            18..=20 => DayPhase::Evening,
            _ => DayPhase::Night,
        }
    }
}

impl Default for GameDateTime {
    fn default() -> Self {
        Self {
            day: 1,
            hour: 0,
            minute: 0,
        }
    }
}

impl fmt::Display for GameDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {} {:02}:{:02}", self.day, self.hour, self.minute)
    }
}

/// Clock boundary notifications, emitted in chronological order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEvent {
    MinuteChanged(GameDateTime),
    HourChanged(GameDateTime),
    NewDay(GameDateTime),
}

/// Accumulates real time into game minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSystem {
    now: GameDateTime,
    /// Real seconds not yet converted into a game minute
    accumulator: f32,
    seconds_per_minute: f32,
    speed: f32,
    paused: bool,
    day_start_hour: u32,
    day_end_hour: u32,
}

impl TimeSystem {
    pub const MIN_SPEED: f32 = 0.1;
    pub const MAX_SPEED: f32 = 32.0;

    /// Start the clock at the opening hour of day 1
    pub fn new(settings: &TimeSettings) -> Self {
        Self::starting_at(settings, GameDateTime::new(1, settings.day_start_hour, 0))
    }

    pub fn starting_at(settings: &TimeSettings, now: GameDateTime) -> Self {
        Self {
            now,
            accumulator: 0.0,
            seconds_per_minute: settings.seconds_per_game_minute,
            speed: 1.0,
            paused: false,
            day_start_hour: settings.day_start_hour,
            day_end_hour: settings.day_end_hour,
        }
    }

    pub fn now(&self) -> GameDateTime {
        self.now
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::debug!("Clock {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = crate::clamp_f32(speed, Self::MIN_SPEED, Self::MAX_SPEED);
    }

    pub fn is_working_hours(&self) -> bool {
        (self.day_start_hour..self.day_end_hour).contains(&self.now.hour)
    }

    /// Advance by `real_dt` seconds of wall time
    pub fn tick(&mut self, real_dt: f32) -> Vec<TimeEvent> {
        if self.paused || !real_dt.is_finite() || real_dt <= 0.0 {
            return Vec::new();
        }

        self.accumulator += real_dt * self.speed;
        let whole = (self.accumulator / self.seconds_per_minute).floor();
        if whole < 1.0 {
            return Vec::new();
        }
        self.accumulator -= whole * self.seconds_per_minute;

        let mut minutes = whole as u32;
        if minutes > MAX_MINUTES_PER_TICK {
            log::warn!(
                "Clock fell {} minutes behind, dropping {}",
                minutes,
                minutes - MAX_MINUTES_PER_TICK
            );
            minutes = MAX_MINUTES_PER_TICK;
            self.accumulator = 0.0;
        }
        self.advance(minutes)
    }

    /// Developer control: jump ahead, emitting every crossed boundary
    pub fn skip_minutes(&mut self, minutes: u32) -> Vec<TimeEvent> {
        self.advance(minutes)
    }

    /// Jump to the next opening hour: later today if it's still before dawn,
    /// otherwise tomorrow
    pub fn sleep_until_morning(&mut self) -> Vec<TimeEvent> {
        self.accumulator = 0.0;
        let mut events = Vec::with_capacity(3);
        let wake = if self.now.hour < self.day_start_hour {
            GameDateTime::new(self.now.day, self.day_start_hour, 0)
        } else {
            let wake = GameDateTime::new(self.now.day + 1, self.day_start_hour, 0);
            events.push(TimeEvent::NewDay(wake));
            wake
        };
        self.now = wake;
        log::info!("Slept until {}", wake);
        events.push(TimeEvent::HourChanged(wake));
        events.push(TimeEvent::MinuteChanged(wake));
        events
    }

    fn advance(&mut self, minutes: u32) -> Vec<TimeEvent> {
        let mut events = Vec::with_capacity(minutes as usize);
        for _ in 0..minutes {
            let next = self.now.add_minutes(1);
            if next.day != self.now.day {
                log::info!("A new day begins: {} ({:?})", next, next.weekday());
                events.push(TimeEvent::NewDay(next));
            }
            if next.hour != self.now.hour {
                events.push(TimeEvent::HourChanged(next));
            }
            events.push(TimeEvent::MinuteChanged(next));
            self.now = next;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TimeSettings {
        TimeSettings {
            seconds_per_game_minute: 1.0,
            day_start_hour: 7,
            day_end_hour: 21,
        }
    }

    #[test]
    fn test_new_starts_at_opening() {
        let clock = TimeSystem::new(&settings());
        assert_eq!(clock.now(), GameDateTime::new(1, 7, 0));
        assert!(clock.is_working_hours());
    }

    #[test]
    fn test_tick_accumulates_partial_minutes() {
        let mut clock = TimeSystem::new(&settings());
        assert!(clock.tick(0.6).is_empty());
        let events = clock.tick(0.6);
        assert_eq!(events, vec![TimeEvent::MinuteChanged(GameDateTime::new(1, 7, 1))]);
    }

    #[test]
    fn test_hour_rollover() {
        let mut clock = TimeSystem::starting_at(&settings(), GameDateTime::new(1, 7, 59));
        let events = clock.tick(1.0);
        let now = GameDateTime::new(1, 8, 0);
        assert_eq!(
            events,
            vec![TimeEvent::HourChanged(now), TimeEvent::MinuteChanged(now)]
        );
    }

    #[test]
    fn test_midnight_rolls_day() {
        let mut clock = TimeSystem::starting_at(&settings(), GameDateTime::new(1, 23, 59));
        let events = clock.tick(1.0);
        let now = GameDateTime::new(2, 0, 0);
        assert_eq!(events[0], TimeEvent::NewDay(now));
        assert_eq!(clock.now(), now);
        assert_eq!(now.weekday(), Weekday::Tuesday);
    }

    #[test]
    fn test_pause_and_bad_dt_ignored() {
        let mut clock = TimeSystem::new(&settings());
        clock.set_paused(true);
        assert!(clock.tick(10.0).is_empty());
        clock.set_paused(false);
        assert!(clock.tick(f32::NAN).is_empty());
        assert!(clock.tick(-5.0).is_empty());
        assert_eq!(clock.now(), GameDateTime::new(1, 7, 0));
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut clock = TimeSystem::new(&settings());
        clock.set_speed(1000.0);
        assert_eq!(clock.speed(), TimeSystem::MAX_SPEED);
        clock.set_speed(0.0);
        assert_eq!(clock.speed(), TimeSystem::MIN_SPEED);
    }

    #[test]
    fn test_large_tick_is_capped() {
        let mut clock = TimeSystem::new(&settings());
        let events = clock.tick(10_000.0);
        let minutes = events
            .iter()
            .filter(|e| matches!(e, TimeEvent::MinuteChanged(_)))
            .count();
        assert_eq!(minutes as u32, MAX_MINUTES_PER_TICK);
    }

    #[test]
    fn test_sleep_until_morning() {
        let mut clock = TimeSystem::starting_at(&settings(), GameDateTime::new(3, 22, 15));
        let events = clock.sleep_until_morning();
        assert_eq!(events[0], TimeEvent::NewDay(GameDateTime::new(4, 7, 0)));
        assert_eq!(clock.now(), GameDateTime::new(4, 7, 0));
    }

    #[test]
    fn test_sleep_before_dawn_stays_on_same_day() {
        let mut clock = TimeSystem::starting_at(&settings(), GameDateTime::new(2, 1, 0));
        let events = clock.sleep_until_morning();
        let wake = GameDateTime::new(2, 7, 0);
        assert_eq!(clock.now(), wake);
        assert_eq!(
            events,
            vec![TimeEvent::HourChanged(wake), TimeEvent::MinuteChanged(wake)]
        );
    }

    #[test]
    fn test_day_phase_and_display() {
        let t = GameDateTime::new(2, 9, 5);
        assert_eq!(t.day_phase(), DayPhase::Morning);
        assert_eq!(t.to_string(), "Day 2 09:05");
        assert_eq!(GameDateTime::new(1, 22, 0).day_phase(), DayPhase::Night);
        assert!(GameDateTime::new(6, 12, 0).weekday().is_weekend());
    }

    #[test]
    fn test_total_minutes_inverse() {
        let t = GameDateTime::new(5, 13, 47);
        assert_eq!(GameDateTime::from_total_minutes(t.total_minutes()), t);
    }
}
