//! Game settings and balance tunables
//!
//! Loaded from a JSON file when one is given. The file's `difficulty` picks
//! the base values, and any other field it names is laid over them, so a
//! config only needs to name what it changes.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GameError, Result};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Relaxed,
    #[default]
    Standard,
    Hectic,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Relaxed => "Relaxed",
            DifficultyPreset::Standard => "Standard",
            DifficultyPreset::Hectic => "Hectic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(DifficultyPreset::Relaxed),
            "standard" | "normal" => Some(DifficultyPreset::Standard),
            "hectic" | "hard" => Some(DifficultyPreset::Hectic),
            _ => None,
        }
    }

    /// Appointments offered per day
    pub fn appointments_per_day(&self) -> u32 {
        match self {
            DifficultyPreset::Relaxed => 3,
            DifficultyPreset::Standard => 4,
            DifficultyPreset::Hectic => 6,
        }
    }

    /// Multiplier applied to rhythm timing windows
    pub fn timing_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Relaxed => 1.4,
            DifficultyPreset::Standard => 1.0,
            DifficultyPreset::Hectic => 0.8,
        }
    }

    /// Multiplier applied to ball speeds
    pub fn ball_speed_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Relaxed => 0.8,
            DifficultyPreset::Standard => 1.0,
            DifficultyPreset::Hectic => 1.2,
        }
    }
}

/// In-game clock tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    /// Real seconds per in-game minute
    pub seconds_per_game_minute: f32,
    /// Hour the working day opens (and sleeping wakes you)
    pub day_start_hour: u32,
    /// Hour the working day closes
    pub day_end_hour: u32,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            seconds_per_game_minute: 0.5,
            day_start_hour: 7,
            day_end_hour: 21,
        }
    }
}

/// Appointment generation and reward tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentSettings {
    pub appointments_per_day: u32,
    pub min_window_minutes: u32,
    pub max_window_minutes: u32,
    pub base_reward_cash: u32,
    pub base_reward_xp: u32,
    /// Reputation gained for a completed session
    pub completed_reputation: i32,
    /// Reputation lost for a missed appointment
    pub missed_reputation_penalty: i32,
    /// Reputation lost for a failed session
    pub failed_reputation_penalty: i32,
    /// Places sessions can be booked at
    pub locations: Vec<String>,
}

impl Default for AppointmentSettings {
    fn default() -> Self {
        Self {
            appointments_per_day: DifficultyPreset::Standard.appointments_per_day(),
            min_window_minutes: 60,
            max_window_minutes: 120,
            base_reward_cash: 40,
            base_reward_xp: 30,
            completed_reputation: 3,
            missed_reputation_penalty: 5,
            failed_reputation_penalty: 2,
            locations: vec![
                "Riverside Park".to_string(),
                "Town Square".to_string(),
                "Hillside Courts".to_string(),
                "Beach Promenade".to_string(),
            ],
        }
    }
}

/// Hand-off script timings (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoverSettings {
    /// Each dialogue line auto-advances after this long
    pub line_seconds: f32,
    /// Confirmation happens automatically after this long
    pub confirm_timeout: f32,
    /// Pause between confirmation and the actual transfer
    pub transfer_delay: f32,
}

impl Default for HandoverSettings {
    fn default() -> Self {
        Self {
            line_seconds: 2.5,
            confirm_timeout: 6.0,
            transfer_delay: 1.5,
        }
    }
}

/// Rhythm mini-game tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmSettings {
    pub bpm: f32,
    /// Song length in beats
    pub song_beats: u32,
    pub lanes: u8,
    /// Lead-in before the first beat (seconds)
    pub lead_in: f32,
    /// Half-width of the Perfect window (seconds)
    pub perfect_window: f32,
    /// Half-width of the Good window (seconds)
    pub good_window: f32,
}

impl Default for RhythmSettings {
    fn default() -> Self {
        Self {
            bpm: 100.0,
            song_beats: 32,
            lanes: 4,
            lead_in: 2.0,
            perfect_window: 0.05,
            good_window: 0.12,
        }
    }
}

/// Paddle mini-game tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleSettings {
    pub ball_start_speed: f32,
    /// Minimum ball speed (wall losses can't slow it below this)
    pub ball_min_speed: f32,
    pub ball_max_speed: f32,
    /// Fraction of speed kept on a side-wall bounce
    pub wall_restitution: f32,
    /// Player paddle speed (units/s)
    pub paddle_speed: f32,
    /// Coach paddle speed (units/s)
    pub coach_speed: f32,
    /// Maximum aiming error of the coach paddle (units)
    pub coach_aim_error: f32,
    /// Balls the player may lose before the session ends
    pub balls: u8,
    /// Returns that complete the session
    pub target_returns: u32,
}

impl Default for PaddleSettings {
    fn default() -> Self {
        Self {
            ball_start_speed: 220.0,
            ball_min_speed: 160.0,
            ball_max_speed: 420.0,
            wall_restitution: 0.9,
            paddle_speed: 360.0,
            coach_speed: 240.0,
            coach_aim_error: 18.0,
            balls: 3,
            target_returns: 12,
        }
    }
}

/// Player economy and progression tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub starting_cash: u32,
    pub starting_reputation: i32,
    pub max_energy: u32,
    /// Energy each session costs
    pub session_energy_cost: u32,
    pub max_skill_level: u32,
    /// XP needed for level 1 → 2; later levels grow as level^1.5
    pub xp_base: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            starting_cash: 100,
            starting_reputation: 20,
            max_energy: 100,
            session_energy_cost: 20,
            max_skill_level: 10,
            xp_base: 50,
        }
    }
}

/// All game tunables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: DifficultyPreset,
    pub time: TimeSettings,
    pub appointments: AppointmentSettings,
    pub handover: HandoverSettings,
    pub rhythm: RhythmSettings,
    pub paddle: PaddleSettings,
    pub player: PlayerSettings,
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset defaults)
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates preset-dependent settings)
    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        self.difficulty = preset;
        self.appointments.appointments_per_day = preset.appointments_per_day();

        let base_rhythm = RhythmSettings::default();
        self.rhythm.perfect_window = base_rhythm.perfect_window * preset.timing_scale();
        self.rhythm.good_window = base_rhythm.good_window * preset.timing_scale();

        let base_paddle = PaddleSettings::default();
        let scale = preset.ball_speed_scale();
        self.paddle.ball_start_speed = base_paddle.ball_start_speed * scale;
        self.paddle.ball_min_speed = base_paddle.ball_min_speed * scale;
        self.paddle.ball_max_speed = base_paddle.ball_max_speed * scale;
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        let difficulty = match overrides.get("difficulty") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => DifficultyPreset::default(),
        };

        let mut merged = serde_json::to_value(Self::from_preset(difficulty))?;
        merge_json(&mut merged, overrides);
        let settings: Settings = serde_json::from_value(merged)?;
        Ok(settings.sanitized())
    }

    /// Load settings from a JSON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(GameError::SettingsIo {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| GameError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Repair values that would break the simulation
    pub fn sanitized(mut self) -> Self {
        let t = &mut self.time;
        if !(t.seconds_per_game_minute > 0.0) {
            log::warn!("seconds_per_game_minute must be positive, using default");
            t.seconds_per_game_minute = TimeSettings::default().seconds_per_game_minute;
        }
        t.day_start_hour = t.day_start_hour.min(23);
        t.day_end_hour = t.day_end_hour.clamp(t.day_start_hour + 1, 24);

        let a = &mut self.appointments;
        a.min_window_minutes = a.min_window_minutes.max(15);
        a.max_window_minutes = a.max_window_minutes.max(a.min_window_minutes);
        if a.locations.is_empty() {
            log::warn!("No appointment locations configured, using defaults");
            a.locations = AppointmentSettings::default().locations;
        }

        let r = &mut self.rhythm;
        r.lanes = r.lanes.clamp(1, 8);
        r.bpm = r.bpm.clamp(30.0, 300.0);
        r.song_beats = r.song_beats.max(1);
        if r.good_window < r.perfect_window {
            r.good_window = r.perfect_window;
        }

        let p = &mut self.paddle;
        p.ball_min_speed = p.ball_min_speed.max(1.0);
        p.ball_max_speed = p.ball_max_speed.max(p.ball_min_speed);
        p.wall_restitution = crate::clamp_f32(p.wall_restitution, 0.0, 1.0);
        p.balls = p.balls.max(1);
        p.target_returns = p.target_returns.max(1);

        self.player.max_skill_level = self.player.max_skill_level.max(1);
        self.player.xp_base = self.player.xp_base.max(1);
        self
    }
}

/// Lay `overrides` over `base`, recursing into objects
fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
