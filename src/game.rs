//! Game context
//!
//! Owns every piece of simulation state and routes events between them:
//! clock events expire and regenerate appointments, arriving at a booked
//! location starts the hand-off, a finished hand-off starts the session's
//! mini-game, and a finished mini-game pays out.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::error::{GameError, Result};
use crate::minigame::{
    MiniGameKind, MiniGameResult, PaddleEvent, PaddleGame, PaddleInput, PaddleModifiers, RhythmEvent,
    RhythmGame, RhythmInput,
};
use crate::records::Records;
use crate::settings::Settings;
use crate::sim::{
    AppointmentData, AppointmentId, AppointmentManager, DaySummary, Discipline, GameDateTime, HandoverEvent,
    HandoverInput, HandoverSequence, Perk, Progression, SpecialistField, TimeEvent, TimeSystem,
};

/// Input gathered for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Advance dialogue / confirm
    pub interact: bool,
    /// Back out of a hand-off
    pub cancel: bool,
    /// Rhythm lanes pressed
    pub lanes: Vec<u8>,
    /// Paddle target x
    pub paddle_target: Option<f32>,
    pub launch: bool,
    pub pause_minigame: bool,
    /// Let mini-games play themselves
    pub autoplay: bool,

    // === Developer time controls ===
    pub toggle_clock: bool,
    pub skip_hour: bool,
    pub clock_speed: Option<f32>,
}

/// What the player is currently doing
#[derive(Debug, Clone)]
pub enum Activity {
    /// Free to move around and book appointments
    Roaming,
    Handover(HandoverSequence),
    Rhythm {
        appointment: AppointmentId,
        game: RhythmGame,
    },
    Paddle {
        appointment: AppointmentId,
        game: PaddleGame,
    },
}

impl Activity {
    pub fn is_roaming(&self) -> bool {
        matches!(self, Activity::Roaming)
    }
}

/// Rewards paid for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReward {
    pub cash: u32,
    pub xp: u32,
    pub reputation: i32,
    pub levels_gained: u32,
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Time(TimeEvent),
    DayEnded(DaySummary),
    AppointmentsOffered(usize),
    AppointmentMissed(AppointmentId),
    /// Arrived on time; the hand-off begins
    SessionStarted {
        appointment: AppointmentId,
        discipline: Discipline,
    },
    /// Booked session is ready but the player lacks the energy to run it
    SessionBlocked {
        appointment: AppointmentId,
        needed: u32,
        available: u32,
    },
    Handover(HandoverEvent),
    MiniGameStarted(MiniGameKind),
    Rhythm(RhythmEvent),
    Paddle(PaddleEvent),
    SessionCompleted {
        appointment: AppointmentId,
        result: MiniGameResult,
        reward: SessionReward,
    },
    SessionFailed {
        appointment: AppointmentId,
        result: MiniGameResult,
    },
    NewRecord {
        kind: MiniGameKind,
        rank: usize,
    },
}

/// The whole game
#[derive(Debug, Clone)]
pub struct Game {
    pub settings: Settings,
    pub time: TimeSystem,
    pub appointments: AppointmentManager,
    pub progression: Progression,
    pub records: Records,
    pub activity: Activity,
    /// Where the player is standing
    pub location: Option<String>,
    seed: u64,
    rng: Pcg32,
    accumulator: f32,
    /// Input waiting for the next substep; one-shots stay set until consumed
    pending: FrameInput,
    /// Mini-games started so far, mixed into their seeds
    sessions_started: u64,
}

impl Game {
    pub fn new(seed: u64, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let mut game = Self {
            time: TimeSystem::new(&settings.time),
            appointments: AppointmentManager::new(),
            progression: Progression::new(&settings.player),
            records: Records::new(),
            activity: Activity::Roaming,
            location: None,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            accumulator: 0.0,
            pending: FrameInput::default(),
            sessions_started: 0,
            settings,
        };
        let day = game.time.now().day;
        game.offer_appointments(day);
        log::info!("New game (seed {}) starting {}", seed, game.time.now());
        game
    }

    pub fn now(&self) -> GameDateTime {
        self.time.now()
    }

    /// Advance by `real_dt` seconds of wall time
    pub fn update(&mut self, real_dt: f32, input: &FrameInput) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if input.toggle_clock {
            let paused = self.time.is_paused();
            self.time.set_paused(!paused);
        }
        if let Some(speed) = input.clock_speed {
            self.time.set_speed(speed);
        }
        if input.skip_hour {
            let time_events = self.time.skip_minutes(MINUTES_PER_HOUR);
            self.handle_time_events(time_events, &mut events);
        }

        self.queue_input(input);

        let dt = if real_dt.is_finite() { real_dt.clamp(0.0, 0.25) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.pending.clone();
            self.step(&input, &mut events);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.pending.interact = false;
            self.pending.cancel = false;
            self.pending.lanes.clear();
            self.pending.launch = false;
            self.pending.pause_minigame = false;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        events
    }

    /// Fold this frame's input into what the next substep will see. Presses
    /// accumulate until a substep runs; held state is replaced.
    fn queue_input(&mut self, input: &FrameInput) {
        let pending = &mut self.pending;
        pending.interact |= input.interact;
        pending.cancel |= input.cancel;
        pending.lanes.extend_from_slice(&input.lanes);
        pending.launch |= input.launch;
        pending.pause_minigame |= input.pause_minigame;
        pending.paddle_target = input.paddle_target;
        pending.autoplay = input.autoplay;
    }

    fn step(&mut self, input: &FrameInput, events: &mut Vec<GameEvent>) {
        // The clock stops while a mini-game is being played
        let in_minigame = matches!(self.activity, Activity::Rhythm { .. } | Activity::Paddle { .. });
        if !in_minigame {
            let time_events = self.time.tick(SIM_DT);
            self.handle_time_events(time_events, events);
        }

        match &mut self.activity {
            Activity::Roaming => self.try_start_session(events),
            Activity::Handover(seq) => {
                let handover_input = HandoverInput {
                    advance: input.interact,
                    cancel: input.cancel,
                };
                let handover_events = seq.tick(SIM_DT, &handover_input);
                let appointment = seq.appointment_id;
                let mut done = false;
                let mut cancelled = false;
                for e in handover_events {
                    done |= e == HandoverEvent::Done;
                    cancelled |= e == HandoverEvent::Cancelled;
                    events.push(GameEvent::Handover(e));
                }
                if cancelled {
                    if let Err(e) = self.appointments.revert(appointment) {
                        log::warn!("Could not revert #{}: {}", appointment, e);
                    }
                    let stats = &mut self.progression.stats;
                    stats.energy = (stats.energy + self.settings.player.session_energy_cost).min(stats.max_energy);
                    self.activity = Activity::Roaming;
                    self.location = None;
                } else if done {
                    self.start_minigame(appointment, events);
                }
            }
            Activity::Rhythm { appointment, game } => {
                let rhythm_input = RhythmInput {
                    presses: input.lanes.clone(),
                    autoplay: input.autoplay,
                };
                let appointment = *appointment;
                let mut finished = None;
                for e in game.tick(&rhythm_input, SIM_DT) {
                    if let RhythmEvent::Finished(r) = &e {
                        finished = Some(MiniGameResult::Rhythm(*r));
                    }
                    events.push(GameEvent::Rhythm(e));
                }
                if let Some(result) = finished {
                    self.finish_session(appointment, result, events);
                }
            }
            Activity::Paddle { appointment, game } => {
                let paddle_input = PaddleInput {
                    target_x: input.paddle_target,
                    launch: input.launch,
                    pause: input.pause_minigame,
                    autoplay: input.autoplay,
                };
                let appointment = *appointment;
                let mut finished = None;
                for e in game.tick(&paddle_input, SIM_DT) {
                    if let PaddleEvent::Finished(r) = &e {
                        finished = Some(MiniGameResult::Paddle(*r));
                    }
                    events.push(GameEvent::Paddle(e));
                }
                if let Some(result) = finished {
                    self.finish_session(appointment, result, events);
                }
            }
        }
    }

    fn handle_time_events(&mut self, time_events: Vec<TimeEvent>, events: &mut Vec<GameEvent>) {
        let grace = self.progression.grace_minutes();
        for te in time_events {
            match te {
                TimeEvent::NewDay(now) => {
                    let summary = self.appointments.on_new_day(now.day - 1);
                    log::info!(
                        "Day {} done: {} completed, {} missed, {} failed, ${} earned",
                        summary.day,
                        summary.completed,
                        summary.missed,
                        summary.failed,
                        summary.cash_earned
                    );
                    events.push(GameEvent::DayEnded(summary));
                    self.offer_appointments(now.day);
                    events.push(GameEvent::AppointmentsOffered(self.appointments.available().len()));
                }
                TimeEvent::MinuteChanged(now) => {
                    for missed in self.appointments.on_time(now, grace) {
                        self.progression
                            .stats
                            .adjust_reputation(-self.settings.appointments.missed_reputation_penalty);
                        events.push(GameEvent::AppointmentMissed(missed.id));
                    }
                }
                TimeEvent::HourChanged(_) => {}
            }
            events.push(GameEvent::Time(te));
        }
    }

    fn offer_appointments(&mut self, day: u32) {
        let reputation = self.progression.stats.reputation_factor();
        self.appointments.generate_for_day(
            day,
            &mut self.rng,
            reputation,
            &self.settings.appointments,
            &self.settings.time,
        );
    }

    /// Book an offered appointment
    pub fn accept_appointment(&mut self, id: AppointmentId) -> Result<&AppointmentData> {
        self.appointments.accept(id)
    }

    pub fn decline_appointment(&mut self, id: AppointmentId) -> Result<AppointmentData> {
        self.appointments.decline(id)
    }

    /// Move the player; a booked session there may start on the next step.
    /// Refuses to go if a session is ready there and the player is too tired
    /// to run it.
    pub fn travel_to(&mut self, location: &str) -> Result<()> {
        if !self.activity.is_roaming() {
            return Err(GameError::Busy);
        }
        let grace = self.progression.grace_minutes();
        if self.appointments.find_ready(location, self.time.now(), grace).is_some() {
            self.check_energy()?;
        }
        log::debug!("Travelling to {}", location);
        self.location = Some(location.to_string());
        Ok(())
    }

    /// End the day early; restores energy
    pub fn sleep(&mut self) -> Result<Vec<GameEvent>> {
        if !self.activity.is_roaming() {
            return Err(GameError::Busy);
        }
        let mut events = Vec::new();
        let time_events = self.time.sleep_until_morning();
        // Bookings whose window closed overnight are missed
        let grace = self.progression.grace_minutes();
        for missed in self.appointments.on_time(self.time.now(), grace) {
            self.progression
                .stats
                .adjust_reputation(-self.settings.appointments.missed_reputation_penalty);
            events.push(GameEvent::AppointmentMissed(missed.id));
        }
        self.handle_time_events(time_events, &mut events);
        self.progression.stats.restore_energy();
        Ok(events)
    }

    pub fn unlock_perk(&mut self, perk: Perk) -> Result<()> {
        self.progression.unlock(perk)
    }

    fn check_energy(&self) -> Result<()> {
        let needed = self.settings.player.session_energy_cost;
        let available = self.progression.stats.energy;
        if needed > available {
            return Err(GameError::InsufficientEnergy { needed, available });
        }
        Ok(())
    }

    fn try_start_session(&mut self, events: &mut Vec<GameEvent>) {
        let Some(location) = self.location.as_deref() else {
            return;
        };
        let grace = self.progression.grace_minutes();
        let Some(appt) = self.appointments.find_ready(location, self.time.now(), grace) else {
            return;
        };
        let appt = appt.clone();

        if let Err(e) = self.start_handover(&appt) {
            log::warn!("Can't start session #{}: {}", appt.id, e);
            // Leave so the next arrival retries instead of every step
            self.location = None;
            if let GameError::InsufficientEnergy { needed, available } = e {
                events.push(GameEvent::SessionBlocked {
                    appointment: appt.id,
                    needed,
                    available,
                });
            }
            return;
        }
        log::info!("Meeting {} at {} for #{}", appt.client, appt.location, appt.id);
        events.push(GameEvent::SessionStarted {
            appointment: appt.id,
            discipline: appt.discipline,
        });
    }

    fn start_handover(&mut self, appt: &AppointmentData) -> Result<()> {
        self.check_energy()?;
        let cost = self.settings.player.session_energy_cost;
        self.progression.stats.drain_energy(cost)?;
        if let Err(e) = self.appointments.begin(appt.id) {
            self.progression.stats.energy += cost;
            return Err(e);
        }
        let seq = HandoverSequence::new(
            appt,
            &self.settings.handover,
            self.progression.handover_delay_scale(),
        );
        self.activity = Activity::Handover(seq);
        Ok(())
    }

    fn start_minigame(&mut self, appointment: AppointmentId, events: &mut Vec<GameEvent>) {
        let Some(appt) = self.appointments.get(appointment) else {
            log::warn!("Hand-off finished for unknown appointment #{}", appointment);
            self.activity = Activity::Roaming;
            return;
        };
        self.sessions_started += 1;
        let seed = self.seed ^ (self.sessions_started.wrapping_mul(0x9E37_79B9_7F4A_7C15));

        let (activity, kind) = match appt.discipline {
            Discipline::Dog => (
                Activity::Rhythm {
                    appointment,
                    game: RhythmGame::new(
                        seed,
                        &self.settings.rhythm,
                        self.progression.rhythm_window_scale(),
                    ),
                },
                MiniGameKind::Rhythm,
            ),
            Discipline::Tennis => (
                Activity::Paddle {
                    appointment,
                    game: PaddleGame::new(
                        seed,
                        &self.settings.paddle,
                        PaddleModifiers {
                            width_scale: self.progression.paddle_width_scale(),
                            speed_scale: self.progression.paddle_speed_scale(),
                        },
                    ),
                },
                MiniGameKind::Paddle,
            ),
        };
        log::info!("Starting {:?} session for #{}", kind, appointment);
        self.activity = activity;
        events.push(GameEvent::MiniGameStarted(kind));
    }

    fn finish_session(&mut self, appointment: AppointmentId, result: MiniGameResult, events: &mut Vec<GameEvent>) {
        self.activity = Activity::Roaming;
        self.location = None;

        if result.is_failure() {
            match self.appointments.fail(appointment) {
                Ok(_) => {
                    self.progression
                        .stats
                        .adjust_reputation(-self.settings.appointments.failed_reputation_penalty);
                    log::info!("Session #{} failed", appointment);
                    events.push(GameEvent::SessionFailed { appointment, result });
                }
                Err(e) => log::warn!("Could not fail #{}: {}", appointment, e),
            }
            return;
        }

        let appt = match self.appointments.complete(appointment) {
            Ok(appt) => appt,
            Err(e) => {
                log::warn!("Could not complete #{}: {}", appointment, e);
                return;
            }
        };

        let reward = self.pay_out(&appt, &result);
        log::info!(
            "Session #{} with {} complete: ${}, {} xp",
            appointment,
            appt.trainee,
            reward.cash,
            reward.xp
        );
        events.push(GameEvent::SessionCompleted {
            appointment,
            result,
            reward,
        });

        let day = self.time.now().day;
        if let Some(rank) = self.records.record(result.kind(), result.score(), day, &appt.trainee) {
            events.push(GameEvent::NewRecord {
                kind: result.kind(),
                rank,
            });
        }
    }

    /// Apply rewards for a completed session
    fn pay_out(&mut self, appt: &AppointmentData, result: &MiniGameResult) -> SessionReward {
        let performance = result.performance();
        let cash = (appt.reward_cash as f32 * performance * self.progression.reward_multiplier()).round() as u32;
        let xp = (appt.reward_xp as f32 * (0.5 + performance)).round() as u32;

        // XP splits between the discipline's two fields
        let [first, second]: [SpecialistField; 2] = appt.discipline.fields();
        let mut levels_gained = self.progression.grant_xp(first, xp / 2 + xp % 2);
        levels_gained += self.progression.grant_xp(second, xp / 2);

        let reputation = self.settings.appointments.completed_reputation;
        self.progression.stats.earn(cash);
        self.progression.stats.adjust_reputation(reputation);

        SessionReward {
            cash,
            xp,
            reputation,
            levels_gained,
        }
    }
}
