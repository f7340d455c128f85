//! Hand-off sequence
//!
//! The scripted meeting where the client hands their dog (or student) over
//! to the player: dialogue, confirmation, a short delay, then the transfer.
//! Each step is an explicit timer advanced by `tick`.

use serde::{Deserialize, Serialize};

use super::appointment::AppointmentData;
use super::progression::Discipline;
use crate::settings::HandoverSettings;

/// What the client NPC is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientState {
    Waiting,
    Talking,
    HandingOver,
    Leaving,
}

/// Who the dog / student is with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraineeState {
    WithClient,
    Transferring,
    WithPlayer,
}

/// Where the script currently is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HandoverPhase {
    /// Showing dialogue line `line`
    Dialogue { line: usize, timer: f32 },
    /// All lines shown, waiting for the player to confirm
    AwaitConfirm { timer: f32 },
    /// Confirmed, counting down to the transfer
    Delay { timer: f32 },
    Done,
    Cancelled,
}

/// Player input relevant to the hand-off
#[derive(Debug, Clone, Copy, Default)]
pub struct HandoverInput {
    /// Skip the current line / confirm
    pub advance: bool,
    pub cancel: bool,
}

/// Notifications for whoever presents the hand-off
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoverEvent {
    LineShown { index: usize, text: String },
    AwaitingConfirm,
    Confirmed,
    Transferred,
    Done,
    Cancelled,
}

/// One running hand-off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoverSequence {
    pub appointment_id: u32,
    pub lines: Vec<String>,
    pub phase: HandoverPhase,
    pub client: ClientState,
    pub trainee: TraineeState,
    line_seconds: f32,
    confirm_timeout: f32,
    transfer_delay: f32,
    /// Set until the first tick has announced line 0
    #[serde(skip)]
    announced_first: bool,
}

impl HandoverSequence {
    /// Start a hand-off for an appointment; `delay_scale` shortens the
    /// transfer delay for experienced handlers
    pub fn new(appt: &AppointmentData, settings: &HandoverSettings, delay_scale: f32) -> Self {
        Self::with_lines(appt.id, script_for(appt), settings, delay_scale)
    }

    pub fn with_lines(
        appointment_id: u32,
        lines: Vec<String>,
        settings: &HandoverSettings,
        delay_scale: f32,
    ) -> Self {
        let phase = if lines.is_empty() {
            HandoverPhase::AwaitConfirm { timer: 0.0 }
        } else {
            HandoverPhase::Dialogue { line: 0, timer: 0.0 }
        };
        Self {
            appointment_id,
            lines,
            phase,
            client: ClientState::Talking,
            trainee: TraineeState::WithClient,
            line_seconds: settings.line_seconds,
            confirm_timeout: settings.confirm_timeout,
            transfer_delay: settings.transfer_delay * delay_scale.max(0.0),
            announced_first: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, HandoverPhase::Done | HandoverPhase::Cancelled)
    }

    /// Text of the line currently on screen
    pub fn current_line(&self) -> Option<&str> {
        match self.phase {
            HandoverPhase::Dialogue { line, .. } => self.lines.get(line).map(String::as_str),
            _ => None,
        }
    }

    /// Advance the script by `dt` seconds
    pub fn tick(&mut self, dt: f32, input: &HandoverInput) -> Vec<HandoverEvent> {
        let mut events = Vec::new();
        if self.is_finished() {
            return events;
        }

        if input.cancel && !matches!(self.phase, HandoverPhase::Delay { .. }) {
            self.cancel(&mut events);
            return events;
        }

        if !self.announced_first {
            self.announced_first = true;
            match self.phase {
                HandoverPhase::Dialogue { line, .. } => events.push(HandoverEvent::LineShown {
                    index: line,
                    text: self.lines[line].clone(),
                }),
                HandoverPhase::AwaitConfirm { .. } => events.push(HandoverEvent::AwaitingConfirm),
                _ => {}
            }
        }

        match self.phase {
            HandoverPhase::Dialogue { line, timer } => {
                let timer = timer + dt;
                if input.advance || timer >= self.line_seconds {
                    let next = line + 1;
                    if next < self.lines.len() {
                        self.phase = HandoverPhase::Dialogue { line: next, timer: 0.0 };
                        events.push(HandoverEvent::LineShown {
                            index: next,
                            text: self.lines[next].clone(),
                        });
                    } else {
                        self.phase = HandoverPhase::AwaitConfirm { timer: 0.0 };
                        events.push(HandoverEvent::AwaitingConfirm);
                    }
                } else {
                    self.phase = HandoverPhase::Dialogue { line, timer };
                }
            }
            HandoverPhase::AwaitConfirm { timer } => {
                let timer = timer + dt;
                if input.advance || timer >= self.confirm_timeout {
                    self.client = ClientState::HandingOver;
                    self.trainee = TraineeState::Transferring;
                    self.phase = HandoverPhase::Delay { timer: 0.0 };
                    events.push(HandoverEvent::Confirmed);
                } else {
                    self.phase = HandoverPhase::AwaitConfirm { timer };
                }
            }
            HandoverPhase::Delay { timer } => {
                let timer = timer + dt;
                if timer >= self.transfer_delay {
                    // Both actors change together
                    self.client = ClientState::Leaving;
                    self.trainee = TraineeState::WithPlayer;
                    self.phase = HandoverPhase::Done;
                    log::debug!("Hand-off for #{} complete", self.appointment_id);
                    events.push(HandoverEvent::Transferred);
                    events.push(HandoverEvent::Done);
                } else {
                    self.phase = HandoverPhase::Delay { timer };
                }
            }
            HandoverPhase::Done | HandoverPhase::Cancelled => {}
        }

        events
    }

    fn cancel(&mut self, events: &mut Vec<HandoverEvent>) {
        self.client = ClientState::Waiting;
        self.trainee = TraineeState::WithClient;
        self.phase = HandoverPhase::Cancelled;
        log::info!("Hand-off for #{} cancelled", self.appointment_id);
        events.push(HandoverEvent::Cancelled);
    }
}

/// Dialogue the client says before handing over
fn script_for(appt: &AppointmentData) -> Vec<String> {
    match appt.discipline {
        Discipline::Dog => vec![
            format!("{}: Oh good, you made it! This is {}.", appt.client, appt.trainee),
            format!("{}: {} pulls a bit on the lead, so go easy.", appt.client, appt.trainee),
            format!("{}: I'll be back in a while. Be good, {}!", appt.client, appt.trainee),
        ],
        Discipline::Tennis => vec![
            format!("{}: Hi coach! {} has been practising all week.", appt.client, appt.trainee),
            format!("{}: Mostly the forehand. The backhand... less so.", appt.client),
            format!("{}: I'll wait by the fence.", appt.client),
        ],
    }
}
