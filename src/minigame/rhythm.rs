//! Rhythm mini-game played during dog-handling sessions
//!
//! Commands scroll down a handful of lanes in time with the music; pressing
//! a lane close enough to a note's beat scores it. Timing windows widen as
//! the handler's Obedience skill grows.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::RhythmSettings;

/// How well a note was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Judgement {
    Perfect,
    Good,
    Miss,
}

impl Judgement {
    pub fn base_score(&self) -> u64 {
        match self {
            Judgement::Perfect => 300,
            Judgement::Good => 100,
            Judgement::Miss => 0,
        }
    }
}

/// A single note in the chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u32,
    /// Song time of the beat (seconds)
    pub time: f32,
    pub lane: u8,
    pub judgement: Option<Judgement>,
    /// Timing error the autoplayer will make on this note
    #[serde(skip)]
    autoplay_offset: f32,
}

/// Letter grade for a finished song
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    F,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct RhythmInput {
    /// Lanes pressed this tick
    pub presses: Vec<u8>,
    /// Let the game press for you
    pub autoplay: bool,
}

/// Things that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum RhythmEvent {
    Judged {
        note_id: u32,
        lane: u8,
        judgement: Judgement,
        /// Press time minus note time (negative = early)
        offset: f32,
    },
    /// A press with no note near it
    Stray { lane: u8 },
    Finished(RhythmResult),
}

/// How the song went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RhythmResult {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub stray: u32,
    pub max_combo: u32,
    pub score: u64,
    pub total_notes: u32,
}

impl RhythmResult {
    /// Perfect counts 1, Good counts 0.5
    pub fn accuracy(&self) -> f32 {
        if self.total_notes == 0 {
            return 1.0;
        }
        (self.perfect as f32 + 0.5 * self.good as f32) / self.total_notes as f32
    }

    pub fn grade(&self) -> Grade {
        let acc = self.accuracy();
        if acc >= 0.95 && self.miss == 0 {
            Grade::S
        } else if acc >= 0.85 {
            Grade::A
        } else if acc >= 0.7 {
            Grade::B
        } else if acc >= 0.5 {
            Grade::C
        } else {
            Grade::F
        }
    }
}

/// Combo multiplier cap
const MAX_MULTIPLIER: f32 = 4.0;

/// Complete rhythm game state
#[derive(Debug, Clone)]
pub struct RhythmGame {
    pub chart: Vec<Note>,
    pub song_time: f32,
    pub combo: u32,
    pub lanes: u8,
    perfect_window: f32,
    good_window: f32,
    result: RhythmResult,
    finished: bool,
}

impl RhythmGame {
    /// Build a song from a seed; `window_scale` widens the timing windows
    pub fn new(seed: u64, settings: &RhythmSettings, window_scale: f32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let scale = window_scale.max(0.1);
        let perfect_window = settings.perfect_window * scale;
        let good_window = (settings.good_window * scale).max(perfect_window);
        let chart = generate_chart(&mut rng, settings, good_window);
        Self::with_chart(chart, settings.lanes, perfect_window, good_window)
    }

    /// Build a game from an explicit chart (sorted by time)
    pub fn with_chart(mut chart: Vec<Note>, lanes: u8, perfect_window: f32, good_window: f32) -> Self {
        chart.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.id.cmp(&b.id)));
        let result = RhythmResult {
            total_notes: chart.len() as u32,
            ..Default::default()
        };
        Self {
            chart,
            song_time: 0.0,
            combo: 0,
            lanes: lanes.max(1),
            perfect_window,
            good_window,
            result,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn result(&self) -> RhythmResult {
        self.result
    }

    pub fn windows(&self) -> (f32, f32) {
        (self.perfect_window, self.good_window)
    }

    /// Song time after which nothing is left to judge
    pub fn end_time(&self) -> f32 {
        self.chart.last().map(|n| n.time).unwrap_or(0.0) + self.good_window
    }

    /// Advance the song by `dt` seconds
    pub fn tick(&mut self, input: &RhythmInput, dt: f32) -> Vec<RhythmEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.song_time += dt.max(0.0);

        let presses = if input.autoplay {
            self.autoplay_presses()
        } else {
            input.presses.clone()
        };
        for lane in presses {
            self.press(lane, &mut events);
        }

        // Anything too far in the past is a miss
        let late = self.song_time - self.good_window;
        for i in 0..self.chart.len() {
            let note = &self.chart[i];
            if note.time >= late {
                break;
            }
            if note.judgement.is_none() {
                let (id, lane) = (note.id, note.lane);
                self.chart[i].judgement = Some(Judgement::Miss);
                self.result.miss += 1;
                self.combo = 0;
                events.push(RhythmEvent::Judged {
                    note_id: id,
                    lane,
                    judgement: Judgement::Miss,
                    offset: self.song_time - self.chart[i].time,
                });
            }
        }

        if self.song_time > self.end_time() && self.chart.iter().all(|n| n.judgement.is_some()) {
            self.finished = true;
            log::info!(
                "Song finished: score {}, accuracy {:.0}%, grade {:?}",
                self.result.score,
                self.result.accuracy() * 100.0,
                self.result.grade()
            );
            events.push(RhythmEvent::Finished(self.result));
        }

        events
    }

    fn press(&mut self, lane: u8, events: &mut Vec<RhythmEvent>) {
        if lane >= self.lanes {
            return;
        }
        let now = self.song_time;
        let target = self
            .chart
            .iter_mut()
            .find(|n| n.lane == lane && n.judgement.is_none());

        let Some(note) = target else {
            self.stray(lane, events);
            return;
        };

        let offset = now - note.time;
        let judgement = if offset.abs() <= self.perfect_window {
            Judgement::Perfect
        } else if offset.abs() <= self.good_window {
            Judgement::Good
        } else {
            self.stray(lane, events);
            return;
        };

        note.judgement = Some(judgement);
        let note_id = note.id;
        self.combo += 1;
        self.result.max_combo = self.result.max_combo.max(self.combo);
        let multiplier = (1.0 + (self.combo / 10) as f32).min(MAX_MULTIPLIER);
        self.result.score += (judgement.base_score() as f32 * multiplier) as u64;
        match judgement {
            Judgement::Perfect => self.result.perfect += 1,
            Judgement::Good => self.result.good += 1,
            Judgement::Miss => {}
        }
        events.push(RhythmEvent::Judged {
            note_id,
            lane,
            judgement,
            offset,
        });
    }

    fn stray(&mut self, lane: u8, events: &mut Vec<RhythmEvent>) {
        self.result.stray += 1;
        self.combo = 0;
        events.push(RhythmEvent::Stray { lane });
    }

    /// Lanes the autoplayer presses this tick
    fn autoplay_presses(&self) -> Vec<u8> {
        let mut lanes: Vec<u8> = Vec::new();
        let mut seen: Vec<u8> = Vec::new();
        for note in &self.chart {
            if note.time > self.song_time + self.good_window {
                break;
            }
            // Only the earliest open note in each lane can be pressed
            if note.judgement.is_some() || seen.contains(&note.lane) {
                continue;
            }
            seen.push(note.lane);
            if self.song_time >= note.time + note.autoplay_offset {
                lanes.push(note.lane);
            }
        }
        lanes
    }
}

/// Lay out notes on the beat, with occasional off-beat notes once the song
/// gets going
fn generate_chart(rng: &mut Pcg32, settings: &RhythmSettings, good_window: f32) -> Vec<Note> {
    let beat = 60.0 / settings.bpm;
    let lanes = settings.lanes.max(1);
    // Off-beats only when they can't be confused with their neighbours
    let offbeats_allowed = beat / 2.0 > 2.0 * good_window;

    let mut chart = Vec::new();
    let mut next_id = 0;
    let mut push = |time: f32, lane: u8, rng: &mut Pcg32| {
        chart.push(Note {
            id: next_id,
            time,
            lane,
            judgement: None,
            autoplay_offset: rng.random_range(-1.0f32..1.0) * good_window * 0.8,
        });
        next_id += 1;
    };

    for i in 0..settings.song_beats {
        let time = settings.lead_in + i as f32 * beat;
        let lane = rng.random_range(0..lanes);
        push(time, lane, rng);
        if offbeats_allowed && i >= 4 && rng.random_bool(0.3) {
            let lane = rng.random_range(0..lanes);
            push(time + beat / 2.0, lane, rng);
        }
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn note(id: u32, time: f32, lane: u8) -> Note {
        Note {
            id,
            time,
            lane,
            judgement: None,
            autoplay_offset: 0.0,
        }
    }

    fn simple() -> RhythmGame {
        RhythmGame::with_chart(vec![note(0, 1.0, 0), note(1, 2.0, 1)], 4, 0.05, 0.12)
    }

    fn advance_to(game: &mut RhythmGame, t: f32) {
        let dt = t - game.song_time;
        game.tick(&RhythmInput::default(), dt);
    }

    #[test]
    fn test_perfect_and_good() {
        let mut g = simple();
        advance_to(&mut g, 0.98);
        let events = g.tick(&RhythmInput { presses: vec![0], autoplay: false }, 0.0);
        assert!(matches!(
            events[0],
            RhythmEvent::Judged { judgement: Judgement::Perfect, .. }
        ));
        advance_to(&mut g, 2.1);
        let events = g.tick(&RhythmInput { presses: vec![1], autoplay: false }, 0.0);
        assert!(matches!(
            events[0],
            RhythmEvent::Judged { judgement: Judgement::Good, .. }
        ));
        assert_eq!(g.combo, 2);
    }

    #[test]
    fn test_press_far_from_note_is_stray() {
        let mut g = simple();
        advance_to(&mut g, 0.5);
        let events = g.tick(&RhythmInput { presses: vec![0], autoplay: false }, 0.0);
        assert_eq!(events, vec![RhythmEvent::Stray { lane: 0 }]);
        // The note is still there to be hit
        advance_to(&mut g, 1.0);
        let events = g.tick(&RhythmInput { presses: vec![0], autoplay: false }, 0.0);
        assert!(matches!(events[0], RhythmEvent::Judged { judgement: Judgement::Perfect, .. }));
    }

    #[test]
    fn test_unpressed_notes_miss_and_song_finishes() {
        let mut g = simple();
        let mut finished = None;
        for _ in 0..300 {
            for e in g.tick(&RhythmInput::default(), SIM_DT) {
                if let RhythmEvent::Finished(r) = e {
                    finished = Some(r);
                }
            }
        }
        let result = finished.expect("song should finish");
        assert_eq!(result.miss, 2);
        assert_eq!(result.grade(), Grade::F);
        assert!(g.is_finished());
    }

    #[test]
    fn test_combo_multiplier() {
        let chart = (0..12).map(|i| note(i, 1.0 + i as f32, 0)).collect();
        let mut g = RhythmGame::with_chart(chart, 1, 0.05, 0.12);
        for i in 0..12 {
            advance_to(&mut g, 1.0 + i as f32);
            g.tick(&RhythmInput { presses: vec![0], autoplay: false }, 0.0);
        }
        // 9 notes at ×1, then combo 10..12 at ×2
        assert_eq!(g.result().score, 9 * 300 + 3 * 600);
        assert_eq!(g.result().max_combo, 12);
    }

    #[test]
    fn test_autoplay_scores_well() {
        let mut g = RhythmGame::new(11, &RhythmSettings::default(), 1.0);
        let input = RhythmInput { presses: Vec::new(), autoplay: true };
        while !g.is_finished() {
            g.tick(&input, SIM_DT);
        }
        let result = g.result();
        assert_eq!(result.miss, 0);
        assert_eq!(result.perfect + result.good, result.total_notes);
        assert!(result.accuracy() >= 0.5);
    }

    #[test]
    fn test_chart_sorted_and_in_lanes() {
        let settings = RhythmSettings::default();
        let g = RhythmGame::new(5, &settings, 1.0);
        assert!(g.chart.len() >= settings.song_beats as usize);
        assert!(g.chart.windows(2).all(|w| w[0].time <= w[1].time));
        assert!(g.chart.iter().all(|n| n.lane < settings.lanes));
    }

    #[test]
    fn test_window_scale_widens() {
        let settings = RhythmSettings::default();
        let g = RhythmGame::new(5, &settings, 1.5);
        let (perfect, good) = g.windows();
        assert!(perfect > settings.perfect_window);
        assert!(good > settings.good_window);
    }

    #[test]
    fn test_grades() {
        let r = RhythmResult { perfect: 10, total_notes: 10, ..Default::default() };
        assert_eq!(r.grade(), Grade::S);
        let r = RhythmResult { perfect: 7, good: 1, miss: 2, total_notes: 10, ..Default::default() };
        assert_eq!(r.grade(), Grade::B);
    }
}
