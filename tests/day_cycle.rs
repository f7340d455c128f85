use coach_day::consts::SIM_DT;
use coach_day::sim::{AppointmentStatus, DaySummary};
use coach_day::{DifficultyPreset, FrameInput, Game, GameEvent, Settings};

const FRAME_BUDGET: usize = 60 * 60 * 60;

fn book_all(game: &mut Game) -> usize {
    let ids: Vec<_> = game.appointments.available().iter().map(|a| a.id).collect();
    ids.into_iter()
        .filter(|id| game.accept_appointment(*id).is_ok())
        .count()
}

/// Autoplay until the clock rolls over into the next day
fn play_day(game: &mut Game) -> (Vec<GameEvent>, Option<DaySummary>) {
    let day = game.now().day;
    let mut events = Vec::new();
    let mut summary = None;

    for _ in 0..FRAME_BUDGET {
        let mut input = FrameInput {
            interact: true,
            autoplay: true,
            ..Default::default()
        };
        if game.activity.is_roaming() {
            let now = game.now();
            let next = game
                .appointments
                .accepted()
                .iter()
                .find(|a| a.status == AppointmentStatus::Accepted)
                .map(|a| (a.window.start, a.location.clone()));
            match next {
                Some((start, location)) if now >= start => {
                    if game.location.as_deref() != Some(location.as_str()) {
                        game.travel_to(&location).unwrap();
                    }
                    input.clock_speed = Some(1.0);
                }
                _ => input.clock_speed = Some(32.0),
            }
        }

        for e in game.update(SIM_DT, &input) {
            if let GameEvent::DayEnded(s) = &e {
                summary = Some(s.clone());
            }
            events.push(e);
        }
        if game.now().day > day {
            break;
        }
    }
    (events, summary)
}

#[test]
fn test_every_booking_is_resolved_by_midnight() {
    let mut game = Game::new(99, Settings::default());
    let booked = book_all(&mut game);
    assert!(booked > 0);

    let (events, summary) = play_day(&mut game);
    let summary = summary.expect("day should have ended");

    assert_eq!(summary.day, 1);
    assert_eq!(
        (summary.completed + summary.missed + summary.failed) as usize,
        booked
    );
    assert!(game.appointments.accepted().is_empty());
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::SessionStarted { .. }))
    );
    assert_eq!(game.now().day, 2);
    // Fresh offers arrive with the new day
    assert!(!game.appointments.available().is_empty());
}

#[test]
fn test_same_seed_same_day() {
    let outcome = |seed| {
        let mut game = Game::new(seed, Settings::default());
        book_all(&mut game);
        let (events, summary) = play_day(&mut game);
        let sessions = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::SessionCompleted { .. } | GameEvent::SessionFailed { .. }
                )
            })
            .count();
        (
            game.progression.stats.cash,
            game.progression.stats.reputation,
            sessions,
            summary,
        )
    };
    assert_eq!(outcome(2024), outcome(2024));
}

#[test]
fn test_sleeping_through_bookings_misses_them() {
    let mut game = Game::new(5, Settings::default());
    let booked = book_all(&mut game);
    let reputation = game.progression.stats.reputation;

    let events = game.sleep().unwrap();
    let missed = events
        .iter()
        .filter(|e| matches!(e, GameEvent::AppointmentMissed(_)))
        .count();

    assert_eq!(missed, booked);
    let penalty = game.settings.appointments.missed_reputation_penalty;
    assert_eq!(
        game.progression.stats.reputation,
        (reputation - penalty * booked as i32).max(0)
    );
}

#[test]
fn test_hectic_preset_from_json() {
    let settings = Settings::from_json(r#"{ "difficulty": "Hectic", "player": { "starting_cash": 7 } }"#)
        .unwrap();
    assert_eq!(settings.difficulty, DifficultyPreset::Hectic);

    let game = Game::new(1, settings);
    assert_eq!(game.appointments.available().len(), 6);
    assert_eq!(game.progression.stats.cash, 7);
}
