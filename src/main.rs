//! Coach Day headless driver
//!
//! Plays the game by itself for a number of days: books every appointment it
//! can fit, turns up on time, lets the mini-games autoplay, and prints how
//! the business did.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use coach_day::consts::SIM_DT;
use coach_day::sim::{AppointmentStatus, Perk};
use coach_day::{DifficultyPreset, FrameInput, Game, GameError, GameEvent, Settings};

/// Frame budget per simulated day before giving up
const MAX_FRAMES_PER_DAY: u64 = 60 * 60 * 60;

#[derive(Debug, Parser)]
#[command(name = "coach-day", about = "Run a self-playing coaching business")]
struct Args {
    /// RNG seed for the run
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of days to play
    #[arg(long, default_value_t = 3)]
    days: u32,

    /// Settings JSON to load
    #[arg(long)]
    config: Option<PathBuf>,

    /// Difficulty preset (relaxed, standard, hectic)
    #[arg(long)]
    preset: Option<String>,

    /// Write the effective settings to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> coach_day::Result<()> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(name) = &args.preset {
        match DifficultyPreset::from_str(name) {
            Some(preset) => settings.apply_preset(preset),
            None => log::warn!("Unknown preset '{}', keeping {}", name, settings.difficulty.as_str()),
        }
    }

    if let Some(path) = &args.write_config {
        return settings.save(path);
    }

    log::info!("Coach Day (headless) starting, difficulty {}", settings.difficulty.as_str());
    let mut game = Game::new(args.seed, settings);
    book_everything(&mut game);

    let last_day = game.now().day + args.days;
    let mut frames_today = 0u64;
    let mut tally = Tally::default();

    while game.now().day < last_day {
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
                .cloned();
            match next {
                Some(appt) if now >= appt.window.start => {
                    let here = game.location.as_deref() == Some(appt.location.as_str());
                    let arrived = if here { Ok(()) } else { game.travel_to(&appt.location) };
                    match arrived {
                        Ok(()) => input.clock_speed = Some(1.0),
                        // Too tired: let the booking lapse
                        Err(GameError::InsufficientEnergy { .. }) => input.clock_speed = Some(32.0),
                        Err(e) => return Err(e),
                    }
                }
                Some(_) => input.clock_speed = Some(32.0),
                None => {
                    for e in game.sleep()? {
                        tally.count(&e);
                        report(&e);
                    }
                    frames_today = 0;
                    spend_skill_points(&mut game);
                    book_everything(&mut game);
                    continue;
                }
            }
        }

        for e in game.update(SIM_DT, &input) {
            match &e {
                GameEvent::AppointmentsOffered(_) => book_everything(&mut game),
                GameEvent::DayEnded(_) => frames_today = 0,
                _ => {}
            }
            tally.count(&e);
            report(&e);
        }

        frames_today += 1;
        if frames_today > MAX_FRAMES_PER_DAY {
            log::warn!("Day {} is taking too long, sleeping", game.now().day);
            if game.activity.is_roaming() {
                for e in game.sleep()? {
                    tally.count(&e);
                    report(&e);
                }
                book_everything(&mut game);
            }
            frames_today = 0;
        }
    }

    let stats = &game.progression.stats;
    println!("After {} day(s):", args.days);
    println!("  sessions completed:  {}", tally.completed);
    println!("  sessions failed:     {}", tally.failed);
    println!("  appointments missed: {}", tally.missed);
    println!("  sessions blocked:    {}", tally.blocked);
    println!("  cash: ${}  reputation: {}", stats.cash, stats.reputation);
    for skill in &game.progression.skills {
        println!("  {:?}: level {}", skill.field, skill.level);
    }
    if let Some(best) = game.records.rhythm.leader().map(|e| e.score) {
        println!("  best rhythm score: {}", best);
    }
    if let Some(best) = game.records.paddle.leader().map(|e| e.score) {
        println!("  best paddle score: {}", best);
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Tally {
    completed: u32,
    failed: u32,
    missed: u32,
    blocked: u32,
}

impl Tally {
    fn count(&mut self, event: &GameEvent) {
        match event {
            GameEvent::SessionCompleted { .. } => self.completed += 1,
            GameEvent::SessionFailed { .. } => self.failed += 1,
            GameEvent::AppointmentMissed(_) => self.missed += 1,
            GameEvent::SessionBlocked { .. } => self.blocked += 1,
            _ => {}
        }
    }
}

/// Accept every offer that fits around what's already booked
fn book_everything(game: &mut Game) {
    let offers: Vec<_> = game.appointments.available().iter().map(|a| a.id).collect();
    for id in offers {
        if let Err(e) = game.accept_appointment(id) {
            log::debug!("Skipping #{}: {}", id, e);
        }
    }
}

/// Unlock the cheapest perks we can afford
fn spend_skill_points(game: &mut Game) {
    let mut perks = Perk::ALL;
    perks.sort_by_key(|p| p.cost());
    for perk in perks {
        if game.progression.perks.has(perk) || perk.cost() > game.progression.stats.skill_points {
            continue;
        }
        if let Err(e) = game.unlock_perk(perk) {
            log::warn!("Could not unlock {:?}: {}", perk, e);
        }
    }
}

fn report(event: &GameEvent) {
    match event {
        GameEvent::Time(_) | GameEvent::Rhythm(_) | GameEvent::Paddle(_) => {}
        GameEvent::DayEnded(summary) => println!(
            "Day {}: {} completed, {} missed, {} failed, ${} earned",
            summary.day, summary.completed, summary.missed, summary.failed, summary.cash_earned
        ),
        other => log::debug!("{:?}", other),
    }
}
