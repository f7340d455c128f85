//! Player stats, skills and perks
//!
//! Each coaching discipline has two specialist fields. Sessions grant XP in
//! the field they exercise; every level earned grants a skill point that can
//! be spent on perks. Skill levels feed back into the mini-games as
//! multipliers.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::settings::PlayerSettings;

/// What kind of session an appointment is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Discipline {
    /// Dog handling, played as the rhythm mini-game
    Dog,
    /// Tennis coaching, played as the paddle mini-game
    Tennis,
}

impl Discipline {
    pub const ALL: [Discipline; 2] = [Discipline::Dog, Discipline::Tennis];

    /// The two fields this discipline trains
    pub fn fields(&self) -> [SpecialistField; 2] {
        match self {
            Discipline::Dog => [SpecialistField::Handling, SpecialistField::Obedience],
            Discipline::Tennis => [SpecialistField::Forehand, SpecialistField::Footwork],
        }
    }
}

/// A leveling axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialistField {
    /// Calmer hand-offs
    Handling,
    /// Wider rhythm timing windows
    Obedience,
    /// Wider paddle
    Forehand,
    /// Faster paddle
    Footwork,
}

impl SpecialistField {
    pub const ALL: [SpecialistField; 4] = [
        SpecialistField::Handling,
        SpecialistField::Obedience,
        SpecialistField::Forehand,
        SpecialistField::Footwork,
    ];

    pub fn discipline(&self) -> Discipline {
        match self {
            SpecialistField::Handling | SpecialistField::Obedience => Discipline::Dog,
            SpecialistField::Forehand | SpecialistField::Footwork => Discipline::Tennis,
        }
    }
}

/// Level and experience in one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillData {
    pub field: SpecialistField,
    /// 1-based level, never above `max_level`
    pub level: u32,
    /// XP into the current level
    pub xp: u32,
    pub max_level: u32,
    xp_base: u32,
}

impl SkillData {
    pub fn new(field: SpecialistField, max_level: u32, xp_base: u32) -> Self {
        Self {
            field,
            level: 1,
            xp: 0,
            max_level: max_level.max(1),
            xp_base: xp_base.max(1),
        }
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }

    /// XP needed to go from the current level to the next
    pub fn xp_to_next(&self) -> u32 {
        (self.xp_base as f32 * (self.level as f32).powf(1.5)).round() as u32
    }

    /// Add XP, returning the number of levels gained
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        if self.is_maxed() {
            return 0;
        }
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while !self.is_maxed() && self.xp >= self.xp_to_next() {
            self.xp -= self.xp_to_next();
            self.level += 1;
            gained += 1;
        }
        if self.is_maxed() {
            self.xp = 0;
        }
        if gained > 0 {
            log::info!("{:?} reached level {}", self.field, self.level);
        }
        gained
    }

    /// Progress in this level, 0..1 (1 when maxed)
    pub fn progress(&self) -> f32 {
        if self.is_maxed() {
            1.0
        } else {
            self.xp as f32 / self.xp_to_next() as f32
        }
    }
}

/// Unlockable perks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perk {
    /// +15% cash from every session
    TreatPouch,
    /// Rhythm timing windows ×1.2
    SteadyHands,
    /// Paddle width ×1.25
    SweetSpot,
    /// Grace minutes after an appointment window closes
    Punctual,
}

impl Perk {
    pub const ALL: [Perk; 4] = [Perk::TreatPouch, Perk::SteadyHands, Perk::SweetSpot, Perk::Punctual];

    /// Skill points needed to unlock
    pub fn cost(&self) -> u32 {
        match self {
            Perk::TreatPouch => 2,
            Perk::SteadyHands => 3,
            Perk::SweetSpot => 3,
            Perk::Punctual => 1,
        }
    }
}

/// Unlock flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkSet {
    unlocked: Vec<Perk>,
}

impl PerkSet {
    pub fn has(&self, perk: Perk) -> bool {
        self.unlocked.contains(&perk)
    }

    pub fn unlocked(&self) -> &[Perk] {
        &self.unlocked
    }
}

/// Grace minutes granted by the Punctual perk
pub const PUNCTUAL_GRACE_MINUTES: u32 = 20;

/// Wallet, reputation and energy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub cash: u32,
    /// 0..=100
    pub reputation: i32,
    pub energy: u32,
    pub max_energy: u32,
    pub skill_points: u32,
}

impl PlayerStats {
    pub const MAX_REPUTATION: i32 = 100;

    pub fn new(settings: &PlayerSettings) -> Self {
        Self {
            cash: settings.starting_cash,
            reputation: settings.starting_reputation.clamp(0, Self::MAX_REPUTATION),
            energy: settings.max_energy,
            max_energy: settings.max_energy,
            skill_points: 0,
        }
    }

    pub fn earn(&mut self, amount: u32) {
        self.cash = self.cash.saturating_add(amount);
    }

    /// Spend cash; on failure nothing changes
    pub fn spend(&mut self, amount: u32) -> Result<()> {
        if amount > self.cash {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.cash,
            });
        }
        self.cash -= amount;
        Ok(())
    }

    pub fn adjust_reputation(&mut self, delta: i32) {
        self.reputation = (self.reputation + delta).clamp(0, Self::MAX_REPUTATION);
    }

    /// Use energy; on failure nothing changes
    pub fn drain_energy(&mut self, amount: u32) -> Result<()> {
        if amount > self.energy {
            return Err(GameError::InsufficientEnergy {
                needed: amount,
                available: self.energy,
            });
        }
        self.energy -= amount;
        Ok(())
    }

    pub fn restore_energy(&mut self) {
        self.energy = self.max_energy;
    }

    /// Reputation as a 0..1 fraction
    pub fn reputation_factor(&self) -> f32 {
        self.reputation as f32 / Self::MAX_REPUTATION as f32
    }
}

/// Everything that levels up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    pub stats: PlayerStats,
    pub skills: [SkillData; 4],
    pub perks: PerkSet,
}

impl Progression {
    pub fn new(settings: &PlayerSettings) -> Self {
        Self {
            stats: PlayerStats::new(settings),
            skills: SpecialistField::ALL
                .map(|f| SkillData::new(f, settings.max_skill_level, settings.xp_base)),
            perks: PerkSet::default(),
        }
    }

    /// Skills are stored in `SpecialistField::ALL` order
    pub fn skill(&self, field: SpecialistField) -> &SkillData {
        &self.skills[field as usize]
    }

    pub fn level(&self, field: SpecialistField) -> u32 {
        self.skill(field).level
    }

    /// Grant XP to a field; every level gained earns a skill point
    pub fn grant_xp(&mut self, field: SpecialistField, xp: u32) -> u32 {
        let gained = self.skills[field as usize].add_xp(xp);
        self.stats.skill_points += gained;
        gained
    }

    pub fn unlock(&mut self, perk: Perk) -> Result<()> {
        if self.perks.has(perk) {
            return Err(GameError::PerkAlreadyUnlocked(perk));
        }
        let cost = perk.cost();
        if cost > self.stats.skill_points {
            return Err(GameError::InsufficientSkillPoints {
                needed: cost,
                available: self.stats.skill_points,
            });
        }
        self.stats.skill_points -= cost;
        self.perks.unlocked.push(perk);
        log::info!("Unlocked perk {:?}", perk);
        Ok(())
    }

    // === Modifiers consumed by the mini-games ===

    /// Timing window multiplier for the rhythm game
    pub fn rhythm_window_scale(&self) -> f32 {
        let mut scale = 1.0 + 0.04 * (self.level(SpecialistField::Obedience) - 1) as f32;
        if self.perks.has(Perk::SteadyHands) {
            scale *= 1.2;
        }
        scale
    }

    /// Player paddle width multiplier
    pub fn paddle_width_scale(&self) -> f32 {
        let mut scale = 1.0 + 0.05 * (self.level(SpecialistField::Forehand) - 1) as f32;
        if self.perks.has(Perk::SweetSpot) {
            scale *= 1.25;
        }
        scale
    }

    /// Player paddle speed multiplier
    pub fn paddle_speed_scale(&self) -> f32 {
        1.0 + 0.05 * (self.level(SpecialistField::Footwork) - 1) as f32
    }

    /// Hand-off delay multiplier (lower is quicker)
    pub fn handover_delay_scale(&self) -> f32 {
        (1.0 - 0.06 * (self.level(SpecialistField::Handling) - 1) as f32).max(0.4)
    }

    /// Cash reward multiplier
    pub fn reward_multiplier(&self) -> f32 {
        let mut mult = 1.0 + 0.5 * self.stats.reputation_factor();
        if self.perks.has(Perk::TreatPouch) {
            mult *= 1.15;
        }
        mult
    }

    /// Minutes after a window closes that still count as on time
    pub fn grace_minutes(&self) -> u32 {
        if self.perks.has(Perk::Punctual) {
            PUNCTUAL_GRACE_MINUTES
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player() -> PlayerSettings {
        PlayerSettings::default()
    }

    #[test]
    fn test_level_up_carries_surplus() {
        let mut skill = SkillData::new(SpecialistField::Handling, 10, 50);
        assert_eq!(skill.xp_to_next(), 50);
        assert_eq!(skill.add_xp(60), 1);
        assert_eq!(skill.level, 2);
        assert_eq!(skill.xp, 10);
    }

    #[test]
    fn test_level_capped_at_max() {
        let mut skill = SkillData::new(SpecialistField::Forehand, 3, 10);
        skill.add_xp(100_000);
        assert_eq!(skill.level, 3);
        assert_eq!(skill.xp, 0);
        assert_eq!(skill.add_xp(500), 0);
        assert_eq!(skill.progress(), 1.0);
    }

    #[test]
    fn test_failed_spend_leaves_cash() {
        let mut stats = PlayerStats::new(&player());
        let before = stats.cash;
        assert!(matches!(
            stats.spend(before + 1),
            Err(GameError::InsufficientFunds { .. })
        ));
        assert_eq!(stats.cash, before);
        stats.spend(before).unwrap();
        assert_eq!(stats.cash, 0);
    }

    #[test]
    fn test_reputation_clamped() {
        let mut stats = PlayerStats::new(&player());
        stats.adjust_reputation(500);
        assert_eq!(stats.reputation, PlayerStats::MAX_REPUTATION);
        stats.adjust_reputation(-500);
        assert_eq!(stats.reputation, 0);
    }

    #[test]
    fn test_levels_grant_skill_points_for_perks() {
        let mut prog = Progression::new(&player());
        assert!(matches!(
            prog.unlock(Perk::Punctual),
            Err(GameError::InsufficientSkillPoints { .. })
        ));
        let gained = prog.grant_xp(SpecialistField::Obedience, 50);
        assert_eq!(gained, 1);
        assert_eq!(prog.stats.skill_points, 1);
        prog.unlock(Perk::Punctual).unwrap();
        assert_eq!(prog.grace_minutes(), PUNCTUAL_GRACE_MINUTES);
        assert!(matches!(
            prog.unlock(Perk::Punctual),
            Err(GameError::PerkAlreadyUnlocked(Perk::Punctual))
        ));
    }

    #[test]
    fn test_modifiers_grow_with_level() {
        let mut prog = Progression::new(&player());
        assert_eq!(prog.rhythm_window_scale(), 1.0);
        prog.grant_xp(SpecialistField::Obedience, 1_000);
        assert!(prog.rhythm_window_scale() > 1.0);
        assert!(prog.handover_delay_scale() <= 1.0);
    }

    #[test]
    fn test_energy_drain() {
        let mut stats = PlayerStats::new(&player());
        stats.drain_energy(90).unwrap();
        assert!(stats.drain_energy(20).is_err());
        assert_eq!(stats.energy, 10);
        stats.restore_energy();
        assert_eq!(stats.energy, stats.max_energy);
    }

    proptest! {
        #[test]
        fn prop_level_never_exceeds_max(max in 1u32..20, grants in proptest::collection::vec(0u32..5_000, 0..30)) {
            let mut skill = SkillData::new(SpecialistField::Footwork, max, 25);
            for xp in grants {
                skill.add_xp(xp);
                prop_assert!(skill.level <= max);
            }
        }

        #[test]
        fn prop_cash_never_negative(start in 0u32..1_000, spends in proptest::collection::vec(0u32..500, 0..20)) {
            let mut stats = PlayerStats::new(&PlayerSettings { starting_cash: start, ..PlayerSettings::default() });
            let mut expected = start;
            for amount in spends {
                if stats.spend(amount).is_ok() {
                    expected -= amount;
                }
                prop_assert_eq!(stats.cash, expected);
            }
        }
    }
}
