//! Enumeration types for unit state and parameter slots.

use serde::{Deserialize, Serialize};

/// Which side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Human-controlled roster.
    Player,
    /// Allied, computer-controlled roster.
    Ally,
    /// Hostile roster.
    Enemy,
}

/// One of the four unit collections the host exposes.
///
/// [`RosterKind::All`] is the concatenation of the player, ally, and enemy
/// rosters in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterKind {
    /// Human-controlled roster.
    #[default]
    Player,
    /// Allied roster.
    Ally,
    /// Hostile roster.
    Enemy,
    /// Every roster, player first.
    All,
}

impl From<Faction> for RosterKind {
    fn from(faction: Faction) -> Self {
        match faction {
            Faction::Player => Self::Player,
            Faction::Ally => Self::Ally,
            Faction::Enemy => Self::Enemy,
        }
    }
}

/// Whether a unit is still in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliveState {
    /// Alive and able to act.
    #[default]
    Alive,
    /// Defeated in combat.
    Dead,
    /// Removed from play without dying (scripted removal, failed spawn).
    Erased,
}

/// Whether a unit has been placed on the current map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
    /// Placed on the map for the current battle.
    Deployed,
    /// Held in reserve.
    #[default]
    Undeployed,
}

/// Story importance of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    /// Army leader.
    Leader,
    /// Lieutenant.
    SubLeader,
    /// Rank-and-file.
    #[default]
    Mob,
}

/// Number of slots in a [`ParamVector`](crate::ParamVector).
pub const PARAM_COUNT: usize = 11;

/// A slot in the unit parameter vector.
///
/// The order is fixed. The last slot ([`ParamKind::Build`]) is reserved and
/// excluded from mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Maximum hit points.
    MaxHp,
    /// Physical attack.
    Strength,
    /// Magical attack.
    Magic,
    /// Hit and critical rate.
    Skill,
    /// Evasion and follow-up attacks.
    Speed,
    /// Luck.
    Luck,
    /// Physical defense.
    Defense,
    /// Magical defense.
    Resistance,
    /// Movement range.
    Movement,
    /// Weapon proficiency level.
    WeaponLevel,
    /// Body build (reserved slot).
    Build,
}

impl ParamKind {
    /// Every slot in vector order.
    pub const ALL: [Self; PARAM_COUNT] = [
        Self::MaxHp,
        Self::Strength,
        Self::Magic,
        Self::Skill,
        Self::Speed,
        Self::Luck,
        Self::Defense,
        Self::Resistance,
        Self::Movement,
        Self::WeaponLevel,
        Self::Build,
    ];

    /// Slots copied between source and shadow: all but the reserved last.
    pub const MIRRORED: [Self; PARAM_COUNT - 1] = [
        Self::MaxHp,
        Self::Strength,
        Self::Magic,
        Self::Skill,
        Self::Speed,
        Self::Luck,
        Self::Defense,
        Self::Resistance,
        Self::Movement,
        Self::WeaponLevel,
    ];

    /// Position of this slot in the vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowest valid value for this slot.
    pub const fn floor(self) -> i32 {
        match self {
            Self::MaxHp => 1,
            _ => 0,
        }
    }
}
