//! Static stage, class and category tables.
//!
//! Output ordering is taken from these tables only. Declaration order of
//! each enum is its canonical order, and [`Stage::ALL`] / [`PlayerClass::ALL`]
//! are the enumeration tables the assembler walks.

use std::fmt;

use serde::Serialize;

/// A progression milestone. One guide document exists per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    PreBoss,
    PreSkeletron,
    PreWallOfFlesh,
    PreMechBoss,
    PrePlantera,
    PreGolem,
    PreLunar,
    PreMoonLord,
    Endgame,
}

/// Display metadata for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    /// The stage this descriptor belongs to.
    pub stage: Stage,
    /// Human readable title.
    pub title: &'static str,
    /// Icon glyph shown next to the title.
    pub icon: &'static str,
    /// Display color class.
    pub color: &'static str,
}

impl Stage {
    /// All stages in canonical output order.
    pub const ALL: [Self; 9] = [
        Self::PreBoss,
        Self::PreSkeletron,
        Self::PreWallOfFlesh,
        Self::PreMechBoss,
        Self::PrePlantera,
        Self::PreGolem,
        Self::PreLunar,
        Self::PreMoonLord,
        Self::Endgame,
    ];

    /// Stable identifier, used in document names and asset paths.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::PreBoss => "pre-boss",
            Self::PreSkeletron => "pre-skeletron",
            Self::PreWallOfFlesh => "pre-wall-of-flesh",
            Self::PreMechBoss => "pre-mech-boss",
            Self::PrePlantera => "pre-plantera",
            Self::PreGolem => "pre-golem",
            Self::PreLunar => "pre-lunar",
            Self::PreMoonLord => "pre-moon-lord",
            Self::Endgame => "endgame",
        }
    }

    /// Position of the stage in the output document.
    #[must_use]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Looks a stage up by its identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.id() == id)
    }

    /// Returns the display metadata for this stage.
    #[must_use]
    pub fn descriptor(self) -> StageDescriptor {
        let (title, icon, color) = match self {
            Self::PreBoss => ("Pre-Boss", "🗡️", "text-green-400"),
            Self::PreSkeletron => ("Pre-Skeletron", "💀", "text-gray-400"),
            Self::PreWallOfFlesh => ("Pre-Wall of Flesh", "🔥", "text-red-400"),
            Self::PreMechBoss => ("Pre-Mechanical Boss", "🤖", "text-blue-400"),
            Self::PrePlantera => ("Pre-Plantera", "🌱", "text-green-500"),
            Self::PreGolem => ("Pre-Golem", "🗿", "text-orange-400"),
            Self::PreLunar => ("Pre-Lunar Events", "🌙", "text-indigo-400"),
            Self::PreMoonLord => ("Pre-Moon Lord", "🌙", "text-purple-400"),
            Self::Endgame => ("Endgame", "🏆", "text-gold-400"),
        };
        StageDescriptor {
            stage: self,
            title,
            icon,
            color,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A player role within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerClass {
    Melee,
    Ranged,
    Magic,
    Summoner,
    Mixed,
}

impl PlayerClass {
    /// All classes in canonical output order.
    pub const ALL: [Self; 5] = [
        Self::Melee,
        Self::Ranged,
        Self::Magic,
        Self::Summoner,
        Self::Mixed,
    ];

    /// Maps a guide header line to its class. The match is exact.
    #[must_use]
    pub fn from_header(line: &str) -> Option<Self> {
        match line {
            "Melee" => Some(Self::Melee),
            "Ranged" => Some(Self::Ranged),
            "Magic" => Some(Self::Magic),
            "Summoning" => Some(Self::Summoner),
            "Mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    /// Stable identifier, used in the output document and asset paths.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Magic => "magic",
            Self::Summoner => "summoner",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// An item grouping within a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Weapons,
    Armor,
    Accessories,
    BuffsPotionsAmmo,
}

impl Category {
    /// All categories in output field order.
    pub const ALL: [Self; 4] = [
        Self::Weapons,
        Self::Armor,
        Self::Accessories,
        Self::BuffsPotionsAmmo,
    ];

    /// Identifier matching the output field name and the asset directory.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Weapons => "weapons",
            Self::Armor => "armor",
            Self::Accessories => "accessories",
            Self::BuffsPotionsAmmo => "buffsPotionsAmmo",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
