//! Line classifier for guide documents.
//!
//! The parser state is two optional fields: the class whose items are being
//! listed and the section (category) they belong to. [`transition`] is a pure
//! function from `(state, line)` to the next state plus a [`LineOutcome`]
//! describing what the line was; [`SectionParser`] is the thin stateful
//! wrapper used while walking a document.
//!
//! Unrecognized lines never fail. They are reported as [`LineOutcome::Noise`]
//! or [`LineOutcome::Orphaned`] so callers can count them.

use tracing::trace;

use crate::catalog::{Category, PlayerClass};

use super::item::ITEM_REFERENCE_PREFIX;

const WEAPON_HEADERS: &[&str] = &[
    "Single-Target Weapons",
    "Crowd Control Weapons",
    "Crowd-Control Weapons",
    "Support Weapons",
    "Minions",
    "Whips",
];

const AMMUNITION_HEADERS: &[&str] = &["Single-Target Ammunition", "Crowd-Control Ammunition"];

const ARMOR_HEADERS: &[&str] = &["Defensive", "Glass Cannon"];

const ACCESSORY_HEADERS: &[&str] = &[
    "Accessories",
    "Mobility Accessories",
    "Survivability Accessories",
    "Offensive Accessories",
];

const BUFF_HEADER: &str = "Buffs/Potions";

const NOISE_HEADERS: &[&str] = &["Best", "Pre-Bosses", "Minion Mixing"];

/// Current position within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserState {
    pub current_class: Option<PlayerClass>,
    pub current_section: Option<Category>,
}

/// What a single line turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// A class header; the caller should make sure a record exists.
    ClassHeader(PlayerClass),
    /// A section header that switched the active category.
    SectionHeader(Category),
    /// A section header seen while no class was active.
    IgnoredHeader(Category),
    /// Item references to extract into the given class and category.
    ItemLine(PlayerClass, Category),
    /// An item reference with no active class or section.
    Orphaned,
    /// Blank lines, boilerplate headers and prose.
    Noise,
}

impl LineOutcome {
    /// Returns true for lines that were dropped without effect.
    #[must_use]
    pub fn is_skipped(self) -> bool {
        matches!(self, Self::IgnoredHeader(_) | Self::Orphaned | Self::Noise)
    }
}

/// Computes the next state for one line.
///
/// The line is trimmed before matching. Rules apply in priority order:
/// class header, weapon header, ammunition header, armor header, accessory
/// header, buffs header, noise, item reference.
#[must_use]
pub fn transition(state: ParserState, line: &str) -> (ParserState, LineOutcome) {
    let line = line.trim();

    if let Some(class) = PlayerClass::from_header(line) {
        let next = ParserState {
            current_class: Some(class),
            current_section: None,
        };
        return (next, LineOutcome::ClassHeader(class));
    }

    if let Some(category) = section_header(line) {
        return match state.current_class {
            Some(_) => (
                ParserState {
                    current_section: Some(category),
                    ..state
                },
                LineOutcome::SectionHeader(category),
            ),
            None => (state, LineOutcome::IgnoredHeader(category)),
        };
    }

    if is_noise(line) {
        return (state, LineOutcome::Noise);
    }

    match (state.current_class, state.current_section) {
        (Some(class), Some(category)) => (state, LineOutcome::ItemLine(class, category)),
        _ => (state, LineOutcome::Orphaned),
    }
}

/// Maps a section header line to the category it opens.
#[must_use]
pub fn section_header(line: &str) -> Option<Category> {
    if WEAPON_HEADERS.contains(&line) {
        Some(Category::Weapons)
    } else if AMMUNITION_HEADERS.contains(&line) {
        Some(Category::BuffsPotionsAmmo)
    } else if line.contains("Armor") || ARMOR_HEADERS.contains(&line) {
        Some(Category::Armor)
    } else if ACCESSORY_HEADERS.contains(&line) {
        Some(Category::Accessories)
    } else if line == BUFF_HEADER {
        Some(Category::BuffsPotionsAmmo)
    } else {
        None
    }
}

fn is_noise(line: &str) -> bool {
    line.is_empty()
        || NOISE_HEADERS.contains(&line)
        || line.starts_with("Pre-")
        || !line.starts_with(ITEM_REFERENCE_PREFIX)
}

/// Stateful driver around [`transition`].
#[derive(Debug, Clone, Default)]
pub struct SectionParser {
    state: ParserState,
}

impl SectionParser {
    /// Creates a parser at the start of a document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `line` and advances the state.
    pub fn feed(&mut self, line: &str) -> LineOutcome {
        let (next, outcome) = transition(self.state, line);
        if outcome.is_skipped() {
            trace!(?outcome, line = line.trim(), "skipped line");
        }
        self.state = next;
        outcome
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }
}
