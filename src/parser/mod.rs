//! Guide document parsing.
//!
//! A guide is a markdown export listing, per class, the recommended items of
//! one progression stage. Parsing is line based: [`section`] classifies each
//! line and tracks the active class and category, and [`item`] pulls item
//! records out of item-reference lines, registering every icon with the
//! [`AssetQueue`].
//!
//! Parsing performs no I/O and never fails; lines it cannot place are
//! counted in [`ParseStats`].
//!
//! # Example
//!
//! ```
//! use stagepack_core::catalog::{PlayerClass, Stage};
//! use stagepack_core::parser::parse_document;
//! use stagepack_core::queue::AssetQueue;
//!
//! let guide = r#"
//! Melee
//! Single-Target Weapons
//! [![Sword](/images/a/Sword.png?hash=1)](/wiki/Sword "Sword")[Sword](/wiki/Sword "Sword")
//! "#;
//!
//! let mut queue = AssetQueue::new("assets");
//! let parsed = parse_document(Stage::PreBoss, guide, &mut queue);
//! let melee = &parsed.classes[&PlayerClass::Melee];
//! assert_eq!(melee.weapons[0].icon, "pre-boss/melee/weapons/Sword.png");
//! assert_eq!(queue.len(), 1);
//! ```

pub mod item;
pub mod section;

pub use item::{ItemContext, extract_items, wiki_link};
pub use section::{LineOutcome, ParserState, SectionParser, transition};

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::catalog::{PlayerClass, Stage};
use crate::queue::AssetQueue;
use crate::record::ClassRecord;

/// Per-class records for one stage, keyed by class.
pub type ClassMap = HashMap<PlayerClass, ClassRecord>;

/// Line counts gathered while parsing one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read.
    pub lines: usize,
    /// Item records extracted.
    pub items: usize,
    /// Class headers seen.
    pub class_headers: usize,
    /// Section headers that changed the active category.
    pub section_headers: usize,
    /// Section headers seen with no active class.
    pub ignored_headers: usize,
    /// Blank lines, boilerplate and prose.
    pub noise: usize,
    /// Item-reference lines with no active class or section.
    pub orphaned: usize,
    /// Item-reference lines in an active section that yielded no item.
    pub unmatched: usize,
}

impl ParseStats {
    /// Lines dropped without producing anything, noise included.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.ignored_headers + self.noise + self.orphaned + self.unmatched
    }

    /// Lines that looked meaningful but could not be placed.
    #[must_use]
    pub fn unplaced(&self) -> usize {
        self.ignored_headers + self.orphaned + self.unmatched
    }

    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        self.lines += other.lines;
        self.items += other.items;
        self.class_headers += other.class_headers;
        self.section_headers += other.section_headers;
        self.ignored_headers += other.ignored_headers;
        self.noise += other.noise;
        self.orphaned += other.orphaned;
        self.unmatched += other.unmatched;
    }
}

/// Result of parsing one stage document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Stage the document describes.
    pub stage: Stage,
    /// Classes observed in the document.
    pub classes: ClassMap,
    /// Line diagnostics.
    pub stats: ParseStats,
}

/// Parses one stage document.
///
/// State starts empty for every document. Class records are created the
/// first time their header appears and extended by later sections.
#[instrument(skip(content, queue), fields(stage = %stage, bytes = content.len()))]
pub fn parse_document(stage: Stage, content: &str, queue: &mut AssetQueue) -> ParsedDocument {
    let mut parser = SectionParser::new();
    let mut classes = ClassMap::new();
    let mut stats = ParseStats::default();

    for line in content.lines() {
        stats.lines += 1;
        match parser.feed(line) {
            LineOutcome::ClassHeader(class) => {
                stats.class_headers += 1;
                classes
                    .entry(class)
                    .or_insert_with(|| ClassRecord::new(class));
            }
            LineOutcome::SectionHeader(_) => stats.section_headers += 1,
            LineOutcome::IgnoredHeader(category) => {
                stats.ignored_headers += 1;
                debug!(category = %category, "section header outside any class");
            }
            LineOutcome::Noise => stats.noise += 1,
            LineOutcome::Orphaned => {
                stats.orphaned += 1;
                debug!(line = line.trim(), "item reference outside any section");
            }
            LineOutcome::ItemLine(class, category) => {
                let context = ItemContext {
                    stage,
                    class,
                    category,
                };
                let items = extract_items(line.trim(), context, queue);
                if items.is_empty() {
                    stats.unmatched += 1;
                    debug!(line = line.trim(), "item line without a recognizable reference");
                    continue;
                }
                stats.items += items.len();
                classes
                    .entry(class)
                    .or_insert_with(|| ClassRecord::new(class))
                    .items_mut(category)
                    .extend(items);
            }
        }
    }

    info!(
        classes = classes.len(),
        items = stats.items,
        skipped = stats.skipped(),
        unplaced = stats.unplaced(),
        "parsed stage document"
    );

    ParsedDocument {
        stage,
        classes,
        stats,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item_line(name: &str, image: &str) -> String {
        format!(r#"[![{name}]({image})](/wiki/{name} "{name}")[{name}](/wiki/{name} "{name}")"#)
    }

    #[test]
    fn test_parse_document_places_items_by_section() {
        let guide = [
            "Pre-Bosses".to_string(),
            "Melee".to_string(),
            "Single-Target Weapons".to_string(),
            item_line("Sword", "/images/Sword.png"),
            "Armor".to_string(),
            item_line("Helmet", "/images/Helmet.png"),
            "Accessories".to_string(),
            item_line("Boots", "/images/Boots.png"),
            "Buffs/Potions".to_string(),
            item_line("Ironskin", "/images/Ironskin.png"),
        ]
        .join("\n");

        let mut queue = AssetQueue::new("assets");
        let parsed = parse_document(Stage::PreBoss, &guide, &mut queue);
        let melee = &parsed.classes[&PlayerClass::Melee];

        assert_eq!(melee.weapons[0].name, "Sword");
        assert_eq!(melee.armor[0].name, "Helmet");
        assert_eq!(melee.accessories[0].name, "Boots");
        assert_eq!(melee.buffs_potions_ammo[0].name, "Ironskin");
        assert_eq!(
            melee.buffs_potions_ammo[0].icon,
            "pre-boss/melee/buffsPotionsAmmo/Ironskin.png"
        );
        assert_eq!(parsed.stats.items, 4);
        assert_eq!(parsed.stats.class_headers, 1);
        assert_eq!(parsed.stats.section_headers, 4);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_parse_document_repeated_class_header_keeps_items() {
        let guide = [
            "Magic".to_string(),
            "Support Weapons".to_string(),
            item_line("Wand", "/images/Wand.png"),
            "Magic".to_string(),
            "Crowd Control Weapons".to_string(),
            item_line("Staff", "/images/Staff.png"),
        ]
        .join("\n");

        let mut queue = AssetQueue::new("assets");
        let parsed = parse_document(Stage::PreSkeletron, &guide, &mut queue);
        let names: Vec<_> = parsed.classes[&PlayerClass::Magic]
            .weapons
            .iter()
            .map(|i| i.name.as_str())
            .collect();

        assert_eq!(names, ["Wand", "Staff"]);
    }

    #[test]
    fn test_parse_document_counts_skipped_lines() {
        let guide = [
            item_line("Early", "/images/Early.png"),
            "Accessories".to_string(),
            "Ranged".to_string(),
            item_line("NoSection", "/images/NoSection.png"),
            "Whips".to_string(),
            "[![broken link".to_string(),
            String::new(),
            "Some commentary".to_string(),
        ]
        .join("\n");

        let mut queue = AssetQueue::new("assets");
        let parsed = parse_document(Stage::PreBoss, &guide, &mut queue);

        assert_eq!(parsed.stats.orphaned, 2);
        assert_eq!(parsed.stats.ignored_headers, 1);
        assert_eq!(parsed.stats.unmatched, 1);
        assert_eq!(parsed.stats.noise, 2);
        assert_eq!(parsed.stats.skipped(), 6);
        assert_eq!(parsed.stats.unplaced(), 4);
        assert_eq!(parsed.stats.lines, 8);
        assert!(queue.is_empty());
        assert!(parsed.classes[&PlayerClass::Ranged].weapons.is_empty());
    }

    #[test]
    fn test_parse_document_shared_reference_dedups() {
        let sword = item_line("Sword", "/images/a/Sword.png?hash=1");
        let guide = [
            "Melee",
            "Single-Target Weapons",
            sword.as_str(),
            "Support Weapons",
            sword.as_str(),
        ]
        .join("\n");

        let mut queue = AssetQueue::new("assets");
        let parsed = parse_document(Stage::PreBoss, &guide, &mut queue);
        let weapons = &parsed.classes[&PlayerClass::Melee].weapons;

        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[0].icon, "pre-boss/melee/weapons/Sword.png");
        assert_eq!(weapons[0].icon, weapons[1].icon);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.duplicates(), 1);
    }

    #[test]
    fn test_parse_document_empty_content() {
        let mut queue = AssetQueue::new("assets");
        let parsed = parse_document(Stage::Endgame, "", &mut queue);
        assert!(parsed.classes.is_empty());
        assert_eq!(parsed.stats, ParseStats::default());
    }

    #[test]
    fn test_parse_stats_merge() {
        let mut total = ParseStats {
            lines: 3,
            items: 1,
            noise: 2,
            ..ParseStats::default()
        };
        total.merge(&ParseStats {
            lines: 4,
            orphaned: 1,
            unmatched: 1,
            ..ParseStats::default()
        });
        assert_eq!(total.lines, 7);
        assert_eq!(total.skipped(), 4);
        assert_eq!(total.unplaced(), 2);
    }
}
