//! Item and class records produced by the parser and serialized in the
//! output document.

use serde::Serialize;

use crate::catalog::{Category, PlayerClass};

/// A single item entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    /// Display name as written in the guide.
    pub name: String,
    /// Icon path relative to the assets directory.
    pub icon: String,
    /// Wiki link derived from the name.
    pub link: String,
}

/// Items recorded for one class within one stage.
///
/// Each list keeps insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    /// Class identifier.
    pub class: PlayerClass,
    pub weapons: Vec<ItemRecord>,
    pub armor: Vec<ItemRecord>,
    pub accessories: Vec<ItemRecord>,
    pub buffs_potions_ammo: Vec<ItemRecord>,
}

impl ClassRecord {
    /// Creates an empty record for `class`.
    #[must_use]
    pub fn new(class: PlayerClass) -> Self {
        Self {
            class,
            weapons: Vec::new(),
            armor: Vec::new(),
            accessories: Vec::new(),
            buffs_potions_ammo: Vec::new(),
        }
    }

    /// Returns the item list for `category`.
    #[must_use]
    pub fn items(&self, category: Category) -> &[ItemRecord] {
        match category {
            Category::Weapons => &self.weapons,
            Category::Armor => &self.armor,
            Category::Accessories => &self.accessories,
            Category::BuffsPotionsAmmo => &self.buffs_potions_ammo,
        }
    }

    /// Returns the mutable item list for `category`.
    pub fn items_mut(&mut self, category: Category) -> &mut Vec<ItemRecord> {
        match category {
            Category::Weapons => &mut self.weapons,
            Category::Armor => &mut self.armor,
            Category::Accessories => &mut self.accessories,
            Category::BuffsPotionsAmmo => &mut self.buffs_potions_ammo,
        }
    }

    /// Total number of items across all categories.
    #[must_use]
    pub fn item_count(&self) -> usize {
        Category::ALL.iter().map(|c| self.items(*c).len()).sum()
    }
}
