//! Item-reference extraction from a single guide line.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::catalog::{Category, PlayerClass, Stage};
use crate::queue::AssetQueue;
use crate::record::ItemRecord;

/// Marker every item-reference line starts with: an image inside a link.
pub const ITEM_REFERENCE_PREFIX: &str = "[![";

/// Icon badge linking to the wiki, followed by a bracketed display name:
///
/// `[![alt](/images/Item.png?hash)](/wiki/Item "Item")[Item](/wiki/Item "Item")`
///
/// Captures: 1 = alt text, 2 = image reference, 3 = display name.
#[allow(clippy::expect_used)]
static ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[!\[([^\]]*?)\]\(([^)]+?\.(?:png|gif)[^)]*?)\)\]\([^)]+?\)\[([^\]]+?)\]")
        .expect("item regex is valid") // Static pattern, safe to panic
});

/// Where extracted items belong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemContext {
    pub stage: Stage,
    pub class: PlayerClass,
    pub category: Category,
}

/// Extracts every item reference on `line`, left to right.
///
/// Each image reference is resolved through `queue`, which also schedules
/// its download. Lines without a match yield an empty vector.
pub fn extract_items(line: &str, context: ItemContext, queue: &mut AssetQueue) -> Vec<ItemRecord> {
    ITEM_PATTERN
        .captures_iter(line)
        .filter_map(|captures| {
            let image_ref = captures.get(2)?.as_str();
            let name = captures.get(3)?.as_str();
            let icon = queue.resolve(context.stage, context.class, context.category, image_ref);
            trace!(name, icon = %icon, "extracted item");
            Some(ItemRecord {
                name: name.to_string(),
                icon,
                link: wiki_link(name),
            })
        })
        .collect()
}

/// Builds the wiki link for an item name.
#[must_use]
pub fn wiki_link(name: &str) -> String {
    format!("/wiki/{}", urlencoding::encode(name))
}
