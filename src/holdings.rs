// 📦 Holdings - Where the player's items live, merged into one stock list
//
// Every storage kind (player inventory, chest, storage furniture, shipping
// bin) answers the same question: "which items does this owner hold here?".
// Slots may be empty; they are skipped.

use crate::resource::{ItemStack, StockEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Unique id of a player.
pub type OwnerId = i64;

// ============================================================================
// HOLDINGS SOURCE
// ============================================================================

pub trait HoldingsSource {
    /// Slots visible to `owner`. `None` marks an empty slot.
    fn items_for_owner(&self, owner: OwnerId) -> Vec<Option<ItemStack>>;

    /// Short label for logs
    fn kind(&self) -> &'static str;
}

/// The player's own backpack. Only its owner sees it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInventory {
    pub owner: OwnerId,
    #[serde(default)]
    pub items: Vec<Option<ItemStack>>,
}

impl HoldingsSource for PlayerInventory {
    fn items_for_owner(&self, owner: OwnerId) -> Vec<Option<ItemStack>> {
        if owner == self.owner {
            self.items.clone()
        } else {
            Vec::new()
        }
    }

    fn kind(&self) -> &'static str {
        "inventory"
    }
}

/// A placed chest. Regular chests share one item list; per-player chests
/// keep a separate list for each owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChestContainer {
    #[serde(default)]
    pub items: Vec<Option<ItemStack>>,
    #[serde(default)]
    pub per_owner: HashMap<OwnerId, Vec<Option<ItemStack>>>,
}

impl HoldingsSource for ChestContainer {
    fn items_for_owner(&self, owner: OwnerId) -> Vec<Option<ItemStack>> {
        if self.per_owner.is_empty() {
            return self.items.clone();
        }
        self.per_owner.get(&owner).cloned().unwrap_or_default()
    }

    fn kind(&self) -> &'static str {
        "chest"
    }
}

/// Dressers and other storage furniture. Shared between all players.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FurnitureContainer {
    #[serde(default)]
    pub held_items: Vec<Option<ItemStack>>,
}

impl HoldingsSource for FurnitureContainer {
    fn items_for_owner(&self, _owner: OwnerId) -> Vec<Option<ItemStack>> {
        self.held_items.clone()
    }

    fn kind(&self) -> &'static str {
        "furniture"
    }
}

/// The farm's shipping bin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingBinContainer {
    #[serde(default)]
    pub items: Vec<Option<ItemStack>>,
}

impl HoldingsSource for ShippingBinContainer {
    fn items_for_owner(&self, _owner: OwnerId) -> Vec<Option<ItemStack>> {
        self.items.clone()
    }

    fn kind(&self) -> &'static str {
        "shipping_bin"
    }
}

// ============================================================================
// WORLD HOLDINGS
// ============================================================================

/// Every storage found for the session, as handed over by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldHoldings {
    #[serde(default)]
    pub player: PlayerInventory,
    #[serde(default)]
    pub chests: Vec<ChestContainer>,
    #[serde(default)]
    pub furniture: Vec<FurnitureContainer>,
    #[serde(default)]
    pub shipping_bin: Option<ShippingBinContainer>,
}

impl WorldHoldings {
    /// Containers first, then the player's inventory.
    pub fn sources(&self) -> Vec<&dyn HoldingsSource> {
        let mut sources: Vec<&dyn HoldingsSource> = Vec::new();
        sources.extend(self.chests.iter().map(|c| c as &dyn HoldingsSource));
        sources.extend(self.furniture.iter().map(|f| f as &dyn HoldingsSource));
        if let Some(bin) = &self.shipping_bin {
            sources.push(bin);
        }
        sources.push(&self.player);
        sources
    }

    pub fn snapshot(&self, owner: OwnerId) -> Vec<StockEntry> {
        build_snapshot(&self.sources(), owner)
    }
}

// ============================================================================
// SNAPSHOT BUILDER
// ============================================================================

/// Merge every source's items for `owner` into one entry per display name.
///
/// The first stack seen under a name provides the entry's resource; later
/// stacks with the same name only add their quantity. Entries come back in
/// first-seen order.
pub fn build_snapshot(sources: &[&dyn HoldingsSource], owner: OwnerId) -> Vec<StockEntry> {
    let mut entries: Vec<StockEntry> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for source in sources {
        let items = source.items_for_owner(owner);
        debug!(source = source.kind(), slots = items.len(), owner, "snapshot.source");

        for stack in items.into_iter().flatten() {
            let name = stack.resource.display_name().to_string();
            match by_name.get(&name) {
                Some(&i) => entries[i].count += stack.stack as i64,
                None => {
                    by_name.insert(name, entries.len());
                    entries.push(StockEntry::new(stack.resource, stack.stack as i64));
                }
            }
        }
    }

    entries
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Quality, Resource};

    const ME: OwnerId = 1001;
    const FARMHAND: OwnerId = 2002;

    fn stack(id: &str, name: &str, count: i32) -> Option<ItemStack> {
        Some(ItemStack::new(Resource::new(id, name), count))
    }

    #[test]
    fn test_same_name_across_sources_merges() {
        let chest = ChestContainer {
            items: vec![stack("(O)378", "Copper Ore", 3)],
            ..Default::default()
        };
        let bin = ShippingBinContainer {
            items: vec![stack("(O)378", "Copper Ore", 4)],
        };

        let snapshot = build_snapshot(&[&chest as &dyn HoldingsSource, &bin], ME);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].count, 7);
    }

    #[test]
    fn test_merges_by_name_not_quality() {
        let gold = ItemStack::new(Resource::new("(O)254", "Melon").with_quality(Quality::Gold), 2);
        let normal = ItemStack::new(Resource::new("(O)254", "Melon"), 5);
        let furniture = FurnitureContainer {
            held_items: vec![Some(gold), None, Some(normal)],
        };

        let snapshot = build_snapshot(&[&furniture as &dyn HoldingsSource], ME);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].count, 7);
        // First stack seen seeds the entry
        assert_eq!(snapshot[0].resource.quality, Quality::Gold);
    }

    #[test]
    fn test_empty_slots_skipped_and_order_kept() {
        let chest = ChestContainer {
            items: vec![None, stack("(O)388", "Wood", 50), None, stack("(O)390", "Stone", 20)],
            ..Default::default()
        };
        let player = PlayerInventory {
            owner: ME,
            items: vec![stack("(O)390", "Stone", 5), None, stack("(O)382", "Coal", 1)],
        };

        let snapshot = build_snapshot(&[&chest as &dyn HoldingsSource, &player], ME);
        let names: Vec<&str> = snapshot.iter().map(|e| e.name()).collect();

        assert_eq!(names, vec!["Wood", "Stone", "Coal"]);
        assert_eq!(snapshot[1].count, 25);
    }

    #[test]
    fn test_only_owner_items_are_visible() {
        let player = PlayerInventory {
            owner: FARMHAND,
            items: vec![stack("(O)388", "Wood", 10)],
        };
        let mut per_owner = HashMap::new();
        per_owner.insert(ME, vec![stack("(O)390", "Stone", 3)]);
        per_owner.insert(FARMHAND, vec![stack("(O)382", "Coal", 9)]);
        let chest = ChestContainer {
            items: Vec::new(),
            per_owner,
        };

        let snapshot = build_snapshot(&[&player as &dyn HoldingsSource, &chest], ME);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "Stone");
    }

    #[test]
    fn test_no_sources_is_empty() {
        assert!(build_snapshot(&[], ME).is_empty());
        assert!(WorldHoldings::default().snapshot(ME).is_empty());
    }

    #[test]
    fn test_world_holdings_from_json() {
        let json = r#"{
            "player": { "owner": 1001, "items": [
                { "resource": { "qualified_id": "(O)24", "name": "Parsnip" }, "stack": 4 },
                null
            ]},
            "chests": [ { "items": [
                { "resource": { "qualified_id": "(O)24", "name": "Parsnip", "quality": "Silver" }, "stack": 6 }
            ]} ],
            "shipping_bin": { "items": [
                { "resource": { "qualified_id": "(O)388", "name": "Wood" }, "stack": 99 }
            ]}
        }"#;

        let world: WorldHoldings = serde_json::from_str(json).unwrap();
        let snapshot = world.snapshot(ME);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].name(), "Parsnip");
        assert_eq!(snapshot[0].count, 10);
        assert_eq!(snapshot[1].name(), "Wood");
    }
}
