//! Plain in-memory implementations of the `external` traits, for the
//! headless scenario runner and anywhere else that wants a working combat
//! loop without wiring up a real buff/proc/navigation system.

use std::collections::HashMap;

use crate::external::{Buffs, InfusionRegistry, Navigation, WeaponRegistry};
use crate::types::{InfusionRatios, WeaponDef, WeaponTable};

impl WeaponRegistry for WeaponTable {
    fn get(&self, weapon_id: u32) -> Option<&WeaponDef> {
        self.defs.get(&weapon_id)
    }

    fn current_durability(&self, weapon_id: u32) -> f32 {
        self.usage.get(&weapon_id).map(|u| u.durability).unwrap_or(0.0)
    }

    fn tick_durability(&mut self, weapon_id: u32, amount: f32) {
        if let Some(usage) = self.usage.get_mut(&weapon_id) {
            usage.durability = (usage.durability - amount).max(0.0);
        }
    }

    fn register_hit(&mut self, weapon_id: u32, damage: f32) {
        if let Some(usage) = self.usage.get_mut(&weapon_id) {
            usage.familiarity_points += 0.5 * damage + 1.0;
        }
    }

    fn familiarity_bonus(&self, weapon_id: u32) -> f32 {
        self.usage
            .get(&weapon_id)
            .map(|u| u.familiarity_bonus())
            .unwrap_or(0.0)
    }
}

/// Keyed table of infusion ratio definitions, indexed by `Infusion::registry_id`.
#[derive(Debug, Clone, Default)]
pub struct InfusionTable {
    defs: HashMap<u32, InfusionRatios>,
}

impl InfusionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: u32, ratios: InfusionRatios) {
        self.defs.insert(id, ratios);
    }
}

impl InfusionRegistry for InfusionTable {
    fn get(&self, id: u32) -> Option<InfusionRatios> {
        self.defs.get(&id).copied()
    }
}

/// Navigation with no obstruction grid at all: every tile is walkable. Good
/// enough for scripted scenarios that don't model terrain and rely on the
/// obstruction hook (if any) instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFieldNavigation;

impl Navigation for OpenFieldNavigation {
    fn is_tile_blocked(&self, _tile_x: i32, _tile_y: i32) -> bool {
        false
    }
}

/// `Buffs` with nothing active, for runs with no buff system wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuffs;

impl Buffs for NoBuffs {
    fn get_total(&self, _stat_id: i32) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeaponUsage;

    #[test]
    fn weapon_table_tracks_familiarity_and_durability_through_registry_trait() {
        let mut table = WeaponTable::default();
        table.register(WeaponDef {
            id: 1,
            base_damage: 10.0,
            str_scale: 0.5,
            dex_scale: 0.0,
            int_scale: 0.0,
            stamina_mult: 1.0,
            poise_mult: 1.0,
            durability_max: 100.0,
        });
        table.usage.insert(1, WeaponUsage { familiarity_points: 0.0, durability: 100.0 });

        WeaponRegistry::register_hit(&mut table, 1, 20.0);
        assert_eq!(WeaponRegistry::familiarity_bonus(&table, 1), 11.0 / 10_000.0 * 0.10);

        WeaponRegistry::tick_durability(&mut table, 1, 5.0);
        assert_eq!(WeaponRegistry::current_durability(&table, 1), 95.0);
    }

    #[test]
    fn open_field_navigation_never_blocks() {
        let nav = OpenFieldNavigation;
        assert!(!nav.is_tile_blocked(100, -100));
    }

    #[test]
    fn no_buffs_contributes_nothing() {
        assert_eq!(NoBuffs.get_total(0), 0);
    }
}
