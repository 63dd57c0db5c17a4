//! External collaborator interfaces.
//!
//! Everything the core consumes but does not own: navigation queries, the
//! aggregated stat cache, buffs, procs, the weapon/infusion registries, and
//! the presentation-layer hooks (hit feedback, damage-number UI). These are
//! specified as contracts, not concrete names, so each is a small trait a
//! real integration implements against its own systems; the headless CLI and
//! the unit tests use the plain in-memory stand-ins below.

use crate::types::{InfusionRatios, WeaponDef};

/// Coarse obstruction grid query, consulted by the strike obstruction check
/// only when no `ObstructionHook` override is installed.
pub trait Navigation {
    fn is_tile_blocked(&self, tile_x: i32, tile_y: i32) -> bool;
}

/// Verdict from an installed obstruction test hook: `0` clear, `1` blocked,
/// anything else defers to the `Navigation` DDA walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstructionVerdict {
    Clear,
    Blocked,
    Defer,
}

/// Optional line-test override, installed at runtime (often by tests). When
/// present its verdict is authoritative over the `Navigation` DDA walk.
pub trait ObstructionHook {
    fn test(&self, sx: f32, sy: f32, ex: f32, ey: f32) -> ObstructionVerdict;
}

/// Aggregated defensive/offensive stat-cache snapshot consumed by
/// `defense::apply_incoming_melee` and `strike` crit scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatCacheSnapshot {
    pub block_chance: i32,
    pub block_value: i32,
    pub guard_recovery_pct: f32,
    pub phys_conv_fire_pct: i32,
    pub phys_conv_frost_pct: i32,
    pub phys_conv_arcane_pct: i32,
    pub thorns_percent: i32,
    pub thorns_cap: i32,
    pub crit_rating_percent: f32,
}

/// Stat id consumed by `Buffs::get_total` for the strength bonus folded into
/// strike base-damage scaling.
pub const STAT_ID_STRENGTH: i32 = 0;

/// Additive stat bonuses contributed by active buffs.
pub trait Buffs {
    fn get_total(&self, stat_id: i32) -> i32;
}

/// Proc event triggers plus reactive-shield absorb bookkeeping.
pub trait Procs {
    fn on_block(&mut self);
    fn on_hit(&mut self);
    fn on_crit(&mut self);
    fn on_kill(&mut self);
    fn absorb_pool(&self) -> i32;
    fn consume_absorb(&mut self, amount: i32) -> i32;
}

/// A `Procs` implementation that does nothing, for callers with no proc
/// system wired up yet (unit tests, the headless CLI without `--procs`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProcs;

impl Procs for NullProcs {
    fn on_block(&mut self) {}
    fn on_hit(&mut self) {}
    fn on_crit(&mut self) {}
    fn on_kill(&mut self) {}
    fn absorb_pool(&self) -> i32 {
        0
    }
    fn consume_absorb(&mut self, _amount: i32) -> i32 {
        0
    }
}

/// Weapon registry: definitions plus mutable per-weapon usage/durability.
pub trait WeaponRegistry {
    fn get(&self, weapon_id: u32) -> Option<&WeaponDef>;
    fn current_durability(&self, weapon_id: u32) -> f32;
    fn tick_durability(&mut self, weapon_id: u32, amount: f32);
    fn register_hit(&mut self, weapon_id: u32, damage: f32);
    fn familiarity_bonus(&self, weapon_id: u32) -> f32;
}

/// Infusion registry: ratio/bonus definitions by id.
pub trait InfusionRegistry {
    fn get(&self, id: u32) -> Option<InfusionRatios>;
}

/// Presentation-layer hit feedback hooks. The core calls these but owns none
/// of the underlying particle/SFX/hitstop systems.
pub trait HitFeedback {
    fn spawn_impact_particles(&mut self, x: f32, y: f32, count: u32, overkill: bool);
    fn play_impact_sfx(&mut self, crit: bool);
    fn extend_hitstop(&mut self, ms: f32);
    fn mark_explosion_frame(&mut self);
}

/// A `HitFeedback` implementation that does nothing, for headless contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHitFeedback;

impl HitFeedback for NullHitFeedback {
    fn spawn_impact_particles(&mut self, _x: f32, _y: f32, _count: u32, _overkill: bool) {}
    fn play_impact_sfx(&mut self, _crit: bool) {}
    fn extend_hitstop(&mut self, _ms: f32) {}
    fn mark_explosion_frame(&mut self) {}
}

/// Floating damage-number spawner.
pub trait DamageNumberUi {
    fn spawn(&mut self, x: f32, y: f32, amount: i32, from_player: bool, crit: bool);
}

/// A `DamageNumberUi` implementation that does nothing, for headless contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDamageNumberUi;

impl DamageNumberUi for NullDamageNumberUi {
    fn spawn(&mut self, _x: f32, _y: f32, _amount: i32, _from_player: bool, _crit: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_procs_absorbs_nothing() {
        let mut p = NullProcs;
        assert_eq!(p.absorb_pool(), 0);
        assert_eq!(p.consume_absorb(50), 0);
    }
}
