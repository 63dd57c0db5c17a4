//! Defensive resolution: incoming melee pipeline, guard meter, poise regen.

use bevy_math::Vec2;

use crate::external::{Procs, StatCacheSnapshot};
use crate::reaction;
use crate::types::{Player, ReactionType};

const GUARD_CONE_DOT: f32 = 0.25;
const GUARD_CHIP_PCT: f32 = 0.20;
const GUARD_METER_DRAIN_ON_BLOCK: f32 = 8.0;
const GUARD_BLOCK_POISE_SCALE: f32 = 0.40;
const PERFECT_GUARD_REFUND: f32 = 15.0;
const PERFECT_GUARD_POISE_BONUS: f32 = 10.0;
const POISE_REGEN_DELAY_AFTER_HIT: f32 = 650.0;

const GUARD_METER_DRAIN_HOLD_PER_MS: f32 = 0.05;
const GUARD_METER_RECOVER_PER_MS: f32 = 0.08;
const POISE_REGEN_BASE_PER_MS: f32 = 0.02;

#[derive(Debug, Clone, Copy, Default)]
pub struct MeleeOutcome {
    pub damage: i32,
    pub blocked: bool,
    pub perfect: bool,
}

/// Run incoming melee damage through the full defensive pipeline: god mode,
/// i-frames, passive block, active guard/perfect guard, poise/reaction
/// trigger, physical→elemental conversion, absorb pool, thorns telemetry.
pub fn apply_incoming_melee(
    player: &mut Player,
    raw_damage: f32,
    attack_dir: Vec2,
    poise_damage: i32,
    stats: &StatCacheSnapshot,
    procs: &mut dyn Procs,
    hyper_armor_active: bool,
    rng_roll_100: impl FnOnce() -> i32,
) -> MeleeOutcome {
    if player.god_mode {
        return MeleeOutcome::default();
    }
    if player.iframes_ms > 0.0 {
        return MeleeOutcome::default();
    }

    let raw_damage = raw_damage.max(0.0);
    let facing = player.facing.to_vec2();
    let alen = attack_dir.length();
    let attack_dir = if alen > 0.0001 { attack_dir / alen } else { attack_dir };
    let dot = facing.dot(attack_dir);

    // Passive block chance, independent of active guarding.
    let passive_block = stats.block_chance > 0 && rng_roll_100() < stats.block_chance;

    if player.guarding && player.guard_meter > 0.0 && dot >= GUARD_CONE_DOT {
        let perfect = player.guard_active_time_ms <= player.perfect_guard_window_ms;
        let mut chip = if perfect {
            player.guard_meter = (player.guard_meter + PERFECT_GUARD_REFUND).min(player.guard_meter_max);
            player.poise = (player.poise + PERFECT_GUARD_POISE_BONUS).min(player.poise_max);
            0.0
        } else {
            player.guard_meter = (player.guard_meter - GUARD_METER_DRAIN_ON_BLOCK).max(0.0);
            if poise_damage > 0 {
                let pd = poise_damage as f32 * GUARD_BLOCK_POISE_SCALE;
                player.poise = (player.poise - pd).max(0.0);
                player.poise_regen_delay_ms = POISE_REGEN_DELAY_AFTER_HIT;
            }
            (raw_damage * GUARD_CHIP_PCT).max(if raw_damage > 0.0 { 1.0 } else { 0.0 })
        };

        procs.on_block();
        if chip > 0.0 && procs.absorb_pool() > 0 {
            let consumed = procs.consume_absorb(chip as i32);
            chip = (chip - consumed as f32).max(0.0);
        }

        return MeleeOutcome { damage: chip as i32, blocked: true, perfect };
    }

    if passive_block {
        let red = stats.block_value.max(0);
        let mut remaining = (raw_damage - red as f32).max(0.0);
        procs.on_block();
        if remaining > 0.0 && procs.absorb_pool() > 0 {
            let consumed = procs.consume_absorb(remaining as i32);
            remaining = (remaining - consumed as f32).max(0.0);
        }
        return MeleeOutcome { damage: remaining as i32, blocked: true, perfect: false };
    }

    let mut triggered_reaction = false;
    if poise_damage > 0 && !hyper_armor_active {
        let before = player.poise;
        player.poise = (player.poise - poise_damage as f32).max(0.0);
        if before > 0.0 && player.poise <= 0.0 {
            reaction::apply_reaction(player, ReactionType::Stagger);
            triggered_reaction = true;
        }
    }
    if !triggered_reaction {
        if raw_damage >= 80.0 {
            reaction::apply_reaction(player, ReactionType::Knockdown);
        } else if raw_damage >= 25.0 {
            reaction::apply_reaction(player, ReactionType::LightFlinch);
        }
    }
    player.poise_regen_delay_ms = POISE_REGEN_DELAY_AFTER_HIT;

    // Conversion: physical -> fire/frost/arcane, total capped at 95% so at
    // least 5% stays physical; renormalized if the parts would exceed the
    // remaining physical amount (conservation).
    let remain_phys = raw_damage.max(0.0);
    let c_fire = stats.phys_conv_fire_pct.max(0);
    let c_frost = stats.phys_conv_frost_pct.max(0);
    let c_arc = stats.phys_conv_arcane_pct.max(0);
    let total_conv = (c_fire + c_frost + c_arc).min(95);

    let (fire_amt, frost_amt, arc_amt, remain_phys) = if total_conv > 0 && remain_phys > 0.0 {
        let mut fire_amt = remain_phys * (c_fire as f32 / 100.0);
        let mut frost_amt = remain_phys * (c_frost as f32 / 100.0);
        let mut arc_amt = remain_phys * (c_arc as f32 / 100.0);
        let sum = fire_amt + frost_amt + arc_amt;
        if sum > remain_phys {
            let scale = remain_phys / sum;
            fire_amt *= scale;
            frost_amt *= scale;
            arc_amt *= scale;
        }
        (fire_amt, frost_amt, arc_amt, remain_phys - (fire_amt + frost_amt + arc_amt))
    } else {
        (0.0, 0.0, 0.0, remain_phys)
    };
    let mut total_damage = remain_phys + fire_amt + frost_amt + arc_amt;

    if total_damage > 0.0 && procs.absorb_pool() > 0 {
        let consumed = procs.consume_absorb(total_damage as i32);
        total_damage = (total_damage - consumed as f32).max(0.0);
    }

    // Thorns: reflect percent of final damage, capped. The attacker isn't
    // hooked into this path yet, so the reflect amount is telemetry-only.
    if stats.thorns_percent > 0 && total_damage > 0.0 {
        let mut reflect = (total_damage * stats.thorns_percent as f32 / 100.0) as i32;
        if stats.thorns_cap > 0 && reflect > stats.thorns_cap {
            reflect = stats.thorns_cap;
        }
        let _ = reflect;
    }

    MeleeOutcome { damage: total_damage as i32, blocked: false, perfect: false }
}

/// Tick guard meter drain/recovery and poise regen for one frame.
pub fn update_guard(player: &mut Player, dt_ms: f32, guard_recovery_pct: f32) {
    let rec_mult = (1.0 + guard_recovery_pct / 100.0).clamp(0.10, 3.0);
    if player.guarding {
        player.guard_active_time_ms += dt_ms;
        let drain_mult = (1.0 - guard_recovery_pct / 150.0).max(0.25);
        player.guard_meter -= dt_ms * GUARD_METER_DRAIN_HOLD_PER_MS * drain_mult;
        if player.guard_meter <= 0.0 {
            player.guard_meter = 0.0;
            player.guarding = false;
        }
    } else {
        player.guard_meter = (player.guard_meter + dt_ms * GUARD_METER_RECOVER_PER_MS * rec_mult)
            .min(player.guard_meter_max);
    }
    poise_regen_tick(player, dt_ms);
}

/// Delayed, non-linear poise regeneration: accelerates as poise gets lower.
pub fn poise_regen_tick(player: &mut Player, dt_ms: f32) {
    if player.poise_regen_delay_ms > 0.0 {
        player.poise_regen_delay_ms = (player.poise_regen_delay_ms - dt_ms).max(0.0);
    }
    if player.poise_regen_delay_ms <= 0.0 && player.poise < player.poise_max {
        let missing = player.poise_max - player.poise;
        let ratio = (missing / player.poise_max).clamp(0.0, 1.0);
        let regen = (POISE_REGEN_BASE_PER_MS * dt_ms) * (1.0 + 1.75 * ratio * ratio);
        player.poise = (player.poise + regen).min(player.poise_max);
    }
}

/// Begin active guarding in the given facing direction. Fails (and clears
/// `guarding`) if the guard meter is already empty.
pub fn begin_guard(player: &mut Player) -> bool {
    if player.guard_meter <= 0.0 {
        player.guarding = false;
        return false;
    }
    player.guarding = true;
    player.guard_active_time_ms = 0.0;
    true
}
