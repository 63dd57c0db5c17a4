//! Strike evaluation.
//!
//! Orchestrates the registry, hit-geometry sweep, mitigation, and
//! damage-event ring into one per-window-activation pass. This is the
//! longest module in the crate: the pipeline has a lot of sequential,
//! order-dependent steps, so they're numbered in the inline comments below.

use bevy_math::Vec2;

use crate::damage_event::{DamageEvent, DamageEventRing};
use crate::external::{
    Buffs, DamageNumberUi, HitFeedback, InfusionRegistry, Navigation, ObstructionHook,
    ObstructionVerdict, Procs, StatCacheSnapshot, WeaponRegistry, STAT_ID_STRENGTH,
};
use crate::geometry::{self, HitSweepMask, HitboxTuning, MismatchCounters, PixelMaskCache, WeaponHitGeo};
use crate::mitigation::{self, Defenses};
use crate::registry::{self, WindowFlags};
use crate::state_machine::{CombatEvent, CombatEventKind, PlayerCombatState};
use crate::types::{DamageType, Enemy, Player};

/// Crit layering mode: whether the crit multiplier is applied to the raw
/// component before mitigation, or to the mitigated result after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CritLayeringMode {
    PreMitigation,
    PostMitigation,
}

/// Bundles every external collaborator + per-call config a strike pass
/// needs, so `process_strike` doesn't take two dozen positional arguments.
pub struct StrikeContext<'a> {
    pub weapons: &'a mut dyn WeaponRegistry,
    pub infusions: &'a dyn InfusionRegistry,
    pub buffs: &'a dyn Buffs,
    pub procs: &'a mut dyn Procs,
    pub navigation: &'a dyn Navigation,
    pub obstruction_hook: Option<&'a dyn ObstructionHook>,
    pub hit_feedback: &'a mut dyn HitFeedback,
    pub damage_ui: &'a mut dyn DamageNumberUi,
    pub ring: &'a mut DamageEventRing,
    pub stats: &'a StatCacheSnapshot,
    pub geo: &'a WeaponHitGeo,
    pub tuning: &'a HitboxTuning,
    pub hit_mask: &'a mut HitSweepMask,
    pub mismatch: &'a mut MismatchCounters,
    pub pixel_cache: Option<&'a mut PixelMaskCache>,
    pub use_pixel_masks: bool,
    pub anim_frame: i32,
    pub strict_team_filter: bool,
    pub crit_layering_mode: CritLayeringMode,
    /// Test hook: `Some(true/false)` forces every crit roll this pass; `None` rolls normally.
    pub force_crit_mode: Option<bool>,
    /// Test hook: keeps hit targets stationary instead of applying knockback,
    /// so repeated strikes in a fixture don't drift.
    pub forced_attack_test_mode: bool,
}

fn line_of_sight_blocked(start: Vec2, end: Vec2, navigation: &dyn Navigation) -> bool {
    let tx0 = start.x.floor() as i32;
    let ty0 = start.y.floor() as i32;
    let tx1 = end.x.floor() as i32;
    let ty1 = end.y.floor() as i32;
    let steps = (tx1 - tx0).abs().max((ty1 - ty0).abs()).max(1);
    let fx = (tx1 - tx0) as f32 / steps as f32;
    let fy = (ty1 - ty0) as f32 / steps as f32;
    let mut sx = tx0 as f32 + 0.5;
    let mut sy = ty0 as f32 + 0.5;
    for _ in 0..=steps {
        let cx = sx.floor() as i32;
        let cy = sy.floor() as i32;
        if !(cx == tx0 && cy == ty0) && !(cx == tx1 && cy == ty1) && navigation.is_tile_blocked(cx, cy) {
            return true;
        }
        sx += fx;
        sy += fy;
    }
    false
}

fn knockback_magnitude(player_level: u32, enemy_level: u32, player_strength: f32, enemy_strength_proxy: f32) -> f32 {
    let lvl_diff = (player_level as f32 - enemy_level as f32).max(0.0).min(20.0);
    let str_diff = (player_strength - enemy_strength_proxy).max(0.0).min(60.0);
    (0.18 + 0.02 * lvl_diff + 0.015 * str_diff).min(0.55)
}

/// Run one strike-phase pass: activate windows, emit begin/end events, and
/// for every newly-active window process its hits. Returns the number of
/// enemies killed this call. No-ops outside `Phase::Strike`.
pub fn process_strike(
    state: &mut PlayerCombatState,
    player: &mut Player,
    enemies: &mut [Enemy],
    ctx: &mut StrikeContext,
    rng_unit: &mut impl FnMut() -> f32,
) -> u32 {
    use crate::types::Phase;
    if state.phase != Phase::Strike {
        return 0;
    }

    // Belt-and-suspenders reset for unit tests that call this directly
    // instead of going through the state machine's Windup->Strike transition.
    if state.processed_window_mask == 0 && state.emitted_events_mask == 0 {
        ctx.hit_mask.reset();
    }
    if state.strike_time_ms <= 0.0 && state.processed_window_mask != 0 {
        state.processed_window_mask = 0;
        state.emitted_events_mask = 0;
        state.event_count = 0;
    }

    let def = state.current_def();
    let mut newly_active_mask = 0u32;
    if let Some(d) = def {
        if d.num_windows() > 0 {
            for wi in 0..d.num_windows().min(registry::MAX_WINDOWS) {
                let w = d.windows[wi].unwrap();
                let bit = 1u32 << wi;
                if w.contains(state.strike_time_ms) {
                    newly_active_mask |= bit;
                    if state.emitted_events_mask & bit == 0 {
                        state.push_event(CombatEvent {
                            kind: CombatEventKind::WindowBegin,
                            window_index: wi,
                            enemy_index: None,
                        });
                        state.emitted_events_mask |= bit;
                    }
                } else if state.emitted_events_mask & bit != 0 && state.processed_window_mask & bit == 0 {
                    // Natural end without processing: emit END but do not mark processed,
                    // so a later jump back into this window can still apply damage.
                    state.push_event(CombatEvent {
                        kind: CombatEventKind::WindowEnd,
                        window_index: wi,
                        enemy_index: None,
                    });
                }
            }
        } else {
            newly_active_mask = if state.strike_time_ms >= d.active_ms { 0 } else { 1 };
        }
    }

    let process_mask = newly_active_mask & !state.processed_window_mask;
    if process_mask == 0 {
        return 0;
    }

    let mut kills = 0u32;

    for wi in 0..registry::MAX_WINDOWS {
        if process_mask & (1u32 << wi) == 0 {
            continue;
        }
        ctx.hit_mask.reset();

        let mut window_mult = 1.0f32;
        let mut bleed_build = 0.0f32;
        let mut frost_build = 0.0f32;
        if let Some(d) = def {
            if wi < d.num_windows() {
                if let Some(w) = d.windows[wi] {
                    if w.damage_mult > 0.0 {
                        window_mult = w.damage_mult;
                    }
                    bleed_build = w.bleed_build;
                    frost_build = w.frost_build;
                    if w.flags.has(WindowFlags::HYPER_ARMOR) {
                        state.set_hyper_armor(true);
                    }
                }
            }
        }

        let lock_on_target = if player.lock_on.active { player.lock_on.target_index } else { None };
        let sweep = geometry::sweep(
            player,
            ctx.geo,
            ctx.tuning,
            enemies,
            ctx.anim_frame,
            ctx.use_pixel_masks,
            ctx.pixel_cache.as_deref_mut(),
            ctx.hit_mask,
            ctx.mismatch,
            lock_on_target,
        );

        let mut first_strike_enemy_processed = false;

        for (si, (i, normal)) in sweep.hits.iter().copied().enumerate() {
            if i >= enemies.len() || !enemies[i].is_alive() {
                continue;
            }
            if ctx.strict_team_filter {
                if enemies[i].team_id == player.team_id {
                    continue;
                }
            } else if enemies[i].team_id != 0 && player.team_id != 0 && enemies[i].team_id == player.team_id {
                continue;
            }

            let ex = enemies[i].position.x;
            let ey = enemies[i].position.y;

            // 1. Base damage.
            let effective_strength = player.stats.strength + ctx.buffs.get_total(STAT_ID_STRENGTH) as f32;
            let mut scaled = 1.0 + effective_strength / 5.0;
            if let Some(d) = def {
                scaled = d.base_damage
                    + effective_strength * d.str_scale
                    + player.stats.dexterity * d.dex_scale
                    + player.stats.intelligence * d.int_scale;
                if scaled < 1.0 {
                    scaled = 1.0;
                }
            }

            let combo_scale = (1.0 + state.combo as f32 * 0.08).min(1.4);

            let wdef = player.equipped_weapon_id.and_then(|id| ctx.weapons.get(id)).cloned();
            let sm = player.stance.multipliers();
            let inf = ctx.infusions.get(player.weapon_infusion.registry_id());

            if let Some(wd) = &wdef {
                scaled += wd.base_damage;
                scaled += player.stats.strength * wd.str_scale
                    + player.stats.dexterity * wd.dex_scale
                    + player.stats.intelligence * wd.int_scale;
            }

            let fam_bonus = player.equipped_weapon_id.map(|id| ctx.weapons.familiarity_bonus(id)).unwrap_or(0.0);
            let durability_mult = match &wdef {
                Some(wd) => {
                    let cur = ctx.weapons.current_durability(wd.id);
                    if cur > 0.0 {
                        let max = if wd.durability_max > 0.0 { wd.durability_max } else { 1.0 };
                        let pct = cur / max;
                        if pct < 0.5 { 0.70 + 0.30 * (pct / 0.5) } else { 1.0 }
                    } else {
                        1.0
                    }
                }
                None => 1.0,
            };

            // 2. Composite damage.
            let base_composite =
                scaled * combo_scale * window_mult * sm.damage * (1.0 + fam_bonus) * durability_mult;
            let mut comp_phys = base_composite;
            let mut comp_fire = 0.0f32;
            let mut comp_frost = 0.0f32;
            let mut comp_arc = 0.0f32;
            if let Some(inf) = &inf {
                comp_fire = base_composite * inf.fire_add;
                comp_frost = base_composite * inf.frost_add;
                comp_arc = base_composite * inf.arcane_add;
                comp_phys = base_composite * inf.phys_scalar;
            }

            // 3. One-shot multipliers, consumed atomically.
            let mut raw = comp_phys + comp_fire + comp_frost + comp_arc;
            if state.aerial_attack_pending {
                raw *= 1.20;
                state.aerial_attack_pending = false;
                state.landing_lag_ms += 120.0;
            }
            if state.backstab_pending_mult > 1.0 {
                raw *= state.backstab_pending_mult;
                state.backstab_pending_mult = 1.0;
            }
            if state.riposte_pending_mult > 1.0 {
                raw *= state.riposte_pending_mult;
                state.riposte_pending_mult = 1.0;
            }
            if state.guard_break_pending_mult > 1.0 {
                raw *= state.guard_break_pending_mult;
                state.guard_break_pending_mult = 1.0;
            }
            if state.pending_charge_damage_mult > 1.0 {
                raw *= state.pending_charge_damage_mult;
            }

            // 4. Re-partition the post-multiplier raw back into components.
            let t_parts_sum = comp_phys + comp_fire + comp_frost + comp_arc;
            let t_parts = if t_parts_sum.abs() < 0.0001 { 1.0 } else { t_parts_sum };
            let mut part_phys = raw * (comp_phys / t_parts);
            let mut part_fire = raw * (comp_fire / t_parts);
            let mut part_frost = raw * (comp_frost / t_parts);
            let mut part_arc = raw * (comp_arc / t_parts);

            // 5. Combo floor.
            let mut dmg = (raw + 0.5).floor() as i32;
            if state.combo > 0 {
                let mut min_noncrit = (scaled + state.combo as f32 + 0.5).floor() as i32;
                let hard_cap = (scaled * 1.4 + 0.5).floor() as i32;
                if min_noncrit > hard_cap {
                    min_noncrit = hard_cap;
                }
                if dmg < min_noncrit {
                    dmg = min_noncrit;
                }
            }

            // 6. Obstruction.
            let mut obstructed = false;
            let mut override_used = false;
            if let Some(hook) = ctx.obstruction_hook {
                match hook.test(player.position.x, player.position.y, ex, ey) {
                    ObstructionVerdict::Clear => {
                        obstructed = false;
                        override_used = true;
                    }
                    ObstructionVerdict::Blocked => {
                        obstructed = true;
                        override_used = true;
                    }
                    ObstructionVerdict::Defer => {}
                }
            }
            if !override_used {
                obstructed = line_of_sight_blocked(player.position, Vec2::new(ex, ey), ctx.navigation);
            }
            if obstructed {
                let atten = 0.55;
                part_phys *= atten;
                part_fire *= atten;
                part_frost *= atten;
                part_arc *= atten;
                raw *= atten;
                dmg = ((raw + 0.5).floor() as i32).max(1);
            }

            // 7. Crit.
            let raw_total = dmg as f32;
            let dex_bonus = (player.stats.dexterity * 0.0035).min(0.55);
            let crit_chance = (0.05
                + dex_bonus
                + player.crit_chance * 0.01
                + ctx.stats.crit_rating_percent * 0.01)
                .min(0.80);
            let is_crit = if state.force_crit_next_strike {
                state.force_crit_next_strike = false;
                true
            } else if let Some(forced) = ctx.force_crit_mode {
                forced
            } else {
                rng_unit() < crit_chance
            };
            let crit_mult = if is_crit { (1.0 + player.crit_damage * 0.01).min(5.0) } else { 1.0 };

            // 8. Mitigation with penetration.
            let health_before = enemies[i].health;
            let mut final_dmg = 0i32;
            let mut overkill_accum = 0i32;

            let eff_armor = {
                let mut a = enemies[i].armor;
                if player.armor_pen_flat > 0 {
                    a = (a - player.armor_pen_flat).max(0);
                }
                let pen_pct = player.armor_pen_percent.min(100);
                if pen_pct > 0 {
                    let reduce = (enemies[i].armor * pen_pct) / 100;
                    a = (a - reduce).max(0);
                }
                a
            };

            if part_phys > 0.01 {
                let mut comp_raw = ((part_phys + 0.5).floor() as i32).max(1);
                if is_crit && ctx.crit_layering_mode == CritLayeringMode::PreMitigation {
                    comp_raw = (((comp_raw as f32) * crit_mult + 0.5).floor() as i32).max(1);
                }
                let defenses = Defenses { armor: eff_armor, resist_physical: enemies[i].resist_physical, ..Default::default() };
                let mr = mitigation::mitigate(comp_raw, DamageType::Physical, defenses, enemies[i].health as i32);
                let mut mitig = mr.mitigated;
                if is_crit && ctx.crit_layering_mode == CritLayeringMode::PostMitigation {
                    mitig = (((mitig as f32) * crit_mult + 0.5).floor() as i32).max(1);
                }
                enemies[i].health -= mitig as f32;
                final_dmg += mitig;
                overkill_accum += mr.overkill;
                ctx.damage_ui.spawn(ex, ey - 0.25, mitig, true, is_crit);
                ctx.ring.record(DamageEvent {
                    attack_id: def.map(|d| d.id).unwrap_or(0),
                    damage_type: Some(DamageType::Physical),
                    crit: is_crit,
                    raw_damage: comp_raw,
                    mitigated: mitig,
                    overkill: mr.overkill,
                    execution: false,
                });
            }

            for (part, dmg_type, resist) in [
                (part_fire, DamageType::Fire, enemies[i].resist_fire),
                (part_frost, DamageType::Frost, enemies[i].resist_frost),
                (part_arc, DamageType::Arcane, enemies[i].resist_arcane),
            ] {
                if part <= 0.01 {
                    continue;
                }
                let mut comp_raw = ((part + 0.5).floor() as i32).max(1);
                if is_crit && ctx.crit_layering_mode == CritLayeringMode::PreMitigation {
                    comp_raw = (((comp_raw as f32) * crit_mult + 0.5).floor() as i32).max(1);
                }
                let defenses = match dmg_type {
                    DamageType::Fire => Defenses { resist_fire: resist, ..Default::default() },
                    DamageType::Frost => Defenses { resist_frost: resist, ..Default::default() },
                    DamageType::Arcane => Defenses { resist_arcane: resist, ..Default::default() },
                    _ => Defenses::default(),
                };
                let mr = mitigation::mitigate(comp_raw, dmg_type, defenses, enemies[i].health as i32);
                let mut mitig = mr.mitigated;
                if is_crit && ctx.crit_layering_mode == CritLayeringMode::PostMitigation {
                    mitig = (((mitig as f32) * crit_mult + 0.5).floor() as i32).max(1);
                }
                enemies[i].health -= mitig as f32;
                final_dmg += mitig;
                overkill_accum += mr.overkill;
                ctx.damage_ui.spawn(ex, ey - 0.25, mitig, true, is_crit);
                ctx.ring.record(DamageEvent {
                    attack_id: def.map(|d| d.id).unwrap_or(0),
                    damage_type: Some(dmg_type),
                    crit: is_crit,
                    raw_damage: comp_raw,
                    mitigated: mitig,
                    overkill: mr.overkill,
                    execution: false,
                });
            }

            // 9. Execution detection.
            let mut execution = false;
            if health_before > 0.0 {
                let health_after = enemies[i].health;
                if health_after <= 0.0 {
                    let max_health = if enemies[i].max_health > 0.0 { enemies[i].max_health } else { 1.0 };
                    let health_pct_before = health_before / max_health;
                    let overkill_pct = overkill_accum as f32 / max_health;
                    if health_pct_before <= 0.15 || overkill_pct >= 0.25 {
                        execution = true;
                    }
                }
            }

            ctx.ring.record(DamageEvent {
                attack_id: def.map(|d| d.id).unwrap_or(0),
                damage_type: Some(def.map(|d| d.damage_type).unwrap_or(DamageType::Physical)),
                crit: is_crit,
                raw_damage: (raw_total + 0.5).floor() as i32,
                mitigated: final_dmg,
                overkill: overkill_accum,
                execution,
            });

            // 10. Feedback.
            enemies[i].hurt_timer = 150.0;
            enemies[i].flash_timer = 90.0;
            state.hit_confirmed = true;

            let mag = knockback_magnitude(
                player.stats.level,
                enemies[i].level,
                player.stats.strength,
                enemies[i].armor as f32,
            );
            if !ctx.forced_attack_test_mode {
                enemies[i].position += normal * mag;
            }
            if !first_strike_enemy_processed {
                ctx.hit_feedback.extend_hitstop(55.0);
                first_strike_enemy_processed = true;
            }
            if si == 0 {
                ctx.hit_feedback.play_impact_sfx(is_crit);
            }
            let was_overkill = execution;
            let particle_count = if was_overkill { 24 } else { 10 + (rng_unit() * 5.0) as u32 };
            ctx.hit_feedback.spawn_impact_particles(ex, ey, particle_count, was_overkill);
            if was_overkill {
                ctx.hit_feedback.mark_explosion_frame();
            }

            // 11. Bleed/frost buildup.
            let inf_bleed_add = inf.map(|r| r.bleed_build_add).unwrap_or(0.0);
            if bleed_build > 0.0 || inf_bleed_add > 0.0 {
                enemies[i].bleed_buildup += bleed_build + inf_bleed_add;
            }
            if frost_build > 0.0 {
                enemies[i].frost_buildup += frost_build;
            }

            // 12. Poise/stagger.
            if let Some(d) = def {
                if d.poise_damage > 0 && enemies[i].poise_max > 0.0 {
                    let mut poise_dmg = d.poise_damage as f32;
                    if let Some(wd) = &wdef {
                        poise_dmg *= wd.poise_mult;
                    }
                    poise_dmg *= sm.poise_damage;
                    if let Some(inf) = &inf {
                        poise_dmg *= inf.phys_scalar;
                    }
                    enemies[i].poise = (enemies[i].poise - poise_dmg).max(0.0);
                    if enemies[i].poise <= 0.0 && !enemies[i].staggered {
                        enemies[i].staggered = true;
                        enemies[i].stagger_timer_ms = 600.0;
                        state.push_event(CombatEvent {
                            kind: CombatEventKind::Stagger,
                            window_index: wi,
                            enemy_index: Some(i),
                        });
                    }
                }
            }

            // 13. Death + weapon updates.
            if enemies[i].health <= 0.0 {
                enemies[i].alive = false;
                kills += 1;
                ctx.procs.on_kill();
            }
            if let Some(wd) = &wdef {
                ctx.weapons.register_hit(wd.id, final_dmg as f32);
                ctx.weapons.tick_durability(wd.id, 1.0);
            }
            if final_dmg > 0 {
                ctx.procs.on_hit();
            }
            if is_crit {
                ctx.procs.on_crit();
            }
        }
    }

    // 14. Cleanup.
    state.processed_window_mask |= process_mask;
    if let Some(d) = def {
        for wi in 0..d.num_windows().min(registry::MAX_WINDOWS) {
            if process_mask & (1u32 << wi) != 0 {
                state.push_event(CombatEvent {
                    kind: CombatEventKind::WindowEnd,
                    window_index: wi,
                    enemy_index: None,
                });
            }
        }
    }
    let still_in_hyper_armor_window = def
        .map(|d| d.active_window_mask(state.strike_time_ms) & d.flags_hyper_armor_mask() != 0)
        .unwrap_or(false);
    if !still_in_hyper_armor_window {
        state.set_hyper_armor(false);
    }
    if state.pending_charge_damage_mult > 1.0 {
        state.pending_charge_damage_mult = 1.0;
    }

    kills
}
