//! Black-box lock-on invariants not already covered by `lockon.rs`'s own
//! unit tests: acquisition scoring against facing, and out-of-range drop.

use bevy_math::Vec2;
use strikecore::lockon;
use strikecore::types::{
    BaseStats, CombatStance, CrowdControlTimers, EncumbranceTier, Enemy, Facing, Infusion,
    LockOnState, Player, ReactionState,
};

fn make_player(radius: f32) -> Player {
    Player {
        position: Vec2::ZERO,
        facing: Facing::Down,
        team_id: 1,
        stats: BaseStats::default(),
        crit_chance: 0.0,
        crit_damage: 0.0,
        armor_pen_flat: 0,
        armor_pen_percent: 0,
        guard_meter: 100.0,
        guard_meter_max: 100.0,
        guarding: false,
        guard_active_time_ms: 0.0,
        perfect_guard_window_ms: 120.0,
        poise: 50.0,
        poise_max: 50.0,
        poise_regen_delay_ms: 0.0,
        iframes_ms: 0.0,
        reaction: ReactionState::default(),
        cc: CrowdControlTimers::default(),
        lock_on: LockOnState { radius, ..Default::default() },
        encumbrance: EncumbranceTier::Light,
        stance: CombatStance::Balanced,
        equipped_weapon_id: None,
        weapon_infusion: Infusion::None,
        god_mode: false,
    }
}

fn make_enemy(x: f32, y: f32) -> Enemy {
    Enemy {
        alive: true,
        team_id: 2,
        position: Vec2::new(x, y),
        facing: Facing::Left,
        health: 100.0,
        max_health: 100.0,
        armor: 0,
        resist_physical: 0,
        resist_fire: 0,
        resist_frost: 0,
        resist_arcane: 0,
        resist_bleed: 0,
        resist_poison: 0,
        poise: 20.0,
        poise_max: 20.0,
        staggered: false,
        stagger_timer_ms: 0.0,
        bleed_buildup: 0.0,
        frost_buildup: 0.0,
        level: 1,
        hurt_timer: 0.0,
        flash_timer: 0.0,
        radius: 0.4,
    }
}

#[test]
fn acquire_prefers_the_facing_aligned_target_over_a_slightly_closer_off_angle_one() {
    let mut player = make_player(10.0);
    player.facing = Facing::Up;
    // Directly behind (closer) vs. directly ahead (matches facing): the
    // angular bias term should be able to flip the choice when distances
    // are close enough.
    let enemies = vec![make_enemy(0.0, 1.0), make_enemy(0.0, -1.02)];
    assert!(lockon::acquire(&mut player, &enemies));
    assert_eq!(player.lock_on.target_index, Some(1));
}

#[test]
fn acquire_finds_nothing_outside_radius() {
    let mut player = make_player(2.0);
    let enemies = vec![make_enemy(50.0, 50.0)];
    assert!(!lockon::acquire(&mut player, &enemies));
    assert!(!player.lock_on.active);
}

#[test]
fn validate_drops_target_once_it_leaves_the_extended_radius() {
    let mut player = make_player(2.0);
    let mut enemies = vec![make_enemy(1.0, 0.0)];
    assert!(lockon::acquire(&mut player, &enemies));
    enemies[0].position = Vec2::new(100.0, 0.0);
    lockon::validate(&mut player, &enemies);
    assert!(!player.lock_on.active);
}

#[test]
fn validate_keeps_target_within_extended_radius_band() {
    let mut player = make_player(2.0);
    let enemies = vec![make_enemy(2.4, 0.0)];
    assert!(lockon::acquire(&mut player, &enemies));
    lockon::validate(&mut player, &enemies);
    assert!(player.lock_on.active);
}

#[test]
fn tick_counts_switch_cooldown_down_to_zero_without_going_negative() {
    let mut player = make_player(5.0);
    player.lock_on.switch_cooldown_ms = 10.0;
    lockon::tick(&mut player, 6.0);
    assert_eq!(player.lock_on.switch_cooldown_ms, 4.0);
    lockon::tick(&mut player, 30.0);
    assert_eq!(player.lock_on.switch_cooldown_ms, 0.0);
}

#[test]
fn get_dir_returns_none_without_an_active_lock() {
    let mut player = make_player(5.0);
    let enemies = vec![make_enemy(1.0, 0.0)];
    assert!(lockon::get_dir(&mut player, &enemies).is_none());
}
