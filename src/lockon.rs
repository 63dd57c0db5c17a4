//! Lock-on targeting: radius-gathered candidates, an angle-sorted cycling
//! ring, periodic validation, and a direction query that also snaps facing
//! to the nearest cardinal.

use bevy_math::Vec2;

use crate::types::{Enemy, Facing, Player};

const DEFAULT_RADIUS: f32 = 6.0;
const VALIDATE_RADIUS_MULT: f32 = 1.25;
const CYCLE_COOLDOWN_MS: f32 = 180.0;

/// Reset lock-on state, applying the default radius if none was configured.
pub fn reset(player: &mut Player) {
    player.lock_on.active = false;
    player.lock_on.target_index = None;
    player.lock_on.switch_cooldown_ms = 0.0;
    if player.lock_on.radius <= 0.0 {
        player.lock_on.radius = DEFAULT_RADIUS;
    }
}

fn collect_candidates(player: &Player, enemies: &[Enemy]) -> Vec<usize> {
    let r2 = player.lock_on.radius * player.lock_on.radius;
    enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive() && (e.position - player.position).length_squared() <= r2)
        .map(|(i, _)| i)
        .collect()
}

/// Acquire the best target by `squared_distance + 0.15 * (1 - dot(facing, dir))`.
/// Returns `true` if a target was acquired.
pub fn acquire(player: &mut Player, enemies: &[Enemy]) -> bool {
    let candidates = collect_candidates(player, enemies);
    if candidates.is_empty() {
        player.lock_on.active = false;
        player.lock_on.target_index = None;
        return false;
    }

    let facing = player.facing.to_vec2();
    let mut best_score = f32::MAX;
    let mut best: Option<usize> = None;
    for &idx in &candidates {
        let delta = enemies[idx].position - player.position;
        let mut d2 = delta.length_squared();
        if d2 < 0.0001 {
            d2 = 0.0001;
        }
        let norm = d2.sqrt();
        let dir = delta / norm;
        let ang_bias = (1.0 - dir.dot(facing)).max(0.0);
        let score = d2 + ang_bias * 0.15;
        if score < best_score {
            best_score = score;
            best = Some(idx);
        }
    }

    match best {
        Some(idx) => {
            player.lock_on.active = true;
            player.lock_on.target_index = Some(idx);
            player.lock_on.switch_cooldown_ms = 0.0;
            true
        }
        None => {
            player.lock_on.active = false;
            player.lock_on.target_index = None;
            false
        }
    }
}

/// Drop the current target if it died or left `1.25 * radius`.
pub fn validate(player: &mut Player, enemies: &[Enemy]) {
    if !player.lock_on.active {
        return;
    }
    let Some(idx) = player.lock_on.target_index else {
        player.lock_on.active = false;
        return;
    };
    let Some(enemy) = enemies.get(idx) else {
        player.lock_on.active = false;
        player.lock_on.target_index = None;
        return;
    };
    if !enemy.is_alive() {
        player.lock_on.active = false;
        player.lock_on.target_index = None;
        return;
    }
    let max_r = player.lock_on.radius * VALIDATE_RADIUS_MULT;
    if (enemy.position - player.position).length_squared() > max_r * max_r {
        player.lock_on.active = false;
        player.lock_on.target_index = None;
    }
}

/// Cycle to the next target in the angle-sorted ring. `direction > 0` moves
/// forward (counter-clockwise by atan2 order), `direction <= 0` moves back.
/// No-ops while `switch_cooldown_ms > 0`.
pub fn cycle(player: &mut Player, enemies: &[Enemy], direction: i32) -> bool {
    if player.lock_on.switch_cooldown_ms > 0.0 {
        return false;
    }
    let mut candidates = collect_candidates(player, enemies);
    if candidates.len() <= 1 {
        return false;
    }
    candidates.sort_by(|&a, &b| {
        let da = enemies[a].position - player.position;
        let db = enemies[b].position - player.position;
        da.y.atan2(da.x).partial_cmp(&db.y.atan2(db.x)).unwrap()
    });

    let cur_pos = player
        .lock_on
        .target_index
        .and_then(|t| candidates.iter().position(|&c| c == t));

    let Some(cur_pos) = cur_pos else {
        player.lock_on.target_index = Some(candidates[0]);
        player.lock_on.active = true;
        return true;
    };

    let n = candidates.len() as i32;
    let step = if direction > 0 { 1 } else { -1 };
    let next = ((cur_pos as i32 + step).rem_euclid(n)) as usize;
    if candidates[next] == player.lock_on.target_index.unwrap() {
        return false;
    }
    player.lock_on.target_index = Some(candidates[next]);
    player.lock_on.active = true;
    player.lock_on.switch_cooldown_ms = CYCLE_COOLDOWN_MS;
    true
}

pub fn tick(player: &mut Player, dt_ms: f32) {
    if player.lock_on.switch_cooldown_ms > 0.0 {
        player.lock_on.switch_cooldown_ms -= dt_ms;
        if player.lock_on.switch_cooldown_ms < 0.0 {
            player.lock_on.switch_cooldown_ms = 0.0;
        }
    }
}

/// Unit direction to the locked target, snapping `player.facing` to the
/// nearest cardinal. Returns `None` if no valid target.
pub fn get_dir(player: &mut Player, enemies: &[Enemy]) -> Option<Vec2> {
    validate(player, enemies);
    if !player.lock_on.active {
        return None;
    }
    let idx = player.lock_on.target_index?;
    let enemy = enemies.get(idx)?;
    if !enemy.is_alive() {
        return None;
    }
    let delta = enemy.position - player.position;
    let len = delta.length();
    if len < 0.0001 {
        return None;
    }
    let dir = delta / len;
    player.facing = Facing::from_vec2(dir);
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseStats, CombatStance, CrowdControlTimers, EncumbranceTier, Infusion, LockOnState, ReactionState};

    fn make_player() -> Player {
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
            lock_on: LockOnState { radius: 6.0, ..Default::default() },
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

    // A full forward cycle through four cardinal targets returns to start.
    #[test]
    fn cardinal_ring_full_forward_cycle_returns_to_start() {
        let mut player = make_player();
        let enemies = vec![
            make_enemy(1.5, 0.0),
            make_enemy(0.0, 1.5),
            make_enemy(-1.5, 0.0),
            make_enemy(0.0, -1.5),
        ];
        assert!(acquire(&mut player, &enemies));
        let start = player.lock_on.target_index.unwrap();
        let mut visited = vec![start];
        for _ in 0..4 {
            player.lock_on.switch_cooldown_ms = 0.0;
            cycle(&mut player, &enemies, 1);
            visited.push(player.lock_on.target_index.unwrap());
        }
        assert_eq!(player.lock_on.target_index.unwrap(), start);
        let unique: std::collections::HashSet<_> = visited[0..4].iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn backward_cycle_lands_on_previous_sorted_entry() {
        let mut player = make_player();
        let enemies = vec![
            make_enemy(1.5, 0.0),
            make_enemy(0.0, 1.5),
            make_enemy(-1.5, 0.0),
            make_enemy(0.0, -1.5),
        ];
        acquire(&mut player, &enemies);
        let start = player.lock_on.target_index.unwrap();
        player.lock_on.switch_cooldown_ms = 0.0;
        cycle(&mut player, &enemies, -1);
        assert_ne!(player.lock_on.target_index.unwrap(), start);
    }

    #[test]
    fn cooldown_blocks_cycle() {
        let mut player = make_player();
        let enemies = vec![make_enemy(1.0, 0.0), make_enemy(-1.0, 0.0)];
        acquire(&mut player, &enemies);
        player.lock_on.switch_cooldown_ms = 50.0;
        assert!(!cycle(&mut player, &enemies, 1));
    }

    #[test]
    fn validate_drops_dead_target() {
        let mut player = make_player();
        let mut enemies = vec![make_enemy(1.0, 0.0)];
        acquire(&mut player, &enemies);
        enemies[0].alive = false;
        validate(&mut player, &enemies);
        assert!(!player.lock_on.active);
    }

    #[test]
    fn get_dir_snaps_facing_to_cardinal() {
        let mut player = make_player();
        let enemies = vec![make_enemy(0.1, 3.0)];
        acquire(&mut player, &enemies);
        let dir = get_dir(&mut player, &enemies).unwrap();
        assert!(dir.y > 0.0);
        assert_eq!(player.facing, Facing::Down);
    }
}
