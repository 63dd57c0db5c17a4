//! Hit geometry sweep.
//!
//! Swept-capsule broad-phase test plus an optional bit-packed pixel-mask
//! path. The two paths run independently and are compared; mismatches are
//! tracked as counters rather than surfaced as errors, since the pixel path
//! is considered authoritative whenever it's active.

use bevy_math::Vec2;

use crate::types::{Enemy, Facing, Player};

pub const MAX_HITS: usize = 32;
const ENEMY_AABB_PAD: f32 = 0.6;
const DEFAULT_ENEMY_RADIUS: f32 = 0.40;
const DEFAULT_WEAPON_LENGTH: f32 = 1.6;
const DEFAULT_WEAPON_WIDTH: f32 = 0.50;

#[derive(Debug, Clone, Copy)]
pub struct Capsule {
    pub start: Vec2,
    pub end: Vec2,
    pub radius: f32,
}

impl Capsule {
    fn aabb(&self) -> (f32, f32, f32, f32) {
        (
            self.start.x.min(self.end.x) - self.radius,
            self.start.x.max(self.end.x) + self.radius,
            self.start.y.min(self.end.y) - self.radius,
            self.start.y.max(self.end.y) + self.radius,
        )
    }
}

/// Per-weapon melee geometry, loaded from the weapon hit geometry JSON.
#[derive(Debug, Clone)]
pub struct WeaponHitGeo {
    pub weapon_id: i32,
    pub length: f32,
    pub width: f32,
    pub pivot_dx: f32,
    pub pivot_dy: f32,
    pub slash_vfx_id: i32,
}

impl WeaponHitGeo {
    pub fn default_geo() -> Self {
        WeaponHitGeo {
            weapon_id: 0,
            length: DEFAULT_WEAPON_LENGTH,
            width: DEFAULT_WEAPON_WIDTH,
            pivot_dx: 0.0,
            pivot_dy: 0.0,
            slash_vfx_id: 0,
        }
    }
}

/// Hand-tunable offsets layered on top of weapon geometry, loaded from the
/// hitbox tuning JSON. `mask_*` arrays are indexed by facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitboxTuning {
    pub player_offset_x: f32,
    pub player_offset_y: f32,
    pub player_length: f32,
    pub player_width: f32,
    pub enemy_radius: f32,
    pub enemy_offset_x: f32,
    pub enemy_offset_y: f32,
    pub pursue_offset_x: f32,
    pub pursue_offset_y: f32,
    pub mask_dx: [f32; 4],
    pub mask_dy: [f32; 4],
    pub mask_scale_x: [f32; 4],
    pub mask_scale_y: [f32; 4],
}

impl Default for HitboxTuning {
    fn default() -> Self {
        HitboxTuning {
            player_offset_x: 0.0,
            player_offset_y: 0.0,
            player_length: 0.0,
            player_width: 0.0,
            enemy_radius: 0.0,
            enemy_offset_x: 0.0,
            enemy_offset_y: 0.0,
            pursue_offset_x: 0.0,
            pursue_offset_y: 0.0,
            mask_dx: [0.0; 4],
            mask_dy: [0.0; 4],
            mask_scale_x: [1.0; 4],
            mask_scale_y: [1.0; 4],
        }
    }
}

impl HitboxTuning {
    fn enemy_radius_or(&self, fallback: f32) -> f32 {
        if self.enemy_radius > 0.0 {
            self.enemy_radius
        } else {
            fallback
        }
    }
}

/// Build the melee capsule from the player's facing and equipped weapon
/// geometry, overridden by any nonzero tuning fields.
pub fn build_capsule(player: &Player, geo: &WeaponHitGeo, tuning: &HitboxTuning) -> Capsule {
    let dir = player.facing.to_vec2();
    let length = if tuning.player_length > 0.0 { tuning.player_length } else { geo.length };
    let width = if tuning.player_width > 0.0 { tuning.player_width } else { geo.width };
    let px = player.position.x + geo.pivot_dx + tuning.player_offset_x;
    let py = player.position.y + geo.pivot_dy + tuning.player_offset_y;
    let start = Vec2::new(px, py);
    Capsule { start, end: start + dir * length, radius: width * 0.5 }
}

/// Closest point on the segment to `p`, squared distance, and the unit
/// normal pointing from segment to `p` (defaults to +Y when coincident).
fn closest_point_seg(a: Vec2, b: Vec2, p: Vec2) -> (Vec2, f32, Vec2) {
    let v = b - a;
    let vv = v.length_squared();
    let t = if vv > 0.0 { ((p - a).dot(v) / vv).clamp(0.0, 1.0) } else { 0.0 };
    let closest = a + v * t;
    let d = p - closest;
    let d2 = d.length_squared();
    let len = d2.sqrt();
    let normal = if len > 0.0 { d / len } else { Vec2::new(0.0, 1.0) };
    (closest, d2, normal)
}

/// Fixed-capacity bitset (256 slots) tracking which enemy indices have
/// already been hit within the current window.
#[derive(Debug, Clone, Copy)]
pub struct HitSweepMask {
    bits: [u64; 4],
}

impl Default for HitSweepMask {
    fn default() -> Self {
        HitSweepMask { bits: [0; 4] }
    }
}

impl HitSweepMask {
    pub fn reset(&mut self) {
        self.bits = [0; 4];
    }

    /// Test-and-set: returns true if `idx` was already marked. Indices
    /// outside [0, 256) are treated as never-hit (out-of-range is a no-op
    /// on purpose, not an error).
    pub fn test_and_set(&mut self, idx: usize) -> bool {
        if idx >= 256 {
            return false;
        }
        let word = idx / 64;
        let bit = 1u64 << (idx % 64);
        let was = self.bits[word] & bit != 0;
        self.bits[word] |= bit;
        was
    }
}

/// A single bit-packed weapon-swing frame used by the pixel-mask path.
#[derive(Debug, Clone)]
pub struct PixelMaskFrame {
    pub width: i32,
    pub height: i32,
    pub origin_x: i32,
    pub origin_y: i32,
    pitch_words: usize,
    bits: Vec<u32>,
}

impl PixelMaskFrame {
    pub fn new(width: i32, height: i32) -> Self {
        let pitch_words = ((width.max(0) as usize) + 31) / 32;
        PixelMaskFrame {
            width,
            height,
            origin_x: 0,
            origin_y: 0,
            pitch_words,
            bits: vec![0u32; pitch_words * height.max(0) as usize],
        }
    }

    pub fn set(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let word = (y as usize) * self.pitch_words + (x as usize / 32);
        self.bits[word] |= 1 << (x as usize % 32);
    }

    pub fn test(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        let word = (y as usize) * self.pitch_words + (x as usize / 32);
        self.bits[word] & (1 << (x as usize % 32)) != 0
    }

    /// Center-then-8-point-ring sample at 70% of `enemy_radius`, matching
    /// `rogue_hit_mask_enemy_test`.
    pub fn enemy_test(&self, enemy_cx: f32, enemy_cy: f32, enemy_radius: f32) -> bool {
        if self.test(enemy_cx as i32, enemy_cy as i32) {
            return true;
        }
        let r = enemy_radius * 0.7;
        for i in 0..8 {
            let ang = i as f32 * std::f32::consts::FRAC_PI_4;
            let sx = enemy_cx + r * ang.cos();
            let sy = enemy_cy + r * ang.sin();
            if self.test(sx as i32, sy as i32) {
                return true;
            }
        }
        false
    }
}

/// A weapon's cached set of 8 swing frames. Placeholder generation mirrors
/// a horizontal-bar progression so callers get deterministic,
/// testable geometry without needing real art assets.
#[derive(Debug, Clone)]
pub struct PixelMaskSet {
    pub weapon_id: i32,
    pub frames: Vec<PixelMaskFrame>,
}

impl PixelMaskSet {
    fn generate_placeholder(weapon_id: i32) -> Self {
        let mut frames = Vec::with_capacity(8);
        for i in 0..8 {
            let mut frame = PixelMaskFrame::new(48, 16);
            let advance = (i * 4).min(24);
            for y in 6..10 {
                for x in advance..advance + 24 {
                    frame.set(x, y);
                }
            }
            frames.push(frame);
        }
        PixelMaskSet { weapon_id, frames }
    }
}

/// Lazily-populated, process-wide cache of pixel mask sets. Real
/// integrations can replace `generate_placeholder` by pre-populating entries
/// via `insert` before any strike runs.
#[derive(Debug, Clone, Default)]
pub struct PixelMaskCache {
    sets: Vec<PixelMaskSet>,
}

impl PixelMaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: PixelMaskSet) {
        if let Some(existing) = self.sets.iter_mut().find(|s| s.weapon_id == set.weapon_id) {
            *existing = set;
        } else {
            self.sets.push(set);
        }
    }

    pub fn ensure(&mut self, weapon_id: i32) -> &PixelMaskSet {
        if !self.sets.iter().any(|s| s.weapon_id == weapon_id) {
            self.sets.push(PixelMaskSet::generate_placeholder(weapon_id));
        }
        self.sets.iter().find(|s| s.weapon_id == weapon_id).unwrap()
    }

    pub fn reset_all(&mut self) {
        self.sets.clear();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MismatchCounters {
    pub pixel_only: u64,
    pub capsule_only: u64,
}

pub struct SweepResult {
    pub hits: Vec<(usize, Vec2)>,
    pub pixel_used: bool,
}

/// Run the capsule (and, if requested, pixel-mask) sweep against `enemies`,
/// applying the per-strike dedup mask, lock-on assist union, and the
/// frame-0/1 gate. `anim_frame` is the weapon-swing frame driving the pixel
/// mask and the frame-gate check (frames 0 and 1 never hit).
#[allow(clippy::too_many_arguments)]
pub fn sweep(
    player: &Player,
    geo: &WeaponHitGeo,
    tuning: &HitboxTuning,
    enemies: &[Enemy],
    anim_frame: i32,
    use_pixel_masks: bool,
    pixel_cache: Option<&mut PixelMaskCache>,
    hit_mask: &mut HitSweepMask,
    mismatch: &mut MismatchCounters,
    lock_on_target: Option<usize>,
) -> SweepResult {
    if anim_frame <= 1 {
        return SweepResult { hits: Vec::new(), pixel_used: false };
    }

    let capsule = build_capsule(player, geo, tuning);
    let enemy_radius_fallback = tuning.enemy_radius_or(DEFAULT_ENEMY_RADIUS);
    let (axmin, axmax, aymin, aymax) = capsule.aabb();

    let mask_snapshot = *hit_mask;

    let mut capsule_hits: Vec<(usize, Vec2)> = Vec::new();
    for (i, enemy) in enemies.iter().enumerate() {
        if !enemy.is_alive() {
            continue;
        }
        if hit_mask.test_and_set(i) {
            continue;
        }
        let ex = enemy.position.x + tuning.enemy_offset_x;
        let ey = enemy.position.y + tuning.enemy_offset_y;
        if ex < axmin - ENEMY_AABB_PAD
            || ex > axmax + ENEMY_AABB_PAD
            || ey < aymin - ENEMY_AABB_PAD
            || ey > aymax + ENEMY_AABB_PAD
        {
            continue;
        }
        let (_, d2, normal) = closest_point_seg(capsule.start, capsule.end, Vec2::new(ex, ey));
        let rr = enemy_radius_fallback + capsule.radius;
        if d2 <= rr * rr {
            capsule_hits.push((i, normal));
        }
    }

    *hit_mask = mask_snapshot;

    let mut pixel_hits: Vec<(usize, Vec2)> = Vec::new();
    let mut pixel_used = false;
    if use_pixel_masks {
        if let Some(cache) = pixel_cache {
            let set = cache.ensure(player.equipped_weapon_id.map(|i| i as i32).unwrap_or(0));
            let fi = (anim_frame & 7) as usize;
            if let Some(frame) = set.frames.get(fi) {
                let facing_idx = player.facing as usize;
                let mut pose_dx = tuning.mask_dx[facing_idx];
                let mut pose_dy = tuning.mask_dy[facing_idx];
                let scale_x = if tuning.mask_scale_x[facing_idx] > 0.0 {
                    tuning.mask_scale_x[facing_idx]
                } else {
                    1.0
                };
                let scale_y = if tuning.mask_scale_y[facing_idx] > 0.0 {
                    tuning.mask_scale_y[facing_idx]
                } else {
                    1.0
                };
                // world units double as pixels in the headless core (no tile_size
                // surface here); pose offsets are applied directly.
                pose_dx += 0.0;
                pose_dy += 0.0;
                for (i, enemy) in enemies.iter().enumerate() {
                    if !enemy.is_alive() {
                        continue;
                    }
                    let ex = enemy.position.x + tuning.enemy_offset_x;
                    let ey = enemy.position.y + tuning.enemy_offset_y;
                    let lx = (ex - (player.position.x + pose_dx)) / scale_x + frame.origin_x as f32;
                    let ly = (ey - (player.position.y + pose_dy)) / scale_y + frame.origin_y as f32;
                    let enemy_r_mask = enemy_radius_fallback / ((scale_x + scale_y) * 0.5);
                    if frame.enemy_test(lx, ly, enemy_r_mask) {
                        let (_, _, normal) =
                            closest_point_seg(capsule.start, capsule.end, Vec2::new(ex, ey));
                        pixel_hits.push((i, normal));
                    }
                }
                pixel_used = true;
            }
        }
    }

    if pixel_used {
        for (idx, _) in &pixel_hits {
            if !capsule_hits.iter().any(|(c, _)| c == idx) {
                mismatch.pixel_only += 1;
            }
        }
        for (idx, _) in &capsule_hits {
            if !pixel_hits.iter().any(|(p, _)| p == idx) {
                mismatch.capsule_only += 1;
            }
        }
    }

    let mut final_hits = if pixel_used { pixel_hits } else { capsule_hits };

    if let Some(target) = lock_on_target {
        if let Some(enemy) = enemies.get(target) {
            if enemy.is_alive() && !final_hits.iter().any(|(i, _)| *i == target) {
                let ex = enemy.position.x + tuning.enemy_offset_x;
                let ey = enemy.position.y + tuning.enemy_offset_y;
                let (_, _, normal) = closest_point_seg(capsule.start, capsule.end, Vec2::new(ex, ey));
                final_hits.push((target, normal));
            }
        }
    }

    for (idx, _) in &final_hits {
        hit_mask.test_and_set(*idx);
    }

    final_hits.truncate(MAX_HITS);
    SweepResult { hits: final_hits, pixel_used }
}

pub fn facing_for_dir(dir: Vec2) -> Facing {
    Facing::from_vec2(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseStats, CombatStance, CrowdControlTimers, EncumbranceTier, Infusion, LockOnState, ReactionState};

    fn make_player() -> Player {
        Player {
            position: Vec2::new(0.0, 0.0),
            facing: Facing::Right,
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
            lock_on: LockOnState::default(),
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
    fn frames_zero_and_one_never_hit() {
        let player = make_player();
        let geo = WeaponHitGeo::default_geo();
        let tuning = HitboxTuning::default();
        let enemies = vec![make_enemy(0.3, 0.0)];
        let mut mask = HitSweepMask::default();
        let mut mismatch = MismatchCounters::default();
        for frame in [0, 1] {
            let result = sweep(
                &player, &geo, &tuning, &enemies, frame, false, None, &mut mask, &mut mismatch, None,
            );
            assert!(result.hits.is_empty());
        }
    }

    #[test]
    fn capsule_hits_enemy_in_path() {
        let player = make_player();
        let geo = WeaponHitGeo::default_geo();
        let tuning = HitboxTuning::default();
        let enemies = vec![make_enemy(1.0, 0.0)];
        let mut mask = HitSweepMask::default();
        let mut mismatch = MismatchCounters::default();
        let result = sweep(
            &player, &geo, &tuning, &enemies, 5, false, None, &mut mask, &mut mismatch, None,
        );
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].0, 0);
    }

    #[test]
    fn dedup_mask_prevents_double_hit_same_sweep() {
        let player = make_player();
        let geo = WeaponHitGeo::default_geo();
        let tuning = HitboxTuning::default();
        let enemies = vec![make_enemy(1.0, 0.0)];
        let mut mask = HitSweepMask::default();
        let mut mismatch = MismatchCounters::default();
        let first = sweep(
            &player, &geo, &tuning, &enemies, 5, false, None, &mut mask, &mut mismatch, None,
        );
        assert_eq!(first.hits.len(), 1);
        let second = sweep(
            &player, &geo, &tuning, &enemies, 5, false, None, &mut mask, &mut mismatch, None,
        );
        assert!(second.hits.is_empty());
        mask.reset();
        let third = sweep(
            &player, &geo, &tuning, &enemies, 5, false, None, &mut mask, &mut mismatch, None,
        );
        assert_eq!(third.hits.len(), 1);
    }

    #[test]
    fn lock_on_assist_includes_target_even_if_geometry_misses() {
        let player = make_player();
        let geo = WeaponHitGeo::default_geo();
        let tuning = HitboxTuning::default();
        let enemies = vec![make_enemy(-5.0, 5.0)];
        let mut mask = HitSweepMask::default();
        let mut mismatch = MismatchCounters::default();
        let result = sweep(
            &player, &geo, &tuning, &enemies, 5, false, None, &mut mask, &mut mismatch, Some(0),
        );
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].0, 0);
    }

    #[test]
    fn out_of_aabb_enemy_not_hit() {
        let player = make_player();
        let geo = WeaponHitGeo::default_geo();
        let tuning = HitboxTuning::default();
        let enemies = vec![make_enemy(50.0, 50.0)];
        let mut mask = HitSweepMask::default();
        let mut mismatch = MismatchCounters::default();
        let result = sweep(
            &player, &geo, &tuning, &enemies, 5, false, None, &mut mask, &mut mismatch, None,
        );
        assert!(result.hits.is_empty());
    }
}
