//! Shared combat data model.
//!
//! These are the plain data types the rest of the core operates on: the
//! enums (archetype, facing, damage type, reaction type, encumbrance,
//! stance, infusion) plus the `Player` / `Enemy` structs. None of this
//! module owns behavior beyond small accessors — the pipelines in
//! `mitigation`, `defense`, `strike`, etc. take `&mut Player` / `&mut Enemy`
//! and mutate them directly.

use bevy_math::Vec2;
use std::collections::HashMap;

/// Attack family. Each archetype owns its own chain of `AttackDef`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Light,
    Heavy,
    Thrust,
    Ranged,
    SpellFocus,
}

pub const ALL_ARCHETYPES: [Archetype; 5] = [
    Archetype::Light,
    Archetype::Heavy,
    Archetype::Thrust,
    Archetype::Ranged,
    Archetype::SpellFocus,
];

/// Cardinal facing direction (Down=0, Left=1, Right=2, Up=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Down = 0,
    Left = 1,
    Right = 2,
    Up = 3,
}

impl Facing {
    pub fn to_vec2(self) -> Vec2 {
        match self {
            Facing::Down => Vec2::new(0.0, 1.0),
            Facing::Left => Vec2::new(-1.0, 0.0),
            Facing::Right => Vec2::new(1.0, 0.0),
            Facing::Up => Vec2::new(0.0, -1.0),
        }
    }

    /// Snap an arbitrary direction to the nearest cardinal facing.
    pub fn from_vec2(dir: Vec2) -> Facing {
        if dir == Vec2::ZERO {
            return Facing::Down;
        }
        if dir.x.abs() >= dir.y.abs() {
            if dir.x >= 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if dir.y >= 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageType {
    Physical,
    Fire,
    Frost,
    Arcane,
    True,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionType {
    None,
    LightFlinch,
    Stagger,
    Knockdown,
    Launch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncumbranceTier {
    Light,
    Medium,
    Heavy,
    Overloaded,
}

impl EncumbranceTier {
    /// Multiplier applied to stamina regeneration.
    pub fn stamina_regen_mult(self) -> f32 {
        match self {
            EncumbranceTier::Light => 1.0,
            EncumbranceTier::Medium => 0.82,
            EncumbranceTier::Heavy => 0.70,
            EncumbranceTier::Overloaded => 0.50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStance {
    Balanced,
    Aggressive,
    Defensive,
}

/// Scaling factors a stance applies to timing/damage/stamina/poise-damage.
pub struct StanceMultipliers {
    pub windup: f32,
    pub recovery: f32,
    pub damage: f32,
    pub stamina: f32,
    pub poise_damage: f32,
}

impl CombatStance {
    pub fn multipliers(self) -> StanceMultipliers {
        match self {
            CombatStance::Balanced => StanceMultipliers {
                windup: 1.0,
                recovery: 1.0,
                damage: 1.0,
                stamina: 1.0,
                poise_damage: 1.0,
            },
            CombatStance::Aggressive => StanceMultipliers {
                windup: 0.95,
                recovery: 0.97,
                damage: 1.15,
                stamina: 1.15,
                poise_damage: 1.10,
            },
            CombatStance::Defensive => StanceMultipliers {
                windup: 1.06,
                recovery: 1.08,
                damage: 0.90,
                stamina: 0.85,
                poise_damage: 0.95,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infusion {
    None,
    Fire,
    Frost,
    Arcane,
    Bleed,
    Poison,
}

impl Infusion {
    /// Id this infusion is registered under in the external infusion registry.
    pub fn registry_id(self) -> u32 {
        match self {
            Infusion::None => 0,
            Infusion::Fire => 1,
            Infusion::Frost => 2,
            Infusion::Arcane => 3,
            Infusion::Bleed => 4,
            Infusion::Poison => 5,
        }
    }
}

/// Phase of the player attack state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Windup,
    Strike,
    Recover,
}

/// Reference to whichever side of a strike a combatant is playing (for traits
/// in `external` that need to distinguish player vs. enemy without owning
/// either). Kept intentionally small; the core otherwise just borrows
/// `&mut Player`/`&mut Enemy` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatantRef {
    Player,
    Enemy(usize),
}

/// Base stats relevant to damage scaling and crit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseStats {
    pub strength: f32,
    pub dexterity: f32,
    pub intelligence: f32,
    pub vitality: f32,
    pub level: u32,
}

/// Player's defensive reaction bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionState {
    pub reaction_type: Option<ReactionTypeSlot>,
    pub reaction_timer_ms: f32,
    pub reaction_total_ms: f32,
    pub reaction_canceled_early: bool,
    pub reaction_di_accum_x: f32,
    pub reaction_di_accum_y: f32,
    pub reaction_di_max: f32,
}

/// Stored reaction type distinct from `ReactionType` so `ReactionState` can
/// `#[derive(Default)]` with `None` meaning "no active reaction".
pub type ReactionTypeSlot = ReactionType;

#[derive(Debug, Clone, Copy, Default)]
pub struct CrowdControlTimers {
    pub stun_ms: f32,
    pub root_ms: f32,
    pub slow_ms: f32,
    pub slow_pct: f32,
    pub disarm_ms: f32,
}

impl CrowdControlTimers {
    pub fn stunned(&self) -> bool {
        self.stun_ms > 0.0
    }
    pub fn rooted(&self) -> bool {
        self.root_ms > 0.0
    }
    pub fn disarmed(&self) -> bool {
        self.disarm_ms > 0.0
    }

    pub fn tick(&mut self, dt_ms: f32) {
        for t in [
            &mut self.stun_ms,
            &mut self.root_ms,
            &mut self.slow_ms,
            &mut self.disarm_ms,
        ] {
            if *t > 0.0 {
                *t -= dt_ms;
                if *t < 0.0 {
                    *t = 0.0;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LockOnState {
    pub active: bool,
    pub target_index: Option<usize>,
    pub radius: f32,
    pub switch_cooldown_ms: f32,
}

/// The player combatant. Combat-relevant subset only — no
/// rendering/transform fields beyond 2D position, since this core has no
/// visual surface.
pub struct Player {
    pub position: Vec2,
    pub facing: Facing,
    pub team_id: u8,
    pub stats: BaseStats,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub armor_pen_flat: i32,
    pub armor_pen_percent: i32,
    pub guard_meter: f32,
    pub guard_meter_max: f32,
    pub guarding: bool,
    pub guard_active_time_ms: f32,
    pub perfect_guard_window_ms: f32,
    pub poise: f32,
    pub poise_max: f32,
    pub poise_regen_delay_ms: f32,
    pub iframes_ms: f32,
    pub reaction: ReactionState,
    pub cc: CrowdControlTimers,
    pub lock_on: LockOnState,
    pub encumbrance: EncumbranceTier,
    pub stance: CombatStance,
    pub equipped_weapon_id: Option<u32>,
    pub weapon_infusion: Infusion,
    pub god_mode: bool,
}

impl Player {
    pub fn facing_vec(&self) -> Vec2 {
        self.facing.to_vec2()
    }
}

/// An enemy combatant. Combat-relevant subset only.
pub struct Enemy {
    pub alive: bool,
    pub team_id: u8,
    pub position: Vec2,
    pub facing: Facing,
    pub health: f32,
    pub max_health: f32,
    pub armor: i32,
    pub resist_physical: i32,
    pub resist_fire: i32,
    pub resist_frost: i32,
    pub resist_arcane: i32,
    pub resist_bleed: i32,
    pub resist_poison: i32,
    pub poise: f32,
    pub poise_max: f32,
    pub staggered: bool,
    pub stagger_timer_ms: f32,
    pub bleed_buildup: f32,
    pub frost_buildup: f32,
    pub level: u32,
    pub hurt_timer: f32,
    pub flash_timer: f32,
    pub radius: f32,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.alive && self.health > 0.0
    }
}

/// Weapon definition as exposed by the external weapon registry.
#[derive(Debug, Clone)]
pub struct WeaponDef {
    pub id: u32,
    pub base_damage: f32,
    pub str_scale: f32,
    pub dex_scale: f32,
    pub int_scale: f32,
    pub stamina_mult: f32,
    pub poise_mult: f32,
    pub durability_max: f32,
}

/// Per-weapon runtime usage tracked by the weapon registry.
#[derive(Debug, Clone, Default)]
pub struct WeaponUsage {
    pub familiarity_points: f32,
    pub durability: f32,
}

impl WeaponUsage {
    /// Familiarity bonus in [0, 0.10], soft-capping at 10,000 points.
    pub fn familiarity_bonus(&self) -> f32 {
        let soft_cap = 10_000.0_f32;
        let ratio = (self.familiarity_points / soft_cap).min(1.0);
        ratio * 0.10
    }

    /// Durability multiplier: 1.0 above 50%, linear 0.70..1.00 within [0%, 50%].
    pub fn durability_mult(&self, durability_max: f32) -> f32 {
        if durability_max <= 0.0 {
            return 1.0;
        }
        let pct = (self.durability / durability_max).clamp(0.0, 1.0);
        if pct >= 0.5 {
            1.0
        } else {
            0.70 + (pct / 0.5) * 0.30
        }
    }
}

/// Infusion definition as exposed by the external infusion registry:
/// a physical scalar plus flat elemental/buildup additions.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfusionRatios {
    pub phys_scalar: f32,
    pub fire_add: f32,
    pub frost_add: f32,
    pub arcane_add: f32,
    pub bleed_build_add: f32,
    pub poison_build_add: f32,
}

/// In-memory weapon registry suitable for tests / the headless CLI; real
/// integrations can implement `external::WeaponRegistryTrait` directly
/// against their own equipment system instead.
#[derive(Debug, Clone, Default)]
pub struct WeaponTable {
    pub defs: HashMap<u32, WeaponDef>,
    pub usage: HashMap<u32, WeaponUsage>,
}

impl WeaponTable {
    pub fn register(&mut self, def: WeaponDef) {
        self.usage.entry(def.id).or_default();
        self.defs.insert(def.id, def);
    }
}
