//! JSON scenario format for the headless runner: one player, a handful of
//! enemies, and a script of attack-button presses to drive through the
//! combat state machine — a file struct with `#[serde(default)]` fallbacks,
//! validation, and a conversion into engine-native state.

use std::path::Path;

use bevy_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::state_machine::PlayerCombatState;
use crate::types::{
    Archetype, BaseStats, CombatStance, CrowdControlTimers, EncumbranceTier, Facing, Infusion,
    LockOnState, Player, ReactionState, WeaponDef, WeaponTable,
};

fn default_team_id() -> u8 {
    1
}

fn default_dt_ms() -> f32 {
    16.666
}

fn default_max_ticks() -> u32 {
    300
}

fn default_radius() -> f32 {
    0.4
}

fn default_poise_max() -> f32 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpec {
    #[serde(default)]
    pub archetype: String,
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub facing: String,
    #[serde(default = "default_team_id")]
    pub team_id: u8,
    #[serde(default)]
    pub strength: f32,
    #[serde(default)]
    pub dexterity: f32,
    #[serde(default)]
    pub intelligence: f32,
    #[serde(default)]
    pub vitality: f32,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub crit_chance: f32,
    #[serde(default)]
    pub crit_damage: f32,
    #[serde(default)]
    pub armor_pen_flat: i32,
    #[serde(default)]
    pub armor_pen_percent: i32,
    #[serde(default = "default_poise_max")]
    pub guard_meter_max: f32,
    #[serde(default = "default_poise_max")]
    pub poise_max: f32,
    #[serde(default)]
    pub equipped_weapon_id: Option<u32>,
    #[serde(default)]
    pub weapon_infusion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub id: u32,
    #[serde(default)]
    pub base_damage: f32,
    #[serde(default)]
    pub str_scale: f32,
    #[serde(default)]
    pub dex_scale: f32,
    #[serde(default)]
    pub int_scale: f32,
    #[serde(default = "one")]
    pub stamina_mult: f32,
    #[serde(default = "one")]
    pub poise_mult: f32,
    #[serde(default)]
    pub durability_max: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySpec {
    #[serde(default = "default_team_id_enemy")]
    pub team_id: u8,
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub health: f32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub resist_physical: i32,
    #[serde(default)]
    pub resist_fire: i32,
    #[serde(default)]
    pub resist_frost: i32,
    #[serde(default)]
    pub resist_arcane: i32,
    #[serde(default = "default_poise_max")]
    pub poise_max: f32,
    #[serde(default)]
    pub level: u32,
    #[serde(default = "default_radius")]
    pub radius: f32,
}

fn default_team_id_enemy() -> u8 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub player: PlayerSpec,
    #[serde(default)]
    pub weapon: Option<WeaponSpec>,
    #[serde(default)]
    pub enemies: Vec<EnemySpec>,
    #[serde(default = "default_dt_ms")]
    pub dt_ms: f32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
    /// Tick indices (0-based) at which the attack button is held pressed for one tick.
    #[serde(default)]
    pub attack_ticks: Vec<u32>,
}

impl ScenarioFile {
    pub fn load_from_file(path: &Path) -> Result<ScenarioFile, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read scenario file: {}", e))?;
        let file: ScenarioFile = serde_json::from_str(&contents)
            .map_err(|e| format!("failed to parse scenario JSON: {}", e))?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), String> {
        if self.enemies.is_empty() {
            return Err("scenario must declare at least one enemy".to_string());
        }
        if self.max_duration_is_zero() {
            return Err("max_ticks must be positive".to_string());
        }
        Self::parse_archetype(&self.player.archetype)?;
        Ok(())
    }

    fn max_duration_is_zero(&self) -> bool {
        self.max_ticks == 0
    }

    fn parse_archetype(name: &str) -> Result<Archetype, String> {
        match name {
            "Light" | "" => Ok(Archetype::Light),
            "Heavy" => Ok(Archetype::Heavy),
            "Thrust" => Ok(Archetype::Thrust),
            "Ranged" => Ok(Archetype::Ranged),
            "SpellFocus" => Ok(Archetype::SpellFocus),
            _ => Err(format!(
                "unknown archetype '{}'. Valid: Light, Heavy, Thrust, Ranged, SpellFocus",
                name
            )),
        }
    }

    fn parse_facing(name: &str) -> Facing {
        match name {
            "Up" => Facing::Up,
            "Left" => Facing::Left,
            "Right" => Facing::Right,
            _ => Facing::Down,
        }
    }

    fn parse_infusion(name: &str) -> Infusion {
        match name {
            "Fire" => Infusion::Fire,
            "Frost" => Infusion::Frost,
            "Arcane" => Infusion::Arcane,
            "Bleed" => Infusion::Bleed,
            "Poison" => Infusion::Poison,
            _ => Infusion::None,
        }
    }

    pub fn build_player(&self) -> (Player, PlayerCombatState) {
        let p = &self.player;
        let player = Player {
            position: Vec2::new(p.position[0], p.position[1]),
            facing: Self::parse_facing(&p.facing),
            team_id: p.team_id,
            stats: BaseStats {
                strength: p.strength,
                dexterity: p.dexterity,
                intelligence: p.intelligence,
                vitality: p.vitality,
                level: p.level,
            },
            crit_chance: p.crit_chance,
            crit_damage: p.crit_damage,
            armor_pen_flat: p.armor_pen_flat,
            armor_pen_percent: p.armor_pen_percent,
            guard_meter: p.guard_meter_max,
            guard_meter_max: p.guard_meter_max,
            guarding: false,
            guard_active_time_ms: 0.0,
            perfect_guard_window_ms: 120.0,
            poise: p.poise_max,
            poise_max: p.poise_max,
            poise_regen_delay_ms: 0.0,
            iframes_ms: 0.0,
            reaction: ReactionState::default(),
            cc: CrowdControlTimers::default(),
            lock_on: LockOnState::default(),
            encumbrance: EncumbranceTier::Light,
            stance: CombatStance::Balanced,
            equipped_weapon_id: p.equipped_weapon_id,
            weapon_infusion: Self::parse_infusion(&p.weapon_infusion),
            god_mode: false,
        };

        let archetype = Self::parse_archetype(&p.archetype).unwrap_or(Archetype::Light);
        let mut state = PlayerCombatState::default();
        state.archetype = archetype;
        (player, state)
    }

    pub fn build_enemies(&self) -> Vec<crate::types::Enemy> {
        self.enemies
            .iter()
            .map(|e| crate::types::Enemy {
                alive: true,
                team_id: e.team_id,
                position: Vec2::new(e.position[0], e.position[1]),
                facing: Facing::Down,
                health: e.health,
                max_health: e.health,
                armor: e.armor,
                resist_physical: e.resist_physical,
                resist_fire: e.resist_fire,
                resist_frost: e.resist_frost,
                resist_arcane: e.resist_arcane,
                resist_bleed: 0,
                resist_poison: 0,
                poise: e.poise_max,
                poise_max: e.poise_max,
                staggered: false,
                stagger_timer_ms: 0.0,
                bleed_buildup: 0.0,
                frost_buildup: 0.0,
                level: e.level,
                hurt_timer: 0.0,
                flash_timer: 0.0,
                radius: e.radius,
            })
            .collect()
    }

    pub fn build_weapon_table(&self) -> WeaponTable {
        let mut table = WeaponTable::default();
        if let Some(w) = &self.weapon {
            table.register(WeaponDef {
                id: w.id,
                base_damage: w.base_damage,
                str_scale: w.str_scale,
                dex_scale: w.dex_scale,
                int_scale: w.int_scale,
                stamina_mult: w.stamina_mult,
                poise_mult: w.poise_mult,
                durability_max: w.durability_max,
            });
        }
        table
    }
}

/// Result of running a scenario to completion: the tick count actually run
/// and each enemy's final health, for the CLI to print.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub ticks_run: u32,
    pub kills: u32,
    pub final_enemy_health: Vec<f32>,
    pub events_emitted: usize,
}
