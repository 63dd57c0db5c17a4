//! Mitigation.
//!
//! Pure function mapping (raw damage, damage type, defender defenses) to
//! (mitigated, overkill), with a physical resist curve that bends toward a
//! hard cap and a percentage floor against huge hits (the soft cap).

use crate::types::DamageType;

pub const SOFTCAP_MIN_RAW: i32 = 100;
pub const SOFTCAP_THRESHOLD: f32 = 0.65;
pub const SOFTCAP_SLOPE: f32 = 0.45;
pub const SOFTCAP_MAX_REDUCTION: f32 = 0.85;

/// Defender-side defenses consumed by `mitigate`. `armor` is separated from
/// the rest so callers (strike evaluation) can pass a penetration-adjusted
/// override without mutating the defender.
#[derive(Debug, Clone, Copy, Default)]
pub struct Defenses {
    pub armor: i32,
    pub resist_physical: i32,
    pub resist_fire: i32,
    pub resist_frost: i32,
    pub resist_arcane: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MitigationResult {
    pub mitigated: i32,
    pub overkill: i32,
}

/// Physical resistance curve: linear to 50%, diminishing returns to 75% cap
/// (90 raw resist maps to 70 effective).
fn effective_physical_resist(raw_percent: i32) -> f32 {
    let p = raw_percent.clamp(0, 90) as f32;
    let eff = if p <= 50.0 { p } else { 50.0 + (p - 50.0) * 0.5 };
    eff.clamp(0.0, 75.0)
}

fn clamp_resist(percent: i32) -> i32 {
    percent.clamp(0, 90)
}

/// Mitigate `raw` damage of `damage_type` against `defenses`, returning
/// mitigated damage and overkill relative to `defender_health`. `raw` must
/// already be non-negative; `defender_health <= 0.0` (already dead) yields
/// zero mitigated damage.
pub fn mitigate(
    raw: i32,
    damage_type: DamageType,
    defenses: Defenses,
    defender_health: i32,
) -> MitigationResult {
    if defender_health <= 0 {
        return MitigationResult { mitigated: 0, overkill: 0 };
    }
    let raw = raw.max(0);

    let mut dmg = if damage_type == DamageType::True {
        raw
    } else if damage_type == DamageType::Physical {
        mitigate_physical(raw, defenses)
    } else {
        mitigate_elemental(raw, damage_type, defenses)
    };

    if dmg < 1 {
        dmg = 1;
    }

    let overkill = if defender_health - dmg < 0 {
        dmg - defender_health
    } else {
        0
    };

    MitigationResult { mitigated: dmg, overkill }
}

fn mitigate_physical(raw: i32, defenses: Defenses) -> i32 {
    let armor = defenses.armor;
    let mut dmg = if armor > 0 {
        if armor >= raw {
            raw.min(1)
        } else {
            raw - armor
        }
    } else {
        raw
    };

    let pr_raw = clamp_resist(defenses.resist_physical);
    let effective = effective_physical_resist(pr_raw);
    if effective > 0.0 {
        let reduce = ((dmg as f32) * effective / 100.0).floor() as i32;
        dmg -= reduce;
    }

    if raw >= SOFTCAP_MIN_RAW {
        let mut armor_frac = 0.0f32;
        if armor > 0 {
            armor_frac = (armor as f32) / ((raw + armor) as f32);
            armor_frac = armor_frac.min(0.90);
        }
        let total_frac = armor_frac + effective / 100.0;
        if total_frac > SOFTCAP_THRESHOLD {
            let excess = total_frac - SOFTCAP_THRESHOLD;
            let adjusted = excess * SOFTCAP_SLOPE;
            let capped_total = (SOFTCAP_THRESHOLD + adjusted).min(SOFTCAP_MAX_REDUCTION);
            let target = ((raw as f32) * (1.0 - capped_total) + 0.5).floor() as i32;
            let target = target.max(1);
            if target < dmg {
                dmg = target;
            }
            let floor_min = ((raw as f32) * 0.05 + 0.5).floor() as i32;
            if dmg < floor_min {
                dmg = floor_min;
            }
        }
    }

    dmg
}

fn mitigate_elemental(raw: i32, damage_type: DamageType, defenses: Defenses) -> i32 {
    let resist = match damage_type {
        DamageType::Fire => defenses.resist_fire,
        DamageType::Frost => defenses.resist_frost,
        DamageType::Arcane => defenses.resist_arcane,
        _ => 0,
    };
    let resist = clamp_resist(resist);
    if resist <= 0 {
        return raw;
    }
    let reduce = (raw * resist) / 100;
    raw - reduce
}
