//! Black-box invariant tests for the mitigation pipeline, exercised the way
//! an external caller would: only through `mitigate`, never the private
//! curve helpers.

use strikecore::mitigation::{mitigate, Defenses};
use strikecore::types::DamageType;

fn defenses(armor: i32, resist_physical: i32) -> Defenses {
    Defenses { armor, resist_physical, resist_fire: 0, resist_frost: 0, resist_arcane: 0 }
}

#[test]
fn mitigated_never_exceeds_raw() {
    for raw in [1, 10, 100, 500, 5000] {
        for armor in [0, 10, 50, 200] {
            for resist in [0, 30, 90] {
                let r = mitigate(raw, DamageType::Physical, defenses(armor, resist), 100_000);
                assert!(r.mitigated <= raw, "mitigated {} exceeded raw {} (armor {}, resist {})", r.mitigated, raw, armor, resist);
            }
        }
    }
}

#[test]
fn mitigated_is_at_least_one_against_a_living_defender() {
    let r = mitigate(5, DamageType::Physical, defenses(100_000, 90), 1000);
    assert_eq!(r.mitigated, 1);
}

#[test]
fn soft_cap_five_percent_floor_holds_for_large_physical_hits() {
    for raw in [100, 250, 1000, 10_000] {
        let r = mitigate(raw, DamageType::Physical, defenses(raw, 90), 1_000_000);
        let floor = ((raw as f32) * 0.05).floor() as i32;
        assert!(r.mitigated >= floor, "raw {} mitigated {} below floor {}", raw, r.mitigated, floor);
    }
}

#[test]
fn below_softcap_minimum_raw_is_unaffected_by_the_floor() {
    // Below SOFTCAP_MIN_RAW (100) the floor clause never engages; heavy
    // armor/resist can still crush small hits down to the universal 1-damage floor.
    let r = mitigate(20, DamageType::Physical, defenses(1000, 90), 1000);
    assert_eq!(r.mitigated, 1);
}

#[test]
fn overkill_is_zero_while_damage_stays_under_remaining_health() {
    let r = mitigate(10, DamageType::Physical, defenses(0, 0), 1000);
    assert_eq!(r.overkill, 0);
}

#[test]
fn dead_defender_is_a_no_op() {
    let r = mitigate(9999, DamageType::Physical, defenses(0, 0), 0);
    assert_eq!(r.mitigated, 0);
    assert_eq!(r.overkill, 0);
}

#[test]
fn true_damage_ignores_armor_and_resist() {
    let r = mitigate(77, DamageType::True, defenses(10_000, 90), 1000);
    assert_eq!(r.mitigated, 77);
}

#[test]
fn elemental_resist_reduces_proportionally() {
    let d = Defenses { armor: 0, resist_physical: 0, resist_fire: 25, resist_frost: 0, resist_arcane: 0 };
    let r = mitigate(200, DamageType::Fire, d, 10_000);
    assert_eq!(r.mitigated, 150);
}
