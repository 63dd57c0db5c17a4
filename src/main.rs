//! Headless scenario runner entry point.
//!
//! Loads a scenario JSON file, drives the combat state machine tick by
//! tick, and prints a summary of the damage events recorded in the ring.

use log::{error, info, warn, LevelFilter};

use strikecore::adapters::{InfusionTable, NoBuffs, OpenFieldNavigation};
use strikecore::cli::Args;
use strikecore::external::{NullDamageNumberUi, NullHitFeedback, NullProcs, StatCacheSnapshot};
use strikecore::geometry::{HitSweepMask, HitboxTuning, MismatchCounters, PixelMaskCache, WeaponHitGeo};
use strikecore::io::hitbox_tuning::HitboxTuningFile;
use strikecore::io::weapon_geometry::WeaponGeometryTable;
use strikecore::scenario::{ScenarioFile, ScenarioOutcome};
use strikecore::state_machine::Phase;
use strikecore::strike::{self, CritLayeringMode, StrikeContext};

fn level_filter(name: &str) -> LevelFilter {
    match name.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => {
            eprintln!("invalid log level '{}', defaulting to 'info'", name);
            LevelFilter::Info
        }
    }
}

fn main() {
    let args = Args::parse_args();
    env_logger::Builder::new()
        .filter_level(level_filter(&args.log_level))
        .init();

    info!("loading scenario from {}", args.scenario.display());
    let scenario = match ScenarioFile::load_from_file(&args.scenario) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load scenario: {}", e);
            std::process::exit(1);
        }
    };

    let mut weapon_geo_table = WeaponGeometryTable::new();
    let mut geo = WeaponHitGeo::default_geo();
    if let Some(path) = &args.weapon_geometry {
        let count = weapon_geo_table.load_from_file(path);
        if count < 0 {
            warn!("failed to load weapon geometry from {}, using defaults", path.display());
        } else {
            info!("loaded {} weapon geometry entries", count);
            if let Some(id) = scenario.player.equipped_weapon_id {
                if let Some(g) = weapon_geo_table.get(id as i32) {
                    geo = g.clone();
                }
            }
        }
    }

    let mut tuning = HitboxTuning::default();
    if let Some(path) = &args.hitbox_tuning {
        match HitboxTuningFile::load_from_file(path) {
            Ok(t) => tuning = t,
            Err(e) => warn!("failed to load hitbox tuning: {}, using defaults", e),
        }
    }

    let (mut player, mut state) = scenario.build_player();
    let mut enemies = scenario.build_enemies();
    let mut weapons = scenario.build_weapon_table();
    let infusions = InfusionTable::new();
    let navigation = OpenFieldNavigation;
    let buffs = NoBuffs;
    let mut procs = NullProcs;
    let mut hit_feedback = NullHitFeedback;
    let mut damage_ui = NullDamageNumberUi;
    let mut ring = strikecore::damage_event::DamageEventRing::new();
    let stats = StatCacheSnapshot::default();
    let mut hit_mask = HitSweepMask::default();
    let mut mismatch = MismatchCounters::default();
    let mut pixel_cache = PixelMaskCache::new();

    let attack_ticks: std::collections::HashSet<u32> = scenario.attack_ticks.iter().copied().collect();
    let mut rng = rand::thread_rng();

    let mut kills = 0u32;
    let mut anim_frame = 0i32;
    let mut ticks_run = 0u32;

    for tick in 0..scenario.max_ticks {
        ticks_run = tick + 1;
        let attack_pressed = attack_ticks.contains(&tick);
        state.tick(scenario.dt_ms, attack_pressed, &mut player);
        anim_frame += 1;

        if state.phase == Phase::Strike {
            let mut ctx = StrikeContext {
                weapons: &mut weapons,
                infusions: &infusions,
                buffs: &buffs,
                procs: &mut procs,
                navigation: &navigation,
                obstruction_hook: None,
                hit_feedback: &mut hit_feedback,
                damage_ui: &mut damage_ui,
                ring: &mut ring,
                stats: &stats,
                geo: &geo,
                tuning: &tuning,
                hit_mask: &mut hit_mask,
                mismatch: &mut mismatch,
                pixel_cache: Some(&mut pixel_cache),
                use_pixel_masks: false,
                anim_frame,
                strict_team_filter: false,
                crit_layering_mode: CritLayeringMode::PreMitigation,
                force_crit_mode: None,
                forced_attack_test_mode: false,
            };

            kills += strike::process_strike(&mut state, &mut player, &mut enemies, &mut ctx, &mut || {
                rand::Rng::gen_range(&mut rng, 0.0..1.0)
            });
        }

        if enemies.iter().all(|e| !e.is_alive()) {
            info!("all enemies defeated at tick {}", tick);
            break;
        }
    }

    let outcome = ScenarioOutcome {
        ticks_run,
        kills,
        final_enemy_health: enemies.iter().map(|e| e.health).collect(),
        events_emitted: ring.total(),
    };

    info!(
        "scenario complete: {} ticks, {} kills, {} events recorded",
        outcome.ticks_run, outcome.kills, outcome.events_emitted
    );
    for event in ring.snapshot(ring.len()) {
        println!(
            "attack={} type={:?} crit={} raw={} mitigated={} overkill={} execution={}",
            event.attack_id, event.damage_type, event.crit, event.raw_damage, event.mitigated, event.overkill, event.execution
        );
    }
    for (i, health) in outcome.final_enemy_health.iter().enumerate() {
        println!("enemy[{}] health={:.1}/{:.1} alive={}", i, health, enemies[i].max_health, *health > 0.0);
    }
}
