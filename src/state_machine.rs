//! Player combat state machine.
//!
//! Drives the four-phase attack cycle (Idle → Windup → Strike → Recover),
//! stamina, chaining, and the charge/parry/riposte/backstab timers. Window
//! *activation* and damage are `strike.rs`'s job — this module only decides
//! phase transitions and exposes the fields `strike.rs` needs to read/write
//! per-strike.

use crate::registry::{self, AttackDef};
use crate::types::{Archetype, Phase, Player};

pub const MAX_EVENTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatEventKind {
    WindowBegin,
    WindowEnd,
    Stagger,
}

#[derive(Debug, Clone, Copy)]
pub struct CombatEvent {
    pub kind: CombatEventKind,
    pub window_index: usize,
    pub enemy_index: Option<usize>,
}

/// What phase transitions `tick` performed this call, so collaborators
/// (the geometry hit-sweep mask, in particular) know when to reset
/// per-strike state that this module doesn't own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    pub entered_windup: bool,
    pub entered_strike: bool,
    pub entered_recover: bool,
}

pub struct PlayerCombatState {
    pub phase: Phase,
    pub precise_accum_ms: f64,
    pub timer: f32,
    pub combo: u8,
    pub stamina: f32,
    pub stamina_regen_delay_ms: f32,
    pub buffered_attack: bool,
    pub hit_confirmed: bool,
    pub strike_time_ms: f32,
    pub archetype: Archetype,
    pub chain_index: usize,
    pub queued_branch_archetype: Archetype,
    pub queued_branch_pending: bool,
    pub blocked_this_strike: bool,
    pub recovered_recently: bool,
    pub idle_since_recover_ms: f32,
    pub processed_window_mask: u32,
    pub emitted_events_mask: u32,
    pub events: [Option<CombatEvent>; MAX_EVENTS],
    pub event_count: usize,
    pub charging: bool,
    pub charge_time_ms: f32,
    pub pending_charge_damage_mult: f32,
    pub parry_active: bool,
    pub parry_timer_ms: f32,
    pub parry_window_ms: f32,
    pub riposte_ready: bool,
    pub riposte_window_ms: f32,
    pub backstab_cooldown_ms: f32,
    pub aerial_attack_pending: bool,
    pub landing_lag_ms: f32,
    pub guard_break_ready: bool,
    pub backstab_pending_mult: f32,
    pub riposte_pending_mult: f32,
    pub guard_break_pending_mult: f32,
    pub force_crit_next_strike: bool,
    /// Set while a HyperArmor-flagged window is being processed; read by
    /// `defense::apply_incoming_melee` to suppress poise damage. Owned here
    /// (rather than on `Player`) since it's strike-processing bookkeeping,
    /// not persistent combatant state.
    pub hyper_armor_active: bool,
}

impl Default for PlayerCombatState {
    fn default() -> Self {
        PlayerCombatState {
            phase: Phase::Idle,
            precise_accum_ms: 0.0,
            timer: 0.0,
            combo: 0,
            stamina: 100.0,
            stamina_regen_delay_ms: 0.0,
            buffered_attack: false,
            hit_confirmed: false,
            strike_time_ms: 0.0,
            archetype: Archetype::Light,
            chain_index: 0,
            queued_branch_archetype: Archetype::Light,
            queued_branch_pending: false,
            blocked_this_strike: false,
            recovered_recently: false,
            idle_since_recover_ms: 0.0,
            processed_window_mask: 0,
            emitted_events_mask: 0,
            events: [None; MAX_EVENTS],
            event_count: 0,
            charging: false,
            charge_time_ms: 0.0,
            pending_charge_damage_mult: 1.0,
            parry_active: false,
            parry_timer_ms: 0.0,
            parry_window_ms: 160.0,
            riposte_ready: false,
            riposte_window_ms: 650.0,
            backstab_cooldown_ms: 0.0,
            aerial_attack_pending: false,
            landing_lag_ms: 0.0,
            guard_break_ready: false,
            backstab_pending_mult: 1.0,
            riposte_pending_mult: 1.0,
            guard_break_pending_mult: 1.0,
            force_crit_next_strike: false,
            hyper_armor_active: false,
        }
    }
}

fn def_or_fallback(archetype: Archetype, chain_index: usize) -> Option<&'static AttackDef> {
    registry::lookup(archetype, chain_index as i32)
}

impl PlayerCombatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a combat event, dropping it silently if the ring is full
    /// (bounded event production per strike is expected to stay well under
    /// `MAX_EVENTS`).
    pub fn push_event(&mut self, event: CombatEvent) {
        if self.event_count < MAX_EVENTS {
            self.events[self.event_count] = Some(event);
            self.event_count += 1;
        }
    }

    /// Drain up to `max` queued events, FIFO, matching
    /// `rogue_combat_consume_events`'s shift-remaining semantics.
    pub fn consume_events(&mut self, max: usize) -> Vec<CombatEvent> {
        let n = max.min(self.event_count);
        let drained: Vec<CombatEvent> = self.events[0..n].iter().filter_map(|e| *e).collect();
        let remaining = self.event_count - n;
        for i in 0..remaining {
            self.events[i] = self.events[n + i];
        }
        for slot in self.events[remaining..].iter_mut() {
            *slot = None;
        }
        self.event_count = remaining;
        drained
    }

    pub fn current_def(&self) -> Option<&'static AttackDef> {
        def_or_fallback(self.archetype, self.chain_index)
    }

    pub fn queue_branch(&mut self, archetype: Archetype) {
        self.queued_branch_archetype = archetype;
        self.queued_branch_pending = true;
    }

    pub fn set_hyper_armor(&mut self, active: bool) {
        self.hyper_armor_active = active;
    }

    pub fn notify_blocked(&mut self) {
        if self.phase == Phase::Strike {
            self.blocked_this_strike = true;
        }
    }

    pub fn charge_begin(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        self.charging = true;
        self.charge_time_ms = 0.0;
    }

    /// Accumulate charge time while held; on release, compute and store the
    /// pending damage multiplier.
    pub fn charge_tick(&mut self, dt_ms: f32, still_holding: bool) {
        if !self.charging {
            return;
        }
        if !still_holding {
            let t = self.charge_time_ms;
            let mult = (1.0 + (t / 800.0).min(1.0) * 1.5).min(2.5);
            self.pending_charge_damage_mult = mult;
            self.charging = false;
            self.charge_time_ms = 0.0;
            return;
        }
        self.charge_time_ms = (self.charge_time_ms + dt_ms).min(1600.0);
    }

    pub fn charge_progress(&self) -> f32 {
        if !self.charging {
            return 0.0;
        }
        (self.charge_time_ms / 800.0).clamp(0.0, 1.0)
    }

    /// Advance the state machine by `dt_ms`. `attack_pressed` buffers a new
    /// attack request unless CC suppresses it.
    pub fn tick(&mut self, dt_ms: f32, attack_pressed: bool, player: &mut Player) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        let suppress_buffer = player.cc.stunned() || player.cc.disarmed();
        let suppress_start = suppress_buffer || player.cc.rooted();
        if attack_pressed && !suppress_buffer {
            self.buffered_attack = true;
        }

        let mults = player.stance.multipliers();
        let mut def = self.current_def();
        let mut windup_ms = def.map(|d| d.startup_ms).unwrap_or(110.0) * mults.windup;
        let mut strike_ms = def.map(|d| d.active_ms).unwrap_or(70.0);
        let mut recover_ms = def.map(|d| d.recovery_ms).unwrap_or(120.0) * mults.recovery;

        self.precise_accum_ms += dt_ms as f64;
        self.timer = self.precise_accum_ms as f32;

        match self.phase {
            Phase::Idle => {
                if self.recovered_recently {
                    self.idle_since_recover_ms += dt_ms;
                    if self.idle_since_recover_ms > 130.0 {
                        self.recovered_recently = false;
                    }
                }
                if self.buffered_attack
                    && def.is_some()
                    && self.stamina >= def.unwrap().stamina_cost * mults.stamina
                    && !suppress_start
                {
                    if self.recovered_recently && self.idle_since_recover_ms < 130.0 {
                        self.advance_chain_or_branch();
                        def = self.current_def();
                    }
                    if self.queued_branch_pending {
                        self.archetype = self.queued_branch_archetype;
                        self.chain_index = 0;
                        self.queued_branch_pending = false;
                        def = self.current_def();
                    }
                    let cost = def.map(|d| d.stamina_cost).unwrap_or(14.0) * mults.stamina;
                    self.phase = Phase::Windup;
                    self.timer = 0.0;
                    self.precise_accum_ms = 0.0;
                    self.stamina -= cost;
                    self.stamina_regen_delay_ms = 500.0;
                    self.buffered_attack = false;
                    self.hit_confirmed = false;
                    self.strike_time_ms = 0.0;
                    outcome.entered_windup = true;
                }
            }
            Phase::Windup => {
                if self.timer >= windup_ms {
                    self.phase = Phase::Strike;
                    self.timer = 0.0;
                    self.precise_accum_ms = 0.0;
                    self.strike_time_ms = 0.0;
                    self.blocked_this_strike = false;
                    self.processed_window_mask = 0;
                    self.emitted_events_mask = 0;
                    self.event_count = 0;
                    outcome.entered_strike = true;
                }
            }
            Phase::Strike => {
                self.strike_time_ms += dt_ms;
                let hit_flag_mask = match def {
                    Some(d) => d.flags_at(self.strike_time_ms),
                    None => registry::WindowFlags::default(),
                };

                let mut on_hit_threshold = strike_ms * 0.40;
                if on_hit_threshold < 15.0 {
                    on_hit_threshold = 15.0;
                }
                let mut allow_hit_cancel = false;
                if self.hit_confirmed && def.is_some() && hit_flag_mask.has(registry::WindowFlags::CANCEL_ON_HIT) {
                    let d = def.unwrap();
                    let all_windows_done = if d.num_windows() > 0 {
                        let all_bits = (1u32 << d.num_windows()) - 1;
                        self.processed_window_mask & all_bits == all_bits
                    } else {
                        true
                    };
                    if self.strike_time_ms >= on_hit_threshold || all_windows_done {
                        allow_hit_cancel = true;
                    }
                }
                let mut allow_whiff_cancel = false;
                if !self.hit_confirmed {
                    if let Some(d) = def {
                        if hit_flag_mask.has(registry::WindowFlags::CANCEL_ON_WHIFF) {
                            let needed = d.whiff_cancel_pct * strike_ms;
                            if self.strike_time_ms >= needed {
                                allow_whiff_cancel = true;
                            }
                        }
                    }
                }
                let mut allow_block_cancel = false;
                if self.blocked_this_strike && def.is_some() && hit_flag_mask.has(registry::WindowFlags::CANCEL_ON_BLOCK) {
                    let d = def.unwrap();
                    let mut block_thresh = strike_ms * 0.30;
                    let whiff_equiv = d.whiff_cancel_pct * strike_ms;
                    if block_thresh > whiff_equiv {
                        block_thresh = whiff_equiv;
                    }
                    if self.strike_time_ms >= block_thresh {
                        allow_block_cancel = true;
                    }
                }

                if self.strike_time_ms >= strike_ms || allow_hit_cancel || allow_whiff_cancel || allow_block_cancel {
                    self.phase = Phase::Recover;
                    self.timer = 0.0;
                    self.precise_accum_ms = 0.0;
                    self.combo = (self.combo + 1).min(5);
                    if self.landing_lag_ms > 0.0 {
                        self.precise_accum_ms = -(self.landing_lag_ms as f64);
                        self.landing_lag_ms = 0.0;
                    }
                    outcome.entered_recover = true;
                }
            }
            Phase::Recover => {
                if self.timer >= recover_ms {
                    if self.buffered_attack && def.is_some() {
                        self.advance_chain_or_branch();
                        let next_def = self.current_def();
                        let cost = next_def.map(|d| d.stamina_cost).unwrap_or(10.0) * mults.stamina;
                        if self.stamina >= cost {
                            self.phase = Phase::Windup;
                            self.timer = 0.0;
                            self.precise_accum_ms = 0.0;
                            self.stamina -= cost;
                            self.stamina_regen_delay_ms = 450.0;
                            self.buffered_attack = false;
                            self.hit_confirmed = false;
                            self.strike_time_ms = 0.0;
                            self.blocked_this_strike = false;
                            outcome.entered_windup = true;
                        } else {
                            self.phase = Phase::Idle;
                            self.timer = 0.0;
                            self.hit_confirmed = false;
                            self.buffered_attack = false;
                            self.recovered_recently = true;
                            self.idle_since_recover_ms = 0.0;
                        }
                    } else {
                        self.phase = Phase::Idle;
                        self.timer = 0.0;
                        self.hit_confirmed = false;
                        self.buffered_attack = false;
                        self.blocked_this_strike = false;
                        self.recovered_recently = true;
                        self.idle_since_recover_ms = 0.0;
                    }
                }
            }
        }

        if self.stamina_regen_delay_ms > 0.0 {
            self.stamina_regen_delay_ms -= dt_ms;
        } else {
            let dex = player.stats.dexterity;
            let intel = player.stats.intelligence;
            let mut regen = 0.040 + dex * 0.00070 + intel * 0.00050;
            regen *= player.encumbrance.stamina_regen_mult();
            self.stamina = (self.stamina + dt_ms * regen).min(100.0);
        }

        if self.parry_active {
            self.parry_timer_ms += dt_ms;
            if self.parry_timer_ms >= self.parry_window_ms {
                self.parry_active = false;
                self.parry_timer_ms = 0.0;
            }
        }
        if self.riposte_ready {
            self.riposte_window_ms -= dt_ms;
            if self.riposte_window_ms <= 0.0 {
                self.riposte_ready = false;
            }
        }
        if self.backstab_cooldown_ms > 0.0 {
            self.backstab_cooldown_ms = (self.backstab_cooldown_ms - dt_ms).max(0.0);
        }

        let _ = (windup_ms, recover_ms);
        outcome
    }

    fn advance_chain_or_branch(&mut self) {
        if self.queued_branch_pending {
            self.archetype = self.queued_branch_archetype;
            self.chain_index = 0;
            self.queued_branch_pending = false;
        } else {
            let len = registry::chain_length(self.archetype).max(1);
            self.chain_index = (self.chain_index + 1) % len;
        }
    }

    /// Test utility mirroring `rogue_combat_test_force_strike`: jump
    /// directly into Strike phase at a given `strike_time_ms`.
    pub fn force_strike(&mut self, strike_time_ms: f32) {
        self.phase = Phase::Strike;
        self.strike_time_ms = strike_time_ms;
        self.processed_window_mask = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BaseStats, CombatStance, CrowdControlTimers, EncumbranceTier, Infusion, LockOnState,
        ReactionState,
    };
    use bevy_math::Vec2;

    fn make_player() -> Player {
        Player {
            position: Vec2::ZERO,
            facing: crate::types::Facing::Down,
            team_id: 1,
            stats: BaseStats { strength: 60.0, dexterity: 20.0, intelligence: 0.0, vitality: 10.0, level: 1 },
            crit_chance: 5.0,
            crit_damage: 50.0,
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

    #[test]
    fn idle_to_windup_consumes_stamina_and_clears_buffer() {
        let mut state = PlayerCombatState::new();
        let mut player = make_player();
        state.buffered_attack = true;
        let outcome = state.tick(1.0, false, &mut player);
        assert!(outcome.entered_windup);
        assert_eq!(state.phase, Phase::Windup);
        assert!(!state.buffered_attack);
        assert!(state.stamina < 100.0);
    }

    #[test]
    fn stun_suppresses_start_even_when_buffered() {
        let mut state = PlayerCombatState::new();
        let mut player = make_player();
        player.cc.stun_ms = 100.0;
        state.buffered_attack = true;
        let outcome = state.tick(1.0, false, &mut player);
        assert!(!outcome.entered_windup);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn root_allows_buffering_but_not_starting() {
        let mut state = PlayerCombatState::new();
        let mut player = make_player();
        player.cc.root_ms = 100.0;
        state.tick(1.0, true, &mut player);
        assert!(state.buffered_attack);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn windup_transitions_to_strike_and_resets_masks() {
        let mut state = PlayerCombatState::new();
        let mut player = make_player();
        state.phase = Phase::Windup;
        state.processed_window_mask = 0b11;
        let def = state.current_def().unwrap();
        let outcome = state.tick(def.startup_ms + 1.0, false, &mut player);
        assert!(outcome.entered_strike);
        assert_eq!(state.processed_window_mask, 0);
    }

    #[test]
    fn charge_release_computes_expected_multiplier() {
        let mut state = PlayerCombatState::new();
        state.charge_begin();
        state.charge_tick(800.0, true);
        state.charge_tick(0.0, false);
        assert!((state.pending_charge_damage_mult - 2.5).abs() < 0.001);
    }

    #[test]
    fn combo_caps_at_five() {
        let mut state = PlayerCombatState::new();
        state.combo = 5;
        let mut player = make_player();
        state.phase = Phase::Strike;
        let def = state.current_def().unwrap();
        state.strike_time_ms = def.active_ms;
        state.tick(1.0, false, &mut player);
        assert_eq!(state.combo, 5);
    }

    #[test]
    fn event_consumption_is_fifo_and_shifts_remaining() {
        let mut state = PlayerCombatState::new();
        state.push_event(CombatEvent { kind: CombatEventKind::WindowBegin, window_index: 0, enemy_index: None });
        state.push_event(CombatEvent { kind: CombatEventKind::WindowEnd, window_index: 0, enemy_index: None });
        state.push_event(CombatEvent { kind: CombatEventKind::Stagger, window_index: 0, enemy_index: Some(2) });
        let drained = state.consume_events(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(state.event_count, 1);
        assert_eq!(state.events[0].unwrap().kind, CombatEventKind::Stagger);
    }
}
