//! Reactions, directional influence, and i-frames.
//!
//! This is the player's own reaction bookkeeping — the *trigger* (crossing
//! poise to zero, or raw-damage thresholds) lives in `defense.rs`.

use bevy_math::Vec2;

use crate::types::{Player, ReactionType};

fn duration_ms(reaction_type: ReactionType) -> f32 {
    match reaction_type {
        ReactionType::None => 0.0,
        ReactionType::LightFlinch => 220.0,
        ReactionType::Stagger => 600.0,
        ReactionType::Knockdown => 900.0,
        ReactionType::Launch => 1100.0,
    }
}

fn di_cap(reaction_type: ReactionType) -> f32 {
    match reaction_type {
        ReactionType::None => 0.0,
        ReactionType::LightFlinch => 0.35,
        ReactionType::Stagger => 0.55,
        ReactionType::Knockdown => 0.85,
        ReactionType::Launch => 1.00,
    }
}

fn cancel_window(reaction_type: ReactionType) -> Option<(f32, f32)> {
    match reaction_type {
        ReactionType::LightFlinch => Some((0.40, 0.75)),
        ReactionType::Stagger => Some((0.55, 0.85)),
        ReactionType::Knockdown => Some((0.60, 0.80)),
        ReactionType::Launch => Some((0.65, 0.78)),
        ReactionType::None => None,
    }
}

/// Begin a reaction, overwriting whatever was active. `ReactionType::None` is a no-op.
pub fn apply_reaction(player: &mut Player, reaction_type: ReactionType) {
    if reaction_type == ReactionType::None {
        return;
    }
    let timer = duration_ms(reaction_type);
    player.reaction.reaction_type = Some(reaction_type);
    player.reaction.reaction_timer_ms = timer;
    player.reaction.reaction_total_ms = timer;
    player.reaction.reaction_di_max = di_cap(reaction_type);
    player.reaction.reaction_di_accum_x = 0.0;
    player.reaction.reaction_di_accum_y = 0.0;
    player.reaction.reaction_canceled_early = false;
}

/// Tick reaction + iframe timers. Reaction state fully clears on expiry.
pub fn tick(player: &mut Player, dt_ms: f32) {
    if player.reaction.reaction_timer_ms > 0.0 {
        player.reaction.reaction_timer_ms -= dt_ms;
        if player.reaction.reaction_timer_ms <= 0.0 {
            player.reaction.reaction_timer_ms = 0.0;
            player.reaction.reaction_type = None;
            player.reaction.reaction_total_ms = 0.0;
            player.reaction.reaction_di_accum_x = 0.0;
            player.reaction.reaction_di_accum_y = 0.0;
            player.reaction.reaction_di_max = 0.0;
        }
    }
    if player.iframes_ms > 0.0 {
        player.iframes_ms = (player.iframes_ms - dt_ms).max(0.0);
    }
}

/// Attempt an early reaction cancel, valid once per reaction inside its
/// type-specific elapsed-fraction window.
pub fn try_cancel(player: &mut Player) -> bool {
    let Some(reaction_type) = player.reaction.reaction_type else {
        return false;
    };
    if player.reaction.reaction_timer_ms <= 0.0 || player.reaction.reaction_canceled_early {
        return false;
    }
    let Some((min_frac, max_frac)) = cancel_window(reaction_type) else {
        return false;
    };
    if player.reaction.reaction_total_ms <= 0.0 {
        return false;
    }
    let elapsed = player.reaction.reaction_total_ms - player.reaction.reaction_timer_ms;
    let frac = elapsed / player.reaction.reaction_total_ms;
    if frac >= min_frac && frac <= max_frac {
        player.reaction.reaction_timer_ms = 0.0;
        player.reaction.reaction_type = None;
        player.reaction.reaction_canceled_early = true;
        true
    } else {
        false
    }
}

/// Accumulate directional influence during an active reaction, clamped to
/// the reaction type's DI cap.
pub fn apply_di(player: &mut Player, dir: Vec2) {
    if player.reaction.reaction_type.is_none() || player.reaction.reaction_timer_ms <= 0.0 {
        return;
    }
    if player.reaction.reaction_di_max <= 0.0 {
        return;
    }
    let mag = dir.length();
    let normalized = if mag > 1.0 && mag > 0.0 { dir / mag } else { dir };
    player.reaction.reaction_di_accum_x += normalized.x * 0.08;
    player.reaction.reaction_di_accum_y += normalized.y * 0.08;
    let acc = Vec2::new(player.reaction.reaction_di_accum_x, player.reaction.reaction_di_accum_y);
    let acc_mag = acc.length();
    if acc_mag > player.reaction.reaction_di_max && acc_mag > 0.0 {
        let scale = player.reaction.reaction_di_max / acc_mag;
        player.reaction.reaction_di_accum_x *= scale;
        player.reaction.reaction_di_accum_y *= scale;
    }
}

/// Additive-by-max i-frame grant: only ever extends, never shortens.
pub fn add_iframes(player: &mut Player, ms: f32) {
    if ms <= 0.0 {
        return;
    }
    if player.iframes_ms < ms {
        player.iframes_ms = ms;
    }
}
