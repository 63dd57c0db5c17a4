//! Attack registry.
//!
//! A read-only table of attack definitions keyed by (archetype, chain
//! index). Out-of-range lookups clamp rather than error.

use crate::types::{Archetype, DamageType};

/// Per-window flags. A plain newtype over `u32` rather than the
/// `bitflags` crate since the set is small, fixed, and entirely internal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowFlags(pub u32);

impl WindowFlags {
    pub const NONE: u32 = 0;
    pub const HYPER_ARMOR: u32 = 1 << 0;
    pub const CANCEL_ON_HIT: u32 = 1 << 1;
    pub const CANCEL_ON_WHIFF: u32 = 1 << 2;
    pub const CANCEL_ON_BLOCK: u32 = 1 << 3;

    pub fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }
}

/// A sub-interval of the Strike phase during which damage may be applied.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub start_ms: f32,
    pub end_ms: f32,
    pub flags: WindowFlags,
    pub damage_mult: f32,
    pub bleed_build: f32,
    pub frost_build: f32,
}

impl Window {
    pub const fn new(start_ms: f32, end_ms: f32, flags: u32) -> Self {
        Window {
            start_ms,
            end_ms,
            flags: WindowFlags(flags),
            damage_mult: 1.0,
            bleed_build: 0.0,
            frost_build: 0.0,
        }
    }

    pub const fn with_mult(mut self, mult: f32) -> Self {
        self.damage_mult = mult;
        self
    }

    pub const fn with_builds(mut self, bleed: f32, frost: f32) -> Self {
        self.bleed_build = bleed;
        self.frost_build = frost;
        self
    }

    /// Window boundary is inclusive at `start`, exclusive at `end`.
    pub fn contains(&self, t_ms: f32) -> bool {
        t_ms >= self.start_ms && t_ms < self.end_ms
    }
}

pub const MAX_WINDOWS: usize = 4;

/// Immutable attack definition.
#[derive(Debug, Clone)]
pub struct AttackDef {
    pub id: u32,
    pub archetype: Archetype,
    pub chain_index: usize,
    pub startup_ms: f32,
    pub active_ms: f32,
    pub recovery_ms: f32,
    pub stamina_cost: f32,
    pub poise_damage: i32,
    pub base_damage: f32,
    pub damage_type: DamageType,
    pub str_scale: f32,
    pub dex_scale: f32,
    pub int_scale: f32,
    pub windows: [Option<Window>; MAX_WINDOWS],
    pub cancel_flags: WindowFlags,
    pub whiff_cancel_pct: f32,
}

impl AttackDef {
    pub fn num_windows(&self) -> usize {
        self.windows.iter().filter(|w| w.is_some()).count()
    }

    /// Windows active (containing `t_ms`) as a bitmask, one bit per window slot.
    pub fn active_window_mask(&self, t_ms: f32) -> u32 {
        let mut mask = 0u32;
        for (i, w) in self.windows.iter().enumerate() {
            if let Some(w) = w {
                if w.contains(t_ms) {
                    mask |= 1 << i;
                }
            }
        }
        mask
    }

    /// Flags in effect at `t_ms`: the containing window's flags if any window
    /// is active, else the attack's top-level default flags.
    pub fn flags_at(&self, t_ms: f32) -> WindowFlags {
        for w in self.windows.iter().flatten() {
            if w.contains(t_ms) {
                return w.flags;
            }
        }
        self.cancel_flags
    }

    /// Bitmask (by window slot) of windows carrying the HyperArmor flag,
    /// used to test whether hyper armor should still hold after a strike
    /// pass finishes processing.
    pub fn flags_hyper_armor_mask(&self) -> u32 {
        let mut mask = 0u32;
        for (i, w) in self.windows.iter().enumerate() {
            if let Some(w) = w {
                if w.flags.has(WindowFlags::HYPER_ARMOR) {
                    mask |= 1 << i;
                }
            }
        }
        mask
    }
}

fn validate_def(def: &AttackDef) {
    debug_assert!(def.num_windows() <= MAX_WINDOWS);
    for w in def.windows.iter().flatten() {
        debug_assert!(w.start_ms >= 0.0 && w.end_ms > w.start_ms && w.end_ms <= def.active_ms);
    }
}

/// A chain of attacks for a single archetype.
pub struct Chain {
    pub defs: &'static [AttackDef],
}

/// Look up an `AttackDef` by (archetype, chain_index) with clamp semantics:
/// negative index clamps to the first entry (callers pass `usize`, so only
/// the upper bound actually needs clamping here), index >= chain length
/// clamps to the last entry. Unknown archetypes never occur since
/// `Archetype` is exhaustive, but an empty chain yields `None`.
pub fn lookup(archetype: Archetype, chain_index: i32) -> Option<&'static AttackDef> {
    let chain = table(archetype);
    if chain.defs.is_empty() {
        return None;
    }
    let idx = if chain_index < 0 {
        0
    } else if (chain_index as usize) >= chain.defs.len() {
        chain.defs.len() - 1
    } else {
        chain_index as usize
    };
    Some(&chain.defs[idx])
}

pub fn chain_length(archetype: Archetype) -> usize {
    table(archetype).defs.len()
}

fn table(archetype: Archetype) -> Chain {
    match archetype {
        Archetype::Light => Chain { defs: &LIGHT_CHAIN },
        Archetype::Heavy => Chain { defs: &HEAVY_CHAIN },
        Archetype::Thrust => Chain { defs: &THRUST_CHAIN },
        Archetype::Ranged => Chain { defs: &RANGED_CHAIN },
        Archetype::SpellFocus => Chain { defs: &SPELLFOCUS_CHAIN },
    }
}

static LIGHT_CHAIN: [AttackDef; 3] = [
    AttackDef {
        id: 100,
        archetype: Archetype::Light,
        chain_index: 0,
        startup_ms: 120.0,
        active_ms: 160.0,
        recovery_ms: 220.0,
        stamina_cost: 8.0,
        poise_damage: 12,
        base_damage: 14.0,
        damage_type: DamageType::Physical,
        str_scale: 0.35,
        dex_scale: 0.25,
        int_scale: 0.0,
        windows: [
            Some(Window::new(10.0, 80.0, WindowFlags::CANCEL_ON_HIT)),
            None,
            None,
            None,
        ],
        cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF),
        whiff_cancel_pct: 0.55,
    },
    AttackDef {
        id: 101,
        archetype: Archetype::Light,
        chain_index: 1,
        startup_ms: 110.0,
        active_ms: 150.0,
        recovery_ms: 230.0,
        stamina_cost: 9.0,
        poise_damage: 14,
        base_damage: 16.0,
        damage_type: DamageType::Physical,
        str_scale: 0.37,
        dex_scale: 0.27,
        int_scale: 0.0,
        windows: [
            Some(Window::new(5.0, 75.0, WindowFlags::CANCEL_ON_HIT)),
            None,
            None,
            None,
        ],
        cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF),
        whiff_cancel_pct: 0.55,
    },
    AttackDef {
        id: 102,
        archetype: Archetype::Light,
        chain_index: 2,
        startup_ms: 130.0,
        active_ms: 170.0,
        recovery_ms: 300.0,
        stamina_cost: 11.0,
        poise_damage: 18,
        base_damage: 20.0,
        damage_type: DamageType::Physical,
        str_scale: 0.40,
        dex_scale: 0.30,
        int_scale: 0.0,
        windows: [
            Some(Window::new(15.0, 100.0, WindowFlags::CANCEL_ON_HIT)),
            None,
            None,
            None,
        ],
        cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF),
        whiff_cancel_pct: 0.60,
    },
];

static HEAVY_CHAIN: [AttackDef; 2] = [
    AttackDef {
        id: 200,
        archetype: Archetype::Heavy,
        chain_index: 0,
        startup_ms: 260.0,
        active_ms: 210.0,
        recovery_ms: 420.0,
        stamina_cost: 22.0,
        poise_damage: 34,
        base_damage: 34.0,
        damage_type: DamageType::Physical,
        str_scale: 0.85,
        dex_scale: 0.10,
        int_scale: 0.0,
        windows: [
            Some(Window::new(20.0, 120.0, WindowFlags::HYPER_ARMOR)),
            None,
            None,
            None,
        ],
        cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF | WindowFlags::CANCEL_ON_BLOCK),
        whiff_cancel_pct: 0.65,
    },
    // Three-window combo used by the multi-hit window-damage-sequence test:
    // windows at 0-40, 40-80, 80-105 within a 105ms active duration.
    AttackDef {
        id: 201,
        archetype: Archetype::Heavy,
        chain_index: 1,
        startup_ms: 240.0,
        active_ms: 105.0,
        recovery_ms: 460.0,
        stamina_cost: 26.0,
        poise_damage: 40,
        base_damage: 30.0,
        damage_type: DamageType::Physical,
        str_scale: 0.60,
        dex_scale: 0.10,
        int_scale: 0.0,
        windows: [
            Some(Window::new(0.0, 40.0, WindowFlags::NONE)),
            Some(Window::new(40.0, 80.0, WindowFlags::NONE)),
            Some(Window::new(80.0, 105.0, WindowFlags::NONE)),
            None,
        ],
        cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF | WindowFlags::CANCEL_ON_BLOCK),
        whiff_cancel_pct: 0.65,
    },
];

static THRUST_CHAIN: [AttackDef; 1] = [AttackDef {
    id: 300,
    archetype: Archetype::Thrust,
    chain_index: 0,
    startup_ms: 140.0,
    active_ms: 90.0,
    recovery_ms: 260.0,
    stamina_cost: 12.0,
    poise_damage: 16,
    base_damage: 18.0,
    damage_type: DamageType::Physical,
    str_scale: 0.30,
    dex_scale: 0.45,
    int_scale: 0.0,
    windows: [
        Some(Window::new(10.0, 60.0, WindowFlags::CANCEL_ON_HIT)),
        None,
        None,
        None,
    ],
    cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF),
    whiff_cancel_pct: 0.50,
}];

static RANGED_CHAIN: [AttackDef; 1] = [AttackDef {
    id: 400,
    archetype: Archetype::Ranged,
    chain_index: 0,
    startup_ms: 180.0,
    active_ms: 60.0,
    recovery_ms: 340.0,
    stamina_cost: 10.0,
    poise_damage: 6,
    base_damage: 12.0,
    damage_type: DamageType::Physical,
    str_scale: 0.05,
    dex_scale: 0.55,
    int_scale: 0.0,
    windows: [
        Some(Window::new(0.0, 40.0, WindowFlags::CANCEL_ON_HIT)),
        None,
        None,
        None,
    ],
    cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF),
    whiff_cancel_pct: 0.70,
}];

static SPELLFOCUS_CHAIN: [AttackDef; 1] = [AttackDef {
    id: 500,
    archetype: Archetype::SpellFocus,
    chain_index: 0,
    startup_ms: 320.0,
    active_ms: 80.0,
    recovery_ms: 380.0,
    stamina_cost: 18.0,
    poise_damage: 10,
    base_damage: 26.0,
    damage_type: DamageType::Arcane,
    str_scale: 0.0,
    dex_scale: 0.0,
    int_scale: 0.75,
    windows: [
        Some(Window::new(10.0, 55.0, WindowFlags::CANCEL_ON_HIT)),
        None,
        None,
        None,
    ],
    cancel_flags: WindowFlags(WindowFlags::CANCEL_ON_WHIFF),
    whiff_cancel_pct: 0.60,
}];
