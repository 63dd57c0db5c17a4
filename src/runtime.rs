//! `CombatRuntime` context.
//!
//! Bundles every piece of process-wide mutable state the combat pipeline
//! touches — the damage-event ring (with its own observer slots), the
//! optional obstruction test hook, the pixel-mask cache, and hitbox tuning —
//! behind one struct passed by `&mut` into entry points, instead of statics.
//! Where call sites (mostly tests) want file-scope convenience anyway, a
//! lazily-initialized singleton is provided with an explicit
//! `reset_for_tests` rather than leaving global state to rot between runs.

use std::sync::{Mutex, OnceLock};

use crate::damage_event::DamageEventRing;
use crate::external::ObstructionHook;
use crate::geometry::{HitboxTuning, MismatchCounters, PixelMaskCache};

pub struct CombatRuntime {
    pub ring: DamageEventRing,
    pub obstruction_hook: Option<Box<dyn ObstructionHook + Send>>,
    pub pixel_cache: PixelMaskCache,
    pub hitbox_tuning: HitboxTuning,
    pub mismatch: MismatchCounters,
    pub use_pixel_masks: bool,
}

impl Default for CombatRuntime {
    fn default() -> Self {
        CombatRuntime {
            ring: DamageEventRing::new(),
            obstruction_hook: None,
            pixel_cache: PixelMaskCache::new(),
            hitbox_tuning: HitboxTuning::default(),
            mismatch: MismatchCounters::default(),
            use_pixel_masks: false,
        }
    }
}

impl CombatRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_obstruction_hook(&mut self, hook: Box<dyn ObstructionHook + Send>) {
        self.obstruction_hook = Some(hook);
    }

    pub fn clear_obstruction_hook(&mut self) {
        self.obstruction_hook = None;
    }

    /// Reset everything back to a fresh state: clears the ring, drops the
    /// pixel-mask cache, and removes any installed obstruction hook. Callers
    /// that want to keep tuned hitbox values across tests should re-apply
    /// them after calling this.
    pub fn reset_for_tests(&mut self) {
        self.ring.clear();
        self.ring.clear_observers();
        self.pixel_cache.reset_all();
        self.mismatch = MismatchCounters::default();
        self.obstruction_hook = None;
    }
}

static GLOBAL: OnceLock<Mutex<CombatRuntime>> = OnceLock::new();

/// The process-wide singleton, for call sites that don't want to thread a
/// `&mut CombatRuntime` through. Initializes lazily on first use.
pub fn global() -> &'static Mutex<CombatRuntime> {
    GLOBAL.get_or_init(|| Mutex::new(CombatRuntime::new()))
}

/// Reset the global singleton, for test isolation between cases that share it.
pub fn reset_global_for_tests() {
    global().lock().unwrap().reset_for_tests();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_runtime_has_empty_ring_and_no_hook() {
        let rt = CombatRuntime::new();
        assert_eq!(rt.ring.total(), 0);
        assert!(rt.obstruction_hook.is_none());
    }

    #[test]
    fn reset_for_tests_clears_ring_and_hook() {
        use crate::damage_event::DamageEvent;
        let mut rt = CombatRuntime::new();
        rt.ring.record_base(DamageEvent::default());
        assert_eq!(rt.ring.len(), 1);
        rt.reset_for_tests();
        assert_eq!(rt.ring.len(), 0);
        assert_eq!(rt.ring.total(), 0);
    }

    #[test]
    fn global_singleton_is_reachable_and_resettable() {
        {
            let mut guard = global().lock().unwrap();
            guard.ring.record_base(crate::damage_event::DamageEvent::default());
        }
        reset_global_for_tests();
        let guard = global().lock().unwrap();
        assert_eq!(guard.ring.len(), 0);
    }
}
