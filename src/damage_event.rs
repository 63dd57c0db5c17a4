//! Damage Event Ring & Observers.
//!
//! A fixed-capacity circular buffer plus a synchronous observer fan-out,
//! kept as a plain struct inside `CombatRuntime` rather than a `static`.

use crate::types::DamageType;

pub const RING_CAPACITY: usize = 64;
pub const MAX_OBSERVERS: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct DamageEvent {
    pub attack_id: u32,
    pub damage_type: Option<DamageType>,
    pub crit: bool,
    pub raw_damage: i32,
    pub mitigated: i32,
    pub overkill: i32,
    pub execution: bool,
}

/// Observer callback signature: the event plus the observer's opaque user
/// data. Observers live in a fixed-size array of `Option<(Callback,
/// UserData)>` slots rather than a growable `Vec`.
pub type ObserverFn = fn(&DamageEvent, usize);

#[derive(Clone, Copy)]
struct Observer {
    callback: ObserverFn,
    user_data: usize,
}

/// Fixed-capacity ring of the most recent `RING_CAPACITY` damage events plus
/// a monotone total counter, and up to `MAX_OBSERVERS` synchronous
/// subscribers.
pub struct DamageEventRing {
    entries: [DamageEvent; RING_CAPACITY],
    head: usize,
    len: usize,
    total: u64,
    observers: [Option<Observer>; MAX_OBSERVERS],
    next_observer_id: usize,
    observer_ids: [usize; MAX_OBSERVERS],
}

impl Default for DamageEventRing {
    fn default() -> Self {
        DamageEventRing {
            entries: [DamageEvent::default(); RING_CAPACITY],
            head: 0,
            len: 0,
            total: 0,
            observers: [None; MAX_OBSERVERS],
            next_observer_id: 1,
            observer_ids: [0; MAX_OBSERVERS],
        }
    }
}

impl DamageEventRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write into the ring and advance head/total, without dispatching to
    /// observers.
    pub fn record_base(&mut self, event: DamageEvent) {
        self.entries[self.head] = event;
        self.head = (self.head + 1) % RING_CAPACITY;
        if self.len < RING_CAPACITY {
            self.len += 1;
        }
        self.total = self.total.wrapping_add(1);
    }

    /// Write into the ring and synchronously dispatch to every registered
    /// observer. `None` slots (removed mid-dispatch) are skipped.
    pub fn record(&mut self, event: DamageEvent) {
        self.record_base(event);
        for slot in self.observers.iter().flatten() {
            (slot.callback)(&event, slot.user_data);
        }
    }

    /// Register an observer. Returns its id, or `-1` if the registry is full.
    pub fn add_observer(&mut self, callback: ObserverFn, user_data: usize) -> i64 {
        for i in 0..MAX_OBSERVERS {
            if self.observers[i].is_none() {
                self.observers[i] = Some(Observer { callback, user_data });
                let id = self.next_observer_id;
                self.observer_ids[i] = id;
                self.next_observer_id += 1;
                return id as i64;
            }
        }
        -1
    }

    /// Remove an observer by id. Safe to call during dispatch: this only
    /// ever nulls a slot, never shifts the array, so an in-progress
    /// `record()` iteration sees either the old or the removed state and
    /// never panics.
    pub fn remove_observer(&mut self, id: i64) -> bool {
        if id < 0 {
            return false;
        }
        let id = id as usize;
        for i in 0..MAX_OBSERVERS {
            if self.observer_ids[i] == id && self.observers[i].is_some() {
                self.observers[i] = None;
                self.observer_ids[i] = 0;
                return true;
            }
        }
        false
    }

    pub fn clear_observers(&mut self) {
        self.observers = [None; MAX_OBSERVERS];
        self.observer_ids = [0; MAX_OBSERVERS];
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the most recent `n` events (or fewer if the ring holds less)
    /// into a caller buffer, oldest-to-newest.
    pub fn snapshot(&self, n: usize) -> Vec<DamageEvent> {
        let take = n.min(self.len);
        let start = (self.head + RING_CAPACITY - take) % RING_CAPACITY;
        (0..take).map(|i| self.entries[(start + i) % RING_CAPACITY]).collect()
    }

    /// Zero all entries and reset head/total. Used by tests.
    pub fn clear(&mut self) {
        self.entries = [DamageEvent::default(); RING_CAPACITY];
        self.head = 0;
        self.len = 0;
        self.total = 0;
    }
}
