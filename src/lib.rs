//! Deterministic core combat engine: attack state machine, damage pipeline,
//! defensive resolution, hit geometry, lock-on, and the damage event ring.
//! No rendering, input, or ECS scheduling surface — callers drive it tick by
//! tick and own their own presentation layer.

pub mod adapters;
pub mod cli;
pub mod damage_event;
pub mod defense;
pub mod external;
pub mod geometry;
pub mod io;
pub mod lockon;
pub mod mitigation;
pub mod reaction;
pub mod registry;
pub mod runtime;
pub mod scenario;
pub mod state_machine;
pub mod strike;
pub mod types;
