//! On-disk JSON formats the core reads and writes.
//!
//! Each submodule follows the same shape: a `serde`-derived file struct with
//! `#[serde(default = ...)]` fallbacks, a `load_from_file`/`save_to_file`
//! pair on `Path`, and a conversion into the engine-native type the rest of
//! the crate actually uses. Parse/read failures are reported as
//! `Result<_, String>` rather than a custom error enum.

pub mod hitbox_tuning;
pub mod proc_designer;
pub mod weapon_geometry;
pub mod weapon_pose;
