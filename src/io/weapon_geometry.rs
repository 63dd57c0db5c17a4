//! Weapon hit geometry JSON: an array of per-weapon capsule definitions
//! ("weapon hit geometry JSON").

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::WeaponHitGeo;

fn default_width() -> f32 {
    0.30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeaponHitGeoEntry {
    weapon_id: i32,
    length: f32,
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default)]
    pivot_dx: f32,
    #[serde(default)]
    pivot_dy: f32,
    #[serde(default)]
    slash_vfx_id: i32,
}

impl WeaponHitGeoEntry {
    fn validate(&self) -> Result<(), String> {
        if self.length <= 0.0 {
            return Err(format!(
                "weapon {} has non-positive length {}",
                self.weapon_id, self.length
            ));
        }
        Ok(())
    }

    fn to_geo(&self) -> WeaponHitGeo {
        WeaponHitGeo {
            weapon_id: self.weapon_id,
            length: self.length,
            width: self.width,
            pivot_dx: self.pivot_dx,
            pivot_dy: self.pivot_dy,
            slash_vfx_id: self.slash_vfx_id,
        }
    }

    fn from_geo(geo: &WeaponHitGeo) -> Self {
        WeaponHitGeoEntry {
            weapon_id: geo.weapon_id,
            length: geo.length,
            width: geo.width,
            pivot_dx: geo.pivot_dx,
            pivot_dy: geo.pivot_dy,
            slash_vfx_id: geo.slash_vfx_id,
        }
    }
}

/// Keyed table of weapon hit geometry, keyed by `weapon_id`.
#[derive(Debug, Clone, Default)]
pub struct WeaponGeometryTable {
    entries: HashMap<i32, WeaponHitGeo>,
}

impl WeaponGeometryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, weapon_id: i32) -> Option<&WeaponHitGeo> {
        self.entries.get(&weapon_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load_checked(path: &Path) -> Result<Vec<WeaponHitGeoEntry>, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read weapon geometry file: {}", e))?;
        let entries: Vec<WeaponHitGeoEntry> = serde_json::from_str(&contents)
            .map_err(|e| format!("failed to parse weapon geometry JSON: {}", e))?;
        for entry in &entries {
            entry.validate()?;
        }
        Ok(entries)
    }

    /// Load a weapon geometry file, replacing this table's contents (not
    /// appending). Returns the number of entries loaded, or a negative count
    /// on parse/validation failure, in which case the existing table is left
    /// untouched and the caller keeps using whatever defaults it already had.
    pub fn load_from_file(&mut self, path: &Path) -> i32 {
        match Self::load_checked(path) {
            Ok(entries) => {
                self.entries.clear();
                for entry in &entries {
                    self.entries.insert(entry.weapon_id, entry.to_geo());
                }
                self.entries.len() as i32
            }
            Err(_) => -1,
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let mut ids: Vec<&i32> = self.entries.keys().collect();
        ids.sort();
        let entries: Vec<WeaponHitGeoEntry> = ids
            .into_iter()
            .map(|id| WeaponHitGeoEntry::from_geo(&self.entries[id]))
            .collect();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| format!("failed to serialize weapon geometry: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("failed to write weapon geometry file: {}", e))
    }
}
