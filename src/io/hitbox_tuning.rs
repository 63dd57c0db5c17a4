//! Hitbox tuning JSON: a single object of hand-tunable offsets layered on
//! top of weapon geometry. Load/save must be
//! bit-exact: the file struct's field order matches `HitboxTuning`'s
//! declaration order exactly and is serialized with a fixed pretty-printer,
//! so loading a file and saving it straight back out reproduces the
//! original bytes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::HitboxTuning;

fn default_scale() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitboxTuningFile {
    #[serde(default)]
    pub player_offset_x: f32,
    #[serde(default)]
    pub player_offset_y: f32,
    #[serde(default)]
    pub player_length: f32,
    #[serde(default)]
    pub player_width: f32,
    #[serde(default)]
    pub enemy_radius: f32,
    #[serde(default)]
    pub enemy_offset_x: f32,
    #[serde(default)]
    pub enemy_offset_y: f32,
    #[serde(default)]
    pub pursue_offset_x: f32,
    #[serde(default)]
    pub pursue_offset_y: f32,
    #[serde(default)]
    pub mask_dx: [f32; 4],
    #[serde(default)]
    pub mask_dy: [f32; 4],
    #[serde(default = "default_scale")]
    pub mask_scale_x: [f32; 4],
    #[serde(default = "default_scale")]
    pub mask_scale_y: [f32; 4],
}

impl HitboxTuningFile {
    pub fn to_tuning(&self) -> HitboxTuning {
        HitboxTuning {
            player_offset_x: self.player_offset_x,
            player_offset_y: self.player_offset_y,
            player_length: self.player_length,
            player_width: self.player_width,
            enemy_radius: self.enemy_radius,
            enemy_offset_x: self.enemy_offset_x,
            enemy_offset_y: self.enemy_offset_y,
            pursue_offset_x: self.pursue_offset_x,
            pursue_offset_y: self.pursue_offset_y,
            mask_dx: self.mask_dx,
            mask_dy: self.mask_dy,
            mask_scale_x: self.mask_scale_x,
            mask_scale_y: self.mask_scale_y,
        }
    }

    pub fn from_tuning(tuning: &HitboxTuning) -> Self {
        HitboxTuningFile {
            player_offset_x: tuning.player_offset_x,
            player_offset_y: tuning.player_offset_y,
            player_length: tuning.player_length,
            player_width: tuning.player_width,
            enemy_radius: tuning.enemy_radius,
            enemy_offset_x: tuning.enemy_offset_x,
            enemy_offset_y: tuning.enemy_offset_y,
            pursue_offset_x: tuning.pursue_offset_x,
            pursue_offset_y: tuning.pursue_offset_y,
            mask_dx: tuning.mask_dx,
            mask_dy: tuning.mask_dy,
            mask_scale_x: tuning.mask_scale_x,
            mask_scale_y: tuning.mask_scale_y,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<HitboxTuning, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read hitbox tuning file: {}", e))?;
        let file: HitboxTuningFile = serde_json::from_str(&contents)
            .map_err(|e| format!("failed to parse hitbox tuning JSON: {}", e))?;
        Ok(file.to_tuning())
    }

    pub fn save_to_file(tuning: &HitboxTuning, path: &Path) -> Result<(), String> {
        let file = HitboxTuningFile::from_tuning(tuning);
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("failed to serialize hitbox tuning: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("failed to write hitbox tuning file: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("strikecore_test_hbt_{}_{}", std::process::id(), name))
    }

    #[test]
    fn missing_fields_default_to_zero_and_mask_scale_to_one() {
        let path = temp_path("sparse.json");
        std::fs::write(&path, "{}").unwrap();
        let tuning = HitboxTuningFile::load_from_file(&path).unwrap();
        assert_eq!(tuning.player_offset_x, 0.0);
        assert_eq!(tuning.mask_scale_x, [1.0; 4]);
        assert_eq!(tuning.mask_dx, [0.0; 4]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_then_load_then_save_is_byte_identical() {
        let path_a = temp_path("roundtrip_a.json");
        let path_b = temp_path("roundtrip_b.json");
        let mut tuning = HitboxTuning::default();
        tuning.player_offset_x = 0.25;
        tuning.mask_scale_y = [1.0, 0.9, 1.1, 1.0];

        HitboxTuningFile::save_to_file(&tuning, &path_a).unwrap();
        let loaded = HitboxTuningFile::load_from_file(&path_a).unwrap();
        HitboxTuningFile::save_to_file(&loaded, &path_b).unwrap();

        let bytes_a = std::fs::read(&path_a).unwrap();
        let bytes_b = std::fs::read(&path_b).unwrap();
        assert_eq!(bytes_a, bytes_b);

        std::fs::remove_file(&path_a).ok();
        std::fs::remove_file(&path_b).ok();
    }
}
