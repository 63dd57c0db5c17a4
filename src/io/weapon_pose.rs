//! Weapon pose JSON: per-frame pixel-mask transform poses, grouped by
//! facing direction ("weapon pose JSON"). Only three groups are
//! stored on disk — `down`, `up`, `side` — because `Facing::Left` mirrors
//! `side` rather than carrying its own frames.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Facing;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub pivot_x: f32,
    #[serde(default)]
    pub pivot_y: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl PoseFrame {
    fn mirrored(&self) -> PoseFrame {
        PoseFrame {
            dx: -self.dx,
            dy: self.dy,
            angle: -self.angle,
            scale: self.scale,
            pivot_x: -self.pivot_x,
            pivot_y: self.pivot_y,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponPoseSet {
    #[serde(default)]
    pub down: Vec<PoseFrame>,
    #[serde(default)]
    pub up: Vec<PoseFrame>,
    #[serde(default)]
    pub side: Vec<PoseFrame>,
}

impl WeaponPoseSet {
    /// Returns the pose for a facing/frame pair, mirroring the `side` group
    /// for `Facing::Left`. Out-of-range frame indices clamp to the last
    /// available frame, or a neutral default pose if the group is empty.
    pub fn frame(&self, facing: Facing, frame_index: usize) -> PoseFrame {
        let (group, mirror) = match facing {
            Facing::Down => (&self.down, false),
            Facing::Up => (&self.up, false),
            Facing::Right => (&self.side, false),
            Facing::Left => (&self.side, true),
        };
        let pose = group
            .get(frame_index)
            .or_else(|| group.last())
            .copied()
            .unwrap_or(PoseFrame {
                dx: 0.0,
                dy: 0.0,
                angle: 0.0,
                scale: 1.0,
                pivot_x: 0.0,
                pivot_y: 0.0,
            });
        if mirror {
            pose.mirrored()
        } else {
            pose
        }
    }

    pub fn load_from_file(path: &Path) -> Result<WeaponPoseSet, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read weapon pose file: {}", e))?;
        serde_json::from_str(&contents).map_err(|e| format!("failed to parse weapon pose JSON: {}", e))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize weapon pose: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("failed to write weapon pose file: {}", e))
    }
}
