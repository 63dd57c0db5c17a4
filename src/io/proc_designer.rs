//! Proc designer JSON: an array of observer-authored proc definitions used
//! by external tooling to wire up `Procs` implementations ("proc
//! designer JSON"). The core itself only loads and round-trips this data;
//! dispatching triggers at runtime is the job of whatever `Procs`
//! implementation a caller plugs in.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcTrigger {
    OnHit,
    OnCrit,
    OnBlock,
    OnKill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackRule {
    Refresh,
    Add,
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcDef {
    pub name: String,
    pub trigger: ProcTrigger,
    #[serde(default)]
    pub icd_ms: u32,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub magnitude: f32,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    #[serde(default = "default_stack_rule")]
    pub stack_rule: StackRule,
    #[serde(default)]
    pub param: f32,
}

fn default_max_stacks() -> u32 {
    1
}

fn default_stack_rule() -> StackRule {
    StackRule::Refresh
}

pub fn load_from_file(path: &Path) -> Result<Vec<ProcDef>, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read proc designer file: {}", e))?;
    serde_json::from_str(&contents).map_err(|e| format!("failed to parse proc designer JSON: {}", e))
}

pub fn save_to_file(procs: &[ProcDef], path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(procs)
        .map_err(|e| format!("failed to serialize proc designer set: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("failed to write proc designer file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_missing_fields() {
        let json = r#"[{"name": "Lifesteal", "trigger": "ON_HIT"}]"#;
        let path = std::env::temp_dir().join(format!("strikecore_test_proc_{}.json", std::process::id()));
        std::fs::write(&path, json).unwrap();
        let procs = load_from_file(&path).unwrap();
        assert_eq!(procs.len(), 1);
        assert_eq!(procs[0].max_stacks, 1);
        assert_eq!(procs[0].stack_rule, StackRule::Refresh);
        assert_eq!(procs[0].trigger, ProcTrigger::OnHit);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let procs = vec![ProcDef {
            name: "Thornmail".to_string(),
            trigger: ProcTrigger::OnBlock,
            icd_ms: 500,
            duration_ms: 3000,
            magnitude: 0.2,
            max_stacks: 3,
            stack_rule: StackRule::Add,
            param: 1.5,
        }];
        let path = std::env::temp_dir().join(format!("strikecore_test_proc_rt_{}.json", std::process::id()));
        save_to_file(&procs, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Thornmail");
        assert_eq!(loaded[0].icd_ms, 500);
        assert_eq!(loaded[0].stack_rule, StackRule::Add);
        std::fs::remove_file(&path).ok();
    }
}
