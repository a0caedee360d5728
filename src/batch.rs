use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::commands::{MountOptions, SetlineOptions};

#[derive(Debug, Deserialize)]
pub struct BatchPlan {
    pub steps: Vec<PlanEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlanEntry {
    Setline(SetlineOptions),
    Mount(MountOptions),
}

impl PlanEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanEntry::Setline(_) => "setline",
            PlanEntry::Mount(_) => "mount",
        }
    }
}

pub fn load_plan(path: &Path) -> Result<BatchPlan> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse JSON plan {}", path.display()))
    } else {
        serde_yaml::from_str(&data)
            .with_context(|| format!("failed to parse YAML plan {}", path.display()))
    }
}
