//! Experiment presets
//!
//! A preset is the JSON document a host loads to set up an experiment: the
//! initial bench, where items sit on screen, and the objectives a student
//! is graded on.

use crate::models::bench::BenchState;
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    Chemistry,
    Physics,
    Mixed,
}

/// Screen placement of a bench item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub item_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
}

/// Validator declaration: a kind name plus free-form parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub description: String,
    pub validator: ValidatorSpec,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPreset {
    pub id: String,
    pub title: String,
    pub discipline: Discipline,
    /// Overrides the config seed when present
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub bench: BenchState,
    #[serde(default)]
    pub layout: Vec<LayoutItem>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub hints: Vec<String>,
}

impl ExperimentPreset {
    /// Parse and check a preset document
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let preset: Self =
            serde_json::from_str(json).map_err(|e| SimulationError::SerializationError(e.to_string()))?;
        preset.bench.validate()?;
        Ok(preset)
    }

    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string_pretty(self).map_err(|e| SimulationError::SerializationError(e.to_string()))
    }

    /// Total points available
    pub fn max_points(&self) -> u32 {
        self.objectives.iter().map(|o| o.points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITRATION: &str = r#"{
        "id": "titration-101",
        "title": "Strong acid titration",
        "discipline": "chemistry",
        "bench": {
            "vessels": [{
                "id": "flask",
                "volume_l": 0.05,
                "species": [{"formula": "HCl", "moles": 0.005}],
                "indicator": "phenolphthalein"
            }]
        },
        "objectives": [{
            "id": "endpoint",
            "description": "Reach the endpoint",
            "validator": {"type": "indicator-color-change", "params": {"vessel": "flask", "color": "light pink"}},
            "points": 20
        }]
    }"#;

    #[test]
    fn test_parse_preset() {
        let preset = ExperimentPreset::from_json(TITRATION).unwrap();
        assert_eq!(preset.discipline, Discipline::Chemistry);
        assert_eq!(preset.bench.vessels.len(), 1);
        assert_eq!(preset.max_points(), 20);
        assert_eq!(preset.objectives[0].validator.kind, "indicator-color-change");
    }

    #[test]
    fn test_negative_moles_rejected() {
        let bad = TITRATION.replace("0.005", "-0.005");
        assert!(ExperimentPreset::from_json(&bad).is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            ExperimentPreset::from_json("{"),
            Err(SimulationError::SerializationError(_))
        ));
    }
}
