use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::validation::{validate_item, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Draft,
    Verified,
    Retired,
}

// Remote items are trusted once `validate_item` passes, so only the fields it
// checks are decoded strictly. Everything else decodes to its default when the
// payload uses another shape.

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_version<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|_| default_version()))
}

/// Bare strings become the step's explanation; objects decode field by field.
fn lenient_steps<'de, D>(deserializer: D) -> Result<Vec<SolutionStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let step_index = i as u32 + 1;
            match value {
                Value::Object(_) => {
                    let mut step: SolutionStep = serde_json::from_value(value).unwrap_or_default();
                    if step.step_index == 0 {
                        step.step_index = step_index;
                    }
                    step
                }
                Value::String(explanation) => SolutionStep {
                    step_index,
                    explanation,
                    ..SolutionStep::default()
                },
                other => SolutionStep {
                    step_index,
                    explanation: other.to_string(),
                    ..SolutionStep::default()
                },
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMeta {
    pub id: String,
    #[serde(default = "default_version", deserialize_with = "lenient_version")]
    pub version: u32,
    pub skill_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub difficulty: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub verified: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub status: ItemStatus,
    /// Fields this crate does not model, kept so a served item round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemContent {
    pub stem: String,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub variables: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolutionStep {
    #[serde(default, deserialize_with = "lenient")]
    pub step_index: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub explanation: String,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub math: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionLogic {
    pub final_answer_canonical: String,
    #[serde(default, deserialize_with = "lenient")]
    pub final_answer_type: String,
    #[serde(deserialize_with = "lenient_steps")]
    pub steps: Vec<SolutionStep>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemMisconception {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub trigger: String,
    #[serde(default, deserialize_with = "lenient")]
    pub hint: String,
}

/// A generated practice item. `answer_spec` is kept opaque; only its
/// presence as an object is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathProblemItem {
    pub meta: ItemMeta,
    pub problem_content: ProblemContent,
    pub answer_spec: Value,
    pub solution_logic: SolutionLogic,
    #[serde(default, deserialize_with = "lenient")]
    pub misconceptions: Vec<ItemMisconception>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MathProblemItem {
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn skill_id(&self) -> &str {
        &self.meta.skill_id
    }

    /// Runs the structural check against this item's JSON form.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).map_err(|_| ValidationError::NotAnObject)?;
        validate_item(&value)
    }
}
