use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_MASTERY: f64 = 0.01;
pub const MAX_MASTERY: f64 = 0.99;
pub const INITIAL_MASTERY: f64 = 0.1;

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_SLIP: f64 = 0.1;
pub const DEFAULT_GUESS: f64 = 0.2;

/// Per-skill BKT overrides. Each field falls back to the crate default
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BktOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess: Option<f64>,
}

impl BktOverrides {
    /// Name of the first override outside `[0, 1]`, if any.
    pub fn out_of_range(&self) -> Option<&'static str> {
        [
            ("learningRate", self.learning_rate),
            ("slip", self.slip),
            ("guess", self.guess),
        ]
        .into_iter()
        .find(|(_, value)| value.is_some_and(|v| !(0.0..=1.0).contains(&v)))
        .map(|(field, _)| field)
    }
}

/// Resolved BKT parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BktParams {
    pub learning_rate: f64,
    pub slip: f64,
    pub guess: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            slip: DEFAULT_SLIP,
            guess: DEFAULT_GUESS,
        }
    }
}

impl BktParams {
    pub fn with_overrides(overrides: Option<&BktOverrides>) -> Self {
        let defaults = Self::default();
        match overrides {
            Some(o) => Self {
                learning_rate: o.learning_rate.unwrap_or(defaults.learning_rate),
                slip: o.slip.unwrap_or(defaults.slip),
                guess: o.guess.unwrap_or(defaults.guess),
            },
            None => defaults,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grade_band: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub misconceptions: Vec<String>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bkt_params: Option<BktOverrides>,
    #[serde(default)]
    pub standards: Vec<String>,
}

impl Skill {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade_band: String::new(),
            prerequisites: Vec::new(),
            misconceptions: Vec::new(),
            templates: Vec::new(),
            bkt_params: None,
            standards: Vec::new(),
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bkt(mut self, overrides: BktOverrides) -> Self {
        self.bkt_params = Some(overrides);
        self
    }

    pub fn bkt(&self) -> BktParams {
        BktParams::with_overrides(self.bkt_params.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillState {
    pub mastery_prob: f64,
    pub stability: f64,
    pub last_practiced: DateTime<Utc>,
    #[serde(default)]
    pub misconceptions: Vec<String>,
}

impl SkillState {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            mastery_prob: INITIAL_MASTERY,
            stability: 0.0,
            last_practiced: now,
            misconceptions: Vec::new(),
        }
    }

    /// Hours since the last attempt, negative if `last_practiced` lies in the future.
    pub fn hours_since_practice(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_practiced).num_milliseconds() as f64 / 3_600_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerState {
    pub user_id: String,
    #[serde(default)]
    pub skill_states: HashMap<String, SkillState>,
}

impl LearnerState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            skill_states: HashMap::new(),
        }
    }

    /// One fresh state per catalog skill.
    pub fn initialize(
        user_id: impl Into<String>,
        catalog: &super::SkillCatalog,
        now: DateTime<Utc>,
    ) -> Self {
        let skill_states = catalog
            .iter()
            .map(|skill| (skill.id.clone(), SkillState::fresh(now)))
            .collect();
        Self {
            user_id: user_id.into(),
            skill_states,
        }
    }

    pub fn skill_state(&self, skill_id: &str) -> Option<&SkillState> {
        self.skill_states.get(skill_id)
    }

    /// Recorded state or a fresh default; never inserts.
    pub fn skill_state_or_default(&self, skill_id: &str, now: DateTime<Utc>) -> SkillState {
        self.skill_states
            .get(skill_id)
            .cloned()
            .unwrap_or_else(|| SkillState::fresh(now))
    }

    pub fn mastery(&self, skill_id: &str) -> Option<f64> {
        self.skill_states.get(skill_id).map(|s| s.mastery_prob)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub skill_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_correct: bool,
    #[serde(default)]
    pub time_taken_ms: i64,
    #[serde(default = "default_attempt_count")]
    pub attempt_count: u32,
    #[serde(default)]
    pub hint_count: u32,
    #[serde(default)]
    pub error_tags: Vec<String>,
}

fn default_attempt_count() -> u32 {
    1
}

impl Attempt {
    pub fn new(
        user_id: impl Into<String>,
        skill_id: impl Into<String>,
        is_correct: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            item_id: String::new(),
            skill_id: skill_id.into(),
            timestamp,
            is_correct,
            time_taken_ms: 0,
            attempt_count: 1,
            hint_count: 0,
            error_tags: Vec::new(),
        }
    }

    pub fn for_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = item_id.into();
        self
    }
}
