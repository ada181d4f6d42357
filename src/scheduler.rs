//! Next-skill selection: spaced review, prerequisite-gated learning queue,
//! random fallback.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::content::{EngineError, GenerationEngine, MathProblemItem};
use crate::learner::{LearnerState, Skill, SkillCatalog, SkillState};
use crate::rng::{pick_index, UnitRng};

pub const MASTERY_THRESHOLD: f64 = 0.8;
pub const PREREQUISITE_THRESHOLD: f64 = 0.7;
pub const REVIEW_PROBABILITY: f64 = 0.3;
pub const BASE_REVIEW_INTERVAL_HOURS: f64 = 24.0;
pub const CHALLENGE_DIFFICULTY: f64 = 0.9;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("No skills available to recommend")]
    NoSkills,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionReason {
    Review,
    Learning,
    Fallback,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Learning => "learning",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub skill_id: String,
    pub difficulty: f64,
    pub reason: SelectionReason,
}

struct Candidate<'a> {
    skill: &'a Skill,
    state: SkillState,
}

/// Mastered and past its interval of `24h * (1 + stability)`. Strict on elapsed time.
pub fn is_review_due(state: &SkillState, now: DateTime<Utc>) -> bool {
    state.mastery_prob >= MASTERY_THRESHOLD
        && state.hours_since_practice(now) > BASE_REVIEW_INTERVAL_HOURS * (1.0 + state.stability)
}

/// Every prerequisite has a recorded state above 0.7. Missing states count as unmet.
pub fn prerequisites_met(skill: &Skill, learner: &LearnerState) -> bool {
    skill.prerequisites.iter().all(|prereq| {
        learner
            .mastery(prereq)
            .is_some_and(|mastery| mastery > PREREQUISITE_THRESHOLD)
    })
}

pub fn difficulty_for(mastery: f64) -> f64 {
    if mastery > MASTERY_THRESHOLD {
        CHALLENGE_DIFFICULTY
    } else {
        mastery
    }
}

/// Picks the skill to practise next. Does not touch the learner.
pub fn select_target(
    learner: &LearnerState,
    catalog: &SkillCatalog,
    rng: &mut dyn UnitRng,
    now: DateTime<Utc>,
) -> Result<Selection, SchedulerError> {
    if catalog.is_empty() {
        return Err(SchedulerError::NoSkills);
    }

    let candidates: Vec<Candidate<'_>> = catalog
        .iter()
        .map(|skill| Candidate {
            skill,
            state: learner.skill_state_or_default(&skill.id, now),
        })
        .collect();

    let review_due: Vec<&Candidate<'_>> = candidates
        .iter()
        .filter(|c| is_review_due(&c.state, now))
        .collect();

    let learning_queue: Vec<&Candidate<'_>> = candidates
        .iter()
        .filter(|c| c.state.mastery_prob < MASTERY_THRESHOLD && prerequisites_met(c.skill, learner))
        .collect();

    let roll = rng.next_unit();

    let (chosen, reason) = if !review_due.is_empty() && roll < REVIEW_PROBABILITY {
        (review_due[pick_index(rng, review_due.len())], SelectionReason::Review)
    } else if let Some(target) = weakest(&learning_queue) {
        (target, SelectionReason::Learning)
    } else {
        (&candidates[pick_index(rng, candidates.len())], SelectionReason::Fallback)
    };

    let selection = Selection {
        skill_id: chosen.skill.id.clone(),
        difficulty: difficulty_for(chosen.state.mastery_prob),
        reason,
    };

    tracing::debug!(
        user_id = %learner.user_id,
        skill_id = %selection.skill_id,
        difficulty = selection.difficulty,
        reason = selection.reason.as_str(),
        review_due = review_due.len(),
        learning_queue = learning_queue.len(),
        roll,
        "practice target selected"
    );

    Ok(selection)
}

/// Lowest mastery; the first encountered wins ties.
fn weakest<'a, 'b>(queue: &[&'a Candidate<'b>]) -> Option<&'a Candidate<'b>> {
    let mut best: Option<&'a Candidate<'b>> = None;
    for &candidate in queue {
        match best {
            Some(current) if candidate.state.mastery_prob >= current.state.mastery_prob => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Selects a target and materialises it through the engine.
#[derive(Debug, Clone)]
pub struct Recommender {
    engine: Arc<GenerationEngine>,
}

impl Recommender {
    pub fn new(engine: Arc<GenerationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<GenerationEngine> {
        &self.engine
    }

    pub async fn recommend(
        &self,
        learner: &LearnerState,
        rng: &mut dyn UnitRng,
        catalog: &SkillCatalog,
    ) -> Result<MathProblemItem, SchedulerError> {
        self.recommend_at(learner, rng, catalog, Utc::now()).await
    }

    pub async fn recommend_at(
        &self,
        learner: &LearnerState,
        rng: &mut dyn UnitRng,
        catalog: &SkillCatalog,
        now: DateTime<Utc>,
    ) -> Result<MathProblemItem, SchedulerError> {
        let selection = select_target(learner, catalog, rng, now)?;
        // The scheduler's rng is not forwarded; the engine draws its own.
        let item = self
            .engine
            .generate(&selection.skill_id, selection.difficulty, None)
            .await?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;
    use chrono::Duration;

    fn state(mastery: f64, stability: f64, hours_ago: i64, now: DateTime<Utc>) -> SkillState {
        SkillState {
            mastery_prob: mastery,
            stability,
            last_practiced: now - Duration::hours(hours_ago),
            misconceptions: Vec::new(),
        }
    }

    fn learner(entries: &[(&str, SkillState)]) -> LearnerState {
        let mut learner = LearnerState::new("u1");
        for (id, s) in entries {
            learner.skill_states.insert(id.to_string(), s.clone());
        }
        learner
    }

    #[test]
    fn empty_catalog_draws_nothing() {
        let mut rng = ScriptedRandom::new([0.1]);
        let err = select_target(&LearnerState::new("u1"), &SkillCatalog::default(), &mut rng, Utc::now())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoSkills));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn review_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!is_review_due(&state(0.9, 0.0, 24, now), now));
        assert!(is_review_due(&state(0.9, 0.0, 25, now), now));
        assert!(!is_review_due(&state(0.9, 1.0, 48, now), now));
        assert!(is_review_due(&state(0.8, 1.0, 49, now), now));
        assert!(!is_review_due(&state(0.79, 0.0, 100, now), now));
    }

    #[test]
    fn difficulty_is_raised_above_mastery() {
        assert_eq!(difficulty_for(0.2), 0.2);
        assert_eq!(difficulty_for(0.8), 0.8);
        assert_eq!(difficulty_for(0.81), CHALLENGE_DIFFICULTY);
    }

    #[test]
    fn learning_queue_ties_keep_catalog_order() {
        let now = Utc::now();
        let catalog = SkillCatalog::new(vec![
            Skill::new("b", "B"),
            Skill::new("a", "A"),
        ])
        .unwrap();
        let learner = learner(&[("a", state(0.3, 0.0, 1, now)), ("b", state(0.3, 0.0, 1, now))]);
        let mut rng = ScriptedRandom::new([0.9]);
        let selection = select_target(&learner, &catalog, &mut rng, now).unwrap();
        assert_eq!(selection.skill_id, "b");
        assert_eq!(selection.reason, SelectionReason::Learning);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn unseen_skill_defaults_to_initial_mastery() {
        let now = Utc::now();
        let catalog = SkillCatalog::new(vec![Skill::new("fresh", "Fresh")]).unwrap();
        let learner = LearnerState::new("u1");
        let mut rng = ScriptedRandom::new([0.5]);
        let selection = select_target(&learner, &catalog, &mut rng, now).unwrap();
        assert_eq!(selection.skill_id, "fresh");
        assert_eq!(selection.difficulty, 0.1);
        assert!(learner.skill_states.is_empty());
    }

    #[test]
    fn cycle_falls_through_to_random_pick() {
        let now = Utc::now();
        let catalog = SkillCatalog::new(vec![
            Skill::new("x", "X").with_prerequisites(["y"]),
            Skill::new("y", "Y").with_prerequisites(["x"]),
        ])
        .unwrap();
        let learner = learner(&[("x", state(0.2, 0.0, 1, now)), ("y", state(0.4, 0.0, 1, now))]);
        let mut rng = ScriptedRandom::new([0.9, 0.6]);
        let selection = select_target(&learner, &catalog, &mut rng, now).unwrap();
        assert_eq!(selection.reason, SelectionReason::Fallback);
        assert_eq!(selection.skill_id, "y");
        assert_eq!(selection.difficulty, 0.4);
    }
}
