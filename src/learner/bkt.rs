//! Bayesian Knowledge Tracing update.
//!
//! `update` is pure: it clones the learner, rewrites the one skill named by
//! the attempt and leaves every other entry as it was.

use serde::{Deserialize, Serialize};

use super::catalog::SkillCatalog;
use super::types::{Attempt, BktParams, LearnerState, SkillState, MAX_MASTERY, MIN_MASTERY};

/// Mastery above which a correct answer counts as a strong correct.
pub const STRONG_CORRECT_THRESHOLD: f64 = 0.8;
/// Value the correct-answer posterior is pinned to in [`CorrectPosterior::Pinned`] mode.
pub const PINNED_CORRECT_POSTERIOR: f64 = 0.99;
pub const STABILITY_GAIN: f64 = 1.0;
pub const STABILITY_LOSS: f64 = 0.5;

/// How the posterior is formed after a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectPosterior {
    /// Pre-transit mastery is set to 0.99 regardless of prior, slip or guess.
    #[default]
    Pinned,
    /// Textbook posterior `p(1-s) / (p(1-s) + (1-p)g)`.
    Bayesian,
}

impl CorrectPosterior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pinned => "pinned",
            Self::Bayesian => "bayesian",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pinned" => Some(Self::Pinned),
            "bayesian" => Some(Self::Bayesian),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BktConfig {
    pub correct_posterior: CorrectPosterior,
}

pub fn posterior_given_correct(p: f64, params: &BktParams) -> f64 {
    let evidence = p * (1.0 - params.slip);
    let denom = evidence + (1.0 - p) * params.guess;
    if denom <= 0.0 {
        return p;
    }
    evidence / denom
}

pub fn posterior_given_incorrect(p: f64, params: &BktParams) -> f64 {
    let evidence = p * params.slip;
    let denom = evidence + (1.0 - p) * (1.0 - params.guess);
    if denom <= 0.0 {
        return p;
    }
    evidence / denom
}

pub fn transit(posterior: f64, learning_rate: f64) -> f64 {
    posterior + (1.0 - posterior) * learning_rate
}

pub fn clamp_mastery(p: f64) -> f64 {
    p.max(MIN_MASTERY).min(MAX_MASTERY)
}

/// Applies one observation to a single skill state.
pub fn step(
    prior: &SkillState,
    is_correct: bool,
    params: &BktParams,
    config: &BktConfig,
) -> SkillState {
    let p = prior.mastery_prob;
    let mut stability = prior.stability;

    let posterior = if is_correct {
        match config.correct_posterior {
            CorrectPosterior::Pinned => PINNED_CORRECT_POSTERIOR,
            CorrectPosterior::Bayesian => posterior_given_correct(p, params),
        }
    } else {
        posterior_given_incorrect(p, params)
    };

    let mastery = clamp_mastery(transit(posterior, params.learning_rate));

    if is_correct {
        if mastery > STRONG_CORRECT_THRESHOLD {
            stability += STABILITY_GAIN;
        }
    } else {
        stability = (stability - STABILITY_LOSS).max(0.0);
    }

    SkillState {
        mastery_prob: mastery,
        stability,
        last_practiced: prior.last_practiced,
        misconceptions: prior.misconceptions.clone(),
    }
}

pub fn update(
    state: &LearnerState,
    attempt: &Attempt,
    catalog: &SkillCatalog,
    config: &BktConfig,
) -> LearnerState {
    let params = catalog.bkt_params(&attempt.skill_id);
    let prior = state.skill_state_or_default(&attempt.skill_id, attempt.timestamp);

    let mut next = step(&prior, attempt.is_correct, &params, config);
    next.last_practiced = attempt.timestamp;

    tracing::debug!(
        user_id = %state.user_id,
        skill_id = %attempt.skill_id,
        is_correct = attempt.is_correct,
        prior = prior.mastery_prob,
        posterior = next.mastery_prob,
        stability = next.stability,
        "bkt update"
    );

    let mut updated = state.clone();
    updated
        .skill_states
        .insert(attempt.skill_id.clone(), next);
    updated
}

/// Folds attempts in order, e.g. to rebuild a learner from an attempt log.
pub fn replay<'a, I>(
    state: &LearnerState,
    attempts: I,
    catalog: &SkillCatalog,
    config: &BktConfig,
) -> LearnerState
where
    I: IntoIterator<Item = &'a Attempt>,
{
    attempts
        .into_iter()
        .fold(state.clone(), |acc, attempt| update(&acc, attempt, catalog, config))
}
