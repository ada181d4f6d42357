//! Mastery tracking, practice scheduling and procedural item generation for
//! adaptive math practice.
//!
//! - [`learner`]: skill catalog, learner state and the BKT update
//! - [`scheduler`]: next-skill selection and the [`scheduler::Recommender`]
//! - [`content`]: item model, validation, generators and the generation engine
//! - [`rng`]: the injectable RNG every stochastic call takes

pub mod config;
pub mod content;
pub mod learner;
pub mod logging;
pub mod rng;
pub mod scheduler;

pub use content::{GenerationEngine, MathProblemItem};
pub use learner::{Attempt, LearnerState, Skill, SkillCatalog, SkillState};
pub use scheduler::{Recommender, SchedulerError, Selection};
