#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use mathpath_core::content::generators::AdditionGenerator;
use mathpath_core::content::{
    GenerateError, Generator, GeneratorRegistry, MathProblemItem, RemoteError, RemoteItemSource,
};
use mathpath_core::learner::{LearnerState, SkillState};
use mathpath_core::rng::UnitRng;

pub fn item_json(id: &str, skill_id: &str) -> Value {
    json!({
        "meta": { "id": id, "skill_id": skill_id, "verified": true, "status": "verified" },
        "problem_content": { "stem": format!("Banked problem {id}") },
        "answer_spec": { "answer_mode": "final_only", "input_type": "integer" },
        "solution_logic": {
            "final_answer_canonical": "42",
            "final_answer_type": "integer",
            "steps": [{ "step_index": 1, "explanation": "Compute." }]
        }
    })
}

/// Only the fields the structural check requires, with plain-string steps.
pub fn minimal_item_json(id: &str, skill_id: &str) -> Value {
    json!({
        "meta": { "id": id, "skill_id": skill_id },
        "problem_content": { "stem": "6 x 7?" },
        "answer_spec": {},
        "solution_logic": { "final_answer_canonical": "42", "steps": ["Multiply 6 by 7."] }
    })
}

pub fn skill_state(mastery: f64, stability: f64, hours_ago: i64, now: DateTime<Utc>) -> SkillState {
    SkillState {
        mastery_prob: mastery,
        stability,
        last_practiced: now - Duration::hours(hours_ago),
        misconceptions: Vec::new(),
    }
}

pub fn learner_with(entries: &[(&str, SkillState)]) -> LearnerState {
    let mut learner = LearnerState::new("learner-1");
    for (id, state) in entries {
        learner.skill_states.insert(id.to_string(), state.clone());
    }
    learner
}

/// Scripted remote reply.
#[derive(Clone)]
pub enum Reply {
    Items(Vec<Value>),
    Status(u16),
    Malformed,
}

impl Reply {
    fn resolve(&self) -> Result<Vec<Value>, RemoteError> {
        match self {
            Reply::Items(items) => Ok(items.clone()),
            Reply::Status(code) => Err(RemoteError::HttpStatus {
                status: reqwest::StatusCode::from_u16(*code).unwrap(),
                body: "mock failure".into(),
            }),
            Reply::Malformed => {
                Err(RemoteError::Json(serde_json::from_str::<Value>("{not json").unwrap_err()))
            }
        }
    }
}

pub struct MockRemote {
    bank: Reply,
    factory: Reply,
    pub bank_calls: AtomicUsize,
    pub factory_calls: AtomicUsize,
    pub factory_difficulties: Mutex<Vec<f64>>,
    pub bank_limits: Mutex<Vec<usize>>,
}

impl MockRemote {
    pub fn new(bank: Reply, factory: Reply) -> Arc<Self> {
        Arc::new(Self {
            bank,
            factory,
            bank_calls: AtomicUsize::new(0),
            factory_calls: AtomicUsize::new(0),
            factory_difficulties: Mutex::new(Vec::new()),
            bank_limits: Mutex::new(Vec::new()),
        })
    }

    pub fn bank_calls(&self) -> usize {
        self.bank_calls.load(Ordering::SeqCst)
    }

    pub fn factory_calls(&self) -> usize {
        self.factory_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteItemSource for MockRemote {
    async fn fetch_verified(&self, _skill_id: &str, limit: usize) -> Result<Vec<Value>, RemoteError> {
        self.bank_calls.fetch_add(1, Ordering::SeqCst);
        self.bank_limits.lock().unwrap().push(limit);
        self.bank.resolve()
    }

    async fn generate_on_demand(
        &self,
        _skill_id: &str,
        difficulty: f64,
    ) -> Result<Vec<Value>, RemoteError> {
        self.factory_calls.fetch_add(1, Ordering::SeqCst);
        self.factory_difficulties.lock().unwrap().push(difficulty);
        self.factory.resolve()
    }
}

/// Addition generator bound to an arbitrary skill id that counts its calls.
pub struct CountingGenerator {
    skill_id: String,
    inner: AdditionGenerator,
    pub calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn new(skill_id: &str) -> Arc<Self> {
        Arc::new(Self {
            skill_id: skill_id.to_string(),
            inner: AdditionGenerator::new(skill_id, 99),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for CountingGenerator {
    fn skill_id(&self) -> &str {
        &self.skill_id
    }

    fn generate(
        &self,
        difficulty: f64,
        rng: &mut dyn UnitRng,
    ) -> Result<MathProblemItem, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate(difficulty, rng)
    }
}

pub fn registry_of(generators: &[Arc<CountingGenerator>]) -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    for generator in generators {
        registry.register(generator.clone());
    }
    registry
}
