use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::item::MathProblemItem;
use crate::rng::{ThreadRandom, UnitRng};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    #[error("difficulty out of range [0, 1]: {0}")]
    InvalidDifficulty(f64),
    #[error("template failed: {0}")]
    Template(String),
}

/// Procedural producer of items for exactly one skill.
///
/// Implementations must be pure given `(difficulty, rng)`: no hidden state
/// and no I/O.
pub trait Generator: Send + Sync {
    fn skill_id(&self) -> &str;

    fn generate(
        &self,
        difficulty: f64,
        rng: &mut dyn UnitRng,
    ) -> Result<MathProblemItem, GenerateError>;
}

pub fn check_difficulty(difficulty: f64) -> Result<f64, GenerateError> {
    if (0.0..=1.0).contains(&difficulty) {
        Ok(difficulty)
    } else {
        Err(GenerateError::InvalidDifficulty(difficulty))
    }
}

/// Flat dispatch table from skill id to generator.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering a skill id replaces the previous generator.
    pub fn register(&mut self, generator: Arc<dyn Generator>) {
        let skill_id = generator.skill_id().to_string();
        if self.generators.insert(skill_id.clone(), generator).is_some() {
            tracing::debug!(skill_id = %skill_id, "generator replaced");
        }
    }

    pub fn with(mut self, generator: Arc<dyn Generator>) -> Self {
        self.register(generator);
        self
    }

    pub fn get(&self, skill_id: &str) -> Option<Arc<dyn Generator>> {
        self.generators.get(skill_id).cloned()
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.generators.contains_key(skill_id)
    }

    pub fn skill_ids(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.skill_ids().collect();
        ids.sort_unstable();
        f.debug_struct("GeneratorRegistry").field("skills", &ids).finish()
    }
}

/// Asynchronous item producer, the shape remote sources are consumed through.
#[async_trait]
pub trait AsyncItemProducer: Send + Sync {
    fn skill_id(&self) -> &str;

    async fn produce(&self, difficulty: f64) -> Result<MathProblemItem, GenerateError>;
}

/// Lifts a synchronous [`Generator`] into [`AsyncItemProducer`].
///
/// Draws from [`ThreadRandom`]; callers that need a scripted RNG call the
/// wrapped generator directly.
#[derive(Clone)]
pub struct AsyncGenerator {
    inner: Arc<dyn Generator>,
}

impl AsyncGenerator {
    pub fn new(inner: Arc<dyn Generator>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn Generator> {
        &self.inner
    }
}

#[async_trait]
impl AsyncItemProducer for AsyncGenerator {
    fn skill_id(&self) -> &str {
        self.inner.skill_id()
    }

    async fn produce(&self, difficulty: f64) -> Result<MathProblemItem, GenerateError> {
        let mut rng = ThreadRandom;
        self.inner.generate(difficulty, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::generators::AdditionGenerator;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Records the difficulty it was called with, fails above 0.5.
    struct Recording {
        seen: AtomicU64,
    }

    impl Generator for Recording {
        fn skill_id(&self) -> &str {
            "rec"
        }

        fn generate(
            &self,
            difficulty: f64,
            rng: &mut dyn UnitRng,
        ) -> Result<MathProblemItem, GenerateError> {
            self.seen.store(difficulty.to_bits(), Ordering::SeqCst);
            if difficulty > 0.5 {
                return Err(GenerateError::Template("too hard".into()));
            }
            AdditionGenerator::default().generate(difficulty, rng)
        }
    }

    #[test]
    fn register_overwrites_same_skill() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Arc::new(AdditionGenerator::new("add", 10)));
        registry.register(Arc::new(AdditionGenerator::new("add", 1000)));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("add"));
    }

    #[test]
    fn check_difficulty_bounds() {
        assert!(check_difficulty(0.0).is_ok());
        assert!(check_difficulty(1.0).is_ok());
        assert_eq!(
            check_difficulty(1.5),
            Err(GenerateError::InvalidDifficulty(1.5))
        );
        assert!(check_difficulty(f64::NAN).is_err());
    }

    #[tokio::test]
    async fn async_adapter_passes_difficulty_and_errors() {
        let gen = Arc::new(Recording {
            seen: AtomicU64::new(0),
        });
        let adapter = AsyncGenerator::new(gen.clone());
        assert_eq!(adapter.skill_id(), "rec");

        adapter.produce(0.25).await.unwrap();
        assert_eq!(f64::from_bits(gen.seen.load(Ordering::SeqCst)), 0.25);

        let err = adapter.produce(0.75).await.unwrap_err();
        assert_eq!(err, GenerateError::Template("too hard".into()));
        assert_eq!(f64::from_bits(gen.seen.load(Ordering::SeqCst)), 0.75);
    }
}
