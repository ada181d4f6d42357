use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::generator::{GenerateError, Generator, GeneratorRegistry};
use super::item::MathProblemItem;
use super::remote::{HttpItemSource, RemoteError, RemoteItemSource};
use super::validation::{validate_item, ValidationError};
use crate::config::EngineConfig;
use crate::rng::{ThreadRandom, UnitRng};

const BANK_LIMIT: usize = 1;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No generator found for skill: {0}")]
    NoGenerator(String),
    #[error("local generator produced an invalid item: {0}")]
    InvalidLocalItem(#[from] ValidationError),
    #[error("local generation failed: {0}")]
    Generate(#[from] GenerateError),
}

/// Why the remote path yielded nothing usable. Never surfaced; logged before
/// falling back to the local generator.
#[derive(Debug, Error)]
enum RemoteMiss {
    #[error("bank lookup failed: {0}")]
    Bank(RemoteError),
    #[error("on-demand generation failed: {0}")]
    Factory(RemoteError),
    #[error("on-demand generation returned no items")]
    FactoryEmpty,
    #[error("{stage} item rejected: {source}")]
    Invalid {
        stage: &'static str,
        source: ValidationError,
    },
    #[error("{stage} item could not be decoded: {source}")]
    Decode {
        stage: &'static str,
        source: serde_json::Error,
    },
}

/// Resolves a skill id to a practice item: verified bank item, then remote
/// on-demand generation, then the local generator.
#[derive(Clone)]
pub struct GenerationEngine {
    registry: GeneratorRegistry,
    remote: Option<Arc<dyn RemoteItemSource>>,
}

impl GenerationEngine {
    /// Local-only engine.
    pub fn new(registry: GeneratorRegistry) -> Self {
        Self {
            registry,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteItemSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Wires the HTTP bank only when a base URL is configured.
    pub fn from_config(config: &EngineConfig, registry: GeneratorRegistry) -> Self {
        let engine = Self::new(registry);
        match config.api_base_url.as_deref() {
            Some(base_url) => {
                tracing::info!(%base_url, "remote problem bank enabled");
                engine.with_remote(Arc::new(HttpItemSource::new(
                    base_url,
                    config.request_timeout,
                )))
            }
            None => {
                tracing::info!("remote problem bank not configured, local generation only");
                engine
            }
        }
    }

    pub fn register(&mut self, generator: Arc<dyn Generator>) {
        self.registry.register(generator);
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn generate(
        &self,
        skill_id: &str,
        difficulty: f64,
        rng: Option<&mut dyn UnitRng>,
    ) -> Result<MathProblemItem, EngineError> {
        if let Some(remote) = &self.remote {
            match Self::resolve_remote(remote.as_ref(), skill_id, difficulty).await {
                Ok(item) => return Ok(item),
                Err(miss) => {
                    warn!(skill_id, reason = %miss, "remote item unavailable, using local generator");
                }
            }
        }

        match rng {
            Some(rng) => self.generate_local(skill_id, difficulty, rng),
            None => self.generate_local(skill_id, difficulty, &mut ThreadRandom),
        }
    }

    /// Local generator only. Its output is validated; failure is final.
    pub fn generate_local(
        &self,
        skill_id: &str,
        difficulty: f64,
        rng: &mut dyn UnitRng,
    ) -> Result<MathProblemItem, EngineError> {
        let generator = self
            .registry
            .get(skill_id)
            .ok_or_else(|| EngineError::NoGenerator(skill_id.to_string()))?;

        let item = generator.generate(difficulty, rng)?;
        item.validate()?;

        debug!(skill_id, item_id = %item.meta.id, difficulty, "item generated locally");
        Ok(item)
    }

    async fn resolve_remote(
        remote: &dyn RemoteItemSource,
        skill_id: &str,
        difficulty: f64,
    ) -> Result<MathProblemItem, RemoteMiss> {
        let banked = remote
            .fetch_verified(skill_id, BANK_LIMIT)
            .await
            .map_err(RemoteMiss::Bank)?;

        if let Some(raw) = banked.into_iter().next() {
            let item = accept(raw, "bank")?;
            debug!(skill_id, item_id = %item.meta.id, "serving verified bank item");
            return Ok(item);
        }

        let generated = remote
            .generate_on_demand(skill_id, difficulty)
            .await
            .map_err(RemoteMiss::Factory)?;

        let raw = generated.into_iter().next().ok_or(RemoteMiss::FactoryEmpty)?;
        let item = accept(raw, "factory")?;
        debug!(skill_id, item_id = %item.meta.id, "serving on-demand item");
        Ok(item)
    }
}

impl std::fmt::Debug for GenerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationEngine")
            .field("registry", &self.registry)
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

fn accept(raw: Value, stage: &'static str) -> Result<MathProblemItem, RemoteMiss> {
    validate_item(&raw).map_err(|source| RemoteMiss::Invalid { stage, source })?;
    serde_json::from_value(raw).map_err(|source| RemoteMiss::Decode { stage, source })
}
