//! Reference generators and the startup registry.

pub mod addition;
pub mod fraction;

use std::sync::Arc;

pub use addition::AdditionGenerator;
pub use fraction::FractionOfQuantityGenerator;

use super::generator::{Generator, GeneratorRegistry};

type GeneratorFactory = fn() -> Arc<dyn Generator>;

fn new_addition() -> Arc<dyn Generator> {
    Arc::new(AdditionGenerator::default())
}

fn new_fraction_of_quantity() -> Arc<dyn Generator> {
    Arc::new(FractionOfQuantityGenerator)
}

const FACTORIES: &[GeneratorFactory] = &[new_addition, new_fraction_of_quantity];

/// Registry holding every built-in generator.
pub fn default_registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    for factory in FACTORIES {
        registry.register(factory());
    }
    tracing::debug!(generators = registry.len(), "generator registry built");
    registry
}
