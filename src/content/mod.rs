pub mod engine;
pub mod generator;
pub mod generators;
pub mod item;
pub mod remote;
pub mod validation;

pub use engine::{EngineError, GenerationEngine};
pub use generator::{
    AsyncGenerator, AsyncItemProducer, GenerateError, Generator, GeneratorRegistry,
};
pub use item::MathProblemItem;
pub use remote::{HttpItemSource, RemoteError, RemoteItemSource};
pub use validation::{validate_item, ValidationError};
