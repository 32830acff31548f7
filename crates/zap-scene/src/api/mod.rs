pub mod config;
pub mod engine;
pub mod types;

pub use config::{BatchPolicy, CacheConfig, EngineConfig, LookupOrder};
pub use engine::Engine;
pub use types::{LayerId, NodeId, ParentRef};
