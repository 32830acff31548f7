pub mod api;
pub mod assets;
pub mod components;
pub mod core;
pub mod error;
pub mod renderer;
pub mod resources;

// Re-export key types at crate root for convenience
pub use api::config::{BatchPolicy, CacheConfig, EngineConfig, LookupOrder};
pub use api::engine::Engine;
pub use api::types::{LayerId, NodeId, ParentRef};
pub use assets::{Asset, AssetKind, Bundle, Cache, FileSystem, LoadOptions, Loader};
pub use components::{
    Animator, DrawContext, Drawable, Easing, Node, ShapeRenderer, Sprite, StaticMeshRenderer,
    TextRenderer, Tween,
};
pub use core::{Aabb, Color, Layer, NodeGraph, Rect, Scene};
pub use error::{LoadError, Result, TextError, WavError};
pub use renderer::{Camera, HeadlessRenderer, Renderer, ScaleMode, Vertex};

/// Route `log` output to the test harness; safe to call from every test.
#[cfg(test)]
pub(crate) fn test_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}
