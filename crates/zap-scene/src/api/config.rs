use std::path::PathBuf;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::renderer::camera::ScaleMode;

/// Order in which the cache consults its registered bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LookupOrder {
    /// Oldest bundle first.
    #[default]
    RegistrationOrder,
    /// Newest bundle first, so later bundles shadow earlier ones.
    MostRecentFirst,
}

/// What a batch load does when an entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchPolicy {
    /// Stop at the first failing entry and return its error.
    #[default]
    AbortOnFirst,
    /// Try every entry and report all failures together.
    CollectAll,
}

/// Asset cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub lookup_order: LookupOrder,
    pub batch_policy: BatchPolicy,
}

/// Configuration for the engine, provided by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backbuffer size in pixels (default: 800x600).
    pub render_size: Vec2,
    /// Design resolution fitted into the render size. Zero disables fitting.
    pub target_content_size: Vec2,
    /// How the design resolution is fitted (default: NoScale).
    pub scale_mode: ScaleMode,
    /// Directory bundles read from (default: current directory).
    pub asset_root: PathBuf,
    /// Mipmap request for assets loaded without explicit options, including
    /// manifest entries of engine bundles that omit `mipmaps` (default: true).
    pub default_mipmaps: bool,
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_size: Vec2::new(800.0, 600.0),
            target_content_size: Vec2::ZERO,
            scale_mode: ScaleMode::NoScale,
            asset_root: PathBuf::from("."),
            default_mipmaps: true,
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON string. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_render_size(mut self, width: f32, height: f32) -> Self {
        self.render_size = Vec2::new(width, height);
        self
    }

    pub fn with_target_content(mut self, width: f32, height: f32, scale_mode: ScaleMode) -> Self {
        self.target_content_size = Vec2::new(width, height);
        self.scale_mode = scale_mode;
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_lookup_order(mut self, order: LookupOrder) -> Self {
        self.cache.lookup_order = order;
        self
    }

    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.cache.batch_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.render_size, Vec2::new(800.0, 600.0));
        assert_eq!(config.cache.lookup_order, LookupOrder::RegistrationOrder);
        assert_eq!(config.cache.batch_policy, BatchPolicy::AbortOnFirst);
        assert!(config.default_mipmaps);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "render_size": [1280.0, 720.0],
            "scale_mode": "ShowAll",
            "cache": { "lookup_order": "MostRecentFirst" }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.render_size, Vec2::new(1280.0, 720.0));
        assert_eq!(config.scale_mode, ScaleMode::ShowAll);
        assert_eq!(config.cache.lookup_order, LookupOrder::MostRecentFirst);
        assert_eq!(config.cache.batch_policy, BatchPolicy::AbortOnFirst);
        assert_eq!(config.asset_root, PathBuf::from("."));
    }

    #[test]
    fn builders_chain() {
        let config = EngineConfig::default()
            .with_render_size(320.0, 240.0)
            .with_batch_policy(BatchPolicy::CollectAll);
        assert_eq!(config.render_size.x, 320.0);
        assert_eq!(config.cache.batch_policy, BatchPolicy::CollectAll);
    }
}
