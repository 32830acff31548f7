use std::rc::Rc;

use glam::Vec2;

use crate::api::config::EngineConfig;
use crate::api::types::LayerId;
use crate::assets::asset::LoadOptions;
use crate::assets::bundle::Bundle;
use crate::assets::cache::Cache;
use crate::assets::fs::{DiskFileSystem, FileSystem};
use crate::core::scene::Scene;
use crate::renderer::camera::Camera;
use crate::renderer::traits::Renderer;

/// Owns the configuration, the asset cache and the scene, and drives
/// one frame at a time against an injected renderer.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    cache: Cache,
    pub scene: Scene,
    frame_count: u64,
}

impl Engine {
    /// Engine with the built-in loaders registered.
    pub fn new(config: EngineConfig) -> Self {
        log::info!(
            "engine: render size {}x{}, assets at {}",
            config.render_size.x,
            config.render_size.y,
            config.asset_root.display()
        );
        Self {
            cache: Cache::with_default_loaders(config.cache),
            config,
            scene: Scene::new(),
            frame_count: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Load options for assets that do not specify their own.
    pub fn default_load_options(&self) -> LoadOptions {
        LoadOptions {
            mipmaps: self.config.default_mipmaps,
        }
    }

    /// Camera fitted to the configured render and content sizes.
    pub fn create_camera(&self) -> Camera {
        Camera::with_content(self.config.render_size, self.config.target_content_size, self.config.scale_mode)
    }

    /// New layer with a camera from [`Engine::create_camera`].
    pub fn add_layer(&mut self, order: i32) -> LayerId {
        let camera = self.create_camera();
        let id = self.scene.add_layer(order);
        if let Some(layer) = self.scene.layer_mut(id) {
            layer.camera = Some(camera);
        }
        id
    }

    /// Bundle reading from the configured asset root.
    pub fn bundle(&self) -> Bundle {
        self.bundle_with(Rc::new(DiskFileSystem::new(&self.config.asset_root)))
    }

    /// Bundle whose manifest loads fall back to [`Engine::default_load_options`].
    pub fn bundle_with(&self, fs: Rc<dyn FileSystem>) -> Bundle {
        Bundle::new(&self.cache, fs).with_default_options(self.default_load_options())
    }

    /// Propagate a new backbuffer size to every layer camera.
    pub fn resize(&mut self, render_size: Vec2) {
        self.config.render_size = render_size;
        let ids = self.scene.layers().to_vec();
        for id in ids {
            if let Some(camera) = self.scene.layer_mut(id).and_then(|l| l.camera.as_mut()) {
                camera.set_render_size(render_size);
            }
        }
    }

    /// Update then draw the scene.
    pub fn frame(&mut self, renderer: &mut dyn Renderer, delta: f32) {
        self.scene.update(delta);
        self.scene.draw(renderer, Some(&self.cache));
        self.frame_count += 1;
        log::trace!("frame {} done", self.frame_count);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
