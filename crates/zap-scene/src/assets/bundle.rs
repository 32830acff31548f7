//! Bundle: a named set of loaded resources with one lifetime.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec2;

use super::asset::{Asset, AssetKind, LoadOptions};
use super::cache::Cache;
use super::fs::FileSystem;
use super::loader::LoadContext;
use super::manifest::BundleManifest;
use crate::api::config::BatchPolicy;
use crate::error::{LoadError, Result};
use crate::renderer::traits::Renderer;
use crate::resources::{
    Cue, Font, Material, ParticleSystemData, Shader, SkinnedMeshData, Sound, SpriteData,
    StaticMeshData, Texture,
};

/// File extensions `preload_sprite_data` treats as plain images.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tga"];

/// Per-kind resource maps owned by one bundle.
#[derive(Debug, Default)]
pub struct BundleResources {
    pub(crate) textures: HashMap<String, Arc<Texture>>,
    pub(crate) shaders: HashMap<String, Shader>,
    pub(crate) materials: HashMap<String, Material>,
    pub(crate) fonts: HashMap<String, Font>,
    pub(crate) sounds: HashMap<String, Sound>,
    pub(crate) cues: HashMap<String, Cue>,
    pub(crate) sprite_data: HashMap<String, SpriteData>,
    pub(crate) particle_system_data: HashMap<String, ParticleSystemData>,
    pub(crate) static_mesh_data: HashMap<String, StaticMeshData>,
    pub(crate) skinned_mesh_data: HashMap<String, SkinnedMeshData>,
}

/// Loads assets through the cache's loaders and owns the results.
///
/// Registers with its cache on creation and deregisters on drop, so
/// everything it loaded disappears from cache lookups together.
pub struct Bundle {
    resources: Rc<RefCell<BundleResources>>,
    cache: Cache,
    fs: Rc<dyn FileSystem>,
    default_options: LoadOptions,
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

impl Drop for Bundle {
    fn drop(&mut self) {
        self.cache.unregister_bundle(&self.resources);
    }
}

impl Bundle {
    pub fn new(cache: &Cache, fs: Rc<dyn FileSystem>) -> Self {
        let resources = Rc::new(RefCell::new(BundleResources::default()));
        cache.register_bundle(&resources);
        Self {
            resources,
            cache: cache.clone(),
            fs,
            default_options: LoadOptions::default(),
        }
    }

    /// Options for manifest entries that leave them unset.
    pub fn with_default_options(mut self, options: LoadOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn default_options(&self) -> LoadOptions {
        self.default_options
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn file_system(&self) -> &Rc<dyn FileSystem> {
        &self.fs
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Read `filename` and decode it with the most recent loader for `kind`
    /// that accepts its contents.
    pub fn load_asset(
        &self,
        renderer: &mut dyn Renderer,
        kind: AssetKind,
        name: &str,
        filename: &str,
        options: LoadOptions,
    ) -> Result<()> {
        let data = self.fs.read_file(filename).map_err(|source| LoadError::Io {
            filename: filename.to_string(),
            source,
        })?;

        let loader = self.cache.loader_for_data(kind, &data).ok_or_else(|| LoadError::NoLoader {
            kind,
            filename: filename.to_string(),
        })?;

        let mut ctx = LoadContext {
            cache: &self.cache,
            bundle: self,
            renderer,
            filename,
        };
        loader
            .load(&mut ctx, name, &data, options)
            .map_err(|source| LoadError::Asset {
                filename: filename.to_string(),
                source: Box::new(source),
            })?;

        log::info!("Loaded {:?} {} from {}", kind, name, filename);
        Ok(())
    }

    /// Load a list of assets, honoring the cache's batch policy.
    pub fn load_assets(&self, renderer: &mut dyn Renderer, assets: &[Asset]) -> Result<()> {
        let policy = self.cache.config().batch_policy;
        let mut errors = Vec::new();

        for asset in assets {
            if let Err(err) = self.load_asset(renderer, asset.kind, &asset.name, &asset.filename, asset.options) {
                match policy {
                    BatchPolicy::AbortOnFirst => return Err(err),
                    BatchPolicy::CollectAll => {
                        log::warn!("Failed to load {}: {}", asset.filename, err);
                        errors.push(err);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoadError::Batch(errors))
        }
    }

    /// Load every asset listed in the JSON manifest `filename`.
    pub fn load_manifest(&self, renderer: &mut dyn Renderer, filename: &str) -> Result<()> {
        let data = self.fs.read_file(filename).map_err(|source| LoadError::Io {
            filename: filename.to_string(),
            source,
        })?;
        let manifest = BundleManifest::from_slice(&data)?;
        let assets = manifest.to_assets(self.default_options)?;
        log::info!("Manifest {} lists {} assets", filename, assets.len());
        self.load_assets(renderer, &assets)
    }

    /// Register sprite data for `filename`.
    ///
    /// Image files are cut into a `sprites_x` by `sprites_y` grid (loading
    /// the image first if no bundle has it); anything else is read as a
    /// sprite sheet.
    pub fn preload_sprite_data(
        &self,
        renderer: &mut dyn Renderer,
        filename: &str,
        mipmaps: bool,
        sprites_x: u32,
        sprites_y: u32,
        pivot: Vec2,
    ) -> Result<()> {
        let options = LoadOptions { mipmaps };
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            let texture = match self.cache.texture(filename) {
                Some(texture) => texture,
                None => {
                    self.load_asset(renderer, AssetKind::Image, filename, filename, options)?;
                    self.cache
                        .texture(filename)
                        .ok_or_else(|| LoadError::MissingTexture(filename.to_string()))?
                }
            };
            self.set_sprite_data(filename, SpriteData::from_grid(texture, sprites_x, sprites_y, pivot));
            Ok(())
        } else {
            self.load_asset(renderer, AssetKind::Sprite, filename, filename, options)
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.resources.borrow().textures.get(name).cloned()
    }

    pub fn set_texture(&self, name: impl Into<String>, texture: Arc<Texture>) {
        self.resources.borrow_mut().textures.insert(name.into(), texture);
    }

    pub fn shader(&self, name: &str) -> Option<Ref<'_, Shader>> {
        Ref::filter_map(self.resources.borrow(), |r| r.shaders.get(name)).ok()
    }

    pub fn set_shader(&self, name: impl Into<String>, shader: Shader) {
        self.resources.borrow_mut().shaders.insert(name.into(), shader);
    }

    pub fn material(&self, name: &str) -> Option<Ref<'_, Material>> {
        Ref::filter_map(self.resources.borrow(), |r| r.materials.get(name)).ok()
    }

    pub fn set_material(&self, name: impl Into<String>, material: Material) {
        self.resources.borrow_mut().materials.insert(name.into(), material);
    }

    pub fn font(&self, name: &str) -> Option<Ref<'_, Font>> {
        Ref::filter_map(self.resources.borrow(), |r| r.fonts.get(name)).ok()
    }

    pub fn set_font(&self, name: impl Into<String>, font: Font) {
        self.resources.borrow_mut().fonts.insert(name.into(), font);
    }

    pub fn sound(&self, name: &str) -> Option<Ref<'_, Sound>> {
        Ref::filter_map(self.resources.borrow(), |r| r.sounds.get(name)).ok()
    }

    pub fn set_sound(&self, name: impl Into<String>, sound: Sound) {
        self.resources.borrow_mut().sounds.insert(name.into(), sound);
    }

    pub fn cue(&self, name: &str) -> Option<Ref<'_, Cue>> {
        Ref::filter_map(self.resources.borrow(), |r| r.cues.get(name)).ok()
    }

    pub fn set_cue(&self, name: impl Into<String>, cue: Cue) {
        self.resources.borrow_mut().cues.insert(name.into(), cue);
    }

    pub fn sprite_data(&self, name: &str) -> Option<SpriteData> {
        self.resources.borrow().sprite_data.get(name).cloned()
    }

    pub fn set_sprite_data(&self, name: impl Into<String>, data: SpriteData) {
        self.resources.borrow_mut().sprite_data.insert(name.into(), data);
    }

    pub fn particle_system_data(&self, name: &str) -> Option<ParticleSystemData> {
        self.resources.borrow().particle_system_data.get(name).cloned()
    }

    pub fn set_particle_system_data(&self, name: impl Into<String>, data: ParticleSystemData) {
        self.resources
            .borrow_mut()
            .particle_system_data
            .insert(name.into(), data);
    }

    pub fn static_mesh_data(&self, name: &str) -> Option<StaticMeshData> {
        self.resources.borrow().static_mesh_data.get(name).cloned()
    }

    pub fn set_static_mesh_data(&self, name: impl Into<String>, data: StaticMeshData) {
        self.resources
            .borrow_mut()
            .static_mesh_data
            .insert(name.into(), data);
    }

    pub fn skinned_mesh_data(&self, name: &str) -> Option<SkinnedMeshData> {
        self.resources.borrow().skinned_mesh_data.get(name).cloned()
    }

    pub fn set_skinned_mesh_data(&self, name: impl Into<String>, data: SkinnedMeshData) {
        self.resources
            .borrow_mut()
            .skinned_mesh_data
            .insert(name.into(), data);
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Drop this bundle's texture references. Textures still held by
    /// drawables stay alive until those let go.
    pub fn release_textures(&self) {
        self.resources.borrow_mut().textures.clear();
    }

    pub fn release_shaders(&self) {
        self.resources.borrow_mut().shaders.clear();
    }

    pub fn release_materials(&self) {
        self.resources.borrow_mut().materials.clear();
    }

    pub fn release_fonts(&self) {
        self.resources.borrow_mut().fonts.clear();
    }

    pub fn release_sounds(&self) {
        self.resources.borrow_mut().sounds.clear();
    }

    pub fn release_cues(&self) {
        self.resources.borrow_mut().cues.clear();
    }

    pub fn release_sprite_data(&self) {
        self.resources.borrow_mut().sprite_data.clear();
    }

    pub fn release_particle_system_data(&self) {
        self.resources.borrow_mut().particle_system_data.clear();
    }

    pub fn release_static_mesh_data(&self) {
        self.resources.borrow_mut().static_mesh_data.clear();
    }

    pub fn release_skinned_mesh_data(&self) {
        self.resources.borrow_mut().skinned_mesh_data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::CacheConfig;
    use crate::assets::fs::MemoryFileSystem;
    use crate::assets::loader::Loader;
    use crate::renderer::headless::HeadlessRenderer;

    /// Stores the file length as a one-channel sound; rejects empty files.
    struct LengthLoader;

    impl Loader for LengthLoader {
        fn kind(&self) -> AssetKind {
            AssetKind::Sound
        }

        fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], _: LoadOptions) -> Result<()> {
            if data.is_empty() {
                return Err(LoadError::MissingField("data"));
            }
            ctx.bundle.set_sound(
                name,
                Sound {
                    sample_rate: data.len() as u32,
                    channels: 1,
                    samples: vec![Vec::new()],
                },
            );
            Ok(())
        }
    }

    fn setup(policy: BatchPolicy) -> (Cache, Bundle) {
        let cache = Cache::new(CacheConfig {
            batch_policy: policy,
            ..Default::default()
        });
        cache.add_loader(Rc::new(LengthLoader));
        let fs = MemoryFileSystem::new()
            .with_file("a.snd", vec![1u8, 2, 3])
            .with_file("empty.snd", Vec::<u8>::new());
        let bundle = Bundle::new(&cache, Rc::new(fs));
        (cache, bundle)
    }

    #[test]
    fn load_asset_registers_result() {
        let (cache, bundle) = setup(BatchPolicy::AbortOnFirst);
        let mut renderer = HeadlessRenderer::new();
        bundle
            .load_asset(&mut renderer, AssetKind::Sound, "a", "a.snd", LoadOptions::default())
            .unwrap();
        assert_eq!(bundle.sound("a").unwrap().sample_rate, 3);
        assert_eq!(cache.with_sound("a", |s| s.sample_rate), Some(3));
    }

    #[test]
    fn missing_file_is_io_error() {
        let (_cache, bundle) = setup(BatchPolicy::AbortOnFirst);
        let mut renderer = HeadlessRenderer::new();
        let err = bundle
            .load_asset(&mut renderer, AssetKind::Sound, "x", "x.snd", LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn missing_loader_is_reported() {
        let (_cache, bundle) = setup(BatchPolicy::AbortOnFirst);
        let mut renderer = HeadlessRenderer::new();
        let err = bundle
            .load_asset(&mut renderer, AssetKind::Cue, "a", "a.snd", LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::NoLoader { kind: AssetKind::Cue, .. }));
    }

    #[test]
    fn loader_failure_is_wrapped() {
        let (_cache, bundle) = setup(BatchPolicy::AbortOnFirst);
        let mut renderer = HeadlessRenderer::new();
        let err = bundle
            .load_asset(&mut renderer, AssetKind::Sound, "e", "empty.snd", LoadOptions::default())
            .unwrap_err();
        match err {
            LoadError::Asset { filename, source } => {
                assert_eq!(filename, "empty.snd");
                assert!(matches!(*source, LoadError::MissingField("data")));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(bundle.sound("e").is_none());
    }

    #[test]
    fn abort_on_first_stops_batch() {
        let (_cache, bundle) = setup(BatchPolicy::AbortOnFirst);
        let mut renderer = HeadlessRenderer::new();
        let assets = [
            Asset::new(AssetKind::Sound, "empty.snd"),
            Asset::new(AssetKind::Sound, "a.snd"),
        ];
        assert!(matches!(
            bundle.load_assets(&mut renderer, &assets),
            Err(LoadError::Asset { .. })
        ));
        assert!(bundle.sound("a.snd").is_none());
    }

    #[test]
    fn collect_all_keeps_going() {
        let (_cache, bundle) = setup(BatchPolicy::CollectAll);
        let mut renderer = HeadlessRenderer::new();
        let assets = [
            Asset::new(AssetKind::Sound, "empty.snd"),
            Asset::new(AssetKind::Sound, "missing.snd"),
            Asset::new(AssetKind::Sound, "a.snd"),
        ];
        match bundle.load_assets(&mut renderer, &assets) {
            Err(LoadError::Batch(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected result {other:?}"),
        }
        assert!(bundle.sound("a.snd").is_some());
    }

    #[test]
    fn release_clears_one_kind() {
        let (_cache, bundle) = setup(BatchPolicy::AbortOnFirst);
        let mut renderer = HeadlessRenderer::new();
        bundle
            .load_asset(&mut renderer, AssetKind::Sound, "a", "a.snd", LoadOptions::default())
            .unwrap();
        bundle.set_cue("c", Cue::default());
        bundle.release_sounds();
        assert!(bundle.sound("a").is_none());
        assert!(bundle.cue("c").is_some());
    }

    #[test]
    fn manifest_with_unknown_kind_fails() {
        let cache = Cache::default();
        let fs = MemoryFileSystem::new().with_file(
            "bundle.json",
            r#"{ "assets": [ { "filename": "a.snd", "type": 99 } ] }"#,
        );
        let bundle = Bundle::new(&cache, Rc::new(fs));
        let mut renderer = HeadlessRenderer::new();
        assert!(matches!(
            bundle.load_manifest(&mut renderer, "bundle.json"),
            Err(LoadError::UnknownAssetKind(99))
        ));
    }
}
