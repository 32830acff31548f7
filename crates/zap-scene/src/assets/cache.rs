//! Registry of loaders and bundles with fallback lookup.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use super::asset::AssetKind;
use super::bundle::BundleResources;
use super::loader::Loader;
use crate::api::config::{CacheConfig, LookupOrder};
use crate::resources::{
    Cue, Font, Material, ParticleSystemData, Shader, SkinnedMeshData, Sound, SpriteData,
    StaticMeshData, Texture,
};

#[derive(Default)]
struct CacheState {
    config: Cell<CacheConfig>,
    loaders: RefCell<Vec<Rc<dyn Loader>>>,
    bundles: RefCell<Vec<Weak<RefCell<BundleResources>>>>,
}

/// Shared handle onto the loader list and the registered bundles.
///
/// Cloning is cheap; clones see the same state. The cache never owns a
/// bundle's resources: a dropped bundle simply stops answering lookups.
#[derive(Clone, Default)]
pub struct Cache {
    state: Rc<CacheState>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.state.config.get())
            .field("loaders", &self.state.loaders.borrow().len())
            .field("bundles", &self.bundle_count())
            .finish()
    }
}

impl Cache {
    /// Empty cache with no loaders.
    pub fn new(config: CacheConfig) -> Self {
        let cache = Self::default();
        cache.state.config.set(config);
        cache
    }

    /// Cache with one loader per supported format.
    pub fn with_default_loaders(config: CacheConfig) -> Self {
        let cache = Self::new(config);
        for loader in super::loaders::default_loaders() {
            cache.add_loader(loader);
        }
        cache
    }

    pub fn config(&self) -> CacheConfig {
        self.state.config.get()
    }

    pub fn set_config(&self, config: CacheConfig) {
        self.state.config.set(config);
    }

    // ========================================================================
    // Loaders
    // ========================================================================

    /// Register a loader. Later loaders take precedence for their kind.
    /// Returns false if this exact loader is already registered.
    pub fn add_loader(&self, loader: Rc<dyn Loader>) -> bool {
        let mut loaders = self.state.loaders.borrow_mut();
        if loaders.iter().any(|l| same_loader(l, &loader)) {
            return false;
        }
        loaders.push(loader);
        true
    }

    pub fn remove_loader(&self, loader: &Rc<dyn Loader>) -> bool {
        let mut loaders = self.state.loaders.borrow_mut();
        let before = loaders.len();
        loaders.retain(|l| !same_loader(l, loader));
        loaders.len() != before
    }

    /// Most recently added loader for `kind`.
    pub fn loader_for(&self, kind: AssetKind) -> Option<Rc<dyn Loader>> {
        self.state
            .loaders
            .borrow()
            .iter()
            .rev()
            .find(|l| l.kind() == kind)
            .cloned()
    }

    /// Most recently added loader for `kind` that accepts `data`.
    pub fn loader_for_data(&self, kind: AssetKind, data: &[u8]) -> Option<Rc<dyn Loader>> {
        self.state
            .loaders
            .borrow()
            .iter()
            .rev()
            .find(|l| l.kind() == kind && l.accepts(data))
            .cloned()
    }

    pub fn loader_count(&self) -> usize {
        self.state.loaders.borrow().len()
    }

    // ========================================================================
    // Bundles
    // ========================================================================

    pub(crate) fn register_bundle(&self, resources: &Rc<RefCell<BundleResources>>) -> bool {
        let mut bundles = self.state.bundles.borrow_mut();
        let ptr = Rc::as_ptr(resources);
        if bundles.iter().any(|b| b.as_ptr() == ptr) {
            return false;
        }
        bundles.push(Rc::downgrade(resources));
        true
    }

    pub(crate) fn unregister_bundle(&self, resources: &Rc<RefCell<BundleResources>>) {
        let ptr = Rc::as_ptr(resources);
        self.state
            .bundles
            .borrow_mut()
            .retain(|b| b.as_ptr() != ptr && b.strong_count() > 0);
    }

    /// Number of live registered bundles.
    pub fn bundle_count(&self) -> usize {
        self.state
            .bundles
            .borrow()
            .iter()
            .filter(|b| b.strong_count() > 0)
            .count()
    }

    /// Live bundles in lookup order.
    fn bundles_in_order(&self) -> Vec<Rc<RefCell<BundleResources>>> {
        let mut bundles: Vec<_> = self
            .state
            .bundles
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        if self.config().lookup_order == LookupOrder::MostRecentFirst {
            bundles.reverse();
        }
        bundles
    }

    /// First hit of `f` across bundles. Bundles currently being mutated are skipped.
    fn find<R>(&self, mut f: impl FnMut(&BundleResources) -> Option<R>) -> Option<R> {
        self.bundles_in_order().iter().find_map(|bundle| {
            let resources = bundle.try_borrow().ok()?;
            f(&resources)
        })
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.find(|r| r.textures.get(name).cloned())
    }

    pub fn sprite_data(&self, name: &str) -> Option<SpriteData> {
        self.find(|r| r.sprite_data.get(name).cloned())
    }

    pub fn particle_system_data(&self, name: &str) -> Option<ParticleSystemData> {
        self.find(|r| r.particle_system_data.get(name).cloned())
    }

    pub fn static_mesh_data(&self, name: &str) -> Option<StaticMeshData> {
        self.find(|r| r.static_mesh_data.get(name).cloned())
    }

    pub fn skinned_mesh_data(&self, name: &str) -> Option<SkinnedMeshData> {
        self.find(|r| r.skinned_mesh_data.get(name).cloned())
    }

    /// Run `f` on the first shader named `name`. `f` must not load assets.
    pub fn with_shader<R>(&self, name: &str, f: impl FnOnce(&Shader) -> R) -> Option<R> {
        let mut f = Some(f);
        self.find(|r| r.shaders.get(name).and_then(|s| f.take().map(|f| f(s))))
    }

    /// Run `f` on the first material named `name`. `f` must not load assets.
    pub fn with_material<R>(&self, name: &str, f: impl FnOnce(&Material) -> R) -> Option<R> {
        let mut f = Some(f);
        self.find(|r| r.materials.get(name).and_then(|m| f.take().map(|f| f(m))))
    }

    /// Run `f` on the first font named `name`. `f` must not load assets.
    pub fn with_font<R>(&self, name: &str, f: impl FnOnce(&Font) -> R) -> Option<R> {
        let mut f = Some(f);
        self.find(|r| r.fonts.get(name).and_then(|font| f.take().map(|f| f(font))))
    }

    /// Run `f` on the first sound named `name`. `f` must not load assets.
    pub fn with_sound<R>(&self, name: &str, f: impl FnOnce(&Sound) -> R) -> Option<R> {
        let mut f = Some(f);
        self.find(|r| r.sounds.get(name).and_then(|s| f.take().map(|f| f(s))))
    }

    /// Run `f` on the first cue named `name`. `f` must not load assets.
    pub fn with_cue<R>(&self, name: &str, f: impl FnOnce(&Cue) -> R) -> Option<R> {
        let mut f = Some(f);
        self.find(|r| r.cues.get(name).and_then(|c| f.take().map(|f| f(c))))
    }

    pub fn has_shader(&self, name: &str) -> bool {
        self.with_shader(name, |_| ()).is_some()
    }

    pub fn has_material(&self, name: &str) -> bool {
        self.with_material(name, |_| ()).is_some()
    }

    pub fn has_font(&self, name: &str) -> bool {
        self.with_font(name, |_| ()).is_some()
    }

    pub fn has_sound(&self, name: &str) -> bool {
        self.with_sound(name, |_| ()).is_some()
    }

    pub fn has_cue(&self, name: &str) -> bool {
        self.with_cue(name, |_| ()).is_some()
    }
}

fn same_loader(a: &Rc<dyn Loader>, b: &Rc<dyn Loader>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::asset::LoadOptions;
    use crate::assets::bundle::Bundle;
    use crate::assets::fs::MemoryFileSystem;
    use crate::assets::loader::LoadContext;
    use crate::error::Result;

    struct NullLoader(AssetKind);

    impl Loader for NullLoader {
        fn kind(&self) -> AssetKind {
            self.0
        }

        fn load(&self, _: &mut LoadContext<'_>, _: &str, _: &[u8], _: LoadOptions) -> Result<()> {
            Ok(())
        }
    }

    /// Only takes data starting with its magic bytes.
    struct MagicLoader(&'static [u8]);

    impl Loader for MagicLoader {
        fn kind(&self) -> AssetKind {
            AssetKind::Sound
        }

        fn accepts(&self, data: &[u8]) -> bool {
            data.starts_with(self.0)
        }

        fn load(&self, _: &mut LoadContext<'_>, _: &str, _: &[u8], _: LoadOptions) -> Result<()> {
            Ok(())
        }
    }

    fn sound(rate: u32) -> Sound {
        Sound {
            sample_rate: rate,
            channels: 1,
            samples: vec![vec![0.0]],
        }
    }

    #[test]
    fn add_loader_is_idempotent() {
        let cache = Cache::default();
        let loader: Rc<dyn Loader> = Rc::new(NullLoader(AssetKind::Sound));
        assert!(cache.add_loader(loader.clone()));
        assert!(!cache.add_loader(loader.clone()));
        assert_eq!(cache.loader_count(), 1);
        assert!(cache.remove_loader(&loader));
        assert!(cache.loader_for(AssetKind::Sound).is_none());
    }

    #[test]
    fn latest_loader_wins() {
        let cache = Cache::default();
        let first: Rc<dyn Loader> = Rc::new(NullLoader(AssetKind::Cue));
        let second: Rc<dyn Loader> = Rc::new(NullLoader(AssetKind::Cue));
        cache.add_loader(first);
        cache.add_loader(second.clone());
        let found = cache.loader_for(AssetKind::Cue).unwrap();
        assert!(same_loader(&found, &second));
    }

    #[test]
    fn declining_loader_falls_through_to_older_one() {
        let cache = Cache::default();
        let fallback: Rc<dyn Loader> = Rc::new(NullLoader(AssetKind::Sound));
        let picky: Rc<dyn Loader> = Rc::new(MagicLoader(b"OggS"));
        cache.add_loader(fallback.clone());
        cache.add_loader(picky.clone());

        let found = cache.loader_for_data(AssetKind::Sound, b"OggS....").unwrap();
        assert!(same_loader(&found, &picky));
        let found = cache.loader_for_data(AssetKind::Sound, b"RIFF....").unwrap();
        assert!(same_loader(&found, &fallback));

        cache.remove_loader(&fallback);
        assert!(cache.loader_for_data(AssetKind::Sound, b"RIFF....").is_none());
    }

    #[test]
    fn bundles_register_and_deregister() {
        let cache = Cache::default();
        let bundle = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        assert_eq!(cache.bundle_count(), 1);
        drop(bundle);
        assert_eq!(cache.bundle_count(), 0);
    }

    #[test]
    fn registration_order_prefers_first_bundle() {
        let cache = Cache::new(CacheConfig::default());
        let first = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        let second = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        first.set_sound("boom", sound(1));
        second.set_sound("boom", sound(2));
        assert_eq!(cache.with_sound("boom", |s| s.sample_rate), Some(1));
    }

    #[test]
    fn most_recent_first_prefers_newest_bundle() {
        let cache = Cache::new(CacheConfig {
            lookup_order: LookupOrder::MostRecentFirst,
            ..Default::default()
        });
        let first = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        let second = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        first.set_sound("boom", sound(1));
        second.set_sound("boom", sound(2));
        assert_eq!(cache.with_sound("boom", |s| s.sample_rate), Some(2));
        drop(second);
        assert_eq!(cache.with_sound("boom", |s| s.sample_rate), Some(1));
    }

    #[test]
    fn lookup_falls_back_to_other_bundles() {
        let cache = Cache::default();
        let first = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        let second = Bundle::new(&cache, Rc::new(MemoryFileSystem::new()));
        second.set_sound("only-here", sound(3));
        assert!(first.sound("only-here").is_none());
        assert!(cache.has_sound("only-here"));
        assert!(!cache.has_sound("missing"));
    }
}
