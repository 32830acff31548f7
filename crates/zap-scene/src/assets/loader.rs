use super::asset::{AssetKind, LoadOptions};
use super::bundle::Bundle;
use super::cache::Cache;
use crate::error::Result;
use crate::renderer::traits::Renderer;

/// Everything a loader may touch while decoding one file.
pub struct LoadContext<'a> {
    pub cache: &'a Cache,
    /// Bundle receiving the results; also used to load referenced files.
    pub bundle: &'a Bundle,
    pub renderer: &'a mut dyn Renderer,
    /// File the data was read from, for formats identified by extension.
    pub filename: &'a str,
}

impl LoadContext<'_> {
    /// Load a file referenced by the one being decoded, into the same bundle.
    pub fn load_dependency(
        &mut self,
        kind: AssetKind,
        name: &str,
        filename: &str,
        options: LoadOptions,
    ) -> Result<()> {
        self.bundle.load_asset(&mut *self.renderer, kind, name, filename, options)
    }
}

/// Decoder for one asset kind.
///
/// Several loaders may share a kind (WAV and Vorbis sounds, bitmap and
/// TrueType fonts); `accepts` lets a loader decline data it does not
/// recognise so an older loader of the same kind gets it.
///
/// A loader registers its results in `ctx.bundle` only once decoding has
/// fully succeeded. On error the bundle is left as it was (files loaded
/// recursively before the failure stay loaded).
pub trait Loader {
    fn kind(&self) -> AssetKind;

    fn accepts(&self, _data: &[u8]) -> bool {
        true
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()>;
}
