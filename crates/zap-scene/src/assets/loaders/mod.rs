//! Format decoders, one [`Loader`] per supported file type.

pub mod bmfont;
pub mod cue;
#[cfg(feature = "images")]
pub mod image;
pub mod mtl;
pub mod obj;
pub mod particle;
pub mod sprite;
pub mod tokenizer;
#[cfg(feature = "truetype")]
pub mod ttf;
#[cfg(feature = "vorbis")]
pub mod vorbis;
pub mod wave;

use std::rc::Rc;

use super::loader::Loader;

pub use bmfont::BmFontLoader;
pub use cue::CueLoader;
#[cfg(feature = "images")]
pub use self::image::ImageLoader;
pub use mtl::MtlLoader;
pub use obj::ObjLoader;
pub use particle::ParticleSystemLoader;
pub use sprite::SpriteLoader;
#[cfg(feature = "truetype")]
pub use ttf::TtfLoader;
#[cfg(feature = "vorbis")]
pub use vorbis::VorbisLoader;
pub use wave::WaveLoader;

/// One instance of every built-in loader. Image, Vorbis and TrueType
/// decoding depend on the `images`, `vorbis` and `truetype` features.
///
/// The TrueType and Vorbis loaders come after the bitmap font and WAV
/// loaders of the same kind and only accept their own file signatures.
pub fn default_loaders() -> Vec<Rc<dyn Loader>> {
    let mut loaders: Vec<Rc<dyn Loader>> = vec![
        Rc::new(BmFontLoader),
        Rc::new(CueLoader),
        Rc::new(MtlLoader),
        Rc::new(ObjLoader),
        Rc::new(ParticleSystemLoader),
        Rc::new(SpriteLoader),
        Rc::new(WaveLoader),
    ];
    #[cfg(feature = "images")]
    loaders.push(Rc::new(ImageLoader));
    #[cfg(feature = "truetype")]
    loaders.push(Rc::new(TtfLoader));
    #[cfg(feature = "vorbis")]
    loaders.push(Rc::new(VorbisLoader));
    loaders
}
