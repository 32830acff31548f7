//! Typed resources produced by the asset loaders.

pub mod cue;
pub mod font;
pub mod material;
pub mod mesh_data;
pub mod particle;
pub mod shader;
pub mod sound;
pub mod sprite_data;
pub mod texture;

pub use cue::{Cue, EffectDefinition, SourceDefinition};
pub use font::{Font, Glyph, TextMesh};
pub use material::Material;
pub use mesh_data::{SkinnedMeshData, StaticMeshData};
pub use particle::{EmitterType, ParticleSystemData};
pub use shader::{Shader, SHADER_COLOR, SHADER_TEXTURE};
pub use sound::Sound;
pub use sprite_data::{SpriteAnimation, SpriteData, SpriteFrame};
pub use texture::Texture;
