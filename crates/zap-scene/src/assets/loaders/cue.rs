use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::{LoadError, Result};
use crate::resources::cue::{SourceDefinition, SourceType};
use crate::resources::Cue;

fn validate(source: &SourceDefinition) -> Result<()> {
    if source.kind == SourceType::Oscillator && source.oscillator_type.is_none() {
        return Err(LoadError::MissingField("oscillatorType"));
    }
    source.sources.iter().try_for_each(validate)
}

/// Sound cue loader (JSON source tree).
#[derive(Debug, Default)]
pub struct CueLoader;

impl Loader for CueLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Cue
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], _options: LoadOptions) -> Result<()> {
        let cue: Cue = serde_json::from_slice(data)?;
        if let Some(source) = &cue.source {
            validate(source)?;
        }

        for sound in cue.sound_names() {
            if !ctx.cache.has_sound(sound) {
                log::warn!("{}: sound {} is not loaded", name, sound);
            }
        }

        ctx.bundle.set_cue(name, cue);
        Ok(())
    }
}
