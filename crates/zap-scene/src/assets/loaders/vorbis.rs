//! Ogg Vorbis decoder.
//!
//! Decodes the whole stream up front into the same planar layout the WAV
//! decoder produces.

use std::io::Cursor;

use lewton::inside_ogg::OggStreamReader;

use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::Result;
use crate::resources::Sound;

const OGG_MAGIC: &[u8] = b"OggS";

/// Split interleaved 16-bit samples into one normalized buffer per channel.
fn deinterleave(interleaved: &[i16], channels: u16) -> Vec<Vec<f32>> {
    let stride = usize::from(channels.max(1));
    (0..stride)
        .map(|channel| {
            interleaved
                .iter()
                .skip(channel)
                .step_by(stride)
                .map(|&s| f32::from(s) / 32767.0)
                .collect()
        })
        .collect()
}

pub fn decode_vorbis(data: &[u8]) -> Result<Sound> {
    let mut reader = OggStreamReader::new(Cursor::new(data))?;
    let channels = u16::from(reader.ident_hdr.audio_channels);
    let sample_rate = reader.ident_hdr.audio_sample_rate;

    let mut interleaved = Vec::new();
    while let Some(packet) = reader.read_dec_packet_itl()? {
        interleaved.extend_from_slice(&packet);
    }

    Ok(Sound {
        sample_rate,
        channels,
        samples: deinterleave(&interleaved, channels),
    })
}

#[derive(Debug, Default)]
pub struct VorbisLoader;

impl Loader for VorbisLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Sound
    }

    fn accepts(&self, data: &[u8]) -> bool {
        data.starts_with(OGG_MAGIC)
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], _options: LoadOptions) -> Result<()> {
        let sound = decode_vorbis(data)?;
        log::debug!(
            "{}: {} Hz, {} channels, {} frames",
            name,
            sound.sample_rate,
            sound.channels,
            sound.frame_count()
        );
        ctx.bundle.set_sound(name, sound);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::api::config::CacheConfig;
    use crate::assets::bundle::Bundle;
    use crate::assets::cache::Cache;
    use crate::assets::fs::MemoryFileSystem;
    use crate::assets::loaders::wave::tests::wav_bytes;
    use crate::error::LoadError;
    use crate::renderer::headless::HeadlessRenderer;

    #[test]
    fn stereo_packets_are_split_per_channel() {
        let planar = deinterleave(&[32767, -100, 0, 200], 2);
        assert_eq!(planar.len(), 2);
        assert!((planar[0][0] - 1.0).abs() < 1e-6);
        assert!(planar[0][1].abs() < 1e-6);
        assert!((planar[1][0] + 100.0 / 32767.0).abs() < 1e-6);
        assert!((planar[1][1] - 200.0 / 32767.0).abs() < 1e-6);
    }

    #[test]
    fn only_ogg_streams_are_accepted() {
        assert!(VorbisLoader.accepts(b"OggS\0\x02"));
        assert!(!VorbisLoader.accepts(b"RIFF"));
        assert!(!VorbisLoader.accepts(b""));
    }

    #[test]
    fn wav_files_still_reach_the_wave_loader() {
        crate::test_log();
        let cache = Cache::with_default_loaders(CacheConfig::default());
        let fs = MemoryFileSystem::new().with_file("beep.wav", wav_bytes(1, 1, 8000, 8, &[128, 255]));
        let bundle = Bundle::new(&cache, Rc::new(fs));
        let mut renderer = HeadlessRenderer::new();
        bundle
            .load_asset(&mut renderer, AssetKind::Sound, "beep", "beep.wav", LoadOptions::default())
            .unwrap();
        assert_eq!(cache.with_sound("beep", |s| s.frame_count()), Some(2));
    }

    #[test]
    fn broken_ogg_is_rejected() {
        let cache = Cache::with_default_loaders(CacheConfig::default());
        let mut junk = OGG_MAGIC.to_vec();
        junk.extend_from_slice(&[0u8; 60]);
        let bundle = Bundle::new(&cache, Rc::new(MemoryFileSystem::new().with_file("bad.ogg", junk)));
        let mut renderer = HeadlessRenderer::new();
        let err = bundle
            .load_asset(&mut renderer, AssetKind::Sound, "bad", "bad.ogg", LoadOptions::default())
            .unwrap_err();
        match err {
            LoadError::Asset { source, .. } => assert!(matches!(*source, LoadError::Vorbis(_))),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!cache.has_sound("bad"));
    }
}
