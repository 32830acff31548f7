//! RIFF/WAVE decoder.
//!
//! Accepts PCM (8, 16, 24 and 32 bit) and 32-bit IEEE float data and
//! produces planar samples normalized to [-1, 1].

use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::{Result, WavError};
use crate::resources::Sound;

const WAVE_FORMAT_PCM: u16 = 1;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

#[derive(Debug, Clone, Copy)]
struct Format {
    tag: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

fn parse_format(body: &[u8]) -> std::result::Result<Format, WavError> {
    if body.len() < 16 {
        return Err(WavError::FormatTooSmall(body.len() as u32));
    }

    let tag = read_u16(body, 0);
    if tag != WAVE_FORMAT_PCM && tag != WAVE_FORMAT_IEEE_FLOAT {
        return Err(WavError::UnsupportedFormat(tag));
    }
    let channels = read_u16(body, 2);
    if channels == 0 {
        return Err(WavError::InvalidChannels);
    }
    let sample_rate = read_u32(body, 4);
    if sample_rate == 0 {
        return Err(WavError::InvalidSampleRate);
    }
    // bytes 8..12 byte rate, 12..14 block align
    let bits_per_sample = read_u16(body, 14);
    let supported = match tag {
        WAVE_FORMAT_IEEE_FLOAT => bits_per_sample == 32,
        _ => matches!(bits_per_sample, 8 | 16 | 24 | 32),
    };
    if !supported {
        return Err(WavError::UnsupportedBitDepth(bits_per_sample));
    }

    Ok(Format {
        tag,
        channels,
        sample_rate,
        bits_per_sample,
    })
}

fn convert_sample(format: &Format, bytes: &[u8]) -> f32 {
    match (format.tag, format.bits_per_sample) {
        (WAVE_FORMAT_IEEE_FLOAT, _) => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        (_, 8) => 2.0 * f32::from(bytes[0]) / 255.0 - 1.0,
        (_, 16) => f32::from(i16::from_le_bytes([bytes[0], bytes[1]])) / 32767.0,
        (_, 24) => {
            // place the 24 bits at the top of an i32 and shift back to sign-extend
            let value = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8;
            (f64::from(value) / 8_388_607.0) as f32
        }
        _ => {
            let value = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            (f64::from(value) / 2_147_483_647.0) as f32
        }
    }
}

/// Decode a complete WAV file.
pub fn decode_wave(data: &[u8]) -> std::result::Result<Sound, WavError> {
    if data.len() < 12 {
        return Err(WavError::TooSmall);
    }
    if &data[0..4] != b"RIFF" {
        return Err(WavError::BadRiff);
    }
    let length = read_u32(data, 4) as usize;
    if data.len() < 8 + length {
        return Err(WavError::LengthMismatch {
            declared: length,
            available: data.len() - 8,
        });
    }
    if length < 4 || &data[8..12] != b"WAVE" {
        return Err(WavError::BadWave);
    }

    let mut format = None;
    let mut samples: Option<&[u8]> = None;
    let mut offset = 12;

    while offset < data.len() {
        if data.len() < offset + 8 {
            return Err(WavError::NotEnoughData("header".to_string()));
        }
        let tag = &data[offset..offset + 4];
        let size = read_u32(data, offset + 4) as usize;
        offset += 8;

        if data.len() < offset + size {
            return Err(WavError::NotEnoughData(String::from_utf8_lossy(tag).into_owned()));
        }
        let body = &data[offset..offset + size];

        match tag {
            b"fmt " => format = Some(parse_format(body)?),
            b"data" => samples = Some(body),
            _ => {}
        }

        // chunks are word aligned
        offset += (size + 1) & !1;
    }

    let format = format.ok_or(WavError::MissingFormat)?;
    let samples = samples.ok_or(WavError::MissingData)?;

    let bytes_per_sample = usize::from(format.bits_per_sample / 8);
    let channels = usize::from(format.channels);
    let frames = samples.len() / bytes_per_sample / channels;

    let planar = (0..channels)
        .map(|channel| {
            (0..frames)
                .map(|frame| {
                    let start = (frame * channels + channel) * bytes_per_sample;
                    convert_sample(&format, &samples[start..start + bytes_per_sample])
                })
                .collect()
        })
        .collect();

    Ok(Sound {
        sample_rate: format.sample_rate,
        channels: format.channels,
        samples: planar,
    })
}

#[derive(Debug, Default)]
pub struct WaveLoader;

impl Loader for WaveLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Sound
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], _options: LoadOptions) -> Result<()> {
        let sound = decode_wave(data)?;
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
pub(crate) mod tests {
    use super::*;

    /// Build a RIFF file with a `fmt ` chunk and a `data` chunk.
    pub(crate) fn wav_bytes(tag: u16, channels: u16, sample_rate: u32, bits: u16, samples: &[u8]) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&tag.to_le_bytes());
        fmt.extend_from_slice(&channels.to_le_bytes());
        fmt.extend_from_slice(&sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&bits.to_le_bytes());

        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        body.extend_from_slice(b"fmt ");
        body.extend_from_slice(&(fmt.len() as u32).to_le_bytes());
        body.extend_from_slice(&fmt);
        body.extend_from_slice(b"data");
        body.extend_from_slice(&(samples.len() as u32).to_le_bytes());
        body.extend_from_slice(samples);
        if samples.len() % 2 == 1 {
            body.push(0);
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn pcm8_boundaries() {
        let sound = decode_wave(&wav_bytes(1, 1, 8000, 8, &[0, 255])).unwrap();
        assert_eq!(sound.channels, 1);
        assert_eq!(sound.sample_rate, 8000);
        assert!((sound.samples[0][0] + 1.0).abs() < 1e-6);
        assert!((sound.samples[0][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pcm16_boundaries_are_asymmetric() {
        let mut data = Vec::new();
        for v in [i16::MAX, i16::MIN, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let sound = decode_wave(&wav_bytes(1, 1, 44100, 16, &data)).unwrap();
        assert!((sound.samples[0][0] - 1.0).abs() < 1e-6);
        assert!((sound.samples[0][1] - (-32768.0 / 32767.0)).abs() < 1e-6);
        assert_eq!(sound.samples[0][2], 0.0);
    }

    #[test]
    fn pcm24_is_sign_extended() {
        // 0x7FFFFF, 0x800000 (most negative), 0xFFFFFF (-1)
        let data = [0xFF, 0xFF, 0x7F, 0x00, 0x00, 0x80, 0xFF, 0xFF, 0xFF];
        let sound = decode_wave(&wav_bytes(1, 1, 22050, 24, &data)).unwrap();
        let s = &sound.samples[0];
        assert!((s[0] - 1.0).abs() < 1e-6);
        assert!((s[1] - (-8_388_608.0 / 8_388_607.0)).abs() < 1e-6);
        assert!((s[2] - (-1.0 / 8_388_607.0)).abs() < 1e-6);
    }

    #[test]
    fn pcm32_and_float() {
        let sound = decode_wave(&wav_bytes(1, 1, 48000, 32, &i32::MAX.to_le_bytes())).unwrap();
        assert!((sound.samples[0][0] - 1.0).abs() < 1e-6);

        let sound = decode_wave(&wav_bytes(3, 1, 48000, 32, &0.25f32.to_le_bytes())).unwrap();
        assert_eq!(sound.samples[0][0], 0.25);
    }

    #[test]
    fn stereo_is_deinterleaved() {
        let mut data = Vec::new();
        for v in [100i16, -100, 200, -200] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let sound = decode_wave(&wav_bytes(1, 2, 44100, 16, &data)).unwrap();
        assert_eq!(sound.frame_count(), 2);
        assert!((sound.samples[0][1] - 200.0 / 32767.0).abs() < 1e-6);
        assert!((sound.samples[1][0] + 100.0 / 32767.0).abs() < 1e-6);
    }

    #[test]
    fn length_mismatch_fails() {
        let mut bytes = wav_bytes(1, 1, 8000, 8, &[128, 128]);
        let declared = read_u32(&bytes, 4) + 10;
        bytes[4..8].copy_from_slice(&declared.to_le_bytes());
        assert!(matches!(decode_wave(&bytes), Err(WavError::LengthMismatch { .. })));
    }

    #[test]
    fn header_errors() {
        assert_eq!(decode_wave(b"RIFF").unwrap_err(), WavError::TooSmall);
        let mut bytes = wav_bytes(1, 1, 8000, 8, &[0, 0]);
        bytes[0] = b'X';
        assert_eq!(decode_wave(&bytes).unwrap_err(), WavError::BadRiff);
        let mut bytes = wav_bytes(1, 1, 8000, 8, &[0, 0]);
        bytes[8] = b'X';
        assert_eq!(decode_wave(&bytes).unwrap_err(), WavError::BadWave);
    }

    #[test]
    fn format_errors() {
        assert_eq!(
            decode_wave(&wav_bytes(2, 1, 8000, 16, &[0, 0])).unwrap_err(),
            WavError::UnsupportedFormat(2)
        );
        assert_eq!(
            decode_wave(&wav_bytes(1, 0, 8000, 16, &[0, 0])).unwrap_err(),
            WavError::InvalidChannels
        );
        assert_eq!(
            decode_wave(&wav_bytes(1, 1, 0, 16, &[0, 0])).unwrap_err(),
            WavError::InvalidSampleRate
        );
        assert_eq!(
            decode_wave(&wav_bytes(1, 1, 8000, 12, &[0, 0])).unwrap_err(),
            WavError::UnsupportedBitDepth(12)
        );
        assert_eq!(
            decode_wave(&wav_bytes(3, 1, 8000, 16, &[0, 0])).unwrap_err(),
            WavError::UnsupportedBitDepth(16)
        );
    }

    #[test]
    fn missing_chunks() {
        let mut only_data = Vec::new();
        only_data.extend_from_slice(b"RIFF");
        only_data.extend_from_slice(&14u32.to_le_bytes());
        only_data.extend_from_slice(b"WAVEdata");
        only_data.extend_from_slice(&2u32.to_le_bytes());
        only_data.extend_from_slice(&[0, 0]);
        assert_eq!(decode_wave(&only_data).unwrap_err(), WavError::MissingFormat);

        let full = wav_bytes(1, 1, 8000, 8, &[]);
        // drop the empty data chunk header
        let mut no_data = full[..full.len() - 8].to_vec();
        let length = (no_data.len() - 8) as u32;
        no_data[4..8].copy_from_slice(&length.to_le_bytes());
        assert_eq!(decode_wave(&no_data).unwrap_err(), WavError::MissingData);
    }

    #[test]
    fn truncated_chunk_fails() {
        let mut bytes = wav_bytes(1, 1, 8000, 8, &[0, 0]);
        let n = bytes.len();
        // data chunk claims more than is present
        bytes[n - 6..n - 2].copy_from_slice(&100u32.to_le_bytes());
        assert!(matches!(decode_wave(&bytes), Err(WavError::NotEnoughData(_))));
    }
}
