//! Error types for asset loading.
//!
//! Every loader returns [`Result<()>`], an alias for
//! `std::result::Result<(), LoadError>`. Format decoders have their own
//! narrower enums ([`WavError`], [`TextError`]) that convert into
//! [`LoadError`] with `?`.

use thiserror::Error;

use crate::assets::asset::AssetKind;

/// Failure while loading an asset into a bundle.
#[derive(Error, Debug)]
pub enum LoadError {
    // ========================================================================
    // Dispatch
    // ========================================================================
    /// Reading the file through the bundle's file system failed.
    #[error("Failed to read {filename}: {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// No registered loader handles the requested kind.
    #[error("No loader registered for {kind:?} (file {filename})")]
    NoLoader { kind: AssetKind, filename: String },

    /// The matching loader rejected the file.
    #[error("Failed to load asset {filename}: {source}")]
    Asset {
        filename: String,
        #[source]
        source: Box<LoadError>,
    },

    /// Manifest entry carries a type ordinal outside the known kinds.
    #[error("Unknown asset type {0}")]
    UnknownAssetKind(u32),

    /// Several entries of a batch load failed.
    #[error("{} assets failed to load", .0.len())]
    Batch(Vec<LoadError>),

    // ========================================================================
    // Decoding
    // ========================================================================
    /// Malformed JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed RIFF/WAVE data.
    #[error("WAV error: {0}")]
    Wav(#[from] WavError),

    /// Malformed line-oriented text format (BMFont, OBJ, MTL).
    #[error("Text format error: {0}")]
    Text(#[from] TextError),

    /// Image decoding failed.
    #[cfg(feature = "images")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Ogg Vorbis decoding failed.
    #[cfg(feature = "vorbis")]
    #[error("Vorbis error: {0}")]
    Vorbis(#[from] lewton::VorbisError),

    /// The font file could not be parsed.
    #[cfg(feature = "truetype")]
    #[error("Font error: {0}")]
    TrueType(&'static str),

    /// A required field is absent.
    #[error("Missing field {0}")]
    MissingField(&'static str),

    /// A field holds a value outside its accepted set.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// A referenced texture could not be resolved, even after loading it.
    #[error("Texture {0} is not available")]
    MissingTexture(String),
}

/// Errors raised by the WAV decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavError {
    #[error("file too small")]
    TooSmall,
    #[error("not a RIFF file")]
    BadRiff,
    #[error("not a WAVE file")]
    BadWave,
    #[error("declared length {declared} exceeds available {available} bytes")]
    LengthMismatch { declared: usize, available: usize },
    #[error("not enough data for chunk {0}")]
    NotEnoughData(String),
    #[error("fmt chunk is {0} bytes, need at least 16")]
    FormatTooSmall(u32),
    #[error("unsupported format tag {0}")]
    UnsupportedFormat(u16),
    #[error("channel count must be non-zero")]
    InvalidChannels,
    #[error("sample rate must be non-zero")]
    InvalidSampleRate,
    #[error("unsupported bit depth {0}")]
    UnsupportedBitDepth(u16),
    #[error("no fmt chunk")]
    MissingFormat,
    #[error("no data chunk")]
    MissingData,
}

/// Errors raised by the shared text tokenizer and the formats built on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("unexpected end of data")]
    UnexpectedEnd,
    #[error("invalid string")]
    InvalidString,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid float")]
    InvalidFloat,
    #[error("invalid exponent")]
    InvalidExponent,
    #[error("expected '{0}'")]
    UnexpectedToken(char),
    #[error("invalid {kind} index {index}")]
    InvalidIndex { kind: &'static str, index: i64 },
    #[error("face has {0} vertices, need at least 3")]
    InvalidFaceCount(usize),
}

pub type Result<T> = std::result::Result<T, LoadError>;
