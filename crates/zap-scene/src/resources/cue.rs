//! Sound cue definitions: a tree of sources with effect chains.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SourceType {
    Parallel,
    Random,
    Sequence,
    Oscillator,
    Silence,
    WavePlayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OscillatorType {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EffectType {
    Delay,
    Gain,
    PitchScale,
    PitchShift,
    Reverb,
    LowPass,
    HighPass,
}

fn one() -> f32 {
    1.0
}

fn half() -> f32 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EffectDefinition {
    #[serde(rename = "type")]
    pub kind: EffectType,
    #[serde(default)]
    pub delay: f32,
    /// Decibels.
    #[serde(default)]
    pub gain: f32,
    #[serde(default = "one")]
    pub scale: f32,
    #[serde(default = "one")]
    pub shift: f32,
    #[serde(default = "half")]
    pub decay: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDefinition {
    #[serde(rename = "type")]
    pub kind: SourceType,
    #[serde(default)]
    pub oscillator_type: Option<OscillatorType>,
    #[serde(default)]
    pub frequency: f32,
    #[serde(default)]
    pub amplitude: f32,
    /// Seconds, for oscillators and silence.
    #[serde(default)]
    pub length: f32,
    /// Sound played by a `WavePlayer`, by name.
    #[serde(default, rename = "source")]
    pub sound: Option<String>,
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
    #[serde(default)]
    pub sources: Vec<SourceDefinition>,
}

/// Playable sound description. An empty cue has no root source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Cue {
    #[serde(default)]
    pub source: Option<SourceDefinition>,
}

impl Cue {
    /// Every sound name referenced by the tree, depth first.
    pub fn sound_names(&self) -> Vec<&str> {
        fn collect<'a>(source: &'a SourceDefinition, out: &mut Vec<&'a str>) {
            if let Some(name) = &source.sound {
                out.push(name);
            }
            for child in &source.sources {
                collect(child, out);
            }
        }

        let mut names = Vec::new();
        if let Some(source) = &self.source {
            collect(source, &mut names);
        }
        names
    }
}
