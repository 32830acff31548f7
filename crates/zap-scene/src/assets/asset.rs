use crate::error::LoadError;

/// Kind of resource an asset decodes into. The ordinals are the `type`
/// values of the bundle manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Bank = 0,
    Font = 1,
    StaticMesh = 2,
    SkinnedMesh = 3,
    Image = 4,
    Material = 5,
    ParticleSystem = 6,
    Sprite = 7,
    Sound = 8,
    Cue = 9,
}

impl TryFrom<u32> for AssetKind {
    type Error = LoadError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => AssetKind::Bank,
            1 => AssetKind::Font,
            2 => AssetKind::StaticMesh,
            3 => AssetKind::SkinnedMesh,
            4 => AssetKind::Image,
            5 => AssetKind::Material,
            6 => AssetKind::ParticleSystem,
            7 => AssetKind::Sprite,
            8 => AssetKind::Sound,
            9 => AssetKind::Cue,
            other => return Err(LoadError::UnknownAssetKind(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Request a full mip chain for textures.
    pub mipmaps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { mipmaps: true }
    }
}

/// One entry of a batch load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetKind,
    pub name: String,
    pub filename: String,
    pub options: LoadOptions,
}

impl Asset {
    /// Asset named after its file.
    pub fn new(kind: AssetKind, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            kind,
            name: filename.clone(),
            filename,
            options: LoadOptions::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.options.mipmaps = mipmaps;
        self
    }
}
