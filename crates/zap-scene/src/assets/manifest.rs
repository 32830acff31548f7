use serde::{Deserialize, Serialize};

use super::asset::{Asset, AssetKind, LoadOptions};
use crate::error::LoadError;

/// Bundle manifest: a flat list of assets to load in order.
/// Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub assets: Vec<AssetDescriptor>,
}

/// One manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Path relative to the bundle's file system root.
    pub filename: String,
    /// Lookup name (default: the filename).
    #[serde(default)]
    pub name: Option<String>,
    /// Request mipmaps for textures; absent means the loading bundle's
    /// default.
    #[serde(default)]
    pub mipmaps: Option<bool>,
    /// `AssetKind` ordinal.
    #[serde(rename = "type")]
    pub kind: u32,
}

impl BundleManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Resolve every entry into an [`Asset`], filling unset options from
    /// `defaults`. Fails on the first unknown kind.
    pub fn to_assets(&self, defaults: LoadOptions) -> Result<Vec<Asset>, LoadError> {
        self.assets
            .iter()
            .map(|d| {
                Ok(Asset {
                    kind: AssetKind::try_from(d.kind)?,
                    name: d.name.clone().unwrap_or_else(|| d.filename.clone()),
                    filename: d.filename.clone(),
                    options: LoadOptions {
                        mipmaps: d.mipmaps.unwrap_or(defaults.mipmaps),
                    },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest_with_defaults() {
        let json = r#"{
            "assets": [
                { "filename": "hero.png", "type": 4 },
                { "filename": "hero.json", "name": "hero", "mipmaps": false, "type": 7 }
            ]
        }"#;
        let manifest = BundleManifest::from_json(json).unwrap();
        let assets = manifest.to_assets(LoadOptions::default()).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].name, "hero.png");
        assert_eq!(assets[0].kind, AssetKind::Image);
        assert!(assets[0].options.mipmaps);
        assert_eq!(assets[1].name, "hero");
        assert_eq!(assets[1].kind, AssetKind::Sprite);
        assert!(!assets[1].options.mipmaps);
    }

    #[test]
    fn unset_mipmaps_follow_the_defaults() {
        let json = r#"{
            "assets": [
                { "filename": "a.png", "type": 4 },
                { "filename": "b.png", "mipmaps": true, "type": 4 }
            ]
        }"#;
        let manifest = BundleManifest::from_json(json).unwrap();
        let assets = manifest.to_assets(LoadOptions { mipmaps: false }).unwrap();
        assert!(!assets[0].options.mipmaps);
        assert!(assets[1].options.mipmaps);
    }

    #[test]
    fn unknown_kind_fails() {
        let json = r#"{ "assets": [ { "filename": "x", "type": 42 } ] }"#;
        let manifest = BundleManifest::from_json(json).unwrap();
        assert!(matches!(
            manifest.to_assets(LoadOptions::default()),
            Err(LoadError::UnknownAssetKind(42))
        ));
    }

    #[test]
    fn missing_assets_array_is_an_error() {
        assert!(BundleManifest::from_json("{}").is_err());
    }
}
