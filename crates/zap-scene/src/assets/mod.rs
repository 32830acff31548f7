pub mod asset;
pub mod bundle;
pub mod cache;
pub mod fs;
pub mod loader;
pub mod loaders;
pub mod manifest;

pub use asset::{Asset, AssetKind, LoadOptions};
pub use bundle::Bundle;
pub use cache::Cache;
pub use fs::{DiskFileSystem, FileSystem, MemoryFileSystem};
pub use loader::{LoadContext, Loader};
pub use manifest::{AssetDescriptor, BundleManifest};
