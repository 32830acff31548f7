use crate::core::geometry::Aabb;
use crate::renderer::vertex::Vertex;

/// Indexed triangle mesh decoded from a model file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMeshData {
    pub bounding_box: Aabb,
    pub indices: Vec<u32>,
    pub vertices: Vec<Vertex>,
    /// Material looked up by name in the cache at draw setup.
    pub material: Option<String>,
}

impl StaticMeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Skinned mesh placeholder kept so the asset kind has a home; no loader
/// produces one yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedMeshData {
    pub bounding_box: Aabb,
    pub indices: Vec<u32>,
    pub vertices: Vec<Vertex>,
    pub material: Option<String>,
}
