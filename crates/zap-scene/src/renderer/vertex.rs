use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::core::color::Color;

/// Vertex layout shared by sprites, text, shapes and meshes.
/// 36 bytes: position (3 floats), RGBA8 color, texcoord (2 floats), normal (3 floats).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const STRIDE_BYTES: usize = std::mem::size_of::<Vertex>();

    pub fn new(position: Vec3, color: Color, tex_coords: Vec2, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            tex_coords: tex_coords.to_array(),
            normal: normal.to_array(),
        }
    }

    /// White, front-facing 2D vertex.
    pub fn sprite(position: Vec3, tex_coords: Vec2) -> Self {
        Self::new(position, Color::WHITE, tex_coords, Vec3::new(0.0, 0.0, -1.0))
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_has_no_padding() {
        assert_eq!(Vertex::STRIDE_BYTES, 36);
    }

    #[test]
    fn casts_to_bytes() {
        let vertices = [Vertex::sprite(Vec3::ONE, Vec2::ZERO); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 72);
    }
}
