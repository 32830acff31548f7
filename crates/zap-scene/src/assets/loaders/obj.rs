//! Wavefront OBJ loader producing one static mesh per object.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::tokenizer::{is_newline, Tokenizer};
use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::core::color::Color;
use crate::core::geometry::Aabb;
use crate::error::{Result, TextError};
use crate::renderer::vertex::Vertex;
use crate::resources::StaticMeshData;

/// Resolve a 1-based OBJ index, where negatives count back from the end.
/// Returns the 0-based position.
fn resolve_index(index: i32, len: usize, kind: &'static str) -> std::result::Result<usize, TextError> {
    let resolved = if index < 0 {
        len as i64 + i64::from(index) + 1
    } else {
        i64::from(index)
    };
    if resolved < 1 || resolved > len as i64 {
        return Err(TextError::InvalidIndex {
            kind,
            index: i64::from(index),
        });
    }
    Ok(resolved as usize - 1)
}

fn parse_vec3(t: &mut Tokenizer<'_>) -> std::result::Result<Vec3, TextError> {
    let mut v = [0.0; 3];
    for component in &mut v {
        t.skip_whitespace();
        *component = t.parse_f32()?;
    }
    Ok(Vec3::from_array(v))
}

/// Mesh under construction. Vertices are shared between faces through
/// `vertex_map`, keyed by the (position, texcoord, normal) triple.
struct ObjectBuilder {
    name: String,
    /// Opened by an explicit `o` record.
    named: bool,
    material: Option<String>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_map: HashMap<(usize, Option<usize>, Option<usize>), u32>,
    bounding_box: Aabb,
}

impl ObjectBuilder {
    fn new(name: &str, named: bool) -> Self {
        Self {
            name: name.to_string(),
            named,
            material: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            vertex_map: HashMap::new(),
            bounding_box: Aabb::EMPTY,
        }
    }

    fn finish(self) -> (String, StaticMeshData) {
        (
            self.name,
            StaticMeshData {
                bounding_box: self.bounding_box,
                indices: self.indices,
                vertices: self.vertices,
                material: self.material,
            },
        )
    }
}

/// Attribute pools shared by every object in the file.
#[derive(Default)]
struct Pools {
    positions: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    normals: Vec<Vec3>,
}

fn parse_face(
    t: &mut Tokenizer<'_>,
    pools: &Pools,
    object: &mut ObjectBuilder,
) -> std::result::Result<(), TextError> {
    let mut face = Vec::new();

    loop {
        t.skip_whitespace();
        if t.at_line_end() {
            break;
        }

        let position = resolve_index(t.parse_i32()?, pools.positions.len(), "position")?;
        let mut tex_coord = None;
        let mut normal = None;
        if t.parse_token(b'/') {
            // `a//c` has no texcoord
            if t.peek().is_some_and(|c| c != b'/') {
                tex_coord = Some(resolve_index(t.parse_i32()?, pools.tex_coords.len(), "texcoord")?);
            }
            if t.parse_token(b'/') {
                normal = Some(resolve_index(t.parse_i32()?, pools.normals.len(), "normal")?);
            }
        }

        let key = (position, tex_coord, normal);
        let index = match object.vertex_map.get(&key) {
            Some(&index) => index,
            None => {
                let index = object.vertices.len() as u32;
                let vertex = Vertex::new(
                    pools.positions[position],
                    Color::WHITE,
                    tex_coord.map_or(Vec2::ZERO, |i| pools.tex_coords[i]),
                    normal.map_or(Vec3::ZERO, |i| pools.normals[i]),
                );
                object.bounding_box.insert_point(pools.positions[position]);
                object.vertices.push(vertex);
                object.vertex_map.insert(key, index);
                index
            }
        };
        face.push(index);
    }

    if face.len() < 3 {
        return Err(TextError::InvalidFaceCount(face.len()));
    }
    // fan around the first vertex
    for i in 0..face.len() - 2 {
        object.indices.extend_from_slice(&[face[0], face[i + 1], face[i + 2]]);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ObjLoader;

impl Loader for ObjLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::StaticMesh
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let mut t = Tokenizer::new(data);
        let mut pools = Pools::default();
        let mut objects = Vec::new();
        let mut current = ObjectBuilder::new(name, false);
        let mut started = false;

        while let Some(c) = t.peek() {
            if is_newline(c) {
                t.advance();
                continue;
            }
            if c == b'#' {
                t.skip_line();
                continue;
            }

            t.skip_whitespace();
            if t.at_line_end() {
                continue;
            }
            let keyword = t.parse_word()?;
            match keyword {
                "mtllib" => {
                    t.skip_whitespace();
                    let file = t.parse_word()?;
                    t.skip_line();
                    ctx.load_dependency(AssetKind::Material, file, file, options)?;
                }
                "usemtl" => {
                    t.skip_whitespace();
                    let material = t.parse_word()?;
                    t.skip_line();
                    if ctx.cache.has_material(material) {
                        current.material = Some(material.to_string());
                    } else {
                        log::warn!("{}: material {} not found", name, material);
                        current.material = None;
                    }
                }
                "o" => {
                    t.skip_whitespace();
                    let object_name = t.parse_word()?;
                    t.skip_line();
                    let previous = std::mem::replace(&mut current, ObjectBuilder::new(object_name, true));
                    // an implicit object with no faces is just the file preamble
                    if started && (previous.named || !previous.indices.is_empty()) {
                        objects.push(previous.finish());
                    }
                }
                "v" => {
                    let position = parse_vec3(&mut t)?;
                    t.skip_line();
                    pools.positions.push(position);
                }
                "vt" => {
                    t.skip_whitespace();
                    let u = t.parse_f32()?;
                    t.skip_whitespace();
                    let v = t.parse_f32()?;
                    t.skip_line();
                    pools.tex_coords.push(Vec2::new(u, v));
                }
                "vn" => {
                    let normal = parse_vec3(&mut t)?;
                    t.skip_line();
                    pools.normals.push(normal);
                }
                "f" => parse_face(&mut t, &pools, &mut current)?,
                _ => t.skip_line(),
            }
            started = true;
        }

        if started {
            objects.push(current.finish());
        }

        for (object_name, mesh) in objects {
            log::debug!(
                "{}: object {} with {} triangles",
                name,
                object_name,
                mesh.triangle_count()
            );
            ctx.bundle.set_static_mesh_data(object_name, mesh);
        }
        Ok(())
    }
}
