use std::sync::Arc;

use glam::Vec2;

use super::texture::Texture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitterType {
    #[default]
    Gravity,
    Radius,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionType {
    #[default]
    Free,
    /// Relative to the parent node.
    Parent,
    Grouped,
}

/// Particle emitter definition. All values default to zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSystemData {
    pub name: String,

    pub blend_func_source: u32,
    pub blend_func_destination: u32,

    pub emitter_type: EmitterType,
    pub max_particles: u32,
    pub duration: f32,
    pub particle_lifespan: f32,
    pub particle_lifespan_variance: f32,

    pub speed: f32,
    pub speed_variance: f32,

    pub source_position: Vec2,
    pub source_position_variance: Vec2,
    pub position_type: PositionType,

    pub start_particle_size: f32,
    pub start_particle_size_variance: f32,
    pub finish_particle_size: f32,
    pub finish_particle_size_variance: f32,

    pub angle: f32,
    pub angle_variance: f32,

    pub start_rotation: f32,
    pub start_rotation_variance: f32,
    pub finish_rotation: f32,
    pub finish_rotation_variance: f32,
    pub rotate_per_second: f32,
    pub rotate_per_second_variance: f32,

    pub min_radius: f32,
    pub min_radius_variance: f32,
    pub max_radius: f32,
    pub max_radius_variance: f32,

    pub radial_acceleration: f32,
    pub radial_accel_variance: f32,
    pub tangential_acceleration: f32,
    pub tangential_accel_variance: f32,

    pub absolute_position: bool,
    pub y_coord_flipped: bool,
    pub rotation_is_dir: bool,

    pub gravity: Vec2,

    /// RGBA, normalized.
    pub start_color: [f32; 4],
    pub start_color_variance: [f32; 4],
    pub finish_color: [f32; 4],
    pub finish_color_variance: [f32; 4],

    /// Particles per second; always derived, never read from a file.
    pub emission_rate: f32,
    pub texture: Option<Arc<Texture>>,
}

impl ParticleSystemData {
    /// `max_particles / particle_lifespan`, or 0 for a non-positive lifespan.
    pub fn derive_emission_rate(&mut self) {
        self.emission_rate = if self.particle_lifespan > 0.0 {
            self.max_particles as f32 / self.particle_lifespan
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emission_rate_from_lifespan() {
        let mut data = ParticleSystemData {
            max_particles: 100,
            particle_lifespan: 2.0,
            ..Default::default()
        };
        data.derive_emission_rate();
        assert!((data.emission_rate - 50.0).abs() < 1e-6);
    }

    #[test]
    fn zero_lifespan_gives_zero_rate() {
        let mut data = ParticleSystemData {
            max_particles: 100,
            ..Default::default()
        };
        data.derive_emission_rate();
        assert_eq!(data.emission_rate, 0.0);
    }
}
