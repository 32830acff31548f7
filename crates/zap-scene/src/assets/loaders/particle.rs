//! Particle Designer style emitter definitions (JSON).

use glam::Vec2;
use serde::Deserialize;

use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::{LoadError, Result};
use crate::resources::{EmitterType, ParticleSystemData};

/// Boolean written either as `true`/`false` or as a number.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(f64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Number(n) => n != 0.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEmitter {
    texture_file_name: Option<String>,
    config_name: Option<String>,

    blend_func_source: Option<u32>,
    blend_func_destination: Option<u32>,
    emitter_type: Option<u32>,
    max_particles: Option<u32>,

    duration: Option<f32>,
    particle_lifespan: Option<f32>,
    particle_lifespan_variance: Option<f32>,
    speed: Option<f32>,
    speed_variance: Option<f32>,

    absolute_position: Option<Flag>,
    y_coord_flipped: Option<u32>,

    #[serde(rename = "sourcePositionx")]
    source_position_x: Option<f32>,
    #[serde(rename = "sourcePositiony")]
    source_position_y: Option<f32>,
    #[serde(rename = "sourcePositionVariancex")]
    source_position_variance_x: Option<f32>,
    #[serde(rename = "sourcePositionVariancey")]
    source_position_variance_y: Option<f32>,

    start_particle_size: Option<f32>,
    start_particle_size_variance: Option<f32>,
    finish_particle_size: Option<f32>,
    finish_particle_size_variance: Option<f32>,
    angle: Option<f32>,
    angle_variance: Option<f32>,
    rotation_start: Option<f32>,
    rotation_start_variance: Option<f32>,
    rotation_end: Option<f32>,
    rotation_end_variance: Option<f32>,
    rotate_per_second: Option<f32>,
    rotate_per_second_variance: Option<f32>,

    min_radius: Option<f32>,
    min_radius_variance: Option<f32>,
    max_radius: Option<f32>,
    max_radius_variance: Option<f32>,

    radial_acceleration: Option<f32>,
    radial_accel_variance: Option<f32>,
    tangential_acceleration: Option<f32>,
    tangential_accel_variance: Option<f32>,

    rotation_is_dir: Option<Flag>,

    #[serde(rename = "gravityx")]
    gravity_x: Option<f32>,
    #[serde(rename = "gravityy")]
    gravity_y: Option<f32>,

    start_color_red: Option<f32>,
    start_color_green: Option<f32>,
    start_color_blue: Option<f32>,
    start_color_alpha: Option<f32>,
    start_color_variance_red: Option<f32>,
    start_color_variance_green: Option<f32>,
    start_color_variance_blue: Option<f32>,
    start_color_variance_alpha: Option<f32>,
    finish_color_red: Option<f32>,
    finish_color_green: Option<f32>,
    finish_color_blue: Option<f32>,
    finish_color_alpha: Option<f32>,
    finish_color_variance_red: Option<f32>,
    finish_color_variance_green: Option<f32>,
    finish_color_variance_blue: Option<f32>,
    finish_color_variance_alpha: Option<f32>,
}

fn rgba(r: Option<f32>, g: Option<f32>, b: Option<f32>, a: Option<f32>) -> [f32; 4] {
    [
        r.unwrap_or_default(),
        g.unwrap_or_default(),
        b.unwrap_or_default(),
        a.unwrap_or_default(),
    ]
}

impl RawEmitter {
    /// Everything except the texture, which needs the cache.
    fn into_data(self, name: String) -> Result<ParticleSystemData> {
        let emitter_type = match self.emitter_type {
            None | Some(0) => EmitterType::Gravity,
            Some(1) => EmitterType::Radius,
            Some(other) => {
                return Err(LoadError::InvalidValue {
                    field: "emitterType",
                    value: other.to_string(),
                })
            }
        };
        let f = Option::<f32>::unwrap_or_default;

        let mut data = ParticleSystemData {
            name,
            blend_func_source: self.blend_func_source.unwrap_or_default(),
            blend_func_destination: self.blend_func_destination.unwrap_or_default(),
            emitter_type,
            max_particles: self.max_particles.unwrap_or_default(),
            duration: f(self.duration),
            particle_lifespan: f(self.particle_lifespan),
            particle_lifespan_variance: f(self.particle_lifespan_variance),
            speed: f(self.speed),
            speed_variance: f(self.speed_variance),
            absolute_position: self.absolute_position.is_some_and(Flag::is_set),
            y_coord_flipped: self.y_coord_flipped == Some(1),
            source_position: Vec2::new(f(self.source_position_x), f(self.source_position_y)),
            source_position_variance: Vec2::new(
                f(self.source_position_variance_x),
                f(self.source_position_variance_y),
            ),
            start_particle_size: f(self.start_particle_size),
            start_particle_size_variance: f(self.start_particle_size_variance),
            finish_particle_size: f(self.finish_particle_size),
            finish_particle_size_variance: f(self.finish_particle_size_variance),
            angle: f(self.angle),
            angle_variance: f(self.angle_variance),
            start_rotation: f(self.rotation_start),
            start_rotation_variance: f(self.rotation_start_variance),
            finish_rotation: f(self.rotation_end),
            finish_rotation_variance: f(self.rotation_end_variance),
            rotate_per_second: f(self.rotate_per_second),
            rotate_per_second_variance: f(self.rotate_per_second_variance),
            min_radius: f(self.min_radius),
            min_radius_variance: f(self.min_radius_variance),
            max_radius: f(self.max_radius),
            max_radius_variance: f(self.max_radius_variance),
            radial_acceleration: f(self.radial_acceleration),
            radial_accel_variance: f(self.radial_accel_variance),
            tangential_acceleration: f(self.tangential_acceleration),
            tangential_accel_variance: f(self.tangential_accel_variance),
            rotation_is_dir: self.rotation_is_dir.is_some_and(Flag::is_set),
            gravity: Vec2::new(f(self.gravity_x), f(self.gravity_y)),
            start_color: rgba(
                self.start_color_red,
                self.start_color_green,
                self.start_color_blue,
                self.start_color_alpha,
            ),
            start_color_variance: rgba(
                self.start_color_variance_red,
                self.start_color_variance_green,
                self.start_color_variance_blue,
                self.start_color_variance_alpha,
            ),
            finish_color: rgba(
                self.finish_color_red,
                self.finish_color_green,
                self.finish_color_blue,
                self.finish_color_alpha,
            ),
            finish_color_variance: rgba(
                self.finish_color_variance_red,
                self.finish_color_variance_green,
                self.finish_color_variance_blue,
                self.finish_color_variance_alpha,
            ),
            ..ParticleSystemData::default()
        };
        data.derive_emission_rate();
        Ok(data)
    }
}

#[derive(Debug, Default)]
pub struct ParticleSystemLoader;

impl Loader for ParticleSystemLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::ParticleSystem
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let mut raw: RawEmitter = serde_json::from_slice(data)?;
        let texture_file = raw
            .texture_file_name
            .take()
            .ok_or(LoadError::MissingField("textureFileName"))?;
        let config_name = raw.config_name.take().ok_or(LoadError::MissingField("configName"))?;

        let mut particle_data = raw.into_data(config_name)?;

        if ctx.cache.texture(&texture_file).is_none() {
            ctx.load_dependency(AssetKind::Image, &texture_file, &texture_file, options)?;
        }
        particle_data.texture = Some(
            ctx.cache
                .texture(&texture_file)
                .ok_or(LoadError::MissingTexture(texture_file))?,
        );

        ctx.bundle.set_particle_system_data(name, particle_data);
        Ok(())
    }
}
