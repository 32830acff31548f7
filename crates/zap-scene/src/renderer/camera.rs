use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::core::geometry::{inverse_or_identity, Aabb, Rect};

/// How the target content size is fitted into the render area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ScaleMode {
    /// Content scale follows the render area on each axis independently.
    #[default]
    NoScale,
    /// Content is stretched to the render area (scale 1 on both axes).
    ExactFit,
    /// Uniform scale that covers the render area; content may be cropped.
    NoBorder,
    /// Uniform scale that shows all content; borders may appear.
    ShowAll,
}

/// Orthographic 2D camera.
/// Origin at the center of the view, Y-up, Z in [-1, 1].
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec2,
    rotation: f32,
    zoom: f32,
    /// Normalized viewport within the render area.
    viewport: Rect,
    render_size: Vec2,
    target_content_size: Vec2,
    scale_mode: ScaleMode,
    content_size: Vec2,
    content_scale: Vec2,
    projection: Mat4,
}

impl Camera {
    pub const MIN_ZOOM: f32 = 0.1;

    pub fn new(render_size: Vec2) -> Self {
        let mut camera = Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            zoom: 1.0,
            viewport: Rect::new(0.0, 0.0, 1.0, 1.0),
            render_size,
            target_content_size: Vec2::ZERO,
            scale_mode: ScaleMode::NoScale,
            content_size: render_size,
            content_scale: Vec2::ONE,
            projection: Mat4::IDENTITY,
        };
        camera.recalculate_projection();
        camera
    }

    /// Camera that fits `target_content_size` into `render_size` with `scale_mode`.
    pub fn with_content(render_size: Vec2, target_content_size: Vec2, scale_mode: ScaleMode) -> Self {
        let mut camera = Self::new(render_size);
        camera.target_content_size = target_content_size;
        camera.scale_mode = scale_mode;
        camera.recalculate_projection();
        camera
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set zoom, clamped to at least [`Camera::MIN_ZOOM`].
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(Self::MIN_ZOOM);
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.recalculate_projection();
    }

    pub fn render_size(&self) -> Vec2 {
        self.render_size
    }

    /// Resize the render area (e.g. on window or render target resize).
    pub fn set_render_size(&mut self, render_size: Vec2) {
        self.render_size = render_size;
        self.recalculate_projection();
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn set_scale_mode(&mut self, scale_mode: ScaleMode) {
        self.scale_mode = scale_mode;
        self.recalculate_projection();
    }

    pub fn target_content_size(&self) -> Vec2 {
        self.target_content_size
    }

    pub fn set_target_content_size(&mut self, size: Vec2) {
        self.target_content_size = size;
        self.recalculate_projection();
    }

    /// Size of the visible area in world units (before zoom).
    pub fn content_size(&self) -> Vec2 {
        self.content_size
    }

    /// Render pixels per content unit.
    pub fn content_scale(&self) -> Vec2 {
        self.content_scale
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    fn recalculate_projection(&mut self) {
        let viewport_size = self.render_size * self.viewport.size;
        if viewport_size.x <= 0.0 || viewport_size.y <= 0.0 {
            return;
        }

        if self.target_content_size.x > 0.0 && self.target_content_size.y > 0.0 {
            let mut scale = viewport_size / self.target_content_size;
            match self.scale_mode {
                ScaleMode::NoScale => {}
                ScaleMode::ExactFit => scale = Vec2::ONE,
                ScaleMode::NoBorder => scale = Vec2::splat(scale.max_element()),
                ScaleMode::ShowAll => scale = Vec2::splat(scale.min_element()),
            }
            self.content_scale = scale;
            self.content_size = viewport_size / scale;
        } else {
            self.content_scale = Vec2::ONE;
            self.content_size = viewport_size;
        }

        let half = self.content_size * 0.5;
        self.projection = Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, -1.0, 1.0);
    }

    /// World-to-view transform: zoom, then rotate, then move to the camera position.
    pub fn view(&self) -> Mat4 {
        Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0))
            * Mat4::from_rotation_z(-self.rotation)
            * Mat4::from_translation(-self.position.extend(0.0))
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }

    pub fn inverse_view_projection(&self) -> Mat4 {
        inverse_or_identity(&self.view_projection())
    }

    /// Convert a window-normalized position (origin top-left, Y down) to world space.
    pub fn convert_normalized_to_world(&self, normalized: Vec2) -> Vec2 {
        let vp = self.viewport;
        let clip = Vec3::new(
            ((normalized.x - vp.position.x) / vp.size.x - 0.5) * 2.0,
            (((1.0 - normalized.y) - vp.position.y) / vp.size.y - 0.5) * 2.0,
            0.0,
        );
        self.inverse_view_projection().transform_point3(clip).truncate()
    }

    /// Convert a world position to window-normalized space.
    pub fn convert_world_to_normalized(&self, world: Vec2) -> Vec2 {
        let vp = self.viewport;
        let clip = self.view_projection().transform_point3(world.extend(0.0));
        Vec2::new(
            (clip.x / 2.0 + 0.5) * vp.size.x + vp.position.x,
            1.0 - ((clip.y / 2.0 + 0.5) * vp.size.y + vp.position.y),
        )
    }

    /// Whether `aabb` under `box_transform` overlaps the view.
    ///
    /// The box center is projected into normalized view space and tested
    /// against the unit rectangle grown by the box half-extent, so rotated
    /// and scaled boxes are covered conservatively.
    pub fn check_visibility(&self, box_transform: &Mat4, aabb: &Aabb) -> bool {
        let view_projection = self.view_projection();
        let diff = (aabb.max - aabb.min).truncate();
        let center = Vec3::new(aabb.min.x + diff.x / 2.0, aabb.min.y + diff.y / 2.0, 0.0);
        let world_center = box_transform.transform_point3(center);

        let clip = view_projection * Vec4::new(world_center.x, world_center.y, world_center.z, 1.0);
        if clip.w == 0.0 {
            return false;
        }
        let normalized = Vec2::new((clip.x / clip.w + 1.0) * 0.5, (clip.y / clip.w + 1.0) * 0.5);

        let half = diff / 2.0;
        let m = box_transform;
        let mut half_world = Vec2::new(
            (half.x * m.x_axis.x + half.y * m.y_axis.x)
                .abs()
                .max((half.x * m.x_axis.x - half.y * m.y_axis.x).abs()),
            (half.x * m.x_axis.y + half.y * m.y_axis.y)
                .abs()
                .max((half.x * m.x_axis.y - half.y * m.y_axis.y).abs()),
        );
        half_world.x *= (view_projection.x_axis.x.abs() + view_projection.y_axis.x.abs()) / 2.0;
        half_world.y *= (view_projection.x_axis.y.abs() + view_projection.y_axis.y.abs()) / 2.0;

        let bounds = Rect::new(
            -half_world.x,
            -half_world.y,
            1.0 + half_world.x * 2.0,
            1.0 + half_world.y * 2.0,
        );
        bounds.contains_point(normalized)
    }
}
