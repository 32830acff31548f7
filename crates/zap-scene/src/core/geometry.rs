use glam::{Mat4, Vec2, Vec3};

/// Axis-aligned bounding box. An inverted box (min > max) is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Box that contains nothing; inserting a point makes it a point box.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanning a 2D rectangle at z = 0.
    pub fn from_rect(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.extend(0.0),
            max: max.extend(0.0),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.insert_point(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    pub fn insert_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Point containment on the XY plane, edges inclusive.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Four XY corners in counter-clockwise order.
    pub fn corners_2d(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.min.x, self.min.y),
            Vec2::new(self.max.x, self.min.y),
            Vec2::new(self.max.x, self.max.y),
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Axis-aligned rectangle given by its bottom-left corner and size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    pub fn bottom(&self) -> f32 {
        self.position.y
    }

    pub fn top(&self) -> f32 {
        self.position.y + self.size.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.bottom()
            && point.y <= self.top()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.bottom() <= other.top()
            && self.top() >= other.bottom()
    }
}

/// Apply an affine transform to a 2D point (z = 0, w = 1).
pub fn transform_point2(matrix: &Mat4, point: Vec2) -> Vec2 {
    matrix.transform_point3(point.extend(0.0)).truncate()
}

/// Invert `matrix`, falling back to identity when it is singular.
pub fn inverse_or_identity(matrix: &Mat4) -> Mat4 {
    let det = matrix.determinant();
    if det == 0.0 || !det.is_finite() {
        log::warn!("Singular transform, using identity inverse");
        Mat4::IDENTITY
    } else {
        matrix.inverse()
    }
}

/// Separating-axis overlap test between a convex polygon and an XY box.
///
/// An empty box never overlaps. A polygon with fewer than three points is
/// treated as its point/segment set and still tested on the box axes and its
/// own edge normals.
pub fn polygon_overlaps_box(polygon: &[Vec2], aabb: &Aabb) -> bool {
    if aabb.is_empty() || polygon.is_empty() {
        return false;
    }

    let corners = aabb.corners_2d();

    let separated = |axis: Vec2| -> bool {
        if axis.length_squared() == 0.0 {
            return false;
        }
        let (a_min, a_max) = project(&corners, axis);
        let (b_min, b_max) = project(polygon, axis);
        a_max < b_min || b_max < a_min
    };

    if separated(Vec2::X) || separated(Vec2::Y) {
        return false;
    }

    for (i, &start) in polygon.iter().enumerate() {
        let end = polygon[(i + 1) % polygon.len()];
        let edge = end - start;
        if separated(edge.perp()) {
            return false;
        }
    }

    true
}

fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}
