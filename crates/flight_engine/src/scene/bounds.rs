//! Local-space bounding volumes and their frustum tests
//!
//! Volumes are stored in model space and never cached in world space: every
//! global test rebuilds the transformed shape from the entity's current model
//! matrix. Culling is conservative, so a volume straddling a plane counts as
//! visible.

use crate::foundation::math::{utils, Mat4Ext, Vec3};

use super::error::GeometryError;
use super::frustum::{Frustum, Plane};
use super::transform::Transform;

/// Which volume to generate for a new entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundingKind {
    /// Bounding sphere around the vertex box
    Sphere,
    /// Axis-aligned box with per-axis extents
    #[default]
    Aabb,
    /// Axis-aligned cube using the largest extent
    SquareAabb,
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center in model space
    pub center: Vec3,
    /// Radius in model space
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around the min/max box of `points`
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Result<Self, GeometryError> {
        let bounds = Aabb::from_points(points)?;
        Ok(Self::new(bounds.center, bounds.extents.norm()))
    }

    /// Signed distance to the plane is at least `-radius`
    pub fn is_on_or_forward_plane(&self, plane: &Plane) -> bool {
        plane.signed_distance(&self.center) >= -self.radius
    }

    /// Test the sphere after moving it into the transform's global space
    pub fn is_on_frustum(&self, frustum: &Frustum, transform: &Transform) -> bool {
        let global_scale = transform.global_scale();
        let global_center = transform.model_matrix().transform_point3(&self.center);

        // Non-uniform scale: wrap with the largest axis
        let max_scale = global_scale.x.max(global_scale.y).max(global_scale.z);
        let global_sphere = Self::new(global_center, self.radius * max_scale);

        // Side planes first, they reject the most
        global_sphere.is_on_or_forward_plane(&frustum.left)
            && global_sphere.is_on_or_forward_plane(&frustum.right)
            && global_sphere.is_on_or_forward_plane(&frustum.far)
            && global_sphere.is_on_or_forward_plane(&frustum.near)
            && global_sphere.is_on_or_forward_plane(&frustum.top)
            && global_sphere.is_on_or_forward_plane(&frustum.bottom)
    }
}

/// Axis-aligned bounding box stored as center and half-extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Box center
    pub center: Vec3,
    /// Half-size along each axis
    pub extents: Vec3,
}

impl Aabb {
    /// Box from center and half-extents
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Box from its minimum and maximum corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Result<Self, GeometryError> {
        if !utils::is_finite(&min) || !utils::is_finite(&max) {
            return Err(GeometryError::NonFinite("bounding box"));
        }
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(GeometryError::InvertedBounds {
                min: min.into(),
                max: max.into(),
            });
        }
        let center = (max + min) * 0.5;
        Ok(Self::new(center, max - center))
    }

    /// Tightest box around a point cloud
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Result<Self, GeometryError> {
        let mut points = points.into_iter();
        let first = points.next().ok_or(GeometryError::EmptyPointSet)?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));
        Self::from_min_max(min, max)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// The eight corners
    pub fn vertices(&self) -> [Vec3; 8] {
        let (c, e) = (self.center, self.extents);
        [
            Vec3::new(c.x - e.x, c.y - e.y, c.z - e.z),
            Vec3::new(c.x + e.x, c.y - e.y, c.z - e.z),
            Vec3::new(c.x - e.x, c.y + e.y, c.z - e.z),
            Vec3::new(c.x + e.x, c.y + e.y, c.z - e.z),
            Vec3::new(c.x - e.x, c.y - e.y, c.z + e.z),
            Vec3::new(c.x + e.x, c.y - e.y, c.z + e.z),
            Vec3::new(c.x - e.x, c.y + e.y, c.z + e.z),
            Vec3::new(c.x + e.x, c.y + e.y, c.z + e.z),
        ]
    }

    /// Projection interval radius onto the plane normal stays on the positive side
    pub fn is_on_or_forward_plane(&self, plane: &Plane) -> bool {
        let n = plane.normal();
        let r = self.extents.x * n.x.abs() + self.extents.y * n.y.abs() + self.extents.z * n.z.abs();
        -r <= plane.signed_distance(&self.center)
    }

    /// World-space box enclosing this box under the transform's model matrix
    pub fn to_global(&self, transform: &Transform) -> Self {
        let global_center = transform.model_matrix().transform_point3(&self.center);

        // Scaled orientation
        let right = transform.right() * self.extents.x;
        let up = transform.up() * self.extents.y;
        let forward = transform.forward() * self.extents.z;

        Self::new(global_center, world_axis_extents(&right, &up, &forward))
    }

    /// Test the box after moving it into the transform's global space
    pub fn is_on_frustum(&self, frustum: &Frustum, transform: &Transform) -> bool {
        let global_aabb = self.to_global(transform);
        frustum.planes().iter().all(|plane| global_aabb.is_on_or_forward_plane(plane))
    }
}

/// Axis-aligned cube stored as center and one extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareAabb {
    /// Cube center
    pub center: Vec3,
    /// Half-size shared by all three axes
    pub extent: f32,
}

impl SquareAabb {
    /// Create a new cube
    pub fn new(center: Vec3, extent: f32) -> Self {
        Self { center, extent }
    }

    /// Cube around the min/max box of `points`, sized by its largest extent
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Result<Self, GeometryError> {
        let bounds = Aabb::from_points(points)?;
        Ok(Self::new(bounds.center, bounds.extents.max()))
    }

    /// Same as [`Aabb::is_on_or_forward_plane`] with equal extents
    pub fn is_on_or_forward_plane(&self, plane: &Plane) -> bool {
        let n = plane.normal();
        let r = self.extent * (n.x.abs() + n.y.abs() + n.z.abs());
        -r <= plane.signed_distance(&self.center)
    }

    /// Test the cube after moving it into the transform's global space
    pub fn is_on_frustum(&self, frustum: &Frustum, transform: &Transform) -> bool {
        let global_center = transform.model_matrix().transform_point3(&self.center);

        let right = transform.right() * self.extent;
        let up = transform.up() * self.extent;
        let forward = transform.forward() * self.extent;

        let global = Self::new(global_center, world_axis_extents(&right, &up, &forward).max());
        frustum.planes().iter().all(|plane| global.is_on_or_forward_plane(plane))
    }
}

/// Project three scaled basis vectors onto the world axes
fn world_axis_extents(right: &Vec3, up: &Vec3, forward: &Vec3) -> Vec3 {
    Vec3::new(
        right.x.abs() + up.x.abs() + forward.x.abs(),
        right.y.abs() + up.y.abs() + forward.y.abs(),
        right.z.abs() + up.z.abs() + forward.z.abs(),
    )
}

/// Closed set of bounding shapes an entity can carry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// Sphere
    Sphere(Sphere),
    /// Box with per-axis extents
    Aabb(Aabb),
    /// Cube
    SquareAabb(SquareAabb),
}

impl BoundingVolume {
    /// Generate a volume of the requested kind around `points`
    pub fn from_points(
        kind: BoundingKind,
        points: impl IntoIterator<Item = Vec3>,
    ) -> Result<Self, GeometryError> {
        Ok(match kind {
            BoundingKind::Sphere => Self::Sphere(Sphere::from_points(points)?),
            BoundingKind::Aabb => Self::Aabb(Aabb::from_points(points)?),
            BoundingKind::SquareAabb => Self::SquareAabb(SquareAabb::from_points(points)?),
        })
    }

    /// The shape's kind
    pub fn kind(&self) -> BoundingKind {
        match self {
            Self::Sphere(_) => BoundingKind::Sphere,
            Self::Aabb(_) => BoundingKind::Aabb,
            Self::SquareAabb(_) => BoundingKind::SquareAabb,
        }
    }

    /// Model-space center
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Sphere(s) => s.center,
            Self::Aabb(b) => b.center,
            Self::SquareAabb(b) => b.center,
        }
    }

    /// Whether the untransformed shape reaches the positive side of `plane`
    pub fn is_on_or_forward_plane(&self, plane: &Plane) -> bool {
        match self {
            Self::Sphere(s) => s.is_on_or_forward_plane(plane),
            Self::Aabb(b) => b.is_on_or_forward_plane(plane),
            Self::SquareAabb(b) => b.is_on_or_forward_plane(plane),
        }
    }

    /// Frustum test in global space using the entity's current model matrix
    pub fn is_on_frustum(&self, frustum: &Frustum, transform: &Transform) -> bool {
        match self {
            Self::Sphere(s) => s.is_on_frustum(frustum, transform),
            Self::Aabb(b) => b.is_on_frustum(frustum, transform),
            Self::SquareAabb(b) => b.is_on_frustum(frustum, transform),
        }
    }

    /// Frustum test of the shape as stored, without any transform
    pub fn is_on_frustum_local(&self, frustum: &Frustum) -> bool {
        frustum.planes().iter().all(|plane| self.is_on_or_forward_plane(plane))
    }

    /// Model-space box enclosing the shape
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Self::Sphere(s) => Aabb::new(s.center, Vec3::repeat(s.radius)),
            Self::Aabb(b) => *b,
            Self::SquareAabb(b) => Aabb::new(b.center, Vec3::repeat(b.extent)),
        }
    }
}
