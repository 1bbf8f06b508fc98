//! Scene core: transforms, bounding volumes, the view frustum and the entity graph
//!
//! Everything here is single-threaded and frame-stepped. Within a frame the
//! graph is updated top-down before any bounding volume is tested, so each
//! test sees the entity's current global matrix.

pub mod bounds;
pub mod error;
pub mod frustum;
pub mod graph;
pub mod transform;

pub use bounds::{Aabb, BoundingKind, BoundingVolume, Sphere, SquareAabb};
pub use error::{GeometryError, SceneError};
pub use frustum::{Frustum, Plane};
pub use graph::{DrawCounters, EntityId, SceneGraph};
pub use transform::Transform;
