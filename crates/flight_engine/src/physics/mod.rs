//! Collision detection between scene entities

pub mod collision;

pub use collision::{aabb_overlap, aabb_separation, check_collision, colliding_entities};
