// Local imports
use crate::math::Vec3;

/// A half-line in 3-dimensional space.
///
/// Conceptually, it "shoots" from an origin into a direction. The direction
/// must be of unit length. The reciprocal direction is cached and kept in
/// sync whenever the direction changes, since the AABB slab test divides by
/// it on every node visited during traversal.
#[derive(Clone,Copy,Debug)]
pub struct Ray {
  pub origin : Vec3,
  pub dir    : Vec3,
  pub r_dir  : Vec3
}

impl Ray {
  /// Constructs a new `Ray`. `dir` should be of unit length.
  pub fn new( origin : Vec3, dir : Vec3 ) -> Ray {
    Ray { origin, dir, r_dir: reciprocal( dir ) }
  }

  /// Replaces the direction, recomputing the reciprocal direction used by
  /// the slab test.
  pub fn set_dir( &mut self, dir : Vec3 ) {
    self.dir = dir;
    self.r_dir = reciprocal( dir );
  }

  /// Evaluates the ray at the provided distance from its origin.
  pub fn at( &self, distance : f32 ) -> Vec3 {
    self.origin + distance * self.dir
  }
}

fn reciprocal( d : Vec3 ) -> Vec3 {
  Vec3::new( 1.0 / d.x, 1.0 / d.y, 1.0 / d.z )
}

/// The result of intersecting a ray with the scene: the hit distance, the
/// interpolated geometric normal (already flipped to face the ray), the
/// barycentric coordinates `(1-u-v, u, v)`, and the triangle's index in the
/// original (pre-BVH-reorder) triangle array, used to attribute the
/// material and to let callers pass `ignore_triangle` on secondary rays.
#[derive(Clone,Copy,Debug)]
pub struct RaycastHit {
  pub distance    : f32,
  pub normal      : Vec3,
  pub barycentric : Vec3,
  pub triangle    : u32,
  pub is_entering : bool
}
