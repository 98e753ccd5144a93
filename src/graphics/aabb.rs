// External imports
use packed_simd::f32x4;
// Local imports
use crate::graphics::ray::Ray;
use crate::math::Vec3;

/// An axis-aligned bounding box, stored as world-space min/max corners.
/// `EMPTY` uses `+inf`/`-inf` sentinels so that `extend`/`join` form a
/// monoid: joining any box with `EMPTY` returns the original box.
#[derive(Copy,Clone,Debug)]
pub struct AABB {
  pub min : Vec3,
  pub max : Vec3
}

impl AABB {
  pub const EMPTY: AABB =
    AABB {
      min: Vec3 { x: std::f32::INFINITY,     y: std::f32::INFINITY,     z: std::f32::INFINITY }
    , max: Vec3 { x: std::f32::NEG_INFINITY, y: std::f32::NEG_INFINITY, z: std::f32::NEG_INFINITY }
    };

  pub fn new( min : Vec3, max : Vec3 ) -> AABB {
    AABB { min, max }
  }

  /// The surface area used by the SAH cost function: `2*(xy+yz+zx)`.
  pub fn area( &self ) -> f32 {
    let e = self.max - self.min;
    2.0 * ( e.x * e.y + e.y * e.z + e.z * e.x )
  }

  pub fn center( &self ) -> Vec3 {
    ( self.min + self.max ) * 0.5
  }

  /// Returns the smallest AABB containing both `self` and a point.
  pub fn extend( &self, v : Vec3 ) -> AABB {
    AABB::new( self.min.min( v ), self.max.max( v ) )
  }

  /// Returns the smallest AABB containing both `self` and `o`.
  pub fn join( &self, o : &AABB ) -> AABB {
    AABB::new( self.min.min( o.min ), self.max.max( o.max ) )
  }

  pub fn contains_point( &self, p : &Vec3 ) -> bool {
    p.x >= self.min.x && p.y >= self.min.y && p.z >= self.min.z &&
    p.x <= self.max.x && p.y <= self.max.y && p.z <= self.max.z
  }

  pub fn contains( &self, o : &AABB ) -> bool {
    self.contains_point( &o.min ) && self.contains_point( &o.max )
  }

  /// Slab-method ray-box intersection on 4-lane SIMD (the 4th lane is
  /// unused padding; only lanes 0..3 feed the final reduction). Returns the
  /// entry distance `tmin` when the ray hits within `max_len`, `+inf`
  /// otherwise.
  pub fn hit( &self, ray : &Ray, max_len : f32 ) -> f32 {
    let origin = f32x4::new( ray.origin.x, ray.origin.y, ray.origin.z, 0.0 );
    let r_dir  = f32x4::new( ray.r_dir.x,  ray.r_dir.y,  ray.r_dir.z,  0.0 );
    let bmin   = f32x4::new( self.min.x,   self.min.y,   self.min.z,   0.0 );
    let bmax   = f32x4::new( self.max.x,   self.max.y,   self.max.z,   0.0 );

    let t1 = ( bmin - origin ) * r_dir;
    let t2 = ( bmax - origin ) * r_dir;

    let tmin_v = t1.min( t2 );
    let tmax_v = t1.max( t2 );

    let tmin = tmin_v.extract( 0 ).max( tmin_v.extract( 1 ) ).max( tmin_v.extract( 2 ) );
    let tmax = tmax_v.extract( 0 ).min( tmax_v.extract( 1 ) ).min( tmax_v.extract( 2 ) );

    if tmax >= tmin && tmin < max_len && tmax > 0.0 {
      tmin
    } else {
      std::f32::INFINITY
    }
  }
}
