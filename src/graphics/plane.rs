use crate::graphics::aabb::AABB;
use crate::math::Vec3;

/// A plane in Hessian normal form: points `p` with `normal.dot(p) + d == 0`
/// lie on the plane; `normal.dot(p) + d > 0` lies on the side `normal`
/// points toward.
#[derive(Copy,Clone,Debug)]
pub struct Plane {
  pub normal : Vec3,
  pub d : f32
}

impl Plane {
  pub fn new( normal : Vec3, d : f32 ) -> Plane {
    Plane { normal, d }
  }

  /// Builds a plane through `point` with the given (not necessarily unit)
  /// `normal`.
  pub fn from_point_normal( point : Vec3, normal : Vec3 ) -> Plane {
    Plane { normal, d: -normal.dot( point ) }
  }

  pub fn normalize( &self ) -> Plane {
    let len = self.normal.len( );
    Plane { normal: self.normal * ( 1.0 / len ), d: self.d / len }
  }

  /// Signed distance from `p` to the plane, positive on the side `normal`
  /// points toward. Only meaningful when `normal` is unit length.
  pub fn distance( &self, p : Vec3 ) -> f32 {
    self.normal.dot( p ) + self.d
  }
}

/// Six inward-facing planes bounding a view frustum, in the order left,
/// right, top, bottom, near, far.
#[derive(Copy,Clone,Debug)]
pub struct Frustum {
  pub planes : [ Plane; 6 ]
}

impl Frustum {
  /// Builds a frustum from a camera basis and symmetric FOV, matching the
  /// corner construction used by the path integrator's own viewport setup
  /// (4.G): `right`/`up`/`forward` must already be orthonormal.
  pub fn from_camera( pos : Vec3, forward : Vec3, up : Vec3, right : Vec3, h_fov : f32, v_fov : f32, near : f32, far : f32 ) -> Frustum {
    let half_h = ( h_fov * 0.5 ).tan( );
    let half_v = ( v_fov * 0.5 ).tan( );

    let left_normal   = ( forward - right * half_h ).cross( up ).normalize( );
    let right_normal  = up.cross( forward + right * half_h ).normalize( );
    let bottom_normal = right.cross( forward - up * half_v ).normalize( );
    let top_normal    = ( forward + up * half_v ).cross( right ).normalize( );

    Frustum {
      planes: [
        Plane::from_point_normal( pos, left_normal )
      , Plane::from_point_normal( pos, right_normal )
      , Plane::from_point_normal( pos, top_normal )
      , Plane::from_point_normal( pos, bottom_normal )
      , Plane::from_point_normal( pos + forward * near, forward )
      , Plane::from_point_normal( pos + forward * far, -forward )
      ]
    }
  }

  /// True if `point` lies on the inward side of every plane.
  pub fn contains_point( &self, point : Vec3 ) -> bool {
    self.planes.iter( ).all( | p | p.distance( point ) > 0.0 )
  }

  /// Conservative box/frustum overlap test: for each plane, the AABB corner
  /// furthest along the plane's normal must be on the inward side, else the
  /// whole box is culled.
  pub fn overlaps_aabb( &self, aabb : &AABB ) -> bool {
    self.planes.iter( ).all( | p | {
      let furthest = Vec3::new(
        if p.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x }
      , if p.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y }
      , if p.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z }
      );
      p.distance( furthest ) > 0.0
    } )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plane_distance_sign( ) {
    let plane = Plane::from_point_normal( Vec3::new( 0.0, 0.0, 0.0 ), Vec3::new( 0.0, 1.0, 0.0 ) );
    assert!( plane.distance( Vec3::new( 0.0, 1.0, 0.0 ) ) > 0.0 );
    assert!( plane.distance( Vec3::new( 0.0, -1.0, 0.0 ) ) < 0.0 );
  }

  #[test]
  fn frustum_contains_point_on_axis( ) {
    let frustum = Frustum::from_camera(
      Vec3::new( 0.0, 0.0, 0.0 ), Vec3::new( 0.0, 0.0, -1.0 ), Vec3::new( 0.0, 1.0, 0.0 ), Vec3::new( 1.0, 0.0, 0.0 )
    , std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2, 0.1, 100.0
    );
    assert!( frustum.contains_point( Vec3::new( 0.0, 0.0, -5.0 ) ) );
    assert!( !frustum.contains_point( Vec3::new( 0.0, 0.0, 5.0 ) ) );
  }

  #[test]
  fn frustum_overlaps_aabb_inside( ) {
    let frustum = Frustum::from_camera(
      Vec3::new( 0.0, 0.0, 0.0 ), Vec3::new( 0.0, 0.0, -1.0 ), Vec3::new( 0.0, 1.0, 0.0 ), Vec3::new( 1.0, 0.0, 0.0 )
    , std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2, 0.1, 100.0
    );
    let inside = AABB::new( Vec3::new( -0.5, -0.5, -5.5 ), Vec3::new( 0.5, 0.5, -4.5 ) );
    assert!( frustum.overlaps_aabb( &inside ) );

    let behind = AABB::new( Vec3::new( -0.5, -0.5, 4.5 ), Vec3::new( 0.5, 0.5, 5.5 ) );
    assert!( !frustum.overlaps_aabb( &behind ) );
  }
}
