use crate::math::{Vec2, Vec3};
use crate::graphics::ray::RaycastHit;
use crate::math::EPSILON;

/// A triangle in world space: three vertex positions, normals, tangents,
/// bitangents and UVs, plus a precomputed centroid and an 8-bit material
/// index. Immutable after scene load.
#[derive(Debug,Clone,Copy)]
pub struct Triangle {
  pub v : [ Vec3; 3 ],
  pub n : [ Vec3; 3 ],
  pub t : [ Vec3; 3 ],
  pub b : [ Vec3; 3 ],
  pub uv : [ Vec2; 3 ],
  pub centroid : Vec3,
  pub material_index : u8
}

impl Triangle {
  /// Constructs a triangle, deriving tangent/bitangent from UV deltas when
  /// `uv` is `Some`. A degenerate UV mapping (`|det| < 1e-6`) leaves
  /// tangent/bitangent at zero rather than producing a NaN frame.
  pub fn new( v : [ Vec3; 3 ], n : [ Vec3; 3 ], uv : Option< [ Vec2; 3 ] >, material_index : u8 ) -> Triangle {
    let centroid = ( v[ 0 ] + v[ 1 ] + v[ 2 ] ) * ( 1.0 / 3.0 );
    let uv = uv.unwrap_or( [ Vec2::ZERO; 3 ] );

    let ( tangent, bitangent ) = generate_tangent_bitangent( &v, &uv );

    Triangle {
      v, n
    , t: [ tangent; 3 ]
    , b: [ bitangent; 3 ]
    , uv
    , centroid
    , material_index
    }
  }

  pub fn geometric_normal( &self ) -> Vec3 {
    ( self.v[ 1 ] - self.v[ 0 ] ).cross( self.v[ 2 ] - self.v[ 0 ] ).normalize( )
  }

  pub fn square_area( &self ) -> f32 {
    let e1 = self.v[ 1 ] - self.v[ 0 ];
    let e2 = self.v[ 2 ] - self.v[ 0 ];
    0.5 * e1.cross( e2 ).len( )
  }

  /// Möller–Trumbore ray-triangle intersection. Barycentrics are reported
  /// as `(1-u-v, u, v)`.
  pub fn intersect( &self, origin : Vec3, dir : Vec3, max_len : f32 ) -> Option< RaycastHit > {
    let e1 = self.v[ 1 ] - self.v[ 0 ];
    let e2 = self.v[ 2 ] - self.v[ 0 ];

    let pvec = dir.cross( e2 );
    let det = e1.dot( pvec );

    if det.abs( ) < 1e-6 {
      return None;
    }

    let inv_det = 1.0 / det;
    let tvec = origin - self.v[ 0 ];
    let u = tvec.dot( pvec ) * inv_det;
    if u < 0.0 || u > 1.0 {
      return None;
    }

    let qvec = tvec.cross( e1 );
    let v = dir.dot( qvec ) * inv_det;
    if v < 0.0 || u + v > 1.0 {
      return None;
    }

    let t = e2.dot( qvec ) * inv_det;
    if t <= EPSILON || t >= max_len {
      return None;
    }

    let mut normal = self.geometric_normal( );
    let is_entering = dir.dot( normal ) < 0.0;
    if !is_entering {
      normal = -normal;
    }

    Some( RaycastHit {
      distance: t
    , normal
    , barycentric: Vec3::new( 1.0 - u - v, u, v )
    , triangle: 0 // filled in by the caller, which knows the original index
    , is_entering
    } )
  }

  pub fn interpolate_normal( &self, bary : Vec3 ) -> Vec3 {
    ( self.n[ 0 ] * bary.x + self.n[ 1 ] * bary.y + self.n[ 2 ] * bary.z ).normalize( )
  }

  pub fn interpolate_uv( &self, bary : Vec3 ) -> Vec2 {
    Vec2::new(
      self.uv[ 0 ].x * bary.x + self.uv[ 1 ].x * bary.y + self.uv[ 2 ].x * bary.z
    , self.uv[ 0 ].y * bary.x + self.uv[ 1 ].y * bary.y + self.uv[ 2 ].y * bary.z
    )
  }

  pub fn interpolate_tangent( &self, bary : Vec3 ) -> Vec3 {
    self.t[ 0 ] * bary.x + self.t[ 1 ] * bary.y + self.t[ 2 ] * bary.z
  }

  pub fn interpolate_bitangent( &self, bary : Vec3 ) -> Vec3 {
    self.b[ 0 ] * bary.x + self.b[ 1 ] * bary.y + self.b[ 2 ] * bary.z
  }
}

/// Derives a tangent/bitangent pair from the UV deltas of a triangle. Left
/// untouched (zero) when the UV parameterization is degenerate.
fn generate_tangent_bitangent( v : &[ Vec3; 3 ], uv : &[ Vec2; 3 ] ) -> ( Vec3, Vec3 ) {
  let e1 = v[ 1 ] - v[ 0 ];
  let e2 = v[ 2 ] - v[ 0 ];
  let duv1 = uv[ 1 ] - uv[ 0 ];
  let duv2 = uv[ 2 ] - uv[ 0 ];

  let det = duv1.x * duv2.y - duv2.x * duv1.y;
  if det.abs( ) < 1e-6 {
    return ( Vec3::ZERO, Vec3::ZERO );
  }

  let f = 1.0 / det;
  let tangent   = ( e1 * duv2.y - e2 * duv1.y ) * f;
  let bitangent = ( e2 * duv1.x - e1 * duv2.x ) * f;

  ( tangent, bitangent )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unit_tri( ) -> Triangle {
    let v = [ Vec3::new( 0.0, 0.0, 0.0 ), Vec3::new( 1.0, 0.0, 0.0 ), Vec3::new( 0.0, 1.0, 0.0 ) ];
    let n = [ Vec3::new( 0.0, 0.0, 1.0 ); 3 ];
    let uv = [ Vec2::new( 0.0, 0.0 ), Vec2::new( 1.0, 0.0 ), Vec2::new( 0.0, 1.0 ) ];
    Triangle::new( v, n, Some( uv ), 0 )
  }

  #[test]
  fn intersects_straight_on( ) {
    let tri = unit_tri( );
    let origin = Vec3::new( 0.2, 0.2, 1.0 );
    let dir = Vec3::new( 0.0, 0.0, -1.0 );
    let hit = tri.intersect( origin, dir, std::f32::INFINITY ).expect( "should hit" );
    assert!( ( hit.distance - 1.0 ).abs( ) < 1e-4 );
  }

  #[test]
  fn misses_outside_triangle( ) {
    let tri = unit_tri( );
    let origin = Vec3::new( 5.0, 5.0, 1.0 );
    let dir = Vec3::new( 0.0, 0.0, -1.0 );
    assert!( tri.intersect( origin, dir, std::f32::INFINITY ).is_none( ) );
  }

  #[test]
  fn degenerate_uv_leaves_tangent_zero( ) {
    let v = [ Vec3::new( 0.0, 0.0, 0.0 ), Vec3::new( 1.0, 0.0, 0.0 ), Vec3::new( 0.0, 1.0, 0.0 ) ];
    let n = [ Vec3::new( 0.0, 0.0, 1.0 ); 3 ];
    let uv = [ Vec2::ZERO; 3 ]; // all UVs identical -> det == 0
    let tri = Triangle::new( v, n, Some( uv ), 0 );
    assert_eq!( tri.t[ 0 ].x, 0.0 );
    assert_eq!( tri.b[ 0 ].x, 0.0 );
  }

  #[test]
  fn square_area_of_right_triangle( ) {
    let tri = unit_tri( );
    assert!( ( tri.square_area( ) - 0.5 ).abs( ) < 1e-5 );
  }
}
