use crate::math::{Vec2, Vec3};

/// A column-major 3x3 matrix. Used for the material's UV transform and for
/// tangent-space (TBN) construction during shading.
#[derive(Copy,Clone,Debug)]
pub struct Mat3 {
  pub col0 : Vec3,
  pub col1 : Vec3,
  pub col2 : Vec3
}

impl Mat3 {
  pub const IDENTITY: Mat3 =
    Mat3 {
      col0: Vec3 { x: 1.0, y: 0.0, z: 0.0 }
    , col1: Vec3 { x: 0.0, y: 1.0, z: 0.0 }
    , col2: Vec3 { x: 0.0, y: 0.0, z: 1.0 }
    };

  pub fn from_cols( col0 : Vec3, col1 : Vec3, col2 : Vec3 ) -> Mat3 {
    Mat3 { col0, col1, col2 }
  }

  /// Builds the tangent-to-world matrix (TBN) from a tangent, bitangent and
  /// normal, all already in world space.
  pub fn tbn( tangent : Vec3, bitangent : Vec3, normal : Vec3 ) -> Mat3 {
    Mat3::from_cols( tangent, bitangent, normal )
  }

  pub fn mul_vec3( &self, v : Vec3 ) -> Vec3 {
    self.col0 * v.x + self.col1 * v.y + self.col2 * v.z
  }

  /// Transforms a UV coordinate by the upper-left 2x2 and translation row of
  /// the matrix, as glTF's `KHR_texture_transform` expects.
  pub fn mul_uv( &self, uv : Vec2 ) -> Vec2 {
    let v = self.mul_vec3( Vec3::new( uv.x, uv.y, 1.0 ) );
    Vec2::new( v.x, v.y )
  }
}
