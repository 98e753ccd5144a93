use std::ops;
use crate::math::Vec3;

/// A 4-component float vector. Used for the RGBA base-color factor and for
/// homogeneous barycentric-style arithmetic; kept as a thin sibling of
/// `Vec3` rather than folding a `w` field onto it, matching the split
/// between `Vec2`/`Vec3` in this module.
#[derive(Copy,Clone,Debug)]
pub struct Vec4 {
  pub x : f32,
  pub y : f32,
  pub z : f32,
  pub w : f32
}

impl Vec4 {
  pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
  pub const ONE:  Vec4 = Vec4 { x: 1.0, y: 1.0, z: 1.0, w: 1.0 };

  pub fn new( x : f32, y : f32, z : f32, w : f32 ) -> Vec4 {
    Vec4 { x, y, z, w }
  }

  pub fn from_vec3( v : Vec3, w : f32 ) -> Vec4 {
    Vec4::new( v.x, v.y, v.z, w )
  }

  pub fn xyz( self ) -> Vec3 {
    Vec3::new( self.x, self.y, self.z )
  }
}

impl ops::Add< Vec4 > for Vec4 {
  type Output = Vec4;

  fn add( self, rhs: Vec4 ) -> Vec4 {
    Vec4::new( self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w )
  }
}

impl ops::Mul< Vec4 > for Vec4 {
  type Output = Vec4;

  fn mul( self, rhs: Vec4 ) -> Vec4 {
    Vec4::new( self.x * rhs.x, self.y * rhs.y, self.z * rhs.z, self.w * rhs.w )
  }
}

impl ops::Mul< f32 > for Vec4 {
  type Output = Vec4;

  fn mul( self, rhs: f32 ) -> Vec4 {
    Vec4::new( self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs )
  }
}
