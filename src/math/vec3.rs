
use std::ops;

#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Vec3 {
  pub x : f32,
  pub y : f32,
  pub z : f32
}

impl Vec3 {
  pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
  pub const ONE:  Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

  pub fn new( x : f32, y : f32, z : f32 ) -> Vec3 {
    Vec3 { x, y, z }
  }

  pub fn splat( v : f32 ) -> Vec3 {
    Vec3::new( v, v, v )
  }

  pub fn normalize( self ) -> Vec3 {
    let len_sq = self.dot( self );
    let len = len_sq.sqrt( );
    Vec3::new( self.x / len, self.y / len, self.z / len )
  }

  pub fn dot( self, rhs : Vec3 ) -> f32 {
    self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
  }

  pub fn cross( self, t : Vec3 ) -> Vec3 {
    Vec3::new(
      self.y * t.z - self.z * t.y,
      self.z * t.x - self.x * t.z,
      self.x * t.y - self.y * t.x )
  }

  pub fn len( self ) -> f32 {
    self.len_sq( ).sqrt( )
  }

  pub fn len_sq( self ) -> f32 {
    self.dot( self )
  }

  pub fn dis( self, other : Vec3 ) -> f32 {
    ( self - other ).len( )
  }

  pub fn reflect( self, normal : Vec3 ) -> Vec3 {
    2.0 * self.dot( normal ) * normal - self
  }

  pub fn exp( self ) -> Vec3 {
    Vec3::new( self.x.exp( ), self.y.exp( ), self.z.exp( ) )
  }

  /// The component at the given axis (0=x, 1=y, 2=z). Used by the BVH
  /// binning pass, which iterates over axes generically.
  pub fn axis( &self, a : usize ) -> f32 {
    match a {
      0 => self.x,
      1 => self.y,
      _ => self.z
    }
  }

  pub fn min( self, rhs : Vec3 ) -> Vec3 {
    Vec3::new( self.x.min( rhs.x ), self.y.min( rhs.y ), self.z.min( rhs.z ) )
  }

  pub fn max( self, rhs : Vec3 ) -> Vec3 {
    Vec3::new( self.x.max( rhs.x ), self.y.max( rhs.y ), self.z.max( rhs.z ) )
  }

  pub fn abs( self ) -> Vec3 {
    Vec3::new( self.x.abs( ), self.y.abs( ), self.z.abs( ) )
  }

  pub fn max_component( self ) -> f32 {
    self.x.max( self.y ).max( self.z )
  }

  pub fn lerp( self, rhs : Vec3, t : f32 ) -> Vec3 {
    self + ( rhs - self ) * t
  }

  pub fn is_nan( self ) -> bool {
    self.x.is_nan( ) || self.y.is_nan( ) || self.z.is_nan( )
  }

  pub fn rot_y( &self, angle : f32 ) -> Vec3 {
    // [  c 0 s ] [x]
    // [  0 1 0 ] [y]
    // [ -s 0 c ] [z]
    let x = self.x;
    let y = self.y;
    let z = self.z;

    let c = angle.cos( );
    let s = angle.sin( );
    Vec3::new( c * x + s * z, y, -s * x + c * z )
  }

  pub fn rot_x( &self, angle : f32 ) -> Vec3 {
    // [ 1 0  0 ] [x]
    // [ 0 c -s ] [y]
    // [ 0 s  c ] [z]
    let x = self.x;
    let y = self.y;
    let z = self.z;

    let c = angle.cos( );
    let s = angle.sin( );
    Vec3::new( x, c * y - s * z, s * y + c * z )
  }

  /// Rotates `self` about the given axis (unit length) by `angle` radians,
  /// using Rodrigues' rotation formula. Used to derive the viewport corners
  /// from the camera's forward vector.
  pub fn rot_axis( self, axis : Vec3, angle : f32 ) -> Vec3 {
    let c = angle.cos( );
    let s = angle.sin( );
    self * c + axis.cross( self ) * s + axis * axis.dot( self ) * ( 1.0 - c )
  }
}

impl ops::Neg for Vec3 {
  type Output = Vec3;

  fn neg( self ) -> Vec3 {
    Vec3::new( -self.x, -self.y, -self.z )
  }
}

impl ops::Add< Vec3 > for Vec3 {
  type Output = Vec3;

  fn add( self, addend: Vec3 ) -> Vec3 {
    Vec3::new( self.x + addend.x, self.y + addend.y, self.z + addend.z )
  }
}

impl ops::AddAssign< Vec3 > for Vec3 {
  fn add_assign( &mut self, rhs : Vec3 ) {
    self.x += rhs.x;
    self.y += rhs.y;
    self.z += rhs.z;
  }
}

impl ops::Sub< Vec3 > for Vec3 {
  type Output = Vec3;

  fn sub( self, subtrahend: Vec3 ) -> Vec3 {
    Vec3::new( self.x - subtrahend.x, self.y - subtrahend.y, self.z - subtrahend.z )
  }
}

impl ops::Mul< f32 > for Vec3 {
  type Output = Vec3;

  fn mul( self, multiplier: f32 ) -> Vec3 {
    Vec3::new( multiplier * self.x, multiplier * self.y, multiplier * self.z )
  }
}

impl ops::Mul< Vec3 > for f32 {
  type Output = Vec3;

  fn mul( self, v: Vec3 ) -> Vec3 {
    Vec3::new( self * v.x, self * v.y, self * v.z )
  }
}

/// Elementwise (Hadamard) product. Used throughout shading for
/// throughput/radiance accumulation, where `Color3`-style clamped semantics
/// would be wrong: path throughput can legitimately exceed 1 mid-flight.
impl ops::Mul< Vec3 > for Vec3 {
  type Output = Vec3;

  fn mul( self, rhs: Vec3 ) -> Vec3 {
    Vec3::new( self.x * rhs.x, self.y * rhs.y, self.z * rhs.z )
  }
}

impl ops::Div< f32 > for Vec3 {
  type Output = Vec3;

  fn div( self, divisor: f32 ) -> Vec3 {
    Vec3::new( self.x / divisor, self.y / divisor, self.z / divisor )
  }
}
