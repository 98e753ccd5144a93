mod vec2;
mod vec3;
mod vec4;
mod mat3;

pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
pub use mat3::Mat3;

// Some arbitrary math utilities

pub static EPSILON : f32 = 0.0002;

pub fn clamp( x : f32, min_val : f32, max_val : f32 ) -> f32 {
  max_val.min( min_val.max( x ) )
}

pub fn lerp( a : f32, b : f32, t : f32 ) -> f32 {
  a + ( b - a ) * t
}

pub fn lerp3( a : Vec3, b : Vec3, t : f32 ) -> Vec3 {
  a + ( b - a ) * t
}
