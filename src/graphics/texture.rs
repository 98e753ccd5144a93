// Local imports
use crate::math::{Vec2, Vec3, Vec4};

/// How a sampler treats `uv` outside `[0,1]`.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum WrapMode {
  Clamp,
  Repeat
}

/// How texel bytes were decoded into the backing `f32` buffer. Color maps
/// are sRGB-decoded at load so the hot shading path never has to branch on
/// it; normal maps are unpacked `2c-1`; everything else (metallic-
/// roughness, occlusion, transmission) is linear already.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum Encoding {
  Srgb,
  Normal,
  Linear
}

/// A 2-D image sampled by the material system. Always stored as 4 channels
/// (`Vec4`) internally; RGB-only sources get `w = 1`. Immutable and `Sync`
/// after load, so worker threads can sample it without locking.
#[derive(Clone,Debug)]
pub struct Texture {
  data   : Vec< Vec4 >,
  width  : u32,
  height : u32,
  wrap   : WrapMode
}

impl Texture {
  /// Builds a texture from raw 8-bit RGBA rows, decoding each texel
  /// according to `encoding`.
  pub fn from_rgba8( width : u32, height : u32, pixels : &[ u8 ], encoding : Encoding, wrap : WrapMode ) -> Texture {
    let mut data = Vec::with_capacity( ( width * height ) as usize );
    for texel in pixels.chunks_exact( 4 ) {
      let c = Vec4::new(
        byte_to_unit( texel[ 0 ] )
      , byte_to_unit( texel[ 1 ] )
      , byte_to_unit( texel[ 2 ] )
      , byte_to_unit( texel[ 3 ] )
      );
      data.push( decode( c, encoding ) );
    }
    Texture { data, width, height, wrap }
  }

  /// A single-texel texture holding a constant factor, used when a material
  /// slot has no texture reference at all.
  pub fn constant( color : Vec4 ) -> Texture {
    Texture { data: vec![ color ], width: 1, height: 1, wrap: WrapMode::Clamp }
  }

  pub fn width( &self ) -> u32 { self.width }
  pub fn height( &self ) -> u32 { self.height }

  /// Bilinear sample at `uv`, wrapped per `self.wrap` and converted to
  /// pixel space via `(dimension - 1)` rather than `dimension`, so `uv=1`
  /// lands exactly on the last texel instead of wrapping into the first.
  pub fn sample( &self, uv : Vec2 ) -> Vec4 {
    let u = wrap_coord( uv.x, self.wrap );
    let v = wrap_coord( uv.y, self.wrap );

    let fx = u * ( self.width as f32 - 1.0 ).max( 0.0 );
    let fy = v * ( self.height as f32 - 1.0 ).max( 0.0 );

    let x0 = fx.floor( ).max( 0.0 ) as u32;
    let y0 = fy.floor( ).max( 0.0 ) as u32;
    let x1 = ( x0 + 1 ).min( self.width.saturating_sub( 1 ) );
    let y1 = ( y0 + 1 ).min( self.height.saturating_sub( 1 ) );

    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let c00 = self.texel( x0, y0 );
    let c10 = self.texel( x1, y0 );
    let c01 = self.texel( x0, y1 );
    let c11 = self.texel( x1, y1 );

    let top = c00 * ( 1.0 - tx ) + c10 * tx;
    let bot = c01 * ( 1.0 - tx ) + c11 * tx;
    top * ( 1.0 - ty ) + bot * ty
  }

  /// Convenience for normal maps and other RGB-only consumers.
  pub fn sample3( &self, uv : Vec2 ) -> Vec3 {
    self.sample( uv ).xyz( )
  }

  fn texel( &self, x : u32, y : u32 ) -> Vec4 {
    self.data[ ( y * self.width + x ) as usize ]
  }
}

fn byte_to_unit( b : u8 ) -> f32 {
  b as f32 / 255.0
}

fn decode( c : Vec4, encoding : Encoding ) -> Vec4 {
  match encoding {
    Encoding::Srgb   => Vec4::new( srgb_to_linear( c.x ), srgb_to_linear( c.y ), srgb_to_linear( c.z ), c.w ),
    Encoding::Normal => Vec4::new( 2.0 * c.x - 1.0, 2.0 * c.y - 1.0, 2.0 * c.z - 1.0, c.w ),
    Encoding::Linear => c
  }
}

fn wrap_coord( t : f32, wrap : WrapMode ) -> f32 {
  match wrap {
    WrapMode::Clamp  => crate::math::clamp( t, 0.0, 1.0 ),
    WrapMode::Repeat => t - t.floor( )
  }
}

pub fn srgb_to_linear( c : f32 ) -> f32 {
  if c <= 0.04045 {
    c / 12.92
  } else {
    ( ( c + 0.055 ) / 1.055 ).powf( 2.4 )
  }
}

pub fn linear_to_srgb( c : f32 ) -> f32 {
  if c <= 0.0031308 {
    c * 12.92
  } else {
    1.055 * c.powf( 1.0 / 2.4 ) - 0.055
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn checker( ) -> Texture {
    // 2x2: black, white, white, black
    let pixels = [ 0,0,0,255,  255,255,255,255
                 , 255,255,255,255,  0,0,0,255 ];
    Texture::from_rgba8( 2, 2, &pixels, Encoding::Linear, WrapMode::Clamp )
  }

  #[test]
  fn samples_corner_texels_exactly( ) {
    let tex = checker( );
    let top_left = tex.sample( Vec2::new( 0.0, 0.0 ) );
    assert!( top_left.x < 1e-5 );
    let top_right = tex.sample( Vec2::new( 1.0, 0.0 ) );
    assert!( ( top_right.x - 1.0 ).abs( ) < 1e-5 );
  }

  #[test]
  fn clamp_wrap_saturates_outside_unit_range( ) {
    let tex = checker( );
    let past_edge = tex.sample( Vec2::new( 5.0, 0.0 ) );
    let at_edge = tex.sample( Vec2::new( 1.0, 0.0 ) );
    assert!( ( past_edge.x - at_edge.x ).abs( ) < 1e-5 );
  }

  #[test]
  fn repeat_wrap_is_periodic( ) {
    let tex = Texture::from_rgba8( 2, 2, &[ 0,0,0,255, 255,255,255,255, 255,255,255,255, 0,0,0,255 ], Encoding::Linear, WrapMode::Repeat );
    let a = tex.sample( Vec2::new( 0.25, 0.25 ) );
    let b = tex.sample( Vec2::new( 1.25, 0.25 ) );
    assert!( ( a.x - b.x ).abs( ) < 1e-5 );
  }

  #[test]
  fn srgb_roundtrip_is_close( ) {
    let c = 0.62f32;
    let back = linear_to_srgb( srgb_to_linear( c ) );
    assert!( ( back - c ).abs( ) < 1e-4 );
  }

  #[test]
  fn normal_map_unpacks_to_signed_range( ) {
    let pixels = [ 255, 128, 0, 255 ];
    let tex = Texture::from_rgba8( 1, 1, &pixels, Encoding::Normal, WrapMode::Clamp );
    let n = tex.sample3( Vec2::ZERO );
    assert!( ( n.x - 1.0 ).abs( ) < 1e-3 );
    assert!( n.z < -0.99 );
  }

  #[test]
  fn constant_texture_ignores_uv( ) {
    let tex = Texture::constant( Vec4::new( 0.1, 0.2, 0.3, 1.0 ) );
    let a = tex.sample( Vec2::new( 0.0, 0.0 ) );
    let b = tex.sample( Vec2::new( 0.9, 0.9 ) );
    assert_eq!( a.x, b.x );
    assert_eq!( a.y, b.y );
  }
}
