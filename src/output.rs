// External imports
use image::{ImageBuffer, Rgb};
// Local imports
use crate::error::RenderError;
use crate::graphics::texture::linear_to_srgb;
use crate::math::clamp;
use crate::render::Framebuffer;

/// Tone-maps a linear-radiance framebuffer to 8-bit sRGB and writes it as a
/// PNG. The only persisted output of a render.
pub fn write_png( framebuffer : &Framebuffer, path : &std::path::Path ) -> Result< (), RenderError > {
  let mut image = ImageBuffer::<Rgb<u8>, Vec<u8>>::new( framebuffer.width, framebuffer.height );

  for y in 0..framebuffer.height {
    for x in 0..framebuffer.width {
      let linear = framebuffer.pixel( x, y );
      let r = to_byte( linear.x );
      let g = to_byte( linear.y );
      let b = to_byte( linear.z );
      image.put_pixel( x, y, Rgb( [ r, g, b ] ) );
    }
  }

  image.save( path ).map_err( | e | RenderError::OutputWrite {
    path: path.to_path_buf( )
  , reason: e.to_string( )
  } )
}

fn to_byte( linear : f32 ) -> u8 {
  ( clamp( linear_to_srgb( linear ), 0.0, 1.0 ) * 255.0 ).round( ) as u8
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::math::Vec3;

  #[test]
  fn black_and_white_round_trip_to_byte_extremes( ) {
    assert_eq!( to_byte( 0.0 ), 0 );
    assert_eq!( to_byte( 1.0 ), 255 );
  }

  #[test]
  fn write_png_produces_a_file( ) {
    let mut framebuffer = Framebuffer::new_for_test( 2, 2 );
    framebuffer.set_for_test( 0, 0, Vec3::new( 1.0, 0.0, 0.0 ) );
    framebuffer.set_for_test( 1, 1, Vec3::new( 0.0, 1.0, 0.0 ) );

    let dir = std::env::temp_dir( );
    let path = dir.join( "pathtracer_output_test.png" );
    write_png( &framebuffer, &path ).unwrap( );
    assert!( path.exists( ) );
    std::fs::remove_file( &path ).ok( );
  }
}
