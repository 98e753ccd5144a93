// Local imports
use crate::cli::Params;
use crate::graphics::bsdf;
use crate::graphics::bvh::BVH;
use crate::graphics::material::{sample_material, SampledData};
use crate::graphics::ray::Ray;
use crate::graphics::scene::{CameraDesc, Scene};
use crate::math::{Mat3, Vec3};
use crate::rng::Rng;

const TILE_SIZE : u32 = 32;
const BACKGROUND : Vec3 = Vec3 { x: 0.5, y: 0.5, z: 0.5 };
const SHADOW_EPSILON : f32 = 1e-6;
const BOUNCE_EPSILON : f32 = 1e-5;
const ALPHA_EPSILON : f32 = 1e-4;
const ALPHA_THRESHOLD : f32 = 0.97;
const MIN_PDF : f32 = 1e-4;

/// A fixed directional light, matching the single hard-coded light the
/// integrator supports (no point/spot lights; see the crate's Non-goals).
fn light_direction( ) -> Vec3 {
  Vec3::new( 1.0, 1.0, -1.0 ).normalize( )
}

fn light_radiance( ) -> Vec3 {
  Vec3::splat( 3.0 )
}

/// A `width x height` buffer of linear radiance, written exactly once per
/// pixel by whichever tile owns it.
pub struct Framebuffer {
  pub width  : u32,
  pub height : u32,
  pixels     : Vec< Vec3 >
}

impl Framebuffer {
  fn new( width : u32, height : u32 ) -> Framebuffer {
    Framebuffer { width, height, pixels: vec![ Vec3::ZERO; ( width * height ) as usize ] }
  }

  pub fn pixel( &self, x : u32, y : u32 ) -> Vec3 {
    self.pixels[ ( y * self.width + x ) as usize ]
  }

  #[cfg(test)]
  pub fn pixels( &self ) -> &[ Vec3 ] {
    &self.pixels
  }

  #[cfg(test)]
  pub fn new_for_test( width : u32, height : u32 ) -> Framebuffer {
    Framebuffer::new( width, height )
  }

  #[cfg(test)]
  pub fn set_for_test( &mut self, x : u32, y : u32, v : Vec3 ) {
    let idx = ( y * self.width + x ) as usize;
    self.pixels[ idx ] = v;
  }
}

/// A raw pointer into the framebuffer's backing storage, handed to every
/// tile worker. Safe in practice because tiles partition the image into
/// disjoint pixel ranges and no two tiles ever touch the same index; see
/// `render`'s tiling loop for the partition.
struct TileWriter {
  ptr    : *mut Vec3,
  width  : u32,
  height : u32
}

unsafe impl Sync for TileWriter { }

impl TileWriter {
  fn write( &self, x : u32, y : u32, v : Vec3 ) {
    debug_assert!( x < self.width && y < self.height );
    unsafe {
      *self.ptr.add( ( y * self.width + x ) as usize ) = v;
    }
  }
}

#[derive(Clone,Copy)]
struct Tile {
  x0 : u32, y0 : u32, x1 : u32, y1 : u32,
  index : u32
}

fn build_tiles( width : u32, height : u32 ) -> Vec< Tile > {
  let mut tiles = Vec::new( );
  let mut index = 0;
  let mut y0 = 0;
  while y0 < height {
    let y1 = ( y0 + TILE_SIZE ).min( height );
    let mut x0 = 0;
    while x0 < width {
      let x1 = ( x0 + TILE_SIZE ).min( width );
      tiles.push( Tile { x0, y0, x1, y1, index } );
      index += 1;
      x0 = x1;
    }
    y0 = y1;
  }
  tiles
}

/// The camera basis derived from a `CameraDesc` and an output aspect ratio:
/// an orthonormal `(right, up, forward)` frame and the four viewport
/// corner directions used to build primary rays.
struct CameraBasis {
  position     : Vec3,
  top_left     : Vec3,
  top_right    : Vec3,
  bottom_left  : Vec3,
  bottom_right : Vec3
}

fn build_camera_basis( camera : &CameraDesc, output_aspect : f32 ) -> CameraBasis {
  let forward = camera.forward.normalize( );
  let right = forward.cross( camera.up ).normalize( );
  let up = right.cross( forward ).normalize( );

  let v_fov = 2.0 * ( ( camera.h_fov * 0.5 ).tan( ) * ( 1.0 / output_aspect ) ).atan( );
  let half_h = camera.h_fov * 0.5;
  let half_v = v_fov * 0.5;

  let left_dir = forward.rot_axis( up, half_h );
  let right_dir = forward.rot_axis( up, -half_h );

  CameraBasis {
    position: camera.position
  , top_left: left_dir.rot_axis( right, half_v )
  , top_right: right_dir.rot_axis( right, half_v )
  , bottom_left: left_dir.rot_axis( right, -half_v )
  , bottom_right: right_dir.rot_axis( right, -half_v )
  }
}

impl CameraBasis {
  /// `u,v` in `[0,1]`, `(0,0)` at the top-left of the frame.
  fn ray_direction( &self, u : f32, v : f32 ) -> Vec3 {
    let top = self.top_left.lerp( self.top_right, u );
    let bottom = self.bottom_left.lerp( self.bottom_right, u );
    top.lerp( bottom, v ).normalize( )
  }
}

/// Renders `scene`/`bvh` per `params`, returning a linear-radiance
/// framebuffer. Partitions the image into 32x32 tiles and consumes them
/// from a `rayon` work-stealing pool, with the calling thread directly
/// executing every 32nd tile itself rather than blocking purely on the
/// pool (matching the scheduler model in the crate's reference lineage).
pub fn render( scene : &Scene, bvh : &BVH, params : &Params ) -> Framebuffer {
  let height = params.height;
  let width = ( ( height as f32 ) * scene.camera.aspect ).round( ).max( 1.0 ) as u32;
  let output_aspect = width as f32 / height as f32;

  let camera = build_camera_basis( &scene.camera, output_aspect );
  let mut framebuffer = Framebuffer::new( width, height );
  let writer = TileWriter { ptr: framebuffer.pixels.as_mut_ptr( ), width, height };

  let tiles = build_tiles( width, height );

  log::info!( "rendering {}x{} ({} tiles, {} triangles)", width, height, tiles.len( ), scene.triangles.len( ) );

  rayon::scope( | scope | {
    for tile in &tiles {
      if tile.index % TILE_SIZE != 0 {
        let writer = &writer;
        scope.spawn( move |_| render_tile( scene, bvh, &camera, params, tile, writer ) );
      }
    }
    for tile in &tiles {
      if tile.index % TILE_SIZE == 0 {
        render_tile( scene, bvh, &camera, params, tile, &writer );
      }
    }
  } );

  framebuffer
}

fn render_tile( scene : &Scene, bvh : &BVH, camera : &CameraBasis, params : &Params, tile : &Tile, writer : &TileWriter ) {
  let width = writer.width as f32;
  let height = writer.height as f32;

  for sample_idx in 0..params.msaa {
    let mut rng = Rng::seeded( tile.x0 / TILE_SIZE, tile.y0 / TILE_SIZE, sample_idx );

    for y in tile.y0..tile.y1 {
      for x in tile.x0..tile.x1 {
        let ( jx, jy ) = if sample_idx == 0 {
          ( 0.5, 0.5 )
        } else {
          rng.next2( )
        };

        let u = ( x as f32 + jx ) / width;
        let v = ( y as f32 + jy ) / height;

        let dir = camera.ray_direction( u, v );
        let ray = Ray::new( camera.position, dir );

        let color = trace( scene, bvh, &ray, params.bounces, params.samples, None, &mut rng, params );

        let prev = writer_read( writer, x, y );
        writer.write( x, y, prev + color * ( 1.0 / params.msaa as f32 ) );
      }
    }
  }
}

fn writer_read( writer : &TileWriter, x : u32, y : u32 ) -> Vec3 {
  unsafe { *writer.ptr.add( ( y * writer.width + x ) as usize ) }
}

/// Traces one path segment. `indirect_samples` is `params.samples` at the
/// primary (camera) ray and `1` on every recursive call, per the "extra
/// samples only at the top bounce" rule.
fn trace( scene : &Scene
        , bvh : &BVH
        , ray : &Ray
        , bounce_limit : u32
        , indirect_samples : u32
        , ignore_triangle : Option< u32 >
        , rng : &mut Rng
        , params : &Params
        ) -> Vec3 {
  let hit = match bvh.intersect( ray, std::f32::INFINITY, ignore_triangle ) {
    Some( hit ) => hit
  , None => return BACKGROUND
  };

  let tri = bvh.triangle_for_hit( hit.triangle );
  let material = &scene.materials[ tri.material_index as usize ];

  let uv = tri.interpolate_uv( hit.barycentric );
  let sample = sample_material( material, &scene.textures, uv );

  // The interpolated vertex normal, flipped consistently with the
  // geometric normal's own back-face flip (`hit.is_entering` records
  // which side the geometric flip happened on).
  let mut interpolated_normal = tri.interpolate_normal( hit.barycentric );
  if !hit.is_entering {
    interpolated_normal = -interpolated_normal;
  }

  let tangent = tri.interpolate_tangent( hit.barycentric );
  let bitangent = tri.interpolate_bitangent( hit.barycentric );
  // A degenerate UV mapping leaves tangent/bitangent at zero (see
  // `Triangle::new`); building a TBN from a zero column would normalize a
  // zero vector into NaN, so fall back to the unperturbed vertex normal.
  let normal =
    if tangent.len_sq( ) > 1e-12 && bitangent.len_sq( ) > 1e-12 {
      let shading_basis = Mat3::tbn( tangent.normalize( ), bitangent.normalize( ), interpolated_normal );
      shading_basis.mul_vec3( sample.normal ).normalize( )
    } else {
      interpolated_normal
    };

  let hit_point = ray.at( hit.distance );
  let view = -ray.dir;

  let mut color = direct_light( scene, bvh, hit_point, normal, view, &sample, hit.triangle );

  if bounce_limit > 0 {
    color += indirect_light( scene, bvh, hit_point, normal, view, &sample, hit.triangle, bounce_limit, indirect_samples, rng, params );
  }

  color += sample.emissive;

  if sample.base_color.w < ALPHA_THRESHOLD {
    let continuation_origin = hit_point - normal * ALPHA_EPSILON;
    let continuation_ray = Ray::new( continuation_origin, ray.dir );
    let continuation = trace( scene, bvh, &continuation_ray, bounce_limit.saturating_sub( 1 ), 1, Some( hit.triangle ), rng, params );
    let a = sample.base_color.w;
    color = color * a + continuation * ( 1.0 - a );
  }

  color
}

fn direct_light( scene : &Scene, bvh : &BVH, hit_point : Vec3, normal : Vec3, view : Vec3, sample : &SampledData, shading_triangle : u32 ) -> Vec3 {
  let light_dir = light_direction( );
  let n_dot_l = normal.dot( light_dir );
  if n_dot_l <= 0.0 {
    return Vec3::ZERO;
  }

  let shadow_origin = hit_point + normal * SHADOW_EPSILON;
  let shadow_ray = Ray::new( shadow_origin, light_dir );
  if bvh.intersect( &shadow_ray, std::f32::INFINITY, Some( shading_triangle ) ).is_some( ) {
    return Vec3::ZERO;
  }

  let _ = scene;
  let f = bsdf::brdf( view, normal, light_dir, sample );
  f * n_dot_l * light_radiance( )
}

#[allow(clippy::too_many_arguments)]
fn indirect_light( scene : &Scene
                  , bvh : &BVH
                  , hit_point : Vec3
                  , normal : Vec3
                  , view : Vec3
                  , sample : &SampledData
                  , shading_triangle : u32
                  , bounce_limit : u32
                  , indirect_samples : u32
                  , rng : &mut Rng
                  , params : &Params
                  ) -> Vec3 {
  let mut accum = Vec3::ZERO;
  let has_transmission = sample.transmission > 0.0;
  let use_beckmann = sample.roughness < 0.2;

  for _ in 0..indirect_samples {
    let pick_transmission = has_transmission && rng.next( ) < 0.5;

    let ( wi, pdf, term ) = if pick_transmission {
      sample_transmission( hit_point, normal, view, sample, rng, params, use_beckmann )
    } else {
      let pick_specular = bsdf::is_pure_mirror( sample ) || rng.next( ) < 0.5;
      sample_reflection( normal, view, sample, rng, use_beckmann, pick_specular, has_transmission )
    };

    if pdf.is_nan( ) || pdf <= MIN_PDF {
      continue;
    }

    let n_dot_l = normal.dot( wi ).abs( );
    if n_dot_l <= 0.0 {
      continue;
    }

    let offset = if pick_transmission { -normal } else { normal };
    let origin = hit_point + offset * BOUNCE_EPSILON;
    let ray = Ray::new( origin, wi );
    let incoming = trace( scene, bvh, &ray, bounce_limit - 1, 1, Some( shading_triangle ), rng, params );

    accum += term * n_dot_l * incoming / pdf;
  }

  accum / indirect_samples as f32
}

fn sample_reflection( normal : Vec3, view : Vec3, sample : &SampledData, rng : &mut Rng, use_beckmann : bool, pick_specular : bool, has_transmission : bool ) -> ( Vec3, f32, Vec3 ) {
  let xi = rng.next2( );

  if pick_specular {
    let h = if use_beckmann { bsdf::importance_sample_beckmann( xi, sample.roughness, normal ) } else { bsdf::importance_sample_ggx( xi, sample.roughness, normal ) };
    let wi = view.reflect( h );
    let pdf_specular = if use_beckmann { bsdf::beckmann_pdf( normal, h, view, sample.roughness ) } else { bsdf::ggx_pdf( normal, h, view, sample.roughness ) };
    let pdf_diffuse = ( normal.dot( wi ) / std::f32::consts::PI ).max( 0.0 );
    let pdf = bsdf::combined_pdf( pdf_specular, pdf_diffuse, has_transmission );
    ( wi, pdf, bsdf::brdf( view, normal, wi, sample ) )
  } else {
    let wi = bsdf::importance_sample_lambert( xi, normal );
    let half = ( view + wi ).normalize( );
    let pdf_specular = if use_beckmann { bsdf::beckmann_pdf( normal, half, view, sample.roughness ) } else { bsdf::ggx_pdf( normal, half, view, sample.roughness ) };
    let pdf_diffuse = ( normal.dot( wi ) / std::f32::consts::PI ).max( 0.0 );
    let pdf = bsdf::combined_pdf( pdf_specular, pdf_diffuse, has_transmission );
    ( wi, pdf, bsdf::brdf( view, normal, wi, sample ) )
  }
}

fn sample_transmission( hit_point : Vec3, normal : Vec3, view : Vec3, sample : &SampledData, rng : &mut Rng, params : &Params, use_beckmann : bool ) -> ( Vec3, f32, Vec3 ) {
  let _ = hit_point;

  if sample.thickness > 0.0 {
    let wi = bsdf::refract( -view, normal, 1.0, sample.ior ).unwrap_or( -view );
    let pdf = bsdf::henyey_greenstein_pdf( view, wi, params.henyey_greenstein_g ).max( 1e-6 );
    let term = sample.base_color.xyz( ) * sample.transmission * ( 1.0 - sample.metallic ) * pdf;
    ( wi, pdf, term )
  } else {
    let xi = rng.next2( );
    let h = if use_beckmann { bsdf::importance_sample_beckmann( xi, sample.roughness, normal ) } else { bsdf::importance_sample_ggx( xi, sample.roughness, normal ) };
    let same_side = view.reflect( h );
    let wi = same_side - normal * ( 2.0 * same_side.dot( normal ) );

    let pdf_specular = if use_beckmann { bsdf::beckmann_pdf( normal, h, view, sample.roughness ) } else { bsdf::ggx_pdf( normal, h, view, sample.roughness ) };
    let pdf = bsdf::combined_pdf( pdf_specular, 0.0, true );
    let term = bsdf::btdf( view, normal, wi, sample );
    ( wi, pdf, term )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::scene::CameraDesc;

  #[test]
  fn camera_basis_center_ray_matches_forward( ) {
    let camera = CameraDesc::default_camera( );
    let basis = build_camera_basis( &camera, 4.0 / 3.0 );
    let dir = basis.ray_direction( 0.5, 0.5 );
    assert!( ( dir - camera.forward ).len( ) < 1e-4 );
  }

  #[test]
  fn tiles_cover_the_image_exactly_once( ) {
    let tiles = build_tiles( 65, 40 );
    let mut covered = vec![ false; 65 * 40 ];
    for tile in &tiles {
      for y in tile.y0..tile.y1 {
        for x in tile.x0..tile.x1 {
          let idx = ( y * 65 + x ) as usize;
          assert!( !covered[ idx ] );
          covered[ idx ] = true;
        }
      }
    }
    assert!( covered.iter( ).all( | &c | c ) );
  }

  #[test]
  fn miss_returns_background( ) {
    let tris : Vec< crate::graphics::triangle::Triangle > = Vec::new( );
    let bvh = BVH::build( &tris );
    let scene = Scene { triangles: Vec::new( ), materials: Vec::new( ), textures: Vec::new( ), camera: CameraDesc::default_camera( ) };
    let params = Params {
      in_path: "".into( ), out_path: "".into( ), height: 10, samples: 1, bounces: 1, msaa: 1, henyey_greenstein_g: -0.55
    };
    let ray = Ray::new( Vec3::ZERO, Vec3::new( 0.0, 0.0, -1.0 ) );
    let mut rng = Rng::seeded( 0, 0, 0 );
    let color = trace( &scene, &bvh, &ray, 1, 1, None, &mut rng, &params );
    assert_eq!( color, BACKGROUND );
  }
}
