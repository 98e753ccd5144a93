// Local imports
use crate::error::{RenderError, TextureLoadError};
use crate::graphics::material::{AlphaMode, Material, NO_TEXTURE};
use crate::graphics::texture::{Encoding, Texture, WrapMode};
use crate::graphics::triangle::Triangle;
use crate::math::{Mat3, Vec2, Vec3, Vec4};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The camera pose and field of view extracted from a scene. `h_fov` is
/// horizontal, in radians; the integrator derives the vertical FOV from it
/// and the render's output aspect.
#[derive(Clone,Copy,Debug)]
pub struct CameraDesc {
  pub position : Vec3,
  pub forward  : Vec3,
  pub up       : Vec3,
  pub h_fov    : f32,
  pub aspect   : f32
}

impl CameraDesc {
  /// A fixed look-down--z camera at the origin, used when the scene defines
  /// no camera node.
  pub fn default_camera( ) -> CameraDesc {
    CameraDesc {
      position: Vec3::ZERO
    , forward: Vec3::new( 0.0, 0.0, -1.0 )
    , up: Vec3::new( 0.0, 1.0, 0.0 )
    , h_fov: 90.0_f32.to_radians( )
    , aspect: 4.0 / 3.0
    }
  }
}

/// A loaded scene: a flat triangle soup, a material palette, a texture
/// palette shared by materials, and a camera pose. Immutable after load;
/// shared read-only by every render worker.
pub struct Scene {
  pub triangles : Vec< Triangle >,
  pub materials : Vec< Material >,
  pub textures  : Vec< Texture >,
  pub camera    : CameraDesc
}

/// A 4x4 matrix in column-major form, composed top-down while flattening
/// the node hierarchy into world space. Local to the loader: nothing else
/// in this crate needs a general 4x4 matrix type.
type Mat4 = [ [ f32; 4 ]; 4 ];

const MAT4_IDENTITY : Mat4 = [
  [ 1.0, 0.0, 0.0, 0.0 ]
, [ 0.0, 1.0, 0.0, 0.0 ]
, [ 0.0, 0.0, 1.0, 0.0 ]
, [ 0.0, 0.0, 0.0, 1.0 ]
];

fn mat4_mul( a : &Mat4, b : &Mat4 ) -> Mat4 {
  let mut out = [ [ 0.0f32; 4 ]; 4 ];
  for col in 0..4 {
    for row in 0..4 {
      out[ col ][ row ] = ( 0..4 ).map( | k | a[ k ][ row ] * b[ col ][ k ] ).sum( );
    }
  }
  out
}

fn mat4_transform_point( m : &Mat4, p : Vec3 ) -> Vec3 {
  Vec3::new(
    m[ 0 ][ 0 ] * p.x + m[ 1 ][ 0 ] * p.y + m[ 2 ][ 0 ] * p.z + m[ 3 ][ 0 ]
  , m[ 0 ][ 1 ] * p.x + m[ 1 ][ 1 ] * p.y + m[ 2 ][ 1 ] * p.z + m[ 3 ][ 1 ]
  , m[ 0 ][ 2 ] * p.x + m[ 1 ][ 2 ] * p.y + m[ 2 ][ 2 ] * p.z + m[ 3 ][ 2 ]
  )
}

/// Transforms a direction by the upper-left 3x3 of `m`, ignoring
/// translation. Assumes no non-uniform scale on shaded meshes, so the
/// linear part alone (no inverse-transpose) is a fair approximation for
/// normals; see DESIGN.md.
fn mat4_transform_dir( m : &Mat4, d : Vec3 ) -> Vec3 {
  Vec3::new(
    m[ 0 ][ 0 ] * d.x + m[ 1 ][ 0 ] * d.y + m[ 2 ][ 0 ] * d.z
  , m[ 0 ][ 1 ] * d.x + m[ 1 ][ 1 ] * d.y + m[ 2 ][ 1 ] * d.z
  , m[ 0 ][ 2 ] * d.x + m[ 1 ][ 2 ] * d.y + m[ 2 ][ 2 ] * d.z
  )
}

fn mat4_translation( m : &Mat4 ) -> Vec3 {
  Vec3::new( m[ 3 ][ 0 ], m[ 3 ][ 1 ], m[ 3 ][ 2 ] )
}

/// Loads a glTF 2.0 scene (`.gltf`/`.glb`) from `path`. Returns the flat
/// triangle/material/texture arrays and the camera pose; textures
/// referenced by more than one material slot are decoded only once.
pub fn load( path : &Path ) -> Result< Scene, RenderError > {
  let ( document, buffers, images ) = gltf::import( path ).map_err( | e |
    RenderError::SceneLoad { path: path.to_path_buf( ), reason: e.to_string( ) }
  )?;

  let mut loader = Loader {
    buffers: &buffers
  , images: &images
  , textures: Vec::new( )
  , texture_cache: HashMap::new( )
  , skipped_primitives: 0
  , degenerate_triangles: 0
  };

  let materials : Vec< Material > = document.materials( ).map( | m | loader.convert_material( &m ) ).collect( );

  let scene = document.default_scene( ).or_else( || document.scenes( ).next( ) );

  let mut triangles = Vec::new( );
  let mut camera = None;

  if let Some( scene ) = scene {
    for node in scene.nodes( ) {
      loader.walk_node( &node, &MAT4_IDENTITY, &materials, &mut triangles, &mut camera );
    }
  }

  if loader.skipped_primitives > 0 {
    log::warn!( "skipped {} non-triangle primitive(s)", loader.skipped_primitives );
  }
  if loader.degenerate_triangles > 0 {
    log::warn!( "dropped {} degenerate triangle(s) (zero area or NaN vertex)", loader.degenerate_triangles );
  }

  Ok( Scene {
    triangles
  , materials
  , textures: loader.textures
  , camera: camera.unwrap_or_else( CameraDesc::default_camera )
  } )
}

struct Loader< 'a > {
  buffers : &'a [ gltf::buffer::Data ],
  images  : &'a [ gltf::image::Data ],

  textures      : Vec< Texture >,
  texture_cache : HashMap< ( usize, Encoding ), u8 >,

  skipped_primitives   : u32,
  degenerate_triangles  : u32
}

impl< 'a > Loader< 'a > {
  fn walk_node( &mut self
              , node      : &gltf::Node
              , parent    : &Mat4
              , materials : &[ Material ]
              , triangles : &mut Vec< Triangle >
              , camera    : &mut Option< CameraDesc >
              ) {
    let local = node.transform( ).matrix( );
    let world = mat4_mul( parent, &local );

    if let Some( mesh ) = node.mesh( ) {
      for primitive in mesh.primitives( ) {
        self.convert_primitive( &primitive, &world, materials, triangles );
      }
    }

    if camera.is_none( ) {
      if let Some( cam ) = node.camera( ) {
        *camera = self.convert_camera( &cam, &world );
      }
    }

    for child in node.children( ) {
      self.walk_node( &child, &world, materials, triangles, camera );
    }
  }

  fn convert_camera( &self, camera : &gltf::Camera, world : &Mat4 ) -> Option< CameraDesc > {
    match camera.projection( ) {
      gltf::camera::Projection::Perspective( persp ) => {
        let aspect = persp.aspect_ratio( ).unwrap_or( 4.0 / 3.0 );
        let h_fov = 2.0 * ( ( persp.yfov( ) * 0.5 ).tan( ) * aspect ).atan( );
        Some( CameraDesc {
          position: mat4_translation( world )
        , forward: mat4_transform_dir( world, Vec3::new( 0.0, 0.0, -1.0 ) ).normalize( )
        , up: mat4_transform_dir( world, Vec3::new( 0.0, 1.0, 0.0 ) ).normalize( )
        , h_fov
        , aspect
        } )
      },
      gltf::camera::Projection::Orthographic( _ ) => {
        log::warn!( "orthographic cameras are unsupported, falling back to the default camera" );
        None
      }
    }
  }

  fn convert_primitive( &mut self
                       , primitive : &gltf::Primitive
                       , world     : &Mat4
                       , materials : &[ Material ]
                       , triangles : &mut Vec< Triangle >
                       ) {
    if primitive.mode( ) != gltf::mesh::Mode::Triangles {
      self.skipped_primitives += 1;
      return;
    }

    let reader = primitive.reader( | buffer | Some( &self.buffers[ buffer.index( ) ] ) );

    let positions : Vec< Vec3 > = match reader.read_positions( ) {
      Some( it ) => it.map( | p | mat4_transform_point( world, Vec3::new( p[ 0 ], p[ 1 ], p[ 2 ] ) ) ).collect( )
    , None => { self.skipped_primitives += 1; return; }
    };

    let normals : Option< Vec< Vec3 > > = reader.read_normals( )
      .map( | it | it.map( | n | mat4_transform_dir( world, Vec3::new( n[ 0 ], n[ 1 ], n[ 2 ] ) ).normalize( ) ).collect( ) );

    let uvs : Option< Vec< Vec2 > > = reader.read_tex_coords( 0 )
      .map( | it | it.into_f32( ).map( | uv | Vec2::new( uv[ 0 ], uv[ 1 ] ) ).collect( ) );

    let indices : Vec< u32 > = match reader.read_indices( ) {
      Some( it ) => it.into_u32( ).collect( )
    , None => ( 0..positions.len( ) as u32 ).collect( )
    };

    let material_index = primitive.material( ).index( ).unwrap_or( 0 ).min( materials.len( ).saturating_sub( 1 ) ) as u8;

    for tri in indices.chunks_exact( 3 ) {
      let ( i0, i1, i2 ) = ( tri[ 0 ] as usize, tri[ 1 ] as usize, tri[ 2 ] as usize );
      let v = [ positions[ i0 ], positions[ i1 ], positions[ i2 ] ];

      let e1 = v[ 1 ] - v[ 0 ];
      let e2 = v[ 2 ] - v[ 0 ];
      if e1.cross( e2 ).len_sq( ) < 1e-12 || v.iter( ).any( | p | p.is_nan( ) ) {
        self.degenerate_triangles += 1;
        continue;
      }

      let n = match &normals {
        Some( ns ) => [ ns[ i0 ], ns[ i1 ], ns[ i2 ] ]
      , None => { let flat = e1.cross( e2 ).normalize( ); [ flat; 3 ] }
      };

      let uv = uvs.as_ref( ).map( | us | [ us[ i0 ], us[ i1 ], us[ i2 ] ] );

      triangles.push( Triangle::new( v, n, uv, material_index ) );
    }
  }

  fn convert_material( &mut self, material : &gltf::Material ) -> Material {
    let pbr = material.pbr_metallic_roughness( );
    let mut out = Material::default( );

    let bc = pbr.base_color_factor( );
    out.base_color = Vec4::new( bc[ 0 ], bc[ 1 ], bc[ 2 ], bc[ 3 ] );
    out.roughness = pbr.roughness_factor( );
    out.metallic = pbr.metallic_factor( );

    let em = material.emissive_factor( );
    out.emissive = Vec3::new( em[ 0 ], em[ 1 ], em[ 2 ] );
    if let Some( strength ) = material.emissive_strength( ) {
      out.emissive = out.emissive * strength;
    }

    out.alpha_cutoff = material.alpha_cutoff( ).unwrap_or( 0.5 );
    out.alpha_mode = match material.alpha_mode( ) {
      gltf::material::AlphaMode::Opaque => AlphaMode::Opaque
    , gltf::material::AlphaMode::Mask => AlphaMode::Mask
    , gltf::material::AlphaMode::Blend => AlphaMode::Blend
    };

    if let Some( ior ) = material.ior( ) {
      out.ior = ior;
    }

    if let Some( transmission ) = material.transmission( ) {
      out.transmission = transmission.transmission_factor( );
      if let Some( info ) = transmission.transmission_texture( ) {
        out.transmission_texture = self.resolve_texture( &info.texture( ), Encoding::Linear );
      }
    }

    if let Some( specular ) = material.specular( ) {
      out.specular = specular.specular_factor( );
      let sc = specular.specular_color_factor( );
      out.specular_color = Vec3::new( sc[ 0 ], sc[ 1 ], sc[ 2 ] );
      if let Some( info ) = specular.specular_color_texture( ) {
        out.specular_color_texture = self.resolve_texture( &info.texture( ), Encoding::Srgb );
      }
    }

    if let Some( volume ) = material.volume( ) {
      out.thickness = volume.thickness_factor( );
      out.attenuation_distance = volume.attenuation_distance( );
      let ac = volume.attenuation_color( );
      out.attenuation_color = Vec3::new( ac[ 0 ], ac[ 1 ], ac[ 2 ] );
    }

    if let Some( info ) = pbr.base_color_texture( ) {
      out.base_color_texture = self.resolve_texture( &info.texture( ), Encoding::Srgb );
      out.uv_transform = texture_transform( &info );
    }
    if let Some( info ) = pbr.metallic_roughness_texture( ) {
      out.metallic_roughness_texture = self.resolve_texture( &info.texture( ), Encoding::Linear );
    }
    if let Some( info ) = material.emissive_texture( ) {
      out.emissive_texture = self.resolve_texture( &info.texture( ), Encoding::Srgb );
    }
    if let Some( info ) = material.normal_texture( ) {
      out.normal_texture = self.resolve_texture( &info.texture( ), Encoding::Normal );
    }
    if let Some( info ) = material.occlusion_texture( ) {
      out.occlusion_texture = self.resolve_texture( &info.texture( ), Encoding::Linear );
    }

    out
  }

  /// Resolves a glTF texture reference to a slot index in `self.textures`,
  /// decoding and caching it the first time a given `(image, encoding)`
  /// combination is seen. Returns `NO_TEXTURE` if the image can't be decoded
  /// or the 255-texture budget is exhausted; the caller keeps using the
  /// material's constant factor in that case.
  fn resolve_texture( &mut self, texture : &gltf::Texture, encoding : Encoding ) -> u8 {
    let image_index = texture.source( ).index( );
    let key = ( image_index, encoding );
    if let Some( &idx ) = self.texture_cache.get( &key ) {
      return idx;
    }

    let image = match self.images.get( image_index ) {
      Some( image ) => image
    , None => {
        let err = TextureLoadError {
          path: PathBuf::from( format!( "<embedded image {}>", image_index ) )
        , reason: "referenced image index is out of range".to_string( )
        };
        log::warn!( "{}, falling back to the material's factor", err );
        return NO_TEXTURE;
      }
    };

    let rgba = to_rgba8( image );
    let wrap = wrap_mode( texture );

    if self.textures.len( ) >= NO_TEXTURE as usize {
      log::warn!( "texture budget (255) exhausted, image {} falls back to its factor", image_index );
      return NO_TEXTURE;
    }

    let idx = self.textures.len( ) as u8;
    self.textures.push( Texture::from_rgba8( image.width, image.height, &rgba, encoding, wrap ) );
    self.texture_cache.insert( key, idx );
    idx
  }
}

/// Converts glTF's `KHR_texture_transform` offset/rotation/scale into the
/// material's single UV-transform matrix. Only the base-color texture's
/// transform is carried (the reference renderer applies one transform per
/// material, not per slot).
fn texture_transform( info : &gltf::texture::Info ) -> Mat3 {
  match info.texture_transform( ) {
    Some( t ) => {
      let offset = t.offset( );
      let scale = t.scale( );
      let rotation = t.rotation( );
      let ( s, c ) = rotation.sin_cos( );
      Mat3::from_cols(
        Vec3::new( c * scale[ 0 ], s * scale[ 0 ], 0.0 )
      , Vec3::new( -s * scale[ 1 ], c * scale[ 1 ], 0.0 )
      , Vec3::new( offset[ 0 ], offset[ 1 ], 1.0 )
      )
    }
  , None => Mat3::IDENTITY
  }
}

fn wrap_mode( texture : &gltf::Texture ) -> WrapMode {
  use gltf::texture::WrappingMode;
  match texture.sampler( ).wrap_s( ) {
    WrappingMode::ClampToEdge => WrapMode::Clamp
  , WrappingMode::Repeat | WrappingMode::MirroredRepeat => WrapMode::Repeat
  }
}

/// Converts a decoded glTF image to tightly packed RGBA8, the only format
/// `Texture::from_rgba8` accepts. Formats without an alpha channel get a
/// fully-opaque one; 16-bit and float formats are truncated/quantized to 8
/// bits per channel.
fn to_rgba8( image : &gltf::image::Data ) -> Vec< u8 > {
  use gltf::image::Format;

  let n = ( image.width * image.height ) as usize;
  let mut out = Vec::with_capacity( n * 4 );

  match image.format {
    Format::R8 => {
      for &r in &image.pixels { out.extend_from_slice( &[ r, r, r, 255 ] ); }
    },
    Format::R8G8 => {
      for px in image.pixels.chunks_exact( 2 ) { out.extend_from_slice( &[ px[ 0 ], px[ 1 ], 0, 255 ] ); }
    },
    Format::R8G8B8 => {
      for px in image.pixels.chunks_exact( 3 ) { out.extend_from_slice( &[ px[ 0 ], px[ 1 ], px[ 2 ], 255 ] ); }
    },
    Format::R8G8B8A8 => {
      out.extend_from_slice( &image.pixels );
    },
    Format::R16 => {
      for px in image.pixels.chunks_exact( 2 ) { let r = px[ 1 ]; out.extend_from_slice( &[ r, r, r, 255 ] ); }
    },
    Format::R16G16 => {
      for px in image.pixels.chunks_exact( 4 ) { out.extend_from_slice( &[ px[ 1 ], px[ 3 ], 0, 255 ] ); }
    },
    Format::R16G16B16 => {
      for px in image.pixels.chunks_exact( 6 ) { out.extend_from_slice( &[ px[ 1 ], px[ 3 ], px[ 5 ], 255 ] ); }
    },
    Format::R16G16B16A16 => {
      for px in image.pixels.chunks_exact( 8 ) { out.extend_from_slice( &[ px[ 1 ], px[ 3 ], px[ 5 ], px[ 7 ] ] ); }
    },
    Format::R32G32B32FLOAT => {
      for px in image.pixels.chunks_exact( 12 ) {
        for c in 0..3 {
          let f = f32::from_le_bytes( [ px[ c*4 ], px[ c*4+1 ], px[ c*4+2 ], px[ c*4+3 ] ] );
          out.push( ( f.clamp( 0.0, 1.0 ) * 255.0 ) as u8 );
        }
        out.push( 255 );
      }
    },
    Format::R32G32B32A32FLOAT => {
      for px in image.pixels.chunks_exact( 16 ) {
        for c in 0..4 {
          let f = f32::from_le_bytes( [ px[ c*4 ], px[ c*4+1 ], px[ c*4+2 ], px[ c*4+3 ] ] );
          out.push( ( f.clamp( 0.0, 1.0 ) * 255.0 ) as u8 );
        }
      }
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_camera_looks_down_negative_z( ) {
    let cam = CameraDesc::default_camera( );
    assert_eq!( cam.forward, Vec3::new( 0.0, 0.0, -1.0 ) );
    assert!( ( cam.aspect - 4.0 / 3.0 ).abs( ) < 1e-5 );
  }

  #[test]
  fn mat4_identity_composes_to_identity( ) {
    let m = mat4_mul( &MAT4_IDENTITY, &MAT4_IDENTITY );
    let p = mat4_transform_point( &m, Vec3::new( 1.0, 2.0, 3.0 ) );
    assert_eq!( p, Vec3::new( 1.0, 2.0, 3.0 ) );
  }

  #[test]
  fn rgba8_passthrough_preserves_bytes( ) {
    let data = gltf::image::Data { pixels: vec![ 10, 20, 30, 40 ], format: gltf::image::Format::R8G8B8A8, width: 1, height: 1 };
    assert_eq!( to_rgba8( &data ), vec![ 10, 20, 30, 40 ] );
  }

  #[test]
  fn rgb8_gets_opaque_alpha( ) {
    let data = gltf::image::Data { pixels: vec![ 10, 20, 30 ], format: gltf::image::Format::R8G8B8, width: 1, height: 1 };
    assert_eq!( to_rgba8( &data ), vec![ 10, 20, 30, 255 ] );
  }
}
