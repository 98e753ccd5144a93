// Local imports
use crate::math::{Mat3, Vec2, Vec3, Vec4};
use crate::graphics::texture::Texture;

/// How a material's alpha channel is meant to be interpreted. The
/// integrator does not currently honor the `Blend`/`Mask` distinction (see
/// DESIGN.md); it is carried on the struct because it is part of the
/// glTF material model.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum AlphaMode {
  Opaque,
  Blend,
  Mask
}

/// A sentinel meaning "this optional texture slot is unused".
pub const NO_TEXTURE : u8 = u8::MAX;

/// A glTF-flavored PBR material: constant factors plus up to nine optional
/// texture slots. A factor multiplies its texture's sample when both are
/// present; with no texture, the factor is the material's value everywhere.
#[derive(Clone,Debug)]
pub struct Material {
  pub base_color        : Vec4,
  pub emissive          : Vec3,
  pub specular_color    : Vec3,
  pub attenuation_color : Vec3,

  pub roughness            : f32,
  pub metallic             : f32,
  pub ior                  : f32,
  pub occlusion            : f32,
  pub transmission         : f32,
  pub specular             : f32,
  pub alpha_cutoff         : f32,
  pub thickness            : f32,
  pub attenuation_distance : f32,

  pub uv_transform : Mat3,

  pub base_color_texture         : u8,
  pub occlusion_texture          : u8,
  pub specular_color_texture     : u8,
  pub emissive_texture           : u8,
  pub normal_texture             : u8,
  pub metallic_roughness_texture : u8,
  pub transmission_texture       : u8,

  pub alpha_mode : AlphaMode
}

impl Default for Material {
  fn default( ) -> Material {
    Material {
      base_color: Vec4::ONE
    , emissive: Vec3::ZERO
    , specular_color: Vec3::ONE
    , attenuation_color: Vec3::ONE
    , roughness: 1.0
    , metallic: 1.0
    , ior: 1.5
    , occlusion: 1.0
    , transmission: 0.0
    , specular: 1.0
    , alpha_cutoff: 0.5
    , thickness: 0.0
    , attenuation_distance: f32::MAX
    , uv_transform: Mat3::IDENTITY
    , base_color_texture: NO_TEXTURE
    , occlusion_texture: NO_TEXTURE
    , specular_color_texture: NO_TEXTURE
    , emissive_texture: NO_TEXTURE
    , normal_texture: NO_TEXTURE
    , metallic_roughness_texture: NO_TEXTURE
    , transmission_texture: NO_TEXTURE
    , alpha_mode: AlphaMode::Opaque
    }
  }
}

impl Material {
  pub fn has_texture( slot : u8 ) -> bool {
    slot != NO_TEXTURE
  }
}

/// A material evaluated at a single shading point: the value every BSDF/
/// lighting routine actually consumes. Produced by `sample_material` from a
/// `Material`, its textures and an interpolated UV.
#[derive(Clone,Copy,Debug)]
pub struct SampledData {
  pub base_color   : Vec4,
  pub ao           : f32,
  pub roughness    : f32,
  pub metallic     : f32,
  pub emissive     : Vec3,
  pub normal       : Vec3,
  pub transmission : f32,
  pub ior          : f32,
  pub thickness    : f32,
  pub is_opaque    : bool
}

/// Evaluates `material` at `uv`, sampling each present texture slot and
/// combining it with the corresponding factor. Occlusion/roughness/metallic
/// share a single packed ORM texture when present. The normal defaults to
/// tangent-space `+Z` (no perturbation) absent a normal map.
pub fn sample_material( material : &Material, textures : &[ Texture ], uv : Vec2 ) -> SampledData {
  let uv = material.uv_transform.mul_uv( uv );

  let mut base_color = material.base_color;
  if Material::has_texture( material.base_color_texture ) {
    base_color = base_color * textures[ material.base_color_texture as usize ].sample( uv );
  }

  let mut ao = material.occlusion;
  let mut roughness = material.roughness;
  let mut metallic = material.metallic;
  if Material::has_texture( material.metallic_roughness_texture ) {
    let orm = textures[ material.metallic_roughness_texture as usize ].sample3( uv );
    ao = orm.x;
    roughness = roughness * orm.y;
    metallic = metallic * orm.z;
  }

  let mut emissive = material.emissive;
  if Material::has_texture( material.emissive_texture ) {
    emissive = emissive * textures[ material.emissive_texture as usize ].sample3( uv );
  }

  let mut normal = Vec3::new( 0.0, 0.0, 1.0 );
  if Material::has_texture( material.normal_texture ) {
    normal = textures[ material.normal_texture as usize ].sample3( uv );
  }

  let mut transmission = material.transmission;
  if Material::has_texture( material.transmission_texture ) {
    transmission = transmission * textures[ material.transmission_texture as usize ].sample3( uv ).x;
  }

  SampledData {
    base_color
  , ao
  , roughness
  , metallic
  , emissive
  , normal
  , transmission
  , ior: material.ior
  , thickness: material.thickness
  , is_opaque: material.alpha_mode == AlphaMode::Opaque
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::texture::{Encoding, WrapMode};

  #[test]
  fn defaults_match_reference_material( ) {
    let m = Material::default( );
    assert_eq!( m.metallic, 1.0 );
    assert_eq!( m.roughness, 1.0 );
    assert_eq!( m.ior, 1.5 );
    assert_eq!( m.alpha_cutoff, 0.5 );
    assert_eq!( m.attenuation_distance, f32::MAX );
  }

  #[test]
  fn sampling_without_textures_returns_factors( ) {
    let mut m = Material::default( );
    m.base_color = Vec4::new( 0.2, 0.3, 0.4, 1.0 );
    m.roughness = 0.6;
    m.metallic = 0.1;
    let sample = sample_material( &m, &[ ], Vec2::ZERO );
    assert_eq!( sample.base_color.x, 0.2 );
    assert_eq!( sample.roughness, 0.6 );
    assert_eq!( sample.metallic, 0.1 );
    assert_eq!( sample.normal, Vec3::new( 0.0, 0.0, 1.0 ) );
  }

  #[test]
  fn base_color_texture_modulates_factor( ) {
    let mut m = Material::default( );
    m.base_color = Vec4::new( 0.5, 0.5, 0.5, 1.0 );
    m.base_color_texture = 0;
    let tex = Texture::from_rgba8( 1, 1, &[ 255, 0, 0, 255 ], Encoding::Srgb, WrapMode::Clamp );
    let sample = sample_material( &m, &[ tex ], Vec2::ZERO );
    assert!( ( sample.base_color.x - 0.5 ).abs( ) < 1e-5 );
    assert!( sample.base_color.y < 1e-5 );
  }

  #[test]
  fn packed_orm_overrides_roughness_and_metallic( ) {
    let mut m = Material::default( );
    m.metallic_roughness_texture = 0;
    let tex = Texture::from_rgba8( 1, 1, &[ 80, 60, 200, 255 ], Encoding::Linear, WrapMode::Clamp );
    let sample = sample_material( &m, &[ tex ], Vec2::ZERO );
    assert!( ( sample.ao - 80.0 / 255.0 ).abs( ) < 1e-4 );
    assert!( ( sample.roughness - 60.0 / 255.0 ).abs( ) < 1e-4 );
    assert!( ( sample.metallic - 200.0 / 255.0 ).abs( ) < 1e-4 );
  }
}
