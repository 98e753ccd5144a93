// Local imports
use crate::math::{lerp3, Vec3};
use crate::graphics::material::SampledData;

use std::f32::consts::PI;

/// The minimum alpha (`roughness^2`) fed to every distribution/PDF term, so
/// a perfectly smooth surface (`roughness=0`) never divides by zero.
const MIN_ALPHA : f32 = 0.001;

fn alpha_of( roughness : f32 ) -> f32 {
  ( roughness * roughness ).max( MIN_ALPHA )
}

/// Builds an orthonormal tangent frame around `n`. The fallback "up" axis
/// is world-Z, switching to world-X when `n` is nearly parallel to it, so
/// the cross product never degenerates.
pub fn tangent_frame( n : Vec3 ) -> ( Vec3, Vec3 ) {
  let up = if n.z.abs( ) < 0.999 { Vec3::new( 0.0, 0.0, 1.0 ) } else { Vec3::new( 1.0, 0.0, 0.0 ) };
  let tangent = up.cross( n ).normalize( );
  let bitangent = n.cross( tangent );
  ( tangent, bitangent )
}

fn to_world( h : Vec3, n : Vec3 ) -> Vec3 {
  let ( tangent, bitangent ) = tangent_frame( n );
  ( tangent * h.x + bitangent * h.y + n * h.z ).normalize( )
}

/// GGX (Trowbridge-Reitz) normal distribution.
pub fn distribution_ggx( n_dot_h : f32, roughness : f32 ) -> f32 {
  let a = alpha_of( roughness );
  let a2 = a * a;
  let n_dot_h = n_dot_h.max( 0.0001 );
  let n_dot_h2 = n_dot_h * n_dot_h;
  let denom = n_dot_h2 * ( a2 - 1.0 ) + 1.0;
  a2 / ( PI * denom * denom )
}

/// Beckmann normal distribution, used in place of GGX when `roughness <
/// 0.2` during importance sampling (sharper highlights at low roughness).
pub fn distribution_beckmann( n_dot_h : f32, roughness : f32 ) -> f32 {
  let alpha = alpha_of( roughness );
  let n_dot_h = n_dot_h.abs( ).max( 0.0001 );
  let n_dot_h2 = n_dot_h * n_dot_h;
  let tan2_theta = ( 1.0 - n_dot_h2 ) / n_dot_h2;
  let alpha2 = alpha * alpha;
  ( -tan2_theta / alpha2 ).exp( ) / ( PI * alpha2 * n_dot_h2 * n_dot_h2 )
}

pub fn fresnel_schlick( cos_theta : f32, f0 : Vec3 ) -> Vec3 {
  let m = ( 1.0 - cos_theta ).clamp( 0.0, 1.0 );
  let m5 = m * m * m * m * m;
  f0 + ( Vec3::ONE - f0 ) * m5
}

/// Schlick's approximation to the Smith geometry term, with `k = alpha/2`
/// (the "direct lighting" variant of `k`, matching the reference source).
pub fn geometry_schlick_ggx( n_dot_v : f32, roughness : f32 ) -> f32 {
  let k = alpha_of( roughness ) / 2.0;
  n_dot_v / ( n_dot_v * ( 1.0 - k ) + k )
}

fn f0_of( sample : &SampledData ) -> Vec3 {
  lerp3( Vec3::splat( 0.04 ), sample.base_color.xyz( ), sample.metallic )
}

/// The reflective BRDF: a GGX specular lobe plus a Lambert diffuse lobe,
/// weighted so energy is conserved between the two and scaled down by
/// `transmission` (transmissive surfaces give up some diffuse response to
/// their transmission lobe). Zero outside the upper hemisphere of either
/// `view` or `light`.
pub fn brdf( view : Vec3, normal : Vec3, light : Vec3, sample : &SampledData ) -> Vec3 {
  let n_dot_l = normal.dot( light );
  let n_dot_v = normal.dot( view );
  if n_dot_l < 0.0 || n_dot_v < 0.0 {
    return Vec3::ZERO;
  }

  let half = ( view + light ).normalize( );
  let f0 = f0_of( sample );

  let ndf = distribution_ggx( normal.dot( half ), sample.roughness );
  let f = fresnel_schlick( half.dot( view ).max( 0.0 ), f0 );
  let g = geometry_schlick_ggx( n_dot_l, sample.roughness ) * geometry_schlick_ggx( n_dot_v, sample.roughness );

  let k_d = ( Vec3::ONE - f ) * ( 1.0 - sample.metallic ) * ( 1.0 - sample.transmission );

  let denom = 4.0 * n_dot_v.max( 0.0 ) * n_dot_l.max( 0.0 ) + 0.001;
  let specular = f * ndf * g / denom;
  let diffuse = k_d * sample.base_color.xyz( ) / PI;

  diffuse + specular
}

/// The thin-surface transmission BTDF. Per Open Question #1 in the spec,
/// the Fresnel term here intentionally uses `clamp(V.N,0,1)` rather than
/// `H.V`, matching the reference implementation exactly rather than the
/// physically "more correct" half-vector form.
pub fn btdf( view : Vec3, normal : Vec3, light : Vec3, sample : &SampledData ) -> Vec3 {
  if sample.transmission <= 0.0 {
    return Vec3::ZERO;
  }

  // Flip the light direction across the normal, turning a transmission
  // direction back into one the GGX half-vector math can evaluate.
  let light = light + 2.0 * normal * ( -light ).dot( normal );

  let n_dot_l = normal.dot( light ).abs( );
  let n_dot_v = normal.dot( view ).abs( );
  if normal.dot( light ) < 0.0 || normal.dot( view ) < 0.0 {
    return Vec3::ZERO;
  }

  let f0 = Vec3::splat( 0.04 );
  let half = ( view + light ).normalize( );
  let ndf = distribution_ggx( normal.dot( half ), sample.roughness );
  let f = fresnel_schlick( normal.dot( view ).clamp( 0.0, 1.0 ), f0 );
  let g = geometry_schlick_ggx( n_dot_l, sample.roughness ) * geometry_schlick_ggx( n_dot_v, sample.roughness );

  let k_t = ( Vec3::ONE - f ) * sample.transmission * ( 1.0 - sample.metallic ) * sample.base_color.xyz( );

  let denom = 4.0 * n_dot_v.max( 0.0 ) * n_dot_l.max( 0.0 ) + 0.001;
  k_t * ndf * g / denom
}

/// Snell refraction of `incident` through a surface with `normal`, going
/// from a medium of index `from_ior` to one of `to_ior`. Returns `None`
/// under total internal reflection.
pub fn refract( incident : Vec3, normal : Vec3, from_ior : f32, to_ior : f32 ) -> Option< Vec3 > {
  let eta = from_ior / to_ior;
  let cos_i = -normal.dot( incident );
  let k = 1.0 - eta * eta * ( 1.0 - cos_i * cos_i );
  if k < 0.0 {
    None
  } else {
    Some( ( incident * eta + normal * ( eta * cos_i - k.sqrt( ) ) ).normalize( ) )
  }
}

pub fn isotropic_phase_pdf( ) -> f32 {
  1.0 / ( 4.0 * PI )
}

/// Henyey-Greenstein phase function PDF, anisotropy `g` taken from
/// `Params::henyey_greenstein_g`.
pub fn henyey_greenstein_pdf( view : Vec3, scatter : Vec3, g : f32 ) -> f32 {
  let cos_theta = view.dot( scatter );
  let denom = 1.0 + g * g - 2.0 * g * cos_theta;
  ( 1.0 - g * g ) / ( 4.0 * PI * denom * denom.sqrt( ) )
}

/// Importance-samples a GGX half-vector around `n`.
pub fn importance_sample_ggx( xi : ( f32, f32 ), roughness : f32, n : Vec3 ) -> Vec3 {
  let a = alpha_of( roughness );
  let phi = 2.0 * PI * xi.0;
  let cos_theta = ( ( 1.0 - xi.1 ) / ( 1.0 + ( a * a - 1.0 ) * xi.1 ) ).sqrt( );
  let sin_theta = ( 1.0 - cos_theta * cos_theta ).max( 0.0 ).sqrt( );
  to_world( Vec3::new( sin_theta * phi.cos( ), sin_theta * phi.sin( ), cos_theta ), n )
}

/// Importance-samples a Beckmann half-vector around `n`.
pub fn importance_sample_beckmann( xi : ( f32, f32 ), roughness : f32, n : Vec3 ) -> Vec3 {
  let alpha = alpha_of( roughness );
  let phi = 2.0 * PI * xi.0;
  let tan_theta2 = -alpha * alpha * ( 1.0 - xi.1 ).ln( );
  let cos_theta = 1.0 / ( 1.0 + tan_theta2 ).sqrt( );
  let sin_theta = ( 1.0 - cos_theta * cos_theta ).max( 0.0 ).sqrt( );
  to_world( Vec3::new( sin_theta * phi.cos( ), sin_theta * phi.sin( ), cos_theta ), n )
}

/// Cosine-weighted hemisphere sample around `n` (a direction, not a
/// half-vector: used directly as the Lambert-lobe outgoing direction).
pub fn importance_sample_lambert( xi : ( f32, f32 ), n : Vec3 ) -> Vec3 {
  let phi = 2.0 * PI * xi.0;
  let cos_theta = ( 1.0 - xi.1 ).sqrt( );
  let sin_theta = ( 1.0 - cos_theta * cos_theta ).max( 0.0 ).sqrt( );
  to_world( Vec3::new( sin_theta * phi.cos( ), sin_theta * phi.sin( ), cos_theta ), n )
}

/// Uniform hemisphere sample around `n`.
pub fn importance_sample_hemisphere( xi : ( f32, f32 ), n : Vec3 ) -> Vec3 {
  let phi = 2.0 * PI * xi.0;
  let cos_theta = 1.0 - xi.1;
  let sin_theta = ( 1.0 - cos_theta * cos_theta ).max( 0.0 ).sqrt( );
  to_world( Vec3::new( sin_theta * phi.cos( ), sin_theta * phi.sin( ), cos_theta ), n )
}

/// The PDF of the GGX half-vector sampling above, expressed as a PDF over
/// outgoing directions (the `4*VdotH` Jacobian of the half-vector
/// transform).
pub fn ggx_pdf( n : Vec3, h : Vec3, v : Vec3, roughness : f32 ) -> f32 {
  let n_dot_h = n.dot( h ).max( MIN_ALPHA );
  let v_dot_h = v.dot( h ).max( MIN_ALPHA );
  distribution_ggx( n_dot_h, roughness ) * n_dot_h / ( 4.0 * v_dot_h )
}

pub fn beckmann_pdf( n : Vec3, h : Vec3, v : Vec3, roughness : f32 ) -> f32 {
  let n_dot_h = n.dot( h ).max( MIN_ALPHA );
  let v_dot_h = v.dot( h ).max( MIN_ALPHA );
  distribution_beckmann( n_dot_h, roughness ) * n_dot_h / ( 4.0 * v_dot_h )
}

/// The power heuristic (exponent 2) used to weight BSDF-sampling and
/// light-sampling estimators under MIS.
pub fn power_heuristic( nf : i32, f_pdf : f32, ng : i32, g_pdf : f32 ) -> f32 {
  let f = nf as f32 * f_pdf;
  let g = ng as f32 * g_pdf;
  ( f * f ) / ( f * f + g * g )
}

/// Whether `sample` is smooth and fully metallic enough that the integrator
/// should skip the diffuse lobe entirely and always importance-sample
/// specular (a near-delta highlight, not a true mirror: `MIN_ALPHA` still
/// keeps the GGX lobe well-defined).
pub fn is_pure_mirror( sample : &SampledData ) -> bool {
  sample.metallic >= 0.999 && sample.roughness < 0.001
}

/// Combines the specular and diffuse PDFs per the 50/50 lobe-selection
/// scheme, halving again for any transmission-capable material regardless
/// of which lobe was actually sampled (a documented heuristic, not
/// MIS-consistent, preserved from the reference renderer).
pub fn combined_pdf( pdf_specular : f32, pdf_diffuse : f32, has_transmission : bool ) -> f32 {
  let pdf = 0.5 * ( pdf_specular + pdf_diffuse );
  if has_transmission { 0.5 * pdf } else { pdf }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::math::Vec4;

  fn flat_sample( roughness : f32, metallic : f32 ) -> SampledData {
    SampledData {
      base_color: Vec4::new( 0.8, 0.8, 0.8, 1.0 )
    , ao: 1.0
    , roughness
    , metallic
    , emissive: Vec3::ZERO
    , normal: Vec3::new( 0.0, 0.0, 1.0 )
    , transmission: 0.0
    , ior: 1.5
    , thickness: 0.0
    , is_opaque: true
    }
  }

  #[test]
  fn fresnel_at_normal_incidence_is_f0( ) {
    let f0 = Vec3::splat( 0.04 );
    let f = fresnel_schlick( 1.0, f0 );
    assert!( ( f.x - 0.04 ).abs( ) < 1e-5 );
  }

  #[test]
  fn fresnel_at_grazing_angle_approaches_one( ) {
    let f0 = Vec3::splat( 0.04 );
    let f = fresnel_schlick( 0.0, f0 );
    assert!( f.x > 0.9 );
  }

  #[test]
  fn brdf_is_zero_below_the_horizon( ) {
    let sample = flat_sample( 0.5, 0.0 );
    let n = Vec3::new( 0.0, 0.0, 1.0 );
    let v = Vec3::new( 0.0, 0.0, 1.0 );
    let l = Vec3::new( 0.0, 0.1, -1.0 ).normalize( );
    let f = brdf( v, n, l, &sample );
    assert_eq!( f, Vec3::ZERO );
  }

  #[test]
  fn btdf_is_zero_without_transmission( ) {
    let sample = flat_sample( 0.2, 0.0 );
    let n = Vec3::new( 0.0, 0.0, 1.0 );
    let v = Vec3::new( 0.0, 0.0, 1.0 );
    let l = Vec3::new( 0.0, 0.0, 1.0 );
    assert_eq!( btdf( v, n, l, &sample ), Vec3::ZERO );
  }

  #[test]
  fn ggx_importance_samples_stay_in_upper_hemisphere( ) {
    let n = Vec3::new( 0.0, 0.0, 1.0 );
    for i in 0..32 {
      let xi = ( ( i as f32 + 0.5 ) / 32.0, 0.3 );
      let h = importance_sample_ggx( xi, 0.4, n );
      assert!( h.dot( n ) >= -1e-5 );
    }
  }

  #[test]
  fn power_heuristic_is_symmetric_at_equal_pdfs( ) {
    let w = power_heuristic( 1, 0.5, 1, 0.5 );
    assert!( ( w - 0.5 ).abs( ) < 1e-5 );
  }

  #[test]
  fn refract_returns_none_under_total_internal_reflection( ) {
    let incident = Vec3::new( 0.99, 0.0, -0.14 ).normalize( );
    let normal = Vec3::new( 0.0, 0.0, 1.0 );
    assert!( refract( incident, normal, 1.5, 1.0 ).is_none( ) );
  }
}
