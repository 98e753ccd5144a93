// External imports
use clap::Parser;
use std::path::PathBuf;

/// Offline CPU path tracer: loads a glTF scene, builds a BVH over it, and
/// renders it to a PNG with a Monte Carlo microfacet path integrator.
#[derive(Parser,Debug)]
#[command(name = "pathtracer", version, about)]
pub struct Cli {
  /// Input scene (glTF `.gltf`/`.glb`).
  #[arg(long = "in", value_name = "PATH")]
  pub in_path : PathBuf,

  /// Output PNG.
  #[arg(long = "out", value_name = "PATH")]
  pub out_path : PathBuf,

  /// Output height in pixels; width is derived from the scene's aspect.
  #[arg(long, default_value_t = 720)]
  pub height : u32,

  /// Indirect samples taken at the first bounce.
  #[arg(long, default_value_t = 16)]
  pub samples : u32,

  /// Maximum recursion depth.
  #[arg(long, default_value_t = 3)]
  pub bounces : u32,

  /// Samples per pixel (MSAA).
  #[arg(long, default_value_t = 1)]
  pub msaa : u32,

  /// Henyey-Greenstein phase-function anisotropy used for thick
  /// transmissive volumes.
  #[arg(long = "hg-g", default_value_t = -0.55)]
  pub hg_g : f32
}

/// The fully resolved render configuration, threaded from the CLI entry
/// point through scene loading and rendering. Distinct from `Cli` so the
/// render pipeline never depends on `clap`.
#[derive(Clone,Debug)]
pub struct Params {
  pub in_path  : PathBuf,
  pub out_path : PathBuf,
  pub height   : u32,
  pub samples  : u32,
  pub bounces  : u32,
  pub msaa     : u32,
  pub henyey_greenstein_g : f32
}

impl From< Cli > for Params {
  fn from( cli : Cli ) -> Params {
    Params {
      in_path: cli.in_path
    , out_path: cli.out_path
    , height: cli.height
    , samples: cli.samples
    , bounces: cli.bounces
    , msaa: cli.msaa.max( 1 )
    , henyey_greenstein_g: cli.hg_g
    }
  }
}

impl Cli {
  /// Validates the parsed arguments beyond what `clap` checks structurally
  /// (non-zero dimensions, sane sample/bounce counts).
  pub fn validate( &self ) -> Result< ( ), crate::error::RenderError > {
    if self.height == 0 {
      return Err( crate::error::RenderError::InvalidArgument( "--height must be greater than zero".into( ) ) );
    }
    if self.samples == 0 {
      return Err( crate::error::RenderError::InvalidArgument( "--samples must be greater than zero".into( ) ) );
    }
    if !( -1.0..=1.0 ).contains( &self.hg_g ) {
      return Err( crate::error::RenderError::InvalidArgument( "--hg-g must be within [-1, 1]".into( ) ) );
    }
    Ok( ( ) )
  }
}
