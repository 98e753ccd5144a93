// External imports
use clap::Parser;
// Local imports
use pathtracer::cli::{Cli, Params};
use pathtracer::error::RenderError;
use pathtracer::graphics::bvh::BVH;
use pathtracer::graphics::scene;
use pathtracer::{output, render};

fn main( ) {
  env_logger::init( );

  let cli = Cli::parse( );
  std::process::exit( run( cli ) );
}

fn run( cli : Cli ) -> i32 {
  if let Err( e ) = cli.validate( ) {
    log::error!( "{e}" );
    return 1;
  }
  let params : Params = cli.into( );

  let scene = match scene::load( &params.in_path ) {
    Ok( scene ) => scene
  , Err( e ) => {
      log::error!( "{e}" );
      return exit_code( &e );
    }
  };

  log::info!( "building BVH over {} triangles", scene.triangles.len( ) );
  let bvh = BVH::build( &scene.triangles );

  let framebuffer = render::render( &scene, &bvh, &params );

  if let Err( e ) = output::write_png( &framebuffer, &params.out_path ) {
    log::error!( "{e}" );
    return exit_code( &e );
  }

  0
}

fn exit_code( error : &RenderError ) -> i32 {
  match error {
    RenderError::InvalidArgument( _ ) => 1
  , RenderError::SceneLoad { .. }     => 2
  , RenderError::OutputWrite { .. }   => 3
  }
}
