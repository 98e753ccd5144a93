use std::path::PathBuf;
use thiserror::Error;

/// The crate's single error type. Each variant maps to one of the process
/// exit codes in `main`; there are no panics on the hot (rendering) path.
#[derive(Error, Debug)]
pub enum RenderError {
  #[error("invalid argument: {0}")]
  InvalidArgument( String ),

  #[error("failed to load scene {path}: {reason}")]
  SceneLoad { path : PathBuf, reason : String },

  #[error("failed to write output {path}: {reason}")]
  OutputWrite { path : PathBuf, reason : String },
}

/// A non-fatal texture load failure. Logged as a warning; the owning
/// material falls back to its factor-only path rather than aborting the
/// render (see `TestableProperties` / Error Handling Design).
#[derive(Error, Debug)]
#[error("failed to load texture {path}: {reason}")]
pub struct TextureLoadError {
  pub path   : PathBuf,
  pub reason : String
}
