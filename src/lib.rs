//! Offline CPU path tracer library: glTF scene loading, BVH construction and
//! traversal, and a Monte Carlo microfacet path integrator. `main.rs` is a
//! thin CLI wrapper over this crate's public API.

pub mod cli;
pub mod error;
pub mod graphics;
pub mod math;
pub mod output;
pub mod render;
pub mod rng;

pub use cli::Params;
pub use error::RenderError;
pub use graphics::bvh::BVH;
pub use graphics::scene::Scene;
pub use render::{render, Framebuffer};
