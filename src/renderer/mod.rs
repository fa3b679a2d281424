//! WebGPU rendering module
//!
//! Draws a [`SceneFrame`](crate::scene::SceneFrame): instanced, lit meshes
//! with exponential fog, plus blended particles.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::MeshRenderer;
pub use shapes::MeshData;
pub use vertex::{InstanceRaw, MeshVertex};
