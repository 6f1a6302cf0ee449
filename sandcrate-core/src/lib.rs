//! Core data structures and traits for sandcrate
//!
//! This crate provides the fundamental types shared by the depth-to-geometry
//! pipeline: depth frames, points, colors, grid meshes and point clouds.

pub mod color;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod point;
pub mod point_cloud;
pub mod traits;

pub use color::*;
pub use error::*;
pub use frame::*;
pub use mesh::*;
pub use point::*;
pub use point_cloud::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
