//! # Sandcrate Algorithms
//!
//! The per-tick processing stages between a raw depth frame and renderable
//! geometry: temporal averaging, spatial blur, region-of-interest cropping
//! with the sensor-to-scene transform, color lookup tables, and grid
//! meshing with cached topology.

pub mod analysis;
pub mod averaging;
pub mod color_ramp;
pub mod filtering;
pub mod grid;
pub mod meshing;

// Re-export commonly used items
pub use analysis::*;
pub use averaging::*;
pub use color_ramp::*;
pub use filtering::*;
pub use grid::*;
pub use meshing::*;
