//! # Sandcrate Pipeline
//!
//! Ties the processing stages together into a tick-driven cycle: a shared
//! depth sensor feeds one or more [`SandboxPipeline`] instances, each of
//! which turns the latest frame into a colored grid mesh or point cloud
//! and reports per-stage timings.
//!
//! ```no_run
//! use sandcrate_pipeline::{LatestFrameSlot, SandboxParameters, SandboxPipeline, SharedSensor};
//!
//! let sensor = SharedSensor::new(LatestFrameSlot::new(512, 424));
//! let mut pipeline = SandboxPipeline::new(&sensor)?;
//! let solution = pipeline.solve(&SandboxParameters::default());
//! println!("{}", solution.diagnostics);
//! # Ok::<(), sandcrate_core::Error>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod pipeline;
pub mod sensor;

pub use config::*;
pub use diagnostics::*;
pub use pipeline::*;
pub use sensor::*;
