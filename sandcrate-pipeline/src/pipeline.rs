//! The per-tick sensor-to-geometry pipeline
//!
//! Each [`SandboxPipeline`] owns its own caches (frame history, blur
//! buffers, color table, mesh topology) and its own sensor lease. Several
//! instances may share one sensor, but caches are never shared between them.

use crate::config::{OutputKind, SandboxParameters};
use crate::diagnostics::{Diagnostics, Stage};
use crate::sensor::{FrameSource, SensorLease, SharedSensor};
use sandcrate_algorithms::{
    GeometryBuilder, PixelPitch, SceneGrid, SpatialFilter, TableCache, TemporalAverager, UnitTransform,
};
use sandcrate_core::{ColoredPointCloud3f, GridMesh, Result};
use std::time::Duration;

/// Note recorded when a cycle finds no frame to work on
pub const NO_SENSOR_DATA: &str = "no sensor data";

/// Note recorded when a cycle sees the same frame as the previous one
pub const STALE_FRAME: &str = "stale frame";

/// Note recorded when the mesh faces had to be rebuilt
pub const FACE_REMESHING: &str = "Face remeshing";

/// Geometry produced by one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry<'a> {
    /// Nothing to show this cycle
    Empty,
    Mesh(&'a GridMesh),
    PointCloud(&'a ColoredPointCloud3f),
}

impl Geometry<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Empty => true,
            Geometry::Mesh(mesh) => mesh.vertices.is_empty(),
            Geometry::PointCloud(cloud) => cloud.is_empty(),
        }
    }
}

/// Outputs of [`SandboxPipeline::solve`]
#[derive(Debug, Clone)]
pub struct Solution<'a> {
    pub geometry: Geometry<'a>,
    pub diagnostics: Diagnostics,
    /// Delay before the host should run the next cycle, `None` for manual
    pub next_tick: Option<Duration>,
}

/// One pipeline instance bound to a shared sensor
pub struct SandboxPipeline<S: FrameSource> {
    lease: SensorLease<S>,
    averager: TemporalAverager,
    filter: SpatialFilter,
    tables: TableCache,
    builder: GeometryBuilder,
    mesh: GridMesh,
    cloud: ColoredPointCloud3f,
    last_sequence: Option<u64>,
}

impl<S: FrameSource> SandboxPipeline<S> {
    /// Create a pipeline, taking a reference on the sensor
    pub fn new(sensor: &SharedSensor<S>) -> Result<Self> {
        Ok(Self {
            lease: sensor.acquire()?,
            averager: TemporalAverager::new(1),
            filter: SpatialFilter::new(1),
            tables: TableCache::new(),
            builder: GeometryBuilder::new(),
            mesh: GridMesh::new(),
            cloud: ColoredPointCloud3f::new(),
            last_sequence: None,
        })
    }

    pub fn sensor(&self) -> &SharedSensor<S> {
        self.lease.sensor()
    }

    pub fn averager(&self) -> &TemporalAverager {
        &self.averager
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    pub fn builder(&self) -> &GeometryBuilder {
        &self.builder
    }

    /// Run one cycle against whatever frame the sensor currently holds
    ///
    /// Never fails: a missing frame yields empty geometry, and out-of-range
    /// parameters are clamped.
    pub fn solve(&mut self, params: &SandboxParameters) -> Solution<'_> {
        let mut diagnostics = Diagnostics::new();
        let next_tick = params.schedule().interval();

        self.averager.set_frame_count(params.frame_count());
        self.filter.set_radius(params.blur());

        let Some(frame) = self.lease.current_frame() else {
            log::warn!("No sensor data available, skipping cycle");
            diagnostics.note(NO_SENSOR_DATA);
            return Solution {
                geometry: Geometry::Empty,
                diagnostics,
                next_tick,
            };
        };

        if self.last_sequence == Some(frame.sequence()) {
            diagnostics.note(STALE_FRAME);
        }
        self.last_sequence = Some(frame.sequence());

        let filter = &mut self.filter;
        let blurred = diagnostics.time(Stage::Blur, || filter.apply(&frame));
        self.averager.push(blurred);

        let averager = &mut self.averager;
        let Some(averaged) = diagnostics.time(Stage::Averaging, || averager.average_frame()) else {
            diagnostics.note(NO_SENSOR_DATA);
            return Solution {
                geometry: Geometry::Empty,
                diagnostics,
                next_tick,
            };
        };

        let transform = UnitTransform {
            pitch: PixelPitch::for_sensor(
                params.sensor_height(),
                params.field_of_view,
                averaged.width(),
                averaged.height(),
            ),
            unit_scale: params.unit_scale(),
            reference_elevation: params.reference_elevation,
            depth_domain: params.depth_domain,
        };
        let mut grid = diagnostics.time(Stage::PointCloudGeneration, || {
            SceneGrid::build(&averaged, &params.roi, &transform)
        });

        if params.colored {
            let tables = &mut self.tables;
            diagnostics.time(Stage::Coloring, || {
                let analysis = params.analysis();
                let vis = params.visualisation;
                let table = tables.get_or_build(vis.table_key(&analysis), || vis.compute_lookup_table(&analysis));
                vis.colorize(&mut grid, table, &analysis);
            });
        }

        let geometry = match params.output {
            OutputKind::Mesh => {
                let (builder, mesh) = (&mut self.builder, &mut self.mesh);
                let rebuilt = diagnostics.time(Stage::Meshing, || builder.update_mesh(mesh, &grid, params.colored));
                if rebuilt {
                    diagnostics.note(FACE_REMESHING);
                }
                Geometry::Mesh(&self.mesh)
            }
            OutputKind::PointCloud => {
                let cloud = &mut self.cloud;
                diagnostics.time(Stage::PointCloudOutput, || GeometryBuilder::write_point_cloud(cloud, &grid));
                Geometry::PointCloud(&self.cloud)
            }
        };

        for timing in &diagnostics.timings {
            log::trace!("{}", timing);
        }

        Solution {
            geometry,
            diagnostics,
            next_tick,
        }
    }
}
