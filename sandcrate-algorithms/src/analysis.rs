//! Visualisation kinds that color a scene grid through a lookup table
//!
//! Every kind follows the same contract: it names a color ramp, a table
//! domain and an anchor, and it reduces each grid cell to a scalar that
//! indexes the table. Kinds differ only in that scalar and in their anchor
//! colors.

use crate::color_ramp::{ColorRamp, LookupTable, RangeOverflow};
use crate::grid::SceneGrid;
use sandcrate_core::{Hsl, Point3f};
use serde::{Deserialize, Serialize};

/// Inputs shared by every visualisation kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Depth of the zero-height plane (water level), in millimetres
    pub reference_elevation: f64,
    /// Number of depth values the elevation table covers
    pub depth_domain: usize,
}

/// How grid cells are colored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visualisation {
    /// Color by raw depth around the water level
    Elevation {
        #[serde(default)]
        overflow: RangeOverflow,
    },
    /// Color by compass direction the terrain faces downhill
    Aspect,
    /// Color by terrain steepness around a threshold angle
    Slope { threshold_degrees: f32 },
}

impl Default for Visualisation {
    fn default() -> Self {
        Visualisation::Elevation {
            overflow: RangeOverflow::Clamp,
        }
    }
}

const ASPECT_DOMAIN: usize = 360;
const SLOPE_DOMAIN: usize = 91;

impl Visualisation {
    /// Size of the lookup table
    pub fn domain_size(&self, params: &AnalysisParams) -> usize {
        match self {
            Visualisation::Elevation { .. } => params.depth_domain.max(1),
            Visualisation::Aspect => ASPECT_DOMAIN,
            Visualisation::Slope { .. } => SLOPE_DOMAIN,
        }
    }

    /// Table index both ranges are anchored at
    pub fn reference_index(&self, params: &AnalysisParams) -> usize {
        match self {
            Visualisation::Elevation { .. } => {
                clamp_index(params.reference_elevation, self.domain_size(params))
            }
            Visualisation::Aspect => 180,
            Visualisation::Slope { threshold_degrees } => {
                clamp_index(*threshold_degrees as f64, SLOPE_DOMAIN)
            }
        }
    }

    /// The two ranges of this kind
    pub fn ramp(&self, params: &AnalysisParams) -> ColorRamp {
        let reference = self.reference_index(params);
        match self {
            Visualisation::Elevation { overflow } => ColorRamp::anchored(
                // shoreline sand; land rises towards the sensor at lower depths
                Hsl::new(0.12, 0.7, 0.7),
                250,
                Hsl::new(0.0, 1.0, 0.35),
                60,
                Hsl::new(0.6, 0.6, 0.2),
            )
            .with_overflow(*overflow),
            Visualisation::Aspect => ColorRamp::anchored(
                Hsl::new(1.0, 1.0, 0.3),
                180,
                Hsl::new(1.0, 1.0, 1.0),
                180,
                Hsl::new(1.0, 1.0, 1.0),
            ),
            Visualisation::Slope { .. } => ColorRamp::anchored(
                Hsl::new(0.08, 1.0, 0.5),
                reference,
                Hsl::new(0.33, 0.8, 0.4),
                SLOPE_DOMAIN - 1 - reference,
                Hsl::new(0.0, 1.0, 0.35),
            ),
        }
    }

    /// Fingerprint used to decide whether a cached table is still valid
    pub fn table_key(&self, params: &AnalysisParams) -> u64 {
        self.ramp(params)
            .table_key(self.domain_size(params), self.reference_index(params))
    }

    pub fn compute_lookup_table(&self, params: &AnalysisParams) -> LookupTable {
        LookupTable::build(
            &self.ramp(params),
            self.domain_size(params),
            self.reference_index(params),
        )
    }

    /// Map a scalar from [`Visualisation::scalar_at`] to a table index
    pub fn sample_index_for(&self, value: f64, params: &AnalysisParams) -> usize {
        if !value.is_finite() {
            return self.reference_index(params);
        }
        match self {
            Visualisation::Aspect => {
                (value.rem_euclid(360.0).floor() as usize).min(ASPECT_DOMAIN - 1)
            }
            _ => clamp_index(value, self.domain_size(params)),
        }
    }

    /// Scalar driving the color of cell `(x, y)` of the grid
    pub fn scalar_at(&self, grid: &SceneGrid, x: usize, y: usize) -> f64 {
        match self {
            Visualisation::Elevation { .. } => grid.depths[y * grid.width + x] as f64,
            Visualisation::Aspect => {
                let (dzdx, dzdy) = gradient(grid, x, y);
                if dzdx == 0.0 && dzdy == 0.0 {
                    // flat cells report north
                    0.0
                } else {
                    (-dzdx).atan2(-dzdy).to_degrees().rem_euclid(360.0)
                }
            }
            Visualisation::Slope { .. } => {
                let (dzdx, dzdy) = gradient(grid, x, y);
                (dzdx * dzdx + dzdy * dzdy).sqrt().atan().to_degrees()
            }
        }
    }

    /// Fill `grid.colors` from `table`
    pub fn colorize(&self, grid: &mut SceneGrid, table: &LookupTable, params: &AnalysisParams) {
        let mut colors = std::mem::take(&mut grid.colors);
        colors.clear();
        colors.reserve(grid.len());
        for y in 0..grid.height {
            for x in 0..grid.width {
                let scalar = self.scalar_at(grid, x, y);
                colors.push(table.get(self.sample_index_for(scalar, params)));
            }
        }
        grid.colors = colors;
    }
}

fn clamp_index(value: f64, domain_size: usize) -> usize {
    let last = domain_size.saturating_sub(1);
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.round() as usize).min(last)
}

/// Central-difference height gradient in scene units, clamped at the edges
fn gradient(grid: &SceneGrid, x: usize, y: usize) -> (f64, f64) {
    let x0 = x.saturating_sub(1);
    let x1 = (x + 1).min(grid.width - 1);
    let y0 = y.saturating_sub(1);
    let y1 = (y + 1).min(grid.height - 1);

    let slope = |a: Point3f, b: Point3f, run: f32| {
        if run.abs() <= f32::EPSILON {
            0.0
        } else {
            ((b.z - a.z) / run) as f64
        }
    };

    let (left, right) = (grid.point(x0, y), grid.point(x1, y));
    let (up, down) = (grid.point(x, y0), grid.point(x, y1));
    (slope(left, right, right.x - left.x), slope(up, down, down.y - up.y))
}
