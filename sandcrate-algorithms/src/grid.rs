//! Region-of-interest cropping and sensor-to-scene coordinate transform

use sandcrate_core::{DepthFrame, Point3f, Rgba, INVALID_DEPTH};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Rows and columns trimmed from each edge of the sensor grid
///
/// Edges are named as they appear in the scene. Column indices grow towards
/// negative world X, so `left` trims the highest column indices and `right`
/// trims the lowest ones. Rows grow towards negative world Y, so `top`
/// trims the lowest row indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Roi {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Roi {
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self { top, bottom, left, right }
    }

    /// Source column indices kept by the trim
    pub fn columns(&self, width: usize) -> Range<usize> {
        let end = width.saturating_sub(self.left);
        self.right.min(end)..end
    }

    /// Source row indices kept by the trim
    pub fn rows(&self, height: usize) -> Range<usize> {
        let end = height.saturating_sub(self.bottom);
        self.top.min(end)..end
    }

    /// Dimensions after trimming; an empty axis empties the whole grid
    pub fn cropped_size(&self, width: usize, height: usize) -> (usize, usize) {
        let w = self.columns(width).len();
        let h = self.rows(height).len();
        if w == 0 || h == 0 {
            (0, 0)
        } else {
            (w, h)
        }
    }
}

/// Sensor field of view in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for FieldOfView {
    /// Kinect v2 depth camera
    fn default() -> Self {
        Self {
            horizontal: 70.6,
            vertical: 60.0,
        }
    }
}

/// Ground distance covered by one depth pixel along each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPitch {
    pub x: f64,
    pub y: f64,
}

impl PixelPitch {
    /// Pitch for a sensor `height` above the reference plane
    ///
    /// Recomputed whenever the height changes; `height` and the result share
    /// the same length unit.
    pub fn for_sensor(height: f64, fov: FieldOfView, columns: usize, rows: usize) -> Self {
        Self {
            x: pitch_in_dimension(fov.horizontal, columns, height),
            y: pitch_in_dimension(fov.vertical, rows, height),
        }
    }
}

fn pitch_in_dimension(fov_degrees: f64, resolution: usize, height: f64) -> f64 {
    if resolution == 0 {
        return 0.0;
    }
    let span = 2.0 * height * (fov_degrees.to_radians() / 2.0).tan();
    span / resolution as f64
}

/// Maps pixel and depth coordinates into scene-space points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitTransform {
    pub pitch: PixelPitch,
    /// Scene units per millimetre
    pub unit_scale: f64,
    /// Depth of the zero-height plane, in millimetres
    pub reference_elevation: f64,
    /// Samples at or above this are treated as invalid
    pub depth_domain: usize,
}

impl UnitTransform {
    /// Replace invalid or out-of-domain samples with the reference elevation
    #[inline]
    pub fn sanitize(&self, sample: u16) -> f64 {
        if sample == INVALID_DEPTH || sample as usize >= self.depth_domain {
            self.reference_elevation
        } else {
            sample as f64
        }
    }

    /// Scene position of a source pixel with an already sanitized depth
    #[inline]
    pub fn to_world(&self, column: usize, row: usize, depth: f64) -> Point3f {
        Point3f::new(
            (column as f64 * self.pitch.x * -self.unit_scale) as f32,
            (row as f64 * self.pitch.y * -self.unit_scale) as f32,
            ((depth - self.reference_elevation) * -self.unit_scale) as f32,
        )
    }
}

/// The cropped, transformed grid for one cycle
///
/// `points`, `depths` and `colors` run parallel in row-major order over
/// `width * height` cells. `colors` stays empty until a visualisation fills
/// it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGrid {
    pub width: usize,
    pub height: usize,
    pub points: Vec<Point3f>,
    /// Sanitized depth of every cell, in millimetres
    pub depths: Vec<f32>,
    pub colors: Vec<Rgba>,
}

impl SceneGrid {
    /// Crop `frame` to `roi` and transform every kept pixel
    ///
    /// Points keep the coordinates of their source pixel, so trimming an
    /// edge does not shift the rest of the surface. Invalid and
    /// out-of-domain samples land on the reference plane.
    ///
    /// # Arguments
    /// * `frame` - Averaged and blurred depth frame
    /// * `roi` - Edge trims; trims covering a whole axis give an empty grid
    /// * `transform` - Pixel pitch, unit scale and reference elevation
    ///
    /// # Returns
    /// * `SceneGrid` - Row-major points and sanitized depths, no colors yet
    ///
    /// # Example
    /// ```rust
    /// use sandcrate_algorithms::{PixelPitch, Roi, SceneGrid, UnitTransform};
    /// use sandcrate_core::DepthFrame;
    ///
    /// let transform = UnitTransform {
    ///     pitch: PixelPitch { x: 1.0, y: 1.0 },
    ///     unit_scale: 1.0,
    ///     reference_elevation: 1000.0,
    ///     depth_domain: 1500,
    /// };
    /// let frame = DepthFrame::filled(5, 4, 990);
    /// let grid = SceneGrid::build(&frame, &Roi::new(1, 0, 0, 2), &transform);
    ///
    /// assert_eq!((grid.width, grid.height), (3, 3));
    /// assert_eq!(grid.points[0].x, -2.0);
    /// assert_eq!(grid.points[0].z, 10.0);
    /// ```
    pub fn build(frame: &DepthFrame, roi: &Roi, transform: &UnitTransform) -> Self {
        let (width, height) = roi.cropped_size(frame.width(), frame.height());
        let mut grid = SceneGrid {
            width,
            height,
            points: Vec::with_capacity(width * height),
            depths: Vec::with_capacity(width * height),
            colors: Vec::new(),
        };
        if width == 0 {
            return grid;
        }

        for row in roi.rows(frame.height()) {
            for column in roi.columns(frame.width()) {
                let depth = transform.sanitize(frame.get(column, row));
                grid.points.push(transform.to_world(column, row, depth));
                grid.depths.push(depth as f32);
            }
        }
        grid
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at a cropped-grid coordinate
    #[inline]
    pub fn point(&self, x: usize, y: usize) -> Point3f {
        self.points[y * self.width + x]
    }
}
