//! Host-facing parameters of a pipeline instance

use sandcrate_algorithms::{AnalysisParams, FieldOfView, Roi, Visualisation};
use sandcrate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Length unit of the host document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Kilometers,
    Meters,
    Decimeters,
    Centimeters,
    #[default]
    Millimeters,
    Inches,
    Feet,
}

impl LengthUnit {
    /// Scene units per sensor millimetre
    pub fn scale(self) -> f64 {
        match self {
            LengthUnit::Kilometers => 0.0001,
            LengthUnit::Meters => 0.001,
            LengthUnit::Decimeters => 0.01,
            LengthUnit::Centimeters => 0.1,
            LengthUnit::Millimeters => 1.0,
            LengthUnit::Inches => 0.0393701,
            LengthUnit::Feet => 0.0328084,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kilometers" | "kilometres" | "km" => Ok(LengthUnit::Kilometers),
            "meters" | "metres" | "m" => Ok(LengthUnit::Meters),
            "decimeters" | "decimetres" | "dm" => Ok(LengthUnit::Decimeters),
            "centimeters" | "centimetres" | "cm" => Ok(LengthUnit::Centimeters),
            "millimeters" | "millimetres" | "mm" => Ok(LengthUnit::Millimeters),
            "inches" | "in" => Ok(LengthUnit::Inches),
            "feet" | "ft" => Ok(LengthUnit::Feet),
            other => Err(Error::Config(format!("unknown length unit '{}'", other))),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LengthUnit::Kilometers => "Kilometers",
            LengthUnit::Meters => "Meters",
            LengthUnit::Decimeters => "Decimeters",
            LengthUnit::Centimeters => "Centimeters",
            LengthUnit::Millimeters => "Millimeters",
            LengthUnit::Inches => "Inches",
            LengthUnit::Feet => "Feet",
        };
        f.write_str(name)
    }
}

/// Geometry a pipeline emits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    #[default]
    Mesh,
    PointCloud,
}

/// When the host should invoke the pipeline again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSchedule {
    Every(Duration),
    /// Recompute only on explicit request
    Manual,
}

impl TickSchedule {
    pub fn from_rate_ms(tick_rate_ms: i64) -> Self {
        if tick_rate_ms > 0 {
            TickSchedule::Every(Duration::from_millis(tick_rate_ms as u64))
        } else {
            TickSchedule::Manual
        }
    }

    pub fn interval(self) -> Option<Duration> {
        match self {
            TickSchedule::Every(interval) => Some(interval),
            TickSchedule::Manual => None,
        }
    }
}

/// Per-cycle configuration of a pipeline
///
/// Counts come in as signed host integers; values below their minimum are
/// clamped by the accessors instead of being rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxParameters {
    /// Depth of the zero-height plane and color anchor, in millimetres
    pub reference_elevation: f64,
    /// Sensor height above the reference plane in millimetres; defaults to
    /// `reference_elevation`
    pub sensor_height: Option<f64>,
    pub roi: Roi,
    /// Milliseconds between automatic invocations, zero for manual only
    pub tick_rate_ms: i64,
    pub average_frame_count: i64,
    pub blur_radius: i64,
    pub unit: LengthUnit,
    pub field_of_view: FieldOfView,
    /// Depths at or beyond this many millimetres are invalid
    pub depth_domain: usize,
    pub output: OutputKind,
    /// Whether the output carries per-vertex colors
    pub colored: bool,
    pub visualisation: Visualisation,
}

impl Default for SandboxParameters {
    fn default() -> Self {
        Self {
            reference_elevation: 1000.0,
            sensor_height: None,
            roi: Roi::default(),
            tick_rate_ms: 20,
            average_frame_count: 1,
            blur_radius: 1,
            unit: LengthUnit::Millimeters,
            field_of_view: FieldOfView::default(),
            depth_domain: 1500,
            output: OutputKind::Mesh,
            colored: true,
            visualisation: Visualisation::default(),
        }
    }
}

impl SandboxParameters {
    /// Parse parameters from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn frame_count(&self) -> usize {
        self.average_frame_count.max(1) as usize
    }

    pub fn blur(&self) -> usize {
        self.blur_radius.max(1) as usize
    }

    pub fn unit_scale(&self) -> f64 {
        self.unit.scale()
    }

    pub fn sensor_height(&self) -> f64 {
        self.sensor_height.unwrap_or(self.reference_elevation)
    }

    pub fn schedule(&self) -> TickSchedule {
        TickSchedule::from_rate_ms(self.tick_rate_ms)
    }

    pub fn analysis(&self) -> AnalysisParams {
        AnalysisParams {
            reference_elevation: self.reference_elevation,
            depth_domain: self.depth_domain,
        }
    }
}
