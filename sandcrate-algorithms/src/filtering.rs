//! Spatial filtering of depth frames
//!
//! The blur is a separable Gaussian: one horizontal pass followed by one
//! vertical pass over a `2 * radius + 1` wide normalized kernel. Borders
//! replicate the nearest edge sample.
//!
//! Invalid (zero) samples never contribute to the weighted sum; the weights
//! of the remaining valid neighbours are renormalized instead. A window with
//! no valid sample at all produces an invalid output sample.

use sandcrate_core::{DepthFrame, INVALID_DEPTH};

/// Normalized 1D Gaussian weights derived from a blur radius
#[derive(Debug, Clone, PartialEq)]
pub struct BlurKernel {
    radius: usize,
    weights: Vec<f32>,
}

impl BlurKernel {
    /// Build the kernel for `radius`; a radius of one or less is the identity
    pub fn new(radius: usize) -> Self {
        if radius <= 1 {
            return Self {
                radius: 1,
                weights: vec![1.0],
            };
        }

        let sigma = radius as f32 / 2.0;
        let denom = 2.0 * sigma * sigma;
        let mut weights: Vec<f32> = (0..=2 * radius)
            .map(|i| {
                let d = i as f32 - radius as f32;
                (-(d * d) / denom).exp()
            })
            .collect();

        let total: f32 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= total);

        Self { radius, weights }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Number of taps, `2 * radius + 1`
    pub fn width(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn is_identity(&self) -> bool {
        self.weights.len() == 1
    }
}

/// Reusable blur stage
///
/// Keeps the kernel and the intermediate row-pass buffer between cycles so
/// an unchanged radius costs no allocation beyond the output frame.
#[derive(Debug, Clone)]
pub struct SpatialFilter {
    kernel: BlurKernel,
    scratch: Vec<f32>,
}

impl SpatialFilter {
    pub fn new(radius: usize) -> Self {
        Self {
            kernel: BlurKernel::new(radius),
            scratch: Vec::new(),
        }
    }

    pub fn kernel(&self) -> &BlurKernel {
        &self.kernel
    }

    /// Rebuild the kernel only when the radius actually changed
    pub fn set_radius(&mut self, radius: usize) {
        if radius.max(1) != self.kernel.radius() {
            self.kernel = BlurKernel::new(radius);
            log::debug!("Blur kernel rebuilt, width {}", self.kernel.width());
        }
    }

    /// Blur a frame; the input is left untouched
    pub fn apply(&mut self, frame: &DepthFrame) -> DepthFrame {
        let (width, height) = (frame.width(), frame.height());
        if self.kernel.is_identity() || frame.is_empty() {
            return frame.clone();
        }

        let radius = self.kernel.radius() as isize;
        let weights = self.kernel.weights();
        let src = frame.samples();

        self.scratch.clear();
        self.scratch.resize(src.len(), 0.0);

        for y in 0..height {
            let row = y * width;
            for x in 0..width {
                let mut acc = 0.0f32;
                let mut weight_sum = 0.0f32;
                for (k, &w) in weights.iter().enumerate() {
                    let xx = (x as isize + k as isize - radius).clamp(0, width as isize - 1) as usize;
                    let v = src[row + xx];
                    if v != INVALID_DEPTH {
                        acc += w * v as f32;
                        weight_sum += w;
                    }
                }
                self.scratch[row + x] = if weight_sum > 0.0 { acc / weight_sum } else { 0.0 };
            }
        }

        let mut out = Vec::with_capacity(src.len());
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f32;
                let mut weight_sum = 0.0f32;
                for (k, &w) in weights.iter().enumerate() {
                    let yy = (y as isize + k as isize - radius).clamp(0, height as isize - 1) as usize;
                    let v = self.scratch[yy * width + x];
                    if v > 0.0 {
                        acc += w * v;
                        weight_sum += w;
                    }
                }
                let value = if weight_sum > 0.0 {
                    (acc / weight_sum).round().clamp(1.0, u16::MAX as f32) as u16
                } else {
                    INVALID_DEPTH
                };
                out.push(value);
            }
        }

        DepthFrame::with_sequence(width, height, frame.sequence(), out)
            .unwrap_or_else(|_| frame.clone())
    }
}

/// Blur a frame with a one-off filter
///
/// Builds a fresh kernel on every call; per-tick callers should keep a
/// [`SpatialFilter`] instead so the kernel and scratch buffer are reused.
///
/// # Arguments
/// * `frame` - Depth frame to blur, left untouched
/// * `radius` - Kernel radius in pixels; one or less returns the frame as is
///
/// # Returns
/// * `DepthFrame` - Blurred frame with the same dimensions and sequence
///
/// # Example
/// ```rust
/// use sandcrate_algorithms::gaussian_blur;
/// use sandcrate_core::DepthFrame;
///
/// let frame = DepthFrame::filled(8, 6, 1000);
/// let blurred = gaussian_blur(&frame, 3);
/// assert!(blurred.samples().iter().all(|&d| d == 1000));
/// ```
pub fn gaussian_blur(frame: &DepthFrame, radius: usize) -> DepthFrame {
    SpatialFilter::new(radius).apply(frame)
}
