//! Color types used for vertex coloring

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color
///
/// The layout is `#[repr(C)]` so color buffers can be handed to a renderer
/// with [`bytemuck::cast_slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from red, green and blue channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Channels in `[r, g, b, a]` order
    pub fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation of every channel, `t` in `[0, 1]`
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Largest per-channel absolute difference between two colors
    pub fn channel_distance(self, other: Rgba) -> u8 {
        self.channels()
            .iter()
            .zip(other.channels().iter())
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0)
    }
}

/// A color in hue/saturation/lightness space
///
/// All components are in `[0, 1]`; a hue of `1.0` is the same red as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn lerp(self, other: Hsl, t: f32) -> Hsl {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        Hsl::new(
            self.h + (other.h - self.h) * t,
            self.s + (other.s - self.s) * t,
            self.l + (other.l - self.l) * t,
        )
    }

    /// Convert to an opaque RGBA color
    pub fn to_rgba(self) -> Rgba {
        let h = self.h.rem_euclid(1.0);
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Rgba::rgb(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f32| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };

        Rgba::rgb(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }
}

impl From<Hsl> for Rgba {
    fn from(hsl: Hsl) -> Self {
        hsl.to_rgba()
    }
}

/// A color given in either of the supported spaces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Rgba(Rgba),
    Hsl(Hsl),
}

impl Color {
    pub fn to_rgba(self) -> Rgba {
        match self {
            Color::Rgba(rgba) => rgba,
            Color::Hsl(hsl) => hsl.to_rgba(),
        }
    }

    /// Interpolate towards `other`
    ///
    /// Two HSL colors interpolate in HSL; any other pairing interpolates
    /// in RGBA.
    pub fn lerp(self, other: Color, t: f32) -> Rgba {
        match (self, other) {
            (Color::Hsl(a), Color::Hsl(b)) => a.lerp(b, t).to_rgba(),
            (a, b) => a.to_rgba().lerp(b.to_rgba(), t),
        }
    }
}

impl From<Rgba> for Color {
    fn from(rgba: Rgba) -> Self {
        Color::Rgba(rgba)
    }
}

impl From<Hsl> for Color {
    fn from(hsl: Hsl) -> Self {
        Color::Hsl(hsl)
    }
}
