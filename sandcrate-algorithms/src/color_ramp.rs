//! Depth-to-color lookup tables built from linear color ranges
//!
//! A table is two [`ColorRange`]s meeting at a reference index: one ramps
//! downward from the reference towards index zero, the other upward towards
//! the end of the domain. Both ranges start from the same boundary color,
//! so the table is continuous at the reference.

use sandcrate_core::{Color, Error, Result, Rgba};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A linear ramp of `span` steps from `start` to `end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub span: usize,
    pub start: Color,
    pub end: Color,
}

/// What a range does past the end of its span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOverflow {
    /// Hold the end color
    #[default]
    Clamp,
    /// Restart the ramp, giving repeating bands
    Repeat,
}

impl ColorRange {
    pub fn new(span: usize, start: impl Into<Color>, end: impl Into<Color>) -> Self {
        Self {
            span,
            start: start.into(),
            end: end.into(),
        }
    }

    /// Color `steps` away from the start of the range
    pub fn color_at(&self, steps: usize, overflow: RangeOverflow) -> Rgba {
        if self.span == 0 {
            return self.start.to_rgba();
        }
        let step = match overflow {
            RangeOverflow::Clamp => steps.min(self.span),
            RangeOverflow::Repeat => steps % (self.span + 1),
        };
        self.start.lerp(self.end, step as f32 / self.span as f32)
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.span.hash(state);
        hash_color(&self.start, state);
        hash_color(&self.end, state);
    }
}

fn hash_color<H: Hasher>(color: &Color, state: &mut H) {
    match color {
        Color::Rgba(rgba) => {
            0u8.hash(state);
            rgba.hash(state);
        }
        Color::Hsl(hsl) => {
            1u8.hash(state);
            hsl.h.to_bits().hash(state);
            hsl.s.to_bits().hash(state);
            hsl.l.to_bits().hash(state);
        }
    }
}

/// A pair of ranges sharing their start color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    below: ColorRange,
    above: ColorRange,
    overflow: RangeOverflow,
}

impl ColorRamp {
    /// Pair two ranges, rejecting a pair whose start colors differ
    pub fn new(below: ColorRange, above: ColorRange) -> Result<Self> {
        if below.start.to_rgba() != above.start.to_rgba() {
            return Err(Error::InvalidData(format!(
                "color ranges must meet on one boundary color, got {:?} and {:?}",
                below.start.to_rgba(),
                above.start.to_rgba()
            )));
        }
        Ok(Self {
            below,
            above,
            overflow: RangeOverflow::Clamp,
        })
    }

    /// Build both ranges out from a single boundary color
    pub fn anchored(
        boundary: impl Into<Color>,
        below_span: usize,
        below_end: impl Into<Color>,
        above_span: usize,
        above_end: impl Into<Color>,
    ) -> Self {
        let boundary = boundary.into();
        Self {
            below: ColorRange::new(below_span, boundary, below_end),
            above: ColorRange::new(above_span, boundary, above_end),
            overflow: RangeOverflow::Clamp,
        }
    }

    pub fn with_overflow(mut self, overflow: RangeOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn below(&self) -> &ColorRange {
        &self.below
    }

    pub fn above(&self) -> &ColorRange {
        &self.above
    }

    pub fn boundary_color(&self) -> Rgba {
        self.below.start.to_rgba()
    }

    /// Stable fingerprint of everything a table built from this ramp
    /// depends on
    pub fn table_key(&self, domain_size: usize, reference_index: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        domain_size.hash(&mut hasher);
        reference_index.hash(&mut hasher);
        self.below.hash_into(&mut hasher);
        self.above.hash_into(&mut hasher);
        self.overflow.hash(&mut hasher);
        hasher.finish()
    }
}

/// Precomputed colors for every index of `[0, domain_size)`
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    reference_index: usize,
    colors: Vec<Rgba>,
}

impl LookupTable {
    /// Build the table for `ramp` anchored at `reference_index`
    ///
    /// Entries at or below the reference walk the below range outwards from
    /// the boundary color, entries above it walk the above range. The domain
    /// holds at least one entry and the reference is clamped into it.
    ///
    /// # Arguments
    /// * `ramp` - The two ranges and their overflow policy
    /// * `domain_size` - Number of entries, one per possible sample index
    /// * `reference_index` - Index where both ranges meet
    ///
    /// # Returns
    /// * `LookupTable` - Colors for every index in `0..domain_size`
    ///
    /// # Example
    /// ```rust
    /// use sandcrate_algorithms::{ColorRamp, LookupTable};
    /// use sandcrate_core::Rgba;
    ///
    /// let ramp = ColorRamp::anchored(Rgba::WHITE, 10, Rgba::BLACK, 10, Rgba::rgb(255, 0, 0));
    /// let table = LookupTable::build(&ramp, 21, 10);
    ///
    /// assert_eq!(table.get(10), Rgba::WHITE);
    /// assert_eq!(table.get(0), Rgba::BLACK);
    /// assert_eq!(table.get(20), Rgba::rgb(255, 0, 0));
    /// // reads past the end clamp to the last entry
    /// assert_eq!(table.get(500), Rgba::rgb(255, 0, 0));
    /// ```
    pub fn build(ramp: &ColorRamp, domain_size: usize, reference_index: usize) -> Self {
        let domain_size = domain_size.max(1);
        let reference_index = reference_index.min(domain_size - 1);

        let colors = (0..domain_size)
            .map(|i| {
                if i <= reference_index {
                    ramp.below.color_at(reference_index - i, ramp.overflow)
                } else {
                    ramp.above.color_at(i - reference_index, ramp.overflow)
                }
            })
            .collect();

        Self {
            reference_index,
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn reference_index(&self) -> usize {
        self.reference_index
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Color at `index`, clamped to the last entry
    #[inline]
    pub fn get(&self, index: usize) -> Rgba {
        let last = self.colors.len().saturating_sub(1);
        self.colors.get(index.min(last)).copied().unwrap_or(Rgba::BLACK)
    }

    pub fn boundary_color(&self) -> Rgba {
        self.get(self.reference_index)
    }
}

/// Holds the last built table until its key changes
#[derive(Debug, Clone, Default)]
pub struct TableCache {
    entry: Option<CachedTable>,
    rebuilds: usize,
}

#[derive(Debug, Clone)]
struct CachedTable {
    key: u64,
    table: LookupTable,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `key`, building it only on a key change
    pub fn get_or_build(&mut self, key: u64, build: impl FnOnce() -> LookupTable) -> &LookupTable {
        let entry = match self.entry.take() {
            Some(entry) if entry.key == key => entry,
            _ => {
                self.rebuilds += 1;
                let table = build();
                log::debug!("Rebuilt color lookup table ({} entries)", table.len());
                CachedTable { key, table }
            }
        };
        &self.entry.insert(entry).table
    }

    /// Number of tables built so far
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
