//! Temporal averaging over a bounded history of depth frames

use sandcrate_core::{DepthFrame, INVALID_DEPTH};

/// Fixed-capacity circular buffer of depth frames
///
/// Pushing into a full ring overwrites the oldest frame. The ring never
/// holds more than `capacity` frames, and `capacity` is at least one.
#[derive(Debug, Clone)]
pub struct FrameRing {
    slots: Vec<DepthFrame>,
    /// Index of the oldest frame once the ring is full; zero until then
    head: usize,
    capacity: usize,
}

impl FrameRing {
    /// Create a ring; a capacity below one is clamped to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Enqueue a frame, evicting the oldest one when full
    pub fn push(&mut self, frame: DepthFrame) {
        if self.slots.len() < self.capacity {
            self.slots.push(frame);
        } else {
            self.slots[self.head] = frame;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Change the capacity, evicting the oldest frames down to the new bound
    pub fn resize(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity == self.capacity {
            return;
        }

        self.slots.rotate_left(self.head);
        self.head = 0;
        if self.slots.len() > capacity {
            let excess = self.slots.len() - capacity;
            self.slots.drain(..excess);
        }
        self.capacity = capacity;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// The most recently pushed frame
    pub fn latest(&self) -> Option<&DepthFrame> {
        if self.slots.is_empty() {
            return None;
        }
        let idx = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots.get(idx)
    }

    /// Frames from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &DepthFrame> + '_ {
        self.slots[self.head..].iter().chain(self.slots[..self.head].iter())
    }
}

/// Per-pixel running average over the most recent frames
///
/// Invalid samples are left out of the mean so a dropped return in one
/// frame does not drag the pixel towards the sensor. A pixel that is invalid
/// in every buffered frame averages to [`INVALID_DEPTH`].
#[derive(Debug, Clone)]
pub struct TemporalAverager {
    ring: FrameRing,
    sums: Vec<u64>,
    counts: Vec<u32>,
}

impl TemporalAverager {
    pub fn new(frame_count: usize) -> Self {
        Self {
            ring: FrameRing::new(frame_count),
            sums: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub fn frames(&self) -> &FrameRing {
        &self.ring
    }

    /// Apply a new history length; shrinking evicts the oldest frames
    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.ring.resize(frame_count);
    }

    /// Add a frame to the history
    ///
    /// A frame whose dimensions differ from the buffered ones flushes the
    /// history first, since pixels of different grids cannot be averaged.
    pub fn push(&mut self, frame: DepthFrame) {
        if let Some(latest) = self.ring.latest() {
            if !latest.same_shape(&frame) {
                log::debug!(
                    "Frame size changed from {}x{} to {}x{}, flushing history",
                    latest.width(),
                    latest.height(),
                    frame.width(),
                    frame.height()
                );
                self.ring.clear();
            }
        }
        self.ring.push(frame);
    }

    /// Mean of the buffered samples at one pixel, `None` with no data
    pub fn average(&self, pixel_index: usize) -> Option<u16> {
        if self.ring.is_empty() {
            return None;
        }

        let (sum, count) = self
            .ring
            .iter()
            .filter_map(|frame| frame.samples().get(pixel_index).copied())
            .filter(|&sample| sample != INVALID_DEPTH)
            .fold((0u64, 0u64), |(sum, count), sample| (sum + sample as u64, count + 1));

        Some(if count == 0 { INVALID_DEPTH } else { (sum / count) as u16 })
    }

    /// Average every pixel into a new frame, `None` with no data
    ///
    /// With a single buffered frame the frame itself is returned without
    /// copying.
    pub fn average_frame(&mut self) -> Option<DepthFrame> {
        let latest = self.ring.latest()?.clone();
        if self.ring.len() == 1 {
            return Some(latest);
        }

        let pixels = latest.len();
        self.sums.clear();
        self.sums.resize(pixels, 0);
        self.counts.clear();
        self.counts.resize(pixels, 0);

        for frame in self.ring.iter() {
            for ((sum, count), &sample) in self
                .sums
                .iter_mut()
                .zip(self.counts.iter_mut())
                .zip(frame.samples())
            {
                if sample != INVALID_DEPTH {
                    *sum += sample as u64;
                    *count += 1;
                }
            }
        }

        let averaged = self
            .sums
            .iter()
            .zip(&self.counts)
            .map(|(&sum, &count)| if count == 0 { INVALID_DEPTH } else { (sum / count as u64) as u16 })
            .collect();

        DepthFrame::with_sequence(latest.width(), latest.height(), latest.sequence(), averaged).ok()
    }
}
