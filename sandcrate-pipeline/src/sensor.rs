//! Shared access to the depth sensor
//!
//! One physical sensor can feed several pipelines at once. Each pipeline
//! holds a [`SensorLease`] on a cloned [`SharedSensor`]; the driver session
//! starts with the first lease and stops when the last one is released.

use sandcrate_core::{DepthFrame, Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A producer of depth frames
///
/// `current_frame` must return immediately with whatever frame is latest;
/// pipelines never wait for a new one.
pub trait FrameSource: Send + Sync {
    /// Grid width in pixels, fixed for the life of the source
    fn width(&self) -> usize;

    /// Grid height in pixels, fixed for the life of the source
    fn height(&self) -> usize;

    /// The most recent frame, if any has arrived
    fn current_frame(&self) -> Option<DepthFrame>;

    /// Begin a driver session
    fn start(&self) -> Result<()>;

    /// End the driver session
    fn stop(&self);
}

#[derive(Debug)]
struct SensorInner<S> {
    source: S,
    refs: Mutex<usize>,
}

/// Reference-counted handle to a frame source
#[derive(Debug)]
pub struct SharedSensor<S: FrameSource> {
    inner: Arc<SensorInner<S>>,
}

impl<S: FrameSource> Clone for SharedSensor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: FrameSource> SharedSensor<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(SensorInner {
                source,
                refs: Mutex::new(0),
            }),
        }
    }

    /// The wrapped source
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Number of live leases
    pub fn ref_count(&self) -> usize {
        *self.inner.refs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take a reference, starting the driver session on the first one
    pub fn acquire(&self) -> Result<SensorLease<S>> {
        let mut refs = self.inner.refs.lock().unwrap_or_else(|e| e.into_inner());
        if *refs == 0 {
            self.inner.source.start()?;
            log::info!(
                "Sensor session started ({}x{})",
                self.inner.source.width(),
                self.inner.source.height()
            );
        }
        *refs += 1;
        Ok(SensorLease {
            sensor: self.clone(),
        })
    }

    fn release_one(&self) {
        let mut refs = self.inner.refs.lock().unwrap_or_else(|e| e.into_inner());
        *refs = refs.saturating_sub(1);
        if *refs == 0 {
            self.inner.source.stop();
            log::info!("Sensor session stopped");
        }
    }
}

/// One pipeline's reference on a [`SharedSensor`]
///
/// Dropping the lease releases the reference.
#[derive(Debug)]
pub struct SensorLease<S: FrameSource> {
    sensor: SharedSensor<S>,
}

impl<S: FrameSource> SensorLease<S> {
    pub fn width(&self) -> usize {
        self.sensor.source().width()
    }

    pub fn height(&self) -> usize {
        self.sensor.source().height()
    }

    pub fn current_frame(&self) -> Option<DepthFrame> {
        self.sensor.source().current_frame()
    }

    pub fn sensor(&self) -> &SharedSensor<S> {
        &self.sensor
    }

    /// Release the reference now rather than at drop
    pub fn release(self) {}
}

impl<S: FrameSource> Drop for SensorLease<S> {
    fn drop(&mut self) {
        self.sensor.release_one();
    }
}

/// A frame source fed by an acquisition thread
///
/// The producer publishes into the slot on its own cadence; readers get a
/// cheap clone of whatever frame is newest. Publishing outside a driver
/// session is rejected.
#[derive(Debug)]
pub struct LatestFrameSlot {
    width: usize,
    height: usize,
    latest: RwLock<Option<DepthFrame>>,
    sequence: AtomicU64,
    running: AtomicBool,
}

impl LatestFrameSlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            latest: RwLock::new(None),
            sequence: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Publish raw samples as the newest frame, returning its sequence
    pub fn publish(&self, samples: Vec<u16>) -> Result<u64> {
        // running is checked under the lock so a concurrent stop cannot be
        // followed by a store
        let mut latest = self.latest.write().unwrap_or_else(|e| e.into_inner());
        if !self.is_running() {
            return Err(Error::Sensor("sensor session is not running".to_string()));
        }
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        *latest = Some(DepthFrame::with_sequence(self.width, self.height, sequence, samples)?);
        Ok(sequence)
    }
}

impl FrameSource for LatestFrameSlot {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn current_frame(&self) -> Option<DepthFrame> {
        self.latest.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn start(&self) -> Result<()> {
        let mut latest = self.latest.write().unwrap_or_else(|e| e.into_inner());
        *latest = None;
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        let mut latest = self.latest.write().unwrap_or_else(|e| e.into_inner());
        self.running.store(false, Ordering::Release);
        *latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSource {
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_start: bool,
    }

    impl FrameSource for CountingSource {
        fn width(&self) -> usize {
            2
        }

        fn height(&self) -> usize {
            2
        }

        fn current_frame(&self) -> Option<DepthFrame> {
            Some(DepthFrame::filled(2, 2, 1000))
        }

        fn start(&self) -> Result<()> {
            if self.fail_start {
                return Err(Error::Sensor("no device".to_string()));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_session_follows_reference_count() {
        let sensor = SharedSensor::new(CountingSource::default());
        let a = sensor.acquire().unwrap();
        let b = sensor.acquire().unwrap();
        assert_eq!(sensor.ref_count(), 2);
        assert_eq!(sensor.source().starts.load(Ordering::SeqCst), 1);

        a.release();
        assert_eq!(sensor.source().stops.load(Ordering::SeqCst), 0);
        drop(b);
        assert_eq!(sensor.ref_count(), 0);
        assert_eq!(sensor.source().stops.load(Ordering::SeqCst), 1);

        let _c = sensor.acquire().unwrap();
        assert_eq!(sensor.source().starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_start_takes_no_reference() {
        let sensor = SharedSensor::new(CountingSource {
            fail_start: true,
            ..Default::default()
        });
        assert!(matches!(sensor.acquire(), Err(Error::Sensor(_))));
        assert_eq!(sensor.ref_count(), 0);
    }

    #[test]
    fn test_slot_serves_latest_frame() {
        let sensor = SharedSensor::new(LatestFrameSlot::new(2, 2));
        assert!(sensor.source().publish(vec![1; 4]).is_err());

        let lease = sensor.acquire().unwrap();
        assert!(lease.current_frame().is_none());

        assert_eq!(sensor.source().publish(vec![1; 4]).unwrap(), 1);
        assert_eq!(sensor.source().publish(vec![2; 4]).unwrap(), 2);
        let frame = lease.current_frame().unwrap();
        assert_eq!(frame.sequence(), 2);
        assert_eq!(frame.samples(), &[2, 2, 2, 2]);

        assert!(sensor.source().publish(vec![3; 5]).is_err());
        lease.release();
        assert!(!sensor.source().is_running());
        assert!(sensor.source().current_frame().is_none());
    }

    #[test]
    fn test_frames_never_outlive_their_session() {
        let sensor = SharedSensor::new(LatestFrameSlot::new(2, 2));
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let _ = sensor.source().publish(vec![7; 4]);
                }
            });

            for _ in 0..500 {
                let lease = sensor.acquire().unwrap();
                lease.release();
                assert!(sensor.source().current_frame().is_none());
            }
            done.store(true, Ordering::Release);
        });

        let lease = sensor.acquire().unwrap();
        assert!(lease.current_frame().is_none());
    }
}
