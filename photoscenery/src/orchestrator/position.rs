//! Focal point sources.
//!
//! The orchestrator asks for the latest sample when it plans and again just
//! before each tile is fetched. A source that never produces a sample leaves
//! the region centre as the focal point.

use tokio::sync::watch;

use crate::coord::PositionSample;

/// Where the focal point comes from (pull API).
pub trait PositionSource: Send + Sync {
    /// Most recent sample, if any has arrived.
    fn latest(&self) -> Option<PositionSample>;
}

/// A position that never changes, or none at all.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedPosition(Option<PositionSample>);

impl FixedPosition {
    pub fn new(sample: PositionSample) -> Self {
        Self(Some(sample))
    }

    /// No live position: plan around the region centre.
    pub fn none() -> Self {
        Self(None)
    }
}

impl PositionSource for FixedPosition {
    fn latest(&self) -> Option<PositionSample> {
        self.0
    }
}

/// Position fed by an external telemetry client through a watch channel.
#[derive(Debug, Clone)]
pub struct WatchPosition {
    rx: watch::Receiver<Option<PositionSample>>,
}

impl WatchPosition {
    pub fn new(rx: watch::Receiver<Option<PositionSample>>) -> Self {
        Self { rx }
    }

    /// A source plus the sender the telemetry client publishes into.
    pub fn channel() -> (watch::Sender<Option<PositionSample>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx))
    }
}

impl PositionSource for WatchPosition {
    fn latest(&self) -> Option<PositionSample> {
        *self.rx.borrow()
    }
}
