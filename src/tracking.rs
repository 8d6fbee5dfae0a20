//! Live position tracking.
//!
//! Device positions arrive asynchronously; they are handed to a tracker task
//! over a channel as fully materialized fixes, and the latest state is
//! published on a watch channel for readers.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::models::GeoPoint;
use crate::spatial::distance_km;

/// Most recent positions kept on the trail; older ones are dropped
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// One position report from a live source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub point: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

/// Speed in meters per second between two fixes.
///
/// Zero for the first fix, or when the clock did not move forward.
pub fn speed_mps(prev: Option<&PositionFix>, curr: &PositionFix) -> f64 {
    let Some(prev) = prev else {
        return 0.0;
    };

    let dt_sec = (curr.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
    if dt_sec <= 0.0 {
        return 0.0;
    }

    distance_km(prev.point, curr.point) * 1000.0 / dt_sec
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    #[error("tracking is already active")]
    AlreadyActive,
    #[error("tracking is not active")]
    NotActive,
    #[error("tracker task has stopped")]
    Closed,
}

/// Read-only view of the tracker state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub active: bool,
    pub last: Option<PositionFix>,
    pub speed_mps: f64,
    pub history: Vec<GeoPoint>,
}

/// Tracking session state
#[derive(Debug)]
pub struct Tracker {
    active: bool,
    last: Option<PositionFix>,
    speed_mps: f64,
    history: VecDeque<GeoPoint>,
    history_limit: usize,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            active: false,
            last: None,
            speed_mps: 0.0,
            history: VecDeque::with_capacity(limit),
            history_limit: limit,
        }
    }

    /// Begin a new session; the previous trail is discarded
    pub fn start(&mut self) -> Result<(), TrackingError> {
        if self.active {
            return Err(TrackingError::AlreadyActive);
        }
        self.active = true;
        self.last = None;
        self.speed_mps = 0.0;
        self.history.clear();
        Ok(())
    }

    /// End the session; the trail is kept
    pub fn stop(&mut self) -> Result<(), TrackingError> {
        if !self.active {
            return Err(TrackingError::NotActive);
        }
        self.active = false;
        Ok(())
    }

    /// Record a fix and return the derived speed
    pub fn record(&mut self, fix: PositionFix) -> Result<f64, TrackingError> {
        if !self.active {
            return Err(TrackingError::NotActive);
        }
        let speed = speed_mps(self.last.as_ref(), &fix);
        self.speed_mps = speed;
        self.last = Some(fix);
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(fix.point);
        Ok(speed)
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            active: self.active,
            last: self.last,
            speed_mps: self.speed_mps,
            history: self.history.iter().copied().collect(),
        }
    }
}

#[derive(Debug)]
enum Command {
    Start(oneshot::Sender<Result<(), TrackingError>>),
    Stop(oneshot::Sender<Result<(), TrackingError>>),
    Fix(PositionFix, oneshot::Sender<Result<f64, TrackingError>>),
}

/// Cloneable handle to a running tracker task
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<Command>,
    snapshots: watch::Receiver<TrackSnapshot>,
}

impl TrackerHandle {
    pub async fn start(&self) -> Result<(), TrackingError> {
        self.request(Command::Start).await?
    }

    pub async fn stop(&self) -> Result<(), TrackingError> {
        self.request(Command::Stop).await?
    }

    /// Hand a position over to the tracker; returns the derived speed
    pub async fn record(&self, fix: PositionFix) -> Result<f64, TrackingError> {
        self.request(|reply| Command::Fix(fix, reply)).await?
    }

    /// Latest published state
    pub fn snapshot(&self) -> TrackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<TrackSnapshot> {
        self.snapshots.clone()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TrackingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| TrackingError::Closed)?;
        reply_rx.await.map_err(|_| TrackingError::Closed)
    }
}

/// Spawn the tracker task on the current tokio runtime.
///
/// The task exits once every handle has been dropped.
pub fn spawn_tracker(buffer: usize) -> TrackerHandle {
    let (tx, mut rx) = mpsc::channel::<Command>(buffer.max(1));
    let (snap_tx, snap_rx) = watch::channel(TrackSnapshot::default());

    tokio::spawn(async move {
        let mut tracker = Tracker::new();

        while let Some(cmd) = rx.recv().await {
            // Publish before replying so callers observe their own change
            match cmd {
                Command::Start(reply) => {
                    let res = tracker.start();
                    if res.is_ok() {
                        info!("Position tracking started");
                    }
                    snap_tx.send_replace(tracker.snapshot());
                    let _ = reply.send(res);
                }
                Command::Stop(reply) => {
                    let res = tracker.stop();
                    if res.is_ok() {
                        info!("Position tracking stopped");
                    }
                    snap_tx.send_replace(tracker.snapshot());
                    let _ = reply.send(res);
                }
                Command::Fix(fix, reply) => {
                    let res = tracker.record(fix);
                    if let Ok(speed) = res {
                        debug!(
                            "Fix at ({}, {}): {:.2} m/s",
                            fix.point.lat, fix.point.lon, speed
                        );
                    }
                    snap_tx.send_replace(tracker.snapshot());
                    let _ = reply.send(res);
                }
            }
        }

        debug!("Tracker task finished");
    });

    TrackerHandle {
        tx,
        snapshots: snap_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fix(lat: f64, lon: f64, secs: i64) -> PositionFix {
        PositionFix {
            point: GeoPoint::new(lat, lon),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs),
        }
    }

    #[test]
    fn test_speed_first_fix_is_zero() {
        assert_eq!(speed_mps(None, &fix(0.0, 0.0, 0)), 0.0);
    }

    #[test]
    fn test_speed_non_positive_interval_is_zero() {
        let a = fix(0.0, 0.0, 10);
        assert_eq!(speed_mps(Some(&a), &fix(0.0, 0.01, 10)), 0.0);
        assert_eq!(speed_mps(Some(&a), &fix(0.0, 0.01, 5)), 0.0);
    }

    #[test]
    fn test_speed_over_one_degree() {
        let a = fix(0.0, 0.0, 0);
        let b = fix(0.0, 1.0, 3600);
        let expected = distance_km(a.point, b.point) * 1000.0 / 3600.0;
        assert!((speed_mps(Some(&a), &b) - expected).abs() < 1e-9);
        assert!((expected - 30.89).abs() < 0.01);
    }

    #[test]
    fn test_tracker_state_machine() {
        let mut t = Tracker::new();
        assert_eq!(t.record(fix(0.0, 0.0, 0)), Err(TrackingError::NotActive));
        assert_eq!(t.stop(), Err(TrackingError::NotActive));

        t.start().unwrap();
        assert_eq!(t.start(), Err(TrackingError::AlreadyActive));
        assert_eq!(t.record(fix(0.0, 0.0, 0)).unwrap(), 0.0);
        assert!(t.record(fix(0.0, 0.001, 10)).unwrap() > 0.0);

        t.stop().unwrap();
        let snap = t.snapshot();
        assert!(!snap.active);
        assert_eq!(snap.history.len(), 2);

        // Restart clears the trail
        t.start().unwrap();
        assert!(t.snapshot().history.is_empty());
        assert!(t.snapshot().last.is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut t = Tracker::with_history_limit(3);
        t.start().unwrap();
        for i in 0..5 {
            t.record(fix(0.0, i as f64 * 0.001, i)).unwrap();
        }

        let snap = t.snapshot();
        assert_eq!(snap.history.len(), 3);
        assert_eq!(snap.history[0], GeoPoint::new(0.0, 0.002));
        assert_eq!(snap.history[2], GeoPoint::new(0.0, 0.004));
        assert_eq!(snap.last.unwrap().point, GeoPoint::new(0.0, 0.004));
    }

    #[tokio::test]
    async fn test_tracker_task_handoff() {
        let handle = spawn_tracker(8);
        let mut updates = handle.subscribe();

        assert_eq!(handle.record(fix(0.0, 0.0, 0)).await, Err(TrackingError::NotActive));
        handle.start().await.unwrap();
        handle.record(fix(-6.92, 106.93, 0)).await.unwrap();
        let speed = handle.record(fix(-6.92, 106.931, 20)).await.unwrap();
        assert!(speed > 0.0);

        updates.changed().await.unwrap();
        let snap = handle.snapshot();
        assert!(snap.active);
        assert_eq!(snap.history.len(), 2);
        assert_eq!(snap.last.unwrap().point, GeoPoint::new(-6.92, 106.931));
        assert!((snap.speed_mps - speed).abs() < 1e-12);

        handle.stop().await.unwrap();
        assert_eq!(handle.stop().await, Err(TrackingError::NotActive));
        assert!(!handle.snapshot().active);
    }
}
