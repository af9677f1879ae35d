use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use livetable_hand_detector::HandDetector;
use livetable_shared::FrameWithHands;
use tokio::time::MissedTickBehavior;

use crate::source::FrameSource;

/// Stops a running session from anywhere
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: usize,
    pub skipped: usize,
    pub hands: usize,
    pub cancelled: bool,
}

/// Periodic hand detection over a frame source
///
/// Every tick takes one frame from the source and runs it through the
/// detector before waiting for the next tick, so a session never has more
/// than one frame in flight.
pub struct StreamSession {
    id: String,
    detector: HandDetector,
    interval: Duration,
    cancel: CancelHandle,
}

impl StreamSession {
    pub fn new(id: impl Into<String>, detector: HandDetector, interval: Duration) -> Self {
        Self {
            id: id.into(),
            detector,
            interval,
            cancel: CancelHandle::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs until the source is exhausted or the session is cancelled.
    /// Frames the detector rejects are logged and skipped; errors from the
    /// source or the sink end the session.
    pub async fn run<S, F>(&self, source: &mut S, mut sink: F) -> Result<SessionSummary>
    where
        S: FrameSource,
        F: FnMut(&FrameWithHands) -> Result<()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut summary = SessionSummary::default();

        log::info!("session {} started", self.id);
        loop {
            ticker.tick().await;
            if self.cancel.is_cancelled() {
                log::info!("session {} cancelled", self.id);
                summary.cancelled = true;
                break;
            }

            let Some(frame) = source
                .next_frame()
                .with_context(|| format!("Session {} failed to read a frame", self.id))?
            else {
                log::info!("session {}: no more frames", self.id);
                break;
            };

            match self.detector.process_frame(frame) {
                Ok(result) => {
                    summary.frames += 1;
                    summary.hands += result.hands.len();
                    sink(&result).context("Failed to deliver detection result")?;
                }
                Err(e) => {
                    summary.skipped += 1;
                    log::warn!("session {}: frame skipped: {}", self.id, e);
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use livetable_hand_detector::{DepthImage, Frame};
    use std::collections::VecDeque;

    struct QueueSource(VecDeque<Frame>);

    impl FrameSource for QueueSource {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            Ok(self.0.pop_front())
        }
    }

    fn arm_frame() -> Frame {
        let mut color = RgbImage::from_pixel(200, 150, Rgb([230, 230, 230]));
        for y in 60..90 {
            for x in 0..130 {
                color.put_pixel(x, y, Rgb([50, 40, 40]));
            }
        }
        Frame::new(color)
    }

    fn blank_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(200, 150, Rgb([230, 230, 230])))
    }

    #[tokio::test]
    async fn test_runs_until_source_is_exhausted() {
        let session = StreamSession::new("s1", HandDetector::new(), Duration::from_millis(1));
        let mut source = QueueSource(VecDeque::from(vec![arm_frame(), blank_frame(), arm_frame()]));
        let mut hands_per_frame = Vec::new();

        let summary = session
            .run(&mut source, |result| {
                hands_per_frame.push(result.hands.len());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(hands_per_frame, vec![1, 0, 1]);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.hands, 2);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_cancel_stops_retriggering() {
        let session = StreamSession::new("s2", HandDetector::new(), Duration::from_millis(1));
        let handle = session.cancel_handle();
        let mut source = QueueSource((0..10).map(|_| blank_frame()).collect());

        let summary = session
            .run(&mut source, |_| {
                handle.cancel();
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(summary.frames, 1);
        assert!(summary.cancelled);
        assert_eq!(source.0.len(), 9);
    }

    #[tokio::test]
    async fn test_bad_frame_is_skipped() {
        let session = StreamSession::new("s3", HandDetector::new(), Duration::from_millis(1));
        let broken = blank_frame().with_depth(DepthImage::new(10, 10), None);
        let mut source = QueueSource(VecDeque::from(vec![broken, blank_frame()]));

        let summary = session.run(&mut source, |_| Ok(())).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.frames, 1);
    }

    #[tokio::test]
    async fn test_sink_error_ends_session() {
        let session = StreamSession::new("s4", HandDetector::new(), Duration::from_millis(1));
        let mut source = QueueSource(VecDeque::from(vec![blank_frame(), blank_frame()]));
        let result = session
            .run(&mut source, |_| anyhow::bail!("stdout closed"))
            .await;
        assert!(result.is_err());
        assert_eq!(source.0.len(), 1);
    }

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
