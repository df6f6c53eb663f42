//! Detector worker: runs a `DetectionSource` on its own thread.
//!
//! Submission keeps only the latest frame. At most one frame waits for the
//! detector; submitting while one is waiting drops the stale frame and
//! queues the new one. Results come back over a channel in submission
//! order. Once the detector thread has exited, submitting and receiving
//! return errors instead of silently losing frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, bail};
use crossbeam_channel::{
    Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded, unbounded,
};
use serde::Deserialize;

use crate::detection::DetectionSource;

use super::messages::{DetectionMsg, FrameMsg};

/// Worker thread configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// How long the worker blocks on the frame queue before re-checking for
    /// shutdown.
    #[serde(with = "millis")]
    pub recv_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            recv_timeout: Duration::from_millis(100),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Handle to a detector running on a background thread.
pub struct DetectorWorker<F> {
    frame_tx: Sender<FrameMsg<F>>,
    /// Second receiver on the frame queue, used to evict a stale frame.
    stale_rx: Receiver<FrameMsg<F>>,
    result_rx: Receiver<DetectionMsg>,
    shutdown_requested: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    next_sequence: u64,
    dropped: u64,
}

impl<F: Send + 'static> DetectorWorker<F> {
    /// Move `detector` onto a new thread and start serving frames.
    pub fn spawn<D>(detector: D, config: WorkerConfig) -> Self
    where
        D: DetectionSource<F> + Send + 'static,
    {
        let (frame_tx, frame_rx) = bounded::<FrameMsg<F>>(1);
        let (result_tx, result_rx) = unbounded::<DetectionMsg>();
        let shutdown_requested = Arc::new(AtomicBool::new(false));

        let handle = {
            let frame_rx = frame_rx.clone();
            let shutdown = shutdown_requested.clone();
            thread::spawn(move || run(detector, frame_rx, result_tx, shutdown, config))
        };

        Self {
            frame_tx,
            stale_rx: frame_rx,
            result_rx,
            shutdown_requested,
            handle: Some(handle),
            next_sequence: 0,
            dropped: 0,
        }
    }

    /// False once the detector thread has exited, normally or by panic.
    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Queue a frame for detection, replacing any frame still waiting.
    /// Returns the sequence number its result will carry.
    pub fn submit(&mut self, frame: F) -> Result<u64> {
        if !self.is_alive() {
            bail!("detector worker has stopped; frame not queued");
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let mut msg = FrameMsg { sequence, frame };
        loop {
            match self.frame_tx.try_send(msg) {
                Ok(()) => break,
                Err(TrySendError::Full(rejected)) => {
                    // The worker may grab the waiting frame between the two
                    // calls; then the retry simply succeeds.
                    if let Ok(stale) = self.stale_rx.try_recv() {
                        self.dropped += 1;
                        tracing::debug!("Dropping stale frame #{}", stale.sequence);
                    }
                    msg = rejected;
                }
                Err(TrySendError::Disconnected(_)) => {
                    bail!("detector worker has stopped; frame #{} not queued", sequence);
                }
            }
        }
        Ok(sequence)
    }

    /// Next finished result, if any. Errors once the worker has exited and
    /// every result it produced has been received.
    pub fn try_recv(&self) -> Result<Option<DetectionMsg>> {
        match self.result_rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => bail!("detector worker has stopped"),
        }
    }

    /// Wait up to `timeout` for the next finished result. `Ok(None)` on
    /// timeout; errors like `try_recv` once the worker is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<DetectionMsg>> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => bail!("detector worker has stopped"),
        }
    }

    /// Frames replaced before the detector got to them.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(&mut self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Detector worker panicked");
            }
        }
    }
}

impl<F> Drop for DetectorWorker<F> {
    fn drop(&mut self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<F, D>(
    mut detector: D,
    frame_rx: Receiver<FrameMsg<F>>,
    result_tx: Sender<DetectionMsg>,
    shutdown: Arc<AtomicBool>,
    config: WorkerConfig,
) where
    D: DetectionSource<F>,
{
    tracing::info!("Detector worker started");
    let mut processed = 0u64;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match frame_rx.recv_timeout(config.recv_timeout) {
            Ok(FrameMsg { sequence, frame }) => {
                let detections = detector.detect(&frame);
                drop(frame);
                processed += 1;
                if result_tx
                    .send(DetectionMsg {
                        sequence,
                        detections,
                    })
                    .is_err()
                {
                    tracing::info!("Result channel closed");
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!("Detector worker exiting after {} frames", processed);
}
