use crate::config::EngineConfig;
use livecam_frame::{
    rotate, BgrFrame, BgrImage, ConvertError, OwnedYuvFrame, Rotation, YuvToBgrConverter,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("frame conversion failed: {0}")]
    Convert(#[from] ConvertError),
    #[error("failed to start analysis thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("analysis thread exited")]
    ChannelClosed,
    #[error("analysis thread panicked")]
    ThreadPanicked,
}

/// Downstream consumer of converted frames, run on the analysis thread.
///
/// This is where a face detector plugs in. The frame view is only valid for
/// the duration of the call.
pub trait FrameAnalyzer: Send + 'static {
    type Output: Send + 'static;

    fn analyze(&mut self, frame: BgrFrame<'_>, sequence: u64) -> Self::Output;
}

/// Owned result of analyzing one frame, handed back to the submitter.
#[derive(Debug)]
pub struct AnalysisResult<O> {
    pub sequence: u64,
    pub output: O,
    /// Upright BGR image, when the engine is configured to keep images.
    pub image: Option<BgrImage>,
    pub rotation: Rotation,
    /// Conversion plus analysis time on the analysis thread.
    pub elapsed: Duration,
}

/// Frame counters. `dropped` counts frames replaced by a newer one before
/// the analysis thread picked them up. After [`EngineHandle::shutdown`] it
/// also includes a frame that was still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub submitted: u64,
    pub processed: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> EngineStats {
        EngineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// A submitted frame. Whoever flips `taken` first owns its accounting: the
/// analysis thread processes it, a replacing `submit` counts it as dropped.
#[derive(Debug)]
struct PendingFrame {
    frame: OwnedYuvFrame,
    taken: AtomicBool,
}

impl PendingFrame {
    fn claim(&self) -> bool {
        !self.taken.swap(true, Ordering::AcqRel)
    }
}

type FrameSlot = Option<Arc<PendingFrame>>;
type ResultMessage<O> = Result<AnalysisResult<O>, EngineError>;

/// Handle to the analysis thread: submit frames, receive results.
pub struct EngineHandle<O> {
    frames: Option<watch::Sender<FrameSlot>>,
    results: mpsc::Receiver<ResultMessage<O>>,
    counters: Arc<Counters>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl<O> EngineHandle<O> {
    /// Offer a frame for analysis. Only the latest frame is kept: a frame the
    /// analysis thread has not started on yet is replaced.
    pub fn submit(&self, frame: OwnedYuvFrame) -> Result<(), EngineError> {
        let frames = self.frames.as_ref().ok_or(EngineError::ChannelClosed)?;
        if frames.is_closed() {
            return Err(EngineError::ChannelClosed);
        }
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::new(PendingFrame {
            frame,
            taken: AtomicBool::new(false),
        });
        if let Some(replaced) = frames.send_replace(Some(pending)) {
            if replaced.claim() {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Next result, or `None` once the engine is closed and drained.
    pub async fn recv(&mut self) -> Option<ResultMessage<O>> {
        self.results.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv); must not be called from an
    /// async context.
    pub fn blocking_recv(&mut self) -> Option<ResultMessage<O>> {
        self.results.blocking_recv()
    }

    /// A result if one is ready.
    pub fn try_recv(&mut self) -> Option<ResultMessage<O>> {
        self.results.try_recv().ok()
    }

    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    /// Stop accepting frames. The last pending frame is still analyzed and
    /// results remain receivable until `recv` returns `None`.
    pub fn close(&mut self) {
        self.frames = None;
    }

    /// Close the engine, discard undelivered results and wait for the
    /// analysis thread to exit. Blocks the calling thread.
    ///
    /// A frame still pending when the thread exits is counted as dropped.
    pub fn shutdown(mut self) -> Result<EngineStats, EngineError> {
        self.close();
        self.results.close();
        while self.results.try_recv().is_ok() {}

        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| EngineError::ThreadPanicked)?;
        }
        let mut stats = self.counters.snapshot();
        stats.dropped = stats
            .submitted
            .saturating_sub(stats.processed + stats.failed);
        Ok(stats)
    }
}

/// Spawn the analysis engine on a dedicated OS thread.
///
/// The thread owns one converter and the analyzer. It waits for frames on a
/// keep-latest slot, converts and rotates each one, runs the analyzer and
/// sends an owned [`AnalysisResult`] back in processing order.
pub fn spawn_engine<A: FrameAnalyzer>(
    config: &EngineConfig,
    mut analyzer: A,
) -> Result<EngineHandle<A::Output>, EngineError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(EngineError::Spawn)?;

    let (frame_tx, mut frame_rx) = watch::channel::<FrameSlot>(None);
    let (result_tx, result_rx) = mpsc::channel(config.result_queue.max(1));
    let counters = Arc::new(Counters::default());
    let thread_counters = Arc::clone(&counters);
    let options = ProcessOptions {
        rotation: config.rotation,
        keep_images: config.keep_images,
    };

    let thread = std::thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || {
            tracing::info!("analysis thread started");
            let mut converter = YuvToBgrConverter::new();

            runtime.block_on(async move {
                while frame_rx.changed().await.is_ok() {
                    let Some(pending) = frame_rx.borrow_and_update().clone() else {
                        continue;
                    };
                    if !pending.claim() {
                        continue;
                    }
                    let frame = &pending.frame;

                    let result = process(&mut converter, &mut analyzer, frame, options);
                    match &result {
                        Ok(r) => {
                            thread_counters.processed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(
                                sequence = r.sequence,
                                elapsed_us = r.elapsed.as_micros() as u64,
                                "frame analyzed"
                            );
                        }
                        Err(e) => {
                            thread_counters.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(sequence = frame.sequence, error = %e, "frame analysis failed");
                        }
                    }

                    if result_tx.send(result).await.is_err() {
                        tracing::debug!("result receiver closed");
                        break;
                    }
                }
            });
            tracing::info!("analysis thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    tracing::info!(
        thread = %config.thread_name,
        result_queue = config.result_queue,
        rotation = config.rotation.degrees(),
        keep_images = config.keep_images,
        "analysis engine spawned"
    );

    Ok(EngineHandle {
        frames: Some(frame_tx),
        results: result_rx,
        counters,
        thread: Some(thread),
    })
}

#[derive(Debug, Clone, Copy)]
struct ProcessOptions {
    rotation: Rotation,
    keep_images: bool,
}

/// Convert, rotate and analyze one frame.
fn process<A: FrameAnalyzer>(
    converter: &mut YuvToBgrConverter,
    analyzer: &mut A,
    frame: &OwnedYuvFrame,
    options: ProcessOptions,
) -> Result<AnalysisResult<A::Output>, EngineError> {
    let started = Instant::now();
    let rotation = frame.rotation.unwrap_or(options.rotation);
    let converted = converter.convert(&frame.view())?;

    let (output, image) = if rotation == Rotation::Deg0 {
        let output = analyzer.analyze(converted, frame.sequence);
        let image = if options.keep_images {
            Some(converted.to_image()?)
        } else {
            None
        };
        (output, image)
    } else {
        let upright = rotate(&converted, rotation)?;
        let output = analyzer.analyze(upright.as_frame(), frame.sequence);
        (output, options.keep_images.then_some(upright))
    };

    Ok(AnalysisResult {
        sequence: frame.sequence,
        output,
        image,
        rotation,
        elapsed: started.elapsed(),
    })
}
