use crate::core::pipeline::{Rejection, ScanOutcome, ScanPipeline};
use crate::domain::ports::{Feedback, FrameSource, PayloadDecoder, PointStore};
use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;

/// Counters for one run of the capture loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub payloads: u64,
    pub credited: u64,
    pub malformed: u64,
    pub category_mismatches: u64,
    pub replays: u64,
    pub integrity_failures: u64,
    pub backend_failures: u64,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ScanOutcome) {
        self.payloads += 1;
        match outcome {
            ScanOutcome::Credited(_) => self.credited += 1,
            ScanOutcome::Rejected(Rejection::Malformed { .. }) => self.malformed += 1,
            ScanOutcome::Rejected(Rejection::CategoryMismatch { .. }) => {
                self.category_mismatches += 1
            }
            ScanOutcome::Rejected(Rejection::AlreadyUsed { .. }) => self.replays += 1,
            ScanOutcome::Rejected(Rejection::DataIntegrity { .. }) => self.integrity_failures += 1,
            ScanOutcome::Rejected(Rejection::Backend { .. }) => self.backend_failures += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.payloads - self.credited
    }
}

/// The capture loop: one frame at a time, every payload to a terminal state
/// before the next frame.
pub struct ScanEngine<Src, D, S, F>
where
    Src: FrameSource,
    D: PayloadDecoder,
    S: PointStore,
    F: Feedback,
{
    source: Src,
    decoder: D,
    pipeline: ScanPipeline<S, F>,
    poll_interval: Duration,
}

impl<Src, D, S, F> ScanEngine<Src, D, S, F>
where
    Src: FrameSource,
    D: PayloadDecoder,
    S: PointStore,
    F: Feedback,
{
    pub fn new(source: Src, decoder: D, pipeline: ScanPipeline<S, F>) -> Self {
        Self {
            source,
            decoder,
            pipeline,
            poll_interval: Duration::ZERO,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn pipeline(&self) -> &ScanPipeline<S, F> {
        &self.pipeline
    }

    /// Runs until the source is exhausted.
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until the source is exhausted or `shutdown` resolves.
    ///
    /// A shutdown only interrupts the wait for a frame; payloads already
    /// decoded are always finished.
    pub async fn run_until<Sd>(&mut self, shutdown: Sd) -> Result<RunSummary>
    where
        Sd: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();
        tracing::info!(
            "🚀 Scanning for receptacle '{}' ({})",
            self.pipeline.active().name,
            self.pipeline.active().assigned_category
        );

        loop {
            let frame = tokio::select! {
                frame = self.source.next_frame() => frame?,
                _ = &mut shutdown => {
                    tracing::info!("🛑 Shutdown requested");
                    break;
                }
            };
            let Some(frame) = frame else {
                tracing::info!("📭 Capture source exhausted");
                break;
            };
            summary.frames += 1;

            for payload in self.decoder.decode(&frame) {
                tracing::debug!("🔎 Decoded payload: {}", payload);
                let outcome = self.pipeline.process(&payload).await;
                summary.record(&outcome);
            }

            if !self.poll_interval.is_zero() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        tracing::info!(
            "📊 {} frames, {} payloads, {} credited, {} rejected",
            summary.frames,
            summary.payloads,
            summary.credited,
            summary.rejected()
        );
        Ok(summary)
    }
}

/// Turns a stop signal such as `tokio::signal::ctrl_c()` into a shutdown
/// future for [`ScanEngine::run_until`]. If the signal cannot be installed
/// the loop runs until the capture source is exhausted.
pub async fn shutdown_on<Sig>(signal: Sig)
where
    Sig: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("⚠️ Could not listen for the stop signal: {}", e);
        std::future::pending::<()>().await;
    }
}
