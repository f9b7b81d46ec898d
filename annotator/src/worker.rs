use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::models::SourceId;
use crate::pipeline::Pipeline;

/// Handle used by the ingress to schedule pipeline runs.
///
/// Runs execute one at a time in arrival order. Nothing prevents two
/// separate processes from working on overlapping source ids.
#[derive(Clone)]
pub struct RunQueue {
    tx: mpsc::UnboundedSender<Vec<SourceId>>,
}

impl RunQueue {
    /// Create a queue handle together with its receiving end.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<Vec<SourceId>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a batch. Fails only when the worker has stopped.
    pub fn enqueue(&self, source_ids: Vec<SourceId>) -> anyhow::Result<()> {
        self.tx
            .send(source_ids)
            .map_err(|_| anyhow::anyhow!("pipeline worker is not running"))
    }
}

/// Spawn the background worker. It runs until `shutdown` is notified (use
/// `notify_one` so a signal sent mid-run is not lost) or every `RunQueue`
/// handle has been dropped.
pub fn spawn_worker(pipeline: Arc<Pipeline>, shutdown: Arc<Notify>) -> (RunQueue, JoinHandle<()>) {
    let (queue, rx) = RunQueue::unbounded();
    let handle = tokio::spawn(run_worker(pipeline, rx, shutdown));
    (queue, handle)
}

async fn run_worker(
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::UnboundedReceiver<Vec<SourceId>>,
    shutdown: Arc<Notify>,
) {
    info!("worker: waiting for batches");

    loop {
        let batch = tokio::select! {
            _ = shutdown.notified() => {
                info!("worker: shutdown requested");
                break;
            }
            batch = rx.recv() => match batch {
                Some(batch) => batch,
                None => {
                    warn!("worker: queue closed");
                    break;
                }
            },
        };

        info!("worker: starting run for {} sources", batch.len());
        match pipeline.run(&batch).await {
            Ok(report) => info!(?report, "worker: run finished"),
            Err(e) => error!("worker: run aborted: {:#}", e),
        }
    }

    info!("worker: stopped");
}
