//! Batch runner: drives every item of one batch through the fetcher.
//!
//! Items are fetched with bounded fan-out (`item_concurrency`, default 1 for
//! strictly sequential processing). Workers never touch the progress record
//! themselves; they report [`ItemEvent`]s over a channel and a single loop
//! applies them through the batch's [`ProgressWriter`]. The terminal status
//! is written only after both sides have finished.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::{stream, FutureExt, StreamExt};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{NewBatch, ProgressWriter};
use super::types::{BatchId, BatchProgress, BatchStatus, WorkItem};
use crate::fetcher::ItemFetcher;
use crate::metrics::{BATCHES_FINISHED, ITEMS_PROCESSED};

/// Error text recorded for an item interrupted by shutdown.
pub const CANCELLED_ITEM_ERROR: &str = "cancelled";

/// Shared fetch resources handed to every runner.
#[derive(Clone)]
pub struct FetchContext {
    pub fetcher: Arc<dyn ItemFetcher>,
    /// Process-wide cap on concurrent fetches, shared by all batches and the
    /// single-item path.
    pub fetch_slots: Arc<Semaphore>,
    /// Items of one batch processed at the same time.
    pub item_concurrency: usize,
}

enum ItemEvent {
    Started { item: String },
    Succeeded { item: String, path: PathBuf },
    Failed { item: String, error: String },
    Interrupted { item: String },
}

/// Processes one batch to completion.
pub struct BatchRunner {
    id: BatchId,
    items: Vec<WorkItem>,
    output_dir: PathBuf,
    writer: ProgressWriter,
    ctx: FetchContext,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(
        batch: NewBatch,
        items: Vec<WorkItem>,
        ctx: FetchContext,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: batch.id,
            items,
            output_dir: batch.output_dir,
            writer: batch.writer,
            ctx,
            cancel,
        }
    }

    /// Runs the batch and returns its final progress.
    pub async fn run(self) -> BatchProgress {
        let BatchRunner {
            id,
            items,
            output_dir,
            writer,
            ctx,
            cancel,
        } = self;

        let start = Instant::now();
        let concurrency = ctx.item_concurrency.max(1);

        info!(
            batch_id = %id,
            items = items.len(),
            concurrency,
            fetcher = ctx.fetcher.name(),
            "Batch started"
        );

        if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
            warn!(
                batch_id = %id,
                dir = %output_dir.display(),
                error = %e,
                "Failed to create batch output directory"
            );
        }

        let (tx, mut rx) = mpsc::channel::<ItemEvent>(concurrency * 2);

        let producer = {
            let ctx = ctx.clone();
            let cancel = cancel.clone();
            let output_dir = output_dir.clone();

            async move {
                stream::iter(items)
                    .for_each_concurrent(concurrency, |item| {
                        let tx = tx.clone();
                        let ctx = &ctx;
                        let cancel = &cancel;
                        let output_dir = &output_dir;

                        async move {
                            if cancel.is_cancelled() {
                                return;
                            }

                            let name = item.display_name();
                            if tx
                                .send(ItemEvent::Started { item: name.clone() })
                                .await
                                .is_err()
                            {
                                return;
                            }

                            let event = tokio::select! {
                                biased;
                                _ = cancel.cancelled() => ItemEvent::Interrupted { item: name },
                                result = fetch_item(ctx, &item, output_dir) => match result {
                                    Ok(path) => ItemEvent::Succeeded { item: name, path },
                                    Err(error) => ItemEvent::Failed { item: name, error },
                                },
                            };

                            let _ = tx.send(event).await;
                        }
                    })
                    .await;
                // Last sender dropped here, which ends the consumer loop
            }
        };

        let mut interrupted = false;
        let consumer = async {
            while let Some(event) = rx.recv().await {
                match event {
                    ItemEvent::Started { item } => {
                        debug!(batch_id = %id, item = %item, "Fetching item");
                        writer.set_current(&item);
                    }
                    ItemEvent::Succeeded { item, path } => {
                        ITEMS_PROCESSED.with_label_values(&["success"]).inc();
                        debug!(
                            batch_id = %id,
                            item = %item,
                            path = %path.display(),
                            "Item fetched"
                        );
                        writer.record_success();
                    }
                    ItemEvent::Failed { item, error } => {
                        ITEMS_PROCESSED.with_label_values(&["failed"]).inc();
                        warn!(batch_id = %id, item = %item, error = %error, "Item failed");
                        writer.record_failure(&item, &error);
                    }
                    ItemEvent::Interrupted { item } => {
                        interrupted = true;
                        writer.record_failure(&item, CANCELLED_ITEM_ERROR);
                    }
                }
            }
        };

        tokio::join!(producer, consumer);

        let snapshot = writer.snapshot();
        let status = if interrupted || snapshot.attempted() < snapshot.total {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };

        let progress = writer.finish(status);
        BATCHES_FINISHED.with_label_values(&[status.as_str()]).inc();

        info!(
            batch_id = %id,
            status = %status,
            completed = progress.completed,
            failed = progress.failures.len(),
            total = progress.total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );

        progress
    }
}

/// Fetches one item under a global fetch slot. Errors are returned as the
/// text recorded in the batch's failure list.
async fn fetch_item(ctx: &FetchContext, item: &WorkItem, dir: &Path) -> Result<PathBuf, String> {
    let _permit = ctx
        .fetch_slots
        .acquire()
        .await
        .map_err(|_| "fetch pool closed".to_string())?;

    AssertUnwindSafe(
        ctx.fetcher
            .fetch(&item.search_query, &item.desired_filename, dir),
    )
    .catch_unwind()
    .await
    .map_err(|_| "fetcher panicked".to_string())?
    .map_err(|e| e.to_string())
}
