//! Batches of work items and their progress.
//!
//! A batch is registered in the [`BatchRegistry`], processed in the
//! background by a [`BatchRunner`], and polled through consistent
//! [`BatchProgress`] snapshots until it completes.

mod error;
mod registry;
mod runner;
mod types;

pub use error::BatchError;
pub use registry::{BatchRegistry, NewBatch, ProgressWriter, RegistryCounts};
pub use runner::{BatchRunner, FetchContext, CANCELLED_ITEM_ERROR};
pub use types::{
    prepare_items, BatchId, BatchProgress, BatchStatus, ItemFailure, WorkItem, DEFAULT_EXTENSION,
};
