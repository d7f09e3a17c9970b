//! Per-document progress for batch runs.
//!
//! [`run_batch`](crate::aggregate::run_batch) reports through a
//! [`ProgressCallback`]; the CLI renders it as a progress bar and tests
//! pass [`NullProgress`].

/// Receives per-document progress from a batch run.
pub trait ProgressCallback: Send + Sync {
    /// A batch of `total` documents is starting.
    fn start(&self, total: u64);

    /// The document named `name` is being read.
    fn document(&self, name: &str);

    /// The current document is done.
    fn done(&self, failed: bool);

    /// Every document has been read.
    fn finish(&self, processed: usize, failed: usize);
}

/// A [`ProgressCallback`] that ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn start(&self, _total: u64) {}
    fn document(&self, _name: &str) {}
    fn done(&self, _failed: bool) {}
    fn finish(&self, _processed: usize, _failed: usize) {}
}
