//! Append-only store of finalized recordings, oldest loop first

use std::sync::Arc;

use super::sample::Recording;

/// Finalized recordings of past loops. Index 0 is the oldest loop.
///
/// Recordings are shared with ghosts through `Arc`, so a ghost keeps a read-only
/// view of its recording without borrowing the store. Only the loop scheduler
/// mutates the store.
#[derive(Debug, Default)]
pub struct PastRecordingStore {
    recordings: Vec<Arc<Recording>>,
}

impl PastRecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, recording: Recording) {
        self.recordings.push(Arc::new(recording));
    }

    pub(crate) fn clear(&mut self) {
        self.recordings.clear();
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Recording>> {
        self.recordings.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Recording>> {
        self.recordings.iter()
    }

    /// Total samples held across all stored recordings
    pub fn total_samples(&self) -> usize {
        self.recordings.iter().map(|r| r.len()).sum()
    }
}
