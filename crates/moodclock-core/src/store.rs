//! Seams between the refresh pipeline and its collaborators.
//!
//! The pipeline crate depends only on these traits; the Postgres store and
//! the WebSocket gateway implement them in their own crates.

use std::future::Future;

use crate::mood::{MoodUpdate, NewMoodSnapshot, SavedSnapshot};

/// Durable home for mood snapshots.
pub trait SnapshotStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Upsert the snapshot for its (country, window) key and replace its
    /// drivers and samples, all in one atomic unit.
    ///
    /// On error nothing from this call may be visible to readers.
    fn save_snapshot(
        &self,
        snapshot: &NewMoodSnapshot,
    ) -> impl Future<Output = Result<SavedSnapshot, Self::Error>> + Send;
}

/// Fire-and-forget fan-out of snapshot summaries to live subscribers.
pub trait MoodPublisher: Send + Sync {
    /// Publish one update. Delivery failures are the publisher's concern
    /// and never surface to the caller.
    fn publish(&self, update: &MoodUpdate);
}

impl<T: MoodPublisher + ?Sized> MoodPublisher for std::sync::Arc<T> {
    fn publish(&self, update: &MoodUpdate) {
        (**self).publish(update);
    }
}
