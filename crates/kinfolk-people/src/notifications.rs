//! Clearing notifications about a person once their profile is viewed.

use std::sync::Arc;

use kinfolk_core::{
  Error, Result,
  notification::PERSON_TARGET,
  store::NotificationStore,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct NotificationSweeper<S> {
  store: Arc<S>,
}

impl<S> Clone for NotificationSweeper<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: NotificationStore + 'static> NotificationSweeper<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Mark every unread notification for `viewer_id` that targets
  /// `person_id` as read. Returns how many were unread when looked up.
  ///
  /// Each update is unconditional, so repeated or concurrent sweeps agree.
  pub async fn mark_viewed_notifications_read(
    &self,
    viewer_id: Uuid,
    person_id: Uuid,
  ) -> Result<usize> {
    let unread = self
      .store
      .find_unread(viewer_id, PERSON_TARGET, person_id)
      .await
      .map_err(Error::store)?;

    for record in &unread {
      self
        .store
        .mark_read(record.notification_id)
        .await
        .map_err(Error::store)?;
    }

    debug!(%viewer_id, %person_id, swept = unread.len(), "notifications marked read");
    Ok(unread.len())
  }

  /// Run a sweep on a detached task. Failures are logged.
  pub fn spawn_sweep(&self, viewer_id: Uuid, person_id: Uuid) -> JoinHandle<()> {
    let sweeper = self.clone();
    tokio::spawn(async move {
      if let Err(e) = sweeper.mark_viewed_notifications_read(viewer_id, person_id).await {
        warn!(%viewer_id, %person_id, error = %e, "notification sweep failed");
      }
    })
  }
}
