use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::task::JoinHandle;

/// One-shot alarm table: entity id -> cancellable deferred task. Each pending
/// reminder/timer owns exactly one entry here while it waits for its
/// deadline. The row's terminal flag in storage, not this map, is the
/// authoritative completion signal; callbacks re-check it before sending.
pub struct Scheduler {
  jobs: Mutex<HashMap<ObjectId, JoinHandle<()>>>,
}

impl Scheduler {
  pub fn new() -> Arc<Self> {
    Arc::new(Self { jobs: Mutex::new(HashMap::new()) })
  }

  fn jobs(&self) -> MutexGuard<'_, HashMap<ObjectId, JoinHandle<()>>> {
    self.jobs.lock().unwrap_or_else(|poison| poison.into_inner())
  }

  /// Registers a deferred callback for `id`. An overdue `fire_at` runs on the
  /// next scheduling opportunity rather than being dropped; that is the
  /// catch-up path recovery relies on. Scheduling an id that is already
  /// tracked is a logged no-op; re-scheduling requires `cancel` first.
  pub fn schedule<F, Fut>(self: &Arc<Self>, id: ObjectId, fire_at: DateTime<Utc>, on_fire: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

    // The guard is held across spawn + insert so the task's own cleanup at
    // the end cannot observe the map before its entry exists.
    let mut jobs = self.jobs();
    if jobs.contains_key(&id) {
      warn!("Job {} is already scheduled, ignoring", id);
      return;
    }

    let scheduler = Arc::clone(self);
    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      on_fire().await;
      scheduler.jobs().remove(&id);
    });

    debug!("Scheduled job {} to fire in {:?}", id, delay);
    jobs.insert(id, handle);
  }

  /// Idempotent; stops and forgets the job if present. Safe against a job
  /// that is firing right now: the fire path keeps at-most-once on its own
  /// via the terminal flag, so cancelling late is a no-op, not a rollback.
  pub fn cancel(&self, id: &ObjectId) {
    if let Some(handle) = self.jobs().remove(id) {
      handle.abort();
      debug!("Cancelled job {}", id);
    }
  }

  pub fn tracked(&self, id: &ObjectId) -> bool {
    self.jobs().contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.jobs().len()
  }

  /// Aborts every pending job. Recovery from storage re-establishes them on
  /// the next startup.
  pub fn shutdown(&self) {
    let mut jobs = self.jobs();
    for (_, handle) in jobs.drain() {
      handle.abort();
    }
  }
}
