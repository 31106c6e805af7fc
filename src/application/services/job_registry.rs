use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::domain::{Job, JobId, JobInput, JobSnapshot, JobStatus, OracleBackend};

pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Receiving end of the snapshot feed. Events are serialized `JobSnapshot`s.
///
/// Delivery is best effort: when the channel is full the event is dropped for
/// this subscriber. Job state is always queryable through the registry.
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<String>,
}

/// Single source of truth for job state.
///
/// Events are emitted while the job lock is still held, so subscribers see
/// the snapshots of one job in the order the updates were applied. Locks are
/// always taken jobs first, then subscribers. Sending uses `try_send`, so a
/// slow subscriber never delays a job update.
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Job>>,
    subscribers: Mutex<Vec<(SubscriberId, mpsc::Sender<String>)>>,
    subscriber_capacity: usize,
    next_sequence: AtomicU64,
    next_subscriber: AtomicU64,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl JobRegistry {
    pub fn new(subscriber_capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            subscriber_capacity: subscriber_capacity.max(1),
            next_sequence: AtomicU64::new(0),
            next_subscriber: AtomicU64::new(0),
        }
    }

    pub fn create(&self, filename: String, backend: OracleBackend, input: JobInput) -> Job {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let job = Job::new(sequence, filename, backend, input);
        let snapshot = JobSnapshot::from(&job);

        {
            let mut jobs = self.lock_jobs();
            jobs.insert(job.id, job.clone());
            self.emit(&snapshot);
        }
        tracing::info!(job_id = %job.id, filename = %job.filename, provider = %job.backend.provider, "Job created");
        job
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.lock_jobs().get(&id).cloned()
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.lock_jobs().values().cloned().collect();
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        jobs
    }

    pub fn input(&self, id: JobId) -> Option<JobInput> {
        self.lock_jobs().get(&id).and_then(|job| job.input.clone())
    }

    pub fn update_status(&self, id: JobId, status: JobStatus, progress: Option<u8>) {
        self.mutate(id, |job| job.set_status(status, progress));
    }

    pub fn update_progress(&self, id: JobId, progress: u8) {
        self.mutate(id, |job| job.set_progress(progress));
    }

    pub fn set_details(&self, id: JobId, extracted_text: String, prompt: String) {
        self.mutate(id, move |job| job.set_details(extracted_text, prompt));
    }

    pub fn set_error(&self, id: JobId, message: impl Into<String>) {
        let message = message.into();
        self.mutate(id, move |job| job.fail(message));
    }

    pub fn set_completed(&self, id: JobId, artifact_path: PathBuf) {
        self.mutate(id, move |job| job.complete(artifact_path));
    }

    pub fn set_password_required(&self, id: JobId, message: impl Into<String>) {
        let message = message.into();
        self.mutate(id, move |job| job.require_password(message));
    }

    /// Moves a password-pending job back into PROCESSING. Returns false when
    /// the job is unknown or not waiting for a password.
    pub fn reset_for_retry(&self, id: JobId) -> bool {
        self.mutate(id, |job| job.reset_for_retry())
    }

    pub fn cancel(&self, id: JobId) -> bool {
        let cancelled = self.mutate(id, |job| job.cancel());
        if cancelled {
            tracing::info!(job_id = %id, "Job cancelled");
        }
        cancelled
    }

    pub fn is_cancelled(&self, id: JobId) -> bool {
        self.lock_jobs()
            .get(&id)
            .map(|job| job.cancelled)
            .unwrap_or(false)
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.next_subscriber.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.subscriber_capacity);
        self.lock_subscribers().push((id, sender));
        tracing::debug!(subscriber = id.0, "Subscriber registered");
        Subscription { id, receiver }
    }

    /// Safe to call for a subscriber that is already gone.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.lock_subscribers().retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn mutate(&self, id: JobId, apply: impl FnOnce(&mut Job) -> bool) -> bool {
        let mut jobs = self.lock_jobs();
        let Some(job) = jobs.get_mut(&id) else {
            return false;
        };
        if !apply(job) {
            return false;
        }

        self.emit(&JobSnapshot::from(&*job));
        true
    }

    /// Callers hold the jobs lock.
    fn emit(&self, snapshot: &JobSnapshot) {
        let event = match serde_json::to_string(snapshot) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, job_id = %snapshot.id, "Failed to serialize job snapshot");
                return;
            }
        };

        self.lock_subscribers()
            .retain(|(id, sender)| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = id.0, "Subscriber channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<(SubscriberId, mpsc::Sender<String>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
