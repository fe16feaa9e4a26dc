use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock, Weak},
    time::{Duration, Instant},
};

use time::OffsetDateTime;
use tokio::{sync::Semaphore, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use lambda_model::{CreateJobRequest, FunctionKind, JobMeta, JobStatus, RequestId};

use crate::{
    config::QueueConfig,
    error::{CoreError, CoreResult},
    events::{EventBus, JobEvent, JobEventKind},
    metrics::{JobOutcome, MetricsHandle},
    pipeline::{Progress, RunOutcome},
    queue::JobRecord,
    sync::{read, write},
};

/// Future of one job body.
pub type JobFuture = Pin<Box<dyn Future<Output = CoreResult<RunOutcome>> + Send + 'static>>;

/// Job body, started once a worker slot is free.
pub type Work = Box<dyn FnOnce(ProgressHandle) -> JobFuture + Send + 'static>;

/// Box a closure into [`Work`].
pub fn work<F, Fut>(f: F) -> Work
where
    F: FnOnce(ProgressHandle) -> Fut + Send + 'static,
    Fut: Future<Output = CoreResult<RunOutcome>> + Send + 'static,
{
    Box::new(move |progress| Box::pin(f(progress)))
}

/// Tokio-backed job queue with a bounded number of workers.
///
/// Every submitted job gets its own task that waits for a worker permit,
/// so submission never blocks. Records stay queryable until they are
/// deleted or their retention period runs out.
#[derive(Clone)]
pub struct LocalQueue {
    inner: Arc<Inner>,
}

struct Inner {
    config: QueueConfig,
    records: RwLock<HashMap<RequestId, JobRecord>>,
    permits: Arc<Semaphore>,
    events: EventBus,
    metrics: MetricsHandle,
    shutdown: CancellationToken,
}

enum Finish {
    Done(CoreResult<RunOutcome>),
    Panicked(String),
    TimedOut(u64),
    Shutdown,
}

impl LocalQueue {
    pub fn new(config: QueueConfig, events: EventBus, metrics: MetricsHandle) -> Self {
        let permits = Arc::new(Semaphore::new(config.workers.max(1)));
        Self {
            inner: Arc::new(Inner {
                config,
                records: RwLock::new(HashMap::new()),
                permits,
                events,
                metrics,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Admit a job and schedule it.
    ///
    /// The conflict check and the insert happen under one lock, so two
    /// concurrent submissions for the same task cannot both pass.
    /// Must be called from within a Tokio runtime.
    #[instrument(level = "debug", skip(self, request, meta, work), fields(function = %request.function, task = request.task))]
    pub fn submit(
        &self,
        request: CreateJobRequest,
        kind: FunctionKind,
        meta: JobMeta,
        work: Work,
    ) -> CoreResult<JobRecord> {
        self.prune();

        let task = request.task;
        let record = JobRecord::queued(Uuid::new_v4(), request, kind, meta);
        let admitted = {
            let mut records = write(&self.inner.records);
            if records.values().any(|r| r.blocks_task(task)) {
                false
            } else {
                records.insert(record.id, record.clone());
                true
            }
        };
        if !admitted {
            debug!("rejected: another job is active for the task");
            self.inner.publish(
                JobEvent::new(JobEventKind::Rejected, task, record.request.function.clone())
                    .with_reason("another job is active for the task"),
            );
            return Err(CoreError::Conflict { task });
        }

        self.inner
            .publish(self.inner.event(JobEventKind::Submitted, &record));
        tokio::spawn(Inner::drive(Arc::clone(&self.inner), record.id, work));
        Ok(record)
    }

    /// A lambda record by id.
    pub fn fetch(&self, id: RequestId) -> Option<JobRecord> {
        read(&self.inner.records)
            .get(&id)
            .filter(|r| r.is_lambda())
            .cloned()
    }

    /// Lambda records that have not failed, oldest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut out: Vec<JobRecord> = read(&self.inner.records)
            .values()
            .filter(|r| r.is_lambda() && r.status != JobStatus::Failed)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.enqueued_at);
        out
    }

    /// Delete a lambda record. A running job notices at its next progress update.
    ///
    /// Returns `false` if there was no such record.
    pub fn cancel(&self, id: RequestId) -> bool {
        let removed = {
            let mut records = write(&self.inner.records);
            match records.get(&id) {
                Some(r) if r.is_lambda() => records.remove(&id),
                _ => None,
            }
        };
        match removed {
            Some(record) => {
                if record.status.is_terminal() {
                    trace!(%id, "ended job record deleted");
                } else {
                    info!(%id, task = record.request.task, "job canceled");
                    self.inner
                        .publish(self.inner.event(JobEventKind::Canceled, &record));
                }
                true
            }
            None => false,
        }
    }

    /// Stop scheduling. Queued jobs never start; running jobs are aborted and failed.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    fn prune(&self) {
        let ttl = time::Duration::milliseconds(
            i64::try_from(self.inner.config.result_ttl_ms).unwrap_or(i64::MAX),
        );
        let now = OffsetDateTime::now_utc();

        let pruned: Vec<JobRecord> = {
            let mut records = write(&self.inner.records);
            let expired: Vec<RequestId> = records
                .values()
                .filter(|r| r.ended_at.is_some_and(|t| now - t >= ttl))
                .map(|r| r.id)
                .collect();
            expired.iter().filter_map(|id| records.remove(id)).collect()
        };
        for record in &pruned {
            self.inner
                .publish(self.inner.event(JobEventKind::Pruned, record));
        }
    }
}

impl Inner {
    fn event(&self, kind: JobEventKind, record: &JobRecord) -> JobEvent {
        JobEvent::new(kind, record.request.task, record.request.function.clone())
            .with_request(record.id)
    }

    fn publish(&self, event: JobEvent) {
        self.events.publish(event);
    }

    async fn drive(self: Arc<Self>, id: RequestId, work: Work) {
        let permit = tokio::select! {
            permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
            _ = self.shutdown.cancelled() => {
                debug!(%id, "queue shut down before the job started");
                return;
            }
        };
        let Some(record) = self.mark_started(id) else {
            trace!(%id, "job removed before it started");
            return;
        };
        let kind = record.kind.kind();

        info!(%id, function = %record.request.function, scope = %record.request.scope(), "job started");
        self.publish(self.event(JobEventKind::Started, &record));
        self.metrics.record_job_started(kind);

        let started = Instant::now();
        let progress = ProgressHandle {
            id,
            inner: Arc::downgrade(&self),
        };
        let mut handle = tokio::spawn(work(progress));
        let finish = tokio::select! {
            finish = join(&mut handle, self.config.job_timeout_ms) => finish,
            _ = self.shutdown.cancelled() => Finish::Shutdown,
        };
        handle.abort();
        drop(permit);

        let elapsed = started.elapsed().as_millis() as u64;
        self.settle(id, kind, finish, elapsed);
    }

    fn mark_started(&self, id: RequestId) -> Option<JobRecord> {
        let mut records = write(&self.records);
        let record = records.get_mut(&id)?;
        record.status = JobStatus::Started;
        record.started_at = Some(OffsetDateTime::now_utc());
        Some(record.clone())
    }

    fn settle(&self, id: RequestId, kind: &str, finish: Finish, elapsed_ms: u64) {
        let (status, exc_info, outcome) = match finish {
            Finish::Done(Ok(_)) => (JobStatus::Finished, None, JobOutcome::Success),
            Finish::Done(Err(e)) => {
                self.metrics.record_error(kind, e.kind());
                (JobStatus::Failed, Some(e.to_string()), JobOutcome::Failure)
            }
            Finish::Panicked(reason) => (
                JobStatus::Failed,
                Some(format!("job panicked: {reason}")),
                JobOutcome::Failure,
            ),
            Finish::TimedOut(ms) => (
                JobStatus::Failed,
                Some(format!("job exceeded its time limit of {ms} ms")),
                JobOutcome::Timeout,
            ),
            Finish::Shutdown => (
                JobStatus::Failed,
                Some("queue shut down while the job was running".to_string()),
                JobOutcome::Failure,
            ),
        };

        let settled = {
            let mut records = write(&self.records);
            records.get_mut(&id).map(|record| {
                record.status = status;
                record.ended_at = Some(OffsetDateTime::now_utc());
                record.exc_info = exc_info.clone();
                record.clone()
            })
        };

        let Some(record) = settled else {
            debug!(%id, elapsed_ms, "job ended after its record was deleted");
            self.metrics
                .record_job_completed(kind, JobOutcome::Canceled, elapsed_ms);
            return;
        };
        self.metrics.record_job_completed(kind, outcome, elapsed_ms);

        match exc_info {
            None => {
                info!(%id, elapsed_ms, "job finished");
                self.publish(self.event(JobEventKind::Finished, &record));
            }
            Some(reason) => {
                warn!(%id, elapsed_ms, outcome = outcome.as_label(), reason = %reason, "job failed");
                self.publish(self.event(JobEventKind::Failed, &record).with_reason(reason));
            }
        }
    }
}

async fn join(handle: &mut JoinHandle<CoreResult<RunOutcome>>, timeout_ms: Option<u64>) -> Finish {
    let joined = match timeout_ms {
        Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), handle).await {
            Ok(joined) => joined,
            Err(_) => return Finish::TimedOut(ms),
        },
        None => handle.await,
    };
    match joined {
        Ok(result) => Finish::Done(result),
        Err(e) => Finish::Panicked(e.to_string()),
    }
}

/// Progress sink of one queued job.
///
/// Progress never goes backwards. Updates report `false` once the record
/// is deleted or the queue is gone.
#[derive(Clone)]
pub struct ProgressHandle {
    id: RequestId,
    inner: Weak<Inner>,
}

impl ProgressHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Progress for ProgressHandle {
    fn update(&self, percent: u8) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let event = {
            let mut records = write(&inner.records);
            let Some(record) = records.get_mut(&self.id) else {
                return false;
            };
            let percent = percent.min(100);
            if percent <= record.progress {
                return true;
            }
            record.progress = percent;
            inner.event(JobEventKind::Progress, record).with_progress(percent)
        };
        inner.publish(event);
        true
    }
}
