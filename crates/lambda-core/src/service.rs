//! Entry points for the web layer: function listing, synchronous calls and
//! background auto-annotation jobs.
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use lambda_model::{
    CallRequest, CreateJobRequest, FunctionDescriptor, FunctionKind, FunctionView, JobMeta,
    JobView, Quality, RequestId, SegmentId, SegmentMeta, TaskId, TaskMeta,
};

use crate::{
    config::{PipelineConfig, QueueConfig},
    error::{CoreError, CoreResult, ValidationError},
    events::{EventBus, Subscribe},
    invoke::decode_annotations,
    mapping::ResolvedMapping,
    metrics::{MetricsHandle, noop_metrics},
    pipeline::{DetectionPipeline, Progress, RunContext, RunOutcome},
    ports::{AnnotationStore, FrameSource, FunctionRegistry, TaskCatalog},
    queue::{LocalQueue, work},
    reid::TrackAssembler,
};

/// Collaborators shared by the service and every job it starts.
#[derive(Clone)]
struct Ports {
    registry: Arc<dyn FunctionRegistry>,
    catalog: Arc<dyn TaskCatalog>,
    frames: Arc<dyn FrameSource>,
    store: Arc<dyn AnnotationStore>,
    metrics: MetricsHandle,
    pipeline: PipelineConfig,
}

impl Ports {
    fn context(
        &self,
        function: FunctionDescriptor,
        task: TaskMeta,
        segment: Option<SegmentMeta>,
    ) -> RunContext {
        RunContext {
            function,
            task,
            segment,
            registry: Arc::clone(&self.registry),
            frames: Arc::clone(&self.frames),
            store: Arc::clone(&self.store),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Segment of `job` and the task it belongs to.
    ///
    /// `task`, when given, must agree with the segment's task.
    async fn resolve_job(&self, task: Option<TaskId>, job: SegmentId) -> CoreResult<(TaskId, SegmentMeta)> {
        let segment = self.catalog.segment(job).await?;
        if let Some(task) = task {
            if task != segment.task_id {
                return Err(ValidationError::TaskMismatch {
                    task,
                    job_task: segment.task_id,
                }
                .into());
            }
        }
        Ok((segment.task_id, segment))
    }
}

/// Builder for [`LambdaService`].
pub struct LambdaServiceBuilder {
    registry: Arc<dyn FunctionRegistry>,
    catalog: Arc<dyn TaskCatalog>,
    frames: Arc<dyn FrameSource>,
    store: Arc<dyn AnnotationStore>,
    metrics: MetricsHandle,
    queue: QueueConfig,
    pipeline: PipelineConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl LambdaServiceBuilder {
    pub fn metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn queue(mut self, config: QueueConfig) -> Self {
        self.queue = config;
        self
    }

    pub fn pipeline(mut self, config: PipelineConfig) -> Self {
        self.pipeline = config;
        self
    }

    pub fn subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn build(self) -> LambdaService {
        let queue = LocalQueue::new(
            self.queue,
            EventBus::new(self.subscribers),
            Arc::clone(&self.metrics),
        );
        LambdaService {
            ports: Ports {
                registry: self.registry,
                catalog: self.catalog,
                frames: self.frames,
                store: self.store,
                metrics: self.metrics,
                pipeline: self.pipeline,
            },
            queue,
        }
    }
}

/// Auto-annotation service.
///
/// Synchronous calls run on the caller's task; jobs run on the local queue
/// and are observed through [`LambdaService::get_job`].
pub struct LambdaService {
    ports: Ports,
    queue: LocalQueue,
}

impl LambdaService {
    pub fn builder(
        registry: Arc<dyn FunctionRegistry>,
        catalog: Arc<dyn TaskCatalog>,
        frames: Arc<dyn FrameSource>,
        store: Arc<dyn AnnotationStore>,
    ) -> LambdaServiceBuilder {
        LambdaServiceBuilder {
            registry,
            catalog,
            frames,
            store,
            metrics: noop_metrics(),
            queue: QueueConfig::default(),
            pipeline: PipelineConfig::default(),
            subscribers: Vec::new(),
        }
    }

    pub fn queue(&self) -> &LocalQueue {
        &self.queue
    }

    pub async fn list_functions(&self) -> CoreResult<Vec<FunctionView>> {
        let functions = self.ports.registry.list().await?;
        Ok(functions.iter().map(FunctionDescriptor::view).collect())
    }

    pub async fn get_function(&self, id: &str) -> CoreResult<FunctionView> {
        Ok(self.ports.registry.get(id).await?.view())
    }

    /// Call a function once and return its result.
    ///
    /// Detector results are translated into the task vocabulary; other
    /// kinds return the function's answer as is.
    #[instrument(level = "debug", skip(self, args), fields(function = %id, task = ?args.task, job = ?args.job))]
    pub async fn call_function(&self, id: &str, args: &CallRequest) -> CoreResult<Value> {
        let function = self.ports.registry.get(id).await?;

        let (task_id, segment) = match args.job {
            Some(job) => {
                let (task, segment) = self.ports.resolve_job(args.task, job).await?;
                (task, Some(segment))
            }
            None => {
                let task = args.task.ok_or_else(|| ValidationError::MissingArgument {
                    function: function.id.clone(),
                    name: "task",
                })?;
                (task, None)
            }
        };
        let task = self.ports.catalog.task(task_id).await?;
        let ctx = self.ports.context(function, task, segment);

        let raw = ctx.invoke(args).await?;
        if ctx.function.kind != FunctionKind::Detector {
            return Ok(raw);
        }

        let mapping = ResolvedMapping::resolve(&ctx.function, &ctx.task.labels, args.mapping.as_ref());
        let remapped: Vec<_> = decode_annotations(raw)?
            .into_iter()
            .filter_map(|anno| mapping.remap(&ctx.function, anno))
            .collect();
        debug!(results = remapped.len(), "detector results remapped");
        serde_json::to_value(remapped).map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Jobs visible to the caller, optionally limited to `tasks`.
    pub fn list_jobs(&self, tasks: Option<&[TaskId]>) -> Vec<JobView> {
        self.queue
            .list()
            .into_iter()
            .filter(|r| tasks.is_none_or(|allowed| allowed.contains(&r.request.task)))
            .map(|r| r.view())
            .collect()
    }

    /// Validate a job request and queue it.
    #[instrument(level = "debug", skip(self, request), fields(function = %request.function, task = request.task, job = ?request.job))]
    pub async fn create_job(&self, request: CreateJobRequest) -> CoreResult<JobView> {
        let function = self.ports.registry.get(&request.function).await?;

        if Quality::resolve(request.quality.as_deref()).is_err() {
            return Err(ValidationError::InvalidQuality {
                function: function.id.clone(),
                quality: request.quality.clone().unwrap_or_default(),
            }
            .into());
        }
        self.ports.catalog.task(request.task).await?;
        if let Some(job) = request.job {
            self.ports.resolve_job(Some(request.task), job).await?;
        }

        let ports = self.ports.clone();
        let kind = function.kind;
        let job_request = request.clone();
        let record = self.queue.submit(
            request,
            kind,
            JobMeta::lambda(),
            work(move |progress| async move { run_job(ports, function, job_request, progress).await }),
        )?;

        info!(request = %record.id, "job queued");
        Ok(record.view())
    }

    pub fn get_job(&self, id: &str) -> CoreResult<JobView> {
        self.queue
            .fetch(parse_request_id(id)?)
            .map(|r| r.view())
            .ok_or_else(|| job_not_found(id))
    }

    /// Delete a job record; a running job stops at its next progress update.
    pub fn cancel_job(&self, id: &str) -> CoreResult<()> {
        if self.queue.cancel(parse_request_id(id)?) {
            Ok(())
        } else {
            Err(job_not_found(id))
        }
    }
}

#[instrument(level = "debug", skip_all, fields(function = %function.id, scope = %request.scope()))]
async fn run_job(
    ports: Ports,
    function: FunctionDescriptor,
    request: CreateJobRequest,
    progress: impl Progress,
) -> CoreResult<RunOutcome> {
    let task = ports.catalog.task(request.task).await?;
    let segment = match request.job {
        Some(job) => Some(ports.catalog.segment(job).await?),
        None => None,
    };

    if request.cleanup {
        debug!("deleting existing annotations");
        ports.store.delete(request.scope()).await?;
    }

    let flush_every = ports.pipeline.flush_every;
    let ctx = ports.context(function, task, segment);
    match ctx.function.kind {
        FunctionKind::Detector => {
            DetectionPipeline::new(&ctx, &request)
                .with_flush_every(flush_every)
                .run(&progress)
                .await
        }
        FunctionKind::Reid => TrackAssembler::new(&ctx, &request).run(&progress).await,
        other => {
            debug!(kind = %other, "nothing to run for this function kind");
            Ok(RunOutcome::Completed)
        }
    }
}

fn parse_request_id(id: &str) -> CoreResult<RequestId> {
    id.trim().parse().map_err(|_| job_not_found(id))
}

fn job_not_found(id: &str) -> CoreError {
    CoreError::not_found(format!("{id} lambda job is not found"))
}
